use crowbook_text_processing::escape;
use serde::Serialize;

use super::{error::Result, Analysis, Cell, Grammar, Lookahead, END_MARK, EPSILON};

/// A rendering of analysis results.
pub trait Output: Serialize {
    fn to_plaintext(&self) -> String;

    fn to_latex(&self) -> String;

    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn text_width(s: &str) -> usize {
    s.chars().count()
}

/// Right-align every column and separate them with `|`.
fn align_columns(output: &[Vec<String>]) -> String {
    let columns = output.first().map_or(0, |header| header.len());
    let width: Vec<usize> = (0..columns)
        .map(|j| {
            output
                .iter()
                .map(|line| text_width(&line[j]))
                .max()
                .unwrap_or(0)
        })
        .collect();

    output
        .iter()
        .map(|line| {
            line.iter()
                .enumerate()
                .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductionOutput<'a> {
    pub left: &'a str,
    pub rights: Vec<Vec<&'a str>>,
}

impl ProductionOutput<'_> {
    pub fn to_plaintext(&self, left_width: usize, multiline: bool) -> String {
        self.rights
            .iter()
            .map(|right| right.join(" "))
            .enumerate()
            .map(|(i, right)| {
                if i == 0 {
                    format!("{:>width$} -> {}", self.left, right, width = left_width)
                } else if multiline {
                    format!("{:>width$}  | {}", "", right, width = left_width)
                } else {
                    format!(" / {}", right)
                }
            })
            .collect::<Vec<_>>()
            .join(if multiline { "\n" } else { "" })
    }

    pub fn to_latex(&self, and_sign: bool) -> String {
        if self.rights.is_empty() {
            return String::new();
        }

        let left = if and_sign {
            format!("{} & \\rightarrow & ", escape::tex(self.left))
        } else {
            format!("{} \\rightarrow ", escape::tex(self.left))
        };
        let right = self
            .rights
            .iter()
            .map(|right| {
                right
                    .iter()
                    .map(|s| escape::tex(*s))
                    .collect::<Vec<_>>()
                    .join(" \\ ")
            })
            .collect::<Vec<_>>()
            .join(" \\mid ");

        let output = left + &right;
        output.replace(EPSILON, "\\epsilon")
    }
}

#[derive(Serialize)]
pub struct ProductionOutputVec<'a> {
    productions: Vec<ProductionOutput<'a>>,
}

impl Output for ProductionOutputVec<'_> {
    fn to_plaintext(&self) -> String {
        let left_max_len = self
            .productions
            .iter()
            .map(|p| text_width(p.left))
            .max()
            .unwrap_or(0);
        self.productions
            .iter()
            .map(|s| s.to_plaintext(left_max_len, true))
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn to_latex(&self) -> String {
        std::iter::once("\\[\\begin{array}{cll}".to_string())
            .chain(self.productions.iter().map(|s| s.to_latex(true)))
            .chain(std::iter::once("\\end{array}\\]".to_string()))
            .collect::<Vec<String>>()
            .join("\\\\\n")
    }
}

impl Grammar {
    pub fn to_production_output_vec(&self) -> ProductionOutputVec<'_> {
        let productions = self
            .nonterminal_ids()
            .map(|nt| ProductionOutput {
                left: self.nonterminal_name(nt),
                rights: self
                    .productions_of(nt)
                    .map(|p| self.production_to_vec_str(p))
                    .collect(),
            })
            .collect();
        ProductionOutputVec { productions }
    }
}

#[derive(Serialize)]
struct NonTerminalOutput<'a> {
    name: &'a str,
    nullable: bool,
    first: Vec<&'a str>,
    follow: Vec<&'a str>,
}

impl NonTerminalOutput<'_> {
    fn to_plaintext(&self) -> String {
        format!(
            "{} | {} | {} | {}",
            self.name,
            self.nullable,
            self.first.join(", "),
            self.follow.join(", ")
        )
    }

    fn to_latex(&self) -> String {
        fn f(a: &[&str]) -> String {
            a.iter()
                .map(|s| escape::tex(*s))
                .collect::<Vec<_>>()
                .join(r"\ ")
                .replace(EPSILON, r"$\epsilon$")
        }

        format!(
            "{} & {} & {} & {}",
            escape::tex(self.name),
            self.nullable,
            f(&self.first),
            f(&self.follow)
        )
    }
}

#[derive(Serialize)]
pub struct NonTerminalOutputVec<'a> {
    data: Vec<NonTerminalOutput<'a>>,
}

impl Output for NonTerminalOutputVec<'_> {
    fn to_plaintext(&self) -> String {
        self.data
            .iter()
            .map(|s| s.to_plaintext())
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn to_latex(&self) -> String {
        let content = self
            .data
            .iter()
            .map(|e| e.to_latex())
            .collect::<Vec<_>>()
            .join("\\\\\n ");

        "\\begin{tabular}{c|c|c|c}\n".to_string()
            + "Symbol & Nullable & First & Follow\\\\\\hline\n"
            + &content
            + "\\\\\n\\end{tabular}"
    }
}

#[derive(Serialize)]
struct LL1Row<'a> {
    left: &'a str,
    cells: Vec<ProductionOutput<'a>>,
}

/// The predictive table with one column per terminal plus `$`. A
/// conflicting cell lists every competing production.
#[derive(Serialize)]
pub struct LL1ParsingTable<'a> {
    terminals: Vec<&'a str>,
    rows: Vec<LL1Row<'a>>,
}

impl Output for LL1ParsingTable<'_> {
    fn to_plaintext(&self) -> String {
        let mut header: Vec<String> = vec![String::new()];
        header.extend(self.terminals.iter().map(|&t| t.to_string()));
        let mut output: Vec<Vec<String>> = vec![header];
        for row in &self.rows {
            let mut line: Vec<String> = vec![row.left.to_string()];
            line.extend(
                row.cells
                    .iter()
                    .map(|cell| cell.to_plaintext(text_width(row.left), false)),
            );
            output.push(line);
        }
        align_columns(&output)
    }

    fn to_latex(&self) -> String {
        let mut header: Vec<String> = vec![format!(
            "\\[\\begin{{array}}{{c{}}}\n",
            "|l".repeat(self.terminals.len()),
        )];
        header.extend(
            self.terminals
                .iter()
                .map(|&t| format!("\\text{{{}}}", escape::tex(t))),
        );
        let header = header.join(" & ");

        let mut output: Vec<String> = Vec::new();
        for row in &self.rows {
            let mut line: Vec<String> = vec![escape::tex(row.left).to_string()];
            line.extend(row.cells.iter().map(|cell| {
                let r = cell.to_latex(false);
                if cell.rights.len() > 1 {
                    format!("{{\\color{{red}}{}}}", r)
                } else {
                    r
                }
            }));
            output.push(line.join(" & "));
        }

        let output = output.join("\\\\\n");

        header + "\\\\\\hline\n" + &output + "\n\\end{array}\\]"
    }
}

#[derive(Serialize)]
struct ConflictOutput<'a> {
    nonterminal: &'a str,
    lookahead: &'a str,
    productions: Vec<ProductionOutput<'a>>,
}

#[derive(Serialize)]
pub struct ConflictOutputVec<'a> {
    conflicts: Vec<ConflictOutput<'a>>,
}

impl Output for ConflictOutputVec<'_> {
    fn to_plaintext(&self) -> String {
        if self.conflicts.is_empty() {
            return "no conflicts".to_string();
        }
        self.conflicts
            .iter()
            .map(|c| {
                std::iter::once(format!("conflict at [{}, {}]:", c.nonterminal, c.lookahead))
                    .chain(
                        c.productions
                            .iter()
                            .map(|p| format!("    {}", p.to_plaintext(0, false))),
                    )
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_latex(&self) -> String {
        if self.conflicts.is_empty() {
            return "No conflicts.".to_string();
        }
        let items = self
            .conflicts
            .iter()
            .map(|c| {
                format!(
                    "\\item ${}$, \\text{{{}}}: {}",
                    escape::tex(c.nonterminal),
                    escape::tex(c.lookahead),
                    c.productions
                        .iter()
                        .map(|p| format!("${}$", p.to_latex(false)))
                        .collect::<Vec<_>>()
                        .join("; ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("\\begin{{itemize}}\n{}\n\\end{{itemize}}", items)
    }
}

#[derive(Serialize)]
pub struct UnreachableOutput<'a> {
    start: &'a str,
    nonterminals: Vec<&'a str>,
}

impl Output for UnreachableOutput<'_> {
    fn to_plaintext(&self) -> String {
        if self.nonterminals.is_empty() {
            "no unreachable nonterminals".to_string()
        } else {
            format!(
                "unreachable from {}: {}",
                self.start,
                self.nonterminals.join(", ")
            )
        }
    }

    fn to_latex(&self) -> String {
        if self.nonterminals.is_empty() {
            return "No unreachable nonterminals.".to_string();
        }
        format!(
            "Unreachable from ${}$: {}",
            escape::tex(self.start),
            self.nonterminals
                .iter()
                .map(|nt| format!("${}$", escape::tex(*nt)))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// Everything computed for a grammar, in one deterministic dump.
#[derive(Serialize)]
pub struct Report<'a> {
    productions: ProductionOutputVec<'a>,
    sets: NonTerminalOutputVec<'a>,
    table: LL1ParsingTable<'a>,
    conflicts: ConflictOutputVec<'a>,
    unreachable: UnreachableOutput<'a>,
}

impl Output for Report<'_> {
    fn to_plaintext(&self) -> String {
        [
            self.productions.to_plaintext(),
            self.sets.to_plaintext(),
            self.table.to_plaintext(),
            self.conflicts.to_plaintext(),
            self.unreachable.to_plaintext(),
        ]
        .join("\n\n")
    }

    fn to_latex(&self) -> String {
        [
            self.productions.to_latex(),
            self.sets.to_latex(),
            self.table.to_latex(),
            self.conflicts.to_latex(),
            self.unreachable.to_latex(),
        ]
        .join("\n\n")
    }
}

impl Analysis<'_> {
    pub fn to_non_terminal_output_vec(&self) -> NonTerminalOutputVec<'_> {
        let grammar = self.grammar();
        let data = grammar
            .nonterminals()
            .map(|name| {
                let first = self.first().of_nonterminal(name);
                let mut t = NonTerminalOutput {
                    name,
                    nullable: first.map_or(false, |f| f.nullable),
                    first: first
                        .into_iter()
                        .flat_map(|f| f.terminals.iter().map(|t| t.as_str()))
                        .collect(),
                    follow: self
                        .follow()
                        .get(name)
                        .into_iter()
                        .flatten()
                        .map(|l| l.name())
                        .collect(),
                };
                if t.nullable {
                    t.first.push(EPSILON);
                }
                t
            })
            .collect();
        NonTerminalOutputVec { data }
    }

    pub fn to_ll1_parsing_table(&self) -> LL1ParsingTable<'_> {
        let grammar = self.grammar();
        let lookaheads: Vec<Lookahead> = grammar
            .terminals()
            .map(Lookahead::terminal)
            .chain(std::iter::once(Lookahead::EndOfInput))
            .collect();
        let terminals: Vec<&str> = grammar
            .terminals()
            .chain(std::iter::once(END_MARK))
            .collect();

        let rows = grammar
            .nonterminal_ids()
            .map(|nt| {
                let left = grammar.nonterminal_name(nt);
                let cells = lookaheads
                    .iter()
                    .map(|lookahead| {
                        let rights = match self.table().cell(nt, lookahead) {
                            None => Vec::new(),
                            Some(Cell::Predict(p)) => {
                                vec![grammar.production_to_vec_str(grammar.production(*p))]
                            }
                            Some(Cell::Conflict(c)) => c
                                .productions
                                .iter()
                                .map(|p| grammar.production_to_vec_str(grammar.production(*p)))
                                .collect(),
                        };
                        ProductionOutput { left, rights }
                    })
                    .collect();
                LL1Row { left, cells }
            })
            .collect();

        LL1ParsingTable { terminals, rows }
    }

    pub fn to_conflict_output_vec(&self) -> ConflictOutputVec<'_> {
        let grammar = self.grammar();
        let conflicts = self
            .table()
            .conflicts()
            .map(|c| ConflictOutput {
                nonterminal: c.nonterminal.as_str(),
                lookahead: c.lookahead.name(),
                productions: c
                    .productions
                    .iter()
                    .map(|p| {
                        let production = grammar.production(*p);
                        ProductionOutput {
                            left: grammar.nonterminal_name(production.lhs()),
                            rights: vec![grammar.production_to_vec_str(production)],
                        }
                    })
                    .collect(),
            })
            .collect();
        ConflictOutputVec { conflicts }
    }

    pub fn to_unreachable_output(&self) -> UnreachableOutput<'_> {
        let grammar = self.grammar();
        UnreachableOutput {
            start: grammar.start_symbol(),
            nonterminals: grammar.unreachable_nonterminals(),
        }
    }

    pub fn to_report(&self) -> Report<'_> {
        Report {
            productions: self.grammar().to_production_output_vec(),
            sets: self.to_non_terminal_output_vec(),
            table: self.to_ll1_parsing_table(),
            conflicts: self.to_conflict_output_vec(),
            unreachable: self.to_unreachable_output(),
        }
    }
}
