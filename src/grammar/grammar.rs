use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    error::{Error, Result},
    END_MARK, EPSILON,
};

pub(crate) fn is_reserved(name: &str) -> bool {
    name == END_MARK || name == EPSILON
}

/// A grammar symbol as written in a production.
///
/// Terminals and nonterminals with the same name are different symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    Terminal(String),
    Nonterminal(String),
    EndOfInput,
    Empty,
}

impl Symbol {
    pub fn terminal(name: impl Into<String>) -> Self {
        Symbol::Terminal(name.into())
    }

    pub fn nonterminal(name: impl Into<String>) -> Self {
        Symbol::Nonterminal(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(name) | Symbol::Nonterminal(name) => name.as_str(),
            Symbol::EndOfInput => END_MARK,
            Symbol::Empty => EPSILON,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn is_nonterminal(&self) -> bool {
        matches!(self, Symbol::Nonterminal(_))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A column of the parse table: the next token or the end of the input.
///
/// Terminals sort by name, `EndOfInput` sorts last.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Lookahead {
    Terminal(String),
    EndOfInput,
}

impl Lookahead {
    pub fn terminal(name: impl Into<String>) -> Self {
        Lookahead::Terminal(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Lookahead::Terminal(name) => name.as_str(),
            Lookahead::EndOfInput => END_MARK,
        }
    }
}

impl fmt::Display for Lookahead {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProductionId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NonterminalId(pub usize);

/// One alternative of a nonterminal. The right-hand side only holds
/// terminals and nonterminals; an empty right-hand side derives ε.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    id: ProductionId,
    lhs: NonterminalId,
    rhs: Vec<Symbol>,
}

impl Production {
    pub fn id(&self) -> ProductionId {
        self.id
    }

    pub fn lhs(&self) -> NonterminalId {
        self.lhs
    }

    pub fn rhs(&self) -> &[Symbol] {
        &self.rhs
    }

    pub fn is_epsilon(&self) -> bool {
        self.rhs.is_empty()
    }
}

#[derive(Debug, Clone)]
struct NonTerminal {
    name: String,
    productions: Vec<ProductionId>,
}

/// An immutable, validated context-free grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    non_terminals: Vec<NonTerminal>,
    symbol_table: HashMap<String, NonterminalId>,
    productions: Vec<Production>,
    terminals: BTreeSet<String>,
    start_symbol: NonterminalId,
}

impl Grammar {
    /// Build a grammar from nonterminal declarations in order.
    ///
    /// A nonterminal declared twice keeps its first position and collects
    /// the alternatives of both declarations. `Symbol::Empty` is dropped from
    /// right-hand sides, so `[Empty]` and `[]` both denote ε.
    pub fn new<I, S>(rules: I, start: &str) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Vec<Symbol>>)>,
        S: Into<String>,
    {
        let mut g = Self {
            non_terminals: Vec::new(),
            symbol_table: HashMap::new(),
            productions: Vec::new(),
            terminals: BTreeSet::new(),
            start_symbol: NonterminalId(0),
        };

        let mut raw_productions: Vec<(NonterminalId, Vec<Symbol>)> = Vec::new();
        for (name, alternatives) in rules {
            let name: String = name.into();
            if is_reserved(&name) {
                return Err(Error::ReservedName(name));
            }
            let left = match g.symbol_table.get(&name) {
                Some(&id) => id,
                None => g.add_non_terminal(name),
            };
            raw_productions.extend(alternatives.into_iter().map(|right| (left, right)));
        }

        for (left, right) in raw_productions {
            let mut symbols = Vec::with_capacity(right.len());
            for symbol in right {
                match &symbol {
                    Symbol::Empty => continue,
                    Symbol::EndOfInput => {
                        return Err(Error::MisplacedEndOfInput(
                            g.nonterminal_name(left).to_string(),
                        ))
                    }
                    Symbol::Terminal(name) | Symbol::Nonterminal(name) if is_reserved(name) => {
                        return Err(Error::ReservedName(name.clone()));
                    }
                    Symbol::Nonterminal(name) if !g.symbol_table.contains_key(name) => {
                        return Err(Error::UndefinedSymbol {
                            name: name.clone(),
                            referenced_by: Some(g.nonterminal_name(left).to_string()),
                        });
                    }
                    Symbol::Terminal(name) => {
                        g.terminals.insert(name.clone());
                    }
                    Symbol::Nonterminal(_) => {}
                }
                symbols.push(symbol);
            }
            g.add_production(left, symbols);
        }

        if let Some(nt) = g.non_terminals.iter().find(|nt| nt.productions.is_empty()) {
            return Err(Error::NoProductions(nt.name.clone()));
        }

        g.start_symbol = g
            .nonterminal_id(start)
            .ok_or_else(|| Error::UndefinedSymbol {
                name: start.to_string(),
                referenced_by: None,
            })?;

        debug!(
            "Grammar has {} productions, {} nonterminals, {} terminals",
            g.productions.len(),
            g.non_terminals.len(),
            g.terminals.len()
        );
        Ok(g)
    }

    fn add_non_terminal(&mut self, name: String) -> NonterminalId {
        let id = NonterminalId(self.non_terminals.len());
        self.symbol_table.insert(name.clone(), id);
        self.non_terminals.push(NonTerminal {
            name,
            productions: Vec::new(),
        });
        id
    }

    fn add_production(&mut self, left: NonterminalId, right: Vec<Symbol>) {
        let id = ProductionId(self.productions.len());
        self.productions.push(Production {
            id,
            lhs: left,
            rhs: right,
        });
        self.non_terminals[left.0].productions.push(id);
    }

    pub fn start_symbol(&self) -> &str {
        self.nonterminal_name(self.start_symbol)
    }

    pub fn start_id(&self) -> NonterminalId {
        self.start_symbol
    }

    /// Nonterminal names in declaration order.
    pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
        self.non_terminals.iter().map(|nt| nt.name.as_str())
    }

    pub fn nonterminal_ids(&self) -> impl Iterator<Item = NonterminalId> {
        (0..self.non_terminals.len()).map(NonterminalId)
    }

    /// Terminal names sorted by name.
    pub fn terminals(&self) -> impl Iterator<Item = &str> {
        self.terminals.iter().map(|t| t.as_str())
    }

    pub fn num_nonterminals(&self) -> usize {
        self.non_terminals.len()
    }

    pub fn num_terminals(&self) -> usize {
        self.terminals.len()
    }

    pub fn nonterminal_id(&self, name: &str) -> Option<NonterminalId> {
        self.symbol_table.get(name).cloned()
    }

    pub fn nonterminal_name(&self, id: NonterminalId) -> &str {
        self.non_terminals[id.0].name.as_str()
    }

    /// The alternatives of `name` in declaration order.
    pub fn productions(&self, name: &str) -> Option<impl Iterator<Item = &Production>> {
        self.nonterminal_id(name).map(|id| self.productions_of(id))
    }

    pub fn productions_of(&self, id: NonterminalId) -> impl Iterator<Item = &Production> {
        self.non_terminals[id.0]
            .productions
            .iter()
            .map(move |p| &self.productions[p.0])
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id.0]
    }

    pub fn all_productions(&self) -> &[Production] {
        &self.productions
    }

    /// Right-hand side names, `[ϵ]` for an empty production.
    pub fn production_to_vec_str<'a>(&self, production: &'a Production) -> Vec<&'a str> {
        if production.is_epsilon() {
            vec![EPSILON]
        } else {
            production.rhs.iter().map(|s| s.name()).collect()
        }
    }

    pub fn production_to_string(&self, production: &Production) -> String {
        format!(
            "{} -> {}",
            self.nonterminal_name(production.lhs),
            self.production_to_vec_str(production).join(" ")
        )
    }

    /// Declared nonterminals that no derivation from the start symbol uses.
    pub fn unreachable_nonterminals(&self) -> Vec<&str> {
        let mut reached = vec![false; self.non_terminals.len()];
        let mut queue = VecDeque::new();
        reached[self.start_symbol.0] = true;
        queue.push_back(self.start_symbol);

        while let Some(nt) = queue.pop_front() {
            for production in self.productions_of(nt) {
                for symbol in &production.rhs {
                    if let Symbol::Nonterminal(name) = symbol {
                        let id = self.symbol_table[name];
                        if !reached[id.0] {
                            reached[id.0] = true;
                            queue.push_back(id);
                        }
                    }
                }
            }
        }

        self.non_terminals
            .iter()
            .zip(reached)
            .filter(|(_, reached)| !reached)
            .map(|(nt, _)| nt.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(name: &str) -> Symbol {
        Symbol::terminal(name)
    }

    fn n(name: &str) -> Symbol {
        Symbol::nonterminal(name)
    }

    #[test]
    fn builds_in_declaration_order() {
        let g = Grammar::new(
            vec![
                ("Sum", vec![vec![t("Number"), n("Tail")]]),
                (
                    "Tail",
                    vec![vec![t("Plus"), t("Number"), n("Tail")], vec![Symbol::Empty]],
                ),
            ],
            "Sum",
        )
        .unwrap();

        assert_eq!(g.start_symbol(), "Sum");
        assert_eq!(g.nonterminals().collect::<Vec<_>>(), vec!["Sum", "Tail"]);
        assert_eq!(g.terminals().collect::<Vec<_>>(), vec!["Number", "Plus"]);

        let tail: Vec<_> = g.productions("Tail").unwrap().collect();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].rhs(), &[t("Plus"), t("Number"), n("Tail")]);
        assert!(tail[1].is_epsilon());
        assert_eq!(g.production_to_string(tail[1]), "Tail -> ϵ");
        assert!(g.productions("Missing").is_none());
    }

    #[test]
    fn undefined_nonterminal() {
        let e = Grammar::new(vec![("S", vec![vec![n("A")]])], "S").unwrap_err();
        match e {
            Error::UndefinedSymbol {
                name,
                referenced_by,
            } => {
                assert_eq!(name, "A");
                assert_eq!(referenced_by.as_deref(), Some("S"));
            }
            e => panic!("unexpected error {}", e),
        }
    }

    #[test]
    fn undefined_start() {
        let e = Grammar::new(vec![("S", vec![vec![t("a")]])], "X").unwrap_err();
        assert!(matches!(
            e,
            Error::UndefinedSymbol { ref name, referenced_by: None } if name == "X"
        ));
    }

    #[test]
    fn no_productions() {
        let e = Grammar::new(
            vec![("S", vec![vec![n("A")]]), ("A", vec![])],
            "S",
        )
        .unwrap_err();
        assert!(matches!(e, Error::NoProductions(ref name) if name == "A"));
    }

    #[test]
    fn end_of_input_in_production() {
        let e = Grammar::new(vec![("S", vec![vec![t("a"), Symbol::EndOfInput]])], "S")
            .unwrap_err();
        assert!(matches!(e, Error::MisplacedEndOfInput(ref name) if name == "S"));
    }

    #[test]
    fn reserved_names() {
        for name in [END_MARK, EPSILON] {
            let e = Grammar::new(vec![("S", vec![vec![t("a"), t(name)]])], "S").unwrap_err();
            assert!(matches!(e, Error::ReservedName(ref n) if n == name));

            let e = Grammar::new(
                vec![("S", vec![vec![n(name)]]), (name, vec![vec![t("a")]])],
                "S",
            )
            .unwrap_err();
            assert!(matches!(e, Error::ReservedName(ref n) if n == name));
        }
    }

    #[test]
    fn repeated_declaration_appends() {
        let g = Grammar::new(
            vec![
                ("S", vec![vec![t("a")]]),
                ("B", vec![vec![t("b")]]),
                ("S", vec![vec![n("B")]]),
            ],
            "S",
        )
        .unwrap();
        assert_eq!(g.nonterminals().collect::<Vec<_>>(), vec!["S", "B"]);
        assert_eq!(g.productions("S").unwrap().count(), 2);
    }

    #[test]
    fn terminal_and_nonterminal_may_share_a_name() {
        let g = Grammar::new(vec![("a", vec![vec![t("a")]])], "a").unwrap();
        assert_eq!(g.terminals().collect::<Vec<_>>(), vec!["a"]);
        assert_ne!(t("a"), n("a"));
    }

    #[test]
    fn unreachable() {
        let g = Grammar::new(
            vec![
                ("S", vec![vec![n("A")]]),
                ("A", vec![vec![t("a")]]),
                ("B", vec![vec![n("C")]]),
                ("C", vec![vec![n("B")], vec![]]),
            ],
            "S",
        )
        .unwrap();
        assert_eq!(g.unreachable_nonterminals(), vec!["B", "C"]);
    }
}
