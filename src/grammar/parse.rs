use std::collections::HashSet;

use serde::Deserialize;

use super::{
    error::{Error, Result},
    Grammar, Symbol, END_MARK, EPSILON,
};

/// The expression grammar of the tinyjs evaluator. It is not LL(1).
pub const TINYJS_GRAMMAR: &str = include_str!("tinyjs.grammar");

#[derive(Deserialize)]
struct GrammarSpec {
    start: Option<String>,
    rules: Vec<RuleSpec>,
}

#[derive(Deserialize)]
struct RuleSpec {
    name: String,
    productions: Vec<Vec<Symbol>>,
}

fn syntax_error(line: usize, message: &str) -> Error {
    Error::Syntax {
        line,
        message: message.to_string(),
    }
}

impl Grammar {
    /// Parse the text format:
    ///
    /// ```text
    /// %token a b
    /// %start S
    /// S -> a S | B
    ///    | ϵ
    /// B -> b
    /// ```
    ///
    /// Names appearing on a left side are nonterminals. Without `%token`
    /// every other name is a terminal; once a `%token` line is present, an
    /// undeclared name is an undefined nonterminal. The start symbol
    /// defaults to the first left side. `$` is the end-of-input marker and
    /// may not appear anywhere.
    pub fn parse(grammar: &str) -> Result<Self> {
        let mut raw_productions: Vec<(&str, &str)> = Vec::new();
        let mut tokens: Option<HashSet<&str>> = None;
        let mut start: Option<&str> = None;

        let mut previous_left: Option<&str> = None;
        for (i, line) in grammar.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('%') {
                let mut words = line.split_whitespace();
                match words.next() {
                    Some("%token") => {
                        tokens.get_or_insert_with(HashSet::new).extend(words);
                    }
                    Some("%start") => match (words.next(), words.next()) {
                        (Some(name), None) => start = Some(name),
                        _ => return Err(syntax_error(i + 1, "expected one start symbol")),
                    },
                    _ => return Err(syntax_error(i + 1, "unknown directive")),
                }
                continue;
            }
            if line.split_whitespace().any(|word| word == END_MARK) {
                return Err(syntax_error(i + 1, "\"$\" is reserved for the end of input"));
            }

            let parts: Vec<&str> = line.split("->").collect();
            if parts.len() > 2 {
                return Err(syntax_error(i + 1, "too many \"->\""));
            }
            let (left, rights): (&str, &str) = if parts.len() == 2 {
                let left_str = parts[0].trim();
                if left_str.is_empty() {
                    return Err(syntax_error(i + 1, "empty left side"));
                } else if left_str.split_whitespace().count() != 1 {
                    return Err(syntax_error(i + 1, "left side contains whitespace"));
                }
                (left_str, parts[1].trim())
            } else if let Some(left) = previous_left {
                match line.strip_prefix('|') {
                    Some(rest) => (left, rest.trim()),
                    None => return Err(syntax_error(i + 1, "expected \"->\" or \"|\"")),
                }
            } else {
                return Err(syntax_error(i + 1, "cannot find left side"));
            };

            previous_left = Some(left);
            raw_productions.push((left, rights));
        }

        let lefts: HashSet<&str> = raw_productions.iter().map(|(left, _)| *left).collect();
        let symbol = |s: &str| {
            if s == EPSILON || s == "ε" {
                Symbol::Empty
            } else if lefts.contains(s) {
                Symbol::nonterminal(s)
            } else {
                match &tokens {
                    Some(tokens) if !tokens.contains(s) => Symbol::nonterminal(s),
                    _ => Symbol::terminal(s),
                }
            }
        };

        let rules: Vec<(&str, Vec<Vec<Symbol>>)> = raw_productions
            .iter()
            .map(|&(left, rights)| {
                let alternatives: Vec<Vec<Symbol>> = rights
                    .split('|')
                    .map(|right| right.split_whitespace().map(&symbol).collect())
                    .collect();
                (left, alternatives)
            })
            .collect();

        let start = match start.or_else(|| rules.first().map(|(left, _)| *left)) {
            Some(start) => start,
            None => return Err(Error::EmptyGrammar),
        };
        Grammar::new(rules, start)
    }

    /// Parse the JSON format:
    ///
    /// ```json
    /// {"start": "S", "rules": [{"name": "S", "productions": [[{"Terminal": "a"}], ["Empty"]]}]}
    /// ```
    ///
    /// `start` is optional and defaults to the first rule.
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: GrammarSpec = serde_json::from_str(json)?;
        let start = match spec.start.or_else(|| spec.rules.first().map(|r| r.name.clone())) {
            Some(start) => start,
            None => return Err(Error::EmptyGrammar),
        };
        Grammar::new(
            spec.rules.into_iter().map(|r| (r.name, r.productions)),
            &start,
        )
    }

    pub fn tinyjs() -> Result<Self> {
        Self::parse(TINYJS_GRAMMAR)
    }
}
