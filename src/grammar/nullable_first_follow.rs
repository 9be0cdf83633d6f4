use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::{
    error::{Error, Result, Stage},
    grammar::{Lookahead, Symbol},
    AnalysisOptions, Grammar,
};

/// Terminals that can begin a derivation, and whether ε can be derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FirstSet {
    pub terminals: BTreeSet<String>,
    pub nullable: bool,
}

impl FirstSet {
    fn of_terminal(name: &str) -> Self {
        Self {
            terminals: std::iter::once(name.to_string()).collect(),
            nullable: false,
        }
    }

    /// Merge `other` into `self`, returning whether `self` grew.
    fn absorb(&mut self, other: FirstSet) -> bool {
        let prev_cardinality = self.terminals.len();
        let was_nullable = self.nullable;
        self.terminals.extend(other.terminals);
        self.nullable |= other.nullable;
        prev_cardinality != self.terminals.len() || was_nullable != self.nullable
    }
}

/// FIRST set of every terminal and nonterminal of a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstSets {
    map: BTreeMap<Symbol, FirstSet>,
}

impl FirstSets {
    /// Iterate over all productions until a full pass leaves every set
    /// unchanged.
    pub fn compute(grammar: &Grammar, options: &AnalysisOptions) -> Result<Self> {
        let mut map = BTreeMap::new();
        for t in grammar.terminals() {
            map.insert(Symbol::terminal(t), FirstSet::of_terminal(t));
        }
        for nt in grammar.nonterminals() {
            map.insert(Symbol::nonterminal(nt), FirstSet::default());
        }
        let lefts: Vec<Symbol> = grammar.nonterminals().map(Symbol::nonterminal).collect();

        let mut this = Self { map };
        let limit = options.pass_limit(grammar);
        let mut passes = 0;
        let mut changed = true;
        while changed {
            if passes == limit {
                return Err(Error::IterationLimitExceeded {
                    stage: Stage::First,
                    limit,
                });
            }
            passes += 1;
            changed = false;
            for production in grammar.all_productions() {
                let first = this.of_sequence(production.rhs());
                changed |= this
                    .map
                    .entry(lefts[production.lhs().0].clone())
                    .or_default()
                    .absorb(first);
            }
            trace!("FIRST pass {}: changed = {}", passes, changed);
        }
        debug!("FIRST sets settled after {} passes", passes);

        Ok(this)
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&FirstSet> {
        self.map.get(symbol)
    }

    pub fn of_nonterminal(&self, name: &str) -> Option<&FirstSet> {
        self.map.get(&Symbol::nonterminal(name))
    }

    /// FIRST of a symbol string, accumulated left to right over the cached
    /// per-symbol sets. The empty string is nullable.
    pub fn of_sequence(&self, symbols: &[Symbol]) -> FirstSet {
        let mut first = FirstSet::default();
        for symbol in symbols {
            if *symbol == Symbol::Empty {
                continue;
            }
            match self.map.get(symbol) {
                Some(set) => {
                    first.terminals.extend(set.terminals.iter().cloned());
                    if !set.nullable {
                        return first;
                    }
                }
                None => return first,
            }
        }
        first.nullable = true;
        first
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &FirstSet)> {
        self.map.iter()
    }
}

/// FOLLOW set of every nonterminal of a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowSets {
    map: BTreeMap<String, BTreeSet<Lookahead>>,
}

impl FollowSets {
    pub fn compute(
        grammar: &Grammar,
        first: &FirstSets,
        options: &AnalysisOptions,
    ) -> Result<Self> {
        let mut map: BTreeMap<String, BTreeSet<Lookahead>> = grammar
            .nonterminals()
            .map(|nt| (nt.to_string(), BTreeSet::new()))
            .collect();
        map.entry(grammar.start_symbol().to_string())
            .or_default()
            .insert(Lookahead::EndOfInput);

        let mut this = Self { map };
        let limit = options.pass_limit(grammar);
        let mut passes = 0;
        let mut changed = true;
        while changed {
            if passes == limit {
                return Err(Error::IterationLimitExceeded {
                    stage: Stage::Follow,
                    limit,
                });
            }
            passes += 1;
            changed = false;
            for production in grammar.all_productions() {
                let left = grammar.nonterminal_name(production.lhs());
                let right = production.rhs();
                for (i, symbol) in right.iter().enumerate() {
                    let name = match symbol {
                        Symbol::Nonterminal(name) => name,
                        _ => continue,
                    };

                    let tail = first.of_sequence(&right[i + 1..]);
                    let mut follow: Vec<Lookahead> = tail
                        .terminals
                        .into_iter()
                        .map(Lookahead::Terminal)
                        .collect();
                    if tail.nullable {
                        follow.extend(this.map.get(left).into_iter().flatten().cloned());
                    }

                    let followed = this.map.entry(name.clone()).or_default();
                    let prev_cardinality = followed.len();
                    followed.extend(follow);
                    changed |= prev_cardinality != followed.len();
                }
            }
            trace!("FOLLOW pass {}: changed = {}", passes, changed);
        }
        debug!("FOLLOW sets settled after {} passes", passes);

        Ok(this)
    }

    pub fn get(&self, name: &str) -> Option<&BTreeSet<Lookahead>> {
        self.map.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<Lookahead>)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }
}
