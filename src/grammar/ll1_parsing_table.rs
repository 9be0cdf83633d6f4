use std::collections::{btree_map::Entry, BTreeMap};

use serde::Serialize;

use super::{
    grammar::{Lookahead, NonterminalId, ProductionId},
    FirstSets, FollowSets, Grammar,
};

/// A table cell claimed by more than one production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub nonterminal: String,
    pub lookahead: Lookahead,
    /// Every competing production, the first one placed in the cell first.
    pub productions: Vec<ProductionId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Predict(ProductionId),
    Conflict(Conflict),
}

/// LL(1) predictive parsing table.
///
/// Cells are ordered by nonterminal declaration order, then by lookahead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTable {
    cells: BTreeMap<(NonterminalId, Lookahead), Cell>,
}

impl ParseTable {
    /// Places each production `A -> α` at `[A, a]` for every `a` in
    /// FIRST(α), and, when α is nullable, for every `a` in FOLLOW(A).
    ///
    /// Ambiguity is not an error: a cell claimed twice turns into a
    /// `Conflict` collecting all claimants.
    pub fn build(grammar: &Grammar, first: &FirstSets, follow: &FollowSets) -> Self {
        let mut table = Self {
            cells: BTreeMap::new(),
        };

        for nt in grammar.nonterminal_ids() {
            for production in grammar.productions_of(nt) {
                let rhs_first = first.of_sequence(production.rhs());
                for terminal in &rhs_first.terminals {
                    let lookahead = Lookahead::terminal(terminal.as_str());
                    table.add_action(grammar, nt, lookahead, production.id());
                }
                if rhs_first.nullable {
                    let lhs_follow = follow.get(grammar.nonterminal_name(nt));
                    for lookahead in lhs_follow.into_iter().flatten() {
                        table.add_action(grammar, nt, lookahead.clone(), production.id());
                    }
                }
            }
        }

        let conflicts = table.conflicts().count();
        if conflicts > 0 {
            info!("LL(1) table has {} conflicting cells", conflicts);
        } else {
            debug!("LL(1) table has {} cells, no conflicts", table.cells.len());
        }
        table
    }

    fn add_action(
        &mut self,
        grammar: &Grammar,
        nt: NonterminalId,
        lookahead: Lookahead,
        production: ProductionId,
    ) {
        match self.cells.entry((nt, lookahead.clone())) {
            Entry::Vacant(entry) => {
                entry.insert(Cell::Predict(production));
            }
            Entry::Occupied(mut entry) => {
                let cell = entry.get_mut();
                let replaced = match &mut *cell {
                    Cell::Predict(existing) if *existing == production => None,
                    Cell::Predict(existing) => {
                        trace!(
                            "[{}, {}] claimed by {:?} and {:?}",
                            grammar.nonterminal_name(nt),
                            lookahead,
                            existing,
                            production
                        );
                        Some(Cell::Conflict(Conflict {
                            nonterminal: grammar.nonterminal_name(nt).to_string(),
                            lookahead,
                            productions: vec![*existing, production],
                        }))
                    }
                    Cell::Conflict(conflict) => {
                        if !conflict.productions.contains(&production) {
                            conflict.productions.push(production);
                        }
                        None
                    }
                };
                if let Some(replaced) = replaced {
                    *cell = replaced;
                }
            }
        }
    }

    pub fn cell(&self, nt: NonterminalId, lookahead: &Lookahead) -> Option<&Cell> {
        self.cells.get(&(nt, lookahead.clone()))
    }

    /// The production to expand, if the cell holds exactly one.
    pub fn predict(&self, nt: NonterminalId, lookahead: &Lookahead) -> Option<ProductionId> {
        match self.cell(nt, lookahead)? {
            Cell::Predict(p) => Some(*p),
            Cell::Conflict(_) => None,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = (NonterminalId, &Lookahead, &Cell)> {
        self.cells.iter().map(|((nt, l), c)| (*nt, l, c))
    }

    /// Populated cells of one nonterminal, ordered by lookahead.
    pub fn row(&self, nt: NonterminalId) -> impl Iterator<Item = (&Lookahead, &Cell)> {
        self.cells
            .range((nt, Lookahead::terminal(""))..)
            .take_while(move |((row, _), _)| *row == nt)
            .map(|((_, l), c)| (l, c))
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &Conflict> {
        self.cells.values().filter_map(|c| match c {
            Cell::Conflict(conflict) => Some(conflict),
            Cell::Predict(_) => None,
        })
    }

    pub fn is_ll1(&self) -> bool {
        self.conflicts().next().is_none()
    }

    /// Split into a conflict-free table or the conflicts that prevent it.
    pub fn into_result(self) -> std::result::Result<ParseTable, Vec<Conflict>> {
        let conflicts: Vec<Conflict> = self.conflicts().cloned().collect();
        if conflicts.is_empty() {
            Ok(self)
        } else {
            Err(conflicts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{AnalysisOptions, Symbol};

    fn build(g: &Grammar) -> ParseTable {
        let options = AnalysisOptions::default();
        let first = FirstSets::compute(g, &options).unwrap();
        let follow = FollowSets::compute(g, &first, &options).unwrap();
        ParseTable::build(g, &first, &follow)
    }

    fn predicted(g: &Grammar, table: &ParseTable, nt: &str, lookahead: Lookahead) -> String {
        let id = table
            .predict(g.nonterminal_id(nt).unwrap(), &lookahead)
            .unwrap();
        g.production_to_string(g.production(id))
    }

    #[test]
    fn unambiguous_sum() {
        let g = Grammar::parse("Sum -> Number Tail\nTail -> Plus Number Tail | ϵ").unwrap();
        let table = build(&g);

        assert!(table.is_ll1());
        assert_eq!(table.cells().count(), 3);
        assert_eq!(
            predicted(&g, &table, "Tail", Lookahead::terminal("Plus")),
            "Tail -> Plus Number Tail"
        );
        assert_eq!(
            predicted(&g, &table, "Tail", Lookahead::EndOfInput),
            "Tail -> ϵ"
        );
        assert_eq!(
            predicted(&g, &table, "Sum", Lookahead::terminal("Number")),
            "Sum -> Number Tail"
        );
        let sum = g.nonterminal_id("Sum").unwrap();
        assert!(table.predict(sum, &Lookahead::terminal("Plus")).is_none());
        assert!(table.into_result().is_ok());
    }

    #[test]
    fn shared_first_terminal_conflicts() {
        let g = Grammar::parse("Stmt -> kId kId | kId kAssign").unwrap();
        let table = build(&g);

        assert!(!table.is_ll1());
        let conflicts: Vec<_> = table.conflicts().collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].nonterminal, "Stmt");
        assert_eq!(conflicts[0].lookahead, Lookahead::terminal("kId"));
        let productions: Vec<_> = conflicts[0]
            .productions
            .iter()
            .map(|&p| g.production_to_string(g.production(p)))
            .collect();
        assert_eq!(productions, vec!["Stmt -> kId kId", "Stmt -> kId kAssign"]);

        let stmt = g.nonterminal_id("Stmt").unwrap();
        assert!(table.predict(stmt, &Lookahead::terminal("kId")).is_none());
        assert!(matches!(
            table.cell(stmt, &Lookahead::terminal("kId")),
            Some(Cell::Conflict(_))
        ));
        assert_eq!(table.into_result().unwrap_err().len(), 1);
    }

    #[test]
    fn nullable_against_follow_conflicts() {
        let g = Grammar::parse("S -> A a\nA -> a | ϵ").unwrap();
        let table = build(&g);
        let conflicts: Vec<_> = table.conflicts().collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].nonterminal, "A");
        assert_eq!(conflicts[0].lookahead, Lookahead::terminal("a"));
        assert_eq!(conflicts[0].productions.len(), 2);
    }

    #[test]
    fn conflict_collects_every_production() {
        let g = Grammar::parse("S -> x a | x b | x c | y").unwrap();
        let table = build(&g);
        let conflicts: Vec<_> = table.conflicts().collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts[0].productions,
            vec![ProductionId(0), ProductionId(1), ProductionId(2)]
        );
        assert_eq!(
            predicted(&g, &table, "S", Lookahead::terminal("y")),
            "S -> y"
        );
    }

    #[test]
    fn same_production_twice_is_not_a_conflict() {
        // `A -> B B` reaches `a` through FIRST and FOLLOW at once.
        let g = Grammar::new(
            vec![
                ("S", vec![vec![Symbol::nonterminal("A"), Symbol::terminal("a")]]),
                (
                    "A",
                    vec![vec![Symbol::nonterminal("B"), Symbol::nonterminal("B")]],
                ),
                ("B", vec![vec![Symbol::terminal("a")], vec![]]),
            ],
            "S",
        )
        .unwrap();
        let table = build(&g);
        let a = g.nonterminal_id("A").unwrap();
        assert!(table.predict(a, &Lookahead::terminal("a")).is_some());
        let conflicts: Vec<_> = table.conflicts().map(|c| c.nonterminal.as_str()).collect();
        assert_eq!(conflicts, vec!["B"]);
    }

    #[test]
    fn rows_and_ordering() {
        let g = Grammar::parse(
            "E -> T E'
             E' -> + T E' | ϵ
             T -> F T'
             T' -> * F T' | ϵ
             F -> ( E ) | id",
        )
        .unwrap();
        let table = build(&g);
        assert!(table.is_ll1());

        let t_prime = g.nonterminal_id("T'").unwrap();
        let row: Vec<_> = table.row(t_prime).map(|(l, _)| l.name()).collect();
        assert_eq!(row, vec![")", "*", "+", "$"]);

        let order: Vec<_> = table
            .cells()
            .map(|(nt, _, _)| g.nonterminal_name(nt))
            .collect();
        let mut sorted = order.clone();
        sorted.sort_by_key(|name| g.nonterminal_id(name));
        assert_eq!(order, sorted);
    }

    #[test]
    fn rebuild_is_identical() {
        let g = Grammar::parse("Stmt -> kId kId | kId kAssign | ϵ").unwrap();
        assert_eq!(build(&g), build(&g));
    }
}
