pub mod error;
pub mod grammar;
pub mod ll1_parsing_table;
pub mod nullable_first_follow;
pub mod parse;
pub mod pretty_print;

pub use error::{Error, Result, Stage};
pub use grammar::{Grammar, Lookahead, NonterminalId, Production, ProductionId, Symbol};
pub use ll1_parsing_table::{Cell, Conflict, ParseTable};
pub use nullable_first_follow::{FirstSet, FirstSets, FollowSets};
pub use parse::TINYJS_GRAMMAR;

pub const EPSILON: &str = "ϵ";
pub const END_MARK: &str = "$";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Cap on full passes over the productions per fixed point. `None` uses
    /// a bound derived from the grammar size that a correct computation
    /// never reaches.
    pub max_passes: Option<usize>,
}

impl AnalysisOptions {
    /// Every pass but the last adds at least one element to some set. A FIRST
    /// set holds at most `|T|` terminals and the nullable flag, a FOLLOW set
    /// at most `|T| + 1` lookaheads.
    pub fn pass_limit(&self, grammar: &Grammar) -> usize {
        self.max_passes
            .unwrap_or_else(|| grammar.num_nonterminals() * (grammar.num_terminals() + 2) + 1)
    }
}

/// FIRST sets, FOLLOW sets and the LL(1) table of one grammar.
#[derive(Debug, Clone)]
pub struct Analysis<'g> {
    grammar: &'g Grammar,
    first: FirstSets,
    follow: FollowSets,
    table: ParseTable,
}

impl<'g> Analysis<'g> {
    pub fn new(grammar: &'g Grammar, options: AnalysisOptions) -> Result<Self> {
        let first = FirstSets::compute(grammar, &options)?;
        let follow = FollowSets::compute(grammar, &first, &options)?;
        let table = ParseTable::build(grammar, &first, &follow);

        let unreachable = grammar.unreachable_nonterminals();
        if !unreachable.is_empty() {
            warn!(
                "Nonterminals unreachable from {}: {}",
                grammar.start_symbol(),
                unreachable.join(", ")
            );
        }

        Ok(Self {
            grammar,
            first,
            follow,
            table,
        })
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn first(&self) -> &FirstSets {
        &self.first
    }

    pub fn follow(&self) -> &FollowSets {
        &self.follow
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    /// The production a predictive parser expands for `nonterminal` when the
    /// next token is `lookahead`. `None` is a syntax error at that token, or
    /// a conflicting cell.
    pub fn predict(&self, nonterminal: &str, lookahead: &Lookahead) -> Option<&'g Production> {
        let id = self.grammar.nonterminal_id(nonterminal)?;
        self.table
            .predict(id, lookahead)
            .map(|p| self.grammar.production(p))
    }
}

impl Grammar {
    pub fn analyze(&self) -> Result<Analysis<'_>> {
        Analysis::new(self, AnalysisOptions::default())
    }
}
