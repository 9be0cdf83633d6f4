use std::fmt;

/// The fixed point that failed to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    First,
    Follow,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stage::First => write!(f, "FIRST"),
            Stage::Follow => write!(f, "FOLLOW"),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    /// A production (or the start symbol declaration) names a nonterminal
    /// that has no entry in the grammar.
    UndefinedSymbol {
        name: String,
        referenced_by: Option<String>,
    },
    /// A declared nonterminal has no alternatives.
    NoProductions(String),
    /// `EndOfInput` only exists as lookahead and cannot be written in a
    /// production.
    MisplacedEndOfInput(String),
    /// A symbol is spelled like the end-of-input or empty marker.
    ReservedName(String),
    /// The input declares no nonterminal at all.
    EmptyGrammar,
    /// Malformed line in the text grammar format.
    Syntax { line: usize, message: String },
    Json(serde_json::Error),
    /// Set computation did not reach a fixed point within the pass cap.
    IterationLimitExceeded { stage: Stage, limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UndefinedSymbol {
                name,
                referenced_by: Some(lhs),
            } => write!(f, "undefined nonterminal `{}` referenced by `{}`", name, lhs),
            Error::UndefinedSymbol {
                name,
                referenced_by: None,
            } => write!(f, "undefined nonterminal `{}`", name),
            Error::NoProductions(name) => write!(f, "nonterminal `{}` has no productions", name),
            Error::MisplacedEndOfInput(name) => write!(
                f,
                "production of `{}` contains the end-of-input marker",
                name
            ),
            Error::ReservedName(name) => {
                write!(f, "`{}` is reserved and cannot name a symbol", name)
            }
            Error::EmptyGrammar => write!(f, "grammar has no productions"),
            Error::Syntax { line, message } => write!(f, "Line {}: {}", line, message),
            Error::Json(e) => write!(f, "invalid grammar JSON: {}", e),
            Error::IterationLimitExceeded { stage, limit } => write!(
                f,
                "{} sets did not stabilize within {} passes",
                stage, limit
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}
