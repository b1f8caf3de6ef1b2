//! Error types for registration, term construction, and parsing.

use std::fmt;

/// Errors surfaced by the programmatic API and the script parser.
///
/// Configuration errors (duplicate or unknown identifiers, arity and sort
/// mismatches) are reported synchronously by the call that caused them.
/// Queries themselves never fail; an inconclusive query answers `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An identifier was registered twice.
    DuplicateId(String),
    /// An identifier was used before being registered.
    UnknownId(String),
    /// A function was applied to the wrong number of arguments.
    ArityMismatch {
        id: String,
        expected: u8,
        got: usize,
    },
    /// The two sides of an equality have different sorts.
    SortMismatch(String, String),
    /// A symbol was used in a position its kind does not allow.
    KindMismatch(String),
    /// The script text could not be parsed.
    Parse(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateId(id) => write!(f, "identifier '{}' is already registered", id),
            Error::UnknownId(id) => write!(f, "unknown identifier '{}'", id),
            Error::ArityMismatch { id, expected, got } => {
                write!(f, "'{}' expects {} argument(s), got {}", id, expected, got)
            }
            Error::SortMismatch(lhs, rhs) => {
                write!(f, "sort mismatch between '{}' and '{}'", lhs, rhs)
            }
            Error::KindMismatch(id) => write!(f, "'{}' cannot be used here", id),
            Error::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
