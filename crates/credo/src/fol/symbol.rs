//! Sorts and symbols.
//!
//! Every term is built from symbols, and every symbol carries exactly one
//! sort. Names are 0-ary and denote fixed individuals; placeholder names are
//! minted by the grounder to stand for individuals not mentioned anywhere
//! else. Symbols are process-unique: identity is the interner-assigned id.

use std::fmt;

/// An opaque sort identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sort(pub(crate) u32);

impl Sort {
    /// Get the raw id value (for debugging/serialization)
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// The three kinds of term-forming symbols.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Name,
    Variable,
    Function,
}

/// A sorted symbol: a name, a variable, or a function with an arity.
///
/// Symbols are cheap `Copy` values; the interner guarantees that ids are
/// unique across all kinds, so equality on the id alone would suffice.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub(crate) id: u32,
    pub(crate) sort: Sort,
    pub(crate) arity: u8,
    pub(crate) kind: SymbolKind,
    pub(crate) placeholder: bool,
}

impl Symbol {
    pub fn id(self) -> u32 {
        self.id
    }

    pub fn sort(self) -> Sort {
        self.sort
    }

    pub fn arity(self) -> u8 {
        self.arity
    }

    pub fn kind(self) -> SymbolKind {
        self.kind
    }

    pub fn is_name(self) -> bool {
        self.kind == SymbolKind::Name
    }

    pub fn is_variable(self) -> bool {
        self.kind == SymbolKind::Variable
    }

    pub fn is_function(self) -> bool {
        self.kind == SymbolKind::Function
    }

    /// True for names minted by the grounder rather than registered by the
    /// caller. Placeholders never appear in user axioms.
    pub fn is_placeholder(self) -> bool {
        self.placeholder
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

// Display without an interner shows the kind and the raw id; resolved names
// come from `Interner::display_*`.
impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SymbolKind::Name if self.placeholder => write!(f, "#{}", self.id),
            SymbolKind::Name => write!(f, "n{}", self.id),
            SymbolKind::Variable => write!(f, "x{}", self.id),
            SymbolKind::Function => write!(f, "f{}", self.id),
        }
    }
}
