//! Hash-consed terms.
//!
//! A term is a variable, a name, or a function applied to argument terms.
//! Terms are interned: the interner deduplicates `(symbol, args)` pairs and
//! hands out shared handles, so structural equality coincides with identity
//! and comparison/hashing are O(1) on the term id.

use super::symbol::{Sort, Symbol, SymbolKind};
use indexmap::IndexSet;
use std::fmt;
use std::rc::Rc;

#[derive(Debug)]
pub(crate) struct TermData {
    pub(crate) id: u32,
    pub(crate) symbol: Symbol,
    pub(crate) args: Vec<Term>,
}

/// A shared handle to an interned term.
#[derive(Debug, Clone)]
pub struct Term(pub(crate) Rc<TermData>);

impl Term {
    pub fn id(&self) -> u32 {
        self.0.id
    }

    pub fn symbol(&self) -> Symbol {
        self.0.symbol
    }

    pub fn sort(&self) -> Sort {
        self.0.symbol.sort
    }

    pub fn args(&self) -> &[Term] {
        &self.0.args
    }

    pub fn is_name(&self) -> bool {
        self.0.symbol.is_name()
    }

    pub fn is_variable(&self) -> bool {
        self.0.symbol.is_variable()
    }

    pub fn is_function(&self) -> bool {
        self.0.symbol.is_function()
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.symbol.is_placeholder()
    }

    /// No variable occurs anywhere in the term.
    pub fn is_ground(&self) -> bool {
        match self.0.symbol.kind {
            SymbolKind::Variable => false,
            SymbolKind::Name => true,
            SymbolKind::Function => self.0.args.iter().all(Term::is_ground),
        }
    }

    /// A function applied to names only.
    pub fn is_primitive(&self) -> bool {
        self.is_function() && self.0.args.iter().all(Term::is_name)
    }

    /// A function applied to names or variables only.
    pub fn is_quasi_primitive(&self) -> bool {
        self.is_function()
            && self
                .0
                .args
                .iter()
                .all(|t| t.is_name() || t.is_variable())
    }

    /// Collect every variable occurring in the term.
    pub fn collect_variables(&self, out: &mut IndexSet<Term>) {
        match self.0.symbol.kind {
            SymbolKind::Variable => {
                out.insert(self.clone());
            }
            SymbolKind::Name => {}
            SymbolKind::Function => {
                for arg in &self.0.args {
                    arg.collect_variables(out);
                }
            }
        }
    }

    /// Collect every name occurring in the term.
    pub fn collect_names(&self, out: &mut IndexSet<Term>) {
        match self.0.symbol.kind {
            SymbolKind::Name => {
                out.insert(self.clone());
            }
            SymbolKind::Variable => {}
            SymbolKind::Function => {
                for arg in &self.0.args {
                    arg.collect_names(out);
                }
            }
        }
    }

    /// Collect the sort of the term and of every subterm.
    pub fn collect_sorts(&self, out: &mut IndexSet<Sort>) {
        out.insert(self.sort());
        for arg in &self.0.args {
            arg.collect_sorts(out);
        }
    }

    /// Whether `sub` occurs in this term (as the term itself or nested).
    pub fn mentions(&self, sub: &Term) -> bool {
        self == sub || self.0.args.iter().any(|a| a.mentions(sub))
    }

    // Comparison key: function-headed terms order above name-headed terms,
    // and name-headed above variable-headed; ties broken by id. The literal
    // canonicalization (lhs = larger side) depends on this.
    fn rank(&self) -> u8 {
        match self.0.symbol.kind {
            SymbolKind::Variable => 0,
            SymbolKind::Name => 1,
            SymbolKind::Function => 2,
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Term {}

impl std::hash::Hash for Term {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.rank(), self.0.id).cmp(&(other.rank(), other.0.id))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.symbol)?;
        if !self.0.args.is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.0.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
