//! The symbol and term interner.
//!
//! One interner serves a whole process' worth of knowledge bases: symbols
//! and terms registered through it stay alive for the interner's lifetime,
//! and hash-consing guarantees that structurally equal terms are the same
//! handle. The interner is deliberately not `Sync`; parallel queries on a
//! shared interner are unsupported.

use super::symbol::{Sort, Symbol, SymbolKind};
use super::term::{Term, TermData};
use crate::error::Error;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Mints sorts and symbols, hash-conses terms, and keeps the textual labels
/// used for pretty-printing.
#[derive(Debug, Default)]
pub struct Interner {
    next_sort: u32,
    next_symbol: u32,
    next_term: u32,
    /// Hash-consing table: `(symbol id, arg term ids)` to the shared handle.
    terms: HashMap<(u32, Vec<u32>), Term>,
    /// Textual labels for registered symbols, by symbol id.
    labels: HashMap<u32, String>,
    /// Textual labels for registered sorts, by sort id.
    sort_labels: HashMap<u32, String>,
}

impl Interner {
    pub fn new() -> Self {
        Interner::default()
    }

    // === Sorts and symbols ===

    pub fn new_sort(&mut self) -> Sort {
        let s = Sort(self.next_sort);
        self.next_sort += 1;
        s
    }

    pub fn new_name(&mut self, sort: Sort) -> Symbol {
        self.new_symbol(sort, 0, SymbolKind::Name, false)
    }

    /// A name invented by the grounder to represent "something else".
    pub fn new_placeholder(&mut self, sort: Sort) -> Symbol {
        self.new_symbol(sort, 0, SymbolKind::Name, true)
    }

    pub fn new_variable(&mut self, sort: Sort) -> Symbol {
        self.new_symbol(sort, 0, SymbolKind::Variable, false)
    }

    pub fn new_function(&mut self, sort: Sort, arity: u8) -> Symbol {
        self.new_symbol(sort, arity, SymbolKind::Function, false)
    }

    fn new_symbol(&mut self, sort: Sort, arity: u8, kind: SymbolKind, placeholder: bool) -> Symbol {
        let sym = Symbol {
            id: self.next_symbol,
            sort,
            arity,
            kind,
            placeholder,
        };
        self.next_symbol += 1;
        sym
    }

    // === Labels ===

    pub fn set_label(&mut self, sym: Symbol, label: &str) {
        self.labels.insert(sym.id(), label.to_string());
    }

    pub fn label(&self, sym: Symbol) -> Option<&str> {
        self.labels.get(&sym.id()).map(String::as_str)
    }

    pub fn set_sort_label(&mut self, sort: Sort, label: &str) {
        self.sort_labels.insert(sort.as_u32(), label.to_string());
    }

    pub fn sort_label(&self, sort: Sort) -> Option<&str> {
        self.sort_labels.get(&sort.as_u32()).map(String::as_str)
    }

    // === Terms ===

    /// Build (or look up) the term `symbol(args...)`.
    ///
    /// Fails if the argument count does not match the symbol's arity or if a
    /// name or variable is applied to arguments.
    pub fn term(&mut self, symbol: Symbol, args: Vec<Term>) -> Result<Term, Error> {
        if !symbol.is_function() && !args.is_empty() {
            return Err(Error::KindMismatch(self.describe(symbol)));
        }
        if symbol.arity() as usize != args.len() {
            return Err(Error::ArityMismatch {
                id: self.describe(symbol),
                expected: symbol.arity(),
                got: args.len(),
            });
        }
        Ok(self.intern(symbol, args))
    }

    /// The 0-ary term for a name or variable symbol.
    pub fn leaf(&mut self, symbol: Symbol) -> Term {
        debug_assert!(!symbol.is_function());
        self.intern(symbol, Vec::new())
    }

    fn intern(&mut self, symbol: Symbol, args: Vec<Term>) -> Term {
        let key = (symbol.id(), args.iter().map(Term::id).collect::<Vec<_>>());
        if let Some(t) = self.terms.get(&key) {
            return t.clone();
        }
        let t = Term(Rc::new(TermData {
            id: self.next_term,
            symbol,
            args,
        }));
        self.next_term += 1;
        self.terms.insert(key, t.clone());
        t
    }

    /// A fresh variable term of the given sort (used by rectification and
    /// flattening; the symbol is never registered with a label).
    pub fn fresh_variable(&mut self, sort: Sort) -> Term {
        let sym = self.new_variable(sort);
        self.leaf(sym)
    }

    /// A fresh placeholder name term of the given sort.
    pub fn fresh_placeholder(&mut self, sort: Sort) -> Term {
        let sym = self.new_placeholder(sort);
        self.leaf(sym)
    }

    /// Rewrite `t` bottom-up, replacing every subterm for which `theta`
    /// yields a replacement. Replacements are not themselves rewritten.
    pub fn substitute(&mut self, t: &Term, theta: &dyn Fn(&Term) -> Option<Term>) -> Term {
        if let Some(u) = theta(t) {
            return u;
        }
        if t.args().is_empty() {
            return t.clone();
        }
        let args: Vec<Term> = t
            .args()
            .iter()
            .map(|a| self.substitute(a, theta))
            .collect();
        if args.as_slice() == t.args() {
            t.clone()
        } else {
            self.intern(t.symbol(), args)
        }
    }

    fn describe(&self, sym: Symbol) -> String {
        match self.label(sym) {
            Some(l) => l.to_string(),
            None => sym.to_string(),
        }
    }

    /// Render a term with registered labels.
    pub fn display_term<'a>(&'a self, t: &'a Term) -> TermDisplay<'a> {
        TermDisplay { term: t, itn: self }
    }
}

/// Display wrapper resolving symbol labels through the interner.
pub struct TermDisplay<'a> {
    term: &'a Term,
    itn: &'a Interner,
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.itn.label(self.term.symbol()) {
            Some(l) => write!(f, "{}", l)?,
            None => write!(f, "{}", self.term.symbol())?,
        }
        if !self.term.args().is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.term.args().iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", self.itn.display_term(arg))?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
