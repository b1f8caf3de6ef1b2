//! Clauses: finite disjunctions of literals.
//!
//! Construction canonicalizes: invalid literals are dropped, duplicates are
//! merged, and the literal order is fixed. A clause holding a valid literal
//! or both signs of the same literal is a tautology and reports `valid`.
//! The empty clause is falsity.

use super::interner::Interner;
use super::literal::Literal;
use super::term::Term;
use indexmap::IndexSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clause {
    lits: Vec<Literal>,
    valid: bool,
}

/// Outcome of propagating one unit literal through a clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Propagation {
    /// Some literal is implied by the unit; the clause is satisfied.
    Satisfied,
    /// The unit does not touch the clause.
    Unchanged,
    /// Literals contradicted by the unit were removed. May be empty.
    Shrunk(Clause),
}

impl Clause {
    pub fn new(lits: Vec<Literal>) -> Clause {
        let mut kept: Vec<Literal> = lits.into_iter().filter(|a| !a.invalid()).collect();
        kept.sort();
        kept.dedup();
        // A clause is a tautology if it holds a valid literal or a literal
        // together with its flip. (Merely complementary literals such as
        // t == a || t == b do not make a tautology.)
        let valid = kept.iter().any(Literal::valid)
            || kept
                .iter()
                .enumerate()
                .any(|(i, a)| kept[i + 1..].iter().any(|b| *b == a.flip()));
        Clause { lits: kept, valid }
    }

    pub fn unit(a: Literal) -> Clause {
        Clause::new(vec![a])
    }

    pub fn empty() -> Clause {
        Clause {
            lits: Vec::new(),
            valid: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    pub fn is_unit(&self) -> bool {
        self.lits.len() == 1
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }

    /// The first literal in canonical order. Meaningful for unit clauses.
    pub fn head(&self) -> &Literal {
        &self.lits[0]
    }

    pub fn literals(&self) -> &[Literal] {
        &self.lits
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Literal> {
        self.lits.iter()
    }

    /// A tautology: contains a valid literal or both signs of a literal.
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// Falsity: all literals were invalid (or there were none).
    pub fn invalid(&self) -> bool {
        self.lits.is_empty()
    }

    /// Every literal primitive (or a ground name equality).
    pub fn is_primitive(&self) -> bool {
        self.lits
            .iter()
            .all(|a| a.is_primitive() || (a.lhs().is_name() && a.rhs().is_name()))
    }

    /// Every literal in the flattened shape normalization produces.
    pub fn is_quasi_primitive(&self) -> bool {
        self.lits.iter().all(Literal::is_flat)
    }

    pub fn is_ground(&self) -> bool {
        self.lits.iter().all(Literal::is_ground)
    }

    /// Whether this clause implies `other`: every literal here has a
    /// subsumee there.
    pub fn subsumes(&self, other: &Clause) -> bool {
        if other.valid() {
            return true;
        }
        if self.valid() {
            return false;
        }
        self.lits
            .iter()
            .all(|a| other.lits.iter().any(|b| a.subsumes(b)))
    }

    /// Propagate the unit `u`: a clause with a literal implied by `u` is
    /// satisfied; literals contradicted by `u` are removed.
    pub fn propagate_unit(&self, u: &Literal) -> Propagation {
        if self.lits.iter().any(|a| u.subsumes(a)) {
            return Propagation::Satisfied;
        }
        if !self.lits.iter().any(|a| Literal::complementary(u, a)) {
            return Propagation::Unchanged;
        }
        let kept: Vec<Literal> = self
            .lits
            .iter()
            .filter(|a| !Literal::complementary(u, a))
            .cloned()
            .collect();
        Propagation::Shrunk(Clause::new(kept))
    }

    /// Rewrite every literal through `theta` and re-canonicalize.
    pub fn substitute(&self, itn: &mut Interner, theta: &dyn Fn(&Term) -> Option<Term>) -> Clause {
        Clause::new(
            self.lits
                .iter()
                .map(|a| a.substitute(itn, theta))
                .collect(),
        )
    }

    pub fn collect_variables(&self, out: &mut IndexSet<Term>) {
        for a in &self.lits {
            a.lhs().collect_variables(out);
            a.rhs().collect_variables(out);
        }
    }

    pub fn collect_names(&self, out: &mut IndexSet<Term>) {
        for a in &self.lits {
            a.lhs().collect_names(out);
            a.rhs().collect_names(out);
        }
    }

    pub fn collect_sorts(&self, out: &mut IndexSet<crate::fol::Sort>) {
        for a in &self.lits {
            a.lhs().collect_sorts(out);
            a.rhs().collect_sorts(out);
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "False");
        }
        for (i, a) in self.lits.iter().enumerate() {
            if i > 0 {
                write!(f, " || ")?;
            }
            write!(f, "{}", a)?;
        }
        Ok(())
    }
}

/// Display wrapper resolving labels through the interner.
pub struct ClauseDisplay<'a> {
    pub(crate) clause: &'a Clause,
    pub(crate) itn: &'a Interner,
}

impl fmt::Display for ClauseDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clause.is_empty() {
            return write!(f, "False");
        }
        for (i, a) in self.clause.iter().enumerate() {
            if i > 0 {
                write!(f, " || ")?;
            }
            write!(f, "{}", self.itn.display_literal(a))?;
        }
        Ok(())
    }
}

impl Interner {
    pub fn display_clause<'a>(&'a self, clause: &'a Clause) -> ClauseDisplay<'a> {
        ClauseDisplay { clause, itn: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fix {
        _itn: Interner,
        a: Term,
        b: Term,
        fa: Term,
        ga: Term,
    }

    fn fix() -> Fix {
        let mut itn = Interner::new();
        let s = itn.new_sort();
        let na = itn.new_name(s);
        let nb = itn.new_name(s);
        let f = itn.new_function(s, 1);
        let g = itn.new_function(s, 1);
        let a = itn.leaf(na);
        let b = itn.leaf(nb);
        let fa = itn.term(f, vec![a.clone()]).unwrap();
        let ga = itn.term(g, vec![a.clone()]).unwrap();
        Fix { _itn: itn, a, b, fa, ga }
    }

    #[test]
    fn test_invalid_literals_dropped() {
        let f = fix();
        // a == b is invalid under unique names, a != a is invalid
        let c = Clause::new(vec![
            Literal::eq(f.a.clone(), f.b.clone()).unwrap(),
            Literal::neq(f.a.clone(), f.a.clone()).unwrap(),
            Literal::eq(f.fa.clone(), f.a.clone()).unwrap(),
        ]);
        assert_eq!(c.len(), 1);
        assert!(!c.valid());
    }

    #[test]
    fn test_tautology_detection() {
        let f = fix();
        let c = Clause::new(vec![
            Literal::eq(f.fa.clone(), f.a.clone()).unwrap(),
            Literal::neq(f.fa.clone(), f.a.clone()).unwrap(),
        ]);
        assert!(c.valid());
        let d = Clause::new(vec![Literal::neq(f.a.clone(), f.b.clone()).unwrap()]);
        assert!(d.valid());
    }

    #[test]
    fn test_subsumption_reflexive() {
        let f = fix();
        let c = Clause::new(vec![
            Literal::eq(f.fa.clone(), f.a.clone()).unwrap(),
            Literal::eq(f.ga.clone(), f.b.clone()).unwrap(),
        ]);
        assert!(c.subsumes(&c));
    }

    #[test]
    fn test_subset_subsumes() {
        let f = fix();
        let small = Clause::new(vec![Literal::eq(f.fa.clone(), f.a.clone()).unwrap()]);
        let big = Clause::new(vec![
            Literal::eq(f.fa.clone(), f.a.clone()).unwrap(),
            Literal::eq(f.ga.clone(), f.b.clone()).unwrap(),
        ]);
        assert!(small.subsumes(&big));
        assert!(!big.subsumes(&small));
    }

    #[test]
    fn test_eq_subsumes_neq_clause() {
        let f = fix();
        // f(a) == a implies f(a) != b
        let c = Clause::new(vec![Literal::eq(f.fa.clone(), f.a.clone()).unwrap()]);
        let d = Clause::new(vec![Literal::neq(f.fa.clone(), f.b.clone()).unwrap()]);
        assert!(c.subsumes(&d));
    }

    #[test]
    fn test_propagate_unit() {
        let f = fix();
        let c = Clause::new(vec![
            Literal::eq(f.fa.clone(), f.a.clone()).unwrap(),
            Literal::eq(f.ga.clone(), f.b.clone()).unwrap(),
        ]);

        // f(a) == b contradicts f(a) == a
        let u = Literal::eq(f.fa.clone(), f.b.clone()).unwrap();
        match c.propagate_unit(&u) {
            Propagation::Shrunk(d) => {
                assert_eq!(d.len(), 1);
                assert_eq!(*d.head(), Literal::eq(f.ga.clone(), f.b.clone()).unwrap());
            }
            p => panic!("expected Shrunk, got {:?}", p),
        }

        // f(a) == a satisfies the clause
        let u = Literal::eq(f.fa.clone(), f.a.clone()).unwrap();
        assert_eq!(c.propagate_unit(&u), Propagation::Satisfied);

        // a unit about an unrelated term leaves the clause alone
        let u = Literal::eq(f.ga.clone(), f.a.clone()).unwrap();
        // g(a) == a contradicts g(a) == b, so this one does shrink
        assert!(matches!(c.propagate_unit(&u), Propagation::Shrunk(_)));
    }

    #[test]
    fn test_propagate_to_empty() {
        let f = fix();
        let c = Clause::new(vec![Literal::eq(f.fa.clone(), f.a.clone()).unwrap()]);
        let u = Literal::eq(f.fa.clone(), f.b.clone()).unwrap();
        match c.propagate_unit(&u) {
            Propagation::Shrunk(d) => assert!(d.is_empty()),
            p => panic!("expected Shrunk(empty), got {:?}", p),
        }
    }
}
