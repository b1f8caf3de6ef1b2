//! Equality literals.
//!
//! A literal is `t1 = t2` or `t1 != t2` between same-sorted terms,
//! canonicalized so that the lhs is the larger side under the term order
//! (functions above names above variables). Distinct names denote distinct
//! individuals, so `n = n'` is invalid and `n != n'` is valid outright.

use super::interner::Interner;
use super::term::Term;
use crate::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    lhs: Term,
    rhs: Term,
    pos: bool,
}

impl Literal {
    /// `t1 = t2`, canonicalized. Fails on a sort mismatch.
    pub fn eq(t1: Term, t2: Term) -> Result<Literal, Error> {
        Literal::checked(true, t1, t2)
    }

    /// `t1 != t2`, canonicalized. Fails on a sort mismatch.
    pub fn neq(t1: Term, t2: Term) -> Result<Literal, Error> {
        Literal::checked(false, t1, t2)
    }

    fn checked(pos: bool, t1: Term, t2: Term) -> Result<Literal, Error> {
        if t1.sort() != t2.sort() {
            return Err(Error::SortMismatch(t1.to_string(), t2.to_string()));
        }
        Ok(Literal::new(pos, t1, t2))
    }

    // Internal constructor for literals whose sides are known well-sorted
    // (substitution instances, flipped literals).
    pub(crate) fn new(pos: bool, t1: Term, t2: Term) -> Literal {
        debug_assert_eq!(t1.sort(), t2.sort());
        if t1 >= t2 {
            Literal { lhs: t1, rhs: t2, pos }
        } else {
            Literal { lhs: t2, rhs: t1, pos }
        }
    }

    pub fn lhs(&self) -> &Term {
        &self.lhs
    }

    pub fn rhs(&self) -> &Term {
        &self.rhs
    }

    pub fn pos(&self) -> bool {
        self.pos
    }

    /// The literal with the opposite sign.
    pub fn flip(&self) -> Literal {
        Literal {
            lhs: self.lhs.clone(),
            rhs: self.rhs.clone(),
            pos: !self.pos,
        }
    }

    /// True in every model: `t = t`, or `n != n'` for distinct names.
    pub fn valid(&self) -> bool {
        if self.pos {
            self.lhs == self.rhs
        } else {
            self.lhs.is_name() && self.rhs.is_name() && self.lhs != self.rhs
        }
    }

    /// False in every model: `t != t`, or `n = n'` for distinct names.
    pub fn invalid(&self) -> bool {
        if self.pos {
            self.lhs.is_name() && self.rhs.is_name() && self.lhs != self.rhs
        } else {
            self.lhs == self.rhs
        }
    }

    /// Whether the two literals cannot both hold: equal/unequal versions of
    /// the same term pair, or `t = n` and `t = n'` for distinct names.
    pub fn complementary(a: &Literal, b: &Literal) -> bool {
        a.lhs == b.lhs
            && ((a.pos != b.pos && a.rhs == b.rhs)
                || (a.pos
                    && b.pos
                    && a.rhs.is_name()
                    && b.rhs.is_name()
                    && a.rhs != b.rhs))
    }

    /// Whether `self` implies `other`: same literal, or `t = n` implying
    /// `t != n'` for distinct names.
    pub fn subsumes(&self, other: &Literal) -> bool {
        self.lhs == other.lhs
            && ((self.pos == other.pos && self.rhs == other.rhs)
                || (self.pos
                    && !other.pos
                    && self.rhs.is_name()
                    && other.rhs.is_name()
                    && self.rhs != other.rhs))
    }

    /// Quasi-primitive: the lhs is a function over names/variables and the
    /// rhs is a name or variable.
    pub fn is_quasi_primitive(&self) -> bool {
        self.lhs.is_quasi_primitive() && !self.rhs.is_function()
    }

    /// Primitive: the lhs is a function over names and the rhs is a name.
    pub fn is_primitive(&self) -> bool {
        self.lhs.is_primitive() && self.rhs.is_name()
    }

    /// Either quasi-primitive or a plain equality between names/variables.
    /// This is the shape normalization flattens every literal into.
    pub fn is_flat(&self) -> bool {
        self.is_quasi_primitive() || (!self.lhs.is_function() && !self.rhs.is_function())
    }

    pub fn is_ground(&self) -> bool {
        self.lhs.is_ground() && self.rhs.is_ground()
    }

    /// Rewrite both sides through `theta` and re-canonicalize.
    pub fn substitute(
        &self,
        itn: &mut Interner,
        theta: &dyn Fn(&Term) -> Option<Term>,
    ) -> Literal {
        let lhs = itn.substitute(&self.lhs, theta);
        let rhs = itn.substitute(&self.rhs, theta);
        Literal::new(self.pos, lhs, rhs)
    }

    /// Whether `sub` occurs on either side.
    pub fn mentions(&self, sub: &Term) -> bool {
        self.lhs.mentions(sub) || self.rhs.mentions(sub)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.lhs,
            if self.pos { "==" } else { "!=" },
            self.rhs
        )
    }
}

/// Display wrapper resolving labels through the interner.
pub struct LiteralDisplay<'a> {
    pub(crate) lit: &'a Literal,
    pub(crate) itn: &'a Interner,
}

impl fmt::Display for LiteralDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.itn.display_term(self.lit.lhs()),
            if self.lit.pos() { "==" } else { "!=" },
            self.itn.display_term(self.lit.rhs())
        )
    }
}

impl Interner {
    pub fn display_literal<'a>(&'a self, lit: &'a Literal) -> LiteralDisplay<'a> {
        LiteralDisplay { lit, itn: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Interner, Term, Term, Term) {
        let mut itn = Interner::new();
        let s = itn.new_sort();
        let a = itn.new_name(s);
        let b = itn.new_name(s);
        let f = itn.new_function(s, 1);
        let ta = itn.leaf(a);
        let tb = itn.leaf(b);
        let fa = itn.term(f, vec![ta.clone()]).unwrap();
        (itn, ta, tb, fa)
    }

    #[test]
    fn test_canonical_lhs_is_function() {
        let (_itn, ta, _tb, fa) = setup();
        let l = Literal::eq(ta.clone(), fa.clone()).unwrap();
        assert_eq!(*l.lhs(), fa);
        assert_eq!(*l.rhs(), ta);
    }

    #[test]
    fn test_flip_involution() {
        let (_itn, ta, _tb, fa) = setup();
        let l = Literal::eq(fa, ta).unwrap();
        assert_eq!(l, l.flip().flip());
        assert_ne!(l, l.flip());
    }

    #[test]
    fn test_valid_invalid_trichotomy() {
        let (_itn, ta, tb, fa) = setup();
        let cases = vec![
            Literal::eq(ta.clone(), ta.clone()).unwrap(),  // valid
            Literal::neq(ta.clone(), ta.clone()).unwrap(), // invalid
            Literal::eq(ta.clone(), tb.clone()).unwrap(),  // invalid (distinct names)
            Literal::neq(ta.clone(), tb.clone()).unwrap(), // valid (distinct names)
            Literal::eq(fa.clone(), ta.clone()).unwrap(),  // neither
            Literal::neq(fa, tb).unwrap(),                 // neither
        ];
        for l in cases {
            assert!(!(l.valid() && l.invalid()), "{} both valid and invalid", l);
        }
    }

    #[test]
    fn test_complementary_same_lhs() {
        let (_itn, ta, tb, fa) = setup();
        let eq_a = Literal::eq(fa.clone(), ta.clone()).unwrap();
        let neq_a = Literal::neq(fa.clone(), ta).unwrap();
        let eq_b = Literal::eq(fa, tb).unwrap();

        assert!(Literal::complementary(&eq_a, &neq_a));
        assert!(Literal::complementary(&neq_a, &eq_a));
        // t = a and t = b cannot both hold
        assert!(Literal::complementary(&eq_a, &eq_b));
        // t != a and t = b can
        assert!(!Literal::complementary(&neq_a, &eq_b));
    }

    #[test]
    fn test_subsumes() {
        let (_itn, ta, tb, fa) = setup();
        let eq_a = Literal::eq(fa.clone(), ta.clone()).unwrap();
        let neq_b = Literal::neq(fa.clone(), tb).unwrap();
        let neq_a = Literal::neq(fa, ta).unwrap();

        assert!(eq_a.subsumes(&eq_a));
        // t = a implies t != b
        assert!(eq_a.subsumes(&neq_b));
        assert!(!eq_a.subsumes(&neq_a));
        assert!(!neq_b.subsumes(&eq_a));
    }
}
