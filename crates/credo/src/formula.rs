//! Formulas and the quasi-primitive normal form.
//!
//! The atomic entities are clauses; the connectives are negation,
//! disjunction, and the existential quantifier, plus the modal operators
//! `Know<k>`, `Cons<k>`, `Bel<k,l>`, and `Guarantee`. `nf()` rectifies a
//! formula (no variable both free and bound, no variable bound twice),
//! pushes negations inward, flattens atomic clauses so that every literal
//! is quasi-primitive, and optionally distributes the modal operators over
//! the connectives.

use crate::fol::{Clause, Interner, Literal, Sort, Term};
use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;
use std::fmt;

/// A belief level: the case-split budget of a modal operator.
pub type Level = u32;

#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    Atomic(Clause),
    Not(Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Exists(Term, Box<Formula>),
    Know(Level, Box<Formula>),
    Cons(Level, Box<Formula>),
    Bel {
        k: Level,
        l: Level,
        ante: Box<Formula>,
        conse: Box<Formula>,
        /// The material form `!ante || conse`, built once at construction.
        material: Box<Formula>,
    },
    Guarantee(Box<Formula>),
}

impl Formula {
    // === Constructors ===

    pub fn atomic(c: Clause) -> Formula {
        Formula::Atomic(c)
    }

    pub fn truth() -> Formula {
        Formula::not(Formula::Atomic(Clause::empty()))
    }

    pub fn falsity() -> Formula {
        Formula::Atomic(Clause::empty())
    }

    pub fn not(alpha: Formula) -> Formula {
        Formula::Not(Box::new(alpha))
    }

    pub fn or(lhs: Formula, rhs: Formula) -> Formula {
        Formula::Or(Box::new(lhs), Box::new(rhs))
    }

    pub fn and(lhs: Formula, rhs: Formula) -> Formula {
        Formula::not(Formula::or(Formula::not(lhs), Formula::not(rhs)))
    }

    pub fn implies(lhs: Formula, rhs: Formula) -> Formula {
        Formula::or(Formula::not(lhs), rhs)
    }

    pub fn exists(x: Term, alpha: Formula) -> Formula {
        debug_assert!(x.is_variable());
        Formula::Exists(x, Box::new(alpha))
    }

    pub fn forall(x: Term, alpha: Formula) -> Formula {
        Formula::not(Formula::exists(x, Formula::not(alpha)))
    }

    pub fn know(k: Level, alpha: Formula) -> Formula {
        Formula::Know(k, Box::new(alpha))
    }

    pub fn cons(k: Level, alpha: Formula) -> Formula {
        Formula::Cons(k, Box::new(alpha))
    }

    pub fn bel(k: Level, l: Level, ante: Formula, conse: Formula) -> Formula {
        let material = Formula::implies(ante.clone(), conse.clone());
        Formula::Bel {
            k,
            l,
            ante: Box::new(ante),
            conse: Box::new(conse),
            material: Box::new(material),
        }
    }

    pub fn guarantee(alpha: Formula) -> Formula {
        Formula::Guarantee(Box::new(alpha))
    }

    // === Syntactic classification ===

    /// No modal operator occurs.
    pub fn objective(&self) -> bool {
        match self {
            Formula::Atomic(_) => true,
            Formula::Not(a) | Formula::Exists(_, a) | Formula::Guarantee(a) => a.objective(),
            Formula::Or(l, r) => l.objective() && r.objective(),
            Formula::Know(..) | Formula::Cons(..) | Formula::Bel { .. } => false,
        }
    }

    /// Every atomic clause outside a modal operator is function-free.
    pub fn subjective(&self) -> bool {
        match self {
            Formula::Atomic(c) => c
                .iter()
                .all(|a| !a.lhs().is_function() && !a.rhs().is_function()),
            Formula::Not(a) | Formula::Exists(_, a) | Formula::Guarantee(a) => a.subjective(),
            Formula::Or(l, r) => l.subjective() && r.subjective(),
            Formula::Know(..) | Formula::Cons(..) | Formula::Bel { .. } => true,
        }
    }

    pub fn trivially_valid(&self) -> bool {
        match self {
            Formula::Atomic(c) => c.valid(),
            Formula::Not(a) => a.trivially_invalid(),
            Formula::Or(l, r) => l.trivially_valid() || r.trivially_valid(),
            Formula::Exists(_, a) => a.trivially_valid(),
            Formula::Know(_, a) => a.trivially_valid(),
            Formula::Cons(..) => false,
            Formula::Bel { material, .. } => material.trivially_valid(),
            Formula::Guarantee(a) => a.trivially_valid(),
        }
    }

    pub fn trivially_invalid(&self) -> bool {
        match self {
            Formula::Atomic(c) => c.invalid(),
            Formula::Not(a) => a.trivially_valid(),
            Formula::Or(l, r) => l.trivially_invalid() && r.trivially_invalid(),
            Formula::Exists(_, a) => a.trivially_invalid(),
            Formula::Know(..) => false,
            Formula::Cons(_, a) => a.trivially_invalid(),
            Formula::Bel { .. } => false,
            Formula::Guarantee(a) => a.trivially_invalid(),
        }
    }

    // === Traversal ===

    pub fn free_vars(&self) -> IndexSet<Term> {
        let mut bound = IndexSet::new();
        let mut out = IndexSet::new();
        self.collect_free(&mut bound, &mut out);
        out
    }

    fn collect_free(&self, bound: &mut IndexSet<Term>, out: &mut IndexSet<Term>) {
        match self {
            Formula::Atomic(c) => {
                let mut vs = IndexSet::new();
                c.collect_variables(&mut vs);
                for v in vs {
                    if !bound.contains(&v) {
                        out.insert(v);
                    }
                }
            }
            Formula::Not(a) | Formula::Guarantee(a) => a.collect_free(bound, out),
            Formula::Or(l, r) => {
                l.collect_free(bound, out);
                r.collect_free(bound, out);
            }
            Formula::Exists(x, a) => {
                let newly = bound.insert(x.clone());
                a.collect_free(bound, out);
                if newly {
                    bound.swap_remove(x);
                }
            }
            Formula::Know(_, a) | Formula::Cons(_, a) => a.collect_free(bound, out),
            Formula::Bel { material, .. } => material.collect_free(bound, out),
        }
    }

    /// Visit every atomic clause (Bel contributes its material form).
    pub fn visit_clauses(&self, f: &mut dyn FnMut(&Clause)) {
        match self {
            Formula::Atomic(c) => f(c),
            Formula::Not(a) | Formula::Exists(_, a) | Formula::Guarantee(a) => a.visit_clauses(f),
            Formula::Or(l, r) => {
                l.visit_clauses(f);
                r.visit_clauses(f);
            }
            Formula::Know(_, a) | Formula::Cons(_, a) => a.visit_clauses(f),
            Formula::Bel { material, .. } => material.visit_clauses(f),
        }
    }

    pub fn collect_names(&self, out: &mut IndexSet<Term>) {
        self.visit_clauses(&mut |c| c.collect_names(out));
    }

    /// Every variable occurring anywhere, bound or free.
    pub fn collect_all_variables(&self, out: &mut IndexSet<Term>) {
        if let Formula::Exists(x, _) = self {
            out.insert(x.clone());
        }
        match self {
            Formula::Atomic(c) => c.collect_variables(out),
            Formula::Not(a) | Formula::Exists(_, a) | Formula::Guarantee(a) => {
                a.collect_all_variables(out)
            }
            Formula::Or(l, r) => {
                l.collect_all_variables(out);
                r.collect_all_variables(out);
            }
            Formula::Know(_, a) | Formula::Cons(_, a) => a.collect_all_variables(out),
            Formula::Bel { material, .. } => material.collect_all_variables(out),
        }
    }

    pub fn collect_sorts(&self, out: &mut IndexSet<Sort>) {
        if let Formula::Exists(x, _) = self {
            out.insert(x.sort());
        }
        match self {
            Formula::Atomic(c) => c.collect_sorts(out),
            Formula::Not(a) | Formula::Exists(_, a) | Formula::Guarantee(a) => a.collect_sorts(out),
            Formula::Or(l, r) => {
                l.collect_sorts(out);
                r.collect_sorts(out);
            }
            Formula::Know(_, a) | Formula::Cons(_, a) => a.collect_sorts(out),
            Formula::Bel { material, .. } => material.collect_sorts(out),
        }
    }

    /// The highest belief level mentioned by any modal operator.
    pub fn max_level(&self) -> Level {
        match self {
            Formula::Atomic(_) => 0,
            Formula::Not(a) | Formula::Exists(_, a) | Formula::Guarantee(a) => a.max_level(),
            Formula::Or(l, r) => l.max_level().max(r.max_level()),
            Formula::Know(k, a) | Formula::Cons(k, a) => (*k).max(a.max_level()),
            Formula::Bel {
                k, l, material, ..
            } => (*k).max(*l).max(material.max_level()),
        }
    }

    // === Substitution ===

    /// Replace free occurrences of variables per `theta`.
    pub fn substitute_free(self, theta: &IndexMap<Term, Term>, itn: &mut Interner) -> Formula {
        let mut bound = IndexSet::new();
        self.subst_inner(theta, &mut bound, itn)
    }

    /// Replace free occurrences of the variable `x` by `t`.
    pub fn ground_var(self, x: &Term, t: &Term, itn: &mut Interner) -> Formula {
        let mut theta = IndexMap::new();
        theta.insert(x.clone(), t.clone());
        self.substitute_free(&theta, itn)
    }

    fn subst_inner(
        self,
        theta: &IndexMap<Term, Term>,
        bound: &mut IndexSet<Term>,
        itn: &mut Interner,
    ) -> Formula {
        match self {
            Formula::Atomic(c) => {
                let c = c.substitute(itn, &|t| {
                    if t.is_variable() && !bound.contains(t) {
                        theta.get(t).cloned()
                    } else {
                        None
                    }
                });
                Formula::Atomic(c)
            }
            Formula::Not(a) => Formula::not(a.subst_inner(theta, bound, itn)),
            Formula::Or(l, r) => Formula::or(
                l.subst_inner(theta, bound, itn),
                r.subst_inner(theta, bound, itn),
            ),
            Formula::Exists(x, a) => {
                let newly = bound.insert(x.clone());
                let a = a.subst_inner(theta, bound, itn);
                if newly {
                    bound.swap_remove(&x);
                }
                Formula::exists(x, a)
            }
            Formula::Know(k, a) => Formula::know(k, a.subst_inner(theta, bound, itn)),
            Formula::Cons(k, a) => Formula::cons(k, a.subst_inner(theta, bound, itn)),
            Formula::Bel {
                k,
                l,
                ante,
                conse,
                material,
            } => Formula::Bel {
                k,
                l,
                ante: Box::new(ante.subst_inner(theta, bound, itn)),
                conse: Box::new(conse.subst_inner(theta, bound, itn)),
                material: Box::new(material.subst_inner(theta, bound, itn)),
            },
            Formula::Guarantee(a) => Formula::guarantee(a.subst_inner(theta, bound, itn)),
        }
    }

    // === Normal form ===

    /// Rectify, push negations inward, flatten every atomic clause to
    /// quasi-primitive literals, and normalize once more. When `distribute`
    /// is set, `Know` and `Cons` are distributed over the connectives.
    pub fn nf(self, itn: &mut Interner, distribute: bool) -> Formula {
        let phi = self.rectify(itn);
        let phi = phi.normalize(distribute);
        let phi = phi.flatten(0, itn);
        phi.normalize(distribute)
    }

    /// Rename bound variables so that none occurs free elsewhere and none is
    /// bound by two different quantifiers.
    pub fn rectify(self, itn: &mut Interner) -> Formula {
        let mut used = self.free_vars();
        let mut map = IndexMap::new();
        self.rectify_inner(&mut used, &mut map, itn)
    }

    fn rectify_inner(
        self,
        used: &mut IndexSet<Term>,
        map: &mut IndexMap<Term, Term>,
        itn: &mut Interner,
    ) -> Formula {
        match self {
            Formula::Atomic(c) => {
                let c = c.substitute(itn, &|t| {
                    if t.is_variable() {
                        map.get(t).cloned()
                    } else {
                        None
                    }
                });
                Formula::Atomic(c)
            }
            Formula::Not(a) => Formula::not(a.rectify_inner(used, map, itn)),
            Formula::Or(l, r) => Formula::or(
                l.rectify_inner(used, map, itn),
                r.rectify_inner(used, map, itn),
            ),
            Formula::Exists(x, a) => {
                if used.contains(&x) {
                    let x2 = itn.fresh_variable(x.sort());
                    used.insert(x2.clone());
                    let prev = map.insert(x.clone(), x2.clone());
                    let a = a.rectify_inner(used, map, itn);
                    match prev {
                        Some(p) => {
                            map.insert(x.clone(), p);
                        }
                        None => {
                            map.swap_remove(&x);
                        }
                    }
                    Formula::exists(x2, a)
                } else {
                    used.insert(x.clone());
                    let a = a.rectify_inner(used, map, itn);
                    Formula::exists(x, a)
                }
            }
            Formula::Know(k, a) => Formula::know(k, a.rectify_inner(used, map, itn)),
            Formula::Cons(k, a) => Formula::cons(k, a.rectify_inner(used, map, itn)),
            Formula::Bel {
                k,
                l,
                ante,
                conse,
                material,
            } => Formula::Bel {
                k,
                l,
                ante: Box::new(ante.rectify_inner(used, map, itn)),
                conse: Box::new(conse.rectify_inner(used, map, itn)),
                material: Box::new(material.rectify_inner(used, map, itn)),
            },
            Formula::Guarantee(a) => Formula::guarantee(a.rectify_inner(used, map, itn)),
        }
    }

    /// Push negations inward, merge adjacent disjunctions of atomic clauses,
    /// drop vacuous quantifiers, and (optionally) distribute the modal
    /// operators.
    pub fn normalize(self, distribute: bool) -> Formula {
        match self {
            Formula::Atomic(_) => self,
            Formula::Not(a) => match *a {
                Formula::Atomic(c) => {
                    if c.is_unit() {
                        Formula::Atomic(Clause::unit(c.head().flip()))
                    } else {
                        Formula::not(Formula::Atomic(c))
                    }
                }
                Formula::Not(b) => b.normalize(distribute),
                Formula::Exists(x, b) => {
                    Formula::not(Formula::exists(x, b.normalize(distribute)))
                }
                b => Formula::not(b.normalize(distribute)),
            },
            Formula::Or(l, r) => {
                let l = l.normalize(distribute);
                let r = r.normalize(distribute);
                let (mut lp, ls) = l.split_prefix();
                let (mut rp, rs) = r.split_prefix();
                match (ls, rs) {
                    (Formula::Atomic(mut lc), Formula::Atomic(mut rc))
                        if (lp.even() || lc.is_unit()) && (rp.even() || rc.is_unit()) =>
                    {
                        if !lp.even() {
                            lp.push_back_not();
                            lc = Clause::unit(lc.head().flip());
                        }
                        if !rp.even() {
                            rp.push_back_not();
                            rc = Clause::unit(rc.head().flip());
                        }
                        let mut lits = lc.literals().to_vec();
                        lits.extend(rc.literals().iter().cloned());
                        lp.prepend_to(rp.prepend_to(Formula::Atomic(Clause::new(lits))))
                    }
                    (ls, rs) => Formula::or(lp.prepend_to(ls), rp.prepend_to(rs)),
                }
            }
            Formula::Exists(x, a) => {
                if a.free_vars().contains(&x) {
                    Formula::exists(x, a.normalize(distribute))
                } else {
                    a.normalize(distribute)
                }
            }
            Formula::Know(k, a) => {
                let a = a.normalize(distribute);
                if distribute {
                    dist_know(k, a)
                } else {
                    Formula::know(k, a)
                }
            }
            Formula::Cons(k, a) => {
                let a = a.normalize(distribute);
                if distribute {
                    dist_cons(k, a)
                } else {
                    Formula::cons(k, a)
                }
            }
            Formula::Bel {
                k,
                l,
                ante,
                conse,
                material,
            } => Formula::Bel {
                k,
                l,
                ante: Box::new(ante.normalize(distribute)),
                conse: Box::new(conse.normalize(distribute)),
                material: Box::new(material.normalize(distribute)),
            },
            Formula::Guarantee(a) => Formula::guarantee(a.normalize(distribute)),
        }
    }

    /// Peel the leading chain of negations and existentials.
    fn split_prefix(self) -> (Prefix, Formula) {
        let mut prefix = Prefix::default();
        let mut cur = self;
        loop {
            match cur {
                Formula::Not(a) => {
                    prefix.elems.push(PrefixElem::Not);
                    cur = *a;
                }
                Formula::Exists(x, a) => {
                    prefix.elems.push(PrefixElem::Exists(x));
                    cur = *a;
                }
                other => return (prefix, other),
            }
        }
    }

    /// Replace non-quasi-primitive literals by equivalent quasi-primitive
    /// sets, introducing quantified variables for nested function terms.
    /// `nots` is the number of negations between the formula root and here.
    pub fn flatten(self, nots: usize, itn: &mut Interner) -> Formula {
        match self {
            Formula::Atomic(c) => flatten_clause(c, nots, itn),
            Formula::Not(a) => Formula::not(a.flatten(nots + 1, itn)),
            Formula::Or(l, r) => Formula::or(l.flatten(nots, itn), r.flatten(nots, itn)),
            Formula::Exists(x, a) => Formula::exists(x, a.flatten(nots, itn)),
            Formula::Know(k, a) => Formula::know(k, a.flatten(0, itn)),
            Formula::Cons(k, a) => Formula::cons(k, a.flatten(0, itn)),
            Formula::Bel {
                k,
                l,
                ante,
                conse,
                material,
            } => Formula::Bel {
                k,
                l,
                ante: Box::new(ante.flatten(0, itn)),
                conse: Box::new(conse.flatten(0, itn)),
                material: Box::new(material.flatten(0, itn)),
            },
            Formula::Guarantee(a) => Formula::guarantee(a.flatten(nots, itn)),
        }
    }

    /// Recognize a universally quantified objective clause: an even number
    /// of negations around a (possibly `Exists`-under-odd-parity prefixed)
    /// disjunction of flat literals.
    pub fn as_universal_clause(&self) -> Option<Clause> {
        self.univ_clause(0)
    }

    fn univ_clause(&self, nots: usize) -> Option<Clause> {
        match self {
            Formula::Atomic(c) => {
                if nots % 2 == 0 && c.is_quasi_primitive() {
                    Some(c.clone())
                } else {
                    None
                }
            }
            Formula::Not(a) => a.univ_clause(nots + 1),
            Formula::Or(l, r) => {
                if nots % 2 != 0 {
                    return None;
                }
                let lc = l.univ_clause(nots)?;
                let rc = r.univ_clause(nots)?;
                let mut lits = lc.literals().to_vec();
                lits.extend(rc.literals().iter().cloned());
                Some(Clause::new(lits))
            }
            Formula::Exists(_, a) => {
                if nots % 2 == 1 {
                    a.univ_clause(nots)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// A canonical textual form with bound variables renumbered by first
    /// occurrence and clause literals in textual order. Two formulas equal
    /// up to bound-variable renaming render identically.
    pub fn canonical_form(&self) -> String {
        let mut names = IndexMap::new();
        self.render_canonical(&mut names)
    }

    fn render_canonical(&self, names: &mut IndexMap<u32, usize>) -> String {
        match self {
            Formula::Atomic(c) => {
                let mut lits: Vec<String> = c
                    .iter()
                    .map(|a| {
                        format!(
                            "{} {} {}",
                            render_term(a.lhs(), names),
                            if a.pos() { "==" } else { "!=" },
                            render_term(a.rhs(), names)
                        )
                    })
                    .collect();
                lits.sort();
                format!("[{}]", lits.join(" || "))
            }
            Formula::Not(a) => format!("!{}", a.render_canonical(names)),
            Formula::Or(l, r) => format!(
                "({} || {})",
                l.render_canonical(names),
                r.render_canonical(names)
            ),
            Formula::Exists(x, a) => {
                let n = names.len();
                let idx = *names.entry(x.id()).or_insert(n);
                format!("Ex v{} {}", idx, a.render_canonical(names))
            }
            Formula::Know(k, a) => format!("Know<{}> {}", k, a.render_canonical(names)),
            Formula::Cons(k, a) => format!("Cons<{}> {}", k, a.render_canonical(names)),
            Formula::Bel { k, l, ante, conse, .. } => format!(
                "Bel<{},{}> ({} => {})",
                k,
                l,
                ante.render_canonical(names),
                conse.render_canonical(names)
            ),
            Formula::Guarantee(a) => format!("G {}", a.render_canonical(names)),
        }
    }
}

fn render_term(t: &Term, names: &mut IndexMap<u32, usize>) -> String {
    if t.is_variable() {
        let n = names.len();
        let idx = *names.entry(t.id()).or_insert(n);
        return format!("v{}", idx);
    }
    let mut s = t.symbol().to_string();
    if !t.args().is_empty() {
        let args: Vec<String> = t.args().iter().map(|a| render_term(a, names)).collect();
        s.push('(');
        s.push_str(&args.join(","));
        s.push(')');
    }
    s
}

// === Quantifier prefixes ===

#[derive(Debug, Clone)]
enum PrefixElem {
    Not,
    Exists(Term),
}

#[derive(Debug, Clone, Default)]
struct Prefix {
    elems: Vec<PrefixElem>,
}

impl Prefix {
    fn even(&self) -> bool {
        self.elems
            .iter()
            .filter(|e| matches!(e, PrefixElem::Not))
            .count()
            % 2
            == 0
    }

    fn push_back_not(&mut self) {
        self.elems.push(PrefixElem::Not);
    }

    fn prepend_to(self, mut alpha: Formula) -> Formula {
        for e in self.elems.into_iter().rev() {
            alpha = match e {
                PrefixElem::Not => Formula::not(alpha),
                PrefixElem::Exists(x) => Formula::exists(x, alpha),
            };
        }
        alpha
    }
}

// === Modal distribution ===

// Know<k> distributes through a negated body by de Morgan:
//   Know(!c)        with unit c          ->  Know(flip c)
//   Know(!c)        with |c| >= 2        ->  !(!Know(!a1) || ... || !Know(!am))
//   Know(!!b)                            ->  distribute Know(b)
//   Know(!(l || r))                      ->  !(!Know(!l) || !Know(!r))
//   Know(!(Ex x b))                      ->  !Ex x !Know(!b)
fn dist_know(k: Level, alpha: Formula) -> Formula {
    if let Formula::Not(beta) = &alpha {
        match beta.as_ref() {
            Formula::Atomic(c) => {
                if c.is_unit() {
                    return Formula::know(k, Formula::Atomic(Clause::unit(c.head().flip())));
                }
                if c.len() >= 2 {
                    let mut gamma: Option<Formula> = None;
                    for a in c.iter() {
                        let delta = Formula::not(Formula::know(
                            k,
                            Formula::Atomic(Clause::unit(a.flip())),
                        ));
                        gamma = Some(match gamma {
                            None => delta,
                            Some(g) => Formula::or(g, delta),
                        });
                    }
                    if let Some(g) = gamma {
                        return Formula::not(g);
                    }
                }
            }
            Formula::Not(g) => return dist_know(k, (**g).clone()),
            Formula::Or(l, r) => {
                return Formula::not(Formula::or(
                    Formula::not(dist_know(k, Formula::not((**l).clone()))),
                    Formula::not(dist_know(k, Formula::not((**r).clone()))),
                ))
            }
            Formula::Exists(x, body) => {
                return Formula::not(Formula::exists(
                    x.clone(),
                    Formula::not(dist_know(k, Formula::not((**body).clone()))),
                ))
            }
            _ => {}
        }
    }
    Formula::know(k, alpha)
}

// Cons<k> distributes over disjunction and existentials directly:
// consistency of a disjunction is the disjunction of consistencies.
fn dist_cons(k: Level, alpha: Formula) -> Formula {
    match alpha {
        Formula::Atomic(c) if c.len() >= 2 => {
            let mut gamma: Option<Formula> = None;
            for a in c.iter() {
                let delta = Formula::cons(k, Formula::Atomic(Clause::unit(a.clone())));
                gamma = Some(match gamma {
                    None => delta,
                    Some(g) => Formula::or(g, delta),
                });
            }
            match gamma {
                Some(g) => g,
                None => Formula::cons(k, Formula::Atomic(c)),
            }
        }
        Formula::Or(l, r) => Formula::or(dist_cons(k, *l), dist_cons(k, *r)),
        Formula::Exists(x, b) => Formula::exists(x, dist_cons(k, *b)),
        other => Formula::cons(k, other),
    }
}

// === Flattening ===

// The following two forms are equivalent provided x1..xN do not occur in
// t1..tN:
//   (1)  Fa x1 .. Fa xN (t1 != x1 || ... || tN != xN || c[xi/ti])
//   (2)  Ex x1 .. Ex xN (t1 == x1 && ... && tN == xN && c[xi/ti])
// Form (1) is one bigger clause and is what the reasoner prefers, so the
// result is !Ex x1..xN !(lits). Under an odd number of negations the
// correct reading is (2); for a unit clause the literal is flipped first
// and the outer negation dropped, which preserves the clausal structure.
fn flatten_clause(c: Clause, nots: usize, itn: &mut Interner) -> Formula {
    let double_negate = nots % 2 == 1 && c.is_unit();
    let base = if double_negate {
        Clause::unit(c.head().flip())
    } else {
        c.clone()
    };

    let mut queue: VecDeque<Literal> = base.iter().cloned().collect();
    let mut term_to_var: IndexMap<Term, Term> = IndexMap::new();
    // Reuse variables from literals of the form t != x already present.
    for a in &queue {
        if !a.pos() && a.lhs().is_function() && a.rhs().is_variable() {
            term_to_var.insert(a.lhs().clone(), a.rhs().clone());
        }
    }

    let mut fresh: Vec<Term> = Vec::new();
    let mut lits: Vec<Literal> = Vec::new();
    while let Some(a) = queue.pop_front() {
        if a.is_flat() {
            lits.push(a);
            continue;
        }
        let old_t = if a.lhs().is_quasi_primitive() {
            // Both sides are function-headed; variabilize the smaller one.
            if a.lhs().args().len() < a.rhs().args().len() {
                a.lhs().clone()
            } else {
                a.rhs().clone()
            }
        } else {
            // The lhs nests a function-headed argument; pull that out first.
            match a.lhs().args().iter().find(|t| t.is_function()).cloned() {
                Some(arg) => arg,
                None => {
                    // rhs must be the offending side
                    a.rhs().clone()
                }
            }
        };
        let x = match term_to_var.get(&old_t) {
            Some(x) => x.clone(),
            None => {
                let x = itn.fresh_variable(old_t.sort());
                term_to_var.insert(old_t.clone(), x.clone());
                fresh.push(x.clone());
                x
            }
        };
        let old2 = old_t.clone();
        let x2 = x.clone();
        let new_a = a.substitute(itn, &move |t| {
            if *t == old2 {
                Some(x2.clone())
            } else {
                None
            }
        });
        queue.push_back(new_a);
        queue.push_back(Literal::new(false, x, old_t));
    }

    if fresh.is_empty() {
        return Formula::Atomic(c);
    }
    let mut phi = Formula::not(Formula::Atomic(Clause::new(lits)));
    for x in fresh.into_iter().rev() {
        phi = Formula::exists(x, phi);
    }
    if !double_negate {
        phi = Formula::not(phi);
    }
    phi
}

// === Display ===

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_with(self, None, f)
    }
}

/// Display wrapper resolving labels through the interner.
pub struct FormulaDisplay<'a> {
    pub(crate) formula: &'a Formula,
    pub(crate) itn: &'a Interner,
}

impl Interner {
    pub fn display_formula<'a>(&'a self, formula: &'a Formula) -> FormulaDisplay<'a> {
        FormulaDisplay { formula, itn: self }
    }
}

impl fmt::Display for FormulaDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_with(self.formula, Some(self.itn), f)
    }
}

fn fmt_with(phi: &Formula, itn: Option<&Interner>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let term = |t: &Term| -> String {
        match itn {
            Some(itn) => itn.display_term(t).to_string(),
            None => t.to_string(),
        }
    };
    match phi {
        Formula::Atomic(c) => {
            if c.is_empty() {
                return write!(f, "False");
            }
            write!(f, "(")?;
            for (i, a) in c.iter().enumerate() {
                if i > 0 {
                    write!(f, " || ")?;
                }
                write!(
                    f,
                    "{} {} {}",
                    term(a.lhs()),
                    if a.pos() { "==" } else { "!=" },
                    term(a.rhs())
                )?;
            }
            write!(f, ")")
        }
        Formula::Not(a) => {
            write!(f, "!")?;
            fmt_with(a, itn, f)
        }
        Formula::Or(l, r) => {
            write!(f, "(")?;
            fmt_with(l, itn, f)?;
            write!(f, " || ")?;
            fmt_with(r, itn, f)?;
            write!(f, ")")
        }
        Formula::Exists(x, a) => {
            write!(f, "Ex {} ", term(x))?;
            fmt_with(a, itn, f)
        }
        Formula::Know(k, a) => {
            write!(f, "Know<{}> ", k)?;
            fmt_with(a, itn, f)
        }
        Formula::Cons(k, a) => {
            write!(f, "Cons<{}> ", k)?;
            fmt_with(a, itn, f)
        }
        Formula::Bel { k, l, ante, conse, .. } => {
            write!(f, "Bel<{},{}> (", k, l)?;
            fmt_with(ante, itn, f)?;
            write!(f, " => ")?;
            fmt_with(conse, itn, f)?;
            write!(f, ")")
        }
        Formula::Guarantee(a) => {
            write!(f, "G ")?;
            fmt_with(a, itn, f)
        }
    }
}
