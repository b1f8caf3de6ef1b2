//! The split-and-check decision procedure for objective formulas.
//!
//! `entails(k, phi)` decides whether the setup forces `phi` at split level
//! k: try the budget-0 reduction first, then pick an undetermined primitive
//! term and require every branch `t == n` over the term's name pool to
//! succeed at level k-1. The branch disjunction is exhaustive because the
//! pool carries placeholder names standing for "everything else".
//!
//! `consistent(k, phi)` is the dual used for `Cons`: find one sequence of
//! at most k fixed units under which the setup stays locally consistent
//! with `phi`. More budget can only help, so `Cons` is monotone increasing
//! in k, as is `Know`.
//!
//! Both procedures are sound but incomplete; anything inconclusive is
//! reported as `false`.

use crate::fol::{Clause, Interner, Literal, Term};
use crate::formula::{Formula, Level};
use crate::grounder::Grounder;
use crate::setup::Setup;
use indexmap::IndexSet;

#[derive(Debug)]
pub struct Solver {
    setup: Setup,
}

impl Solver {
    pub fn new(clauses: impl IntoIterator<Item = Clause>) -> Solver {
        let mut setup = Setup::new();
        for c in clauses {
            setup.add_clause(c);
        }
        Solver { setup }
    }

    pub fn setup(&self) -> &Setup {
        &self.setup
    }

    /// Does the setup entail `phi` at split level `k`? `phi` must be
    /// objective and closed (quantified variables are fine).
    pub fn entails(&mut self, k: Level, phi: &Formula, pool: &Grounder, itn: &mut Interner) -> bool {
        if phi.trivially_valid() {
            return true;
        }
        split(&mut self.setup, k, phi, pool, itn)
    }

    /// Is the setup consistent with `phi` at split level `k`?
    pub fn consistent(
        &mut self,
        k: Level,
        phi: &Formula,
        pool: &Grounder,
        itn: &mut Interner,
    ) -> bool {
        if phi.trivially_invalid() {
            return false;
        }
        fix(&mut self.setup, k, phi, pool, itn)
    }
}

// One level of case splitting: every branch over the pool of some
// undetermined primitive term must succeed.
fn split(setup: &mut Setup, k: Level, phi: &Formula, pool: &Grounder, itn: &mut Interner) -> bool {
    if holds(setup, phi, pool, itn) {
        return true;
    }
    if k == 0 {
        return false;
    }
    for t in split_candidates(setup, phi) {
        let names: Vec<Term> = pool.names(t.sort()).to_vec();
        if names.is_empty() {
            continue;
        }
        let mut all = true;
        for n in &names {
            let mut fork = setup.shallow_copy();
            fork.add_unit(Literal::new(true, t.clone(), n.clone()));
            let ok = split(&mut fork, k - 1, phi, pool, itn);
            drop(fork);
            if !ok {
                all = false;
                break;
            }
        }
        if all {
            return true;
        }
    }
    false
}

// One level of fixing: some unit assignment to some candidate term must
// leave a consistent branch.
fn fix(setup: &mut Setup, k: Level, phi: &Formula, pool: &Grounder, itn: &mut Interner) -> bool {
    if compatible(setup, phi, pool, itn) {
        return true;
    }
    if k == 0 {
        return false;
    }
    for t in split_candidates(setup, phi) {
        let names: Vec<Term> = pool.names(t.sort()).to_vec();
        for n in &names {
            let mut fork = setup.shallow_copy();
            fork.add_unit(Literal::new(true, t.clone(), n.clone()));
            let ok =
                !fork.contains_empty_clause() && fix(&mut fork, k - 1, phi, pool, itn);
            drop(fork);
            if ok {
                return true;
            }
        }
    }
    false
}

// Budget-0 entailment:
//   clause         -> subsumption query
//   phi || psi     -> either side (sound, incomplete)
//   Ex x phi       -> some name from the pool
//   !phi           -> the setup knows the negation (see `refutes`)
fn holds(setup: &Setup, phi: &Formula, pool: &Grounder, itn: &mut Interner) -> bool {
    match phi {
        Formula::Atomic(c) => setup.subsumes(c),
        Formula::Not(a) => refutes(setup, a, pool, itn),
        Formula::Or(l, r) => holds(setup, l, pool, itn) || holds(setup, r, pool, itn),
        Formula::Exists(x, a) => {
            let names: Vec<Term> = pool.names(x.sort()).to_vec();
            for n in &names {
                let inst = a.as_ref().clone().ground_var(x, n, itn);
                if holds(setup, &inst, pool, itn) {
                    return true;
                }
            }
            false
        }
        // Modal residue (distribute = false): refuse to decide.
        _ => false,
    }
}

// Budget-0 refutation: Know(!(a1 || ... || am)) decomposes into knowing
// each flipped literal; quantifiers dualize over the pool.
fn refutes(setup: &Setup, phi: &Formula, pool: &Grounder, itn: &mut Interner) -> bool {
    match phi {
        Formula::Atomic(c) => c
            .iter()
            .all(|a| setup.subsumes(&Clause::unit(a.flip()))),
        Formula::Not(a) => holds(setup, a, pool, itn),
        Formula::Or(l, r) => refutes(setup, l, pool, itn) && refutes(setup, r, pool, itn),
        Formula::Exists(x, a) => {
            let names: Vec<Term> = pool.names(x.sort()).to_vec();
            for n in &names {
                let inst = a.as_ref().clone().ground_var(x, n, itn);
                if !refutes(setup, &inst, pool, itn) {
                    return false;
                }
            }
            true
        }
        _ => false,
    }
}

// Budget-0 consistency: is the setup locally consistent together with phi?
fn compatible(setup: &Setup, phi: &Formula, pool: &Grounder, itn: &mut Interner) -> bool {
    if setup.contains_empty_clause() {
        return false;
    }
    match phi {
        Formula::Atomic(c) => c.valid() || setup.locally_consistent_clause(c),
        Formula::Or(l, r) => compatible(setup, l, pool, itn) || compatible(setup, r, pool, itn),
        Formula::Exists(x, a) => {
            let names: Vec<Term> = pool.names(x.sort()).to_vec();
            for n in &names {
                let inst = a.as_ref().clone().ground_var(x, n, itn);
                if compatible(setup, &inst, pool, itn) {
                    return true;
                }
            }
            false
        }
        Formula::Not(a) => compatible_neg(setup, a, pool, itn),
        _ => false,
    }
}

// Consistency with the negation of phi.
fn compatible_neg(setup: &Setup, phi: &Formula, pool: &Grounder, itn: &mut Interner) -> bool {
    match phi {
        // !(a1 || ... || am) is the conjunction of the flips; check each
        // against its own lhs bucket.
        Formula::Atomic(c) => c.iter().all(|a| setup.locally_consistent(&a.flip())),
        Formula::Not(a) => compatible(setup, a, pool, itn),
        Formula::Or(l, r) => {
            compatible_neg(setup, l, pool, itn) && compatible_neg(setup, r, pool, itn)
        }
        Formula::Exists(x, a) => {
            let names: Vec<Term> = pool.names(x.sort()).to_vec();
            for n in &names {
                let inst = a.as_ref().clone().ground_var(x, n, itn);
                if !compatible_neg(setup, &inst, pool, itn) {
                    return false;
                }
            }
            true
        }
        _ => false,
    }
}

// Undetermined primitive terms from the setup and the query, smallest term
// id first for reproducibility.
fn split_candidates(setup: &Setup, phi: &Formula) -> Vec<Term> {
    let mut terms = IndexSet::new();
    setup.collect_primitive_terms(&mut terms);
    phi.visit_clauses(&mut |c| {
        for a in c.iter() {
            if a.lhs().is_primitive() {
                terms.insert(a.lhs().clone());
            }
        }
    });
    let mut v: Vec<Term> = terms
        .into_iter()
        .filter(|t| !setup.determined(t))
        .collect();
    v.sort_by_key(Term::id);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    // The two-name disjunction knowledge base: p(m) == t || p(n) == t.
    struct Fix {
        itn: Interner,
        pool: Grounder,
        solver: Solver,
        t: Term,
        pm: Term,
        pn: Term,
        x: Term,
    }

    fn fix() -> Fix {
        let mut itn = Interner::new();
        let mut pool = Grounder::new();
        let thing = itn.new_sort();
        let boolean = itn.new_sort();
        let m = itn.new_name(thing);
        let n = itn.new_name(thing);
        let t = itn.new_name(boolean);
        let p = itn.new_function(boolean, 1);
        let m = itn.leaf(m);
        let n = itn.leaf(n);
        let t = itn.leaf(t);
        let pm = itn.term(p, vec![m.clone()]).unwrap();
        let pn = itn.term(p, vec![n.clone()]).unwrap();
        let x = itn.fresh_variable(thing);

        pool.add_name(&m);
        pool.add_name(&n);
        pool.add_name(&t);
        pool.ensure_placeholders(thing, 2, &mut itn);
        pool.ensure_placeholders(boolean, 2, &mut itn);

        let kb = Clause::new(vec![
            Literal::new(true, pm.clone(), t.clone()),
            Literal::new(true, pn.clone(), t.clone()),
        ]);
        let solver = Solver::new(vec![kb]);
        Fix {
            itn,
            pool,
            solver,
            t,
            pm,
            pn,
            x,
        }
    }

    fn p_of(f: &mut Fix, arg: &Term) -> Formula {
        let p = f.pm.symbol();
        let term = f.itn.term(p, vec![arg.clone()]).unwrap();
        Formula::Atomic(Clause::unit(Literal::new(true, term, f.t.clone())))
    }

    #[test]
    fn test_exists_needs_split() {
        let mut f = fix();
        let x = f.x.clone();
        let body = p_of(&mut f, &x);
        let phi = Formula::exists(x, body);
        assert!(!f.solver.entails(0, &phi, &f.pool, &mut f.itn));
        assert!(f.solver.entails(1, &phi, &f.pool, &mut f.itn));
        // monotone in the split budget
        assert!(f.solver.entails(2, &phi, &f.pool, &mut f.itn));
    }

    #[test]
    fn test_no_single_witness_is_known() {
        let mut f = fix();
        let pm = Formula::Atomic(Clause::unit(Literal::new(
            true,
            f.pm.clone(),
            f.t.clone(),
        )));
        let pn = Formula::Atomic(Clause::unit(Literal::new(
            true,
            f.pn.clone(),
            f.t.clone(),
        )));
        assert!(!f.solver.entails(1, &pm, &f.pool, &mut f.itn));
        assert!(!f.solver.entails(1, &pn, &f.pool, &mut f.itn));
    }

    #[test]
    fn test_each_disjunct_is_consistent() {
        let mut f = fix();
        let pm = Formula::Atomic(Clause::unit(Literal::new(
            true,
            f.pm.clone(),
            f.t.clone(),
        )));
        assert!(f.solver.consistent(1, &pm, &f.pool, &mut f.itn));
    }

    #[test]
    fn test_trivial_validity_short_circuits() {
        let mut f = fix();
        let valid = Formula::Atomic(Clause::unit(Literal::new(
            true,
            f.t.clone(),
            f.t.clone(),
        )));
        assert!(f.solver.entails(0, &valid, &f.pool, &mut f.itn));
        assert!(!f
            .solver
            .consistent(0, &Formula::falsity(), &f.pool, &mut f.itn));
    }

    #[test]
    fn test_split_restores_setup() {
        let mut f = fix();
        let x = f.x.clone();
        let body = p_of(&mut f, &x);
        let phi = Formula::exists(x, body);
        let units_before = f.solver.setup().units().len();
        let clauses_before = f.solver.setup().clauses().count();
        f.solver.entails(2, &phi, &f.pool, &mut f.itn);
        assert_eq!(f.solver.setup().units().len(), units_before);
        assert_eq!(f.solver.setup().clauses().count(), clauses_before);
    }
}
