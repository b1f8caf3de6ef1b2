//! The knowledge base: universal clauses, belief conditionals, and the
//! query decision procedure.
//!
//! `add` accepts universally quantified objective clauses (possibly under
//! `Guarantee` or `Know`, which are transparent for axioms) and conditional
//! beliefs `Bel<k,l>(ante => conse)`; anything else is rejected and `add`
//! returns false.
//!
//! Conditionals are ranked into a system of spheres, most plausible first:
//! sphere 0 carries the knowledge plus the material form of every
//! conditional; a conditional whose antecedent is consistent at a sphere
//! belongs there and drops out of the later spheres; iterate until no
//! progress, closing with a knowledge-only sphere. `Know` and `Cons`
//! queries run against sphere 0; a `Bel` query finds the first sphere
//! consistent with its antecedent and decides the material implication
//! there.
//!
//! Queries are reduced recursively: quantifiers outside modal operators
//! are ground over the name pools, modal sub-formulas get definitive
//! boolean verdicts from the solver, and what remains is decided by
//! syntactic validity alone, so an inconclusive query answers false.

use crate::fol::{Clause, Interner, Sort, Term};
use crate::formula::{Formula, Level};
use crate::grounder::Grounder;
use crate::solver::Solver;
use indexmap::{IndexMap, IndexSet};

#[derive(Debug)]
struct Conditional {
    k: Level,
    l: Level,
    ante: Formula,
    /// The universal clause form of `!ante || conse`.
    material: Clause,
}

#[derive(Debug, Default)]
pub struct KnowledgeBase {
    knowledge: Vec<Clause>,
    conditionals: Vec<Conditional>,
    pool: Grounder,
    spheres: Vec<Solver>,
    dirty: bool,
}

impl KnowledgeBase {
    pub fn new() -> KnowledgeBase {
        KnowledgeBase::default()
    }

    /// The universal clauses added so far (ungrounded).
    pub fn knowledge(&self) -> &[Clause] {
        &self.knowledge
    }

    pub fn conditional_count(&self) -> usize {
        self.conditionals.len()
    }

    /// The name pool, including placeholders minted for past queries.
    pub fn pool(&self) -> &Grounder {
        &self.pool
    }

    /// Add an axiom. Returns whether it was acceptable: a universally
    /// quantified objective clause (`Guarantee` and `Know` wrappers are
    /// transparent for axioms) or a closed objective conditional belief.
    pub fn add(&mut self, alpha: &Formula, itn: &mut Interner) -> bool {
        let mut phi = alpha.clone().nf(itn, true);
        loop {
            match phi {
                Formula::Guarantee(a) | Formula::Know(_, a) => phi = *a,
                _ => break,
            }
        }
        if let Formula::Bel {
            k,
            l,
            ante,
            material,
            ..
        } = &phi
        {
            if !phi.free_vars().is_empty() || !ante.objective() {
                return false;
            }
            let Some(mc) = material.as_universal_clause() else {
                return false;
            };
            self.conditionals.push(Conditional {
                k: *k,
                l: *l,
                ante: (**ante).clone(),
                material: mc,
            });
            self.dirty = true;
            return true;
        }
        match phi.as_universal_clause() {
            Some(c) => {
                self.knowledge.push(c);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Decide the query. Sound but incomplete: true means derivable at the
    /// query's modal levels, false means not derivable within the budget.
    pub fn entails(&mut self, alpha: &Formula, distribute: bool, itn: &mut Interner) -> bool {
        let sigma = alpha.clone().nf(itn, distribute);
        self.prepare(&sigma, itn);
        self.eval(&sigma, itn)
    }

    // Top up the name pools for this query and rebuild the spheres if
    // anything changed.
    fn prepare(&mut self, sigma: &Formula, itn: &mut Interner) {
        let mut grew = self.dirty;

        let mut names = IndexSet::new();
        for c in &self.knowledge {
            c.collect_names(&mut names);
        }
        for cond in &self.conditionals {
            cond.ante.collect_names(&mut names);
            cond.material.collect_names(&mut names);
        }
        sigma.collect_names(&mut names);
        for n in &names {
            grew |= self.pool.add_name(n);
        }

        let mut sorts = IndexSet::new();
        for c in &self.knowledge {
            c.collect_sorts(&mut sorts);
        }
        for cond in &self.conditionals {
            cond.ante.collect_sorts(&mut sorts);
            cond.material.collect_sorts(&mut sorts);
        }
        sigma.collect_sorts(&mut sorts);

        let mut vars = IndexSet::new();
        for c in &self.knowledge {
            c.collect_variables(&mut vars);
        }
        for cond in &self.conditionals {
            cond.ante.collect_all_variables(&mut vars);
            cond.material.collect_variables(&mut vars);
        }
        sigma.collect_all_variables(&mut vars);
        let mut var_count: IndexMap<Sort, usize> = IndexMap::new();
        for v in &vars {
            *var_count.entry(v.sort()).or_insert(0) += 1;
        }

        let mut k_max = sigma.max_level();
        for cond in &self.conditionals {
            k_max = k_max.max(cond.k).max(cond.l);
        }

        for s in sorts {
            let want = var_count
                .get(&s)
                .copied()
                .unwrap_or(0)
                .max(k_max as usize + 1);
            grew |= self.pool.ensure_placeholders(s, want, itn);
        }

        if grew || self.spheres.is_empty() {
            self.rebuild(itn);
            self.dirty = false;
        }
    }

    // Ground the knowledge and the conditionals' material clauses over the
    // current pools and rank the conditionals into spheres.
    fn rebuild(&mut self, itn: &mut Interner) {
        self.spheres.clear();
        let mut remaining: Vec<usize> = (0..self.conditionals.len()).collect();
        loop {
            let mut clauses: Vec<Clause> = Vec::new();
            for c in &self.knowledge {
                clauses.extend(self.pool.ground_clause(c, itn));
            }
            for &i in &remaining {
                clauses.extend(self.pool.ground_clause(&self.conditionals[i].material, itn));
            }
            let mut sphere = Solver::new(clauses);
            let placed: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&i| {
                    let cond = &self.conditionals[i];
                    sphere.consistent(cond.k, &cond.ante, &self.pool, itn)
                })
                .collect();
            self.spheres.push(sphere);
            if placed.is_empty() || remaining.is_empty() {
                break;
            }
            remaining.retain(|i| !placed.contains(i));
            if remaining.is_empty() {
                let mut clauses: Vec<Clause> = Vec::new();
                for c in &self.knowledge {
                    clauses.extend(self.pool.ground_clause(c, itn));
                }
                self.spheres.push(Solver::new(clauses));
                break;
            }
        }
    }

    fn eval(&mut self, phi: &Formula, itn: &mut Interner) -> bool {
        match phi {
            Formula::Atomic(c) => c.valid(),
            Formula::Not(a) => self.eval_not(a, itn),
            Formula::Or(l, r) => self.eval(l, itn) || self.eval(r, itn),
            Formula::Exists(x, a) => {
                let names: Vec<Term> = self.pool.names(x.sort()).to_vec();
                for n in &names {
                    let inst = a.as_ref().clone().ground_var(x, n, itn);
                    if self.eval(&inst, itn) {
                        return true;
                    }
                }
                false
            }
            Formula::Know(k, a) => {
                let a = self.objectify(a, itn);
                let KnowledgeBase { spheres, pool, .. } = self;
                match spheres.first_mut() {
                    Some(s) => s.entails(*k, &a, pool, itn),
                    None => false,
                }
            }
            Formula::Cons(k, a) => {
                let a = self.objectify(a, itn);
                let KnowledgeBase { spheres, pool, .. } = self;
                match spheres.first_mut() {
                    Some(s) => s.consistent(*k, &a, pool, itn),
                    None => false,
                }
            }
            Formula::Bel {
                k,
                l,
                ante,
                material,
                ..
            } => {
                let ante = self.objectify(ante, itn);
                let material = self.objectify(material, itn);
                let KnowledgeBase { spheres, pool, .. } = self;
                for sphere in spheres.iter_mut() {
                    if sphere.consistent(*k, &ante, pool, itn) {
                        return sphere.entails(*l, &material, pool, itn);
                    }
                }
                // the antecedent is impossible at every sphere
                true
            }
            Formula::Guarantee(a) => {
                if !self.eval(a, itn) {
                    return false;
                }
                // Re-check under a wider pool: one extra placeholder per
                // sort simulates "any further name".
                let sorts: Vec<(Sort, usize)> = self
                    .pool
                    .sorts()
                    .into_iter()
                    .map(|s| (s, self.pool.placeholder_count(s)))
                    .collect();
                let mut grew = false;
                for (s, have) in sorts {
                    grew |= self.pool.ensure_placeholders(s, have + 1, itn);
                }
                if grew {
                    self.rebuild(itn);
                }
                self.eval(a, itn)
            }
        }
    }

    fn eval_not(&mut self, phi: &Formula, itn: &mut Interner) -> bool {
        match phi {
            Formula::Atomic(c) => c.invalid(),
            Formula::Not(a) => self.eval(a, itn),
            Formula::Or(l, r) => self.eval_not(l, itn) && self.eval_not(r, itn),
            Formula::Exists(x, a) => {
                let names: Vec<Term> = self.pool.names(x.sort()).to_vec();
                for n in &names {
                    let inst = a.as_ref().clone().ground_var(x, n, itn);
                    if !self.eval_not(&inst, itn) {
                        return false;
                    }
                }
                true
            }
            // Modal operators get definitive verdicts, so their negation is
            // plain boolean negation.
            other => !self.eval(other, itn),
        }
    }

    // Replace modal sub-formulas by their verdicts so the solver only ever
    // sees objective formulas. Quantifiers over modal bodies are expanded
    // over the pool.
    fn objectify(&mut self, phi: &Formula, itn: &mut Interner) -> Formula {
        if phi.objective() {
            return phi.clone();
        }
        match phi {
            Formula::Not(a) => Formula::not(self.objectify(a, itn)),
            Formula::Or(l, r) => {
                let l = self.objectify(l, itn);
                let r = self.objectify(r, itn);
                Formula::or(l, r)
            }
            Formula::Exists(x, a) => {
                let names: Vec<Term> = self.pool.names(x.sort()).to_vec();
                let mut out: Option<Formula> = None;
                for n in &names {
                    let inst = a.as_ref().clone().ground_var(x, n, itn);
                    let inst = self.objectify(&inst, itn);
                    out = Some(match out {
                        None => inst,
                        Some(o) => Formula::or(o, inst),
                    });
                }
                out.unwrap_or_else(Formula::falsity)
            }
            other => {
                if self.eval(other, itn) {
                    Formula::truth()
                } else {
                    Formula::falsity()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fol::Literal;

    struct Fix {
        itn: Interner,
        kb: KnowledgeBase,
        t: Term,
        f_: Term,
        bird: Term,
        flies: Term,
        penguin: Term,
    }

    // A small default-reasoning domain: birds normally fly, penguins are
    // birds, penguins normally do not fly.
    fn fix() -> Fix {
        let mut itn = Interner::new();
        let boolean = itn.new_sort();
        let t = itn.new_name(boolean);
        let f_ = itn.new_name(boolean);
        let bird = itn.new_function(boolean, 0);
        let flies = itn.new_function(boolean, 0);
        let penguin = itn.new_function(boolean, 0);
        let t = itn.leaf(t);
        let f_ = itn.leaf(f_);
        let bird = itn.term(bird, vec![]).unwrap();
        let flies = itn.term(flies, vec![]).unwrap();
        let penguin = itn.term(penguin, vec![]).unwrap();
        Fix {
            itn,
            kb: KnowledgeBase::new(),
            t,
            f_,
            bird,
            flies,
            penguin,
        }
    }

    fn is(t: &Term, v: &Term) -> Formula {
        Formula::Atomic(Clause::unit(Literal::new(true, t.clone(), v.clone())))
    }

    fn isnt(t: &Term, v: &Term) -> Formula {
        Formula::Atomic(Clause::unit(Literal::new(false, t.clone(), v.clone())))
    }

    #[test]
    fn test_add_accepts_clauses_and_rejects_junk() {
        let mut f = fix();
        let ax = is(&f.bird, &f.t);
        assert!(f.kb.add(&ax, &mut f.itn));
        // Cons is not a legal axiom
        assert!(!f.kb.add(&Formula::cons(0, is(&f.flies, &f.t)), &mut f.itn));
        // Know wrappers are transparent
        assert!(f.kb.add(&Formula::know(0, is(&f.flies, &f.t)), &mut f.itn));
        assert_eq!(f.kb.knowledge().len(), 2);
    }

    #[test]
    fn test_add_accepts_guaranteed_clause() {
        let mut f = fix();
        let ax = Formula::guarantee(is(&f.bird, &f.t));
        assert!(f.kb.add(&ax, &mut f.itn));
        assert_eq!(f.kb.knowledge().len(), 1);
    }

    #[test]
    fn test_know_of_added_clause() {
        let mut f = fix();
        let ax = is(&f.bird, &f.t);
        f.kb.add(&ax, &mut f.itn);
        assert!(f.kb.entails(&Formula::know(0, ax.clone()), true, &mut f.itn));
        assert!(!f
            .kb
            .entails(&Formula::know(0, is(&f.flies, &f.t)), true, &mut f.itn));
    }

    #[test]
    fn test_query_never_mutates_verdicts() {
        let mut f = fix();
        f.kb.add(&is(&f.bird, &f.t), &mut f.itn);
        let q = Formula::know(1, is(&f.bird, &f.t));
        assert!(f.kb.entails(&q, true, &mut f.itn));
        assert!(f.kb.entails(&q, true, &mut f.itn));
        let neg = Formula::cons(1, isnt(&f.bird, &f.t));
        assert!(!f.kb.entails(&neg, true, &mut f.itn));
        assert!(f.kb.entails(&q, true, &mut f.itn));
    }

    #[test]
    fn test_conditional_belief_spheres() {
        let mut f = fix();
        // birds normally fly; penguins are birds; penguins normally don't fly
        let bird = is(&f.bird, &f.t);
        let flies = is(&f.flies, &f.t);
        let penguin = is(&f.penguin, &f.t);
        let no_flies = is(&f.flies, &f.f_);

        assert!(f
            .kb
            .add(&Formula::bel(1, 1, bird.clone(), flies.clone()), &mut f.itn));
        assert!(f.kb.add(
            &Formula::implies(penguin.clone(), bird.clone()),
            &mut f.itn
        ));
        assert!(f.kb.add(
            &Formula::bel(1, 1, penguin.clone(), no_flies.clone()),
            &mut f.itn
        ));

        // believing bird => flies, but penguin => !flies
        assert!(f.kb.entails(
            &Formula::bel(1, 1, bird.clone(), flies.clone()),
            true,
            &mut f.itn
        ));
        assert!(f.kb.entails(
            &Formula::bel(1, 1, penguin.clone(), no_flies.clone()),
            true,
            &mut f.itn
        ));
        // and penguins are not believed to fly
        assert!(!f.kb.entails(
            &Formula::bel(1, 1, penguin.clone(), flies.clone()),
            true,
            &mut f.itn
        ));
    }

    #[test]
    fn test_vacuous_belief() {
        let mut f = fix();
        f.kb.add(&is(&f.bird, &f.t), &mut f.itn);
        // an antecedent inconsistent with knowledge is vacuously believed
        let impossible = isnt(&f.bird, &f.t);
        assert!(f.kb.entails(
            &Formula::bel(1, 1, impossible, is(&f.flies, &f.t)),
            true,
            &mut f.itn
        ));
    }
}
