//! Name pools and grounding.
//!
//! The grounder keeps one pool of names per sort: the ordinary names in
//! first-mention order followed by the placeholder names it has minted.
//! Universal clauses are ground by enumerating substitutions of their
//! variables over the pools; placeholders make the enumeration stand in
//! for quantification over the whole (infinite) domain, because every
//! clause in play only mentions pool names and a placeholder behaves like
//! any individual not mentioned at all.

use crate::fol::{Clause, Interner, Sort, Term};
use indexmap::{IndexMap, IndexSet};

#[derive(Debug, Default)]
pub struct Grounder {
    pools: IndexMap<Sort, Vec<Term>>,
}

impl Grounder {
    pub fn new() -> Grounder {
        Grounder::default()
    }

    /// The names of a sort, ordinary names first, in a stable order.
    pub fn names(&self, sort: Sort) -> &[Term] {
        self.pools.get(&sort).map_or(&[], Vec::as_slice)
    }

    /// Every sort with a (possibly empty) pool, in first-seen order.
    pub fn sorts(&self) -> Vec<Sort> {
        self.pools.keys().copied().collect()
    }

    /// Register an ordinary name. Returns true if the pool grew.
    pub fn add_name(&mut self, n: &Term) -> bool {
        debug_assert!(n.is_name());
        let pool = self.pools.entry(n.sort()).or_default();
        if pool.contains(n) {
            return false;
        }
        // ordinary names stay in front of the placeholders
        let at = pool.iter().position(Term::is_placeholder).unwrap_or(pool.len());
        pool.insert(at, n.clone());
        true
    }

    /// Make sure the sort's pool carries at least `want` placeholder names.
    /// Returns true if any were minted.
    pub fn ensure_placeholders(&mut self, sort: Sort, want: usize, itn: &mut Interner) -> bool {
        let pool = self.pools.entry(sort).or_default();
        let have = pool.iter().filter(|t| t.is_placeholder()).count();
        for _ in have..want {
            pool.push(itn.fresh_placeholder(sort));
        }
        have < want
    }

    /// The number of placeholders currently in the sort's pool.
    pub fn placeholder_count(&self, sort: Sort) -> usize {
        self.names(sort).iter().filter(|t| t.is_placeholder()).count()
    }

    /// All ground instances of a quasi-primitive clause over the pools,
    /// with tautological instances dropped. A sort whose pool is empty gets
    /// one placeholder minted lazily.
    pub fn ground_clause(&mut self, c: &Clause, itn: &mut Interner) -> Vec<Clause> {
        let mut vars = IndexSet::new();
        c.collect_variables(&mut vars);
        if vars.is_empty() {
            return if c.valid() { Vec::new() } else { vec![c.clone()] };
        }
        for x in &vars {
            if self.names(x.sort()).is_empty() {
                self.ensure_placeholders(x.sort(), 1, itn);
            }
        }

        let vars: Vec<Term> = vars.into_iter().collect();
        let mut out = Vec::new();
        let mut choice = vec![0usize; vars.len()];
        loop {
            let mut theta: IndexMap<Term, Term> = IndexMap::new();
            for (x, &i) in vars.iter().zip(choice.iter()) {
                theta.insert(x.clone(), self.names(x.sort())[i].clone());
            }
            let inst = c.substitute(itn, &|t| theta.get(t).cloned());
            if !inst.valid() {
                out.push(inst);
            }
            // odometer step over the per-sort pools
            let mut pos = vars.len();
            loop {
                if pos == 0 {
                    return out;
                }
                pos -= 1;
                choice[pos] += 1;
                if choice[pos] < self.names(vars[pos].sort()).len() {
                    break;
                }
                choice[pos] = 0;
            }
        }
    }
}
