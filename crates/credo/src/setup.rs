//! The setup: a store of primitive clauses closed under unit propagation
//! and minimized under subsumption.
//!
//! The typical lifecycle is to populate a setup with `add_clause`, answer
//! queries with `subsumes`, `consistent`, and `locally_consistent`, and fork
//! `shallow_copy` handles to explore case splits. A shallow copy records
//! the current sizes and restores them when dropped, so a fork costs O(1)
//! to open and O(1) to close; while any fork is live only `add_unit` may
//! mutate the setup, and `add_clause` is a programming error.
//!
//! Units are stored in a vector whose sealed prefix (everything present
//! before the latest minimization) is kept sorted for binary-search lookup
//! by lhs; units added through a fork sit behind the seal in insertion
//! order. Clauses are vector-indexed with a dead mask; a per-lhs occurrence
//! index, frozen while forks are live, drives propagation. Queries evaluate
//! against the effective clause set: each live clause is re-propagated
//! against the current units on the fly, and satisfied clauses are skipped,
//! which is what makes fork rollback a pair of truncations.

use crate::fol::{Clause, Literal, Propagation, Term};
use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

#[derive(Debug, Default)]
pub struct Setup {
    clauses: Vec<Clause>,
    dead: Vec<bool>,
    /// Maps each lhs to the clauses whose literals mention it. Entries are
    /// only added by `add_clause`; stale entries after shrinking are
    /// harmless.
    index: IndexMap<Term, Vec<usize>>,
    units: Vec<Literal>,
    /// Units below this index are sorted (and deduplicated).
    sealed: usize,
    empty: bool,
    forks: u32,
}

impl Setup {
    pub fn new() -> Setup {
        Setup::default()
    }

    /// Whether the empty clause has been derived.
    pub fn contains_empty_clause(&self) -> bool {
        self.empty
    }

    pub fn units(&self) -> &[Literal] {
        &self.units
    }

    /// The live clauses, as stored (not re-propagated).
    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses
            .iter()
            .zip(self.dead.iter())
            .filter(|(_, dead)| !**dead)
            .map(|(c, _)| c)
    }

    // === Construction ===

    /// Add a primitive clause, close under unit propagation, and minimize.
    /// Must not be called while a shallow copy is live.
    pub fn add_clause(&mut self, c: Clause) {
        debug_assert_eq!(self.forks, 0, "setup mutated while shallow-copied");
        if self.empty || c.valid() {
            return;
        }
        let c = match self.propagate_all(&c) {
            None => return,
            Some(c) => c,
        };
        if self.subsumes(&c) {
            return;
        }
        if c.is_empty() {
            self.empty = true;
            return;
        }
        if c.is_unit() {
            let a = c.head().clone();
            self.add_unit(a);
        } else {
            let i = self.clauses.len();
            let lhss: IndexSet<Term> = c.iter().map(|a| a.lhs().clone()).collect();
            for lhs in lhss {
                self.index.entry(lhs).or_default().push(i);
            }
            self.clauses.push(c);
            self.dead.push(false);
        }
        self.minimize();
    }

    /// Add a unit literal and propagate to closure. New units produced by
    /// shrinking clauses are enqueued breadth-first. Never rewrites the
    /// clause store, so it is legal through a shallow copy.
    pub fn add_unit(&mut self, a: Literal) {
        if self.empty {
            return;
        }
        let mut queue = VecDeque::new();
        queue.push_back(a);
        while let Some(b) = queue.pop_front() {
            if b.valid() {
                continue;
            }
            if b.invalid() {
                self.empty = true;
                return;
            }
            if self.units_with_lhs(b.lhs()).any(|u| u.subsumes(&b)) {
                continue;
            }
            if self
                .units_with_lhs(b.lhs())
                .any(|u| Literal::complementary(u, &b))
            {
                self.empty = true;
                return;
            }
            let affected: Vec<usize> = self.index.get(b.lhs()).cloned().unwrap_or_default();
            self.units.push(b);
            for i in affected {
                match self.effective(i) {
                    None => {}
                    Some(c) => {
                        if c.is_empty() {
                            self.empty = true;
                            return;
                        }
                        if c.is_unit() {
                            queue.push_back(c.head().clone());
                        }
                    }
                }
            }
        }
    }

    // Physically shrink clauses against the units, route freshly unit
    // clauses to `add_unit`, and disable clauses subsumed by another.
    // Only runs while unforked.
    fn minimize(&mut self) {
        debug_assert_eq!(self.forks, 0, "setup mutated while shallow-copied");
        let mut changed = true;
        while changed && !self.empty {
            changed = false;
            for i in 0..self.clauses.len() {
                if self.dead[i] {
                    continue;
                }
                match self.propagate_all(&self.clauses[i]) {
                    None => {
                        self.dead[i] = true;
                        changed = true;
                    }
                    Some(c) => {
                        if c.is_empty() {
                            self.dead[i] = true;
                            self.empty = true;
                            changed = true;
                        } else if c.is_unit() {
                            self.dead[i] = true;
                            self.add_unit(c.head().clone());
                            changed = true;
                        } else if c.len() < self.clauses[i].len() {
                            self.clauses[i] = c;
                            changed = true;
                        }
                    }
                }
            }
        }
        if !self.empty {
            for i in 0..self.clauses.len() {
                if self.dead[i] {
                    continue;
                }
                for j in (i + 1)..self.clauses.len() {
                    if self.dead[j] {
                        continue;
                    }
                    if self.clauses[i].subsumes(&self.clauses[j]) {
                        self.dead[j] = true;
                    } else if self.clauses[j].subsumes(&self.clauses[i]) {
                        self.dead[i] = true;
                        break;
                    }
                }
            }
        }
        self.seal();
    }

    fn seal(&mut self) {
        self.units.sort();
        self.units.dedup();
        self.sealed = self.units.len();
    }

    // === Queries ===

    /// Whether the setup entails the clause `d`: the empty clause has been
    /// derived, `d` is a tautology, or some unit or effective clause
    /// subsumes `d`.
    pub fn subsumes(&self, d: &Clause) -> bool {
        if self.empty || d.valid() {
            return true;
        }
        if d.is_empty() {
            return false;
        }
        for lit in d.iter() {
            if self.units_with_lhs(lit.lhs()).any(|u| u.subsumes(lit)) {
                return true;
            }
        }
        for i in 0..self.clauses.len() {
            if let Some(c) = self.effective(i) {
                if c.subsumes(d) {
                    return true;
                }
            }
        }
        false
    }

    /// Sound but incomplete consistency check: no lhs may carry a
    /// complementary pair of literals across the units and the effective
    /// clauses that mention it.
    pub fn consistent(&self) -> bool {
        if self.empty {
            return false;
        }
        let mut buckets: IndexMap<Term, Vec<Literal>> = IndexMap::new();
        for u in &self.units {
            buckets.entry(u.lhs().clone()).or_default().push(u.clone());
        }
        for i in 0..self.clauses.len() {
            if let Some(c) = self.effective(i) {
                for a in c.iter() {
                    buckets.entry(a.lhs().clone()).or_default().push(a.clone());
                }
            }
        }
        buckets.values().all(|lits| no_complementary_pair(lits))
    }

    /// The same check restricted to the lhs of `a`, with `a` itself seeded
    /// into the bucket (without adding it to the setup).
    pub fn locally_consistent(&self, a: &Literal) -> bool {
        if self.empty || a.invalid() {
            return false;
        }
        if a.valid() {
            return true;
        }
        let mut lits = vec![a.clone()];
        lits.extend(self.units_with_lhs(a.lhs()).cloned());
        if let Some(indices) = self.index.get(a.lhs()) {
            for &i in indices {
                if let Some(c) = self.effective(i) {
                    for b in c.iter() {
                        if b.lhs() == a.lhs() {
                            lits.push(b.clone());
                        }
                    }
                }
            }
        }
        no_complementary_pair(&lits)
    }

    /// Whether some literal of `c` can consistently be added.
    pub fn locally_consistent_clause(&self, c: &Clause) -> bool {
        c.iter().any(|a| self.locally_consistent(a))
    }

    /// Collect the primitive terms mentioned by units and effective clauses.
    pub fn collect_primitive_terms(&self, out: &mut IndexSet<Term>) {
        for u in &self.units {
            if u.lhs().is_primitive() {
                out.insert(u.lhs().clone());
            }
        }
        for i in 0..self.clauses.len() {
            if let Some(c) = self.effective(i) {
                for a in c.iter() {
                    if a.lhs().is_primitive() {
                        out.insert(a.lhs().clone());
                    }
                }
            }
        }
    }

    /// Whether a positive unit already fixes the value of `t`.
    pub fn determined(&self, t: &Term) -> bool {
        self.units_with_lhs(t).any(Literal::pos)
    }

    // === Forking ===

    /// Record the current sizes; mutations through the returned handle are
    /// rolled back when it is dropped.
    pub fn shallow_copy(&mut self) -> ShallowCopy<'_> {
        self.forks += 1;
        ShallowCopy {
            saved_units: self.units.len(),
            saved_clauses: self.clauses.len(),
            saved_empty: self.empty,
            setup: self,
        }
    }

    // === Internals ===

    // The clause as the current units see it: `None` if dead or satisfied,
    // otherwise the propagated (possibly shrunk, possibly empty) clause.
    fn effective(&self, i: usize) -> Option<Clause> {
        if self.dead[i] {
            return None;
        }
        self.propagate_all(&self.clauses[i])
    }

    // Propagate every relevant unit through `c`. `None` means satisfied.
    fn propagate_all(&self, c: &Clause) -> Option<Clause> {
        let mut cur = c.clone();
        let mut changed = true;
        while changed {
            changed = false;
            let lhss: Vec<Term> = cur.iter().map(|a| a.lhs().clone()).collect();
            'scan: for lhs in lhss {
                for u in self.units_with_lhs(&lhs) {
                    match cur.propagate_unit(u) {
                        Propagation::Satisfied => return None,
                        Propagation::Shrunk(d) => {
                            cur = d;
                            changed = true;
                            break 'scan;
                        }
                        Propagation::Unchanged => {}
                    }
                }
            }
        }
        Some(cur)
    }

    // All units whose lhs is `t`: binary search over the sealed prefix plus
    // a scan of the unsealed tail.
    fn units_with_lhs<'a>(&'a self, t: &'a Term) -> impl Iterator<Item = &'a Literal> {
        let sealed = &self.units[..self.sealed];
        let lo = sealed.partition_point(|u| u.lhs() < t);
        let hi = sealed.partition_point(|u| u.lhs() <= t);
        sealed[lo..hi]
            .iter()
            .chain(self.units[self.sealed..].iter().filter(move |u| u.lhs() == t))
    }
}

fn no_complementary_pair(lits: &[Literal]) -> bool {
    for (i, a) in lits.iter().enumerate() {
        for b in &lits[i + 1..] {
            if Literal::complementary(a, b) {
                return false;
            }
        }
    }
    true
}

/// A reversible fork of a setup. Dropping the handle restores the parent
/// to its recorded state.
#[derive(Debug)]
pub struct ShallowCopy<'a> {
    setup: &'a mut Setup,
    saved_units: usize,
    saved_clauses: usize,
    saved_empty: bool,
}

impl Deref for ShallowCopy<'_> {
    type Target = Setup;

    fn deref(&self) -> &Setup {
        self.setup
    }
}

impl DerefMut for ShallowCopy<'_> {
    fn deref_mut(&mut self) -> &mut Setup {
        self.setup
    }
}

impl Drop for ShallowCopy<'_> {
    fn drop(&mut self) {
        self.setup.units.truncate(self.saved_units);
        self.setup.clauses.truncate(self.saved_clauses);
        self.setup.dead.truncate(self.saved_clauses);
        self.setup.empty = self.saved_empty;
        self.setup.forks -= 1;
    }
}
