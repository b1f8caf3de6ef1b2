//! The context: symbol registries and the programmatic API.
//!
//! A context owns the interner, the name-to-symbol registries the parser
//! works against, the knowledge base, and the trace sink. Registration
//! errors (duplicate ids, unknown sorts) surface synchronously; queries
//! never fail.

use crate::error::Error;
use crate::fol::{Interner, Sort, Symbol, Term};
use crate::formula::Formula;
use crate::kb::KnowledgeBase;
use crate::trace::{NullSink, TraceEvent, TraceSink};
use indexmap::IndexMap;

pub struct Context {
    itn: Interner,
    sorts: IndexMap<String, Sort>,
    names: IndexMap<String, Term>,
    variables: IndexMap<String, Term>,
    functions: IndexMap<String, Symbol>,
    meta_variables: IndexMap<String, Term>,
    formulas: IndexMap<String, Formula>,
    kb: KnowledgeBase,
    distribute: bool,
    sink: Box<dyn TraceSink>,
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

impl Context {
    pub fn new() -> Context {
        Context::with_sink(Box::new(NullSink))
    }

    pub fn with_sink(sink: Box<dyn TraceSink>) -> Context {
        Context {
            itn: Interner::new(),
            sorts: IndexMap::new(),
            names: IndexMap::new(),
            variables: IndexMap::new(),
            functions: IndexMap::new(),
            meta_variables: IndexMap::new(),
            formulas: IndexMap::new(),
            kb: KnowledgeBase::new(),
            distribute: true,
            sink,
        }
    }

    // === Registration ===

    pub fn register_sort(&mut self, id: &str) -> Result<Sort, Error> {
        if self.sorts.contains_key(id) {
            return Err(Error::DuplicateId(id.to_string()));
        }
        let sort = self.itn.new_sort();
        self.itn.set_sort_label(sort, id);
        self.sorts.insert(id.to_string(), sort);
        self.sink.event(&TraceEvent::RegisterSort { id: id.to_string() });
        Ok(sort)
    }

    pub fn register_name(&mut self, id: &str, sort_id: &str) -> Result<Term, Error> {
        if self.is_registered_term(id) {
            return Err(Error::DuplicateId(id.to_string()));
        }
        let sort = self.lookup_sort(sort_id)?;
        let sym = self.itn.new_name(sort);
        self.itn.set_label(sym, id);
        let term = self.itn.leaf(sym);
        self.names.insert(id.to_string(), term.clone());
        self.sink.event(&TraceEvent::RegisterName {
            id: id.to_string(),
            sort: sort_id.to_string(),
        });
        Ok(term)
    }

    pub fn register_variable(&mut self, id: &str, sort_id: &str) -> Result<Term, Error> {
        if self.is_registered_term(id) {
            return Err(Error::DuplicateId(id.to_string()));
        }
        let sort = self.lookup_sort(sort_id)?;
        let sym = self.itn.new_variable(sort);
        self.itn.set_label(sym, id);
        let term = self.itn.leaf(sym);
        self.variables.insert(id.to_string(), term.clone());
        self.sink.event(&TraceEvent::RegisterVariable {
            id: id.to_string(),
            sort: sort_id.to_string(),
        });
        Ok(term)
    }

    pub fn register_function(&mut self, id: &str, arity: u8, sort_id: &str) -> Result<Symbol, Error> {
        if self.is_registered_term(id) {
            return Err(Error::DuplicateId(id.to_string()));
        }
        let sort = self.lookup_sort(sort_id)?;
        let sym = self.itn.new_function(sort, arity);
        self.itn.set_label(sym, id);
        self.functions.insert(id.to_string(), sym);
        self.sink.event(&TraceEvent::RegisterFunction {
            id: id.to_string(),
            arity,
            sort: sort_id.to_string(),
        });
        Ok(sym)
    }

    /// Formulas may be re-registered; `Let` rebinds.
    pub fn register_formula(&mut self, id: &str, phi: Formula) {
        let rendered = self.itn.display_formula(&phi).to_string();
        self.formulas.insert(id.to_string(), phi);
        self.sink.event(&TraceEvent::RegisterFormula {
            id: id.to_string(),
            formula: rendered,
        });
    }

    pub fn register_meta_variable(&mut self, id: &str, t: Term) -> Result<(), Error> {
        if self.meta_variables.contains_key(id) {
            return Err(Error::DuplicateId(id.to_string()));
        }
        let rendered = self.itn.display_term(&t).to_string();
        self.meta_variables.insert(id.to_string(), t);
        self.sink.event(&TraceEvent::RegisterMetaVariable {
            id: id.to_string(),
            term: rendered,
        });
        Ok(())
    }

    pub fn unregister_meta_variable(&mut self, id: &str) -> Result<(), Error> {
        if self.meta_variables.shift_remove(id).is_none() {
            return Err(Error::UnknownId(id.to_string()));
        }
        self.sink
            .event(&TraceEvent::UnregisterMetaVariable { id: id.to_string() });
        Ok(())
    }

    // === Lookup ===

    pub fn lookup_sort(&self, id: &str) -> Result<Sort, Error> {
        self.sorts
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownId(id.to_string()))
    }

    pub fn lookup_function(&self, id: &str) -> Result<Symbol, Error> {
        self.functions
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownId(id.to_string()))
    }

    /// A name, variable, or meta-variable.
    pub fn lookup_atom(&self, id: &str) -> Result<Term, Error> {
        self.names
            .get(id)
            .or_else(|| self.variables.get(id))
            .or_else(|| self.meta_variables.get(id))
            .cloned()
            .ok_or_else(|| Error::UnknownId(id.to_string()))
    }

    pub fn lookup_formula(&self, id: &str) -> Result<&Formula, Error> {
        self.formulas
            .get(id)
            .ok_or_else(|| Error::UnknownId(id.to_string()))
    }

    pub fn is_registered_term(&self, id: &str) -> bool {
        self.names.contains_key(id)
            || self.variables.contains_key(id)
            || self.functions.contains_key(id)
            || self.meta_variables.contains_key(id)
    }

    // === Construction ===

    /// Build the term `f(args...)` for a registered function.
    pub fn term(&mut self, fun_id: &str, args: Vec<Term>) -> Result<Term, Error> {
        let sym = self.lookup_function(fun_id)?;
        self.itn.term(sym, args)
    }

    pub fn interner(&mut self) -> &mut Interner {
        &mut self.itn
    }

    pub fn interner_ref(&self) -> &Interner {
        &self.itn
    }

    // === The knowledge base ===

    pub fn set_distribute(&mut self, distribute: bool) {
        self.distribute = distribute;
    }

    pub fn distribute(&self) -> bool {
        self.distribute
    }

    /// Add an axiom; returns whether it was acceptable.
    pub fn add_to_kb(&mut self, alpha: &Formula) -> bool {
        let ok = self.kb.add(alpha, &mut self.itn);
        let rendered = self.itn.display_formula(alpha).to_string();
        self.sink.event(&TraceEvent::AddToKb {
            formula: rendered,
            ok,
        });
        ok
    }

    /// Decide a query against the knowledge base.
    pub fn query(&mut self, alpha: &Formula) -> bool {
        let yes = self.kb.entails(alpha, self.distribute, &mut self.itn);
        let rendered = self.itn.display_formula(alpha).to_string();
        self.sink.event(&TraceEvent::Query {
            formula: rendered,
            yes,
        });
        yes
    }

    pub fn kb(&self) -> &KnowledgeBase {
        &self.kb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fol::Literal;
    use crate::formula::Formula;
    use crate::fol::Clause;

    #[test]
    fn test_registration_errors() {
        let mut ctx = Context::new();
        ctx.register_sort("HUMAN").unwrap();
        assert_eq!(
            ctx.register_sort("HUMAN"),
            Err(Error::DuplicateId("HUMAN".to_string()))
        );
        assert_eq!(
            ctx.register_name("Mary", "ALIEN"),
            Err(Error::UnknownId("ALIEN".to_string()))
        );
        ctx.register_name("Mary", "HUMAN").unwrap();
        assert!(ctx.register_name("Mary", "HUMAN").is_err());
        // a name and a function cannot share an id either
        assert!(ctx.register_function("Mary", 1, "HUMAN").is_err());
    }

    #[test]
    fn test_arity_mismatch_at_term_construction() {
        let mut ctx = Context::new();
        ctx.register_sort("HUMAN").unwrap();
        let mary = ctx.register_name("Mary", "HUMAN").unwrap();
        ctx.register_function("motherOf", 1, "HUMAN").unwrap();
        assert!(ctx.term("motherOf", vec![]).is_err());
        assert!(ctx.term("motherOf", vec![mary]).is_ok());
    }

    #[test]
    fn test_meta_variables() {
        let mut ctx = Context::new();
        ctx.register_sort("HUMAN").unwrap();
        let mary = ctx.register_name("Mary", "HUMAN").unwrap();
        ctx.register_meta_variable("it", mary.clone()).unwrap();
        assert_eq!(ctx.lookup_atom("it").unwrap(), mary);
        ctx.unregister_meta_variable("it").unwrap();
        assert!(ctx.lookup_atom("it").is_err());
        assert!(ctx.unregister_meta_variable("it").is_err());
    }

    #[test]
    fn test_add_and_query_emit_events() {
        use crate::trace::{MemorySink, TraceEvent};
        use std::cell::RefCell;
        use std::rc::Rc;

        let sink = Rc::new(RefCell::new(MemorySink::default()));
        let mut ctx = Context::with_sink(Box::new(sink.clone()));
        ctx.register_sort("HUMAN").unwrap();
        let mary = ctx.register_name("Mary", "HUMAN").unwrap();
        ctx.register_function("motherOf", 1, "HUMAN").unwrap();
        let jesus = ctx.register_name("Jesus", "HUMAN").unwrap();
        let mother = ctx.term("motherOf", vec![jesus]).unwrap();
        let phi = Formula::Atomic(Clause::unit(Literal::new(true, mother, mary)));

        assert!(ctx.add_to_kb(&phi));
        assert!(ctx.query(&Formula::know(0, phi)));

        let events = sink.borrow();
        assert!(matches!(
            events.events.last(),
            Some(TraceEvent::Query { yes: true, .. })
        ));
        assert!(events
            .events
            .iter()
            .any(|e| matches!(e, TraceEvent::AddToKb { ok: true, .. })));
        // rendered with registered labels
        assert!(events.events.iter().any(
            |e| matches!(e, TraceEvent::AddToKb { formula, .. } if formula.contains("motherOf(Jesus)"))
        ));
    }
}
