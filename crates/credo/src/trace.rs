//! Trace events for registrations, axiom additions, and queries.
//!
//! Events are owned and serializable so drivers can log them as JSON
//! lines. Sinks never influence control flow; the default sink discards
//! everything.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    RegisterSort {
        id: String,
    },
    RegisterName {
        id: String,
        sort: String,
    },
    RegisterVariable {
        id: String,
        sort: String,
    },
    RegisterFunction {
        id: String,
        arity: u8,
        sort: String,
    },
    RegisterFormula {
        id: String,
        formula: String,
    },
    RegisterMetaVariable {
        id: String,
        term: String,
    },
    UnregisterMetaVariable {
        id: String,
    },
    AddToKb {
        formula: String,
        ok: bool,
    },
    Query {
        formula: String,
        yes: bool,
    },
}

/// A sink for trace events.
pub trait TraceSink {
    fn event(&mut self, e: &TraceEvent);
}

/// Discards all events.
#[derive(Debug, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn event(&mut self, _e: &TraceEvent) {}
}

/// Collects events in memory; handy for tests and for emitting a JSON
/// trace after a run.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: Vec<TraceEvent>,
}

impl TraceSink for MemorySink {
    fn event(&mut self, e: &TraceEvent) {
        self.events.push(e.clone());
    }
}

// A shared handle so callers can keep reading events after handing the
// sink to a context.
impl TraceSink for std::rc::Rc<std::cell::RefCell<MemorySink>> {
    fn event(&mut self, e: &TraceEvent) {
        self.borrow_mut().events.push(e.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_round_trip_as_json() {
        let events = vec![
            TraceEvent::RegisterSort {
                id: "HUMAN".to_string(),
            },
            TraceEvent::AddToKb {
                formula: "motherOf(Jesus) == Mary".to_string(),
                ok: true,
            },
            TraceEvent::Query {
                formula: "Know<1> Ex x (fatherOf(Jesus) == x)".to_string(),
                yes: true,
            },
        ];
        let json = serde_json::to_string(&events).unwrap();
        let parsed: Vec<TraceEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, events);
    }
}
