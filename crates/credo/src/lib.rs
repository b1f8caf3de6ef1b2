//! credo: a reasoner for a decidable fragment of first-order epistemic
//! logic with equality, limited belief, and conditional belief.
//!
//! A knowledge base holds universally quantified clauses over sorted
//! terms plus conditional beliefs; queries of the forms `Know<k>`,
//! `Cons<k>`, `Bel<k,l>`, and `Guarantee` are decided soundly but
//! incompletely, trading completeness for decidability through the
//! bounded case-split level k.

pub mod context;
pub mod error;
pub mod fol;
pub mod formula;
pub mod grounder;
pub mod kb;
pub mod parser;
pub mod setup;
pub mod solver;
pub mod trace;

// Re-export commonly used types
pub use context::Context;
pub use error::Error;
pub use fol::{Clause, Interner, Literal, Propagation, Sort, Symbol, SymbolKind, Term};
pub use formula::{Formula, Level};
pub use grounder::Grounder;
pub use kb::KnowledgeBase;
pub use setup::{Setup, ShallowCopy};
pub use solver::Solver;
pub use trace::{MemorySink, NullSink, TraceEvent, TraceSink};

pub use parser::{parse_script, run, Directive, Outcome};
