//! The script surface.
//!
//! Scripts are line-oriented: one directive per line, `//` comments.
//!
//! ```text
//! Sort HUMAN
//! Name Mary -> HUMAN
//! Variable x -> HUMAN
//! Function fatherOf/1 -> HUMAN
//! KB: fatherOf(Jesus) == HolyGhost || fatherOf(Jesus) == God
//! Let phi := Ex x (fatherOf(Jesus) == x)
//! Assert: Know<1> phi
//! Refute: Know<0> phi
//! ```
//!
//! The formula grammar supports `==`, `!=`, `!`, `&&`, `||`, `->`,
//! `Ex x`, `Fa x`, `Know<k>`, `Cons<k>`, `Bel<k,l> (a => b)`, and the
//! prefix guarantee `G`. `True` and `False` are formula constants; any
//! other bare identifier in formula position refers to a `Let` binding.

mod script;

pub use script::{parse_script, Directive, PFormula, PTerm};

use crate::context::Context;
use crate::error::Error;
use crate::fol::{Clause, Literal, Term};
use crate::formula::Formula;

/// What executing one directive produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A registration or `Let` completed.
    Done,
    /// A KB axiom was submitted; `ok` is the acceptance flag.
    KbAdded { ok: bool, formula: String },
    /// An `Assert:` or `Refute:` ran.
    Check {
        expected: bool,
        holds: bool,
        formula: String,
    },
}

impl Outcome {
    /// False only for a failed `Assert`/`Refute`.
    pub fn passed(&self) -> bool {
        match self {
            Outcome::Check { expected, holds, .. } => expected == holds,
            _ => true,
        }
    }
}

/// Execute one directive against a context.
pub fn run(ctx: &mut Context, d: &Directive) -> Result<Outcome, Error> {
    match d {
        Directive::Sort(id) => {
            ctx.register_sort(id)?;
            Ok(Outcome::Done)
        }
        Directive::Name(id, sort) => {
            ctx.register_name(id, sort)?;
            Ok(Outcome::Done)
        }
        Directive::Variable(id, sort) => {
            ctx.register_variable(id, sort)?;
            Ok(Outcome::Done)
        }
        Directive::Function(id, arity, sort) => {
            ctx.register_function(id, *arity, sort)?;
            Ok(Outcome::Done)
        }
        Directive::Kb(p) => {
            let phi = elaborate_formula(ctx, p)?;
            let rendered = ctx.interner_ref().display_formula(&phi).to_string();
            let ok = ctx.add_to_kb(&phi);
            Ok(Outcome::KbAdded {
                ok,
                formula: rendered,
            })
        }
        Directive::Let(id, p) => {
            let phi = elaborate_formula(ctx, p)?;
            ctx.register_formula(id, phi);
            Ok(Outcome::Done)
        }
        Directive::Assert(p) => check(ctx, p, true),
        Directive::Refute(p) => check(ctx, p, false),
    }
}

fn check(ctx: &mut Context, p: &PFormula, expected: bool) -> Result<Outcome, Error> {
    let phi = elaborate_formula(ctx, p)?;
    let rendered = ctx.interner_ref().display_formula(&phi).to_string();
    let holds = ctx.query(&phi);
    Ok(Outcome::Check {
        expected,
        holds,
        formula: rendered,
    })
}

/// Resolve a parsed term against the context registries.
pub fn elaborate_term(ctx: &mut Context, t: &PTerm) -> Result<Term, Error> {
    match t {
        // A bare identifier is a name, variable, or meta-variable, or
        // failing those a 0-ary function.
        PTerm::Atom(id) => match ctx.lookup_atom(id) {
            Ok(t) => Ok(t),
            Err(_) if ctx.lookup_function(id).is_ok() => ctx.term(id, vec![]),
            Err(e) => Err(e),
        },
        PTerm::App(f, args) => {
            let args = args
                .iter()
                .map(|a| elaborate_term(ctx, a))
                .collect::<Result<Vec<_>, _>>()?;
            ctx.term(f, args)
        }
    }
}

/// Resolve a parsed formula against the context registries.
pub fn elaborate_formula(ctx: &mut Context, p: &PFormula) -> Result<Formula, Error> {
    match p {
        PFormula::Atom(l, pos, r) => {
            let lt = elaborate_term(ctx, l)?;
            let rt = elaborate_term(ctx, r)?;
            let lit = if *pos {
                Literal::eq(lt, rt)?
            } else {
                Literal::neq(lt, rt)?
            };
            Ok(Formula::Atomic(Clause::unit(lit)))
        }
        PFormula::True => Ok(Formula::truth()),
        PFormula::False => Ok(Formula::falsity()),
        PFormula::Ref(id) => Ok(ctx.lookup_formula(id)?.clone()),
        PFormula::Not(a) => Ok(Formula::not(elaborate_formula(ctx, a)?)),
        PFormula::And(l, r) => Ok(Formula::and(
            elaborate_formula(ctx, l)?,
            elaborate_formula(ctx, r)?,
        )),
        PFormula::Or(l, r) => Ok(Formula::or(
            elaborate_formula(ctx, l)?,
            elaborate_formula(ctx, r)?,
        )),
        PFormula::Implies(l, r) => Ok(Formula::implies(
            elaborate_formula(ctx, l)?,
            elaborate_formula(ctx, r)?,
        )),
        PFormula::Exists(x, a) => {
            let xt = ctx.lookup_atom(x)?;
            if !xt.is_variable() {
                return Err(Error::KindMismatch(x.clone()));
            }
            Ok(Formula::exists(xt, elaborate_formula(ctx, a)?))
        }
        PFormula::Forall(x, a) => {
            let xt = ctx.lookup_atom(x)?;
            if !xt.is_variable() {
                return Err(Error::KindMismatch(x.clone()));
            }
            Ok(Formula::forall(xt, elaborate_formula(ctx, a)?))
        }
        PFormula::Know(k, a) => Ok(Formula::know(*k, elaborate_formula(ctx, a)?)),
        PFormula::Cons(k, a) => Ok(Formula::cons(*k, elaborate_formula(ctx, a)?)),
        PFormula::Bel(k, l, a, b) => Ok(Formula::bel(
            *k,
            *l,
            elaborate_formula(ctx, a)?,
            elaborate_formula(ctx, b)?,
        )),
        PFormula::Guarantee(a) => Ok(Formula::guarantee(elaborate_formula(ctx, a)?)),
    }
}
