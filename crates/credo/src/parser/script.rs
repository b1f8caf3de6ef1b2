//! nom grammar for the script surface.

use crate::error::Error;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{all_consuming, map, map_res, opt, value},
    multi::{fold_many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

/// A term before name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PTerm {
    Atom(String),
    App(String, Vec<PTerm>),
}

/// A formula before name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PFormula {
    /// `lhs == rhs` (pos) or `lhs != rhs`.
    Atom(PTerm, bool, PTerm),
    /// A `Let`-bound formula.
    Ref(String),
    True,
    False,
    Not(Box<PFormula>),
    And(Box<PFormula>, Box<PFormula>),
    Or(Box<PFormula>, Box<PFormula>),
    Implies(Box<PFormula>, Box<PFormula>),
    Exists(String, Box<PFormula>),
    Forall(String, Box<PFormula>),
    Know(u32, Box<PFormula>),
    Cons(u32, Box<PFormula>),
    Bel(u32, u32, Box<PFormula>, Box<PFormula>),
    Guarantee(Box<PFormula>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Sort(String),
    Name(String, String),
    Variable(String, String),
    Function(String, u8, String),
    Kb(PFormula),
    Let(String, PFormula),
    Assert(PFormula),
    Refute(PFormula),
}

/// Parse a whole script: one directive per line, `//` comments, blank
/// lines ignored.
pub fn parse_script(input: &str) -> Result<Vec<Directive>, Error> {
    let mut out = Vec::new();
    for (lineno, raw) in input.lines().enumerate() {
        let line = match raw.find("//") {
            Some(at) => &raw[..at],
            None => raw,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match all_consuming(terminated(directive, multispace0))(line) {
            Ok((_, d)) => out.push(d),
            Err(_) => {
                return Err(Error::Parse(format!(
                    "line {}: cannot parse '{}'",
                    lineno + 1,
                    line
                )))
            }
        }
    }
    Ok(out)
}

// === Lexical helpers ===

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn ident(i: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| c.is_alphanumeric() || c == '_'),
        |s: &str| s.to_string(),
    )(i)
}

fn number(i: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse::<u32>)(i)
}

fn arity(i: &str) -> IResult<&str, u8> {
    map_res(digit1, str::parse::<u8>)(i)
}

// === Directives ===

fn directive(i: &str) -> IResult<&str, Directive> {
    alt((
        sort_directive,
        name_directive,
        variable_directive,
        function_directive,
        kb_directive,
        let_directive,
        assert_directive,
        refute_directive,
    ))(i)
}

fn sort_directive(i: &str) -> IResult<&str, Directive> {
    map(
        preceded(pair(tag("Sort"), multispace1), ident),
        Directive::Sort,
    )(i)
}

fn name_directive(i: &str) -> IResult<&str, Directive> {
    map(
        preceded(
            pair(tag("Name"), multispace1),
            pair(ident, preceded(ws(tag("->")), ident)),
        ),
        |(id, sort)| Directive::Name(id, sort),
    )(i)
}

fn variable_directive(i: &str) -> IResult<&str, Directive> {
    map(
        preceded(
            pair(alt((tag("Variable"), tag("Var"))), multispace1),
            pair(ident, preceded(ws(tag("->")), ident)),
        ),
        |(id, sort)| Directive::Variable(id, sort),
    )(i)
}

fn function_directive(i: &str) -> IResult<&str, Directive> {
    map(
        preceded(
            pair(alt((tag("Function"), tag("Fun"))), multispace1),
            tuple((
                ident,
                preceded(ws(char('/')), arity),
                preceded(ws(tag("->")), ident),
            )),
        ),
        |(id, n, sort)| Directive::Function(id, n, sort),
    )(i)
}

fn kb_directive(i: &str) -> IResult<&str, Directive> {
    map(preceded(tag("KB:"), formula), Directive::Kb)(i)
}

fn let_directive(i: &str) -> IResult<&str, Directive> {
    map(
        preceded(
            pair(tag("Let"), multispace1),
            pair(ident, preceded(ws(tag(":=")), formula)),
        ),
        |(id, phi)| Directive::Let(id, phi),
    )(i)
}

fn assert_directive(i: &str) -> IResult<&str, Directive> {
    map(preceded(tag("Assert:"), formula), Directive::Assert)(i)
}

fn refute_directive(i: &str) -> IResult<&str, Directive> {
    map(preceded(tag("Refute:"), formula), Directive::Refute)(i)
}

// === Formulas ===
// Precedence: -> (right) < || < && < prefix operators.

fn formula(i: &str) -> IResult<&str, PFormula> {
    let (i, lhs) = disjunction(i)?;
    let (i, rhs) = opt(preceded(ws(tag("->")), formula))(i)?;
    Ok((
        i,
        match rhs {
            Some(r) => PFormula::Implies(Box::new(lhs), Box::new(r)),
            None => lhs,
        },
    ))
}

fn disjunction(i: &str) -> IResult<&str, PFormula> {
    let (i, first) = conjunction(i)?;
    fold_many0(
        preceded(ws(tag("||")), conjunction),
        move || first.clone(),
        |acc, f| PFormula::Or(Box::new(acc), Box::new(f)),
    )(i)
}

fn conjunction(i: &str) -> IResult<&str, PFormula> {
    let (i, first) = unary(i)?;
    fold_many0(
        preceded(ws(tag("&&")), unary),
        move || first.clone(),
        |acc, f| PFormula::And(Box::new(acc), Box::new(f)),
    )(i)
}

fn unary(i: &str) -> IResult<&str, PFormula> {
    preceded(
        multispace0,
        alt((
            know, cons, bel, guarantee, exists, forall, negation, parens, atom_or_ref,
        )),
    )(i)
}

fn negation(i: &str) -> IResult<&str, PFormula> {
    map(preceded(char('!'), unary), |f| PFormula::Not(Box::new(f)))(i)
}

fn parens(i: &str) -> IResult<&str, PFormula> {
    delimited(char('('), formula, preceded(multispace0, char(')')))(i)
}

fn know(i: &str) -> IResult<&str, PFormula> {
    map(
        pair(delimited(tag("Know<"), number, char('>')), unary),
        |(k, f)| PFormula::Know(k, Box::new(f)),
    )(i)
}

fn cons(i: &str) -> IResult<&str, PFormula> {
    map(
        pair(delimited(tag("Cons<"), number, char('>')), unary),
        |(k, f)| PFormula::Cons(k, Box::new(f)),
    )(i)
}

fn bel(i: &str) -> IResult<&str, PFormula> {
    map(
        tuple((
            delimited(tag("Bel<"), pair(number, preceded(ws(char(',')), number)), char('>')),
            preceded(ws(char('(')), formula),
            preceded(ws(tag("=>")), formula),
            preceded(multispace0, char(')')),
        )),
        |((k, l), ante, conse, _)| PFormula::Bel(k, l, Box::new(ante), Box::new(conse)),
    )(i)
}

fn guarantee(i: &str) -> IResult<&str, PFormula> {
    map(preceded(pair(tag("G"), multispace1), unary), |f| {
        PFormula::Guarantee(Box::new(f))
    })(i)
}

// `Ex x phi` / `Fa x phi`, with an optional dot after the variable.
fn exists(i: &str) -> IResult<&str, PFormula> {
    map(
        preceded(
            pair(tag("Ex"), multispace1),
            pair(terminated(ident, opt(preceded(multispace0, char('.')))), unary),
        ),
        |(x, f)| PFormula::Exists(x, Box::new(f)),
    )(i)
}

fn forall(i: &str) -> IResult<&str, PFormula> {
    map(
        preceded(
            pair(tag("Fa"), multispace1),
            pair(terminated(ident, opt(preceded(multispace0, char('.')))), unary),
        ),
        |(x, f)| PFormula::Forall(x, Box::new(f)),
    )(i)
}

fn atom_or_ref(i: &str) -> IResult<&str, PFormula> {
    let (i, t) = pterm(i)?;
    let (i, rest) = opt(pair(
        ws(alt((value(true, tag("==")), value(false, tag("!="))))),
        pterm,
    ))(i)?;
    match rest {
        Some((pos, rhs)) => Ok((i, PFormula::Atom(t, pos, rhs))),
        None => match t {
            PTerm::Atom(id) if id == "True" => Ok((i, PFormula::True)),
            PTerm::Atom(id) if id == "False" => Ok((i, PFormula::False)),
            PTerm::Atom(id) => Ok((i, PFormula::Ref(id))),
            PTerm::App(..) => Err(nom::Err::Error(nom::error::Error::new(
                i,
                nom::error::ErrorKind::Tag,
            ))),
        },
    }
}

fn pterm(i: &str) -> IResult<&str, PTerm> {
    let (i, id) = preceded(multispace0, ident)(i)?;
    let (i, args) = opt(delimited(
        preceded(multispace0, char('(')),
        separated_list1(ws(char(',')), pterm),
        preceded(multispace0, char(')')),
    ))(i)?;
    Ok((
        i,
        match args {
            Some(a) => PTerm::App(id, a),
            None => PTerm::Atom(id),
        },
    ))
}
