//! End-to-end reasoning scenarios through the programmatic API.

use credo::{Clause, Context, Formula, Literal, Term};

/// The father-of-Jesus knowledge base.
struct Jesus {
    ctx: Context,
    mary: Term,
    hg: Term,
    god: Term,
    joe: Term,
    mother: Term, // motherOf(Jesus)
    father: Term, // fatherOf(Jesus)
    x: Term,
}

fn jesus() -> Jesus {
    let mut ctx = Context::new();
    ctx.register_sort("HUMAN").unwrap();
    ctx.register_sort("TRUTH").unwrap();
    let mary = ctx.register_name("Mary", "HUMAN").unwrap();
    let jesus = ctx.register_name("Jesus", "HUMAN").unwrap();
    let joe = ctx.register_name("Joe", "HUMAN").unwrap();
    let hg = ctx.register_name("HolyGhost", "HUMAN").unwrap();
    let god = ctx.register_name("God", "HUMAN").unwrap();
    let t = ctx.register_name("True", "TRUTH").unwrap();
    ctx.register_function("motherOf", 1, "HUMAN").unwrap();
    ctx.register_function("fatherOf", 1, "HUMAN").unwrap();
    ctx.register_function("is_mortal", 1, "TRUTH").unwrap();
    let x = ctx.register_variable("x", "HUMAN").unwrap();

    let mother = ctx.term("motherOf", vec![jesus.clone()]).unwrap();
    let father = ctx.term("fatherOf", vec![jesus.clone()]).unwrap();
    let mortal_mary = ctx.term("is_mortal", vec![mary.clone()]).unwrap();
    let mortal_joe = ctx.term("is_mortal", vec![joe.clone()]).unwrap();
    let mortal_father = ctx.term("is_mortal", vec![father.clone()]).unwrap();

    assert!(ctx.add_to_kb(&atom(true, &mother, &mary)));
    assert!(ctx.add_to_kb(&Formula::Atomic(Clause::new(vec![
        Literal::eq(father.clone(), hg.clone()).unwrap(),
        Literal::eq(father.clone(), god.clone()).unwrap(),
        Literal::eq(father.clone(), joe.clone()).unwrap(),
    ]))));
    assert!(ctx.add_to_kb(&atom(true, &mortal_mary, &t)));
    assert!(ctx.add_to_kb(&atom(true, &mortal_joe, &t)));
    // fatherOf(Jesus) != Joe -> is_mortal(fatherOf(Jesus)) != True
    assert!(ctx.add_to_kb(&Formula::implies(
        atom(false, &father, &joe),
        atom(false, &mortal_father, &t),
    )));

    Jesus {
        ctx,
        mary,
        hg,
        god,
        joe,
        mother,
        father,
        x,
    }
}

fn atom(pos: bool, t1: &Term, t2: &Term) -> Formula {
    let lit = if pos {
        Literal::eq(t1.clone(), t2.clone()).unwrap()
    } else {
        Literal::neq(t1.clone(), t2.clone()).unwrap()
    };
    Formula::Atomic(Clause::unit(lit))
}

#[test]
fn test_father_disjunction_is_known() {
    let mut j = jesus();
    let disj = Formula::Atomic(Clause::new(vec![
        Literal::eq(j.father.clone(), j.hg.clone()).unwrap(),
        Literal::eq(j.father.clone(), j.god.clone()).unwrap(),
        Literal::eq(j.father.clone(), j.joe.clone()).unwrap(),
    ]));
    assert!(j.ctx.query(&Formula::know(0, disj)));
}

#[test]
fn test_somebody_is_the_father_needs_one_split() {
    let mut j = jesus();
    let someone = Formula::exists(j.x.clone(), atom(true, &j.x, &j.father));
    assert!(!j.ctx.query(&Formula::know(0, someone.clone())));
    assert!(j.ctx.query(&Formula::know(1, someone)));
}

#[test]
fn test_holy_ghost_maybe_father_needs_one_split() {
    let mut j = jesus();
    let hg_father = atom(true, &j.hg, &j.father);
    assert!(!j.ctx.query(&Formula::cons(0, hg_father.clone())));
    assert!(j.ctx.query(&Formula::cons(1, hg_father)));
}

#[test]
fn test_mother_is_not_the_father() {
    let mut j = jesus();
    let distinct = atom(false, &j.mother, &j.father);
    assert!(j.ctx.query(&Formula::know(0, distinct.clone())));
    assert!(j.ctx.query(&Formula::cons(1, distinct.clone())));
    assert!(!j.ctx.query(&Formula::cons(0, distinct)));
}

#[test]
fn test_guarantee_agrees_when_witnesses_suffice() {
    let mut j = jesus();
    let someone = Formula::exists(j.x.clone(), atom(true, &j.x, &j.father));
    assert!(j
        .ctx
        .query(&Formula::guarantee(Formula::know(1, someone.clone()))));
    assert!(!j
        .ctx
        .query(&Formula::guarantee(Formula::know(0, someone))));
}

#[test]
fn test_knowledge_is_monotone_in_the_split_level() {
    let mut j = jesus();
    let someone = Formula::exists(j.x.clone(), atom(true, &j.x, &j.father));
    let hg_father = atom(true, &j.hg, &j.father);
    for k in 0..3u32 {
        if j.ctx.query(&Formula::know(k, someone.clone())) {
            assert!(j.ctx.query(&Formula::know(k + 1, someone.clone())));
        }
        if j.ctx.query(&Formula::cons(k, hg_father.clone())) {
            assert!(j.ctx.query(&Formula::cons(k + 1, hg_father.clone())));
        }
    }
}

#[test]
fn test_queries_are_reentrant() {
    let mut j = jesus();
    let someone = Formula::exists(j.x.clone(), atom(true, &j.x, &j.father));
    for _ in 0..3 {
        assert!(!j.ctx.query(&Formula::know(0, someone.clone())));
        assert!(j.ctx.query(&Formula::know(1, someone.clone())));
    }
}

#[test]
fn test_empty_kb() {
    let mut ctx = Context::new();
    ctx.register_sort("THING").unwrap();
    let n = ctx.register_name("n", "THING").unwrap();
    let x = ctx.register_variable("x", "THING").unwrap();

    // Fa x (x == x)
    let refl = Formula::forall(x.clone(), atom(true, &x, &x));
    assert!(ctx.query(&refl));

    // Ex x Know<0> (x == n): witnessed by n itself
    let know_xn = Formula::know(0, atom(true, &x, &n));
    assert!(ctx.query(&Formula::exists(x.clone(), know_xn.clone())));

    // Fa x Know<0> (x == n): fails at the placeholder
    assert!(!ctx.query(&Formula::forall(x.clone(), know_xn)));
}

#[test]
fn test_inconsistent_kb_knows_everything() {
    let mut ctx = Context::new();
    ctx.register_sort("THING").unwrap();
    let a = ctx.register_name("a", "THING").unwrap();
    let b = ctx.register_name("b", "THING").unwrap();
    ctx.register_function("f", 0, "THING").unwrap();
    let f = ctx.term("f", vec![]).unwrap();

    assert!(ctx.add_to_kb(&atom(true, &f, &a)));
    assert!(ctx.add_to_kb(&atom(true, &f, &b)));

    for k in 0..3u32 {
        assert!(ctx.query(&Formula::know(k, Formula::falsity())));
        assert!(ctx.query(&Formula::know(k, atom(true, &f, &a))));
        assert!(!ctx.query(&Formula::cons(k, Formula::truth())));
    }
}

#[test]
fn test_distribute_toggle_keeps_clause_queries() {
    let mut j = jesus();
    j.ctx.set_distribute(false);
    let disj = Formula::Atomic(Clause::new(vec![
        Literal::eq(j.father.clone(), j.hg.clone()).unwrap(),
        Literal::eq(j.father.clone(), j.god.clone()).unwrap(),
        Literal::eq(j.father.clone(), j.joe.clone()).unwrap(),
    ]));
    // clause-shaped queries do not depend on modal distribution
    assert!(j.ctx.query(&Formula::know(0, disj)));
    let someone = Formula::exists(j.x.clone(), atom(true, &j.x, &j.father));
    assert!(j.ctx.query(&Formula::know(1, someone)));
}

#[test]
fn test_rejected_axioms_leave_kb_usable() {
    let mut j = jesus();
    // a bare Cons axiom is not a clause and must be rejected
    let junk = Formula::cons(0, atom(true, &j.hg, &j.mary));
    assert!(!j.ctx.add_to_kb(&junk));
    let disj = Formula::Atomic(Clause::new(vec![
        Literal::eq(j.father.clone(), j.hg.clone()).unwrap(),
        Literal::eq(j.father.clone(), j.god.clone()).unwrap(),
        Literal::eq(j.father.clone(), j.joe.clone()).unwrap(),
    ]));
    assert!(j.ctx.query(&Formula::know(0, disj)));
}
