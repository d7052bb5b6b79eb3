use super::*;
use crate::parser;
use crate::term::Term;
use std::sync::atomic::{AtomicUsize, Ordering};

const FAMILY: &str = "
    father(michael).
    father(marc).
    mother(gail).
    parent(X) :- father(X).
    parent(X) :- mother(X).
";

fn family() -> Machine {
    Machine::new().consult(FAMILY).unwrap()
}

fn names(machine: &Machine, goal: &str, var: &str) -> Vec<String> {
    machine
        .prove_all(goal)
        .unwrap()
        .iter()
        .map(|answer| answer.by_name(var).unwrap().to_string())
        .collect()
}

// ========== STACK OPERATIONS ==========

#[test]
fn demand_cut_barrier_is_idempotent() {
    let m = Machine::blank();
    let before = m.most_recent_cut_barrier().unwrap();
    let m2 = m.demand_cut_barrier();
    assert_eq!(m2.most_recent_cut_barrier(), Some(before));
}

#[test]
fn demand_pushes_when_top_is_not_a_barrier() {
    let m = Machine::blank();
    let first = m.most_recent_cut_barrier().unwrap();
    let m = m.push_disj(crate::choice_point::ChoicePoint::simple(
        m.clone(),
        Term::atom("g"),
    ));
    let m = m.demand_cut_barrier();
    let second = m.most_recent_cut_barrier().unwrap();
    assert!(second > first);
}

#[test]
fn cut_to_truncates_down_to_the_barrier() {
    let m = Machine::blank();
    let barrier = m.most_recent_cut_barrier().unwrap();
    let m = m
        .push_disj(crate::choice_point::ChoicePoint::simple(
            m.clone(),
            Term::atom("a"),
        ))
        .push_disj(crate::choice_point::ChoicePoint::simple(
            m.clone(),
            Term::atom("b"),
        ));
    let cut = m.cut_to(barrier);
    let (top, _) = cut.pop_disj().unwrap();
    assert_eq!(top.barrier_id(), Some(barrier));
}

#[test]
#[should_panic]
fn cut_to_a_missing_barrier_panics() {
    // barrier ids start at 1, so 0 is never allocated
    Machine::blank().cut_to(0);
}

#[test]
fn push_conj_compiles_cut_to_the_current_barrier() {
    let m = Machine::blank();
    let barrier = m.most_recent_cut_barrier().unwrap();
    let (goal, _) = m.push_conj(Term::atom("!")).pop_conj().unwrap();
    assert!(goal.has_functor("$cut_to", 1));
    assert_eq!(goal.args()[0], Term::int(barrier));
}

#[test]
fn cut_rewrite_skips_the_if_then_condition() {
    let m = Machine::blank();
    let goal = parser::term("(a -> ! ; !).").unwrap();
    let (pushed, _) = m.push_conj(goal).pop_conj().unwrap();
    // right of ; is rewritten
    assert!(pushed.args()[1].has_functor("$cut_to", 1));
    let ite = &pushed.args()[0];
    // condition of -> is untouched, the then-branch is rewritten
    assert_eq!(ite.args()[0], Term::atom("a"));
    assert!(ite.args()[1].has_functor("$cut_to", 1));
}

#[test]
fn cut_rewrite_leaves_other_structures_alone() {
    let m = Machine::blank();
    let goal = parser::term("\\+(!).").unwrap();
    let (pushed, _) = m.push_conj(goal).pop_conj().unwrap();
    assert_eq!(pushed.args()[0], Term::atom("!"));
}

// ========== END-TO-END SCENARIOS ==========

#[test]
fn parent_enumerates_in_clause_order() {
    assert_eq!(names(&family(), "parent(X).", "X"), ["michael", "marc", "gail"]);
}

#[test]
fn cut_after_parent_keeps_only_the_first_answer() {
    assert_eq!(names(&family(), "parent(Name), !.", "Name"), ["michael"]);
}

#[test]
fn cut_inside_a_predicate_is_local_to_it() {
    let m = Machine::new()
        .consult(
            "single(foo) :- !.
             single(bar).
             twice(X) :- single(X).
             twice(bar).",
        )
        .unwrap();
    // the cut inside single/1 removes single's alternatives, not twice's
    assert_eq!(names(&m, "twice(X).", "X"), ["foo", "bar"]);
}

#[test]
fn append_concatenates() {
    let m = Machine::new()
        .consult(
            "append([], A, A).
             append([A|B], C, [A|D]) :- append(B, C, D).",
        )
        .unwrap();
    let answers = m.prove_all("append([a, b, c], [d, e], L).").unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].by_name("L").unwrap().to_string(), "[a, b, c, d, e]");
}

#[test]
fn append_splits_backwards() {
    let m = Machine::new()
        .consult(
            "append([], A, A).
             append([A|B], C, [A|D]) :- append(B, C, D).",
        )
        .unwrap();
    // four ways to split a three-element list
    let answers = m.prove_all("append(X, Y, [a, b, c]).").unwrap();
    assert_eq!(answers.len(), 4);
    assert_eq!(answers[0].by_name("X").unwrap().to_string(), "[]");
    assert_eq!(answers[3].by_name("Y").unwrap().to_string(), "[]");
}

#[test]
fn can_prove_stops_after_the_first_answer() {
    let counter = std::sync::Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();
    let preds: Vec<(&'static str, ForeignPredicate)> = vec![(
        "increment_counter/0",
        std::sync::Arc::new(move |_m: &Machine, _args: &[Term]| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(ForeignReturn::True)
        }),
    )];
    let m = Machine::new()
        .consult(
            "go :- increment_counter.
             go :- increment_counter.",
        )
        .unwrap()
        .register_foreign(preds);

    assert!(m.can_prove("go.").unwrap());
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn cut_inside_negation_is_local() {
    let m = Machine::new();
    let answers = m.prove_all("\\+(!) ; X = ok.").unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].by_name("X").unwrap(), Term::atom("ok"));
}

// ========== CONTROL CONSTRUCTS ==========

#[test]
fn disjunction_tries_left_then_right() {
    let m = Machine::new();
    assert_eq!(names(&m, "(X = a ; X = b).", "X"), ["a", "b"]);
}

#[test]
fn if_then_else_takes_the_then_branch() {
    let m = family();
    assert_eq!(
        names(&m, "(father(marc) -> X = yes ; X = no).", "X"),
        ["yes"]
    );
}

#[test]
fn if_then_else_takes_the_else_branch() {
    let m = family();
    assert_eq!(
        names(&m, "(father(nobody) -> X = yes ; X = no).", "X"),
        ["no"]
    );
}

#[test]
fn if_then_commits_to_the_first_condition_answer() {
    let m = family();
    // father/1 has two answers, the condition commits to the first
    assert_eq!(names(&m, "(father(F) -> X = F ; X = none).", "X"), ["michael"]);
}

#[test]
fn bare_if_then_fails_when_condition_fails() {
    let m = family();
    assert_eq!(m.prove_all("(father(nobody) -> X = yes).").unwrap().len(), 0);
}

#[test]
fn negation_as_failure() {
    let m = family();
    assert!(m.can_prove("\\+(father(nobody)).").unwrap());
    assert!(!m.can_prove("\\+(father(marc)).").unwrap());
}

#[test]
fn call_appends_extra_arguments() {
    let m = family();
    assert_eq!(names(&m, "call(father, X).", "X"), ["michael", "marc"]);
    assert!(m.can_prove("call(father(michael)).").unwrap());
}

#[test]
fn call_of_unbound_goal_is_an_error() {
    let m = Machine::new();
    assert!(matches!(
        m.can_prove("call(X)."),
        Err(Error::Instantiation(_))
    ));
}

// ========== ANSWERS AND LAZINESS ==========

#[test]
fn solutions_are_lazy() {
    let m = Machine::new()
        .consult(
            "nat(zero).
             nat(s(N)) :- nat(N).",
        )
        .unwrap();
    let goal = parser::term("nat(X).").unwrap();
    let first_three: Vec<String> = m
        .solutions(goal)
        .take(3)
        .map(|answer| answer.unwrap().by_name("X").unwrap().to_string())
        .collect();
    assert_eq!(first_three, ["zero", "s(zero)", "s(s(zero))"]);
}

#[test]
fn can_prove_agrees_with_prove_all() {
    let m = family();
    for goal in ["parent(michael).", "parent(nobody).", "father(X)."] {
        assert_eq!(
            m.can_prove(goal).unwrap(),
            !m.prove_all(goal).unwrap().is_empty(),
            "disagreement on {}",
            goal
        );
    }
}

#[test]
fn queries_without_variables_answer_yes_or_no() {
    let m = family();
    assert_eq!(m.prove_all("father(michael).").unwrap().len(), 1);
    assert_eq!(m.prove_all("father(nobody).").unwrap().len(), 0);
}

#[test]
fn rename_invariance_of_clauses() {
    let clause = parser::term("p(f(X)) :- q(X).").unwrap();
    let fact = parser::term("q(a).").unwrap();

    let base = Machine::new();
    let with = |c: Term| {
        let db = base
            .database()
            .clone()
            .assertz(c)
            .unwrap()
            .assertz(fact.clone())
            .unwrap();
        base.set_database(db)
    };

    let plain = names(&with(clause.clone()), "p(Y).", "Y");
    let renamed = names(&with(clause.rename_variables()), "p(Y).", "Y");
    assert_eq!(plain, renamed);
    assert_eq!(plain, ["f(a)"]);
}

#[test]
fn machines_are_unaffected_by_queries() {
    let m = family();
    let _ = m.prove_all("parent(X).").unwrap();
    // same machine, same answers, twice
    assert_eq!(names(&m, "parent(X).", "X").len(), 3);
    assert_eq!(names(&m, "parent(X).", "X").len(), 3);
}

// ========== ERRORS ==========

#[test]
fn undefined_predicate_surfaces_as_an_error() {
    let m = Machine::new();
    assert!(matches!(
        m.can_prove("no_such_predicate."),
        Err(Error::Database(DatabaseError::UndefinedPredicate(_)))
    ));
}

#[test]
fn arithmetic_errors_surface_through_is() {
    let m = Machine::new();
    assert!(matches!(m.can_prove("X is foo + 1."), Err(Error::Arith(_))));
    assert!(matches!(m.can_prove("X is Y + 1."), Err(Error::Arith(_))));
}

#[test]
fn parse_errors_surface_from_queries() {
    let m = Machine::new();
    assert!(matches!(m.can_prove("father(."), Err(Error::Parse(_))));
}

#[test]
fn consult_rejects_non_callable_clauses() {
    let m = Machine::new();
    assert!(matches!(
        m.consult("42."),
        Err(Error::Database(DatabaseError::NotCallable(_)))
    ));
}

#[test]
fn consult_ignores_directives() {
    let m = Machine::new().consult(":- would_run_at_load. foo.").unwrap();
    assert!(m.can_prove("foo.").unwrap());
}

// ========== BUILT-IN CATALOGUE ==========

#[test]
fn unification_builtin() {
    let m = Machine::new();
    assert_eq!(names(&m, "X = f(a).", "X"), ["f(a)"]);
    assert!(!m.can_prove("a = b.").unwrap());
}

#[test]
fn is_evaluates_arithmetic() {
    let m = Machine::new();
    assert_eq!(names(&m, "X is 1 + 2.", "X"), ["3"]);
    assert_eq!(names(&m, "X is 7 mod 3.", "X"), ["1"]);
    assert_eq!(names(&m, "X is -7 mod 3.", "X"), ["2"]);
    assert_eq!(names(&m, "X is 1 / 2 + 1 / 2.", "X"), ["1"]);
    assert!(m.can_prove("3 is 1 + 2.").unwrap());
    assert!(!m.can_prove("4 is 1 + 2.").unwrap());
}

#[test]
fn is_binds_exact_integers_not_floats() {
    let m = Machine::new();
    // strict unification: the integer 3 is not the float 3.0
    assert!(!m.can_prove("3 is 1.0 + 2.0.").unwrap());
    assert!(m.can_prove("X is 1.0 + 2.0, X =:= 3.").unwrap());
}

#[test]
fn numeric_equality_coerces() {
    let m = Machine::new();
    assert!(m.can_prove("1 =:= 1.0.").unwrap());
    assert!(!m.can_prove("1 =:= 2.").unwrap());
}

#[test]
fn standard_order_builtins() {
    let m = Machine::new();
    assert!(m.can_prove("f(a) == f(a).").unwrap());
    assert!(m.can_prove("f(a) \\== f(b).").unwrap());
    // variable < number < atom < compound
    assert!(m.can_prove("1 @< a.").unwrap());
    assert!(m.can_prove("a @< f(a).").unwrap());
    assert!(m.can_prove("X @< 1.").unwrap());
    assert!(m.can_prove("a @=< a.").unwrap());
    assert!(m.can_prove("f(b) @> f(a).").unwrap());
    assert!(m.can_prove("f(b) @>= f(b).").unwrap());
}

#[test]
fn var_and_ground_tests() {
    let m = Machine::new();
    assert!(m.can_prove("var(X).").unwrap());
    assert!(!m.can_prove("var(a).").unwrap());
    assert!(!m.can_prove("X = a, var(X).").unwrap());
    assert!(m.can_prove("ground(f(a, 1)).").unwrap());
    assert!(!m.can_prove("ground(f(a, X)).").unwrap());
}

#[test]
fn findall_collects_all_answers() {
    let m = family();
    assert_eq!(
        names(&m, "findall(X, parent(X), L).", "L"),
        ["[michael, marc, gail]"]
    );
}

#[test]
fn findall_of_a_failing_goal_is_the_empty_list() {
    let m = family();
    assert_eq!(names(&m, "findall(X, father(nobody_named_x), L).", "L"), ["[]"]);
}

#[test]
fn findall_does_not_bind_the_template() {
    let m = family();
    // X stays unbound outside the findall
    let answers = m.prove_all("findall(X, parent(X), L), var(X).").unwrap();
    assert_eq!(answers.len(), 1);
}

#[test]
fn msort_sorts_keeping_duplicates() {
    let m = Machine::new();
    assert_eq!(names(&m, "msort([b, a, c, a], L).", "L"), ["[a, a, b, c]"]);
    assert_eq!(names(&m, "msort([2, 1, f(a), z], L).", "L"), ["[1, 2, z, f(a)]"]);
}

#[test]
fn succ_works_both_ways() {
    let m = Machine::new();
    assert_eq!(names(&m, "succ(2, X).", "X"), ["3"]);
    assert_eq!(names(&m, "succ(X, 3).", "X"), ["2"]);
    assert!(!m.can_prove("succ(X, 0).").unwrap());
    assert!(matches!(m.can_prove("succ(X, Y)."), Err(Error::Instantiation(_))));
}

#[test]
fn atom_codes_converts_both_ways() {
    let m = Machine::new();
    assert!(m.can_prove("atom_codes(hi, \"hi\").").unwrap());
    assert_eq!(names(&m, "atom_codes(A, \"hi\").", "A"), ["hi"]);
    // numbers convert through their canonical text
    assert!(m.can_prove("atom_codes(42, \"42\").").unwrap());
}

#[test]
fn atom_number_parses_and_fails_cleanly() {
    let m = Machine::new();
    assert_eq!(names(&m, "atom_number('42', N).", "N"), ["42"]);
    assert_eq!(names(&m, "atom_number('2.5', N).", "N"), ["2.5"]);
    assert!(!m.can_prove("atom_number(hello, N).").unwrap());
    assert_eq!(names(&m, "atom_number(A, 7).", "A"), ["'7'"]);
}

#[test]
fn downcase_atom_lowercases() {
    let m = Machine::new();
    assert_eq!(names(&m, "downcase_atom('HeLLo', X).", "X"), ["hello"]);
}

#[test]
fn printf_validates_its_arguments() {
    let m = Machine::new();
    assert!(m.can_prove("printf(\"ok~n\").").unwrap());
    assert!(m.can_prove("printf(\"~w and ~w~n\", [a, b]).").unwrap());
    assert!(matches!(
        m.can_prove("printf(\"~w\", [])."),
        Err(Error::Type(_))
    ));
}

#[test]
fn prelude_phrase_delegates_to_call() {
    let m = Machine::new()
        .consult("greeting([hello|T], T).")
        .unwrap();
    assert!(m.can_prove("phrase(greeting, [hello], []).").unwrap());
}
