//! The built-in predicates.
//!
//! Everything here, including the control constructs, is an ordinary
//! foreign predicate: a function handed the machine and the resolved
//! goal arguments, answering with a `ForeignReturn`. Control constructs
//! work by reshaping the machine's stacks and handing it back, which
//! keeps the stepper itself small.

use crate::arith;
use crate::choice_point::ChoicePoint;
use crate::machine::{Error, ForeignPredicate, ForeignResult, ForeignReturn, Machine, Step};
use crate::term::Term;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::sync::Arc;

/// The standard predicate table registered into every `Machine::new()`.
pub fn standard_predicates() -> Vec<(&'static str, ForeignPredicate)> {
    let table: Vec<(&'static str, ForeignPredicate)> = vec![
        ("!/0", Arc::new(cut)),
        ("$cut_to/1", Arc::new(cut_to)),
        (",/2", Arc::new(comma)),
        ("->/2", Arc::new(if_then)),
        (";/2", Arc::new(semicolon)),
        ("=/2", Arc::new(unify2)),
        ("=:=/2", Arc::new(numeric_equals)),
        ("==/2", Arc::new(term_equals)),
        ("\\==/2", Arc::new(term_not_equals)),
        ("@</2", Arc::new(term_less)),
        ("@=</2", Arc::new(term_less_equals)),
        ("@>/2", Arc::new(term_greater)),
        ("@>=/2", Arc::new(term_greater_equals)),
        ("\\+/1", Arc::new(not_provable)),
        ("atom_codes/2", Arc::new(atom_codes)),
        ("atom_number/2", Arc::new(atom_number)),
        ("call/1", Arc::new(call)),
        ("call/2", Arc::new(call)),
        ("call/3", Arc::new(call)),
        ("call/4", Arc::new(call)),
        ("call/5", Arc::new(call)),
        ("call/6", Arc::new(call)),
        ("downcase_atom/2", Arc::new(downcase_atom)),
        ("fail/0", Arc::new(fail)),
        ("findall/3", Arc::new(findall)),
        ("ground/1", Arc::new(ground)),
        ("is/2", Arc::new(is2)),
        ("listing/0", Arc::new(listing)),
        ("msort/2", Arc::new(msort)),
        ("printf/1", Arc::new(printf)),
        ("printf/2", Arc::new(printf)),
        ("printf/3", Arc::new(printf)),
        ("succ/2", Arc::new(succ)),
        ("var/1", Arc::new(var1)),
    ];
    table
}

// !/0
// If there were anything to cut, this goal would have been rewritten to
// $cut_to/1 at push time. Reaching the bare cut means there is nothing
// to remove, so it is an alias for true/0.
fn cut(_m: &Machine, _args: &[Term]) -> ForeignResult {
    Ok(ForeignReturn::True)
}

// $cut_to/1
fn cut_to(m: &Machine, args: &[Term]) -> ForeignResult {
    let id = match &args[0] {
        Term::Int(i) => i.to_u64(),
        _ => None,
    };
    let id = id.unwrap_or_else(|| panic!("$cut_to/1 requires a barrier id, got {}", args[0]));
    Ok(ForeignReturn::Machine(m.cut_to(id)))
}

// ,/2
fn comma(m: &Machine, args: &[Term]) -> ForeignResult {
    let next = m.push_conj(args[1].clone()).push_conj(args[0].clone());
    Ok(ForeignReturn::Machine(next))
}

// ->/2
// Bare if-then: prove (Cond, !, Then) under its own barrier, so proving
// the condition commits to its first answer.
fn if_then(m: &Machine, args: &[Term]) -> ForeignResult {
    let goal = conj(args[0].clone(), conj(Term::atom("!"), args[1].clone()));
    Ok(ForeignReturn::Machine(m.demand_cut_barrier().push_conj(goal)))
}

// ;/2
// If-then-else when the left side is ->/2, plain disjunction otherwise.
fn semicolon(m: &Machine, args: &[Term]) -> ForeignResult {
    if args[0].has_functor("->", 2) {
        let cond = args[0].args()[0].clone();
        let then = args[0].args()[1].clone();
        let els = args[1].clone();

        let m = m.demand_cut_barrier();
        let m = m.push_disj(ChoicePoint::simple(m.clone(), els));
        // call/1 gives the condition its own barrier, keeping any cut
        // inside it local; the bare ! commits to the then-branch
        let goal = conj(
            Term::compound("call", [cond]),
            conj(Term::atom("!"), then),
        );
        return Ok(ForeignReturn::Machine(m.push_conj(goal)));
    }

    let cp = ChoicePoint::simple(m.clone(), args[1].clone());
    let next = m.push_disj(cp).push_conj(args[0].clone());
    Ok(ForeignReturn::Machine(next))
}

// =/2
fn unify2(_m: &Machine, args: &[Term]) -> ForeignResult {
    Ok(ForeignReturn::Unify(vec![args[0].clone(), args[1].clone()]))
}

// =:=/2
fn numeric_equals(_m: &Machine, args: &[Term]) -> ForeignResult {
    if arith::numeric_eq(&args[0], &args[1])? {
        Ok(ForeignReturn::True)
    } else {
        Ok(ForeignReturn::Fail)
    }
}

// ==/2 and friends compare resolved arguments in the standard order.
fn term_compare(args: &[Term], accept: fn(Ordering) -> bool) -> ForeignResult {
    if accept(args[0].cmp(&args[1])) {
        Ok(ForeignReturn::True)
    } else {
        Ok(ForeignReturn::Fail)
    }
}

fn term_equals(_m: &Machine, args: &[Term]) -> ForeignResult {
    term_compare(args, Ordering::is_eq)
}

fn term_not_equals(_m: &Machine, args: &[Term]) -> ForeignResult {
    term_compare(args, Ordering::is_ne)
}

fn term_less(_m: &Machine, args: &[Term]) -> ForeignResult {
    term_compare(args, Ordering::is_lt)
}

fn term_less_equals(_m: &Machine, args: &[Term]) -> ForeignResult {
    term_compare(args, Ordering::is_le)
}

fn term_greater(_m: &Machine, args: &[Term]) -> ForeignResult {
    term_compare(args, Ordering::is_gt)
}

fn term_greater_equals(_m: &Machine, args: &[Term]) -> ForeignResult {
    term_compare(args, Ordering::is_ge)
}

// \+/1
// Negation as failure: prove the goal on an isolated machine until the
// first answer or exhaustion.
fn not_provable(m: &Machine, args: &[Term]) -> ForeignResult {
    let mut sub = m
        .clear_conjs()
        .clear_disjs()
        .demand_cut_barrier()
        .push_conj(args[0].clone());
    loop {
        match sub.step()? {
            Step::Emit(_, _) => return Ok(ForeignReturn::Fail),
            Step::Continue(next) => sub = next,
            Step::Exhausted => return Ok(ForeignReturn::True),
        }
    }
}

// atom_codes/2
fn atom_codes(_m: &Machine, args: &[Term]) -> ForeignResult {
    if let Some(text) = atomic_text(&args[0]) {
        return Ok(ForeignReturn::Unify(vec![
            args[1].clone(),
            Term::code_list(&text),
        ]));
    }
    if args[0].is_var() {
        let text = codes_text(&args[1]).ok_or_else(|| {
            Error::Instantiation("atom_codes/2 needs an atom or a code list".into())
        })?;
        return Ok(ForeignReturn::Unify(vec![
            args[0].clone(),
            Term::atom(&text),
        ]));
    }
    Err(Error::Type(format!("atom_codes/2: not an atom: {}", args[0])))
}

// atom_number/2
fn atom_number(_m: &Machine, args: &[Term]) -> ForeignResult {
    match &args[0] {
        Term::Atom(a) => match parse_number(a.name()) {
            Some(n) => Ok(ForeignReturn::Unify(vec![args[1].clone(), n])),
            None => Ok(ForeignReturn::Fail),
        },
        Term::Var(_) => {
            let text = atomic_text(&args[1]).ok_or_else(|| {
                Error::Instantiation("atom_number/2 needs an atom or a number".into())
            })?;
            if !args[1].is_number() {
                return Err(Error::Type(format!(
                    "atom_number/2: not a number: {}",
                    args[1]
                )));
            }
            Ok(ForeignReturn::Unify(vec![
                args[0].clone(),
                Term::atom(&text),
            ]))
        }
        other => Err(Error::Type(format!("atom_number/2: not an atom: {}", other))),
    }
}

// call/1 ..= call/6
// Dereference the callable, append the extra arguments, and prove the
// reconstructed goal under a fresh barrier.
fn call(m: &Machine, args: &[Term]) -> ForeignResult {
    let target = &args[0];
    if target.is_var() {
        return Err(Error::Instantiation("call: unbound goal".into()));
    }
    if !target.is_callable() {
        return Err(Error::NotCallable(target.clone()));
    }
    let name = target.name().unwrap_or_default();
    let goal_args: Vec<Term> = target
        .args()
        .iter()
        .chain(&args[1..])
        .cloned()
        .collect();
    let goal = Term::compound(name, goal_args);
    Ok(ForeignReturn::Machine(m.demand_cut_barrier().push_conj(goal)))
}

// downcase_atom/2
fn downcase_atom(_m: &Machine, args: &[Term]) -> ForeignResult {
    match &args[0] {
        Term::Atom(a) => Ok(ForeignReturn::Unify(vec![
            args[1].clone(),
            Term::atom(&a.name().to_lowercase()),
        ])),
        Term::Var(_) => Err(Error::Instantiation("downcase_atom/2".into())),
        other => Err(Error::Type(format!(
            "downcase_atom/2: not an atom: {}",
            other
        ))),
    }
}

// fail/0
fn fail(_m: &Machine, _args: &[Term]) -> ForeignResult {
    Ok(ForeignReturn::Fail)
}

// findall/3
// Run the goal on an isolated machine, collect the template under each
// answer, and unify the collected list with the third argument.
fn findall(m: &Machine, args: &[Term]) -> ForeignResult {
    let template = args[0].clone();
    let mut sub = m
        .clear_conjs()
        .clear_disjs()
        .demand_cut_barrier()
        .push_conj(args[1].clone());
    let mut collected = Vec::new();
    loop {
        match sub.step()? {
            Step::Emit(next, answer) => {
                collected.push(answer.resolve_term(&template));
                sub = next;
            }
            Step::Continue(next) => sub = next,
            Step::Exhausted => break,
        }
    }
    Ok(ForeignReturn::Unify(vec![
        args[2].clone(),
        Term::list(collected),
    ]))
}

// ground/1
fn ground(_m: &Machine, args: &[Term]) -> ForeignResult {
    if args[0].is_ground() {
        Ok(ForeignReturn::True)
    } else {
        Ok(ForeignReturn::Fail)
    }
}

// is/2
fn is2(_m: &Machine, args: &[Term]) -> ForeignResult {
    let value = arith::eval(&args[1])?;
    Ok(ForeignReturn::Unify(vec![args[0].clone(), value]))
}

// listing/0
fn listing(m: &Machine, _args: &[Term]) -> ForeignResult {
    println!("{}", m.database());
    Ok(ForeignReturn::True)
}

// msort/2
// Stable sort by the standard order; duplicates are kept.
fn msort(_m: &Machine, args: &[Term]) -> ForeignResult {
    if args[0].is_var() {
        return Err(Error::Instantiation("msort/2".into()));
    }
    let mut items = args[0]
        .list_items()
        .ok_or_else(|| Error::Type(format!("msort/2: not a proper list: {}", args[0])))?;
    items.sort();
    Ok(ForeignReturn::Unify(vec![
        args[1].clone(),
        Term::list(items),
    ]))
}

// printf/1, printf/2, printf/3
// ~w writes the next argument, ~n a newline, ~~ a literal tilde.
fn printf(_m: &Machine, args: &[Term]) -> ForeignResult {
    let (to_stderr, format_arg, list_arg) = match args.len() {
        1 => (false, &args[0], None),
        2 => (false, &args[0], Some(&args[1])),
        3 => {
            let stream = args[0].name().unwrap_or_default();
            let to_stderr = match stream {
                "user_error" => true,
                "user_output" => false,
                _ => {
                    return Err(Error::Type(format!(
                        "printf/3: unknown stream: {}",
                        args[0]
                    )))
                }
            };
            (to_stderr, &args[1], Some(&args[2]))
        }
        _ => unreachable!("printf is registered at arities 1..=3"),
    };

    let format = atomic_text(format_arg)
        .or_else(|| codes_text(format_arg))
        .ok_or_else(|| Error::Type(format!("printf: bad format: {}", format_arg)))?;
    let mut values = match list_arg {
        Some(t) => t
            .list_items()
            .ok_or_else(|| Error::Type(format!("printf: not a proper list: {}", t)))?
            .into_iter(),
        None => Vec::new().into_iter(),
    };

    let mut out = String::new();
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('w') => {
                let value = values
                    .next()
                    .ok_or_else(|| Error::Type("printf: not enough arguments".into()))?;
                out.push_str(&value.to_string());
            }
            Some('n') => out.push('\n'),
            Some('~') => out.push('~'),
            other => {
                return Err(Error::Type(format!(
                    "printf: unknown directive ~{}",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }

    if to_stderr {
        eprint!("{}", out);
    } else {
        print!("{}", out);
    }
    Ok(ForeignReturn::True)
}

// succ/2
fn succ(_m: &Machine, args: &[Term]) -> ForeignResult {
    match (&args[0], &args[1]) {
        (Term::Int(x), _) => {
            if x.is_negative() {
                return Err(Error::Type(format!("succ/2: not a natural number: {}", x)));
            }
            Ok(ForeignReturn::Unify(vec![
                args[1].clone(),
                Term::Int(x + 1u32),
            ]))
        }
        (Term::Var(_), Term::Int(y)) => {
            if y.is_negative() {
                return Err(Error::Type(format!("succ/2: not a natural number: {}", y)));
            }
            if y.is_zero() {
                // zero has no natural predecessor
                return Ok(ForeignReturn::Fail);
            }
            Ok(ForeignReturn::Unify(vec![
                args[0].clone(),
                Term::Int(y - 1u32),
            ]))
        }
        (Term::Var(_), Term::Var(_)) => Err(Error::Instantiation("succ/2".into())),
        _ => Err(Error::Type("succ/2: integer expected".into())),
    }
}

// var/1
fn var1(_m: &Machine, args: &[Term]) -> ForeignResult {
    if args[0].is_var() {
        Ok(ForeignReturn::True)
    } else {
        Ok(ForeignReturn::Fail)
    }
}

fn conj(a: Term, b: Term) -> Term {
    Term::compound(",", [a, b])
}

/// Text of an atom or number, for the atom conversion predicates.
fn atomic_text(t: &Term) -> Option<String> {
    match t {
        Term::Atom(a) => Some(a.name().to_string()),
        Term::Int(_) | Term::Float(_) | Term::Rational(_) => Some(t.to_string()),
        _ => None,
    }
}

/// Decode a proper list of character codes into text.
fn codes_text(t: &Term) -> Option<String> {
    let items = t.list_items()?;
    let mut out = String::new();
    for item in items {
        let code = match item {
            Term::Int(i) => i.to_u32()?,
            _ => return None,
        };
        out.push(char::from_u32(code)?);
    }
    Some(out)
}

/// Parse an atom's text as an integer or float, the way the lexer would.
fn parse_number(text: &str) -> Option<Term> {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<BigInt>() {
        return Some(Term::Int(i));
    }
    trimmed.parse::<f64>().ok().map(Term::Float)
}
