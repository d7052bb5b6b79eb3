//! Interactive help for the top-level.
//!
//! Adds `help/0`, `help/1` and `apropos/1` plus the help-text registry
//! they read. Output goes to stderr so it never mixes with printf/1
//! output on stdout.

use crate::machine::{ForeignPredicate, ForeignResult, ForeignReturn, Machine};
use crate::term::Term;
use std::sync::Arc;

/// A standard machine extended with the interactive help predicates.
pub fn interactive_machine() -> Machine {
    let help: Vec<(&'static str, ForeignPredicate)> = vec![
        ("help/0", Arc::new(help0)),
        ("help/1", Arc::new(help1)),
        ("apropos/1", Arc::new(apropos1)),
    ];
    Machine::new()
        .register_help(builtin_help())
        .register_foreign(help)
}

fn help0(_m: &Machine, _args: &[Term]) -> ForeignResult {
    eprintln!(
        "\nUse:\n?- help(predicate).\nto print documentation of the predicate.\n\
         ?- apropos(name).\nto look for predicates containing name.\n"
    );
    Ok(ForeignReturn::True)
}

fn help1(m: &Machine, args: &[Term]) -> ForeignResult {
    let Some(subject) = subject_text(&args[0]) else {
        eprintln!("help/1 expects an atom or a string");
        return Ok(ForeignReturn::True);
    };
    match m.help_text(&subject) {
        Some(text) => eprintln!("{}", text),
        None => {
            eprintln!("No help on {}", subject);
            let near = matching_indicators(m, &subject);
            if !near.is_empty() {
                eprintln!("Maybe you meant:");
                for pi in near {
                    eprintln!("  {}", pi);
                }
            }
        }
    }
    Ok(ForeignReturn::True)
}

fn apropos1(m: &Machine, args: &[Term]) -> ForeignResult {
    let Some(subject) = subject_text(&args[0]) else {
        eprintln!("apropos/1 expects an atom or a string");
        return Ok(ForeignReturn::True);
    };
    for pi in matching_indicators(m, &subject) {
        eprintln!("{}", pi);
    }
    Ok(ForeignReturn::True)
}

fn subject_text(t: &Term) -> Option<String> {
    match t {
        Term::Atom(a) => Some(a.name().to_string()),
        _ => codes(t),
    }
}

fn codes(t: &Term) -> Option<String> {
    let mut out = String::new();
    for item in t.list_items()? {
        match item {
            Term::Int(code) => {
                use num_traits::ToPrimitive;
                out.push(char::from_u32(code.to_u32()?)?);
            }
            _ => return None,
        }
    }
    Some(out)
}

fn matching_indicators(m: &Machine, needle: &str) -> Vec<String> {
    m.foreign_indicators()
        .into_iter()
        .filter(|pi| pi.contains(needle))
        .collect()
}

fn builtin_help() -> Vec<(String, String)> {
    [
        ("help/0", "Prints help usage."),
        ("help/1", "Prints the usage of the given predicate."),
        (
            "apropos/1",
            "Lists the known predicates whose indicator contains the given text.",
        ),
        ("!/0", "Cut operator, prevents backtracking beyond this point."),
        (",/2", "Conjunction operator."),
        ("->/2", "If-then operator."),
        (";/2", "Disjunction operator."),
        ("=/2", "Unification operator."),
        ("=:=/2", "Numeric equality operator."),
        ("==/2", "Term equality operator."),
        ("\\==/2", "Term inequality operator."),
        ("@</2", "Term order less-than operator."),
        ("@=</2", "Term order less-or-equal operator."),
        ("@>/2", "Term order greater-than operator."),
        ("@>=/2", "Term order greater-or-equal operator."),
        ("\\+/1", "Negation as failure."),
        (
            "atom_codes/2",
            "Second argument is the list of character codes of the first argument's name.",
        ),
        (
            "atom_number/2",
            "Second argument is the number spelled by the first argument's name.",
        ),
        ("call/1", "Evaluates its argument as a goal."),
        (
            "call/2",
            "Constructs a goal from its arguments and evaluates it.",
        ),
        ("downcase_atom/2", "Second argument is the first, lowercased."),
        ("fail/0", "Fails unconditionally."),
        (
            "findall/3",
            "Collects the template instance for every answer of the goal.",
        ),
        ("ground/1", "Succeeds if the argument has no variables."),
        (
            "is/2",
            "Evaluates the right side arithmetically and unifies the result with the left.",
        ),
        ("listing/0", "Prints every predicate known to this machine."),
        ("msort/2", "Sorts a list by the standard order, keeping duplicates."),
        ("printf/1", "Prints its argument."),
        (
            "printf/2",
            "Prints the template with ~w replaced by elements of the argument list.",
        ),
        ("printf/3", "Like printf/2, onto the given stream."),
        (
            "succ/2",
            "True if the second argument is one greater than the first.",
        ),
        ("var/1", "True if the argument is an unbound variable."),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interactive_machine_knows_help_predicates() {
        let m = interactive_machine();
        assert!(m.can_prove("help.").unwrap());
        assert!(m.can_prove("apropos(findall).").unwrap());
    }

    #[test]
    fn help_text_is_registered() {
        let m = interactive_machine();
        assert!(m.help_text("findall/3").is_some());
        assert!(m.help_text("no_such/9").is_none());
    }

    #[test]
    fn matching_is_by_substring() {
        let m = interactive_machine();
        let hits = matching_indicators(&m, "atom_");
        assert!(hits.contains(&"atom_codes/2".to_string()));
        assert!(hits.contains(&"atom_number/2".to_string()));
    }

    #[test]
    fn subject_accepts_atoms_and_strings() {
        assert_eq!(subject_text(&Term::atom("findall")), Some("findall".into()));
        assert_eq!(subject_text(&Term::code_list("msort")), Some("msort".into()));
        assert_eq!(subject_text(&Term::int(3)), None);
    }
}
