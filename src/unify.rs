//! Unification of terms under a persistent environment.

use crate::bindings::Bindings;
use crate::term::Term;
use std::fmt;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// Returned when two terms cannot be unified. This is a recoverable
/// control-flow outcome, not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CantUnify;

impl fmt::Display for CantUnify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("can't unify the given terms")
    }
}

impl std::error::Error for CantUnify {}

/// Unify two terms, returning the extended environment on success.
///
/// On failure the caller's environment is untouched; intermediate
/// bindings made while descending into compound arguments are discarded
/// with it. No occurs check is performed.
pub fn unify(env: &Bindings, a: &Term, b: &Term) -> Result<Bindings, CantUnify> {
    let a = shallow_resolve(env, a);
    let b = shallow_resolve(env, b);

    match (&a, &b) {
        // identical variables unify without a binding; this is also the
        // guard that keeps self-cycles out of the environment
        (Term::Var(x), Term::Var(y)) if x == y => Ok(env.clone()),
        (Term::Var(x), _) => env.bind(*x, b.clone()).map_err(|_| CantUnify),
        (_, Term::Var(y)) => env.bind(*y, a.clone()).map_err(|_| CantUnify),

        (Term::Int(x), Term::Int(y)) => accept(env, x == y),
        (Term::Rational(x), Term::Rational(y)) => accept(env, x == y),
        (Term::Int(i), Term::Rational(r)) | (Term::Rational(r), Term::Int(i)) => {
            accept(env, r.is_integer() && r.numer() == i)
        }
        // strict type discipline: floats only ever unify with floats
        (Term::Float(x), Term::Float(y)) => accept(env, x == y),

        (Term::Atom(x), Term::Atom(y)) => accept(env, x == y),

        (Term::Compound(x), Term::Compound(y)) => {
            if x.name_key() != y.name_key() || x.arity() != y.arity() {
                #[cfg(feature = "tracing")]
                trace!("unify_functor_mismatch");
                return Err(CantUnify);
            }
            let mut acc = env.clone();
            for (xa, ya) in x.args().iter().zip(y.args()) {
                acc = unify(&acc, xa, ya)?;
            }
            Ok(acc)
        }

        _ => Err(CantUnify),
    }
}

fn accept(env: &Bindings, ok: bool) -> Result<Bindings, CantUnify> {
    if ok {
        Ok(env.clone())
    } else {
        Err(CantUnify)
    }
}

/// Resolve a variable to the end of its binding chain: either the final
/// free variable or the first non-variable value. Non-variables pass
/// through unchanged.
fn shallow_resolve(env: &Bindings, term: &Term) -> Term {
    let Term::Var(v) = term else {
        return term.clone();
    };
    let mut current = *v;
    loop {
        match env.value(&current) {
            None => return Term::Var(current),
            Some(Term::Var(next)) => current = *next,
            Some(value) => return value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Var;
    use num_bigint::BigInt;
    use num_rational::BigRational;

    fn rat(n: i64, d: i64) -> Term {
        Term::rational(BigRational::new(BigInt::from(n), BigInt::from(d)))
    }

    // ========== VARIABLES ==========

    #[test]
    fn same_variable_unifies_without_binding() {
        let env = Bindings::new();
        let x = Term::var("X");
        let out = unify(&env, &x, &x).unwrap();
        assert_eq!(out.size(), 0);
    }

    #[test]
    fn variable_binds_to_ground_term() {
        let env = Bindings::new();
        let x = Var::named("X");
        let out = unify(&env, &Term::Var(x), &Term::atom("a")).unwrap();
        assert_eq!(out.resolve(x), Term::atom("a"));
    }

    #[test]
    fn ground_term_binds_variable_on_the_right() {
        let env = Bindings::new();
        let x = Var::named("X");
        let out = unify(&env, &Term::atom("a"), &Term::Var(x)).unwrap();
        assert_eq!(out.resolve(x), Term::atom("a"));
    }

    #[test]
    fn two_variables_alias() {
        let env = Bindings::new();
        let x = Var::named("X");
        let y = Var::named("Y");
        let out = unify(&env, &Term::Var(x), &Term::Var(y)).unwrap();
        let out = unify(&out, &Term::Var(y), &Term::atom("v")).unwrap();
        assert_eq!(out.resolve(x), Term::atom("v"));
    }

    #[test]
    fn bound_variable_unifies_through_its_value() {
        let env = Bindings::new();
        let x = Var::named("X");
        let env = env.bind(x, Term::atom("a")).unwrap();
        assert!(unify(&env, &Term::Var(x), &Term::atom("a")).is_ok());
        assert!(unify(&env, &Term::Var(x), &Term::atom("b")).is_err());
    }

    #[test]
    fn aliased_variables_unify_as_one() {
        // X = Y, then Y = X must not rebind anything
        let env = Bindings::new();
        let x = Var::named("X");
        let y = Var::named("Y");
        let env = unify(&env, &Term::Var(x), &Term::Var(y)).unwrap();
        let out = unify(&env, &Term::Var(y), &Term::Var(x)).unwrap();
        assert_eq!(out.size(), env.size());
    }

    // ========== ATOMS AND NUMBERS ==========

    #[test]
    fn equal_atoms_unify() {
        let env = Bindings::new();
        assert!(unify(&env, &Term::atom("a"), &Term::atom("a")).is_ok());
        assert!(unify(&env, &Term::atom("a"), &Term::atom("b")).is_err());
    }

    #[test]
    fn equal_integers_unify() {
        let env = Bindings::new();
        assert!(unify(&env, &Term::int(3), &Term::int(3)).is_ok());
        assert!(unify(&env, &Term::int(3), &Term::int(4)).is_err());
    }

    #[test]
    fn integer_unifies_with_integral_rational() {
        let env = Bindings::new();
        assert!(unify(&env, &Term::int(3), &rat(3, 1)).is_ok());
        assert!(unify(&env, &rat(3, 1), &Term::int(3)).is_ok());
        assert!(unify(&env, &Term::int(3), &rat(7, 2)).is_err());
        assert!(unify(&env, &Term::int(3), &rat(4, 1)).is_err());
    }

    #[test]
    fn floats_never_unify_with_other_numeric_types() {
        let env = Bindings::new();
        assert!(unify(&env, &Term::float(3.0), &Term::int(3)).is_err());
        assert!(unify(&env, &Term::float(0.5), &rat(1, 2)).is_err());
        assert!(unify(&env, &Term::float(0.5), &Term::float(0.5)).is_ok());
        assert!(unify(&env, &Term::float(0.5), &Term::float(0.75)).is_err());
    }

    #[test]
    fn atom_never_unifies_with_number() {
        let env = Bindings::new();
        assert!(unify(&env, &Term::atom("3"), &Term::int(3)).is_err());
    }

    // ========== COMPOUNDS ==========

    #[test]
    fn compounds_unify_argument_wise() {
        let env = Bindings::new();
        let x = Var::named("X");
        let y = Var::named("Y");
        let a = Term::compound("f", [Term::Var(x), Term::atom("b")]);
        let b = Term::compound("f", [Term::atom("a"), Term::Var(y)]);
        let out = unify(&env, &a, &b).unwrap();
        assert_eq!(out.resolve(x), Term::atom("a"));
        assert_eq!(out.resolve(y), Term::atom("b"));
    }

    #[test]
    fn functor_and_arity_must_match() {
        let env = Bindings::new();
        let f1 = Term::compound("f", [Term::atom("a")]);
        let g1 = Term::compound("g", [Term::atom("a")]);
        let f2 = Term::compound("f", [Term::atom("a"), Term::atom("b")]);
        assert!(unify(&env, &f1, &g1).is_err());
        assert!(unify(&env, &f1, &f2).is_err());
    }

    #[test]
    fn shared_variable_conflict_fails() {
        let env = Bindings::new();
        let x = Var::named("X");
        let a = Term::compound("f", [Term::Var(x), Term::Var(x)]);
        let b = Term::compound("f", [Term::atom("a"), Term::atom("b")]);
        assert!(unify(&env, &a, &b).is_err());
    }

    #[test]
    fn failed_unification_leaves_environment_unchanged() {
        let env = Bindings::new();
        let x = Var::named("X");
        // first argument binds X, second argument fails
        let a = Term::compound("f", [Term::Var(x), Term::atom("b")]);
        let b = Term::compound("f", [Term::atom("a"), Term::atom("c")]);
        assert!(unify(&env, &a, &b).is_err());
        assert_eq!(env.size(), 0);
        assert_eq!(env.resolve(x), Term::Var(x));
    }

    #[test]
    fn list_pattern_unification() {
        let env = Bindings::new();
        let h = Var::named("H");
        let t = Var::named("T");
        let pattern = Term::partial_list([Term::Var(h)], Term::Var(t));
        let value = Term::list([Term::int(1), Term::int(2), Term::int(3)]);
        let out = unify(&env, &pattern, &value).unwrap();
        assert_eq!(out.resolve(h), Term::int(1));
        assert_eq!(out.resolve(t), Term::list([Term::int(2), Term::int(3)]));
    }

    // ========== PROPERTY SPOT CHECKS ==========

    #[test]
    fn unify_is_symmetric_on_ground_terms() {
        let env = Bindings::new();
        let a = Term::compound("f", [Term::atom("a"), Term::int(1)]);
        let b = Term::compound("f", [Term::atom("a"), Term::int(1)]);
        assert_eq!(unify(&env, &a, &b).is_ok(), unify(&env, &b, &a).is_ok());
    }

    #[test]
    fn unify_ground_term_with_itself_adds_no_bindings() {
        let env = Bindings::new();
        let t = Term::compound("f", [Term::list([Term::int(1)]), Term::atom("x")]);
        let out = unify(&env, &t, &t).unwrap();
        assert_eq!(out.size(), 0);
    }
}
