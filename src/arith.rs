//! Arithmetic evaluation for `is/2` and `=:=/2`.
//!
//! Expressions are ordinary terms built from numbers and the evaluable
//! functors `-/1`, `+/2`, `-/2`, `*/2`, `//2`, `mod/2` and `rem/2`.
//! Results stay exact as long as possible: integer op integer yields an
//! integer, integer division yields a rational, and any float operand
//! pushes the whole computation to floats. Rationals with denominator 1
//! simplify back to integers.

use crate::term::Term;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};
use std::fmt;

/// Failures while evaluating an arithmetic expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArithError {
    /// The expression contains an unbound variable.
    Instantiation,
    /// The expression contains a functor that is not evaluable.
    NotEvaluable(String),
    /// An operation received an operand of the wrong numeric type.
    TypeMismatch(&'static str),
    /// Division or remainder by zero.
    ZeroDivisor,
}

impl fmt::Display for ArithError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithError::Instantiation => {
                f.write_str("arguments are not sufficiently instantiated")
            }
            ArithError::NotEvaluable(what) => write!(f, "not an evaluable expression: {}", what),
            ArithError::TypeMismatch(expected) => write!(f, "type error: expected {}", expected),
            ArithError::ZeroDivisor => f.write_str("zero divisor"),
        }
    }
}

impl std::error::Error for ArithError {}

/// Evaluate an arithmetic expression to a number term.
pub fn eval(expr: &Term) -> Result<Term, ArithError> {
    Ok(eval_num(expr)?.into_term())
}

/// Arithmetic equality after evaluating both sides.
/// `1 =:= 1.0` holds even though the terms never unify.
pub fn numeric_eq(a: &Term, b: &Term) -> Result<bool, ArithError> {
    let a = eval_num(a)?;
    let b = eval_num(b)?;
    Ok(match (&a, &b) {
        (Num::Float(_), _) | (_, Num::Float(_)) => a.to_f64() == b.to_f64(),
        _ => a.to_rational() == b.to_rational(),
    })
}

/// Internal numeric tower, mirroring the term-level types.
enum Num {
    Int(BigInt),
    Rat(BigRational),
    Float(f64),
}

impl Num {
    fn into_term(self) -> Term {
        match self {
            Num::Int(i) => Term::Int(i),
            Num::Rat(r) => {
                if r.is_integer() {
                    Term::Int(r.numer().clone())
                } else {
                    Term::Rational(r)
                }
            }
            Num::Float(f) => Term::Float(f),
        }
    }

    fn to_f64(&self) -> f64 {
        match self {
            Num::Int(i) => i.to_f64().unwrap_or(if i.is_negative() {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            }),
            Num::Rat(r) => r.to_f64().unwrap_or(f64::NAN),
            Num::Float(f) => *f,
        }
    }

    /// Exact rational view; floats have none.
    fn to_rational(&self) -> BigRational {
        match self {
            Num::Int(i) => BigRational::from_integer(i.clone()),
            Num::Rat(r) => r.clone(),
            Num::Float(_) => unreachable!("floats are compared as floats"),
        }
    }

    fn is_float(&self) -> bool {
        matches!(self, Num::Float(_))
    }
}

fn eval_num(expr: &Term) -> Result<Num, ArithError> {
    match expr {
        Term::Int(i) => Ok(Num::Int(i.clone())),
        Term::Float(f) => Ok(Num::Float(*f)),
        Term::Rational(r) => Ok(Num::Rat(r.clone())),
        Term::Var(_) => Err(ArithError::Instantiation),
        Term::Atom(a) => Err(ArithError::NotEvaluable(format!("{}/0", a.name()))),
        Term::Compound(c) => {
            let args = c.args();
            match (c.name(), c.arity()) {
                ("-", 1) => Ok(negate(eval_num(&args[0])?)),
                ("+", 2) => binary(eval_num(&args[0])?, eval_num(&args[1])?, Op::Add),
                ("-", 2) => binary(eval_num(&args[0])?, eval_num(&args[1])?, Op::Sub),
                ("*", 2) => binary(eval_num(&args[0])?, eval_num(&args[1])?, Op::Mul),
                ("/", 2) => divide(eval_num(&args[0])?, eval_num(&args[1])?),
                ("mod", 2) => int_modulus(eval_num(&args[0])?, eval_num(&args[1])?),
                ("rem", 2) => int_remainder(eval_num(&args[0])?, eval_num(&args[1])?),
                (name, arity) => Err(ArithError::NotEvaluable(format!("{}/{}", name, arity))),
            }
        }
    }
}

enum Op {
    Add,
    Sub,
    Mul,
}

fn negate(n: Num) -> Num {
    match n {
        Num::Int(i) => Num::Int(-i),
        Num::Rat(r) => Num::Rat(-r),
        Num::Float(f) => Num::Float(-f),
    }
}

fn binary(a: Num, b: Num, op: Op) -> Result<Num, ArithError> {
    // integers first, rationals second, floats as the lossy last resort
    if let (Num::Int(x), Num::Int(y)) = (&a, &b) {
        let r = match op {
            Op::Add => x + y,
            Op::Sub => x - y,
            Op::Mul => x * y,
        };
        return Ok(Num::Int(r));
    }
    if !a.is_float() && !b.is_float() {
        let x = a.to_rational();
        let y = b.to_rational();
        let r = match op {
            Op::Add => x + y,
            Op::Sub => x - y,
            Op::Mul => x * y,
        };
        return Ok(Num::Rat(r));
    }
    let x = a.to_f64();
    let y = b.to_f64();
    let r = match op {
        Op::Add => x + y,
        Op::Sub => x - y,
        Op::Mul => x * y,
    };
    Ok(Num::Float(r))
}

fn divide(a: Num, b: Num) -> Result<Num, ArithError> {
    if a.is_float() || b.is_float() {
        // IEEE semantics, division by zero gives an infinity
        return Ok(Num::Float(a.to_f64() / b.to_f64()));
    }
    let y = b.to_rational();
    if y.is_zero() {
        return Err(ArithError::ZeroDivisor);
    }
    Ok(Num::Rat(a.to_rational() / y))
}

/// `mod/2`: integers only, result takes the sign of the divisor.
fn int_modulus(a: Num, b: Num) -> Result<Num, ArithError> {
    let (x, y) = int_pair(a, b)?;
    if y.is_zero() {
        return Err(ArithError::ZeroDivisor);
    }
    Ok(Num::Int(x.mod_floor(&y)))
}

/// `rem/2`: integers only, result takes the sign of the dividend.
fn int_remainder(a: Num, b: Num) -> Result<Num, ArithError> {
    let (x, y) = int_pair(a, b)?;
    if y.is_zero() {
        return Err(ArithError::ZeroDivisor);
    }
    Ok(Num::Int(x % y))
}

fn int_pair(a: Num, b: Num) -> Result<(BigInt, BigInt), ArithError> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Ok((x, y)),
        _ => Err(ArithError::TypeMismatch("integer")),
    }
}
