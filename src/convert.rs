//! Conversions between host values and terms.
//!
//! Embedders marshal Rust values into goals and foreign-predicate
//! arguments with `From`, and read answers back out with `TryFrom`.

use crate::term::Term;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::fmt;

/// A term did not have the shape the conversion expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    pub expected: &'static str,
    pub found: String,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, found {}", self.expected, self.found)
    }
}

impl std::error::Error for ConversionError {}

fn mismatch(expected: &'static str, found: &Term) -> ConversionError {
    ConversionError {
        expected,
        found: found.to_string(),
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::int(value)
    }
}

impl From<i32> for Term {
    fn from(value: i32) -> Self {
        Term::int(value)
    }
}

impl From<BigInt> for Term {
    fn from(value: BigInt) -> Self {
        Term::Int(value)
    }
}

impl From<f64> for Term {
    fn from(value: f64) -> Self {
        Term::Float(value)
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Term::atom(value)
    }
}

impl From<bool> for Term {
    fn from(value: bool) -> Self {
        Term::atom(if value { "true" } else { "false" })
    }
}

impl<T: Into<Term>> From<Vec<T>> for Term {
    fn from(items: Vec<T>) -> Self {
        Term::list(items.into_iter().map(Into::into))
    }
}

impl TryFrom<&Term> for i64 {
    type Error = ConversionError;

    fn try_from(term: &Term) -> Result<Self, Self::Error> {
        match term {
            Term::Int(i) => i.to_i64().ok_or_else(|| mismatch("an i64-sized integer", term)),
            _ => Err(mismatch("an integer", term)),
        }
    }
}

impl TryFrom<&Term> for f64 {
    type Error = ConversionError;

    fn try_from(term: &Term) -> Result<Self, Self::Error> {
        match term {
            Term::Float(f) => Ok(*f),
            _ => Err(mismatch("a float", term)),
        }
    }
}

impl TryFrom<&Term> for String {
    type Error = ConversionError;

    fn try_from(term: &Term) -> Result<Self, Self::Error> {
        match term {
            Term::Atom(a) => Ok(a.name().to_string()),
            _ => Err(mismatch("an atom", term)),
        }
    }
}

impl TryFrom<&Term> for bool {
    type Error = ConversionError;

    fn try_from(term: &Term) -> Result<Self, Self::Error> {
        match term {
            Term::Atom(a) if a.name() == "true" => Ok(true),
            Term::Atom(a) if a.name() == "false" => Ok(false),
            _ => Err(mismatch("true or false", term)),
        }
    }
}

impl TryFrom<&Term> for Vec<Term> {
    type Error = ConversionError;

    fn try_from(term: &Term) -> Result<Self, Self::Error> {
        term.list_items()
            .ok_or_else(|| mismatch("a proper list", term))
    }
}
