//! Prolog term representation.
//!
//! A term is a single tagged value: atom, unbounded integer, float,
//! rational, variable or compound. Terms are immutable; compounds are
//! reference counted so cloning a term never deep-copies structure.
//! Variables are identified by a process-wide unique id, the display name
//! is cosmetic.

use crate::symbol::{symbols, NameId};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, OnceLock};

/// Argument vector of a compound term.
/// Inline capacity of two covers the dominant `./2`, `,/2` and `:-/2` cases.
pub type Args = SmallVec<[Term; 2]>;

/// Process-wide counter for variable ids.
static NEXT_VAR_ID: AtomicU64 = AtomicU64::new(1);

/// An atom: a name without arguments.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Atom(NameId);

impl Atom {
    pub fn new(name: &str) -> Self {
        Atom(symbols().intern(name))
    }

    /// The atom's text.
    pub fn name(self) -> &'static str {
        symbols().resolve(self.0)
    }

    pub(crate) fn key(self) -> NameId {
        self.0
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({})", self.name())
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote_atom_name(self.name()))
    }
}

/// A logic variable. Identity is the id alone; the name is display-only.
#[derive(Clone, Copy)]
pub struct Var {
    name: NameId,
    id: u64,
}

impl Var {
    /// Create a fresh variable with the given display name.
    pub fn named(name: &str) -> Self {
        Var {
            name: symbols().intern(name),
            id: NEXT_VAR_ID.fetch_add(1, AtomicOrdering::Relaxed),
        }
    }

    /// Create a fresh anonymous variable.
    pub fn anonymous() -> Self {
        Self::named("_")
    }

    /// The display name this variable was created with.
    pub fn name(&self) -> &'static str {
        symbols().resolve(self.name)
    }

    pub(crate) fn name_key(&self) -> NameId {
        self.name
    }

    /// The unique id of this variable.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// A fresh variable with the same display name but a new id.
    pub fn with_new_id(&self) -> Var {
        Var {
            name: self.name,
            id: NEXT_VAR_ID.fetch_add(1, AtomicOrdering::Relaxed),
        }
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Var {}

impl Hash for Var {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Var({}#{})", self.name(), self.id)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        if name == "_" {
            write!(f, "_G{}", self.id)
        } else {
            f.write_str(name)
        }
    }
}

/// A compound term: a functor applied to one or more arguments.
///
/// The two cache slots hold this term's unification fingerprints, filled
/// lazily by the hash module. They are excluded from equality and hashing.
#[derive(Debug)]
pub struct Compound {
    name: NameId,
    args: Args,
    pub(crate) query_hash: OnceLock<u64>,
    pub(crate) prepared_hash: OnceLock<u64>,
}

impl Compound {
    pub fn name(&self) -> &'static str {
        symbols().resolve(self.name)
    }

    pub(crate) fn name_key(&self) -> NameId {
        self.name
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn args(&self) -> &[Term] {
        &self.args
    }
}

impl PartialEq for Compound {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.args == other.args
    }
}

impl Eq for Compound {}

impl Hash for Compound {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.args.hash(state);
    }
}

/// A Prolog term.
#[derive(Clone, Debug)]
pub enum Term {
    /// An atom; arity 0.
    Atom(Atom),
    /// An unbounded signed integer.
    Int(BigInt),
    /// An IEEE-754 double.
    Float(f64),
    /// An exact ratio of unbounded integers.
    Rational(BigRational),
    /// A variable, identified by its unique id.
    Var(Var),
    /// A compound term with one or more arguments.
    Compound(Arc<Compound>),
}

impl Term {
    pub fn atom(name: &str) -> Term {
        Term::Atom(Atom::new(name))
    }

    pub fn int(value: impl Into<BigInt>) -> Term {
        Term::Int(value.into())
    }

    pub fn float(value: f64) -> Term {
        Term::Float(value)
    }

    pub fn rational(value: BigRational) -> Term {
        Term::Rational(value)
    }

    /// A fresh variable with the given display name.
    pub fn var(name: &str) -> Term {
        Term::Var(Var::named(name))
    }

    /// Build a compound term. An empty argument list yields an atom.
    pub fn compound<I>(name: &str, args: I) -> Term
    where
        I: IntoIterator<Item = Term>,
    {
        let args: Args = args.into_iter().collect();
        if args.is_empty() {
            Term::atom(name)
        } else {
            Term::raw_compound(symbols().intern(name), args)
        }
    }

    pub(crate) fn raw_compound(name: NameId, args: Args) -> Term {
        debug_assert!(!args.is_empty());
        Term::Compound(Arc::new(Compound {
            name,
            args,
            query_hash: OnceLock::new(),
            prepared_hash: OnceLock::new(),
        }))
    }

    /// The empty list atom `[]`.
    pub fn nil() -> Term {
        Term::atom("[]")
    }

    /// Build a proper list from the items.
    pub fn list<I>(items: I) -> Term
    where
        I: IntoIterator<Item = Term>,
        I::IntoIter: DoubleEndedIterator,
    {
        Self::partial_list(items, Term::nil())
    }

    /// Build a list with an explicit tail.
    pub fn partial_list<I>(items: I, tail: Term) -> Term
    where
        I: IntoIterator<Item = Term>,
        I::IntoIter: DoubleEndedIterator,
    {
        let mut list = tail;
        for item in items.into_iter().rev() {
            list = Term::compound(".", [item, list]);
        }
        list
    }

    /// Build a code list: the character codes of the text, as a proper list.
    pub fn code_list(text: &str) -> Term {
        Term::list(text.chars().map(|c| Term::int(c as u32)))
    }

    /// Destructure a proper list into its items.
    /// Returns None for partial lists and non-lists.
    pub fn list_items(&self) -> Option<Vec<Term>> {
        let mut items = Vec::new();
        let mut cursor = self.clone();
        loop {
            match &cursor {
                Term::Atom(a) if a.name() == "[]" => return Some(items),
                Term::Compound(c) if c.name() == "." && c.arity() == 2 => {
                    items.push(c.args()[0].clone());
                    let rest = c.args()[1].clone();
                    cursor = rest;
                }
                _ => return None,
            }
        }
    }

    /// Functor name of an atom or compound.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Term::Atom(a) => Some(a.name()),
            Term::Compound(c) => Some(c.name()),
            _ => None,
        }
    }

    /// Number of arguments. Atoms, numbers and variables have arity 0.
    pub fn arity(&self) -> usize {
        match self {
            Term::Compound(c) => c.arity(),
            _ => 0,
        }
    }

    /// Argument slice; empty for everything but compounds.
    pub fn args(&self) -> &[Term] {
        match self {
            Term::Compound(c) => c.args(),
            _ => &[],
        }
    }

    /// The predicate indicator of an atom or compound.
    pub fn indicator(&self) -> Option<Indicator> {
        match self {
            Term::Atom(a) => Some(Indicator {
                name: a.key(),
                arity: 0,
            }),
            Term::Compound(c) => Some(Indicator {
                name: c.name_key(),
                arity: c.arity() as u32,
            }),
            _ => None,
        }
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Term::Atom(_))
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Term::Compound(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Term::Int(_) | Term::Float(_) | Term::Rational(_))
    }

    /// Callable terms are the ones that can appear as goals.
    pub fn is_callable(&self) -> bool {
        matches!(self, Term::Atom(_) | Term::Compound(_))
    }

    /// True for `Head :- Body` terms.
    pub fn is_clause(&self) -> bool {
        matches!(self, Term::Compound(c) if c.name() == ":-" && c.arity() == 2)
    }

    /// True for `:- Body` terms.
    pub fn is_directive(&self) -> bool {
        matches!(self, Term::Compound(c) if c.name() == ":-" && c.arity() == 1)
    }

    /// Head and optional body of a clause.
    /// Facts are their own head and have no body.
    pub fn clause_parts(&self) -> (&Term, Option<&Term>) {
        match self {
            Term::Compound(c) if c.name() == ":-" && c.arity() == 2 => {
                (&c.args()[0], Some(&c.args()[1]))
            }
            _ => (self, None),
        }
    }

    /// Check this term against a functor name and arity.
    pub fn has_functor(&self, name: &str, arity: usize) -> bool {
        self.arity() == arity && self.name() == Some(name)
    }

    /// True iff no variables are reachable from this term.
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Var(_) => false,
            Term::Compound(c) => c.args().iter().all(Term::is_ground),
            _ => true,
        }
    }

    /// All variables reachable from this term, in first-occurrence order,
    /// deduplicated by id.
    pub fn variables(&self) -> Vec<Var> {
        let mut seen = FxHashMap::default();
        let mut out = Vec::new();
        self.collect_variables(&mut seen, &mut out);
        out
    }

    fn collect_variables(&self, seen: &mut FxHashMap<u64, ()>, out: &mut Vec<Var>) {
        match self {
            Term::Var(v) => {
                if seen.insert(v.id, ()).is_none() {
                    out.push(*v);
                }
            }
            Term::Compound(c) => {
                for arg in c.args() {
                    arg.collect_variables(seen, out);
                }
            }
            _ => {}
        }
    }

    /// Alpha-rename: replace every variable with a fresh one, consistently.
    /// Ground subtrees are shared with the original, keeping their caches.
    pub fn rename_variables(&self) -> Term {
        let mut map = FxHashMap::default();
        self.rename_with(&mut map).unwrap_or_else(|| self.clone())
    }

    fn rename_with(&self, map: &mut FxHashMap<u64, Var>) -> Option<Term> {
        match self {
            Term::Var(v) => {
                let fresh = *map.entry(v.id).or_insert_with(|| v.with_new_id());
                Some(Term::Var(fresh))
            }
            Term::Compound(c) => {
                let mut new_args: Option<Args> = None;
                for (i, arg) in c.args().iter().enumerate() {
                    if let Some(renamed) = arg.rename_with(map) {
                        new_args.get_or_insert_with(|| c.args.clone())[i] = renamed;
                    }
                }
                new_args.map(|args| Term::raw_compound(c.name, args))
            }
            _ => None,
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Term::Atom(a), Term::Atom(b)) => a == b,
            (Term::Int(a), Term::Int(b)) => a == b,
            (Term::Float(a), Term::Float(b)) => a.to_bits() == b.to_bits(),
            (Term::Rational(a), Term::Rational(b)) => a == b,
            (Term::Var(a), Term::Var(b)) => a == b,
            (Term::Compound(a), Term::Compound(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Term::Atom(a) => {
                0u8.hash(state);
                a.hash(state);
            }
            Term::Int(i) => {
                1u8.hash(state);
                i.hash(state);
            }
            Term::Float(f) => {
                2u8.hash(state);
                f.to_bits().hash(state);
            }
            Term::Rational(r) => {
                3u8.hash(state);
                r.hash(state);
            }
            Term::Var(v) => {
                4u8.hash(state);
                v.hash(state);
            }
            Term::Compound(c) => {
                5u8.hash(state);
                c.hash(state);
            }
        }
    }
}

/// The standard order of terms: variable < number < atom < compound.
impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Term::Var(a), Term::Var(b)) => a.id.cmp(&b.id),
            (a, b) if a.is_number() && b.is_number() => number_cmp(a, b),
            (Term::Atom(a), Term::Atom(b)) => a.name().cmp(b.name()),
            (Term::Compound(a), Term::Compound(b)) => a
                .arity()
                .cmp(&b.arity())
                .then_with(|| a.name().cmp(b.name()))
                .then_with(|| a.args().cmp(b.args())),
            (a, b) => order_class(a).cmp(&order_class(b)),
        }
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn order_class(t: &Term) -> u8 {
    match t {
        Term::Var(_) => 0,
        Term::Int(_) | Term::Float(_) | Term::Rational(_) => 1,
        Term::Atom(_) => 2,
        Term::Compound(_) => 3,
    }
}

/// Type rank used to break numeric value ties: float < rational < integer.
fn number_rank(t: &Term) -> u8 {
    match t {
        Term::Float(_) => 0,
        Term::Rational(_) => 1,
        Term::Int(_) => 2,
        _ => unreachable!("not a number"),
    }
}

fn number_cmp(a: &Term, b: &Term) -> Ordering {
    let by_value = match (a, b) {
        (Term::Int(x), Term::Int(y)) => x.cmp(y),
        (Term::Rational(x), Term::Rational(y)) => x.cmp(y),
        (Term::Int(x), Term::Rational(y)) => BigRational::from_integer(x.clone()).cmp(y),
        (Term::Rational(x), Term::Int(y)) => x.cmp(&BigRational::from_integer(y.clone())),
        _ => approx_f64(a).total_cmp(&approx_f64(b)),
    };
    by_value.then_with(|| number_rank(a).cmp(&number_rank(b)))
}

fn approx_f64(t: &Term) -> f64 {
    match t {
        Term::Int(i) => i
            .to_f64()
            .unwrap_or(if i.is_negative() { f64::NEG_INFINITY } else { f64::INFINITY }),
        Term::Float(f) => *f,
        Term::Rational(r) => r.to_f64().unwrap_or_else(|| {
            if r.is_negative() {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            }
        }),
        _ => unreachable!("not a number"),
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(a) => write!(f, "{}", a),
            Term::Int(i) => write!(f, "{}", i),
            Term::Float(x) => f.write_str(&fmt_float(*x)),
            Term::Rational(r) => {
                if r.is_integer() {
                    write!(f, "{}", r.numer())
                } else {
                    f.write_str(&fmt_float(r.to_f64().unwrap_or(f64::NAN)))
                }
            }
            Term::Var(v) => write!(f, "{}", v),
            Term::Compound(c) => {
                if c.name() == "." && c.arity() == 2 {
                    return fmt_list(self, f);
                }
                write!(f, "{}(", quote_atom_name(c.name()))?;
                for (i, arg) in c.args().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

fn fmt_list(t: &Term, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("[")?;
    let mut cursor = t.clone();
    let mut first = true;
    loop {
        match cursor {
            Term::Compound(ref c) if c.name() == "." && c.arity() == 2 => {
                if !first {
                    f.write_str(", ")?;
                }
                first = false;
                write!(f, "{}", c.args()[0])?;
                let rest = c.args()[1].clone();
                cursor = rest;
            }
            Term::Atom(a) if a.name() == "[]" => break,
            ref tail => {
                write!(f, "|{}", tail)?;
                break;
            }
        }
    }
    f.write_str("]")
}

/// Render a float so integral values keep a decimal point.
pub(crate) fn fmt_float(x: f64) -> String {
    if x.is_finite() && x == x.trunc() && x.abs() < 1e15 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

/// Quote an atom name for display when its spelling requires it.
pub(crate) fn quote_atom_name(name: &str) -> String {
    if name == "." {
        return format!("'{}'", name);
    }
    if name == "[]" || name == "{}" || name == "!" || name == ";" {
        return name.to_string();
    }
    if !name.is_empty() && name.chars().all(is_graphic_char) {
        return name.to_string();
    }
    let plain = name
        .chars()
        .next()
        .map(|c| c.is_ascii_lowercase())
        .unwrap_or(false)
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

/// The graphic characters of §6.5.1, the spelling of symbolic atoms.
pub(crate) fn is_graphic_char(c: char) -> bool {
    matches!(
        c,
        '#' | '$' | '&' | '*' | '+' | '-' | '.' | '/' | ':' | '<' | '=' | '>' | '?' | '@' | '^'
            | '~' | '\\'
    )
}

/// A predicate indicator: functor name plus arity.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Indicator {
    name: NameId,
    arity: u32,
}

impl Indicator {
    pub fn new(name: &str, arity: u32) -> Self {
        Indicator {
            name: symbols().intern(name),
            arity,
        }
    }

    /// Parse a `name/arity` string. The arity is the digits after the last
    /// slash, so names containing slashes (like `//2`) parse correctly.
    pub fn parse(text: &str) -> Option<Indicator> {
        let (name, arity) = text.rsplit_once('/')?;
        if name.is_empty() {
            return None;
        }
        let arity: u32 = arity.parse().ok()?;
        Some(Indicator::new(name, arity))
    }

    pub fn name(&self) -> &'static str {
        symbols().resolve(self.name)
    }

    pub(crate) fn name_key(&self) -> NameId {
        self.name
    }

    pub fn arity(&self) -> u32 {
        self.arity
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name(), self.arity)
    }
}

impl fmt::Debug for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Indicator({}/{})", self.name(), self.arity)
    }
}

#[cfg(test)]
#[path = "tests/term.rs"]
mod tests;
