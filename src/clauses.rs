//! The clause database.
//!
//! Clauses are grouped by the predicate indicator of their head and kept
//! in assertion order. The database is a persistent value: `asserta` and
//! `assertz` return a new database sharing structure with the old one, so
//! "modifying" a loaded program never disturbs machines already running
//! against it.

use crate::hash::might_unify;
use crate::term::{Indicator, Term};
use im::{HashMap, Vector};
use std::fmt;

/// Errors raised by database operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    /// A goal was looked up whose indicator has no clauses at all.
    UndefinedPredicate(Indicator),
    /// An assertion was attempted for a term that cannot head a clause.
    NotCallable(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UndefinedPredicate(pi) => {
                write!(f, "undefined predicate: {}", pi)
            }
            DatabaseError::NotCallable(t) => write!(f, "not a callable term: {}", t),
        }
    }
}

impl std::error::Error for DatabaseError {}

/// An ordered clause sequence with cheap insertion at both ends.
#[derive(Clone, Default, Debug)]
pub struct ClauseSeq {
    terms: Vector<Term>,
}

impl ClauseSeq {
    fn new() -> Self {
        Self::default()
    }

    /// Add a clause at the front (asserta).
    fn cons(&self, term: Term) -> ClauseSeq {
        let mut terms = self.terms.clone();
        terms.push_front(term);
        ClauseSeq { terms }
    }

    /// Add a clause at the back (assertz).
    fn snoc(&self, term: Term) -> ClauseSeq {
        let mut terms = self.terms.clone();
        terms.push_back(term);
        ClauseSeq { terms }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }
}

/// An immutable Prolog database mapping indicators to clause sequences.
#[derive(Clone, Default, Debug)]
pub struct Database {
    predicates: HashMap<Indicator, ClauseSeq>,
    clause_count: usize,
}

impl Database {
    /// A new, empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored clauses.
    pub fn clause_count(&self) -> usize {
        self.clause_count
    }

    /// Add a clause at the front of its predicate's sequence.
    pub fn asserta(&self, term: Term) -> Result<Database, DatabaseError> {
        self.insert(term, ClauseSeq::cons)
    }

    /// Add a clause at the back of its predicate's sequence.
    pub fn assertz(&self, term: Term) -> Result<Database, DatabaseError> {
        self.insert(term, ClauseSeq::snoc)
    }

    fn insert(
        &self,
        term: Term,
        push: fn(&ClauseSeq, Term) -> ClauseSeq,
    ) -> Result<Database, DatabaseError> {
        let indicator = classify(&term)?;
        let seq = self
            .predicates
            .get(&indicator)
            .cloned()
            .unwrap_or_else(ClauseSeq::new);
        Ok(Database {
            predicates: self.predicates.update(indicator, push(&seq, term)),
            clause_count: self.clause_count + 1,
        })
    }

    /// Clauses that might resolve against the goal, in assertion order.
    ///
    /// For atom goals the whole sequence is returned. For compound goals
    /// candidates are pruned by the unification-hash rule; the survivors
    /// may still fail to unify, but no unifiable clause is ever dropped.
    pub fn candidates(&self, goal: &Term) -> Result<Vec<Term>, DatabaseError> {
        let indicator = goal
            .indicator()
            .ok_or_else(|| DatabaseError::NotCallable(goal.to_string()))?;
        let seq = self
            .predicates
            .get(&indicator)
            .ok_or(DatabaseError::UndefinedPredicate(indicator))?;

        if !goal.is_compound() {
            return Ok(seq.iter().cloned().collect());
        }
        Ok(seq
            .iter()
            .filter(|clause| {
                let (head, _) = clause.clause_parts();
                might_unify(goal, head)
            })
            .cloned()
            .collect())
    }

    /// The clause sequence stored under an indicator, if any.
    pub fn clauses(&self, indicator: &Indicator) -> Option<&ClauseSeq> {
        self.predicates.get(indicator)
    }
}

/// The indicator a term is filed under: for `Head :- Body` the head's
/// indicator, otherwise the term's own.
fn classify(term: &Term) -> Result<Indicator, DatabaseError> {
    let (head, _) = term.clause_parts();
    head.indicator()
        .ok_or_else(|| DatabaseError::NotCallable(head.to_string()))
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut indicators: Vec<_> = self.predicates.keys().collect();
        indicators.sort_by_key(|pi| (pi.name(), pi.arity()));
        for pi in indicators {
            for clause in self.predicates[pi].iter() {
                writeln!(f, "{}.", clause)?;
            }
        }
        Ok(())
    }
}
