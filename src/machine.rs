//! The resolution machine.
//!
//! A machine is an immutable value: database, bindings, a conjunction
//! stack of goals still to prove, a disjunction stack of choice points
//! and barriers, and the foreign-predicate tables. Every operation
//! returns a new machine sharing structure with the old one, so choice
//! points snapshot machines for free and distinct machines can be driven
//! on distinct threads without synchronization.
//!
//! `step` advances a proof by one reduction. Drivers are thin loops over
//! it: `solutions` is the lazy iterator, `prove_all` collects eagerly,
//! `can_prove` stops at the first answer.

use crate::arith::ArithError;
use crate::bindings::Bindings;
use crate::builtins;
use crate::choice_point::{ChoicePoint, Follow};
use crate::clauses::{Database, DatabaseError};
use crate::lex::ParseError;
use crate::parser;
use crate::prelude::PRELUDE;
use crate::symbol::NameId;
use crate::term::{Indicator, Term, Var};
use crate::unify::unify;
use im::{HashMap, Vector};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// Arities dispatched through the per-arity shortcut tables.
const SMALL_THRESHOLD: usize = 4;

/// Errors surfaced to callers of the machine.
///
/// The engine's internal control-flow sentinels (empty stacks, machine
/// exhaustion, unification failure) never appear here; they are consumed
/// inside `step`.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Database(DatabaseError),
    Arith(ArithError),
    Parse(ParseError),
    /// A goal or argument had the wrong type for a built-in.
    Type(String),
    /// A built-in needed an argument that is still unbound.
    Instantiation(String),
    /// A non-callable term was used as a goal.
    NotCallable(Term),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Database(e) => write!(f, "{}", e),
            Error::Arith(e) => write!(f, "{}", e),
            Error::Parse(e) => write!(f, "{}", e),
            Error::Type(msg) => write!(f, "type error: {}", msg),
            Error::Instantiation(what) => {
                write!(f, "arguments are not sufficiently instantiated: {}", what)
            }
            Error::NotCallable(t) => write!(f, "goal is not callable: {}", t),
        }
    }
}

impl std::error::Error for Error {}

impl From<DatabaseError> for Error {
    fn from(e: DatabaseError) -> Self {
        Error::Database(e)
    }
}

impl From<ArithError> for Error {
    fn from(e: ArithError) -> Self {
        Error::Arith(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

/// What a foreign predicate tells the stepper to do.
///
/// This sum is closed on purpose: the stepper matches it exhaustively.
/// The remaining misuse case, an odd-length `Unify` payload, is a
/// programmer error and panics.
pub enum ForeignReturn {
    /// Succeed deterministically.
    True,
    /// Fail; the stepper backtracks.
    Fail,
    /// Continue on a machine the predicate reshaped itself.
    Machine(Machine),
    /// Unify each consecutive pair; all must succeed.
    Unify(Vec<Term>),
}

/// Errors flow out of foreign predicates through an ordinary `Result`.
pub type ForeignResult = Result<ForeignReturn, Error>;

/// A host-language predicate. Receives the machine and the goal's
/// argument-resolved arguments.
pub type ForeignPredicate = Arc<dyn Fn(&Machine, &[Term]) -> ForeignResult + Send + Sync>;

/// Result of one machine step.
pub enum Step {
    /// An answer was found; continue on the machine for more.
    Emit(Machine, Bindings),
    /// One reduction happened, no answer yet.
    Continue(Machine),
    /// The disjunction stack is exhausted; the query is over.
    Exhausted,
}

/// An immutable Prolog machine.
#[derive(Clone)]
pub struct Machine {
    db: Database,
    env: Bindings,
    conjs: Vector<Term>,
    disjs: Vector<ChoicePoint>,
    small_foreign: [HashMap<NameId, ForeignPredicate>; SMALL_THRESHOLD],
    large_foreign: HashMap<Indicator, ForeignPredicate>,
    help: HashMap<String, String>,
}

impl Machine {
    /// A machine with the standard library loaded. This is the usual way
    /// to obtain one.
    pub fn new() -> Machine {
        Machine::blank()
            .consult(PRELUDE)
            .expect("the prelude must load")
            .register_foreign(builtins::standard_predicates())
    }

    /// A machine without the standard library.
    pub fn blank() -> Machine {
        let m = Machine {
            db: Database::new(),
            env: Bindings::new(),
            conjs: Vector::new(),
            disjs: Vector::new(),
            small_foreign: std::array::from_fn(|_| HashMap::new()),
            large_foreign: HashMap::new(),
            help: HashMap::new(),
        };
        m.demand_cut_barrier()
    }

    /// Load clauses from Prolog source text, returning the extended
    /// machine. Directives are ignored.
    pub fn consult(&self, src: &str) -> Result<Machine, Error> {
        let terms = parser::term_all(src)?;
        let mut m = self.clone();
        for term in terms {
            if term.is_directive() {
                continue;
            }
            m.db = m.db.assertz(term)?;
        }
        Ok(m)
    }

    /// Register foreign predicates keyed by `"name/arity"` indicators.
    /// Re-registering an indicator replaces its implementation.
    /// Panics on a malformed indicator; that is a programmer error.
    pub fn register_foreign<I>(&self, predicates: I) -> Machine
    where
        I: IntoIterator<Item = (&'static str, ForeignPredicate)>,
    {
        let mut m = self.clone();
        for (text, f) in predicates {
            let pi = Indicator::parse(text)
                .unwrap_or_else(|| panic!("malformed predicate indicator: {:?}", text));
            let arity = pi.arity() as usize;
            if arity < SMALL_THRESHOLD {
                m.small_foreign[arity] = m.small_foreign[arity].update(pi.name_key(), f);
            } else {
                m.large_foreign = m.large_foreign.update(pi, f);
            }
        }
        m
    }

    /// Merge help text entries, keyed by indicator.
    pub fn register_help<I>(&self, entries: I) -> Machine
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut m = self.clone();
        for (key, text) in entries {
            m.help = m.help.update(key, text);
        }
        m
    }

    /// Help text registered for an indicator.
    pub fn help_text(&self, indicator: &str) -> Option<&String> {
        self.help.get(indicator)
    }

    /// All registered foreign predicate indicators.
    pub fn foreign_indicators(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (arity, table) in self.small_foreign.iter().enumerate() {
            for name in table.keys() {
                out.push(format!("{}/{}", crate::symbol::symbols().resolve(*name), arity));
            }
        }
        for pi in self.large_foreign.keys() {
            out.push(pi.to_string());
        }
        out.sort();
        out
    }

    /// The machine's current bindings.
    pub fn bindings(&self) -> &Bindings {
        &self.env
    }

    /// A machine like this one with substituted bindings.
    pub fn set_bindings(&self, env: Bindings) -> Machine {
        let mut m = self.clone();
        m.env = env;
        m
    }

    /// The clause database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// A machine like this one with an extended database.
    pub fn set_database(&self, db: Database) -> Machine {
        let mut m = self.clone();
        m.db = db;
        m
    }

    /// Push a goal onto the conjunction stack.
    ///
    /// Occurrences of `!/0` reachable through `,`, `;` and the then-branch
    /// of `->` are rewritten to `$cut_to(B)` where B is the most recent
    /// barrier right now. This is what scopes each cut to the barrier
    /// enclosing it at push time.
    pub fn push_conj(&self, goal: Term) -> Machine {
        let goal = match self.most_recent_cut_barrier() {
            Some(id) => resolve_cuts(id, &goal),
            None => goal,
        };
        let mut m = self.clone();
        m.conjs.push_front(goal);
        m
    }

    /// Remove and return the top goal, or None when a complete answer has
    /// been reached.
    pub fn pop_conj(&self) -> Option<(Term, Machine)> {
        let mut m = self.clone();
        m.conjs.pop_front().map(|goal| (goal, m))
    }

    /// Replace the conjunction stack with an empty one.
    pub fn clear_conjs(&self) -> Machine {
        let mut m = self.clone();
        m.conjs = Vector::new();
        m
    }

    /// Replace the disjunction stack with an empty one.
    pub fn clear_disjs(&self) -> Machine {
        let mut m = self.clone();
        m.disjs = Vector::new();
        m
    }

    /// Push a choice point.
    pub fn push_disj(&self, cp: ChoicePoint) -> Machine {
        let mut m = self.clone();
        m.disjs.push_front(cp);
        m
    }

    /// Remove and return the top choice point, or None when the query is
    /// exhausted.
    pub fn pop_disj(&self) -> Option<(ChoicePoint, Machine)> {
        let mut m = self.clone();
        m.disjs.pop_front().map(|cp| (cp, m))
    }

    /// Ensure the top of the disjunction stack is a cut barrier, pushing
    /// a fresh one if needed.
    pub fn demand_cut_barrier(&self) -> Machine {
        if let Some(top) = self.disjs.front() {
            if top.barrier_id().is_some() {
                return self.clone();
            }
        }
        self.push_disj(ChoicePoint::barrier())
    }

    /// The id of the most recent barrier on the disjunction stack.
    pub fn most_recent_cut_barrier(&self) -> Option<u64> {
        self.disjs.iter().find_map(ChoicePoint::barrier_id)
    }

    /// Drop every choice point stacked above the barrier with this id.
    /// The barrier itself stays. Panics if the barrier is gone; cuts are
    /// compiled against live barriers, so that is a machine bug.
    pub fn cut_to(&self, id: u64) -> Machine {
        let mut disjs = self.disjs.clone();
        loop {
            match disjs.front() {
                None => panic!("no cut barrier with id {}", id),
                Some(top) if top.barrier_id() == Some(id) => break,
                Some(_) => {
                    disjs.pop_front();
                }
            }
        }
        let mut m = self.clone();
        m.disjs = disjs;
        m
    }

    /// Advance the proof by one reduction.
    pub fn step(&self) -> Result<Step, Error> {
        let mut m = self.clone();

        // find a goal other than true/0 to prove
        let goal = loop {
            match m.pop_conj() {
                None => {
                    // nothing left to prove: the bindings are an answer.
                    // pushing fail/0 makes the next step backtrack.
                    let answer = m.env.clone();
                    let next = m.push_conj(Term::atom("fail"));
                    return Ok(Step::Emit(next, answer));
                }
                Some((goal, next)) => {
                    m = next;
                    if goal.has_functor("true", 0) {
                        continue;
                    }
                    break goal;
                }
            }
        };

        if !goal.is_callable() {
            return Err(Error::NotCallable(goal));
        }

        if let Some(f) = m.lookup_foreign(&goal) {
            #[cfg(feature = "tracing")]
            trace!(goal = %goal, "foreign_dispatch");
            let args = m.resolve_args(&goal);
            match f(&m, &args)? {
                ForeignReturn::True => return Ok(Step::Continue(m)),
                ForeignReturn::Machine(next) => return Ok(Step::Continue(next)),
                ForeignReturn::Unify(pairs) => {
                    if pairs.len() % 2 != 0 {
                        panic!("odd-length argument list in ForeignReturn::Unify");
                    }
                    let mut env = m.env.clone();
                    let mut unified = true;
                    for pair in pairs.chunks(2) {
                        match unify(&env, &pair[0], &pair[1]) {
                            Ok(extended) => env = extended,
                            Err(_) => {
                                unified = false;
                                break;
                            }
                        }
                    }
                    if unified {
                        return Ok(Step::Continue(m.set_bindings(env)));
                    }
                    // fall through to backtracking
                }
                ForeignReturn::Fail => {}
            }
        } else {
            // user-defined predicate: push its candidate clauses behind a
            // fresh barrier, first clause on top
            let goal = m.env.resolve_term(&goal);
            #[cfg(feature = "tracing")]
            trace!(goal = %goal, "user_dispatch");
            let clauses = m.db.candidates(&goal)?;
            m = m.demand_cut_barrier();
            for clause in clauses.into_iter().rev() {
                let cp = ChoicePoint::head_body(m.clone(), goal.clone(), clause);
                m = m.push_disj(cp);
            }
        }

        // backtrack: pop choice points until one can be followed
        loop {
            match m.pop_disj() {
                None => return Ok(Step::Exhausted),
                Some((cp, next)) => {
                    m = next;
                    match cp.follow() {
                        Follow::Machine(followed) => return Ok(Step::Continue(followed)),
                        Follow::CantUnify | Follow::Barrier => continue,
                    }
                }
            }
        }
    }

    /// Lazy answers for a goal term. Answers carry the goal's variable
    /// names for reporting.
    pub fn solutions(&self, goal: Term) -> Solutions {
        let vars = goal.variables();
        Solutions {
            machine: Some(self.push_conj(goal)),
            vars,
        }
    }

    /// Prove a goal given as Prolog text, collecting every answer.
    pub fn prove_all(&self, goal: &str) -> Result<Vec<Bindings>, Error> {
        self.prove_all_term(parser::term(goal)?)
    }

    /// Collect every answer for a goal term.
    pub fn prove_all_term(&self, goal: Term) -> Result<Vec<Bindings>, Error> {
        self.solutions(goal).collect()
    }

    /// True if the goal given as Prolog text has at least one answer.
    /// Abandons the remaining answers, like once/1.
    pub fn can_prove(&self, goal: &str) -> Result<bool, Error> {
        self.can_prove_term(parser::term(goal)?)
    }

    /// True if the goal term has at least one answer.
    pub fn can_prove_term(&self, goal: Term) -> Result<bool, Error> {
        match self.solutions(goal).next() {
            None => Ok(false),
            Some(Ok(_)) => Ok(true),
            Some(Err(e)) => Err(e),
        }
    }

    fn lookup_foreign(&self, goal: &Term) -> Option<ForeignPredicate> {
        let name = match goal {
            Term::Atom(a) => a.key(),
            Term::Compound(c) => c.name_key(),
            _ => return None,
        };
        let arity = goal.arity();
        if arity < SMALL_THRESHOLD {
            self.small_foreign[arity].get(&name).cloned()
        } else {
            self.large_foreign.get(&goal.indicator()?).cloned()
        }
    }

    /// Resolve a goal's arguments for foreign dispatch: variables
    /// dereference to their bound term, compounds substitute recursively,
    /// anything else passes through.
    fn resolve_args(&self, goal: &Term) -> SmallVec<[Term; 4]> {
        goal.args()
            .iter()
            .map(|arg| match arg {
                Term::Var(v) => self.env.resolve(*v),
                Term::Compound(_) => self.env.resolve_term(arg),
                other => other.clone(),
            })
            .collect()
    }
}

impl Default for Machine {
    fn default() -> Self {
        Machine::new()
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "disjs:")?;
        for cp in &self.disjs {
            writeln!(f, "  {}", cp)?;
        }
        writeln!(f, "conjs:")?;
        for goal in &self.conjs {
            writeln!(f, "  {}", goal)?;
        }
        write!(f, "bindings: {:?}", self.env)
    }
}

/// Lazy iterator over a query's answers, in SLD order.
///
/// Dropping the iterator cancels the query; there is nothing to clean up.
pub struct Solutions {
    machine: Option<Machine>,
    vars: Vec<Var>,
}

impl Iterator for Solutions {
    type Item = Result<Bindings, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let m = self.machine.take()?;
            match m.step() {
                Ok(Step::Emit(next, answer)) => {
                    self.machine = Some(next);
                    return Some(Ok(answer.with_names(&self.vars)));
                }
                Ok(Step::Continue(next)) => self.machine = Some(next),
                Ok(Step::Exhausted) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Rewrite `!/0` to `$cut_to(id)` at the structural positions reachable
/// through `,`, `;` and the then-branch of `->`. The condition of `->` is
/// deliberately left alone: it runs under its own barrier later.
fn resolve_cuts(id: u64, term: &Term) -> Term {
    match (term.name(), term.arity()) {
        (Some("!"), 0) => Term::compound("$cut_to", [Term::int(id)]),
        (Some(name @ ("," | ";")), 2) => {
            let args = term.args();
            Term::compound(
                name,
                [resolve_cuts(id, &args[0]), resolve_cuts(id, &args[1])],
            )
        }
        (Some("->"), 2) => {
            let args = term.args();
            Term::compound("->", [args[0].clone(), resolve_cuts(id, &args[1])])
        }
        _ => term.clone(),
    }
}

#[cfg(test)]
#[path = "tests/machine.rs"]
mod tests;
