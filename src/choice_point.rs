//! Choice points: the alternative computations tried on backtracking.

use crate::machine::Machine;
use crate::term::Term;
use crate::unify::unify;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter for cut-barrier ids.
static NEXT_BARRIER_ID: AtomicU64 = AtomicU64::new(1);

/// A saved alternative on the disjunction stack.
///
/// Barriers are not real alternatives: they mark the scope of `!/0` and
/// are skipped when the machine backtracks across them.
#[derive(Clone)]
pub enum ChoicePoint {
    /// Try a stored clause against a goal: rename, unify with the head,
    /// push the body.
    HeadBody {
        machine: Machine,
        goal: Term,
        clause: Term,
    },
    /// Push a goal onto the conjunctions; always succeeds.
    Simple { machine: Machine, goal: Term },
    /// A cut barrier. Carries only its id.
    Barrier { id: u64 },
}

/// Outcome of following a choice point.
pub enum Follow {
    /// The alternative was entered; continue on this machine.
    Machine(Machine),
    /// A head-body clause whose head did not unify with the goal.
    CantUnify,
    /// A barrier was popped; skip it and keep backtracking.
    Barrier,
}

impl ChoicePoint {
    pub fn head_body(machine: Machine, goal: Term, clause: Term) -> Self {
        ChoicePoint::HeadBody {
            machine,
            goal,
            clause,
        }
    }

    pub fn simple(machine: Machine, goal: Term) -> Self {
        ChoicePoint::Simple { machine, goal }
    }

    /// A new barrier with a freshly allocated id.
    pub fn barrier() -> Self {
        ChoicePoint::Barrier {
            id: NEXT_BARRIER_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// The barrier id, for barrier choice points only.
    pub fn barrier_id(&self) -> Option<u64> {
        match self {
            ChoicePoint::Barrier { id } => Some(*id),
            _ => None,
        }
    }

    /// Begin proving this alternative.
    pub fn follow(&self) -> Follow {
        match self {
            ChoicePoint::HeadBody {
                machine,
                goal,
                clause,
            } => {
                // rename so recursive clauses get fresh variables each try
                let clause = clause.rename_variables();
                let (head, body) = clause.clause_parts();
                match unify(machine.bindings(), goal, head) {
                    Ok(env) => {
                        let next = machine.set_bindings(env);
                        Follow::Machine(match body {
                            Some(b) => next.push_conj(b.clone()),
                            None => next,
                        })
                    }
                    Err(_) => Follow::CantUnify,
                }
            }
            ChoicePoint::Simple { machine, goal } => {
                Follow::Machine(machine.push_conj(goal.clone()))
            }
            ChoicePoint::Barrier { .. } => Follow::Barrier,
        }
    }
}

impl fmt::Display for ChoicePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoicePoint::HeadBody { goal, clause, .. } => {
                write!(f, "prove goal `{}` against clause `{}`", goal, clause)
            }
            ChoicePoint::Simple { goal, .. } => write!(f, "push conj {}", goal),
            ChoicePoint::Barrier { id } => write!(f, "cut barrier {}", id),
        }
    }
}
