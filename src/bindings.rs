//! Persistent variable bindings.
//!
//! A bindings value maps variable ids to terms. Binding never mutates:
//! every bind returns a new value sharing structure with its predecessor,
//! so choice points can hold old environments for free. A variable is
//! bound at most once per bindings value; backtracking discards the
//! younger environment instead of undoing anything.

use crate::symbol::{symbols, NameId};
use crate::term::{Args, Term, Var};
use im::HashMap;
use std::fmt;

/// Returned by `bind` if the variable already has a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyBound;

impl fmt::Display for AlreadyBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("variable was already bound")
    }
}

impl std::error::Error for AlreadyBound {}

/// A persistent variable→term map, with an optional display-name index
/// attached when an answer is handed back to the caller.
#[derive(Clone, Default)]
pub struct Bindings {
    bindings: HashMap<u64, Term>,
    names: HashMap<NameId, Var>,
}

impl Bindings {
    /// A new, empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bound variables.
    pub fn size(&self) -> usize {
        self.bindings.len()
    }

    /// Bind a free variable, returning the extended environment.
    pub fn bind(&self, var: Var, value: Term) -> Result<Bindings, AlreadyBound> {
        if self.bindings.contains_key(&var.id()) {
            return Err(AlreadyBound);
        }
        Ok(Bindings {
            bindings: self.bindings.update(var.id(), value),
            names: self.names.clone(),
        })
    }

    /// The value bound to a variable, if any. Does not follow chains.
    pub fn value(&self, var: &Var) -> Option<&Term> {
        self.bindings.get(&var.id())
    }

    /// Follow a variable's binding chain to its end.
    ///
    /// Lands on the final free variable, or on a non-variable term with
    /// all reachable bindings substituted into it.
    pub fn resolve(&self, var: Var) -> Term {
        let mut current = var;
        loop {
            match self.value(&current) {
                None => return Term::Var(current),
                Some(Term::Var(next)) => current = *next,
                Some(term) => return self.resolve_term(term),
            }
        }
    }

    /// Substitute every resolvable variable inside a term.
    /// Subtrees without bound variables are shared with the input.
    pub fn resolve_term(&self, term: &Term) -> Term {
        self.resolve_inner(term).unwrap_or_else(|| term.clone())
    }

    fn resolve_inner(&self, term: &Term) -> Option<Term> {
        match term {
            Term::Var(v) => {
                let resolved = self.resolve(*v);
                match (&resolved, term) {
                    (Term::Var(a), Term::Var(b)) if a == b => None,
                    _ => Some(resolved),
                }
            }
            Term::Compound(c) => {
                let mut new_args: Option<Args> = None;
                for (i, arg) in c.args().iter().enumerate() {
                    if let Some(changed) = self.resolve_inner(arg) {
                        new_args.get_or_insert_with(|| c.args().into())[i] = changed;
                    }
                }
                new_args.map(|args| Term::raw_compound(c.name_key(), args))
            }
            _ => None,
        }
    }

    /// Look up a binding through the display-name index.
    pub fn by_name(&self, name: &str) -> Option<Term> {
        let key = symbols().get(name)?;
        let var = self.names.get(&key)?;
        Some(self.resolve(*var))
    }

    /// Attach a display-name index for answer reporting.
    /// The first variable seen for a name wins. Panics if names were
    /// already attached; that is a driver bug.
    pub fn with_names(&self, vars: &[Var]) -> Bindings {
        if !self.names.is_empty() {
            panic!("names have already been attached to these bindings");
        }
        let mut names = HashMap::new();
        for var in vars {
            names.entry(var.name_key()).or_insert(*var);
        }
        Bindings {
            bindings: self.bindings.clone(),
            names,
        }
    }

    /// The named variables of this answer, in arbitrary order.
    pub fn names(&self) -> impl Iterator<Item = Var> + '_ {
        self.names.values().copied()
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.bindings.iter().collect();
        entries.sort_by_key(|(id, _)| **id);
        f.write_str("{")?;
        for (i, (id, term)) in entries.into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "_G{}={}", id, term)?;
        }
        f.write_str("}")
    }
}
