//! Unification fingerprints.
//!
//! Every term can be summarized as a 64-bit hash in one of two modes:
//! "prepared" for clause heads going into the database, "query" for goals
//! looking clauses up. The two modes differ only in how variables hash
//! (all-ones when preparing, all-zeros when querying), which makes
//! `query & prepared == query` a necessary condition for unifiability.
//! The database uses this to discard candidate clauses without running
//! the unifier.

use crate::term::Term;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Bits reserved for a compound's functor name, out of its slot.
const FUNCTOR_BITS: u32 = 12;

/// Hash a slice of terms into `n_bits` bits, split evenly across the slice.
/// `preparing` selects the clause-head side; the goal side passes false.
pub fn unification_hash(terms: &[Term], n_bits: u32, preparing: bool) -> u64 {
    if terms.is_empty() || n_bits == 0 {
        return 0;
    }
    let per_term = n_bits / terms.len() as u32;
    let mut out = 0u64;
    for term in terms {
        out = shift(out, per_term) | (hash_one(term, per_term, preparing) & mask(per_term));
    }
    out
}

/// The query-mode fingerprint of a term, cached on compounds.
pub fn query_hash(term: &Term) -> u64 {
    match term {
        Term::Compound(c) => *c
            .query_hash
            .get_or_init(|| unification_hash(std::slice::from_ref(term), 64, false)),
        _ => unification_hash(std::slice::from_ref(term), 64, false),
    }
}

/// The prepared-mode fingerprint of a term, cached on compounds.
pub fn prepared_hash(term: &Term) -> u64 {
    match term {
        Term::Compound(c) => *c
            .prepared_hash
            .get_or_init(|| unification_hash(std::slice::from_ref(term), 64, true)),
        _ => unification_hash(std::slice::from_ref(term), 64, true),
    }
}

/// Necessary condition for `query` to unify with `prepared`.
/// May report true for terms that do not unify; never false for ones that do.
pub fn might_unify(query: &Term, prepared: &Term) -> bool {
    let q = query_hash(query);
    (q & prepared_hash(prepared)) == q
}

fn hash_one(term: &Term, bits: u32, preparing: bool) -> u64 {
    if bits == 0 {
        return 0;
    }
    match term {
        Term::Var(_) => {
            if preparing {
                mask(bits)
            } else {
                0
            }
        }
        Term::Atom(a) => fnv1a(a.name().as_bytes()) & mask(bits),
        Term::Int(i) => fnv1a(i.to_string().as_bytes()) & mask(bits),
        Term::Float(f) => fnv1a(f.to_bits().to_string().as_bytes()) & mask(bits),
        Term::Rational(r) => {
            // integral rationals hash like the equal integer, so the
            // prune rule cannot separate terms the unifier accepts
            let text = if r.is_integer() {
                r.numer().to_string()
            } else {
                format!("{}/{}", r.numer(), r.denom())
            };
            fnv1a(text.as_bytes()) & mask(bits)
        }
        Term::Compound(c) if c.name() == "." && c.arity() == 2 => {
            // pairs skip the functor slot: all bits go to car and cdr
            let cdr_bits = bits / 2;
            let car_bits = bits - cdr_bits;
            let car = hash_one(&c.args()[0], car_bits, preparing) & mask(car_bits);
            let cdr = hash_one(&c.args()[1], cdr_bits, preparing) & mask(cdr_bits);
            shift(car, cdr_bits) | cdr
        }
        Term::Compound(c) => {
            let functor_bits = FUNCTOR_BITS.min(bits);
            let arg_bits = bits - functor_bits;
            let arity = c.arity() as u32;
            let per_arg = arg_bits / arity;
            let mut out = fnv1a(c.name().as_bytes()) & mask(functor_bits);
            for arg in c.args() {
                out = shift(out, per_arg) | (hash_one(arg, per_arg, preparing) & mask(per_arg));
            }
            out
        }
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h = FNV_OFFSET;
    for b in bytes {
        h ^= *b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

fn shift(value: u64, bits: u32) -> u64 {
    if bits >= 64 {
        0
    } else {
        value << bits
    }
}
