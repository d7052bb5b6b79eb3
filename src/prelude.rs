//! The standard library that is implemented in Prolog itself.
//!
//! Consulted into every machine built with `Machine::new`. Kept as one
//! read-only constant; predicates that need the machine's internals live
//! in the builtins module instead.

/// Prolog source consulted at machine construction.
pub const PRELUDE: &str = r#"
% phrase(:DcgBody, ?List, ?Rest) is nondet.
%
% True when DcgBody applies to the difference List/Rest.
phrase(Dcg, Head, Tail) :-
    call(Dcg, Head, Tail).
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    #[test]
    fn prelude_parses_cleanly() {
        let terms = parser::term_all(PRELUDE).unwrap();
        assert!(!terms.is_empty());
        for term in terms {
            assert!(term.is_callable(), "prelude terms must be clauses");
        }
    }
}
