//! Flag-combination predicates.
//!
//! Mutual-exclusivity and completeness checks over a small fixed set of
//! optional configuration values, expressed over explicit presence
//! booleans computed at the call site. No runtime type introspection.

/// Returns `true` iff exactly one of the flags is set.
pub fn exactly_one_set(flags: &[bool]) -> bool {
    flags.iter().filter(|f| **f).count() == 1
}

/// Returns `true` iff every flag is set. An empty set never qualifies.
pub fn all_set(flags: &[bool]) -> bool {
    !flags.is_empty() && flags.iter().all(|f| *f)
}
