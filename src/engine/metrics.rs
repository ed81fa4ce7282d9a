//! Resolution metrics.
//!
//! Every resolution records a small set of counters. They are cheap enough to
//! collect unconditionally; `Options::debug_timing` only controls whether they
//! are also logged.
//!
//! The intended usage is:
//!
//! - `MemberResult::metrics` / `ClassResult::metrics` for callers that want to
//!   inspect one lookup.
//! - The CLI report, which prints them next to the matches.

use std::fmt;
use std::time::Duration;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveMetrics {
    /// Total elapsed time, validation through cache store.
    pub elapsed: Duration,
    /// Candidates evaluated against the rules (members or classes).
    pub scanned: usize,
    /// The answer came from the cache.
    pub cache_hit: bool,
    /// Superclasses visited after the target itself came back empty.
    pub superclass_hops: usize,
}

impl fmt::Display for ResolveMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} scanned={} cache_hit={} superclass_hops={}",
            self.elapsed, self.scanned, self.cache_hit, self.superclass_hops
        )
    }
}
