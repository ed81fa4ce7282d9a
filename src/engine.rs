//! Resolution engine.
//!
//! Rule sets (`src/rules/**`) are data; this module turns them into results.
//! The work is split into focused submodules under `src/engine/`:
//!
//! ```text
//! rule set ──▶ validate + compile          (compiled_rules.rs)
//!                    │
//!                    v
//!             Fingerprint::of ──▶ ReflectCache (fingerprint.rs, ../cache.rs)
//!                    │ miss
//!                    v
//!             Engine::find_members / find_classes   (resolver.rs)
//!               - enumerate declared members (or package-gated class names)
//!               - per-slot positional cursors      (positional.rs)
//!               - and/opt aggregation per candidate (conditions.rs)
//!               - superclass walk on empty result
//!                    │
//!                    v
//!             Resolution { found | NotFoundError, ResolveMetrics }
//! ```
//!
//! ## Responsibilities by module
//!
//! - `compiled_rules.rs`: slot criteria, parameter validation, the
//!   `MemberRuleSet` seam and class criteria with nested member counts.
//! - `positional.rs`: per-slot ordinal counters and `PositionalSelector`
//!   admission.
//! - `conditions.rs`: conjunctive and optional terms folded into one verdict.
//! - `package_filter.rs`: package gating over class names.
//! - `fingerprint.rs`: cache keys.
//! - `diagnostics.rs`: the not-found template.
//! - `resolver.rs`: the `Engine` that ties the above to a host and a cache.
//! - `metrics.rs`: timing and scan counters for one resolution.
//!
//! ## Debugging
//!
//! Set `MEMBERFIND_DEBUG=1` to log a timing line per resolution under the
//! `memberfind::resolver` tracing target.

#[path = "engine/compiled_rules.rs"]
mod compiled_rules;
#[path = "engine/conditions.rs"]
mod conditions;
#[path = "engine/diagnostics.rs"]
mod diagnostics;
#[path = "engine/fingerprint.rs"]
mod fingerprint;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/package_filter.rs"]
mod package_filter;
#[path = "engine/positional.rs"]
mod positional;
#[path = "engine/resolver.rs"]
mod resolver;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub(crate) use compiled_rules::MemberRuleSet;
pub(crate) use diagnostics::not_found;
pub use diagnostics::LOG_TARGET;
pub use fingerprint::Fingerprint;
pub use metrics::ResolveMetrics;
pub(crate) use resolver::{Engine, Resolution};
