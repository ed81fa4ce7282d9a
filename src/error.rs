//! Error taxonomy for resolution.
//!
//! - [`ConfigurationError`]: the rule set itself is unusable. Always returned
//!   synchronously and never retried.
//! - [`NotFoundError`]: a full search (including superclass fallback) found
//!   nothing. Recoverable through a remedy plan or silenced per call.
//! - [`EnumerationError`]: the host refused to list classes or members. The
//!   engine logs it and continues with zero candidates.
//! - [`FindError`]: the union of the first two, used where a single value has
//!   to carry either outcome (deferred delivery, remedy plans).

use std::fmt;

use thiserror::Error;

/// What a rule set is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Class,
    Field,
    Method,
    Constructor,
}

impl MemberKind {
    pub fn name(&self) -> &'static str {
        match self {
            MemberKind::Class => "Class",
            MemberKind::Field => "Field",
            MemberKind::Method => "Method",
            MemberKind::Constructor => "Constructor",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("you must set a condition when finding a {kind}")]
    Uninitialized { kind: MemberKind },

    #[error("{kind} paramTypes is empty, use an empty parameter count instead")]
    EmptyParamTypes { kind: MemberKind },

    #[error("{kind} paramTypes must constrain at least one position, got {count} wildcards")]
    AllWildcardParams { kind: MemberKind, count: usize },

    #[error("{kind} rules combine incompatible conditions: {detail}")]
    UnsupportedCombination { kind: MemberKind, detail: String },
}

/// A search that came back empty, carrying the diagnostic template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{template}")]
pub struct NotFoundError {
    pub kind: MemberKind,
    /// Class (or loader) that was searched.
    pub target: String,
    /// Multi-line description of every requested slot.
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to list declared {what} in [{target}]: {reason}")]
pub struct EnumerationError {
    pub target: String,
    pub what: &'static str,
    pub reason: String,
}

impl EnumerationError {
    pub fn new(target: impl Into<String>, what: &'static str, reason: impl Into<String>) -> Self {
        EnumerationError { target: target.into(), what, reason: reason.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FindError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),
}

impl FindError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FindError::NotFound(_))
    }
}
