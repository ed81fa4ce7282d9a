//! Rule data model.
//!
//! A rule set describes *what* to look for; it never touches the host. The
//! engine compiles a rule set into a list of criteria (`engine/compiled_rules.rs`)
//! and runs it over the declared members of a target.
//!
//! - `selector.rs`: positional selectors and the `Positional` handle every
//!   setter returns.
//! - `predicates.rs`: the `Matcher` trait, shared `Predicate`s and the
//!   built-in name/modifier matchers.
//! - `member.rs`: field, method and constructor rule sets.
//! - `class.rs`: class rule sets, including nested member rules.

#[path = "rules/class.rs"]
mod class;
#[path = "rules/member.rs"]
mod member;
#[path = "rules/predicates.rs"]
mod predicates;
#[path = "rules/selector.rs"]
mod selector;

pub use class::{ClassRules, MatchCount, NameRule, NestedRules, PackageRule};
pub use member::{AnyMemberRules, ConstructorRules, FieldRules, MethodRules};
pub(crate) use member::{BaseRules, ParamRules};
pub use predicates::{Matcher, ModifierMatcher, NameMatcher, ParamType, Predicate};
pub use selector::{Positional, PositionalSelector};

/// One rule slot: the requested value plus an optional selector.
#[derive(Debug, Clone, Hash)]
pub(crate) struct Slot<T> {
    pub(crate) value: T,
    pub(crate) selector: Option<PositionalSelector>,
}

impl<T> Slot<T> {
    /// Diagnostic line, e.g. `name:[foo] index(-1)`.
    pub(crate) fn render(&self, label: &str, value: &str) -> String {
        match &self.selector {
            Some(selector) => format!("{label}:[{value}] {selector}"),
            None => format!("{label}:[{value}]"),
        }
    }
}

pub(crate) fn set_slot<T>(slot: &mut Option<Slot<T>>, value: T) -> Positional<'_> {
    let slot = slot.insert(Slot { value, selector: None });
    Positional::new(&mut slot.selector)
}
