//! Cache fingerprints.
//!
//! A fingerprint identifies one (host, target, rule set) triple. Two
//! resolutions with equal fingerprints are guaranteed to produce the same
//! member set, so the cache can answer the second one without scanning.
//!
//! ## What goes into a fingerprint
//!
//! - The host identity (`ClassHost::identity`).
//! - The target class name; class searches use an empty target since their
//!   scope is the whole loader.
//! - The kind being searched.
//! - A structural hash of the rule set: every slot value, every selector and
//!   every flag. Built-in matchers contribute a digest of their data;
//!   closure predicates contribute their process-unique id.
//!
//! ## Tradeoffs
//!
//! - The rule hash is a 64-bit `FxHasher` digest. A collision would return a
//!   wrong cached answer; at 64 bits that is not a practical concern for the
//!   number of distinct rule sets one process builds.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::error::MemberKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub(crate) host: u64,
    pub(crate) target: String,
    pub(crate) kind: MemberKind,
    pub(crate) rules: u64,
}

impl Fingerprint {
    pub(crate) fn of(host: u64, target: &str, kind: MemberKind, rules: &impl Hash) -> Self {
        let mut hasher = FxHasher::default();
        rules.hash(&mut hasher);
        Fingerprint { host, target: target.to_string(), kind, rules: hasher.finish() }
    }

    /// Same rules and host, different target class.
    pub(crate) fn retarget(&self, target: &str) -> Self {
        Fingerprint { target: target.to_string(), ..self.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Modifiers;
    use crate::rules::{MethodRules, NameMatcher, Predicate};

    #[test]
    fn equal_rules_share_a_fingerprint() {
        let mut a = MethodRules::new();
        a.name("foo").index(1);
        let mut b = MethodRules::new();
        b.name("foo").index(1);
        assert_eq!(Fingerprint::of(1, "T", MemberKind::Method, &a), Fingerprint::of(1, "T", MemberKind::Method, &b));
    }

    #[test]
    fn selectors_and_targets_change_the_fingerprint() {
        let mut a = MethodRules::new();
        a.name("foo");
        let mut b = MethodRules::new();
        b.name("foo").last();
        let fa = Fingerprint::of(1, "T", MemberKind::Method, &a);
        assert_ne!(fa, Fingerprint::of(1, "T", MemberKind::Method, &b));
        assert_ne!(fa, fa.retarget("U"));
        assert_ne!(fa, Fingerprint::of(2, "T", MemberKind::Method, &a));
    }

    #[test]
    fn rebuilt_matchers_share_a_fingerprint() {
        let build = || {
            let mut r = MethodRules::new();
            r.name_matching(NameMatcher::new().starts_with("get"));
            r.modifiers(Modifiers::STATIC);
            Fingerprint::of(1, "T", MemberKind::Method, &r)
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn separately_built_closures_never_collide() {
        let mut a = MethodRules::new();
        a.name_matching(Predicate::new(|n: &str| n.starts_with("get")));
        let mut b = MethodRules::new();
        b.name_matching(Predicate::new(|n: &str| n.starts_with("get")));
        assert_ne!(Fingerprint::of(1, "T", MemberKind::Method, &a), Fingerprint::of(1, "T", MemberKind::Method, &b));

        let c = a.clone();
        assert_eq!(Fingerprint::of(1, "T", MemberKind::Method, &a), Fingerprint::of(1, "T", MemberKind::Method, &c));
    }
}
