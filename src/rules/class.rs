//! Class rule sets: find classes by shape instead of by name.

use std::fmt;
use std::ops::RangeInclusive;

use super::member::{AnyMemberRules, ConstructorRules, FieldRules, MethodRules};
use super::predicates::Predicate;
use super::selector::Positional;
use super::{Slot, set_slot};
use crate::model::Modifiers;

/// A name the class should have; optional names form an "any of" group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameRule {
    pub name: String,
    pub optional: bool,
}

impl fmt::Display for NameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} optional({})", self.name, self.optional)
    }
}

/// Package the class must come from. Absolute packages match exactly,
/// otherwise sub-packages match too.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRule {
    pub name: String,
    pub absolute: bool,
}

impl fmt::Display for PackageRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} absolute({})", self.name, self.absolute)
    }
}

/// Constraint on how many declared members satisfied a nested rule set.
#[derive(Debug, Clone, Default, Hash)]
pub struct MatchCount {
    pub(crate) exact: Option<usize>,
    pub(crate) range: Option<RangeInclusive<usize>>,
    pub(crate) matching: Option<Predicate<usize>>,
}

impl MatchCount {
    pub fn count(&mut self, n: usize) -> &mut Self {
        self.exact = Some(n);
        self
    }

    pub fn count_range(&mut self, range: RangeInclusive<usize>) -> &mut Self {
        self.range = Some(range);
        self
    }

    pub fn count_matching(&mut self, predicate: Predicate<usize>) -> &mut Self {
        self.matching = Some(predicate);
        self
    }

    pub fn none(&mut self) -> &mut Self {
        self.count(0)
    }

    pub(crate) fn accepts(&self, n: usize) -> bool {
        self.exact.is_none_or(|e| e == n)
            && self.range.as_ref().is_none_or(|r| r.contains(&n))
            && self.matching.as_ref().is_none_or(|p| p.evaluate(&n))
    }
}

/// A member rule set nested inside class rules, plus its count constraint.
#[derive(Debug, Clone, Default, Hash)]
pub struct NestedRules<R> {
    pub(crate) rules: R,
    pub(crate) count: MatchCount,
}

fn push_nested<R: Default>(list: &mut Vec<NestedRules<R>>, build: impl FnOnce(&mut R)) -> &mut MatchCount {
    let mut nested = NestedRules::default();
    build(&mut nested.rules);
    list.push(nested);
    let last = list.len() - 1;
    &mut list[last].count
}

#[derive(Debug, Clone, Default, Hash)]
pub struct ClassRules {
    pub(crate) from_packages: Vec<PackageRule>,
    pub(crate) full_name: Option<NameRule>,
    pub(crate) simple_name: Option<NameRule>,
    pub(crate) single_name: Option<NameRule>,
    pub(crate) full_name_matching: Option<Predicate<str>>,
    pub(crate) simple_name_matching: Option<Predicate<str>>,
    pub(crate) single_name_matching: Option<Predicate<str>>,
    pub(crate) modifiers: Option<Slot<Predicate<Modifiers>>>,
    pub(crate) anonymous: Option<bool>,
    pub(crate) no_extends: Option<bool>,
    pub(crate) no_implements: Option<bool>,
    pub(crate) extends: Vec<String>,
    pub(crate) implements: Vec<String>,
    pub(crate) enclosing: Vec<String>,
    pub(crate) member_rules: Vec<NestedRules<AnyMemberRules>>,
    pub(crate) field_rules: Vec<NestedRules<FieldRules>>,
    pub(crate) method_rules: Vec<NestedRules<MethodRules>>,
    pub(crate) constructor_rules: Vec<NestedRules<ConstructorRules>>,
}

impl ClassRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the search to packages; each call adds one.
    pub fn from_package(&mut self, name: impl Into<String>, absolute: bool) -> &mut Self {
        self.from_packages.push(PackageRule { name: name.into(), absolute });
        self
    }

    pub fn full_name(&mut self, name: impl Into<String>, optional: bool) -> &mut Self {
        self.full_name = Some(NameRule { name: name.into(), optional });
        self
    }

    pub fn simple_name(&mut self, name: impl Into<String>, optional: bool) -> &mut Self {
        self.simple_name = Some(NameRule { name: name.into(), optional });
        self
    }

    /// Simple name, or `Outer$1` style for anonymous classes.
    pub fn single_name(&mut self, name: impl Into<String>, optional: bool) -> &mut Self {
        self.single_name = Some(NameRule { name: name.into(), optional });
        self
    }

    pub fn full_name_matching(&mut self, predicate: impl Into<Predicate<str>>) -> &mut Self {
        self.full_name_matching = Some(predicate.into());
        self
    }

    pub fn simple_name_matching(&mut self, predicate: impl Into<Predicate<str>>) -> &mut Self {
        self.simple_name_matching = Some(predicate.into());
        self
    }

    pub fn single_name_matching(&mut self, predicate: impl Into<Predicate<str>>) -> &mut Self {
        self.single_name_matching = Some(predicate.into());
        self
    }

    pub fn modifiers(&mut self, predicate: impl Into<Predicate<Modifiers>>) -> Positional<'_> {
        set_slot(&mut self.modifiers, predicate.into())
    }

    pub fn anonymous(&mut self, value: bool) -> &mut Self {
        self.anonymous = Some(value);
        self
    }

    pub fn no_extends(&mut self, value: bool) -> &mut Self {
        self.no_extends = Some(value);
        self
    }

    pub fn no_implements(&mut self, value: bool) -> &mut Self {
        self.no_implements = Some(value);
        self
    }

    /// The direct superclass must be one of the given names.
    pub fn extends(&mut self, names: &[&str]) -> &mut Self {
        self.extends.extend(names.iter().map(|s| s.to_string()));
        self
    }

    /// At least one direct interface must be one of the given names.
    pub fn implements(&mut self, names: &[&str]) -> &mut Self {
        self.implements.extend(names.iter().map(|s| s.to_string()));
        self
    }

    pub fn enclosing(&mut self, names: &[&str]) -> &mut Self {
        self.enclosing.extend(names.iter().map(|s| s.to_string()));
        self
    }

    pub fn member(&mut self, build: impl FnOnce(&mut AnyMemberRules)) -> &mut MatchCount {
        push_nested(&mut self.member_rules, build)
    }

    pub fn field(&mut self, build: impl FnOnce(&mut FieldRules)) -> &mut MatchCount {
        push_nested(&mut self.field_rules, build)
    }

    pub fn method(&mut self, build: impl FnOnce(&mut MethodRules)) -> &mut MatchCount {
        push_nested(&mut self.method_rules, build)
    }

    pub fn constructor(&mut self, build: impl FnOnce(&mut ConstructorRules)) -> &mut MatchCount {
        push_nested(&mut self.constructor_rules, build)
    }

    pub fn is_initialized(&self) -> bool {
        self.modifiers.is_some()
            || !self.from_packages.is_empty()
            || self.full_name.is_some()
            || self.simple_name.is_some()
            || self.single_name.is_some()
            || self.full_name_matching.is_some()
            || self.simple_name_matching.is_some()
            || self.single_name_matching.is_some()
            || self.anonymous.is_some()
            || self.no_extends.is_some()
            || self.no_implements.is_some()
            || !self.extends.is_empty()
            || !self.implements.is_empty()
            || !self.enclosing.is_empty()
            || !self.member_rules.is_empty()
            || !self.field_rules.is_empty()
            || !self.method_rules.is_empty()
            || !self.constructor_rules.is_empty()
    }

    pub fn templates(&self) -> Vec<String> {
        fn list<T: fmt::Display>(items: &[T]) -> String {
            items.iter().map(T::to_string).collect::<Vec<_>>().join(", ")
        }

        let mut out = Vec::new();
        if !self.from_packages.is_empty() {
            out.push(format!("from:[{}]", list(&self.from_packages)));
        }
        for (label, rule) in
            [("fullName", &self.full_name), ("simpleName", &self.simple_name), ("singleName", &self.single_name)]
        {
            if let Some(rule) = rule {
                out.push(format!("{label}:[{rule}]"));
            }
        }
        for (label, pred) in [
            ("fullNameConditions", &self.full_name_matching),
            ("simpleNameConditions", &self.simple_name_matching),
            ("singleNameConditions", &self.single_name_matching),
        ] {
            if let Some(pred) = pred {
                out.push(format!("{label}:[{}]", pred.describe()));
            }
        }
        if let Some(slot) = &self.modifiers {
            out.push(slot.render("modifiers", &slot.value.describe()));
        }
        for (label, flag) in [
            ("isAnonymousClass", self.anonymous),
            ("isNoExtendsClass", self.no_extends),
            ("isNoImplementsClass", self.no_implements),
        ] {
            if let Some(flag) = flag {
                out.push(format!("{label}:[{flag}]"));
            }
        }
        for (label, names) in
            [("extendsClass", &self.extends), ("implementsClass", &self.implements), ("enclosingClass", &self.enclosing)]
        {
            if !names.is_empty() {
                out.push(format!("{label}:[{}]", list(names)));
            }
        }
        for (label, n) in [
            ("memberRules", self.member_rules.len()),
            ("fieldRules", self.field_rules.len()),
            ("methodRules", self.method_rules.len()),
            ("constructorRules", self.constructor_rules.len()),
        ] {
            if n > 0 {
                out.push(format!("{label}:[{n} existed]"));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_rules_initialize_class_rules() {
        let mut rules = ClassRules::new();
        assert!(!rules.is_initialized());
        rules.method(|m| {
            m.name("onCreate");
        });
        assert!(rules.is_initialized());
        assert_eq!(rules.templates(), vec!["methodRules:[1 existed]".to_string()]);
    }

    #[test]
    fn match_count_combines_constraints() {
        let mut count = MatchCount::default();
        assert!(count.accepts(7));
        count.count_range(1..=3).count_matching(Predicate::new(|n: &usize| n % 2 == 1));
        assert!(count.accepts(1));
        assert!(!count.accepts(2));
        assert!(!count.accepts(5));
    }

    #[test]
    fn templates_render_packages_and_names() {
        let mut rules = ClassRules::new();
        rules.from_package("com.demo", true).full_name("com.demo.A", false).simple_name("A", true);
        assert_eq!(
            rules.templates(),
            vec![
                "from:[com.demo absolute(true)]".to_string(),
                "fullName:[com.demo.A optional(false)]".to_string(),
                "simpleName:[A optional(true)]".to_string(),
            ]
        );
    }
}
