//! Rule compilation.
//!
//! A rule set is plain data; before a scan it is compiled into a flat list of
//! criteria, one per populated slot. Each criterion carries the slot's test,
//! its positional selector, and whether it joins the optional group.
//!
//! ```text
//! FieldRules ─┐
//! MethodRules ┼─ compile() ──▶ CompiledRules { criteria, order } ──▶ select(declared)
//! ClassRules ─┘
//! ```
//!
//! Compilation borrows the rule set, so a compiled list never outlives the
//! rules it came from. Class rules also borrow the host: nested member rules
//! enumerate the candidate class's own members while the class scan runs.
//!
//! ## Invariants
//!
//! - Criteria are evaluated in slot order for every candidate; each one owns
//!   an independent positional counter.
//! - Validation happens before compilation; `compile` never fails.

use std::hash::Hash;
use std::sync::Arc;

use super::LOG_TARGET;
use super::conditions::Conditions;
use super::positional::{SlotCursor, last_ordinal};
use crate::error::{ConfigurationError, EnumerationError, MemberKind};
use crate::host::ClassHost;
use crate::model::{Candidate, ClassInfo, ConstructorInfo, FieldInfo, MethodInfo, Modifiers, TypeName};
use crate::rules::{
    AnyMemberRules, BaseRules, ClassRules, ConstructorRules, FieldRules, MethodRules, NestedRules, ParamRules,
    ParamType, PositionalSelector, Slot,
};

type Test<'r, M> = Box<dyn Fn(&M) -> bool + 'r>;

struct Criterion<'r, M> {
    test: Test<'r, M>,
    selector: Option<PositionalSelector>,
    optional: bool,
}

/// Criteria derived from one rule set.
pub(crate) struct CompiledRules<'r, M> {
    criteria: Vec<Criterion<'r, M>>,
    order: Option<PositionalSelector>,
}

impl<'r, M: 'r> CompiledRules<'r, M> {
    pub(crate) fn new(order: Option<PositionalSelector>) -> Self {
        CompiledRules { criteria: Vec::new(), order }
    }

    pub(crate) fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Add a criterion for a populated slot; empty slots add nothing.
    fn slot<T>(&mut self, slot: &'r Option<Slot<T>>, test: impl Fn(&'r T, &M) -> bool + 'r) {
        if let Some(slot) = slot {
            let value = &slot.value;
            self.criteria.push(Criterion { test: Box::new(move |m| test(value, m)), selector: slot.selector, optional: false });
        }
    }

    /// Add an unselected criterion.
    fn term(&mut self, optional: bool, test: impl Fn(&M) -> bool + 'r) {
        self.criteria.push(Criterion { test: Box::new(test), selector: None, optional });
    }

    fn params(&mut self, rules: &'r ParamRules, params_of: fn(&M) -> &[TypeName]) {
        self.slot(&rules.count, move |n, m| params_of(m).len() == *n);
        self.slot(&rules.count_range, move |r, m| r.contains(&params_of(m).len()));
        self.slot(&rules.count_matching, move |p, m| p.evaluate(&params_of(m).len()));
        self.slot(&rules.types, move |t, m| param_types_eq(t, params_of(m)));
        self.slot(&rules.types_matching, move |p, m| p.evaluate(params_of(m)));
    }

    /// Declared items satisfying every criterion, in declaration order.
    pub(crate) fn select(&self, declared: &[Arc<M>]) -> Vec<Arc<M>> {
        let mut cursors: Vec<SlotCursor> = self
            .criteria
            .iter()
            .map(|c| {
                let last = match c.selector {
                    Some(_) => last_ordinal(declared, |m| (c.test)(&**m)),
                    None => -1,
                };
                SlotCursor::new(c.selector, last)
            })
            .collect();
        let last_index = declared.len() as i32 - 1;

        let mut out = Vec::new();
        let mut rejected = 0usize;
        for (index, item) in declared.iter().enumerate() {
            let mut conditions = Conditions::new();
            for (criterion, cursor) in self.criteria.iter().zip(cursors.iter_mut()) {
                let term = cursor.step((criterion.test)(&**item));
                if criterion.optional {
                    conditions.opt(term);
                } else {
                    conditions.and(term);
                }
            }
            if let Some(order) = &self.order {
                conditions.and(order.admits(index as i32, last_index));
            }
            conditions.finally(|| out.push(Arc::clone(item))).without(|| rejected += 1);
        }
        tracing::trace!(target: LOG_TARGET, criteria = self.len(), selected = out.len(), rejected, "select");
        out
    }
}

/// Element-wise comparison with [`ParamType::Any`] wildcards; a length
/// mismatch never matches.
pub(crate) fn param_types_eq(expected: &[ParamType], actual: &[TypeName]) -> bool {
    expected.len() == actual.len() && expected.iter().zip(actual).all(|(e, a)| e.accepts(a))
}

fn validate_params(kind: MemberKind, params: &ParamRules) -> Result<(), ConfigurationError> {
    let Some(types) = &params.types else { return Ok(()) };
    let types = &types.value;
    if types.is_empty() {
        return Err(ConfigurationError::EmptyParamTypes { kind });
    }
    if types.iter().all(|t| *t == ParamType::Any) {
        return Err(ConfigurationError::AllWildcardParams { kind, count: types.len() });
    }
    if let Some(count) = &params.count {
        if count.value != types.len() {
            return Err(ConfigurationError::UnsupportedCombination {
                kind,
                detail: format!("paramCount {} with {} paramTypes", count.value, types.len()),
            });
        }
    }
    if let Some(range) = &params.count_range {
        if !range.value.contains(&types.len()) {
            return Err(ConfigurationError::UnsupportedCombination {
                kind,
                detail: format!(
                    "paramCountRange {}..={} excludes {} paramTypes",
                    range.value.start(),
                    range.value.end(),
                    types.len()
                ),
            });
        }
    }
    Ok(())
}

// --- Member rule sets ---------------------------------------------------------

/// A rule set that selects among the declared members of one class.
pub(crate) trait MemberRuleSet: Hash + Send + Sync {
    type Member: Send + Sync + 'static;

    const KIND: MemberKind;

    fn base(&self) -> &BaseRules;

    fn has_conditions(&self) -> bool;

    fn diagnostic_lines(&self) -> Vec<String>;

    fn param_rules(&self) -> Option<&ParamRules> {
        None
    }

    fn compile(&self) -> CompiledRules<'_, Self::Member>;

    fn declared(host: &dyn ClassHost, class: &ClassInfo) -> Result<Vec<Arc<Self::Member>>, EnumerationError>;

    fn wrap(member: Arc<Self::Member>) -> Candidate;

    fn unwrap(candidate: &Candidate) -> Option<Arc<Self::Member>>;

    fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.has_conditions() {
            return Err(ConfigurationError::Uninitialized { kind: Self::KIND });
        }
        match self.param_rules() {
            Some(params) => validate_params(Self::KIND, params),
            None => Ok(()),
        }
    }
}

fn compile_base<'r, M: 'r>(compiled: &mut CompiledRules<'r, M>, base: &'r BaseRules, modifiers_of: fn(&M) -> Modifiers) {
    compiled.slot(&base.modifiers, move |p, m| p.evaluate(&modifiers_of(m)));
}

impl MemberRuleSet for FieldRules {
    type Member = FieldInfo;

    const KIND: MemberKind = MemberKind::Field;

    fn base(&self) -> &BaseRules {
        &self.base
    }

    fn has_conditions(&self) -> bool {
        self.is_initialized()
    }

    fn diagnostic_lines(&self) -> Vec<String> {
        self.templates()
    }

    fn compile(&self) -> CompiledRules<'_, FieldInfo> {
        let mut c: CompiledRules<'_, FieldInfo> = CompiledRules::new(self.base.order);
        c.slot(&self.name, |name, f: &FieldInfo| f.name == *name);
        c.slot(&self.name_matching, |p, f: &FieldInfo| p.evaluate(&f.name));
        c.slot(&self.ty, |ty, f: &FieldInfo| f.ty == *ty);
        c.slot(&self.ty_matching, |p, f: &FieldInfo| p.evaluate(&f.ty));
        compile_base(&mut c, &self.base, |f| f.modifiers);
        c
    }

    fn declared(host: &dyn ClassHost, class: &ClassInfo) -> Result<Vec<Arc<FieldInfo>>, EnumerationError> {
        host.declared_fields(class)
    }

    fn wrap(member: Arc<FieldInfo>) -> Candidate {
        Candidate::Field(member)
    }

    fn unwrap(candidate: &Candidate) -> Option<Arc<FieldInfo>> {
        match candidate {
            Candidate::Field(f) => Some(Arc::clone(f)),
            _ => None,
        }
    }
}

impl MemberRuleSet for MethodRules {
    type Member = MethodInfo;

    const KIND: MemberKind = MemberKind::Method;

    fn base(&self) -> &BaseRules {
        &self.base
    }

    fn has_conditions(&self) -> bool {
        self.is_initialized()
    }

    fn diagnostic_lines(&self) -> Vec<String> {
        self.templates()
    }

    fn param_rules(&self) -> Option<&ParamRules> {
        Some(&self.params)
    }

    fn compile(&self) -> CompiledRules<'_, MethodInfo> {
        let mut c: CompiledRules<'_, MethodInfo> = CompiledRules::new(self.base.order);
        c.slot(&self.name, |name, m: &MethodInfo| m.name == *name);
        c.slot(&self.name_matching, |p, m: &MethodInfo| p.evaluate(&m.name));
        c.params(&self.params, |m| m.params.as_slice());
        c.slot(&self.return_type, |ty, m: &MethodInfo| m.return_type == *ty);
        c.slot(&self.return_type_matching, |p, m: &MethodInfo| p.evaluate(&m.return_type));
        compile_base(&mut c, &self.base, |m| m.modifiers);
        c
    }

    fn declared(host: &dyn ClassHost, class: &ClassInfo) -> Result<Vec<Arc<MethodInfo>>, EnumerationError> {
        host.declared_methods(class)
    }

    fn wrap(member: Arc<MethodInfo>) -> Candidate {
        Candidate::Method(member)
    }

    fn unwrap(candidate: &Candidate) -> Option<Arc<MethodInfo>> {
        match candidate {
            Candidate::Method(m) => Some(Arc::clone(m)),
            _ => None,
        }
    }
}

impl MemberRuleSet for ConstructorRules {
    type Member = ConstructorInfo;

    const KIND: MemberKind = MemberKind::Constructor;

    fn base(&self) -> &BaseRules {
        &self.base
    }

    fn has_conditions(&self) -> bool {
        self.is_initialized()
    }

    fn diagnostic_lines(&self) -> Vec<String> {
        self.templates()
    }

    fn param_rules(&self) -> Option<&ParamRules> {
        Some(&self.params)
    }

    fn compile(&self) -> CompiledRules<'_, ConstructorInfo> {
        let mut c: CompiledRules<'_, ConstructorInfo> = CompiledRules::new(self.base.order);
        c.params(&self.params, |m| m.params.as_slice());
        compile_base(&mut c, &self.base, |m| m.modifiers);
        c
    }

    fn declared(host: &dyn ClassHost, class: &ClassInfo) -> Result<Vec<Arc<ConstructorInfo>>, EnumerationError> {
        host.declared_constructors(class)
    }

    fn wrap(member: Arc<ConstructorInfo>) -> Candidate {
        Candidate::Constructor(member)
    }

    fn unwrap(candidate: &Candidate) -> Option<Arc<ConstructorInfo>> {
        match candidate {
            Candidate::Constructor(c) => Some(Arc::clone(c)),
            _ => None,
        }
    }
}

// --- Class rule sets ----------------------------------------------------------

impl ClassRules {
    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.is_initialized() {
            return Err(ConfigurationError::Uninitialized { kind: MemberKind::Class });
        }
        for nested in &self.method_rules {
            validate_params(MemberKind::Method, &nested.rules.params)?;
        }
        for nested in &self.constructor_rules {
            validate_params(MemberKind::Constructor, &nested.rules.params)?;
        }
        Ok(())
    }

    /// Criteria over candidate classes. Package rules are not compiled here;
    /// they gate class names before any class is loaded.
    pub(crate) fn compile<'r>(&'r self, host: &'r dyn ClassHost) -> CompiledRules<'r, ClassInfo> {
        let mut c: CompiledRules<'r, ClassInfo> = CompiledRules::new(None);
        if let Some(rule) = &self.full_name {
            c.term(rule.optional, move |k| k.name == rule.name);
        }
        if let Some(rule) = &self.simple_name {
            c.term(rule.optional, move |k| k.simple_name() == rule.name);
        }
        if let Some(rule) = &self.single_name {
            c.term(rule.optional, move |k| k.single_name() == rule.name.as_str());
        }
        if let Some(p) = &self.full_name_matching {
            c.term(false, move |k| p.evaluate(&k.name));
        }
        if let Some(p) = &self.simple_name_matching {
            c.term(false, move |k| p.evaluate(k.simple_name()));
        }
        if let Some(p) = &self.single_name_matching {
            c.term(false, move |k| p.evaluate(&k.single_name()));
        }
        c.slot(&self.modifiers, |p, k: &ClassInfo| p.evaluate(&k.modifiers));
        if !self.extends.is_empty() {
            c.term(false, move |k| k.has_extends() && k.superclass.as_ref().is_some_and(|s| self.extends.contains(s)));
        }
        if !self.implements.is_empty() {
            c.term(false, move |k| k.interfaces.iter().any(|i| self.implements.contains(i)));
        }
        if !self.enclosing.is_empty() {
            c.term(false, move |k| k.enclosing.as_ref().is_some_and(|e| self.enclosing.contains(e)));
        }
        if let Some(expected) = self.anonymous {
            c.term(false, move |k| k.anonymous == expected);
        }
        if let Some(expected) = self.no_extends {
            c.term(false, move |k| !k.has_extends() == expected);
        }
        if let Some(expected) = self.no_implements {
            c.term(false, move |k| k.interfaces.is_empty() == expected);
        }
        for nested in &self.member_rules {
            c.term(false, move |k| any_member_count(host, k, nested));
        }
        for nested in &self.field_rules {
            c.term(false, move |k| nested_count(host, k, nested));
        }
        for nested in &self.method_rules {
            c.term(false, move |k| nested_count(host, k, nested));
        }
        for nested in &self.constructor_rules {
            c.term(false, move |k| nested_count(host, k, nested));
        }
        c
    }
}

/// Declared members of `class`, or none when the host refuses to list them.
pub(crate) fn declared_or_empty<R: MemberRuleSet>(host: &dyn ClassHost, class: &ClassInfo) -> Vec<Arc<R::Member>> {
    R::declared(host, class).unwrap_or_else(|err| {
        tracing::warn!(target: LOG_TARGET, "{err}");
        Vec::new()
    })
}

/// A nested rule without slots only checks the member total; a nested rule
/// with slots also needs at least one match.
fn nested_count<R: MemberRuleSet>(host: &dyn ClassHost, class: &ClassInfo, nested: &NestedRules<R>) -> bool {
    let declared = declared_or_empty::<R>(host, class);
    if !nested.rules.has_conditions() {
        return nested.count.accepts(declared.len());
    }
    let found = nested.rules.compile().select(&declared).len();
    found > 0 && nested.count.accepts(found)
}

fn any_member_count(host: &dyn ClassHost, class: &ClassInfo, nested: &NestedRules<AnyMemberRules>) -> bool {
    let mut modifiers: Vec<Arc<Modifiers>> = Vec::new();
    modifiers.extend(declared_or_empty::<FieldRules>(host, class).iter().map(|f| Arc::new(f.modifiers)));
    modifiers.extend(declared_or_empty::<MethodRules>(host, class).iter().map(|m| Arc::new(m.modifiers)));
    modifiers.extend(declared_or_empty::<ConstructorRules>(host, class).iter().map(|c| Arc::new(c.modifiers)));
    if !nested.rules.is_initialized() {
        return nested.count.accepts(modifiers.len());
    }
    let mut compiled: CompiledRules<'_, Modifiers> = CompiledRules::new(None);
    compiled.slot(&nested.rules.modifiers, |p, m: &Modifiers| p.evaluate(m));
    let found = compiled.select(&modifiers).len();
    found > 0 && nested.count.accepts(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ClassDef, ClassPool};
    use crate::model::Modifiers as M;

    fn methods() -> Vec<Arc<MethodInfo>> {
        let mut pool = ClassPool::new();
        let class = pool.define(
            ClassDef::new("com.demo.Foo")
                .method("foo", &[], TypeName::VOID, M::PUBLIC)
                .method("foo", &[TypeName::STRING], TypeName::VOID, M::PUBLIC)
                .method("bar", &[TypeName::STRING], TypeName::INT, M::PUBLIC | M::STATIC)
                .method("foo", &[TypeName::STRING, TypeName::STRING], TypeName::VOID, M::PUBLIC),
        );
        pool.declared_methods(&class).unwrap()
    }

    fn names(found: &[Arc<MethodInfo>]) -> Vec<String> {
        found.iter().map(|m| format!("{}/{}", m.name, m.params.len())).collect()
    }

    #[test]
    fn slots_are_conjunctive() {
        let mut rules = MethodRules::new();
        rules.name("foo");
        rules.param_count(1);
        assert_eq!(names(&rules.compile().select(&methods())), vec!["foo/1"]);
    }

    #[test]
    fn selectors_count_their_own_slot_only() {
        let mut rules = MethodRules::new();
        rules.name("foo").index(-1);
        assert_eq!(names(&rules.compile().select(&methods())), vec!["foo/2"]);

        let mut rules = MethodRules::new();
        rules.param_count(1).index(1);
        assert_eq!(names(&rules.compile().select(&methods())), vec!["bar/1"]);
    }

    #[test]
    fn order_selector_uses_raw_declaration_index() {
        let mut rules = MethodRules::new();
        rules.name("foo");
        rules.order(PositionalSelector::last());
        assert_eq!(names(&rules.compile().select(&methods())), vec!["foo/2"]);

        let mut rules = MethodRules::new();
        rules.name("foo");
        rules.order(PositionalSelector::at(2));
        assert!(rules.compile().select(&methods()).is_empty());
    }

    #[test]
    fn param_types_compare_with_wildcards() {
        let s = TypeName::STRING;
        assert!(param_types_eq(&[ParamType::from(&s), ParamType::Any], &[s.clone(), TypeName::INT]));
        assert!(!param_types_eq(&[ParamType::from(&s)], &[s.clone(), s.clone()]));
        assert!(!param_types_eq(&[ParamType::Any, ParamType::from(TypeName::INT)], &[s.clone(), s.clone()]));
    }

    #[test]
    fn validation_rejects_unusable_param_types() {
        let mut rules = MethodRules::new();
        assert_eq!(rules.validate(), Err(ConfigurationError::Uninitialized { kind: MemberKind::Method }));

        rules.param_types(vec![]);
        assert_eq!(rules.validate(), Err(ConfigurationError::EmptyParamTypes { kind: MemberKind::Method }));

        rules.param_types(vec![ParamType::Any, ParamType::Any, ParamType::Any]);
        assert_eq!(rules.validate(), Err(ConfigurationError::AllWildcardParams { kind: MemberKind::Method, count: 3 }));

        rules.param_types(vec![ParamType::from(TypeName::INT)]);
        rules.param_count(2);
        assert!(matches!(rules.validate(), Err(ConfigurationError::UnsupportedCombination { .. })));

        rules.param_count(1);
        assert_eq!(rules.validate(), Ok(()));
    }
}
