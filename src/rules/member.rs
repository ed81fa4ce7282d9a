//! Field, method and constructor rule sets.
//!
//! Each rule set is a bag of optional slots. Setters overwrite silently and
//! return a [`Positional`] handle for attaching a selector to that slot.

use std::ops::RangeInclusive;

use super::predicates::{ParamType, Predicate};
use super::selector::{Positional, PositionalSelector};
use super::{Slot, set_slot};
use crate::model::{Modifiers, TypeName};

/// Slots shared by every member rule set.
#[derive(Debug, Clone, Default, Hash)]
pub struct BaseRules {
    pub(crate) modifiers: Option<Slot<Predicate<Modifiers>>>,
    /// Selector over the raw declaration index among all declared members.
    pub(crate) order: Option<PositionalSelector>,
    pub(crate) find_in_super: bool,
    /// Skip the target and start the walk at its direct superclass.
    pub(crate) superclass_only: bool,
}

impl BaseRules {
    pub(crate) fn is_initialized(&self) -> bool {
        self.modifiers.is_some()
    }

    pub(crate) fn templates(&self, out: &mut Vec<String>) {
        if let Some(slot) = &self.modifiers {
            out.push(slot.render("modifiers", &slot.value.describe()));
        }
        if let Some(order) = &self.order {
            out.push(format!("order:[{order}]"));
        }
        if self.find_in_super {
            out.push(format!("superclass:[{}]", if self.superclass_only { "only" } else { "true" }));
        }
    }
}

/// Setters every member rule set exposes.
macro_rules! base_rule_setters {
    () => {
        pub fn modifiers(&mut self, predicate: impl Into<Predicate<Modifiers>>) -> Positional<'_> {
            set_slot(&mut self.base.modifiers, predicate.into())
        }

        /// Select by declaration position among all declared members of the
        /// target, independent of which slots matched.
        pub fn order(&mut self, selector: PositionalSelector) {
            self.base.order = Some(selector);
        }

        /// Walk the superclass chain when the target itself declares no match.
        pub fn superclass(&mut self) {
            self.base.find_in_super = true;
        }

        /// Search the superclass chain only, starting at the direct
        /// superclass. A target without a superclass is searched itself.
        pub fn superclass_only(&mut self) {
            self.base.find_in_super = true;
            self.base.superclass_only = true;
        }
    };
}

fn render_range(range: &RangeInclusive<usize>) -> String {
    format!("{}..={}", range.start(), range.end())
}

fn render_params(params: &[ParamType]) -> String {
    params.iter().map(ParamType::to_string).collect::<Vec<_>>().join(", ")
}

// --- Fields -----------------------------------------------------------------

#[derive(Debug, Clone, Default, Hash)]
pub struct FieldRules {
    pub(crate) base: BaseRules,
    pub(crate) name: Option<Slot<String>>,
    pub(crate) name_matching: Option<Slot<Predicate<str>>>,
    pub(crate) ty: Option<Slot<TypeName>>,
    pub(crate) ty_matching: Option<Slot<Predicate<TypeName>>>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    base_rule_setters!();

    pub fn name(&mut self, name: impl Into<String>) -> Positional<'_> {
        set_slot(&mut self.name, name.into())
    }

    pub fn name_matching(&mut self, predicate: impl Into<Predicate<str>>) -> Positional<'_> {
        set_slot(&mut self.name_matching, predicate.into())
    }

    pub fn ty(&mut self, ty: impl Into<TypeName>) -> Positional<'_> {
        set_slot(&mut self.ty, ty.into())
    }

    pub fn ty_matching(&mut self, predicate: Predicate<TypeName>) -> Positional<'_> {
        set_slot(&mut self.ty_matching, predicate)
    }

    pub fn is_initialized(&self) -> bool {
        self.base.is_initialized()
            || self.name.is_some()
            || self.name_matching.is_some()
            || self.ty.is_some()
            || self.ty_matching.is_some()
    }

    pub fn templates(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(slot) = &self.name {
            out.push(slot.render("name", &slot.value));
        }
        if let Some(slot) = &self.name_matching {
            out.push(slot.render("nameConditions", &slot.value.describe()));
        }
        if let Some(slot) = &self.ty {
            out.push(slot.render("type", slot.value.as_str()));
        }
        if let Some(slot) = &self.ty_matching {
            out.push(slot.render("typeConditions", &slot.value.describe()));
        }
        self.base.templates(&mut out);
        out
    }
}

// --- Methods ----------------------------------------------------------------

#[derive(Debug, Clone, Default, Hash)]
pub struct MethodRules {
    pub(crate) base: BaseRules,
    pub(crate) name: Option<Slot<String>>,
    pub(crate) name_matching: Option<Slot<Predicate<str>>>,
    pub(crate) params: ParamRules,
    pub(crate) return_type: Option<Slot<TypeName>>,
    pub(crate) return_type_matching: Option<Slot<Predicate<TypeName>>>,
}

impl MethodRules {
    pub fn new() -> Self {
        Self::default()
    }

    base_rule_setters!();

    pub fn name(&mut self, name: impl Into<String>) -> Positional<'_> {
        set_slot(&mut self.name, name.into())
    }

    pub fn name_matching(&mut self, predicate: impl Into<Predicate<str>>) -> Positional<'_> {
        set_slot(&mut self.name_matching, predicate.into())
    }

    pub fn param_count(&mut self, count: usize) -> Positional<'_> {
        set_slot(&mut self.params.count, count)
    }

    pub fn empty_params(&mut self) -> Positional<'_> {
        self.param_count(0)
    }

    pub fn param_count_range(&mut self, range: RangeInclusive<usize>) -> Positional<'_> {
        set_slot(&mut self.params.count_range, range)
    }

    pub fn param_count_matching(&mut self, predicate: Predicate<usize>) -> Positional<'_> {
        set_slot(&mut self.params.count_matching, predicate)
    }

    /// Exact parameter list; use [`ParamType::Any`] (or `_` in [`params!`])
    /// for positions that may be anything.
    pub fn param_types(&mut self, types: Vec<ParamType>) -> Positional<'_> {
        set_slot(&mut self.params.types, types)
    }

    pub fn param_types_matching(&mut self, predicate: Predicate<[TypeName]>) -> Positional<'_> {
        set_slot(&mut self.params.types_matching, predicate)
    }

    pub fn return_type(&mut self, ty: impl Into<TypeName>) -> Positional<'_> {
        set_slot(&mut self.return_type, ty.into())
    }

    pub fn return_type_matching(&mut self, predicate: Predicate<TypeName>) -> Positional<'_> {
        set_slot(&mut self.return_type_matching, predicate)
    }

    pub fn is_initialized(&self) -> bool {
        self.base.is_initialized()
            || self.name.is_some()
            || self.name_matching.is_some()
            || self.params.is_initialized()
            || self.return_type.is_some()
            || self.return_type_matching.is_some()
    }

    pub fn templates(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(slot) = &self.name {
            out.push(slot.render("name", &slot.value));
        }
        if let Some(slot) = &self.name_matching {
            out.push(slot.render("nameConditions", &slot.value.describe()));
        }
        self.params.templates(&mut out);
        if let Some(slot) = &self.return_type {
            out.push(slot.render("returnType", slot.value.as_str()));
        }
        if let Some(slot) = &self.return_type_matching {
            out.push(slot.render("returnTypeConditions", &slot.value.describe()));
        }
        self.base.templates(&mut out);
        out
    }
}

// --- Constructors -----------------------------------------------------------

#[derive(Debug, Clone, Default, Hash)]
pub struct ConstructorRules {
    pub(crate) base: BaseRules,
    pub(crate) params: ParamRules,
}

impl ConstructorRules {
    pub fn new() -> Self {
        Self::default()
    }

    base_rule_setters!();

    pub fn param_count(&mut self, count: usize) -> Positional<'_> {
        set_slot(&mut self.params.count, count)
    }

    pub fn empty_params(&mut self) -> Positional<'_> {
        self.param_count(0)
    }

    pub fn param_count_range(&mut self, range: RangeInclusive<usize>) -> Positional<'_> {
        set_slot(&mut self.params.count_range, range)
    }

    pub fn param_count_matching(&mut self, predicate: Predicate<usize>) -> Positional<'_> {
        set_slot(&mut self.params.count_matching, predicate)
    }

    pub fn param_types(&mut self, types: Vec<ParamType>) -> Positional<'_> {
        set_slot(&mut self.params.types, types)
    }

    pub fn param_types_matching(&mut self, predicate: Predicate<[TypeName]>) -> Positional<'_> {
        set_slot(&mut self.params.types_matching, predicate)
    }

    pub fn is_initialized(&self) -> bool {
        self.base.is_initialized() || self.params.is_initialized()
    }

    pub fn templates(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.params.templates(&mut out);
        self.base.templates(&mut out);
        out
    }
}

/// Parameter slots shared by methods and constructors.
#[derive(Debug, Clone, Default, Hash)]
pub(crate) struct ParamRules {
    pub(crate) count: Option<Slot<usize>>,
    pub(crate) count_range: Option<Slot<RangeInclusive<usize>>>,
    pub(crate) count_matching: Option<Slot<Predicate<usize>>>,
    pub(crate) types: Option<Slot<Vec<ParamType>>>,
    pub(crate) types_matching: Option<Slot<Predicate<[TypeName]>>>,
}

impl ParamRules {
    fn is_initialized(&self) -> bool {
        self.count.is_some()
            || self.count_range.is_some()
            || self.count_matching.is_some()
            || self.types.is_some()
            || self.types_matching.is_some()
    }

    fn templates(&self, out: &mut Vec<String>) {
        if let Some(slot) = &self.count {
            out.push(slot.render("paramCount", &slot.value.to_string()));
        }
        if let Some(slot) = &self.count_range {
            out.push(slot.render("paramCountRange", &render_range(&slot.value)));
        }
        if let Some(slot) = &self.count_matching {
            out.push(slot.render("paramCountConditions", &slot.value.describe()));
        }
        if let Some(slot) = &self.types {
            out.push(slot.render("paramTypes", &render_params(&slot.value)));
        }
        if let Some(slot) = &self.types_matching {
            out.push(slot.render("paramTypesConditions", &slot.value.describe()));
        }
    }
}

// --- Any member -------------------------------------------------------------

/// Rules over every declared member of a class regardless of kind; only
/// usable nested inside class rules.
#[derive(Debug, Clone, Default, Hash)]
pub struct AnyMemberRules {
    pub(crate) modifiers: Option<Slot<Predicate<Modifiers>>>,
}

impl AnyMemberRules {
    pub fn modifiers(&mut self, predicate: impl Into<Predicate<Modifiers>>) -> Positional<'_> {
        set_slot(&mut self.modifiers, predicate.into())
    }

    pub fn is_initialized(&self) -> bool {
        self.modifiers.is_some()
    }

    pub fn templates(&self) -> Vec<String> {
        self.modifiers.iter().map(|slot| slot.render("modifiers", &slot.value.describe())).collect()
    }
}
