//! Host runtime seam.
//!
//! Class loading is not this crate's job: the engine asks a [`ClassHost`] for
//! classes by name, for the full list of class names a loader can see, and for
//! the members a class declares directly. [`ClassPool`] is an in-memory host
//! used by the CLI and the tests; real hosts wrap a VM or a dex/class-file
//! index.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::error::EnumerationError;
use crate::model::{
    ClassInfo, ClassRef, ConstructorInfo, ConstructorRef, FieldInfo, FieldRef, MethodInfo, MethodRef, Modifiers,
    TypeName,
};

/// The host runtime as seen by the resolution engine.
///
/// Member lists must come back in a stable enumeration order for a given
/// class; positional selectors are defined against that order.
pub trait ClassHost: Send + Sync {
    /// Identity of the loader, used in cache fingerprints.
    fn identity(&self) -> u64;

    /// How the loader appears in diagnostics.
    fn label(&self) -> String {
        format!("loader@{:x}", self.identity())
    }

    fn find_class(&self, name: &str) -> Option<ClassRef>;

    /// Every class name visible to this loader.
    fn class_names(&self) -> Result<Vec<String>, EnumerationError>;

    fn declared_fields(&self, class: &ClassInfo) -> Result<Vec<FieldRef>, EnumerationError>;

    fn declared_methods(&self, class: &ClassInfo) -> Result<Vec<MethodRef>, EnumerationError>;

    fn declared_constructors(&self, class: &ClassInfo) -> Result<Vec<ConstructorRef>, EnumerationError>;

    fn superclass(&self, class: &ClassInfo) -> Option<ClassRef> {
        class.superclass.as_deref().and_then(|name| self.find_class(name))
    }
}

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct ClassEntry {
    class: ClassRef,
    fields: Vec<FieldRef>,
    methods: Vec<MethodRef>,
    constructors: Vec<ConstructorRef>,
    /// Host refuses to list members of this class.
    opaque: bool,
}

/// In-memory class graph implementing [`ClassHost`].
#[derive(Debug)]
pub struct ClassPool {
    id: u64,
    classes: FxHashMap<String, ClassEntry>,
    /// Definition order; `class_names` reports classes in this order.
    order: Vec<String>,
    listing_refused: bool,
}

impl Default for ClassPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassPool {
    pub fn new() -> Self {
        ClassPool {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            classes: FxHashMap::default(),
            order: Vec::new(),
            listing_refused: false,
        }
    }

    /// Add (or replace) a class definition.
    pub fn define(&mut self, def: ClassDef) -> ClassRef {
        let ClassDef { class, fields, methods, constructors, opaque } = def;
        let class = Arc::new(class);
        let name = class.name.clone();
        let entry = ClassEntry {
            class: Arc::clone(&class),
            fields: fields
                .into_iter()
                .map(|(field_name, ty, modifiers)| {
                    Arc::new(FieldInfo { declaring: name.clone(), name: field_name, ty, modifiers })
                })
                .collect(),
            methods: methods
                .into_iter()
                .map(|(method_name, params, return_type, modifiers)| {
                    Arc::new(MethodInfo { declaring: name.clone(), name: method_name, params, return_type, modifiers })
                })
                .collect(),
            constructors: constructors
                .into_iter()
                .map(|(params, modifiers)| Arc::new(ConstructorInfo { declaring: name.clone(), params, modifiers }))
                .collect(),
            opaque,
        };
        if self.classes.insert(name.clone(), entry).is_none() {
            self.order.push(name);
        }
        class
    }

    /// Make `class_names` fail, like a loader whose shape cannot be listed.
    pub fn refuse_listing(&mut self) {
        self.listing_refused = true;
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn entry(&self, class: &ClassInfo, what: &'static str) -> Result<&ClassEntry, EnumerationError> {
        let entry =
            self.classes.get(&class.name).ok_or_else(|| EnumerationError::new(&class.name, what, "class not loaded"))?;
        if entry.opaque {
            return Err(EnumerationError::new(&class.name, what, "member listing refused by host"));
        }
        Ok(entry)
    }

    /// Load a pool from its JSON description.
    ///
    /// ```json
    /// { "classes": [ { "name": "com.demo.Foo", "superclass": "com.demo.Base",
    ///     "methods": [ { "name": "foo", "params": ["java.lang.String"] } ] } ] }
    /// ```
    pub fn from_json(text: &str) -> Result<ClassPool, PoolLoadError> {
        let model: PoolModel = serde_json::from_str(text)?;
        let mut pool = ClassPool::new();
        for class in model.classes {
            pool.define(class.into_def()?);
        }
        Ok(pool)
    }
}

impl ClassHost for ClassPool {
    fn identity(&self) -> u64 {
        self.id
    }

    fn label(&self) -> String {
        format!("ClassPool#{}", self.id)
    }

    fn find_class(&self, name: &str) -> Option<ClassRef> {
        self.classes.get(name).map(|e| Arc::clone(&e.class))
    }

    fn class_names(&self) -> Result<Vec<String>, EnumerationError> {
        if self.listing_refused {
            return Err(EnumerationError::new(self.label(), "classes", "loader is not listable"));
        }
        Ok(self.order.clone())
    }

    fn declared_fields(&self, class: &ClassInfo) -> Result<Vec<FieldRef>, EnumerationError> {
        Ok(self.entry(class, "fields")?.fields.clone())
    }

    fn declared_methods(&self, class: &ClassInfo) -> Result<Vec<MethodRef>, EnumerationError> {
        Ok(self.entry(class, "methods")?.methods.clone())
    }

    fn declared_constructors(&self, class: &ClassInfo) -> Result<Vec<ConstructorRef>, EnumerationError> {
        Ok(self.entry(class, "constructors")?.constructors.clone())
    }
}

// --- Class definitions ------------------------------------------------------

/// Builder for one class in a [`ClassPool`].
#[derive(Debug, Clone)]
pub struct ClassDef {
    class: ClassInfo,
    fields: Vec<(String, TypeName, Modifiers)>,
    methods: Vec<(String, Vec<TypeName>, TypeName, Modifiers)>,
    constructors: Vec<(Vec<TypeName>, Modifiers)>,
    opaque: bool,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        ClassDef {
            class: ClassInfo::new(name),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            opaque: false,
        }
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.class.modifiers = modifiers;
        self
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.class.superclass = Some(superclass.into());
        self
    }

    /// Root of a hierarchy (`java.lang.Object` itself, interfaces).
    pub fn no_superclass(mut self) -> Self {
        self.class.superclass = None;
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.class.interfaces.push(interface.into());
        self
    }

    pub fn enclosed_by(mut self, enclosing: impl Into<String>) -> Self {
        self.class.enclosing = Some(enclosing.into());
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.class.anonymous = true;
        self
    }

    /// Declared members of this class cannot be listed.
    pub fn opaque(mut self) -> Self {
        self.opaque = true;
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: TypeName, modifiers: Modifiers) -> Self {
        self.fields.push((name.into(), ty, modifiers));
        self
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        params: &[TypeName],
        return_type: TypeName,
        modifiers: Modifiers,
    ) -> Self {
        self.methods.push((name.into(), params.to_vec(), return_type, modifiers));
        self
    }

    pub fn constructor(mut self, params: &[TypeName], modifiers: Modifiers) -> Self {
        self.constructors.push((params.to_vec(), modifiers));
        self
    }
}

// --- JSON model -------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PoolLoadError {
    #[error("invalid class model: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown modifier '{modifier}' on {owner}")]
    UnknownModifier { owner: String, modifier: String },
}

#[derive(Debug, Deserialize)]
struct PoolModel {
    classes: Vec<ClassModel>,
}

fn object_superclass() -> Option<String> {
    Some(TypeName::OBJECT.as_str().to_string())
}

fn void_type() -> String {
    TypeName::VOID.as_str().to_string()
}

#[derive(Debug, Deserialize)]
struct ClassModel {
    name: String,
    #[serde(default)]
    modifiers: Vec<String>,
    #[serde(default = "object_superclass")]
    superclass: Option<String>,
    #[serde(default)]
    interfaces: Vec<String>,
    #[serde(default)]
    enclosing: Option<String>,
    #[serde(default)]
    anonymous: bool,
    #[serde(default)]
    fields: Vec<FieldModel>,
    #[serde(default)]
    methods: Vec<MethodModel>,
    #[serde(default)]
    constructors: Vec<ConstructorModel>,
}

#[derive(Debug, Deserialize)]
struct FieldModel {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    modifiers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MethodModel {
    name: String,
    #[serde(default)]
    params: Vec<String>,
    #[serde(default = "void_type")]
    returns: String,
    #[serde(default)]
    modifiers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ConstructorModel {
    #[serde(default)]
    params: Vec<String>,
    #[serde(default)]
    modifiers: Vec<String>,
}

fn parse_modifiers(owner: &str, keywords: &[String]) -> Result<Modifiers, PoolLoadError> {
    keywords.iter().try_fold(Modifiers::empty(), |acc, kw| {
        Modifiers::from_keyword(kw)
            .map(|m| acc | m)
            .ok_or_else(|| PoolLoadError::UnknownModifier { owner: owner.to_string(), modifier: kw.clone() })
    })
}

fn to_types(names: Vec<String>) -> Vec<TypeName> {
    names.into_iter().map(TypeName::from).collect()
}

impl ClassModel {
    fn into_def(self) -> Result<ClassDef, PoolLoadError> {
        let mut def = ClassDef::new(self.name.clone()).modifiers(parse_modifiers(&self.name, &self.modifiers)?);
        def.class.superclass = self.superclass;
        def.class.interfaces = self.interfaces;
        def.class.enclosing = self.enclosing;
        def.class.anonymous = self.anonymous;
        for field in self.fields {
            let owner = format!("{}.{}", self.name, field.name);
            let modifiers = parse_modifiers(&owner, &field.modifiers)?;
            def = def.field(field.name, TypeName::from(field.ty), modifiers);
        }
        for method in self.methods {
            let owner = format!("{}.{}()", self.name, method.name);
            let modifiers = parse_modifiers(&owner, &method.modifiers)?;
            def = def.method(method.name, &to_types(method.params), TypeName::from(method.returns), modifiers);
        }
        for ctor in self.constructors {
            let modifiers = parse_modifiers(&format!("{}.<init>", self.name), &ctor.modifiers)?;
            def = def.constructor(&to_types(ctor.params), modifiers);
        }
        Ok(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_reports_members_in_definition_order() {
        let mut pool = ClassPool::new();
        pool.define(
            ClassDef::new("com.demo.Foo")
                .field("a", TypeName::INT, Modifiers::PRIVATE)
                .field("b", TypeName::STRING, Modifiers::PRIVATE),
        );
        let class = pool.find_class("com.demo.Foo").unwrap();
        let names: Vec<String> = pool.declared_fields(&class).unwrap().iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(pool.class_names().unwrap(), vec!["com.demo.Foo"]);
    }

    #[test]
    fn opaque_class_refuses_member_listing() {
        let mut pool = ClassPool::new();
        let class = pool.define(ClassDef::new("com.demo.Sealed").opaque());
        let err = pool.declared_methods(&class).unwrap_err();
        assert_eq!(err.what, "methods");
        assert_eq!(err.target, "com.demo.Sealed");
    }

    #[test]
    fn loads_json_model() {
        let json = r#"{
            "classes": [
                { "name": "com.demo.Base", "modifiers": ["public", "abstract"] },
                { "name": "com.demo.Foo", "superclass": "com.demo.Base",
                  "fields": [ { "name": "count", "type": "int", "modifiers": ["private", "static"] } ],
                  "methods": [ { "name": "foo", "params": ["java.lang.String"] } ],
                  "constructors": [ { "params": [] } ] },
                { "name": "java.lang.Object", "superclass": null }
            ]
        }"#;
        let pool = ClassPool::from_json(json).unwrap();
        assert_eq!(pool.len(), 3);

        let foo = pool.find_class("com.demo.Foo").unwrap();
        assert_eq!(pool.superclass(&foo).unwrap().name, "com.demo.Base");
        let method = &pool.declared_methods(&foo).unwrap()[0];
        assert_eq!(method.return_type, TypeName::VOID);
        assert_eq!(method.params, vec![TypeName::STRING]);
        let field = &pool.declared_fields(&foo).unwrap()[0];
        assert_eq!(field.modifiers, Modifiers::PRIVATE | Modifiers::STATIC);
        assert!(pool.find_class("java.lang.Object").unwrap().superclass.is_none());
    }

    #[test]
    fn rejects_unknown_modifier() {
        let json = r#"{ "classes": [ { "name": "X", "modifiers": ["sealed"] } ] }"#;
        assert!(matches!(ClassPool::from_json(json), Err(PoolLoadError::UnknownModifier { .. })));
    }
}
