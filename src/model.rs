//! Host class model.
//!
//! These are the values the engine reasons about: classes, their declared
//! fields/methods/constructors, JVM type names and access modifiers. The host
//! runtime (see `host.rs`) hands them out as shared `Arc` handles; the engine
//! never mutates them.
//!
//! ```text
//! ClassInfo ──┬─ FieldInfo        (name, type, modifiers)
//!             ├─ MethodInfo       (name, params, return type, modifiers)
//!             └─ ConstructorInfo  (params, modifiers)
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

pub type ClassRef = Arc<ClassInfo>;
pub type FieldRef = Arc<FieldInfo>;
pub type MethodRef = Arc<MethodInfo>;
pub type ConstructorRef = Arc<ConstructorInfo>;

// --- Types ------------------------------------------------------------------

/// A fully-qualified JVM type name, e.g. `int`, `java.lang.String`, `byte[]`.
///
/// Equality is by name, which is how the host runtime identifies a loaded type
/// within one loader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Cow<'static, str>);

impl TypeName {
    pub const VOID: TypeName = TypeName::from_static("void");
    pub const BOOLEAN: TypeName = TypeName::from_static("boolean");
    pub const BYTE: TypeName = TypeName::from_static("byte");
    pub const CHAR: TypeName = TypeName::from_static("char");
    pub const SHORT: TypeName = TypeName::from_static("short");
    pub const INT: TypeName = TypeName::from_static("int");
    pub const LONG: TypeName = TypeName::from_static("long");
    pub const FLOAT: TypeName = TypeName::from_static("float");
    pub const DOUBLE: TypeName = TypeName::from_static("double");
    pub const OBJECT: TypeName = TypeName::from_static("java.lang.Object");
    pub const STRING: TypeName = TypeName::from_static("java.lang.String");
    pub const CHAR_SEQUENCE: TypeName = TypeName::from_static("java.lang.CharSequence");
    pub const CLASS: TypeName = TypeName::from_static("java.lang.Class");

    pub const fn from_static(name: &'static str) -> Self {
        TypeName(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        TypeName(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Array type with this type as its component (`int` -> `int[]`).
    pub fn array(&self) -> TypeName {
        TypeName::new(format!("{}[]", self.0))
    }

    pub fn is_array(&self) -> bool {
        self.0.ends_with("[]")
    }

    pub fn is_primitive(&self) -> bool {
        matches!(&*self.0, "void" | "boolean" | "byte" | "char" | "short" | "int" | "long" | "float" | "double")
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        TypeName::new(value)
    }
}

impl From<String> for TypeName {
    fn from(value: String) -> Self {
        TypeName::new(value)
    }
}

impl From<&ClassInfo> for TypeName {
    fn from(value: &ClassInfo) -> Self {
        TypeName::new(value.name.clone())
    }
}

// --- Modifiers --------------------------------------------------------------

bitflags::bitflags! {
    /// JVM access flags, using the class-file bit values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const PUBLIC       = 0x0001;
        const PRIVATE      = 0x0002;
        const PROTECTED    = 0x0004;
        const STATIC       = 0x0008;
        const FINAL        = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE     = 0x0040;
        const TRANSIENT    = 0x0080;
        const NATIVE       = 0x0100;
        const INTERFACE    = 0x0200;
        const ABSTRACT     = 0x0400;
        const STRICT       = 0x0800;
        const SYNTHETIC    = 0x1000;
    }
}

const MODIFIER_KEYWORDS: &[(Modifiers, &str)] = &[
    (Modifiers::PUBLIC, "public"),
    (Modifiers::PROTECTED, "protected"),
    (Modifiers::PRIVATE, "private"),
    (Modifiers::ABSTRACT, "abstract"),
    (Modifiers::STATIC, "static"),
    (Modifiers::FINAL, "final"),
    (Modifiers::TRANSIENT, "transient"),
    (Modifiers::VOLATILE, "volatile"),
    (Modifiers::SYNCHRONIZED, "synchronized"),
    (Modifiers::NATIVE, "native"),
    (Modifiers::STRICT, "strictfp"),
    (Modifiers::INTERFACE, "interface"),
    (Modifiers::SYNTHETIC, "synthetic"),
];

impl Modifiers {
    /// Parse a single Java modifier keyword (`"public"`, `"static"`, ...).
    pub fn from_keyword(keyword: &str) -> Option<Modifiers> {
        MODIFIER_KEYWORDS.iter().find(|(_, kw)| kw.eq_ignore_ascii_case(keyword)).map(|(m, _)| *m)
    }

    /// Keywords in canonical Java order.
    pub fn keywords(&self) -> Vec<&'static str> {
        MODIFIER_KEYWORDS.iter().filter(|(m, _)| self.contains(*m)).map(|(_, kw)| *kw).collect()
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keywords().join(" "))
    }
}

// --- Classes and members ----------------------------------------------------

/// A loaded class as reported by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassInfo {
    /// Binary name, e.g. `com.demo.Outer$Inner`.
    pub name: String,
    pub modifiers: Modifiers,
    /// `None` for `java.lang.Object`, interfaces and primitives.
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub enclosing: Option<String>,
    pub anonymous: bool,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>) -> Self {
        ClassInfo {
            name: name.into(),
            modifiers: Modifiers::PUBLIC,
            superclass: Some(TypeName::OBJECT.as_str().to_string()),
            interfaces: Vec::new(),
            enclosing: None,
            anonymous: false,
        }
    }

    /// Package part of the binary name (`com.demo.Test` -> `com.demo`).
    ///
    /// A class in the default package returns its own name, which keeps
    /// package gating for such classes equivalent to matching the name.
    pub fn package(&self) -> &str {
        package_of(&self.name)
    }

    /// Java `Class.getSimpleName()`: the part after the last `.` and, for
    /// nested classes, after the enclosing class prefix. Anonymous classes
    /// have an empty simple name.
    pub fn simple_name(&self) -> &str {
        if self.anonymous {
            return "";
        }
        if let Some(enclosing) = &self.enclosing {
            if let Some(rest) = self.name.strip_prefix(enclosing.as_str()) {
                return rest.trim_start_matches('$');
            }
        }
        match self.name.rfind('.') {
            Some(idx) => &self.name[idx + 1..],
            None => &self.name,
        }
    }

    /// Simple name, or for anonymous classes the enclosing simple name plus
    /// the binary suffix (`Outer$1`).
    pub fn single_name(&self) -> Cow<'_, str> {
        let simple = self.simple_name();
        if !simple.is_empty() {
            return Cow::Borrowed(simple);
        }
        match &self.enclosing {
            Some(enclosing) => {
                let outer = enclosing.rsplit(['.', '$']).next().unwrap_or(enclosing);
                let suffix = self.name.strip_prefix(enclosing.as_str()).unwrap_or("");
                Cow::Owned(format!("{outer}{suffix}"))
            }
            None => Cow::Borrowed(""),
        }
    }

    /// True when the class extends something other than `java.lang.Object`.
    pub fn has_extends(&self) -> bool {
        self.superclass.as_deref().is_some_and(|s| s != TypeName::OBJECT.as_str())
    }
}

impl fmt::Display for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Package of a binary class name; names without a `.` are their own package.
pub fn package_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldInfo {
    pub declaring: String,
    pub name: String,
    pub ty: TypeName,
    pub modifiers: Modifiers,
}

impl fmt::Display for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}", self.ty, self.declaring, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodInfo {
    pub declaring: String,
    pub name: String,
    pub params: Vec<TypeName>,
    pub return_type: TypeName,
    pub modifiers: Modifiers,
}

impl fmt::Display for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}({})", self.return_type, self.declaring, self.name, join_types(&self.params))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstructorInfo {
    pub declaring: String,
    pub params: Vec<TypeName>,
    pub modifiers: Modifiers,
}

impl fmt::Display for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.declaring, join_types(&self.params))
    }
}

pub(crate) fn join_types(types: &[TypeName]) -> String {
    types.iter().map(TypeName::as_str).collect::<Vec<_>>().join(", ")
}

/// A class or member considered during one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Candidate {
    Class(ClassRef),
    Field(FieldRef),
    Method(MethodRef),
    Constructor(ConstructorRef),
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Class(c) => write!(f, "class {c}"),
            Candidate::Field(m) => write!(f, "field {m}"),
            Candidate::Method(m) => write!(f, "method {m}"),
            Candidate::Constructor(m) => write!(f, "constructor {m}"),
        }
    }
}
