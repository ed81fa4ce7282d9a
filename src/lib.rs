//! Rule-based member resolution over a host class model.
//!
//! Describe a field, method, constructor or class by its shape (name, types,
//! modifiers, position among matches) and let a [`Reflector`] find it in a
//! [`ClassHost`]. Results are cached per host and rule set, failures carry a
//! diagnostic template, and a [`RemedyPlan`] can try alternative rules.
//!
//! ```
//! use std::sync::Arc;
//! use memberfind::{ClassDef, ClassPool, Modifiers, Reflector, TypeName, params};
//!
//! let mut pool = ClassPool::new();
//! pool.define(
//!     ClassDef::new("com.demo.Foo")
//!         .method("foo", &[], TypeName::VOID, Modifiers::PUBLIC)
//!         .method("foo", &[TypeName::STRING], TypeName::VOID, Modifiers::PUBLIC)
//!         .method("foo", &[TypeName::STRING, TypeName::STRING], TypeName::VOID, Modifiers::PUBLIC),
//! );
//! let reflector = Reflector::new(Arc::new(pool));
//!
//! let last = reflector.method("com.demo.Foo", |r| { r.name("foo").last(); }).unwrap();
//! assert_eq!(last.first().unwrap().params.len(), 2);
//!
//! let typed = reflector.method("com.demo.Foo", |r| { r.param_types(params![_, TypeName::STRING]); }).unwrap();
//! assert_eq!(typed.all().len(), 1);
//! ```

#[macro_use]
mod macros;
mod api;
mod cache;
mod deferred;
mod dispatch;
mod engine;
mod error;
mod host;
mod model;
mod remedy;
mod rules;

pub use api::{ClassResult, DEBUG_ENV, MemberResult, Options, Pending, Reflector, Target};
pub use cache::{CacheStats, ReflectCache};
pub use deferred::{Deferred, Resolver, deferred};
pub use dispatch::ResolveWorker;
pub use engine::{Fingerprint, LOG_TARGET, ResolveMetrics};
pub use error::{ConfigurationError, EnumerationError, FindError, MemberKind, NotFoundError};
pub use host::{ClassDef, ClassHost, ClassPool, PoolLoadError};
pub use model::{
    Candidate, ClassInfo, ClassRef, ConstructorInfo, ConstructorRef, FieldInfo, FieldRef, MethodInfo, MethodRef,
    Modifiers, TypeName, package_of,
};
pub use remedy::RemedyPlan;
pub use rules::{
    AnyMemberRules, ClassRules, ConstructorRules, FieldRules, MatchCount, Matcher, MethodRules, ModifierMatcher,
    NameMatcher, NameRule, NestedRules, PackageRule, ParamType, Positional, PositionalSelector, Predicate,
};
