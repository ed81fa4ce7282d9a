use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::api::{Options, Reflector};
use crate::cache::ReflectCache;
use crate::error::{ConfigurationError, EnumerationError, MemberKind};
use crate::host::{ClassDef, ClassHost, ClassPool};
use crate::model::{ClassInfo, ClassRef, ConstructorRef, FieldRef, MethodInfo, MethodRef, Modifiers as M, TypeName};
use crate::rules::{MethodRules, NameMatcher, PositionalSelector};

const QUIET: Options = Options { log_failures: false, debug_timing: false };

fn fixture() -> ClassPool {
    let s = TypeName::STRING;
    let mut pool = ClassPool::new();
    pool.define(ClassDef::new("java.lang.Object").no_superclass());
    pool.define(
        ClassDef::new("com.demo.Base")
            .modifiers(M::PUBLIC | M::ABSTRACT)
            .field("shared", TypeName::INT, M::PROTECTED)
            .method("baseOnly", &[], TypeName::VOID, M::PROTECTED),
    );
    pool.define(
        ClassDef::new("com.demo.Foo")
            .extends("com.demo.Base")
            .implements("java.lang.Runnable")
            .field("a", TypeName::INT, M::PRIVATE)
            .field("b", s.clone(), M::PRIVATE)
            .field("c", TypeName::INT, M::PUBLIC | M::STATIC)
            .method("foo", &[], TypeName::VOID, M::PUBLIC)
            .method("foo", &[s.clone()], TypeName::VOID, M::PUBLIC)
            .method("foo", &[s.clone(), s.clone()], TypeName::VOID, M::PUBLIC)
            .method("bar", &[s.clone()], TypeName::INT, M::PUBLIC | M::STATIC)
            .method("mix", &[s.clone(), TypeName::OBJECT, TypeName::INT], TypeName::VOID, M::PRIVATE)
            .constructor(&[], M::PUBLIC)
            .constructor(&[s.clone()], M::PRIVATE),
    );
    pool.define(ClassDef::new("com.demo.Foo$Inner").enclosed_by("com.demo.Foo").modifiers(M::PUBLIC | M::STATIC));
    pool.define(
        ClassDef::new("com.demo.Foo$1")
            .enclosed_by("com.demo.Foo")
            .anonymous()
            .extends("com.demo.Base")
            .method("run", &[], TypeName::VOID, M::PUBLIC),
    );
    pool.define(ClassDef::new("com.demo.sub.Helper").method("help", &[], TypeName::VOID, M::PUBLIC | M::STATIC));
    pool.define(ClassDef::new("org.other.Thing").field("a", TypeName::INT, M::PRIVATE));
    pool
}

fn reflector() -> Reflector {
    Reflector::new(Arc::new(fixture())).options(QUIET)
}

fn sigs(found: &[Arc<MethodInfo>]) -> Vec<String> {
    found.iter().map(|m| format!("{}/{}", m.name, m.params.len())).collect()
}

fn names(found: &[Arc<ClassInfo>]) -> Vec<&str> {
    found.iter().map(|c| c.name.as_str()).collect()
}

// --- Member lookups -----------------------------------------------------------

#[test]
fn exact_name_finds_one_field() {
    let found = reflector()
        .field("com.demo.Foo", |r| {
            r.name("b");
        })
        .unwrap();
    assert_eq!(found.all().len(), 1);
    assert_eq!(found.first().unwrap().ty, TypeName::STRING);
}

#[test]
fn same_name_overloads_are_told_apart_by_params() {
    let r = reflector();
    let all = r
        .method("com.demo.Foo", |r| {
            r.name("foo");
        })
        .unwrap();
    assert_eq!(sigs(all.all()), vec!["foo/0", "foo/1", "foo/2"]);

    let one = r
        .method("com.demo.Foo", |r| {
            r.name("foo");
            r.param_types(params![TypeName::STRING]);
        })
        .unwrap();
    assert_eq!(sigs(one.all()), vec!["foo/1"]);

    let two = r
        .method("com.demo.Foo", |r| {
            r.name("foo");
            r.param_count(2);
        })
        .unwrap();
    assert_eq!(sigs(two.all()), vec!["foo/2"]);
}

#[test]
fn non_negative_index_picks_nth_match_of_that_slot() {
    let found = reflector()
        .method("com.demo.Foo", |r| {
            r.param_count(1).index(1);
        })
        .unwrap();
    assert_eq!(sigs(found.all()), vec!["bar/1"]);
}

#[test]
fn negative_index_counts_from_the_end() {
    let r = reflector();
    let pick = |selector: PositionalSelector| {
        let found = r
            .method("com.demo.Foo", |r| {
                r.name("foo").select(selector);
            })
            .unwrap();
        sigs(found.all())
    };
    assert_eq!(pick(PositionalSelector::at(-1)), vec!["foo/2"]);
    assert_eq!(pick(PositionalSelector::at(-2)), vec!["foo/1"]);
    assert_eq!(pick(PositionalSelector::last()), vec!["foo/2"]);
    assert_eq!(pick(PositionalSelector::first()), vec!["foo/0"]);
}

#[test]
fn out_of_range_index_is_not_found() {
    let found = reflector()
        .method("com.demo.Foo", |r| {
            r.name("foo").index(5);
        })
        .unwrap();
    assert!(!found.is_found());
    let found = found.ignore_errors();
    assert!(found.all().is_empty());
}

#[test]
fn wildcard_param_types_match_any_position() {
    let found = reflector()
        .method("com.demo.Foo", |r| {
            r.param_types(params![TypeName::STRING, _, TypeName::INT]);
        })
        .unwrap();
    assert_eq!(sigs(found.all()), vec!["mix/3"]);
}

#[test]
fn all_wildcard_param_types_are_a_configuration_error() {
    let err = reflector()
        .method("com.demo.Foo", |r| {
            r.param_types(params![_, _, _]);
        })
        .unwrap_err();
    assert_eq!(err, ConfigurationError::AllWildcardParams { kind: MemberKind::Method, count: 3 });
}

#[test]
fn empty_rules_are_a_configuration_error() {
    let err = reflector().constructor("com.demo.Foo", |_| {}).unwrap_err();
    assert_eq!(err, ConfigurationError::Uninitialized { kind: MemberKind::Constructor });
}

#[test]
fn modifiers_and_order_select_constructors_and_methods() {
    let r = reflector();
    let ctor = r
        .constructor("com.demo.Foo", |r| {
            r.modifiers(M::PRIVATE);
        })
        .unwrap();
    assert_eq!(ctor.first().unwrap().params, vec![TypeName::STRING]);

    let first_public = r
        .method("com.demo.Foo", |r| {
            r.modifiers(M::PUBLIC);
            r.order(PositionalSelector::first());
        })
        .unwrap();
    assert_eq!(sigs(first_public.all()), vec!["foo/0"]);
}

#[test]
fn name_conditions_filter_fields() {
    let found = reflector()
        .field("com.demo.Foo", |r| {
            r.name_matching(NameMatcher::new().length(1).only_lowercase());
            r.ty(TypeName::INT).last();
        })
        .unwrap();
    assert_eq!(found.first().unwrap().name, "c");
}

// --- Superclass fallback ------------------------------------------------------

#[test]
fn superclass_fallback_only_when_requested() {
    let r = reflector();
    let own = r
        .method("com.demo.Foo", |r| {
            r.name("baseOnly");
        })
        .unwrap()
        .ignore_errors();
    assert!(!own.is_found());

    let inherited = r
        .method("com.demo.Foo", |r| {
            r.name("baseOnly");
            r.superclass();
        })
        .unwrap();
    assert_eq!(inherited.first().unwrap().declaring, "com.demo.Base");
    assert_eq!(inherited.metrics().superclass_hops, 1);
    // Stored under the target and under the declaring ancestor.
    assert_eq!(r.cache().stats().entries, 2);
}

#[test]
fn superclass_walk_stops_at_object() {
    let found = reflector()
        .method("com.demo.Foo", |r| {
            r.name("hashCode");
            r.superclass();
        })
        .unwrap()
        .ignore_errors();
    assert!(!found.is_found());
    assert_eq!(found.metrics().superclass_hops, 1);
}

#[test]
fn cyclic_hierarchy_terminates() {
    let mut pool = ClassPool::new();
    pool.define(ClassDef::new("x.A").extends("x.B"));
    pool.define(ClassDef::new("x.B").extends("x.A"));
    let found = Reflector::new(Arc::new(pool))
        .options(QUIET)
        .field("x.A", |r| {
            r.name("missing");
            r.superclass();
        })
        .unwrap()
        .ignore_errors();
    assert!(!found.is_found());
    assert_eq!(found.metrics().superclass_hops, 1);
}

#[test]
fn superclass_only_skips_the_target() {
    let mut pool = ClassPool::new();
    pool.define(ClassDef::new("x.Parent").method("run", &[], TypeName::VOID, M::PUBLIC));
    pool.define(ClassDef::new("x.Child").extends("x.Parent").method("run", &[], TypeName::VOID, M::PUBLIC));
    let r = Reflector::new(Arc::new(pool)).options(QUIET);

    let own = r
        .method("x.Child", |r| {
            r.name("run");
            r.superclass();
        })
        .unwrap();
    assert_eq!(own.first().unwrap().declaring, "x.Child");

    let parent = r
        .method("x.Child", |r| {
            r.name("run");
            r.superclass_only();
        })
        .unwrap();
    assert_eq!(parent.first().unwrap().declaring, "x.Parent");
    assert_eq!(parent.metrics().superclass_hops, 1);

    // No ancestor entry: that key would mean "start above x.Parent".
    assert_eq!(r.cache().stats().entries, 2);
    let from_parent = r
        .method("x.Parent", |r| {
            r.name("run");
            r.superclass_only();
        })
        .unwrap();
    assert_eq!(from_parent.first().unwrap().declaring, "x.Parent");
    assert!(!from_parent.metrics().cache_hit);
}

#[test]
fn superclass_only_without_a_parent_searches_the_target() {
    let found = reflector()
        .field("org.other.Thing", |r| {
            r.name("a");
            r.superclass_only();
        })
        .unwrap();
    assert_eq!(found.first().unwrap().declaring, "org.other.Thing");
    assert_eq!(found.metrics().superclass_hops, 0);
}

/// Only reaches `com.demo.Base` through `superclass`, never by name.
struct ParentsByLink {
    inner: ClassPool,
}

impl ClassHost for ParentsByLink {
    fn identity(&self) -> u64 {
        self.inner.identity()
    }

    fn find_class(&self, name: &str) -> Option<ClassRef> {
        if name == "com.demo.Base" { None } else { self.inner.find_class(name) }
    }

    fn class_names(&self) -> Result<Vec<String>, EnumerationError> {
        self.inner.class_names()
    }

    fn declared_fields(&self, class: &ClassInfo) -> Result<Vec<FieldRef>, EnumerationError> {
        self.inner.declared_fields(class)
    }

    fn declared_methods(&self, class: &ClassInfo) -> Result<Vec<MethodRef>, EnumerationError> {
        self.inner.declared_methods(class)
    }

    fn declared_constructors(&self, class: &ClassInfo) -> Result<Vec<ConstructorRef>, EnumerationError> {
        self.inner.declared_constructors(class)
    }

    fn superclass(&self, class: &ClassInfo) -> Option<ClassRef> {
        class.superclass.as_deref().and_then(|name| self.inner.find_class(name))
    }
}

#[test]
fn superclass_walk_asks_the_host_for_parents() {
    let r = Reflector::new(Arc::new(ParentsByLink { inner: fixture() })).options(QUIET);
    assert!(r.class_by_name("com.demo.Base").is_none());
    let found = r
        .field("com.demo.Foo", |r| {
            r.name("shared");
            r.superclass();
        })
        .unwrap();
    assert_eq!(found.first().unwrap().declaring, "com.demo.Base");
}

// --- Cache --------------------------------------------------------------------

/// Reverses declared methods on every other call.
struct Reordering {
    inner: ClassPool,
    calls: AtomicUsize,
}

impl ClassHost for Reordering {
    fn identity(&self) -> u64 {
        self.inner.identity()
    }

    fn find_class(&self, name: &str) -> Option<ClassRef> {
        self.inner.find_class(name)
    }

    fn class_names(&self) -> Result<Vec<String>, EnumerationError> {
        self.inner.class_names()
    }

    fn declared_fields(&self, class: &ClassInfo) -> Result<Vec<FieldRef>, EnumerationError> {
        self.inner.declared_fields(class)
    }

    fn declared_methods(&self, class: &ClassInfo) -> Result<Vec<MethodRef>, EnumerationError> {
        let mut methods = self.inner.declared_methods(class)?;
        if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 1 {
            methods.reverse();
        }
        Ok(methods)
    }

    fn declared_constructors(&self, class: &ClassInfo) -> Result<Vec<ConstructorRef>, EnumerationError> {
        self.inner.declared_constructors(class)
    }
}

#[test]
fn repeated_lookup_is_answered_from_cache() {
    let host = Arc::new(Reordering { inner: fixture(), calls: AtomicUsize::new(0) });
    let r = Reflector::new(host.clone()).options(QUIET);
    let lookup = || {
        r.method("com.demo.Foo", |r| {
            r.name("foo").first();
        })
        .unwrap()
    };

    let first = lookup();
    let second = lookup();
    assert_eq!(sigs(first.all()), vec!["foo/0"]);
    assert_eq!(first.all(), second.all());
    assert!(!first.metrics().cache_hit);
    assert!(second.metrics().cache_hit);
    assert_eq!(host.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn shared_cache_spans_reflectors_on_one_host() {
    let host: Arc<dyn ClassHost> = Arc::new(fixture());
    let cache = Arc::new(ReflectCache::new());
    let a = Reflector::with_cache(Arc::clone(&host), Arc::clone(&cache)).options(QUIET);
    let b = Reflector::with_cache(host, Arc::clone(&cache)).options(QUIET);

    let _ = a.field("com.demo.Foo", |r| {
        r.name("a");
    });
    let hit = b
        .field("com.demo.Foo", |r| {
            r.name("a");
        })
        .unwrap();
    assert!(hit.metrics().cache_hit);
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn rebuilt_matcher_rules_hit_the_cache() {
    let r = reflector();
    for _ in 0..50 {
        let found = r
            .field("com.demo.Foo", |r| {
                r.modifiers(M::STATIC);
                r.name_matching(NameMatcher::new().only_lowercase());
            })
            .unwrap();
        assert_eq!(found.first().unwrap().name, "c");
    }
    let stats = r.cache().stats();
    assert_eq!(stats.entries, 1);
    assert_eq!((stats.hits, stats.misses), (49, 1));
}

#[test]
fn concurrent_lookups_share_one_entry() {
    let r = reflector();
    let results: Vec<Vec<String>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let found = r
                        .method("com.demo.Foo", |r| {
                            r.name("foo").last();
                        })
                        .unwrap();
                    sigs(found.all())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(results.iter().all(|found| *found == vec!["foo/2".to_string()]));
    let stats = r.cache().stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits + stats.misses, 8);
}

#[test]
fn failures_are_not_cached() {
    let r = reflector();
    for _ in 0..2 {
        let found = r
            .field("com.demo.Foo", |r| {
                r.name("zzz");
            })
            .unwrap()
            .ignore_errors();
        assert!(!found.metrics().cache_hit);
    }
    assert_eq!(r.cache().stats().entries, 0);
}

// --- Failures -----------------------------------------------------------------

#[test]
fn not_found_template_names_target_and_slots() {
    let found = reflector()
        .method("com.demo.Foo", |r| {
            r.name("nothing").index(-1);
            r.empty_params();
        })
        .unwrap()
        .ignore_errors();
    let err = found.error().unwrap();
    assert_eq!(err.kind, MemberKind::Method);
    assert_eq!(err.target, "com.demo.Foo");
    assert_eq!(
        err.template,
        "Can't find this Method in [com.demo.Foo]:\n  -> name:[nothing] index(-1)\n  -> paramCount:[0]\nGenerated by memberfind::resolver"
    );
}

#[test]
fn missing_target_class_is_a_class_not_found() {
    let mut seen = None;
    let found = reflector()
        .field("com.demo.Nope", |r| {
            r.name("a");
        })
        .unwrap()
        .on_not_found(|err| seen = Some(err.kind))
        .ignore_errors();
    assert_eq!(seen, Some(MemberKind::Class));
    assert!(found.first().is_none());
}

#[test]
fn unlistable_members_count_as_none() {
    let mut pool = fixture();
    pool.define(ClassDef::new("com.demo.Sealed").opaque());
    let found = Reflector::new(Arc::new(pool))
        .options(QUIET)
        .field("com.demo.Sealed", |r| {
            r.name("a");
        })
        .unwrap()
        .ignore_errors();
    assert!(!found.is_found());
    assert_eq!(found.metrics().scanned, 0);
}

// --- Class search -------------------------------------------------------------

#[test]
fn class_search_by_package_and_nested_method() {
    let r = reflector();
    let found = r
        .class(|r| {
            r.from_package("com.demo", false);
            r.method(|m| {
                m.name("help");
            });
        })
        .unwrap();
    assert_eq!(names(found.all()), vec!["com.demo.sub.Helper"]);

    let absolute = r
        .class(|r| {
            r.from_package("com.demo", true);
            r.method(|m| {
                m.name("help");
            });
        })
        .unwrap()
        .ignore_errors();
    assert!(!absolute.is_found());
    assert_eq!(absolute.error().unwrap().target, r.host().label());
}

#[test]
fn nested_rules_without_slots_count_all_members() {
    let found = reflector()
        .class(|r| {
            r.from_package("com.demo", true);
            r.field(|_| {}).count(3);
        })
        .unwrap();
    assert_eq!(names(found.all()), vec!["com.demo.Foo"]);

    let with_slots = reflector()
        .class(|r| {
            r.field(|f| {
                f.ty(TypeName::INT);
            })
            .count_range(2..=5);
            r.constructor(|c| {
                c.empty_params();
            });
        })
        .unwrap();
    assert_eq!(names(with_slots.all()), vec!["com.demo.Foo"]);
}

#[test]
fn any_member_rules_count_every_kind() {
    let found = reflector()
        .class(|r| {
            r.member(|m| {
                m.modifiers(M::STATIC);
            })
            .count(2);
        })
        .unwrap();
    assert_eq!(names(found.all()), vec!["com.demo.Foo"]);
}

#[test]
fn anonymous_and_enclosing_classes() {
    let r = reflector();
    let anon = r
        .class(|r| {
            r.enclosing(&["com.demo.Foo"]).anonymous(true);
        })
        .unwrap();
    assert_eq!(names(anon.all()), vec!["com.demo.Foo$1"]);

    let by_single = r
        .class(|r| {
            r.single_name("Foo$1", false).extends(&["com.demo.Base"]);
        })
        .unwrap();
    assert_eq!(names(by_single.all()), vec!["com.demo.Foo$1"]);

    let inner = r
        .class(|r| {
            r.enclosing(&["com.demo.Foo"]).anonymous(false).simple_name("Inner", false);
        })
        .unwrap();
    assert_eq!(names(inner.all()), vec!["com.demo.Foo$Inner"]);
}

#[test]
fn optional_names_form_an_any_of_group() {
    let found = reflector()
        .class(|r| {
            r.simple_name("Helper", true).full_name("org.other.Thing", true);
        })
        .unwrap();
    assert_eq!(names(found.all()), vec!["com.demo.sub.Helper", "org.other.Thing"]);
}

#[test]
fn class_flags_use_equality() {
    let r = reflector();
    let implementing = r
        .class(|r| {
            r.no_implements(false);
        })
        .unwrap();
    assert_eq!(names(implementing.all()), vec!["com.demo.Foo"]);

    let extending = r
        .class(|r| {
            r.from_package("com.demo", true).no_extends(false);
        })
        .unwrap();
    assert_eq!(names(extending.all()), vec!["com.demo.Foo", "com.demo.Foo$1"]);
}

#[test]
fn class_modifier_selector_runs_over_filtered_classes() {
    let found = reflector()
        .class(|r| {
            r.from_package("com.demo", true);
            r.modifiers(M::STATIC).last();
        })
        .unwrap();
    assert_eq!(names(found.all()), vec!["com.demo.Foo$Inner"]);
}

#[test]
fn unlistable_loader_finds_no_classes() {
    let mut pool = fixture();
    pool.refuse_listing();
    let found = Reflector::new(Arc::new(pool))
        .options(QUIET)
        .class(|r| {
            r.full_name("com.demo.Foo", false);
        })
        .unwrap()
        .ignore_errors();
    assert!(!found.is_found());
}

#[test]
fn nested_param_validation_reaches_class_rules() {
    let err = reflector()
        .class(|r| {
            r.method(|m| {
                m.param_types(vec![]);
            });
        })
        .unwrap_err();
    assert_eq!(err, ConfigurationError::EmptyParamTypes { kind: MemberKind::Method });
}

// --- Engine -------------------------------------------------------------------

#[test]
fn engine_reports_scan_metrics() {
    let engine = Engine { host: Arc::new(fixture()), cache: Arc::new(ReflectCache::new()), options: QUIET };
    let target = engine.class_by_name("com.demo.Foo").unwrap();
    let mut rules = MethodRules::new();
    rules.return_type(TypeName::INT);

    let first = engine.find_members(&target, &rules).unwrap();
    assert_eq!(first.found.as_ref().map(|f| f.len()), Ok(1));
    assert_eq!(first.metrics.scanned, 5);

    let second = engine.find_members(&target, &rules).unwrap();
    assert!(second.metrics.cache_hit);
    assert_eq!(second.metrics.scanned, 0);
}

#[test]
fn async_lookups_deliver_through_deferred() {
    let r = reflector();
    let pending = r
        .method_async("com.demo.Foo", |r| {
            r.name("bar");
        })
        .unwrap();
    let found = pending.wait().unwrap().unwrap();
    assert_eq!(sigs(&found), vec!["bar/1"]);

    let missing = r
        .field_async("com.demo.Foo", |r| {
            r.name("zzz");
        })
        .unwrap();
    assert!(missing.wait().unwrap().unwrap_err().is_not_found());

    let classes = r
        .class_async(|c| {
            c.full_name("org.other.Thing", false);
        })
        .unwrap();
    assert_eq!(classes.wait().unwrap().unwrap().len(), 1);
}

#[test]
fn async_lookups_reject_bad_rules_before_dispatch() {
    let r = reflector();
    let err = r.constructor_async("com.demo.Foo", |_| {}).unwrap_err();
    assert_eq!(err, ConfigurationError::Uninitialized { kind: MemberKind::Constructor });

    let err = r
        .method_async("com.demo.Foo", |r| {
            r.param_types(params![_, _]);
        })
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::AllWildcardParams { .. }));

    assert!(r.class_async(|_| {}).is_err());
}
