//! Remedy plans: ordered fallbacks for a failed lookup.
//!
//! A plan is built inside [`MemberResult::remedy`](crate::MemberResult::remedy)
//! and only runs when the original lookup found nothing. Each registered
//! alternative returns a [`Deferred`] that resolves if that alternative is
//! the one that succeeds. Alternatives run in registration order and the
//! first success stops the plan. When every alternative fails, the last error
//! is logged and the plan is discarded.
//!
//! Rules are validated when an alternative is registered; a misconfigured
//! alternative is returned to the caller as a [`ConfigurationError`] and never
//! joins the plan.

use std::sync::Arc;

use crate::deferred::{Deferred, Resolver, deferred};
use crate::engine::{Engine, LOG_TARGET, MemberRuleSet};
use crate::error::{ConfigurationError, FindError, NotFoundError};
use crate::model::{ClassInfo, ClassRef, ConstructorInfo, FieldInfo, MethodInfo};
use crate::rules::{ClassRules, ConstructorRules, FieldRules, MethodRules};

type Attempt<T> = Box<dyn FnOnce(&Engine) -> Result<Vec<Arc<T>>, FindError>>;

struct Alternative<T> {
    attempt: Attempt<T>,
    resolver: Resolver<Vec<Arc<T>>>,
}

/// Alternatives to try after a lookup failed.
pub struct RemedyPlan<T> {
    engine: Engine,
    /// Class the failed lookup searched; `None` when the class itself was missing.
    target: Option<ClassRef>,
    original: NotFoundError,
    alternatives: Vec<Alternative<T>>,
}

impl<T> RemedyPlan<T> {
    pub(crate) fn new(engine: Engine, target: Option<ClassRef>, original: NotFoundError) -> Self {
        RemedyPlan { engine, target, original, alternatives: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    fn push(&mut self, attempt: Attempt<T>) -> Deferred<Vec<Arc<T>>> {
        let (resolver, pending) = deferred();
        self.alternatives.push(Alternative { attempt, resolver });
        pending
    }

    fn push_member<R>(&mut self, rules: R) -> Result<Deferred<Vec<Arc<T>>>, ConfigurationError>
    where
        R: MemberRuleSet<Member = T> + 'static,
        T: Send + Sync + 'static,
    {
        rules.validate()?;
        let target = self.target.clone();
        let original = self.original.clone();
        Ok(self.push(Box::new(move |engine: &Engine| -> Result<Vec<Arc<T>>, FindError> {
            let Some(target) = target else { return Err(original.into()) };
            Ok(engine.find_members(&target, &rules)?.found?)
        })))
    }

    /// Try alternatives in order. Returns the first non-empty result.
    pub(crate) fn execute(self) -> Option<Vec<Arc<T>>> {
        if self.alternatives.is_empty() {
            tracing::warn!(target: LOG_TARGET, "remedy plan for [{}] has no alternatives", self.original.target);
            return None;
        }
        let total = self.alternatives.len();
        let mut last_error = None;
        for (n, Alternative { attempt, resolver }) in self.alternatives.into_iter().enumerate() {
            match attempt(&self.engine) {
                Ok(found) => {
                    resolver.resolve(found.clone());
                    return Some(found);
                }
                Err(err) => {
                    if self.engine.options.log_failures {
                        tracing::warn!(
                            target: LOG_TARGET,
                            "remedy {}/{total} for [{}] failed:\n{err}",
                            n + 1,
                            self.original.target
                        );
                    }
                    last_error = Some(err);
                }
            }
        }
        if let (Some(err), true) = (last_error, self.engine.options.log_failures) {
            tracing::error!(target: LOG_TARGET, "every remedy failed, last error:\n{err}");
        }
        None
    }
}

impl RemedyPlan<FieldInfo> {
    pub fn field(
        &mut self,
        build: impl FnOnce(&mut FieldRules),
    ) -> Result<Deferred<Vec<Arc<FieldInfo>>>, ConfigurationError> {
        let mut rules = FieldRules::new();
        build(&mut rules);
        self.push_member(rules)
    }
}

impl RemedyPlan<MethodInfo> {
    pub fn method(
        &mut self,
        build: impl FnOnce(&mut MethodRules),
    ) -> Result<Deferred<Vec<Arc<MethodInfo>>>, ConfigurationError> {
        let mut rules = MethodRules::new();
        build(&mut rules);
        self.push_member(rules)
    }
}

impl RemedyPlan<ConstructorInfo> {
    pub fn constructor(
        &mut self,
        build: impl FnOnce(&mut ConstructorRules),
    ) -> Result<Deferred<Vec<Arc<ConstructorInfo>>>, ConfigurationError> {
        let mut rules = ConstructorRules::new();
        build(&mut rules);
        self.push_member(rules)
    }
}

impl RemedyPlan<ClassInfo> {
    pub fn class(
        &mut self,
        build: impl FnOnce(&mut ClassRules),
    ) -> Result<Deferred<Vec<Arc<ClassInfo>>>, ConfigurationError> {
        let mut rules = ClassRules::new();
        build(&mut rules);
        rules.validate()?;
        Ok(self.push(Box::new(move |engine: &Engine| -> Result<Vec<Arc<ClassInfo>>, FindError> {
            Ok(engine.find_classes(&rules)?.found?)
        })))
    }
}

impl<T> std::fmt::Debug for RemedyPlan<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemedyPlan").field("target", &self.original.target).field("alternatives", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::api::{Options, Reflector};
    use crate::error::{ConfigurationError, MemberKind};
    use crate::host::{ClassDef, ClassPool};
    use crate::model::{Modifiers, TypeName};

    fn reflector() -> Reflector {
        let mut pool = ClassPool::new();
        pool.define(
            ClassDef::new("com.demo.Foo")
                .method("bar", &[TypeName::STRING], TypeName::INT, Modifiers::PUBLIC)
                .field("count", TypeName::INT, Modifiers::PRIVATE),
        );
        Reflector::new(Arc::new(pool)).options(Options { log_failures: false, debug_timing: false })
    }

    #[test]
    fn first_successful_alternative_wins() {
        let (mut first, mut second, mut third) = (None, None, None);
        let waited = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&waited);
        let result = reflector()
            .method("com.demo.Foo", |r| {
                r.name("renamedBar");
            })
            .unwrap()
            .wait(move |found| {
                assert_eq!(found[0].name, "bar");
                flag.store(true, Ordering::SeqCst);
            })
            .remedy(|plan| {
                first = plan
                    .method(|r| {
                        r.name("oldBar");
                    })
                    .ok();
                second = plan
                    .method(|r| {
                        r.name("bar");
                    })
                    .ok();
                third = plan
                    .method(|r| {
                        r.param_count(1);
                    })
                    .ok();
                assert_eq!(plan.len(), 3);
            });

        assert!(result.is_found());
        assert!(waited.load(Ordering::SeqCst));
        assert!(first.unwrap().is_abandoned());
        assert_eq!(second.unwrap().try_get().unwrap()[0].name, "bar");
        assert!(third.unwrap().is_abandoned());
    }

    #[test]
    fn exhausted_plan_keeps_the_failure() {
        let mut only = None;
        let result = reflector()
            .field("com.demo.Foo", |r| {
                r.name("a");
            })
            .unwrap()
            .remedy(|plan| {
                only = plan
                    .field(|r| {
                        r.name("b");
                    })
                    .ok();
            });
        assert!(!result.is_found());
        assert!(only.unwrap().is_abandoned());
    }

    #[test]
    fn successful_lookup_never_builds_a_plan() {
        let mut built = false;
        let result = reflector()
            .field("com.demo.Foo", |r| {
                r.name("count");
            })
            .unwrap()
            .remedy(|_| built = true);
        assert!(result.is_found());
        assert!(!built);
    }

    #[test]
    fn empty_plan_is_a_no_op() {
        let result = reflector()
            .constructor("com.demo.Foo", |r| {
                r.param_count(3);
            })
            .unwrap()
            .remedy(|_| {})
            .ignore_errors();
        assert!(result.error().is_some());
    }

    #[test]
    fn class_alternatives_search_the_loader() {
        let result = reflector()
            .class(|r| {
                r.full_name("com.demo.Renamed", false);
            })
            .unwrap()
            .remedy(|plan| {
                plan.class(|r| {
                    r.simple_name("Foo", false);
                })
                .unwrap();
            });
        assert_eq!(result.first().unwrap().name, "com.demo.Foo");
    }

    #[test]
    fn missing_target_fails_every_member_alternative() {
        let mut alt = None;
        let result = reflector()
            .method("com.demo.Gone", |r| {
                r.name("bar");
            })
            .unwrap()
            .remedy(|plan| {
                alt = plan
                    .method(|r| {
                        r.name("bar");
                    })
                    .ok();
            });
        assert!(!result.is_found());
        assert!(alt.unwrap().is_abandoned());
    }

    #[test]
    fn misconfigured_alternative_is_refused_at_registration() {
        let (mut wildcard, mut empty, mut good) = (None, None, None);
        let result = reflector()
            .method("com.demo.Foo", |r| {
                r.name("renamedBar");
            })
            .unwrap()
            .remedy(|plan| {
                wildcard = Some(plan.method(|r| {
                    r.param_types(params![_, _]);
                }));
                empty = Some(plan.method(|_| {}));
                good = plan
                    .method(|r| {
                        r.name("bar");
                    })
                    .ok();
                assert_eq!(plan.len(), 1);
            });

        assert!(result.is_found());
        assert_eq!(
            wildcard.unwrap().unwrap_err(),
            ConfigurationError::AllWildcardParams { kind: MemberKind::Method, count: 2 }
        );
        assert_eq!(empty.unwrap().unwrap_err(), ConfigurationError::Uninitialized { kind: MemberKind::Method });
        assert!(good.unwrap().is_ready());
    }
}
