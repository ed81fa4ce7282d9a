//! Resolution.
//!
//! Turns a validated rule set plus a target into matched candidates:
//!
//! ```text
//! validate ──▶ fingerprint ──▶ cache hit? ──yes──▶ done
//!                                  │ no
//!                                  v
//!                     enumerate declared members
//!                     select with compiled rules
//!                                  │ empty
//!                                  v
//!                 superclass walk (if requested) ──▶ same scan per ancestor
//!                                  │
//!                         store non-empty result
//! ```
//!
//! Class searches follow the same shape, with the loader's class-name list
//! (gated by package rules) in place of declared members.
//!
//! ## Design notes
//!
//! - The superclass walk is a loop with a visited set, so a malformed host
//!   with a cyclic hierarchy terminates instead of overflowing the stack.
//! - A member found in an ancestor is cached under both the original target's
//!   fingerprint and the ancestor's, except for `superclass_only` rules.
//! - `superclass_only` starts the walk at the direct superclass; parents come
//!   from `ClassHost::superclass` through the class cache.
//! - Host enumeration failures are logged and count as zero candidates.

use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashSet;

use super::compiled_rules::{MemberRuleSet, declared_or_empty};
use super::diagnostics::{LOG_TARGET, not_found};
use super::fingerprint::Fingerprint;
use super::metrics::ResolveMetrics;
use super::package_filter::PackageFilter;
use crate::api::Options;
use crate::cache::ReflectCache;
use crate::error::{ConfigurationError, MemberKind, NotFoundError};
use crate::host::ClassHost;
use crate::model::{Candidate, ClassInfo, ClassRef};
use crate::rules::ClassRules;

/// Outcome of one resolution that passed validation.
#[derive(Debug, Clone)]
pub(crate) struct Resolution<T> {
    pub(crate) found: Result<Vec<Arc<T>>, NotFoundError>,
    pub(crate) metrics: ResolveMetrics,
}

/// Everything a resolution needs; cheap to clone into a background job.
#[derive(Clone)]
pub(crate) struct Engine {
    pub(crate) host: Arc<dyn ClassHost>,
    pub(crate) cache: Arc<ReflectCache>,
    pub(crate) options: Options,
}

impl Engine {
    /// Load a class by name through the class cache.
    pub(crate) fn class_by_name(&self, name: &str) -> Option<ClassRef> {
        let id = self.host.identity();
        if let Some(class) = self.cache.class(id, name) {
            return Some(class);
        }
        let class = self.host.find_class(name)?;
        self.cache.put_class(id, Arc::clone(&class));
        Some(class)
    }

    /// Direct superclass of `class` through the class cache.
    fn superclass_of(&self, class: &ClassInfo) -> Option<ClassRef> {
        let name = class.superclass.as_deref()?;
        let id = self.host.identity();
        if let Some(parent) = self.cache.class(id, name) {
            return Some(parent);
        }
        let parent = self.host.superclass(class)?;
        self.cache.put_class(id, Arc::clone(&parent));
        Some(parent)
    }

    fn class_names(&self) -> Arc<[String]> {
        let id = self.host.identity();
        if let Some(names) = self.cache.class_names(id) {
            return names;
        }
        match self.host.class_names() {
            Ok(names) => {
                let names: Arc<[String]> = Arc::from(names);
                self.cache.put_class_names(id, Arc::clone(&names));
                names
            }
            Err(err) => {
                tracing::warn!(target: LOG_TARGET, "{err}");
                Arc::from(Vec::new())
            }
        }
    }

    pub(crate) fn find_members<R: MemberRuleSet>(
        &self,
        target: &ClassRef,
        rules: &R,
    ) -> Result<Resolution<R::Member>, ConfigurationError> {
        let started = Instant::now();
        rules.validate()?;

        let mut metrics = ResolveMetrics::default();
        let key = Fingerprint::of(self.host.identity(), &target.name, R::KIND, rules);
        if let Some(hit) = self.cache.get(&key) {
            metrics.cache_hit = true;
            metrics.elapsed = started.elapsed();
            let found: Vec<_> = hit.iter().filter_map(R::unwrap).collect();
            self.trace(R::KIND, &target.name, &metrics, found.len());
            return Ok(Resolution { found: Ok(found), metrics });
        }

        let compiled = rules.compile();
        let base = rules.base();
        let mut visited: FxHashSet<String> = FxHashSet::default();
        visited.insert(target.name.clone());
        let mut current = Arc::clone(target);
        if base.superclass_only && target.has_extends() {
            if let Some(parent) = self.superclass_of(target) {
                visited.insert(parent.name.clone());
                metrics.superclass_hops += 1;
                current = parent;
            }
        }

        let found = loop {
            let declared = declared_or_empty::<R>(&*self.host, &current);
            metrics.scanned += declared.len();
            let found = compiled.select(&declared);
            if !found.is_empty() {
                break found;
            }
            if !base.find_in_super || !current.has_extends() {
                break found;
            }
            let Some(parent) = self.superclass_of(&current) else {
                break found;
            };
            if !visited.insert(parent.name.clone()) {
                tracing::warn!(target: LOG_TARGET, "superclass cycle at [{}] while searching [{}]", parent.name, target.name);
                break found;
            }
            metrics.superclass_hops += 1;
            current = parent;
        };

        metrics.elapsed = started.elapsed();
        self.trace(R::KIND, &target.name, &metrics, found.len());
        if found.is_empty() {
            let err = not_found(R::KIND, &target.name, &rules.diagnostic_lines());
            return Ok(Resolution { found: Err(err), metrics });
        }

        let stored: Arc<[Candidate]> = found.iter().cloned().map(R::wrap).collect();
        // An ancestor key would carry `superclass_only` and mean "start above it".
        if current.name != target.name && !base.superclass_only {
            self.cache.put(key.retarget(&current.name), Arc::clone(&stored));
        }
        self.cache.put(key, stored);
        Ok(Resolution { found: Ok(found), metrics })
    }

    pub(crate) fn find_classes(&self, rules: &ClassRules) -> Result<Resolution<ClassInfo>, ConfigurationError> {
        let started = Instant::now();
        rules.validate()?;

        let mut metrics = ResolveMetrics::default();
        let label = self.host.label();
        let key = Fingerprint::of(self.host.identity(), "", MemberKind::Class, rules);
        if let Some(hit) = self.cache.get(&key) {
            metrics.cache_hit = true;
            metrics.elapsed = started.elapsed();
            let found: Vec<ClassRef> = hit
                .iter()
                .filter_map(|c| match c {
                    Candidate::Class(class) => Some(Arc::clone(class)),
                    _ => None,
                })
                .collect();
            self.trace(MemberKind::Class, &label, &metrics, found.len());
            return Ok(Resolution { found: Ok(found), metrics });
        }

        let names = self.class_names();
        let candidates: Vec<ClassRef> =
            PackageFilter::new(&rules.from_packages).scan(&names).filter_map(|name| self.class_by_name(name)).collect();
        metrics.scanned = candidates.len();
        let found = rules.compile(&*self.host).select(&candidates);

        metrics.elapsed = started.elapsed();
        self.trace(MemberKind::Class, &label, &metrics, found.len());
        if found.is_empty() {
            return Ok(Resolution { found: Err(not_found(MemberKind::Class, &label, &rules.templates())), metrics });
        }
        self.cache.put(key, found.iter().cloned().map(Candidate::Class).collect());
        Ok(Resolution { found: Ok(found), metrics })
    }

    fn trace(&self, kind: MemberKind, target: &str, metrics: &ResolveMetrics, found: usize) {
        if self.options.debug_timing {
            tracing::debug!(target: LOG_TARGET, %kind, scope = target, found, "resolved in {metrics}");
        }
    }
}
