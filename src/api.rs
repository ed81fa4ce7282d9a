use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::cache::ReflectCache;
use crate::deferred::{Deferred, deferred};
use crate::dispatch::{Job, ResolveWorker};
use crate::engine::{Engine, LOG_TARGET, MemberRuleSet, Resolution, ResolveMetrics, not_found};
use crate::error::{ConfigurationError, FindError, MemberKind, NotFoundError};
use crate::host::ClassHost;
use crate::model::{ClassInfo, ClassRef, ConstructorInfo, FieldInfo, MethodInfo};
use crate::remedy::RemedyPlan;
use crate::rules::{ClassRules, ConstructorRules, FieldRules, MethodRules};

/// Environment variable that turns on per-resolution timing logs.
pub const DEBUG_ENV: &str = "MEMBERFIND_DEBUG";

/// Options that affect logging around resolution.
#[derive(Debug, Clone)]
pub struct Options {
    /// Log the not-found template when a failed result is dropped.
    pub log_failures: bool,
    /// Log a timing line for every resolution.
    pub debug_timing: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options { log_failures: true, debug_timing: false }
    }
}

impl Options {
    /// Defaults, with `debug_timing` taken from `MEMBERFIND_DEBUG`.
    pub fn from_env() -> Self {
        let debug_timing = std::env::var(DEBUG_ENV).is_ok_and(|v| !v.is_empty() && v != "0");
        Options { debug_timing, ..Options::default() }
    }
}

/// Class whose declared members are searched.
#[derive(Debug, Clone)]
pub enum Target {
    /// Loaded through the reflector's host when the lookup runs.
    Name(String),
    Class(ClassRef),
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        Target::Name(value.to_string())
    }
}

impl From<String> for Target {
    fn from(value: String) -> Self {
        Target::Name(value)
    }
}

impl From<ClassRef> for Target {
    fn from(value: ClassRef) -> Self {
        Target::Class(value)
    }
}

impl From<&ClassRef> for Target {
    fn from(value: &ClassRef) -> Self {
        Target::Class(Arc::clone(value))
    }
}

/// Outcome of a background lookup.
pub type Pending<T> = Deferred<Result<Vec<Arc<T>>, FindError>>;

fn target_class(engine: &Engine, target: &Target) -> Result<ClassRef, NotFoundError> {
    match target {
        Target::Class(class) => Ok(Arc::clone(class)),
        Target::Name(name) => engine.class_by_name(name).ok_or_else(|| {
            not_found(MemberKind::Class, &engine.host.label(), &[format!("fullName:[{name} optional(false)]")])
        }),
    }
}

/// Entry point: resolves rule sets against one host with one cache.
///
/// Cloning is cheap; clones share the cache and the background worker.
///
/// ```
/// use std::sync::Arc;
/// use memberfind::{ClassDef, ClassPool, Reflector, TypeName};
///
/// let mut pool = ClassPool::new();
/// pool.define(ClassDef::new("com.demo.Foo").field("count", TypeName::INT, Default::default()));
/// let reflector = Reflector::new(Arc::new(pool));
///
/// let found = reflector.field("com.demo.Foo", |r| { r.ty(TypeName::INT); }).unwrap();
/// assert_eq!(found.first().unwrap().name, "count");
/// ```
#[derive(Clone)]
pub struct Reflector {
    engine: Engine,
    worker: Arc<OnceCell<ResolveWorker>>,
}

impl Reflector {
    /// Reflector with a private cache and options from the environment.
    pub fn new(host: Arc<dyn ClassHost>) -> Self {
        Self::with_cache(host, Arc::new(ReflectCache::new()))
    }

    pub fn with_cache(host: Arc<dyn ClassHost>, cache: Arc<ReflectCache>) -> Self {
        Reflector {
            engine: Engine { host, cache, options: Options::from_env() },
            worker: Arc::new(OnceCell::new()),
        }
    }

    pub fn options(mut self, options: Options) -> Self {
        self.engine.options = options;
        self
    }

    pub fn cache(&self) -> &Arc<ReflectCache> {
        &self.engine.cache
    }

    pub fn host(&self) -> &Arc<dyn ClassHost> {
        &self.engine.host
    }

    /// Load a class through the class cache.
    pub fn class_by_name(&self, name: &str) -> Option<ClassRef> {
        self.engine.class_by_name(name)
    }

    pub fn field(
        &self,
        target: impl Into<Target>,
        build: impl FnOnce(&mut FieldRules),
    ) -> Result<MemberResult<FieldInfo>, ConfigurationError> {
        self.members(target.into(), build)
    }

    pub fn method(
        &self,
        target: impl Into<Target>,
        build: impl FnOnce(&mut MethodRules),
    ) -> Result<MemberResult<MethodInfo>, ConfigurationError> {
        self.members(target.into(), build)
    }

    pub fn constructor(
        &self,
        target: impl Into<Target>,
        build: impl FnOnce(&mut ConstructorRules),
    ) -> Result<MemberResult<ConstructorInfo>, ConfigurationError> {
        self.members(target.into(), build)
    }

    /// Search every class the host lists.
    pub fn class(&self, build: impl FnOnce(&mut ClassRules)) -> Result<ClassResult, ConfigurationError> {
        let mut rules = ClassRules::new();
        build(&mut rules);
        let resolution = self.engine.find_classes(&rules)?;
        Ok(MemberResult::from_resolution(MemberKind::Class, resolution, self.engine.clone(), None))
    }

    fn members<R: MemberRuleSet + Default>(
        &self,
        target: Target,
        build: impl FnOnce(&mut R),
    ) -> Result<MemberResult<R::Member>, ConfigurationError> {
        let mut rules = R::default();
        build(&mut rules);
        rules.validate()?;
        let class = match target_class(&self.engine, &target) {
            Ok(class) => class,
            Err(err) => return Ok(MemberResult::failed(R::KIND, err, self.engine.clone())),
        };
        let resolution = self.engine.find_members(&class, &rules)?;
        Ok(MemberResult::from_resolution(R::KIND, resolution, self.engine.clone(), Some(class)))
    }

    // --- Background resolution ------------------------------------------------
    //
    // Rules are validated on the calling thread; only enumeration and
    // evaluation move to the worker.

    pub fn field_async(
        &self,
        target: impl Into<Target>,
        build: impl FnOnce(&mut FieldRules),
    ) -> Result<Pending<FieldInfo>, ConfigurationError> {
        self.members_async(target.into(), build)
    }

    pub fn method_async(
        &self,
        target: impl Into<Target>,
        build: impl FnOnce(&mut MethodRules),
    ) -> Result<Pending<MethodInfo>, ConfigurationError> {
        self.members_async(target.into(), build)
    }

    pub fn constructor_async(
        &self,
        target: impl Into<Target>,
        build: impl FnOnce(&mut ConstructorRules),
    ) -> Result<Pending<ConstructorInfo>, ConfigurationError> {
        self.members_async(target.into(), build)
    }

    pub fn class_async(&self, build: impl FnOnce(&mut ClassRules)) -> Result<Pending<ClassInfo>, ConfigurationError> {
        let mut rules = ClassRules::new();
        build(&mut rules);
        rules.validate()?;
        let engine = self.engine.clone();
        Ok(self.dispatch(move || -> Result<Vec<Arc<ClassInfo>>, FindError> {
            let found = engine.find_classes(&rules)?.found;
            log_failure(&engine, found.as_ref().err());
            Ok(found?)
        }))
    }

    fn members_async<R: MemberRuleSet + Default + 'static>(
        &self,
        target: Target,
        build: impl FnOnce(&mut R),
    ) -> Result<Pending<R::Member>, ConfigurationError> {
        let mut rules = R::default();
        build(&mut rules);
        rules.validate()?;
        let engine = self.engine.clone();
        Ok(self.dispatch(move || -> Result<Vec<Arc<R::Member>>, FindError> {
            let found = match target_class(&engine, &target) {
                Ok(class) => engine.find_members(&class, &rules)?.found,
                Err(err) => Err(err),
            };
            log_failure(&engine, found.as_ref().err());
            Ok(found?)
        }))
    }

    /// Run `job` on the worker, or inline when no worker can be started.
    fn dispatch<T>(&self, job: impl FnOnce() -> T + Send + 'static) -> Deferred<T>
    where
        T: Send + Sync + 'static,
    {
        let (resolver, pending) = deferred();
        let job: Job = Box::new(move || resolver.resolve(job()));
        let rejected = match self.worker() {
            Some(worker) => worker.submit(job).err(),
            None => Some(job),
        };
        if let Some(job) = rejected {
            job();
        }
        pending
    }

    fn worker(&self) -> Option<&ResolveWorker> {
        self.worker
            .get_or_try_init(|| ResolveWorker::spawn("memberfind-resolve"))
            .map_err(|err| tracing::warn!(target: LOG_TARGET, "resolve worker unavailable, resolving inline: {err}"))
            .ok()
    }
}

impl fmt::Debug for Reflector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reflector")
            .field("host", &self.engine.host.label())
            .field("options", &self.engine.options)
            .field("worker", &self.worker.get())
            .finish()
    }
}

fn log_failure(engine: &Engine, err: Option<&NotFoundError>) {
    if let (Some(err), true) = (err, engine.options.log_failures) {
        tracing::error!(target: LOG_TARGET, "{err}");
    }
}

// --- Results ------------------------------------------------------------------

type Waiter<T> = Box<dyn FnOnce(&[Arc<T>])>;

/// Outcome of a synchronous lookup.
///
/// Either a non-empty match set in declaration order, or a [`NotFoundError`].
/// A failed result that is dropped without [`ignore_errors`](Self::ignore_errors)
/// or a [`remedy`](Self::remedy) logs its template at error level.
pub struct MemberResult<T> {
    kind: MemberKind,
    members: Vec<Arc<T>>,
    error: Option<NotFoundError>,
    metrics: ResolveMetrics,
    engine: Engine,
    target: Option<ClassRef>,
    ignored: bool,
    remedied: bool,
    waiters: Vec<Waiter<T>>,
}

pub type ClassResult = MemberResult<ClassInfo>;

impl<T> MemberResult<T> {
    fn from_resolution(kind: MemberKind, resolution: Resolution<T>, engine: Engine, target: Option<ClassRef>) -> Self {
        let (members, error) = match resolution.found {
            Ok(members) => (members, None),
            Err(err) => (Vec::new(), Some(err)),
        };
        MemberResult {
            kind,
            members,
            error,
            metrics: resolution.metrics,
            engine,
            target,
            ignored: false,
            remedied: false,
            waiters: Vec::new(),
        }
    }

    fn failed(kind: MemberKind, error: NotFoundError, engine: Engine) -> Self {
        let resolution = Resolution { found: Err(error), metrics: ResolveMetrics::default() };
        Self::from_resolution(kind, resolution, engine, None)
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn is_found(&self) -> bool {
        self.error.is_none()
    }

    /// First match in declaration order.
    pub fn first(&self) -> Option<Arc<T>> {
        self.members.first().cloned()
    }

    pub fn all(&self) -> &[Arc<T>] {
        &self.members
    }

    pub fn into_all(mut self) -> Vec<Arc<T>> {
        std::mem::take(&mut self.members)
    }

    pub fn error(&self) -> Option<&NotFoundError> {
        self.error.as_ref()
    }

    pub fn metrics(&self) -> ResolveMetrics {
        self.metrics
    }

    /// Call `handler` now if the lookup failed. Logging is unaffected.
    pub fn on_not_found(self, handler: impl FnOnce(&NotFoundError)) -> Self {
        if let Some(err) = &self.error {
            handler(err);
        }
        self
    }

    /// Do not log this result's failure.
    pub fn ignore_errors(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Call `callback` with the matches once there are any: now if the lookup
    /// succeeded, or later if a remedy succeeds.
    pub fn wait(mut self, callback: impl FnOnce(&[Arc<T>]) + 'static) -> Self {
        if self.error.is_none() {
            callback(&self.members);
        } else {
            self.waiters.push(Box::new(callback));
        }
        self
    }

    /// Build and run a remedy plan if the lookup failed.
    ///
    /// On success the result takes the remedy's matches and pending
    /// [`wait`](Self::wait) callbacks run. An empty plan changes nothing.
    pub fn remedy(mut self, build: impl FnOnce(&mut RemedyPlan<T>)) -> Self {
        let Some(error) = self.error.clone() else { return self };
        let mut plan = RemedyPlan::new(self.engine.clone(), self.target.clone(), error);
        build(&mut plan);
        self.remedied |= !plan.is_empty();
        if let Some(found) = plan.execute() {
            self.members = found;
            self.error = None;
            for waiter in std::mem::take(&mut self.waiters) {
                waiter(&self.members);
            }
        }
        self
    }
}

impl<T> Drop for MemberResult<T> {
    fn drop(&mut self) {
        if self.ignored || self.remedied {
            return;
        }
        log_failure(&self.engine, self.error.as_ref());
    }
}

impl<T: fmt::Debug> fmt::Debug for MemberResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberResult")
            .field("kind", &self.kind)
            .field("members", &self.members)
            .field("error", &self.error.as_ref().map(|e| &e.target))
            .field("metrics", &self.metrics)
            .finish()
    }
}
