//! Predicates over reflected values.
//!
//! A predicate is data: anything implementing [`Matcher`] can sit in a rule
//! slot, whether it is a built-in comparator ([`NameMatcher`],
//! [`ModifierMatcher`]) or a caller closure wrapped by [`Predicate::new`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use rustc_hash::FxHasher;

use crate::model::{Modifiers, TypeName};

pub trait Matcher<T: ?Sized>: Send + Sync {
    fn evaluate(&self, value: &T) -> bool;

    /// Text for diagnostics; `None` renders as `existed`.
    fn describe(&self) -> Option<String> {
        None
    }

    /// Digest of the matcher's data. Matchers that return `None` are keyed
    /// by a process-unique id instead.
    fn fingerprint(&self) -> Option<u64> {
        None
    }
}

struct FnMatcher<F>(F);

impl<T: ?Sized, F> Matcher<T> for FnMatcher<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn evaluate(&self, value: &T) -> bool {
        (self.0)(value)
    }
}

static NEXT_PREDICATE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PredicateKey {
    /// Built from data; equal data gives an equal key.
    Structural(u64),
    /// Opaque closure; clones share the id.
    Unique(u64),
}

/// Shared, cheaply clonable predicate.
///
/// Built-in matchers are keyed by their data, so a rule set rebuilt with the
/// same name or modifier matcher lands on the same cache entry. Closures get
/// a process-unique id at construction; clones keep it, separately built
/// closures never share a cache entry.
pub struct Predicate<T: ?Sized> {
    key: PredicateKey,
    inner: Arc<dyn Matcher<T>>,
}

impl<T: ?Sized> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Predicate { key: self.key, inner: Arc::clone(&self.inner) }
    }
}

impl<T: ?Sized + 'static> Predicate<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::from_matcher(FnMatcher(f))
    }

    pub fn from_matcher<M: Matcher<T> + 'static>(matcher: M) -> Self {
        let key = match matcher.fingerprint() {
            Some(digest) => PredicateKey::Structural(digest),
            None => PredicateKey::Unique(NEXT_PREDICATE_ID.fetch_add(1, Ordering::Relaxed)),
        };
        Predicate { key, inner: Arc::new(matcher) }
    }
}

impl<T: ?Sized> Predicate<T> {
    pub fn evaluate(&self, value: &T) -> bool {
        self.inner.evaluate(value)
    }

    pub fn describe(&self) -> String {
        self.inner.describe().unwrap_or_else(|| "existed".to_string())
    }
}

/// Hashes by key only; see the type docs.
impl<T: ?Sized> Hash for Predicate<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").field("key", &self.key).field("describe", &self.describe()).finish()
    }
}

// --- Names ------------------------------------------------------------------

#[derive(Debug, Clone)]
enum NameCondition {
    Equals(String),
    EqualsIgnoreCase(String),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Matches(Regex),
    Synthetic(bool),
    OnlySymbols,
    OnlyLetters,
    OnlyNumbers,
    OnlyLettersNumbers,
    OnlyLowercase,
    OnlyUppercase,
    Length(usize),
    LengthRange(RangeInclusive<usize>),
}

impl NameCondition {
    fn holds(&self, name: &str) -> bool {
        match self {
            NameCondition::Equals(s) => name == s,
            NameCondition::EqualsIgnoreCase(s) => name.eq_ignore_ascii_case(s),
            NameCondition::StartsWith(s) => name.starts_with(s.as_str()),
            NameCondition::EndsWith(s) => name.ends_with(s.as_str()),
            NameCondition::Contains(s) => name.contains(s.as_str()),
            NameCondition::Matches(re) => re.is_match(name),
            NameCondition::Synthetic(expected) => name.contains('$') == *expected,
            NameCondition::OnlySymbols => regex!(r"^[\p{P}\p{S}]+$").is_match(name),
            NameCondition::OnlyLetters => regex!(r"^\p{L}+$").is_match(name),
            NameCondition::OnlyNumbers => regex!(r"^\p{Nd}+$").is_match(name),
            NameCondition::OnlyLettersNumbers => regex!(r"^[\p{L}\p{Nd}]+$").is_match(name),
            NameCondition::OnlyLowercase => regex!(r"^\p{Ll}+$").is_match(name),
            NameCondition::OnlyUppercase => regex!(r"^\p{Lu}+$").is_match(name),
            NameCondition::Length(n) => name.chars().count() == *n,
            NameCondition::LengthRange(r) => r.contains(&name.chars().count()),
        }
    }
}

impl Hash for NameCondition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            NameCondition::Equals(s)
            | NameCondition::EqualsIgnoreCase(s)
            | NameCondition::StartsWith(s)
            | NameCondition::EndsWith(s)
            | NameCondition::Contains(s) => s.hash(state),
            NameCondition::Matches(re) => re.as_str().hash(state),
            NameCondition::Synthetic(b) => b.hash(state),
            NameCondition::Length(n) => n.hash(state),
            NameCondition::LengthRange(r) => r.hash(state),
            NameCondition::OnlySymbols
            | NameCondition::OnlyLetters
            | NameCondition::OnlyNumbers
            | NameCondition::OnlyLettersNumbers
            | NameCondition::OnlyLowercase
            | NameCondition::OnlyUppercase => {}
        }
    }
}

impl fmt::Display for NameCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameCondition::Equals(s) => write!(f, "equalsOf:\"{s}\""),
            NameCondition::EqualsIgnoreCase(s) => write!(f, "equalsOf:\"{s}\" ignoreCase"),
            NameCondition::StartsWith(s) => write!(f, "startsWith:\"{s}\""),
            NameCondition::EndsWith(s) => write!(f, "endsWith:\"{s}\""),
            NameCondition::Contains(s) => write!(f, "contains:\"{s}\""),
            NameCondition::Matches(re) => write!(f, "matches:/{}/", re.as_str()),
            NameCondition::Synthetic(b) => write!(f, "isSynthetic:{b}"),
            NameCondition::OnlySymbols => f.write_str("isOnlySymbols"),
            NameCondition::OnlyLetters => f.write_str("isOnlyLetters"),
            NameCondition::OnlyNumbers => f.write_str("isOnlyNumbers"),
            NameCondition::OnlyLettersNumbers => f.write_str("isOnlyLettersNumbers"),
            NameCondition::OnlyLowercase => f.write_str("isOnlyLowercase"),
            NameCondition::OnlyUppercase => f.write_str("isOnlyUppercase"),
            NameCondition::Length(n) => write!(f, "length:{n}"),
            NameCondition::LengthRange(r) => write!(f, "length:{}..={}", r.start(), r.end()),
        }
    }
}

/// Conjunction of name conditions, for obfuscated or renamed members.
///
/// ```
/// use memberfind::NameMatcher;
///
/// let m = NameMatcher::new().starts_with("get").only_letters();
/// assert!(m.test("getName"));
/// assert!(!m.test("get_name"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NameMatcher {
    conditions: Vec<NameCondition>,
}

impl NameMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(mut self, value: impl Into<String>) -> Self {
        self.conditions.push(NameCondition::Equals(value.into()));
        self
    }

    pub fn equals_ignore_case(mut self, value: impl Into<String>) -> Self {
        self.conditions.push(NameCondition::EqualsIgnoreCase(value.into()));
        self
    }

    pub fn starts_with(mut self, prefix: impl Into<String>) -> Self {
        self.conditions.push(NameCondition::StartsWith(prefix.into()));
        self
    }

    pub fn ends_with(mut self, suffix: impl Into<String>) -> Self {
        self.conditions.push(NameCondition::EndsWith(suffix.into()));
        self
    }

    pub fn contains(mut self, part: impl Into<String>) -> Self {
        self.conditions.push(NameCondition::Contains(part.into()));
        self
    }

    pub fn matches(mut self, regex: Regex) -> Self {
        self.conditions.push(NameCondition::Matches(regex));
        self
    }

    /// Compiler-generated names carry a `$`.
    pub fn synthetic(mut self, expected: bool) -> Self {
        self.conditions.push(NameCondition::Synthetic(expected));
        self
    }

    pub fn only_symbols(mut self) -> Self {
        self.conditions.push(NameCondition::OnlySymbols);
        self
    }

    pub fn only_letters(mut self) -> Self {
        self.conditions.push(NameCondition::OnlyLetters);
        self
    }

    pub fn only_numbers(mut self) -> Self {
        self.conditions.push(NameCondition::OnlyNumbers);
        self
    }

    pub fn only_letters_numbers(mut self) -> Self {
        self.conditions.push(NameCondition::OnlyLettersNumbers);
        self
    }

    pub fn only_lowercase(mut self) -> Self {
        self.conditions.push(NameCondition::OnlyLowercase);
        self
    }

    pub fn only_uppercase(mut self) -> Self {
        self.conditions.push(NameCondition::OnlyUppercase);
        self
    }

    pub fn length(mut self, len: usize) -> Self {
        self.conditions.push(NameCondition::Length(len));
        self
    }

    pub fn length_range(mut self, range: RangeInclusive<usize>) -> Self {
        self.conditions.push(NameCondition::LengthRange(range));
        self
    }

    pub fn test(&self, name: &str) -> bool {
        self.conditions.iter().all(|c| c.holds(name))
    }
}

impl Matcher<str> for NameMatcher {
    fn evaluate(&self, value: &str) -> bool {
        self.test(value)
    }

    fn describe(&self) -> Option<String> {
        let parts: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
        Some(parts.join(", "))
    }

    fn fingerprint(&self) -> Option<u64> {
        let mut hasher = FxHasher::default();
        "name".hash(&mut hasher);
        self.conditions.hash(&mut hasher);
        Some(hasher.finish())
    }
}

impl From<NameMatcher> for Predicate<str> {
    fn from(value: NameMatcher) -> Self {
        Predicate::from_matcher(value)
    }
}

// --- Modifiers --------------------------------------------------------------

/// Required and forbidden access flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierMatcher {
    required: Modifiers,
    forbidden: Modifiers,
}

impl ModifierMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is(mut self, flags: Modifiers) -> Self {
        self.required |= flags;
        self
    }

    pub fn not(mut self, flags: Modifiers) -> Self {
        self.forbidden |= flags;
        self
    }
}

impl Matcher<Modifiers> for ModifierMatcher {
    fn evaluate(&self, value: &Modifiers) -> bool {
        value.contains(self.required) && !value.intersects(self.forbidden)
    }

    fn describe(&self) -> Option<String> {
        let mut parts: Vec<String> = self.required.keywords().into_iter().map(str::to_string).collect();
        parts.extend(self.forbidden.keywords().into_iter().map(|kw| format!("!{kw}")));
        Some(parts.join(" "))
    }

    fn fingerprint(&self) -> Option<u64> {
        let mut hasher = FxHasher::default();
        "modifiers".hash(&mut hasher);
        self.required.bits().hash(&mut hasher);
        self.forbidden.bits().hash(&mut hasher);
        Some(hasher.finish())
    }
}

impl From<ModifierMatcher> for Predicate<Modifiers> {
    fn from(value: ModifierMatcher) -> Self {
        Predicate::from_matcher(value)
    }
}

/// A bare flag set means "all of these".
impl From<Modifiers> for Predicate<Modifiers> {
    fn from(value: Modifiers) -> Self {
        Predicate::from_matcher(ModifierMatcher::new().is(value))
    }
}

// --- Parameter types --------------------------------------------------------

/// One position in a parameter-type list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    Exact(TypeName),
    /// Accept any type at this position.
    Any,
}

impl ParamType {
    pub fn accepts(&self, ty: &TypeName) -> bool {
        match self {
            ParamType::Exact(expected) => expected == ty,
            ParamType::Any => true,
        }
    }
}

impl From<TypeName> for ParamType {
    fn from(value: TypeName) -> Self {
        ParamType::Exact(value)
    }
}

impl From<&TypeName> for ParamType {
    fn from(value: &TypeName) -> Self {
        ParamType::Exact(value.clone())
    }
}

impl From<&str> for ParamType {
    fn from(value: &str) -> Self {
        ParamType::Exact(TypeName::from(value))
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Exact(ty) => write!(f, "{ty}"),
            ParamType::Any => f.write_str("*"),
        }
    }
}
