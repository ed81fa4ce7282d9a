//! Package gating for class searches.
//!
//! A loader can expose tens of thousands of class names. Before any class is
//! loaded, the engine scans the raw name list and keeps only names whose
//! package is admitted by the rule set's `from_package` entries:
//!
//! - **Absolute** entries admit exactly one package.
//! - Other entries admit the package and everything below it, by prefix.
//!
//! No entries admits everything. Names without a `.` are their own package,
//! so `from_package("Plain", true)` admits the default-package class `Plain`.
//!
//! ## Design notes
//!
//! - Prefix matching is textual, the same way the loader reports names:
//!   `com.demo` also admits `com.demonstration`. Use an absolute entry or a
//!   trailing `.` when that matters.

use crate::model::package_of;
use crate::rules::PackageRule;

#[derive(Debug, Clone, Copy)]
pub(crate) struct PackageFilter<'r> {
    rules: &'r [PackageRule],
}

impl<'r> PackageFilter<'r> {
    pub(crate) fn new(rules: &'r [PackageRule]) -> Self {
        PackageFilter { rules }
    }

    pub(crate) fn admits(&self, class_name: &str) -> bool {
        if self.rules.is_empty() {
            return true;
        }
        let package = package_of(class_name);
        self.rules.iter().any(|rule| {
            if rule.absolute { package == rule.name } else { package.starts_with(rule.name.as_str()) }
        })
    }

    /// Names from `all` this filter admits, in loader order.
    pub(crate) fn scan<'a>(self, all: &'a [String]) -> impl Iterator<Item = &'a str> {
        all.iter().map(String::as_str).filter(move |name| self.admits(name))
    }
}
