use std::fmt;

/// Which of several matching candidates a slot means.
///
/// - `at(k)` with `k >= 0`: the `k`-th match (0-based) in enumeration order.
/// - `at(k)` with `k < 0`: counted from the end, `at(-1)` is the last match.
/// - `last()`: the last match, without requiring a fixed ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionalSelector {
    pub ordinal: i32,
    pub require_order: bool,
}

impl PositionalSelector {
    pub const fn at(ordinal: i32) -> Self {
        PositionalSelector { ordinal, require_order: true }
    }

    pub const fn first() -> Self {
        Self::at(0)
    }

    pub const fn last() -> Self {
        PositionalSelector { ordinal: 0, require_order: false }
    }
}

impl fmt::Display for PositionalSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.require_order { write!(f, "index({})", self.ordinal) } else { f.write_str("last()") }
    }
}

/// Handle returned by every slot setter; attaches a selector to that slot.
///
/// Dropping the handle without calling anything leaves the slot unselected.
pub struct Positional<'a> {
    selector: &'a mut Option<PositionalSelector>,
}

impl<'a> Positional<'a> {
    pub(crate) fn new(selector: &'a mut Option<PositionalSelector>) -> Self {
        Positional { selector }
    }

    pub fn index(self, ordinal: i32) {
        *self.selector = Some(PositionalSelector::at(ordinal));
    }

    pub fn first(self) {
        *self.selector = Some(PositionalSelector::first());
    }

    pub fn last(self) {
        *self.selector = Some(PositionalSelector::last());
    }

    pub fn select(self, selector: PositionalSelector) {
        *self.selector = Some(selector);
    }
}
