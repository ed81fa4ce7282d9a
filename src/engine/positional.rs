//! Positional selection.
//!
//! Selectors are evaluated per slot. For a slot with a selector the engine
//! first computes `last`, the 0-based ordinal of the last declared candidate
//! that satisfies the slot on its own (-1 when none does). During the scan a
//! per-slot counter starts at -1 and advances whenever the slot holds; the
//! selector then compares that counter against its ordinal:
//!
//! ```text
//! index(k), k >= 0  ->  counter == k
//! index(k), k <  0  ->  counter == last + 1 + k      (-1 is the last match)
//! last()            ->  counter == last
//! ```
//!
//! Counters are independent: a selector on `name` never looks at how many
//! candidates satisfied `paramCount`.

use crate::rules::PositionalSelector;

impl PositionalSelector {
    /// True when the candidate whose slot counter is `counter` is the one this
    /// selector designates, given the last matching ordinal `last`.
    pub(crate) fn admits(&self, counter: i32, last: i32) -> bool {
        if counter < 0 {
            return false;
        }
        match (self.require_order, self.ordinal) {
            (true, k) if k >= 0 => counter == k,
            (true, k) => counter == last + 1 + k,
            (false, _) => counter == last,
        }
    }
}

/// 0-based ordinal of the last item satisfying `test`, or -1.
pub(crate) fn last_ordinal<T>(items: &[T], mut test: impl FnMut(&T) -> bool) -> i32 {
    items.iter().filter(|item| test(*item)).count() as i32 - 1
}

/// Running per-slot match counter.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SlotCursor {
    selector: Option<PositionalSelector>,
    counter: i32,
    last: i32,
}

impl SlotCursor {
    pub(crate) fn new(selector: Option<PositionalSelector>, last: i32) -> Self {
        SlotCursor { selector, counter: -1, last }
    }

    /// Record whether the slot held for the current candidate and return the
    /// term to feed into the candidate's conditions.
    pub(crate) fn step(&mut self, hold: bool) -> bool {
        if hold {
            self.counter += 1;
        }
        match &self.selector {
            Some(selector) => hold && selector.admits(self.counter, self.last),
            None => hold,
        }
    }
}
