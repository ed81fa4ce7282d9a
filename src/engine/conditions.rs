//! Boolean accumulator used while evaluating one candidate.
//!
//! Terms come in two flavours:
//!
//! - `and` terms must all hold.
//! - `opt` terms form one alternative group; when any are recorded, at least
//!   one of them must hold.
//!
//! Every term is recorded even after the verdict is already known. Callers
//! compute terms eagerly, so positional counters advance the same way whether
//! or not an earlier slot already failed.

#[derive(Debug, Clone, Copy)]
pub(crate) struct Conditions {
    all_and: bool,
    has_opt: bool,
    any_opt: bool,
}

impl Default for Conditions {
    fn default() -> Self {
        Conditions { all_and: true, has_opt: false, any_opt: false }
    }
}

impl Conditions {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn and(&mut self, term: bool) -> &mut Self {
        self.all_and &= term;
        self
    }

    pub(crate) fn opt(&mut self, term: bool) -> &mut Self {
        self.has_opt = true;
        self.any_opt |= term;
        self
    }

    pub(crate) fn verdict(&self) -> bool {
        self.all_and && (!self.has_opt || self.any_opt)
    }

    /// Run `action` if the verdict holds.
    pub(crate) fn finally(&self, action: impl FnOnce()) -> &Self {
        if self.verdict() {
            action();
        }
        self
    }

    /// Run `action` if the verdict does not hold.
    pub(crate) fn without(&self, action: impl FnOnce()) -> &Self {
        if !self.verdict() {
            action();
        }
        self
    }
}
