//! Write-once result delivery.
//!
//! [`deferred`] returns a connected pair: the [`Resolver`] is the single
//! writer, the [`Deferred`] is a clonable reader. Resolving consumes the
//! resolver, so a value can be delivered at most once. Dropping the resolver
//! unresolved abandons the deferred and wakes every waiter with `None`.
//!
//! Callbacks registered with [`Deferred::on_ready`] run on the resolving
//! thread, or immediately on the registering thread if the value is already
//! there.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

type Callback<T> = Box<dyn FnOnce(&T) + Send>;

enum State<T> {
    Pending(Vec<Callback<T>>),
    Ready(Arc<T>),
    Abandoned,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

/// Reading half of a write-once value.
pub struct Deferred<T> {
    shared: Arc<Shared<T>>,
}

/// Writing half of a write-once value.
pub struct Resolver<T> {
    shared: Option<Arc<Shared<T>>>,
}

pub fn deferred<T>() -> (Resolver<T>, Deferred<T>) {
    let shared = Arc::new(Shared { state: Mutex::new(State::Pending(Vec::new())), ready: Condvar::new() });
    (Resolver { shared: Some(Arc::clone(&shared)) }, Deferred { shared })
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Deferred { shared: Arc::clone(&self.shared) }
    }
}

impl<T: Clone> Deferred<T> {
    /// Already-resolved deferred.
    pub fn ready(value: T) -> Self {
        let (resolver, deferred) = deferred();
        resolver.resolve(value);
        deferred
    }

    /// Block until resolved. `None` if the resolver was dropped.
    pub fn wait(&self) -> Option<T> {
        let mut state = self.shared.state.lock();
        loop {
            match &*state {
                State::Ready(value) => return Some(T::clone(value)),
                State::Abandoned => return None,
                State::Pending(_) => self.shared.ready.wait(&mut state),
            }
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        let mut state = self.shared.state.lock();
        if let State::Pending(_) = &*state {
            let _ = self.shared.ready.wait_while_for(&mut state, |s| matches!(s, State::Pending(_)), timeout);
        }
        match &*state {
            State::Ready(value) => Some(T::clone(value)),
            _ => None,
        }
    }

    pub fn try_get(&self) -> Option<T> {
        match &*self.shared.state.lock() {
            State::Ready(value) => Some(T::clone(value)),
            _ => None,
        }
    }
}

impl<T> Deferred<T> {
    pub fn is_ready(&self) -> bool {
        matches!(&*self.shared.state.lock(), State::Ready(_))
    }

    pub fn is_abandoned(&self) -> bool {
        matches!(&*self.shared.state.lock(), State::Abandoned)
    }

    /// Run `callback` once the value arrives. Never runs if abandoned.
    pub fn on_ready(&self, callback: impl FnOnce(&T) + Send + 'static) {
        let mut state = self.shared.state.lock();
        let value = match &mut *state {
            State::Pending(callbacks) => {
                callbacks.push(Box::new(callback));
                return;
            }
            State::Ready(value) => Arc::clone(value),
            State::Abandoned => return,
        };
        drop(state);
        callback(&value);
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.shared.state.lock() {
            State::Pending(_) => "pending",
            State::Ready(_) => "ready",
            State::Abandoned => "abandoned",
        };
        f.debug_struct("Deferred").field("state", &state).finish()
    }
}

impl<T> Resolver<T> {
    /// Deliver the value, run pending callbacks and wake waiters.
    pub fn resolve(mut self, value: T) {
        let Some(shared) = self.shared.take() else { return };
        let value = Arc::new(value);
        let callbacks = match std::mem::replace(&mut *shared.state.lock(), State::Ready(Arc::clone(&value))) {
            State::Pending(callbacks) => callbacks,
            State::Ready(_) | State::Abandoned => Vec::new(),
        };
        shared.ready.notify_all();

        // Outside the lock: callbacks may read this deferred again.
        for callback in callbacks {
            callback(&value);
        }
    }
}

impl<T> Drop for Resolver<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            let mut state = shared.state.lock();
            if let State::Pending(_) = &*state {
                *state = State::Abandoned;
            }
            drop(state);
            shared.ready.notify_all();
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").field("resolved", &self.shared.is_none()).finish()
    }
}
