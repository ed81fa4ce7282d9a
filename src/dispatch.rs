//! Background resolution thread.
//!
//! Asynchronous lookups hand their enumerate-and-evaluate step to a single
//! named worker thread over an unbounded channel. Jobs run in submission
//! order. There is no cancellation: once submitted, a job runs to completion.
//!
//! Dropping the worker closes the channel; the thread drains what is queued
//! and exits, and the drop joins it.

use std::io;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};

use crate::engine::LOG_TARGET;

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct ResolveWorker {
    tx: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl ResolveWorker {
    /// Start the worker thread.
    pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
        let (tx, rx) = channel::unbounded::<Job>();
        let handle = thread::Builder::new().name(name.into()).spawn(move || {
            while let Ok(job) = rx.recv() {
                job();
            }
        })?;
        Ok(ResolveWorker { tx: Some(tx), handle: Some(handle) })
    }

    /// Queue a job. Hands the job back if the worker has gone away.
    pub(crate) fn submit(&self, job: Job) -> Result<(), Job> {
        match &self.tx {
            Some(tx) => tx.send(job).map_err(|err| err.into_inner()),
            None => Err(job),
        }
    }
}

impl Drop for ResolveWorker {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(target: LOG_TARGET, "resolve worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for ResolveWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveWorker").field("running", &self.tx.is_some()).finish()
    }
}
