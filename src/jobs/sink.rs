//! Terminal jobs that consume envelopes without forwarding.
//!
//! Every top-level pipeline needs one of these (or a caller draining the
//! executor's output endpoint): without a consumer at the tail, the last
//! stream fills up and the run never completes.

use crate::envelope::Envelope;
use crate::job::Job;
use crate::stream::{Receiver, Sender};
use crate::thread::Thread;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A sink that consumes every envelope and drops it, optionally logging
/// each one.
pub struct Drain {
    log: bool,
}

impl Drain {
    /// A silent drain.
    pub fn new() -> Self {
        Self { log: false }
    }

    /// A drain that logs every consumed envelope.
    pub fn logged() -> Self {
        Self { log: true }
    }
}

impl Default for Drain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> Job<T> for Drain {
    async fn run(&self, thread: Thread, input: Receiver<T>, output: Sender<T>) {
        drop(output);
        while let Some(envelope) = input.recv(&thread).await {
            if self.log {
                match &envelope.error {
                    Some(err) => {
                        let stage = envelope.error_stage.as_deref().unwrap_or("");
                        tracing::warn!(id = %envelope.id(), stage, error = %err, "envelope failed");
                    }
                    None => tracing::debug!(id = %envelope.id(), "envelope done"),
                }
            }
        }
    }
}

/// A sink that records every consumed envelope.
///
/// Take a handle with [`seen`](Collect::seen) before moving the sink into
/// a pipeline, then inspect it after the run.
pub struct Collect<T> {
    seen: Arc<Mutex<Vec<Envelope<T>>>>,
}

impl<T> Collect<T> {
    /// An empty collector.
    pub fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the envelopes consumed so far, in arrival order.
    pub fn seen(&self) -> Arc<Mutex<Vec<Envelope<T>>>> {
        Arc::clone(&self.seen)
    }
}

impl<T> Default for Collect<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> Job<T> for Collect<T> {
    async fn run(&self, thread: Thread, input: Receiver<T>, output: Sender<T>) {
        drop(output);
        while let Some(envelope) = input.recv(&thread).await {
            self.seen.lock().unwrap().push(envelope);
        }
    }
}
