//! Pass-through counting job.

use crate::job::Job;
use crate::stream::{Receiver, Sender};
use crate::thread::Thread;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counts healthy envelopes passing through, forwarding them unchanged.
/// Erred envelopes are forwarded but not counted.
pub struct Counter {
    count: Arc<AtomicU64>,
}

impl Counter {
    /// A counter starting at zero.
    pub fn new() -> Self {
        Self {
            count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The number of envelopes counted so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Shared handle to the count, for reading after the counter has been
    /// moved into a pipeline.
    pub fn handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.count)
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> Job<T> for Counter {
    async fn run(&self, thread: Thread, input: Receiver<T>, output: Sender<T>) {
        while let Some(envelope) = input.recv(&thread).await {
            if envelope.error.is_none() {
                self.count.fetch_add(1, Ordering::Relaxed);
            }
            if !output.send(&thread, envelope).await {
                return;
            }
        }
    }
}
