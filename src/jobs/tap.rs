//! Pass-through observation job.

use crate::job::Job;
use crate::stream::{Receiver, Sender};
use crate::thread::Thread;
use async_trait::async_trait;

/// Forwards every envelope unchanged, logging it on the way through.
pub struct Tap {
    message: String,
}

impl Tap {
    /// Create a tap; `message` prefixes every log line.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> Job<T> for Tap {
    async fn run(&self, thread: Thread, input: Receiver<T>, output: Sender<T>) {
        while let Some(envelope) = input.recv(&thread).await {
            match &envelope.error {
                Some(err) => {
                    let stage = envelope.error_stage.as_deref().unwrap_or("");
                    tracing::warn!(id = %envelope.id(), stage, error = %err, "{}", self.message);
                }
                None => tracing::info!(id = %envelope.id(), "{}", self.message),
            }
            if !output.send(&thread, envelope).await {
                return;
            }
        }
    }
}
