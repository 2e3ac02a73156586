//! Source jobs that inject envelopes into a pipeline.

use crate::envelope::Envelope;
use crate::job::Job;
use crate::stream::{Receiver, Sender};
use crate::thread::Thread;
use async_trait::async_trait;

/// A source emitting a fixed collection of items, one envelope each, in
/// order. Ignores its input stream.
pub struct IterSource<T> {
    items: Vec<T>,
}

impl<T> IterSource<T> {
    /// Create a source over the given items.
    pub fn new(items: impl Into<Vec<T>>) -> Self {
        Self {
            items: items.into(),
        }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Job<T> for IterSource<T> {
    async fn run(&self, thread: Thread, input: Receiver<T>, output: Sender<T>) {
        drop(input);
        for item in &self.items {
            if !output.send(&thread, Envelope::new(item.clone())).await {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_emits_all_items_in_order() {
        let source = IterSource::new([1, 2, 3]);
        let thread = Thread::new(CancellationToken::new());
        let (in_tx, in_rx) = stream::bounded(1);
        let (out_tx, out_rx) = stream::bounded(4);

        source.run(thread, in_rx, out_tx).await;
        drop(in_tx);

        let mut seen = Vec::new();
        let mut ids = Vec::new();
        while let Some(envelope) = out_rx.pull().await {
            seen.push(envelope.data);
            ids.push(envelope.id().to_string());
        }
        assert_eq!(seen, vec![1, 2, 3]);
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_stops_on_cancellation() {
        let source = IterSource::new((0..100).collect::<Vec<_>>());
        let token = CancellationToken::new();
        let thread = Thread::new(token.clone());
        let (_in_tx, in_rx) = stream::bounded::<i32>(1);
        let (out_tx, out_rx) = stream::bounded(1);

        token.cancel();
        source.run(thread, in_rx, out_tx).await;

        // At most the envelope already buffered got through.
        assert!(out_rx.len() <= 1);
    }
}
