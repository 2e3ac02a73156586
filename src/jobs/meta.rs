//! Metadata-setting job.

use crate::envelope::Envelope;
use crate::job::Job;
use crate::metadata::MetadataValue;
use crate::stream::{Receiver, Sender};
use crate::thread::Thread;
use async_trait::async_trait;

type ValueFn<T> = dyn Fn(&Envelope<T>) -> MetadataValue + Send + Sync;

/// Sets one metadata key on every healthy envelope passing through.
/// Erred envelopes pass through untouched.
pub struct SetMetadata<T> {
    key: String,
    value: ValueSource<T>,
}

enum ValueSource<T> {
    Fixed(MetadataValue),
    Computed(Box<ValueFn<T>>),
}

impl<T> SetMetadata<T> {
    /// Set the key to a fixed value.
    pub fn value(key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self {
            key: key.into(),
            value: ValueSource::Fixed(value.into()),
        }
    }

    /// Compute the value from the envelope.
    pub fn computed(
        key: impl Into<String>,
        handler: impl Fn(&Envelope<T>) -> MetadataValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            value: ValueSource::Computed(Box::new(handler)),
        }
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> Job<T> for SetMetadata<T> {
    async fn run(&self, thread: Thread, input: Receiver<T>, output: Sender<T>) {
        while let Some(mut envelope) = input.recv(&thread).await {
            if envelope.error.is_none() {
                let value = match &self.value {
                    ValueSource::Fixed(value) => value.clone(),
                    ValueSource::Computed(handler) => handler(&envelope),
                };
                envelope.metadata.insert(self.key.clone(), value);
            }
            if !output.send(&thread, envelope).await {
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
    async fn test_sets_fixed_value() {
        let job = SetMetadata::value("lang", "en");
        let thread = Thread::new(CancellationToken::new());
        let (in_tx, in_rx) = stream::bounded(2);
        let (out_tx, out_rx) = stream::bounded(2);

        assert!(in_tx.push(Envelope::new("doc".to_string())).await);
        drop(in_tx);

        job.run(thread, in_rx, out_tx).await;

        let envelope = out_rx.pull().await.unwrap();
        assert_eq!(
            envelope.metadata.get("lang"),
            Some(&MetadataValue::String("en".into()))
        );
    }

    #[tokio::test]
    async fn test_computed_value_sees_envelope() {
        let job = SetMetadata::computed("length", |envelope: &Envelope<String>| {
            MetadataValue::Int(envelope.data.len() as i64)
        });
        let thread = Thread::new(CancellationToken::new());
        let (in_tx, in_rx) = stream::bounded(2);
        let (out_tx, out_rx) = stream::bounded(2);

        assert!(in_tx.push(Envelope::new("four".to_string())).await);
        drop(in_tx);

        job.run(thread, in_rx, out_tx).await;

        let envelope = out_rx.pull().await.unwrap();
        assert_eq!(envelope.metadata.get("length"), Some(&MetadataValue::Int(4)));
    }

    #[tokio::test]
    async fn test_skips_erred_envelopes() {
        let job = SetMetadata::value("touched", true);
        let thread = Thread::new(CancellationToken::new());
        let (in_tx, in_rx) = stream::bounded(2);
        let (out_tx, out_rx) = stream::bounded(2);

        let mut erred = Envelope::new("doc".to_string());
        erred.set_error("bad", "upstream");
        assert!(in_tx.push(erred).await);
        drop(in_tx);

        job.run(thread, in_rx, out_tx).await;

        let envelope = out_rx.pull().await.unwrap();
        assert!(!envelope.metadata.contains_key("touched"));
    }
}
