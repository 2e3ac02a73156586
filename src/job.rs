//! The job contract and the packaged transform/filter helpers.

use crate::envelope::Envelope;
use crate::error::BoxError;
use crate::stream::{Receiver, Sender};
use crate::thread::Thread;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// A job is one processing unit of a pipeline: it pumps envelopes from an
/// input stream to an output stream.
///
/// The contract every implementation honors:
///
/// - drain `input` until it closes or the run is cancelled, producing zero
///   or more envelopes into `output`;
/// - the output stream closes exactly once, when `run` returns and drops
///   the sender, on normal completion, cancellation and panic alike;
/// - blocking stream operations observe the thread's cancellation signal
///   (the [`Sender::send`] / [`Receiver::recv`] pair does this already);
///   on cancellation the job returns promptly without draining the rest;
/// - no references to envelopes are retained after `run` returns.
///
/// Jobs take `&self` because a worker-pool stage runs several workers over
/// one instance concurrently; stateful jobs use interior mutability.
#[async_trait]
pub trait Job<T>: Send + Sync
where
    T: Clone + Send + 'static,
{
    /// Pump `input` into `output` until the input closes or the run is
    /// cancelled.
    async fn run(&self, thread: Thread, input: Receiver<T>, output: Sender<T>);
}

/// A reference-counted job, as stored in stages. Stages share job
/// instances between workers and between executors built from the same
/// pipeline.
pub type SharedJob<T> = Arc<dyn Job<T>>;

/// Wrap a job for use in stages that take a collection of jobs, such as
/// [`Pipeline::broadcast`](crate::builder::Pipeline::broadcast).
pub fn shared<T, J>(job: J) -> SharedJob<T>
where
    T: Clone + Send + 'static,
    J: Job<T> + 'static,
{
    Arc::new(job)
}

/// Adapter turning an async closure into a [`Job`].
///
/// ```rust,ignore
/// let passthrough = JobFn::new(|thread: Thread, input: Receiver<i64>, output: Sender<i64>| async move {
///     while let Some(envelope) = input.recv(&thread).await {
///         if !output.send(&thread, envelope).await {
///             return;
///         }
///     }
/// });
/// ```
pub struct JobFn<F> {
    run: F,
}

impl<F> JobFn<F> {
    /// Wrap the closure.
    pub fn new(run: F) -> Self {
        Self { run }
    }
}

#[async_trait]
impl<T, F, Fut> Job<T> for JobFn<F>
where
    T: Clone + Send + 'static,
    F: Fn(Thread, Receiver<T>, Sender<T>) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    async fn run(&self, thread: Thread, input: Receiver<T>, output: Sender<T>) {
        (self.run)(thread, input, output).await;
    }
}

/// Result returned by transform handlers.
pub type TransformResult = std::result::Result<Verdict, BoxError>;

/// Decision returned by a transform handler for one envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Forward the envelope downstream.
    Forward,
    /// Consume the envelope without forwarding.
    Discard,
}

/// A 1:1 mapping job built from a handler function.
///
/// For each received envelope the handler is invoked with mutable access
/// to it, unless the envelope already carries an error: erred envelopes
/// pass through untouched so a downstream recovery stage (built with
/// [`also_on_error`](Transform::also_on_error)) can repair them.
///
/// A handler error does not stop the pipeline: it is attached to the
/// envelope together with this transform's label, and the envelope is
/// still forwarded.
pub struct Transform<F> {
    label: String,
    also_on_error: bool,
    handler: F,
}

impl<F> Transform<F> {
    /// Create a transform. The label names this stage in the
    /// `error_stage` field of envelopes it fails.
    pub fn new(label: impl Into<String>, handler: F) -> Self {
        Self {
            label: label.into(),
            also_on_error: false,
            handler,
        }
    }

    /// Invoke the handler for envelopes that already carry an error too.
    /// This is how recovery stages are built.
    pub fn also_on_error(mut self) -> Self {
        self.also_on_error = true;
        self
    }
}

#[async_trait]
impl<T, F> Job<T> for Transform<F>
where
    T: Clone + Send + 'static,
    F: Fn(&mut Envelope<T>) -> TransformResult + Send + Sync,
{
    async fn run(&self, thread: Thread, input: Receiver<T>, output: Sender<T>) {
        while let Some(mut envelope) = input.recv(&thread).await {
            if envelope.error.is_none() || self.also_on_error {
                match (self.handler)(&mut envelope) {
                    Ok(Verdict::Forward) => {}
                    Ok(Verdict::Discard) => continue,
                    Err(err) => {
                        envelope.set_error(err, self.label.as_str());
                    }
                }
            }
            if !output.send(&thread, envelope).await {
                return;
            }
        }
    }
}

/// A filtering job: forwards envelopes the predicate accepts, drops the
/// rest. Errors are not consulted.
pub struct Filter<F> {
    predicate: F,
}

impl<F> Filter<F> {
    /// Create a filter from a predicate.
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

#[async_trait]
impl<T, F> Job<T> for Filter<F>
where
    T: Clone + Send + 'static,
    F: Fn(&Envelope<T>) -> bool + Send + Sync,
{
    async fn run(&self, thread: Thread, input: Receiver<T>, output: Sender<T>) {
        while let Some(envelope) = input.recv(&thread).await {
            if (self.predicate)(&envelope) {
                if !output.send(&thread, envelope).await {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream;
    use tokio_util::sync::CancellationToken;

    fn test_thread() -> Thread {
        Thread::new(CancellationToken::new())
    }

    #[tokio::test]
    async fn test_transform_maps_in_order() {
        let uppercase = Transform::new("uppercase", |envelope: &mut Envelope<String>| {
            envelope.data = envelope.data.to_uppercase();
            Ok(Verdict::Forward)
        });

        let (in_tx, in_rx) = stream::bounded(4);
        let (out_tx, out_rx) = stream::bounded(4);
        assert!(in_tx.push(Envelope::new("hello".to_string())).await);
        assert!(in_tx.push(Envelope::new("world".to_string())).await);
        drop(in_tx);

        uppercase.run(test_thread(), in_rx, out_tx).await;

        assert_eq!(out_rx.pull().await.map(|e| e.data), Some("HELLO".into()));
        assert_eq!(out_rx.pull().await.map(|e| e.data), Some("WORLD".into()));
        assert!(out_rx.pull().await.is_none());
    }

    #[tokio::test]
    async fn test_transform_discard_drops_envelope() {
        let odd_only = Transform::new("odd_only", |envelope: &mut Envelope<i64>| {
            if envelope.data % 2 == 0 {
                Ok(Verdict::Discard)
            } else {
                Ok(Verdict::Forward)
            }
        });

        let (in_tx, in_rx) = stream::bounded(8);
        let (out_tx, out_rx) = stream::bounded(8);
        for i in 0..6 {
            assert!(in_tx.push(Envelope::new(i)).await);
        }
        drop(in_tx);

        odd_only.run(test_thread(), in_rx, out_tx).await;

        let mut seen = Vec::new();
        while let Some(envelope) = out_rx.pull().await {
            seen.push(envelope.data);
        }
        assert_eq!(seen, vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn test_transform_error_attached_and_forwarded() {
        let failing = Transform::new("failing", |_: &mut Envelope<String>| -> TransformResult {
            Err("transform error".into())
        });

        let (in_tx, in_rx) = stream::bounded(2);
        let (out_tx, out_rx) = stream::bounded(2);
        assert!(in_tx.push(Envelope::new("test".to_string())).await);
        drop(in_tx);

        failing.run(test_thread(), in_rx, out_tx).await;

        let envelope = out_rx.pull().await.expect("envelope is still forwarded");
        assert!(envelope.has_error());
        assert_eq!(
            envelope.error.as_ref().unwrap().to_string(),
            "transform error"
        );
        assert_eq!(envelope.error_stage.as_deref(), Some("failing"));
    }

    #[tokio::test]
    async fn test_transform_skips_erred_envelopes() {
        let shout = Transform::new("shout", |envelope: &mut Envelope<String>| {
            envelope.data.push('!');
            Ok(Verdict::Forward)
        });

        let (in_tx, in_rx) = stream::bounded(2);
        let (out_tx, out_rx) = stream::bounded(2);
        let mut erred = Envelope::new("broken".to_string());
        erred.set_error("earlier failure", "upstream");
        assert!(in_tx.push(erred).await);
        drop(in_tx);

        shout.run(test_thread(), in_rx, out_tx).await;

        let envelope = out_rx.pull().await.expect("erred envelope passes through");
        assert_eq!(envelope.data, "broken");
        assert!(envelope.has_error());
    }

    #[tokio::test]
    async fn test_transform_also_on_error_recovers() {
        let recover = Transform::new("recover", |envelope: &mut Envelope<String>| {
            envelope.error = None;
            envelope.error_stage = None;
            envelope.data = format!("recovered_{}", envelope.data);
            Ok(Verdict::Forward)
        })
        .also_on_error();

        let (in_tx, in_rx) = stream::bounded(2);
        let (out_tx, out_rx) = stream::bounded(2);
        let mut erred = Envelope::new("broken".to_string());
        erred.set_error("earlier failure", "upstream");
        assert!(in_tx.push(erred).await);
        drop(in_tx);

        recover.run(test_thread(), in_rx, out_tx).await;

        let envelope = out_rx.pull().await.unwrap();
        assert_eq!(envelope.data, "recovered_broken");
        assert!(!envelope.has_error());
    }

    #[tokio::test]
    async fn test_filter_forwards_matching() {
        let evens = Filter::new(|envelope: &Envelope<i64>| envelope.data % 2 == 0);

        let (in_tx, in_rx) = stream::bounded(16);
        let (out_tx, out_rx) = stream::bounded(16);
        for i in 0..10 {
            assert!(in_tx.push(Envelope::new(i)).await);
        }
        drop(in_tx);

        evens.run(test_thread(), in_rx, out_tx).await;

        let mut seen = Vec::new();
        while let Some(envelope) = out_rx.pull().await {
            seen.push(envelope.data);
        }
        assert_eq!(seen, vec![0, 2, 4, 6, 8]);
    }

    #[tokio::test]
    async fn test_job_fn_adapter() {
        let passthrough = JobFn::new(
            |thread: Thread, input: Receiver<String>, output: Sender<String>| async move {
                while let Some(envelope) = input.recv(&thread).await {
                    if !output.send(&thread, envelope).await {
                        return;
                    }
                }
            },
        );

        let (in_tx, in_rx) = stream::bounded(2);
        let (out_tx, out_rx) = stream::bounded(2);
        assert!(in_tx.push(Envelope::new("test".to_string())).await);
        drop(in_tx);

        passthrough.run(test_thread(), in_rx, out_tx).await;

        assert_eq!(out_rx.pull().await.map(|e| e.data), Some("test".into()));
        assert!(out_rx.pull().await.is_none());
    }
}
