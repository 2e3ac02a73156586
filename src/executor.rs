//! The executor materializes a compiled stage list into a running graph.

use crate::error::{Error, Result};
use crate::job::Job;
use crate::stage::{join, Stage};
use crate::stream::{self, Receiver, Sender};
use crate::thread::Thread;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A compiled pipeline, ready to run.
///
/// An executor owns the pipeline's external input and output endpoints
/// and drives exactly one run: it wires the stages together with bounded
/// streams, spawns one worker task per stage, and waits for completion,
/// a fatal error or cancellation. Build one per run from a
/// [`Pipeline`](crate::builder::Pipeline).
///
/// An executor is itself a [`Job`]: a built pipeline can be placed inside
/// an outer pipeline wherever a job is accepted. In that nested role it
/// runs over the caller's streams and thread instead of its own.
pub struct Executor<T> {
    pub(crate) stages: Vec<Stage<T>>,
    pub(crate) buffer_size: usize,
    input_tx: Option<Sender<T>>,
    input_rx: Option<Receiver<T>>,
    output_tx: Option<Sender<T>>,
    output_rx: Option<Receiver<T>>,
}

impl<T: Clone + Send + 'static> Executor<T> {
    pub(crate) fn new(stages: Vec<Stage<T>>, buffer_size: usize) -> Self {
        let (input_tx, input_rx) = stream::bounded(buffer_size);
        let (output_tx, output_rx) = stream::bounded(buffer_size);
        Self {
            stages,
            buffer_size,
            input_tx: Some(input_tx),
            input_rx: Some(input_rx),
            output_tx: Some(output_tx),
            output_rx: Some(output_rx),
        }
    }

    /// Take the producer endpoint of the external input stream.
    ///
    /// Callers drive a pipeline whose first stage is not a source by
    /// pushing envelopes here, then closing the sender. Returns `None`
    /// once taken. When the endpoint is never taken, the input stream
    /// simply never closes, which is fine for pipelines that start with a
    /// source job, which ignores its input.
    pub fn input(&mut self) -> Option<Sender<T>> {
        self.input_tx.take()
    }

    /// Take the consumer endpoint of the external output stream.
    ///
    /// A top-level pipeline must either end in a sink stage or have this
    /// endpoint drained; otherwise the last stage blocks on a full stream
    /// and the run never completes.
    pub fn output(&mut self) -> Option<Receiver<T>> {
        self.output_rx.take()
    }

    /// Drive the pipeline to completion.
    ///
    /// Creates the run's [`Thread`] from a child of `base`, spawns one
    /// worker per stage, and waits for the first of: a fatal error (the
    /// run is cancelled, all workers are joined, and the wrapped error is
    /// returned), cancellation of `base` ([`Error::Cancelled`] after all
    /// workers exit), or normal completion (the elapsed time is
    /// returned).
    pub async fn start(&mut self, base: CancellationToken) -> Result<Duration> {
        let started = Instant::now();
        let (Some(input), Some(output)) = (self.input_rx.take(), self.output_tx.take()) else {
            return Err(Error::AlreadyStarted);
        };
        let thread = Thread::new(base.child_token());

        let workers = self.spawn_workers(&thread, input, output);
        let mut done = tokio::spawn(async move {
            for worker in workers {
                join(worker).await;
            }
        });

        let failure = tokio::select! {
            biased;
            fatal = thread.fatal_reported() => {
                // Cancel before joining: workers blocked on full
                // downstream buffers unblock through the signal.
                thread.cancel();
                tracing::debug!("pipeline stopped on fatal error");
                Some(Error::Fatal(fatal))
            }
            _ = thread.cancelled() => {
                tracing::debug!("pipeline cancelled");
                Some(Error::Cancelled)
            }
            _ = &mut done => None,
        };

        match failure {
            Some(err) => {
                let _ = done.await;
                Err(err)
            }
            None => Ok(started.elapsed()),
        }
    }

    /// Spawn one worker per stage over `n + 1` streams: the external
    /// input, `n - 1` fresh internal streams, and the external output.
    fn spawn_workers(
        &self,
        thread: &Thread,
        input: Receiver<T>,
        output: Sender<T>,
    ) -> Vec<JoinHandle<()>> {
        let Some((last, head)) = self.stages.split_last() else {
            // Degenerate empty pipeline: pump the input dry and close the
            // output.
            let pump_thread = thread.clone();
            return vec![tokio::spawn(async move {
                while input.recv(&pump_thread).await.is_some() {}
                drop(output);
            })];
        };

        let buffer_size = self.buffer_size;
        let mut handles = Vec::with_capacity(self.stages.len());
        let mut upstream = input;

        for stage in head {
            let (tx, rx) = stream::bounded(buffer_size);
            let stage = stage.clone();
            let stage_thread = thread.clone();
            handles.push(tokio::spawn(async move {
                stage.run(buffer_size, stage_thread, upstream, tx).await;
            }));
            upstream = rx;
        }

        let stage = last.clone();
        let stage_thread = thread.clone();
        handles.push(tokio::spawn(async move {
            stage.run(buffer_size, stage_thread, upstream, output).await;
        }));

        handles
    }
}

/// The nested entry point: run the pipeline as a stage of an outer one,
/// over the caller's streams and thread.
///
/// No thread of its own is created: cancellation and fatal reports flow
/// through the caller's. Fatal errors are observed by whichever executor
/// owns the thread.
#[async_trait]
impl<T: Clone + Send + 'static> Job<T> for Executor<T> {
    async fn run(&self, thread: Thread, input: Receiver<T>, output: Sender<T>) {
        let workers = self.spawn_workers(&thread, input, output);
        for worker in workers {
            join(worker).await;
        }
    }
}
