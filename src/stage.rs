//! Stage topology primitives and their routing helpers.
//!
//! A stage wraps one or more jobs with a routing policy. Three shapes
//! exist: `Linear` runs a single job over the stage's streams; `Broadcast`
//! clones every envelope to each of its branches and merges the branch
//! outputs; `WorkerPool` runs N instances of one job competing for
//! envelopes on the shared input.

use crate::envelope::Envelope;
use crate::job::SharedJob;
use crate::stream::{self, Receiver, Sender};
use crate::thread::Thread;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub(crate) enum Stage<T> {
    Linear {
        job: SharedJob<T>,
    },
    Broadcast {
        jobs: Vec<SharedJob<T>>,
    },
    WorkerPool {
        job: SharedJob<T>,
        workers: usize,
    },
}

impl<T> Clone for Stage<T> {
    fn clone(&self) -> Self {
        match self {
            Stage::Linear { job } => Stage::Linear {
                job: Arc::clone(job),
            },
            Stage::Broadcast { jobs } => Stage::Broadcast {
                jobs: jobs.iter().map(Arc::clone).collect(),
            },
            Stage::WorkerPool { job, workers } => Stage::WorkerPool {
                job: Arc::clone(job),
                workers: *workers,
            },
        }
    }
}

impl<T: Clone + Send + 'static> Stage<T> {
    /// Run the stage over the given streams. `buffer` is the engine buffer
    /// size, used for the router-internal streams of the fan-out shapes.
    ///
    /// Returns only once every internal task has finished, so the stage
    /// output is closed by the time this resolves.
    pub(crate) async fn run(
        &self,
        buffer: usize,
        thread: Thread,
        input: Receiver<T>,
        output: Sender<T>,
    ) {
        match self {
            Stage::Linear { job } => job.run(thread, input, output).await,
            Stage::Broadcast { jobs } => broadcast(jobs, buffer, thread, input, output).await,
            Stage::WorkerPool { job, workers } => {
                worker_pool(job, *workers, buffer, thread, input, output).await;
            }
        }
    }
}

/// Broadcast wiring: one splitter feeding a dedicated input stream per
/// branch, one worker per branch, one merger folding the branch outputs.
async fn broadcast<T: Clone + Send + 'static>(
    jobs: &[SharedJob<T>],
    buffer: usize,
    thread: Thread,
    input: Receiver<T>,
    output: Sender<T>,
) {
    let mut branch_inputs = Vec::with_capacity(jobs.len());
    let mut branch_outputs = Vec::with_capacity(jobs.len());
    let mut workers = Vec::with_capacity(jobs.len());

    for job in jobs {
        let (in_tx, in_rx) = stream::bounded(buffer);
        let (out_tx, out_rx) = stream::bounded(buffer);
        let job = Arc::clone(job);
        let branch_thread = thread.clone();
        workers.push(tokio::spawn(async move {
            job.run(branch_thread, in_rx, out_tx).await;
        }));
        branch_inputs.push(in_tx);
        branch_outputs.push(out_rx);
    }

    let splitter = tokio::spawn(split(thread.clone(), input, branch_inputs));
    let merger = tokio::spawn(merge(thread.clone(), branch_outputs, output));

    join(splitter).await;
    for worker in workers {
        join(worker).await;
    }
    join(merger).await;
}

/// Worker-pool wiring: N workers competing on the shared input stream,
/// each with its own output, folded by one merger.
async fn worker_pool<T: Clone + Send + 'static>(
    job: &SharedJob<T>,
    workers: usize,
    buffer: usize,
    thread: Thread,
    input: Receiver<T>,
    output: Sender<T>,
) {
    let mut handles = Vec::with_capacity(workers);
    let mut worker_outputs = Vec::with_capacity(workers);

    for _ in 0..workers {
        let (out_tx, out_rx) = stream::bounded(buffer);
        let job = Arc::clone(job);
        let worker_thread = thread.clone();
        let shared_input = input.clone();
        handles.push(tokio::spawn(async move {
            job.run(worker_thread, shared_input, out_tx).await;
        }));
        worker_outputs.push(out_rx);
    }
    drop(input);

    let merger = tokio::spawn(merge(thread.clone(), worker_outputs, output));

    for handle in handles {
        join(handle).await;
    }
    join(merger).await;
}

/// Forward every envelope from `input` as a fresh clone into each branch.
/// The original envelope is never forwarded. Closes all branch inputs on
/// return.
async fn split<T: Clone + Send + 'static>(
    thread: Thread,
    input: Receiver<T>,
    branches: Vec<Sender<T>>,
) {
    while let Some(envelope) = input.recv(&thread).await {
        for branch in &branches {
            if !branch.send(&thread, envelope.clone()).await {
                return;
            }
        }
    }
}

/// Forward envelopes from all branch outputs into `output`, closing it
/// only after every branch output has closed.
async fn merge<T: Clone + Send + 'static>(
    thread: Thread,
    branches: Vec<Receiver<T>>,
    output: Sender<T>,
) {
    let mut pending: FuturesUnordered<_> = branches
        .into_iter()
        .map(|branch| pull_branch(branch, thread.clone()))
        .collect();

    while let Some((received, branch)) = pending.next().await {
        if let Some(envelope) = received {
            if !output.send(&thread, envelope).await {
                return;
            }
            pending.push(pull_branch(branch, thread.clone()));
        }
        // A branch that yielded None has closed; stop polling it.
    }
}

async fn pull_branch<T: Clone + Send + 'static>(
    branch: Receiver<T>,
    thread: Thread,
) -> (Option<Envelope<T>>, Receiver<T>) {
    let received = branch.recv(&thread).await;
    (received, branch)
}

/// Await a routing or worker task, logging panics instead of unwinding
/// into the stage.
pub(crate) async fn join(handle: JoinHandle<()>) {
    if let Err(err) = handle.await {
        if err.is_panic() {
            tracing::error!("pipeline worker panicked: {err}");
        }
    }
}
