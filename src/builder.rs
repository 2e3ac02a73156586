//! Fluent pipeline builder.

use crate::executor::Executor;
use crate::job::{Job, SharedJob};
use crate::stage::Stage;
use std::sync::Arc;

/// Streams between stages hold one envelope unless configured otherwise.
const DEFAULT_BUFFER_SIZE: usize = 1;

/// A builder accumulating stages for a pipeline over payloads of type `T`.
///
/// Stages execute in the order they are appended. [`build`](Self::build)
/// compiles a snapshot into an [`Executor`]; the builder stays usable and
/// every executor is independent.
///
/// Top-level pipelines must end in a sink stage (a job that consumes
/// without forwarding), or the caller must drain the executor's
/// [`output`](Executor::output) endpoint; the engine does not insert a
/// sink on its own.
///
/// ```rust,ignore
/// let mut exec = Pipeline::new()
///     .linear(IterSource::new(["a".to_string(), "b".to_string()]))
///     .worker_pool(expensive_job, 4)
///     .linear(Drain::new())
///     .build();
/// exec.start(CancellationToken::new()).await?;
/// ```
pub struct Pipeline<T> {
    stages: Vec<Stage<T>>,
    buffer_size: usize,
}

impl<T: Clone + Send + 'static> Pipeline<T> {
    /// Create an empty pipeline with the default buffer size.
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Append a linear stage running one job. Chain calls to add several
    /// jobs in sequence.
    pub fn linear(mut self, job: impl Job<T> + 'static) -> Self {
        self.stages.push(Stage::Linear { job: Arc::new(job) });
        self
    }

    /// Append a broadcast stage: every envelope is delivered as a fresh
    /// clone to each of the given jobs, and their outputs are merged.
    pub fn broadcast(mut self, jobs: Vec<SharedJob<T>>) -> Self {
        self.stages.push(Stage::Broadcast { jobs });
        self
    }

    /// Append a worker-pool stage: `workers` instances of one job compete
    /// for envelopes, each envelope processed by exactly one of them.
    /// A count of zero is coerced to one.
    pub fn worker_pool(mut self, job: impl Job<T> + 'static, workers: usize) -> Self {
        self.stages.push(Stage::WorkerPool {
            job: Arc::new(job),
            workers: workers.max(1),
        });
        self
    }

    /// Set the buffer size of the streams between stages. A size of zero
    /// is coerced to one. Fixed for the lifetime of a built executor.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Compile the current stages into an executor.
    pub fn build(&self) -> Executor<T> {
        Executor::new(self.stages.clone(), self.buffer_size)
    }
}

impl<T: Clone + Send + 'static> Default for Pipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use crate::job::{shared, Transform, Verdict};

    fn noop() -> Transform<impl Fn(&mut Envelope<i64>) -> crate::job::TransformResult> {
        Transform::new("noop", |_: &mut Envelope<i64>| Ok(Verdict::Forward))
    }

    #[test]
    fn test_new_pipeline_is_empty() {
        let pipeline = Pipeline::<i64>::new();
        assert!(pipeline.stages.is_empty());
        assert_eq!(pipeline.buffer_size, DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn test_linear_appends_one_stage_per_call() {
        let pipeline = Pipeline::new().linear(noop()).linear(noop());
        assert_eq!(pipeline.stages.len(), 2);
        assert!(pipeline
            .stages
            .iter()
            .all(|stage| matches!(stage, Stage::Linear { .. })));
    }

    #[test]
    fn test_broadcast_is_a_single_stage() {
        let pipeline = Pipeline::new().broadcast(vec![shared(noop()), shared(noop())]);
        assert_eq!(pipeline.stages.len(), 1);
        match &pipeline.stages[0] {
            Stage::Broadcast { jobs } => assert_eq!(jobs.len(), 2),
            _ => panic!("expected a broadcast stage"),
        }
    }

    #[test]
    fn test_worker_pool_keeps_count() {
        let pipeline = Pipeline::new().worker_pool(noop(), 5);
        match &pipeline.stages[0] {
            Stage::WorkerPool { workers, .. } => assert_eq!(*workers, 5),
            _ => panic!("expected a worker-pool stage"),
        }
    }

    #[test]
    fn test_worker_pool_count_coerced() {
        let pipeline = Pipeline::new().worker_pool(noop(), 0);
        match &pipeline.stages[0] {
            Stage::WorkerPool { workers, .. } => assert_eq!(*workers, 1),
            _ => panic!("expected a worker-pool stage"),
        }
    }

    #[test]
    fn test_buffer_size_coerced_to_one() {
        let pipeline = Pipeline::<i64>::new().with_buffer_size(0);
        assert_eq!(pipeline.buffer_size, 1);
    }

    #[test]
    fn test_chaining_keeps_order() {
        let pipeline = Pipeline::new()
            .linear(noop())
            .broadcast(vec![shared(noop()), shared(noop())])
            .worker_pool(noop(), 3)
            .linear(noop())
            .with_buffer_size(50);

        assert_eq!(pipeline.stages.len(), 4);
        assert_eq!(pipeline.buffer_size, 50);
        assert!(matches!(pipeline.stages[0], Stage::Linear { .. }));
        assert!(matches!(pipeline.stages[1], Stage::Broadcast { .. }));
        assert!(matches!(pipeline.stages[2], Stage::WorkerPool { .. }));
        assert!(matches!(pipeline.stages[3], Stage::Linear { .. }));
    }

    #[test]
    fn test_build_snapshots_stages_and_buffer() {
        let pipeline = Pipeline::new().linear(noop()).with_buffer_size(10);
        let exec = pipeline.build();
        assert_eq!(exec.stages.len(), 1);
        assert_eq!(exec.buffer_size, 10);

        // The builder stays usable after build.
        let longer = pipeline.linear(noop());
        assert_eq!(longer.stages.len(), 2);
        assert_eq!(exec.stages.len(), 1);
    }

    #[test]
    fn test_nested_executors_are_jobs() {
        let inner_a = Pipeline::new().linear(noop());
        let inner_b = Pipeline::new().linear(noop());

        let pipeline = Pipeline::new()
            .linear(noop())
            .broadcast(vec![shared(noop()), shared(inner_a.build())])
            .linear(inner_b.build());

        assert_eq!(pipeline.stages.len(), 3);
    }
}
