//! # Venturi
//!
//! A typed, composable, concurrent dataflow engine.
//!
//! A pipeline is a linear chain of stages executing against a stream of
//! envelope-wrapped values. Stages run as concurrent tasks connected by
//! bounded streams; fan-out stages clone envelopes per branch for
//! isolation, and a shared cancellation signal plus a two-tier error model
//! (recoverable per-envelope errors, fatal run-level errors) keep runs
//! controllable.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use venturi::prelude::*;
//!
//! let shout = Transform::new("shout", |envelope: &mut Envelope<String>| {
//!     envelope.data = envelope.data.to_uppercase();
//!     Ok(Verdict::Forward)
//! });
//!
//! let mut exec = Pipeline::new()
//!     .linear(IterSource::new(["hi".to_string(), "ok".to_string()]))
//!     .worker_pool(shout, 4)
//!     .linear(Drain::new())
//!     .build();
//!
//! exec.start(CancellationToken::new()).await?;
//! ```
//!
//! A built pipeline is itself a job: pass it to
//! [`Pipeline::linear`](builder::Pipeline::linear) (or any other stage)
//! of an outer pipeline to nest it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod job;
pub mod jobs;
pub mod metadata;
mod stage;
pub mod stream;
pub mod template;
pub mod thread;

pub use error::{BoxError, Error, Result};

pub use tokio_util::sync::CancellationToken;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::builder::Pipeline;
    pub use crate::envelope::{Envelope, EnvelopeError};
    pub use crate::error::{BoxError, Error, Result};
    pub use crate::executor::Executor;
    pub use crate::job::{
        shared, Filter, Job, JobFn, SharedJob, Transform, TransformResult, Verdict,
    };
    pub use crate::jobs::{Collect, Counter, Drain, IterSource, SetMetadata, Tap};
    pub use crate::metadata::{Metadata, MetadataValue};
    pub use crate::stream::{Receiver, Sender};
    pub use crate::thread::Thread;
    pub use crate::CancellationToken;
}
