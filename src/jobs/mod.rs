//! Built-in leaf jobs: sources, sinks and pass-through utilities.
//!
//! These are ordinary users of the [`Job`](crate::job::Job) contract,
//! packaged because nearly every pipeline needs them: something to inject
//! envelopes, something to consume them at the tail, and a few
//! pass-through helpers for observation and metadata.

mod counter;
mod meta;
mod sink;
mod source;
mod tap;

pub use counter::Counter;
pub use meta::SetMetadata;
pub use sink::{Collect, Drain};
pub use source::IterSource;
pub use tap::Tap;
