//! Error types for Venturi.

use thiserror::Error;

/// Result type alias using Venturi's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Opaque error payload carried by envelopes and fatal reports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for pipeline runs.
#[derive(Error, Debug)]
pub enum Error {
    /// The run was cancelled through the caller's cancellation token.
    #[error("pipeline cancelled")]
    Cancelled,

    /// A job reported an unrecoverable failure through its [`Thread`].
    ///
    /// [`Thread`]: crate::thread::Thread
    #[error("executor error: {0}")]
    Fatal(#[source] BoxError),

    /// The executor was asked to drive a second run. Each executor drives
    /// exactly one run; build another from the same pipeline.
    #[error("executor already started")]
    AlreadyStarted,
}
