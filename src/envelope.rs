//! The unit of data flowing through a pipeline.

use crate::error::BoxError;
use crate::metadata::Metadata;
use std::sync::Arc;
use uuid::Uuid;

/// Error payload attached to a single envelope.
///
/// Reference-counted so that clones of an envelope observe the same
/// underlying error value.
pub type EnvelopeError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// An envelope wraps one payload on its way through the pipeline, together
/// with a stable identity, free-form metadata and an optional recoverable
/// error.
///
/// Envelopes are owned by exactly one job at a time: they travel over
/// exactly one stream between stages, so the owning job may mutate them
/// freely. Fan-out stages clone envelopes per branch to preserve that
/// isolation.
///
/// # Examples
///
/// ```
/// use venturi::envelope::Envelope;
///
/// let mut envelope = Envelope::new(String::from("payload"));
/// envelope.metadata.insert("lang".into(), "en".into());
/// assert!(!envelope.has_error());
/// ```
#[derive(Debug)]
pub struct Envelope<T> {
    id: String,
    /// The payload.
    pub data: T,
    /// Arbitrary key-value pairs travelling with the payload.
    pub metadata: Metadata,
    /// Recoverable error attached by a stage; `None` means healthy.
    ///
    /// Assign the fields directly to repair an envelope: clear both
    /// `error` and `error_stage`.
    pub error: Option<EnvelopeError>,
    /// Label of the stage that attached `error`.
    pub error_stage: Option<String>,
}

impl<T> Envelope<T> {
    /// Create an envelope with a generated id, empty metadata and no error.
    pub fn new(data: T) -> Self {
        Self::with_id(generate_id(), data)
    }

    /// Create an envelope with a caller-supplied id.
    ///
    /// Any string is accepted; ids are not validated.
    pub fn with_id(id: impl Into<String>, data: T) -> Self {
        Self {
            id: id.into(),
            data,
            metadata: Metadata::new(),
            error: None,
            error_stage: None,
        }
    }

    /// The stable identifier assigned at construction.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Attach a recoverable error together with the label of the stage
    /// that produced it. Returns the envelope for fluent use.
    pub fn set_error(&mut self, err: impl Into<BoxError>, stage: impl Into<String>) -> &mut Self {
        self.error = Some(Arc::from(err.into()));
        self.error_stage = Some(stage.into());
        self
    }

    /// Whether a recoverable error is attached.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

impl<T: Clone> Clone for Envelope<T> {
    /// Shallow copy: same id, cloned payload, a fresh metadata map holding
    /// the same entries, and the same error state.
    ///
    /// The payload is not deep-copied; payloads holding shared mutable
    /// state across branches are the caller's concern.
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            data: self.data.clone(),
            metadata: self.metadata.clone(),
            error: self.error.clone(),
            error_stage: self.error_stage.clone(),
        }
    }
}

/// 128 random bits, hex-encoded: collision-resistant without coordination.
fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
