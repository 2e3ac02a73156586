//! Bounded streams of envelopes connecting pipeline stages.
//!
//! A stream is a thin wrapper around a kanal channel. The sender side is
//! deliberately not cloneable: every stream has exactly one writer, and
//! dropping the sender is what closes the stream, on every exit path
//! including panics. The receiver side is cloneable so a worker pool can
//! compete for envelopes on one stream.

use crate::envelope::Envelope;
use crate::thread::Thread;

/// Create a bounded stream with the given capacity.
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = kanal::bounded(capacity);
    (Sender { inner: tx }, Receiver { inner: rx })
}

/// Writing half of a stream. Single owner; dropping it closes the stream.
pub struct Sender<T> {
    inner: kanal::Sender<Envelope<T>>,
}

impl<T> Sender<T> {
    /// Send an envelope, giving up if the run is cancelled first.
    ///
    /// Returns `false` when the run was cancelled or the reader is gone;
    /// the envelope is dropped in either case and the job should return.
    pub async fn send(&self, thread: &Thread, envelope: Envelope<T>) -> bool {
        tokio::select! {
            _ = thread.cancelled() => false,
            sent = self.inner.as_async().send(envelope) => sent.is_ok(),
        }
    }

    /// Send an envelope from outside a run, without a cancellation signal.
    ///
    /// This is the producer side of an executor's external input. Returns
    /// `false` if the stream is closed.
    pub async fn push(&self, envelope: Envelope<T>) -> bool {
        self.inner.as_async().send(envelope).await.is_ok()
    }

    /// Close the stream, signalling that no more envelopes will arrive.
    /// The reader drains anything still buffered before observing closure.
    ///
    /// Dropping the sender has the same effect.
    pub fn close(self) {}

    /// Whether the reading side has gone away.
    pub fn is_closed(&self) -> bool {
        self.inner.is_disconnected()
    }

    /// Number of envelopes currently buffered.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Reading half of a stream. Cloneable: clones compete for envelopes.
pub struct Receiver<T> {
    inner: kanal::Receiver<Envelope<T>>,
}

impl<T> Receiver<T> {
    /// Receive the next envelope, giving up if the run is cancelled first.
    ///
    /// Returns `None` when the stream has closed and drained, or when the
    /// run was cancelled; the job should return in either case.
    pub async fn recv(&self, thread: &Thread) -> Option<Envelope<T>> {
        tokio::select! {
            _ = thread.cancelled() => None,
            received = self.inner.as_async().recv() => received.ok(),
        }
    }

    /// Receive from outside a run, without a cancellation signal.
    ///
    /// This is the consumer side of an executor's external output.
    /// Returns `None` once the stream has closed and drained.
    pub async fn pull(&self) -> Option<Envelope<T>> {
        self.inner.as_async().recv().await.ok()
    }

    /// Number of envelopes currently buffered.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
