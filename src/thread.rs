//! Cancellation and fatal-error carrier shared by every worker of one run.

use crate::error::BoxError;
use tokio_util::sync::CancellationToken;

/// A `Thread` is handed to every job of one pipeline run. It carries the
/// run's cancellation signal and a slot for the first fatal error.
///
/// Cancellation is cooperative: jobs observe the signal through the
/// stream operations (or [`Thread::cancelled`] directly) and return
/// promptly once it fires. Fatal errors flow the other way: a job reports
/// one through [`Thread::report_fatal`] and the executor cancels the run.
///
/// Cloning is cheap; all clones observe the same run.
#[derive(Clone)]
pub struct Thread {
    token: CancellationToken,
    fatal_tx: kanal::Sender<BoxError>,
    fatal_rx: kanal::Receiver<BoxError>,
}

impl Thread {
    /// Create the carrier for one run from its cancellation token.
    ///
    /// The executor derives the token from the caller's base token; tests
    /// that drive a job directly pass a fresh one.
    pub fn new(token: CancellationToken) -> Self {
        let (fatal_tx, fatal_rx) = kanal::bounded(1);
        Self {
            token,
            fatal_tx,
            fatal_rx,
        }
    }

    /// Non-blocking observation of the cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the run is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// The raw cancellation handle, for select-style waits in jobs that
    /// block on something other than a pipeline stream.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Report an unrecoverable error.
    ///
    /// Never blocks: the first report is kept and triggers cancellation
    /// once the executor observes it; subsequent reports are dropped.
    pub fn report_fatal(&self, err: impl Into<BoxError>) {
        let _ = self.fatal_tx.try_send(err.into());
    }

    /// Non-blocking pull of a reported fatal error.
    pub fn try_take_fatal(&self) -> Option<BoxError> {
        self.fatal_rx.try_recv().ok().flatten()
    }

    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the first fatal report. Never resolves if none arrives.
    pub(crate) async fn fatal_reported(&self) -> BoxError {
        match self.fatal_rx.as_async().recv().await {
            Ok(err) => err,
            // The thread itself holds a sender, so the channel cannot
            // disconnect while this future is alive.
            Err(_) => std::future::pending().await,
        }
    }
}
