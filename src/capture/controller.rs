//! Capture session state machine.
//!
//! One controller drives one session: initialize, then poll for status
//! until the capture finishes, the stream ends, a poll fails, or the
//! session is cancelled. Whatever the exit path, the session is disposed
//! exactly once before the controller returns.
//!
//! The interactive begin/stop activity is spawned lazily, on the first
//! status that shows captured bytes, and at most once; the controller
//! holds the input source in an `Option` and hands it over on that first
//! trigger.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::capture::interactive::run_interactive;
use crate::service::{SessionOptions, TraceEventKind, TraceSession, TraceState};
use crate::{AppError, Result};

/// How a capture session ended, short of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutcome {
    /// The daemon reported the capture done and finalized.
    Done,
    /// The daemon closed the status stream; the capture is over.
    EndOfStream,
    /// The session was interrupted and shut down cleanly.
    Cancelled,
}

/// Drives one capture session from initialization to disposal.
pub struct SessionController<I> {
    /// The session under control.
    session: Arc<dyn TraceSession>,
    /// Fixed delay between retryable status polls.
    status_interval: Duration,
    /// Cancelled on interrupt; wakes the loop mid-poll and mid-sleep.
    cancel: CancellationToken,
    /// Interactive input, consumed when the activity spawns.
    interactive_input: Option<I>,
}

impl<I> SessionController<I>
where
    I: AsyncBufRead + Unpin + Send + 'static,
{
    /// Build a controller for `session`.
    #[must_use]
    pub fn new(
        session: Arc<dyn TraceSession>,
        status_interval: Duration,
        cancel: CancellationToken,
        interactive_input: I,
    ) -> Self {
        Self {
            session,
            status_interval,
            cancel,
            interactive_input: Some(interactive_input),
        }
    }

    /// Run the session to completion.
    ///
    /// # Errors
    ///
    /// Returns the initialization error when the daemon rejects `options`
    /// or drops the connection mid-handshake, or the first non-benign
    /// poll error. Once polling has begun, [`AppError::EndOfStream`] is
    /// not an error; it maps to [`TraceOutcome::EndOfStream`].
    pub async fn run(mut self, options: &SessionOptions) -> Result<TraceOutcome> {
        // Initialization can hang on an unresponsive daemon; an interrupt
        // must still reach the session.
        let initialized = tokio::select! {
            biased;

            () = self.cancel.cancelled() => {
                info!("initialization cancelled");
                self.session.dispose().await;
                return Ok(TraceOutcome::Cancelled);
            }

            result = self.session.initialize(options) => result,
        };

        match initialized {
            Ok(status) => {
                debug!(state = ?status.state, "session initialized");
            }
            Err(err) => {
                error!(error = %err, "session initialization failed");
                self.session.dispose().await;
                return Err(err);
            }
        }

        let outcome = self.poll(options.defer_start).await;
        self.session.dispose().await;
        outcome
    }

    /// Poll for status until a terminal condition.
    ///
    /// Attempt classification, in order: end-of-stream is benign
    /// completion; any other error stops the loop; a missing status is
    /// retryable; a status with captured bytes reports progress and
    /// triggers the one-time interactive spawn; `Done` completes;
    /// anything else retries after the fixed interval. There is no
    /// attempt cap: as long as the daemon keeps answering, the loop
    /// keeps polling.
    async fn poll(&mut self, defer_start: bool) -> Result<TraceOutcome> {
        loop {
            let attempt = tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    info!("poll cancelled");
                    return Ok(TraceOutcome::Cancelled);
                }

                result = self.session.event(TraceEventKind::Status) => result,
            };

            match attempt {
                Err(AppError::EndOfStream) => {
                    info!("status stream ended");
                    return Ok(TraceOutcome::EndOfStream);
                }

                Err(err) => {
                    error!(error = %err, "status poll failed");
                    return Err(err);
                }

                Ok(None) => {
                    debug!("no status available yet");
                }

                Ok(Some(status)) => {
                    debug!(
                        state = ?status.state,
                        bytes_captured = status.bytes_captured,
                        "status accepted"
                    );

                    if status.bytes_captured > 0 {
                        info!(bytes_captured = status.bytes_captured, "capturing");

                        if let Some(input) = self.interactive_input.take() {
                            tokio::spawn(run_interactive(
                                Arc::clone(&self.session),
                                input,
                                defer_start,
                            ));
                        }
                    }

                    if status.state == TraceState::Done {
                        return Ok(TraceOutcome::Done);
                    }
                }
            }

            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    info!("poll cancelled");
                    return Ok(TraceOutcome::Cancelled);
                }

                () = tokio::time::sleep(self.status_interval) => {}
            }
        }
    }
}
