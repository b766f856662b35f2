//! Interrupt handling scoped to one capture session.
//!
//! [`InterruptGuard::register`] spawns a watcher task that cancels the
//! session's [`CancellationToken`] on the first ctrl-c (or SIGTERM on
//! unix). Dropping the guard aborts the watcher, so a signal arriving
//! after the session finished no longer touches the token. Registration
//! therefore lives exactly as long as the session it protects.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Active interrupt registration. Deregisters on drop.
#[derive(Debug)]
pub struct InterruptGuard {
    /// Background signal watcher; aborted on drop.
    watcher: JoinHandle<()>,
}

impl InterruptGuard {
    /// Start watching for an interrupt and cancel `session_cancel` when one
    /// arrives.
    ///
    /// The watcher also exits on its own when `session_cancel` is cancelled
    /// from elsewhere.
    #[must_use]
    pub fn register(session_cancel: CancellationToken) -> Self {
        let watcher = tokio::spawn(async move {
            tokio::select! {
                () = session_cancel.cancelled() => {
                    debug!("interrupt watcher: session token cancelled, exiting");
                }
                () = interrupt_signal() => {
                    info!("interrupt received, stopping capture");
                    session_cancel.cancel();
                }
            }
        });

        Self { watcher }
    }
}

impl Drop for InterruptGuard {
    /// Deregister: a signal after the session ended must not cancel anything.
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

/// Resolve on ctrl-c, or on SIGTERM where available.
async fn interrupt_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}
