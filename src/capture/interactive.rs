//! Interactive capture commands driven by line input.
//!
//! Runs as a detached task next to the poll loop, reading from any
//! [`AsyncBufRead`] source: the user's terminal in production, a scripted
//! buffer in tests. The activity never reports back into the poll loop;
//! failures here are logged and the capture continues under daemon
//! control.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::service::{TraceEventKind, TraceSession};

/// Prompt-driven begin/stop sequence for one capture session.
///
/// With `defer_start` the session was armed but not started, so the first
/// prompt issues [`TraceEventKind::Begin`]; a failure there ends the
/// activity, since there is nothing to stop. The stop prompt always
/// follows a started capture and its failure is only logged.
pub async fn run_interactive<I>(session: Arc<dyn TraceSession>, mut input: I, defer_start: bool)
where
    I: AsyncBufRead + Unpin + Send,
{
    if defer_start {
        println!("Press enter to start capturing...");
        read_any_line(&mut input).await;
        if let Err(err) = session.event(TraceEventKind::Begin).await {
            warn!(error = %err, "failed to start deferred capture");
            return;
        }
        debug!("deferred capture started");
    }

    println!("Press enter to stop capturing...");
    read_any_line(&mut input).await;
    if let Err(err) = session.event(TraceEventKind::Stop).await {
        warn!(error = %err, "failed to stop capture");
    }
}

/// Wait for one line. EOF and read errors count as a line, so a closed
/// stdin degrades into an immediate keypress rather than a hang.
async fn read_any_line<I>(input: &mut I)
where
    I: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if let Err(err) = input.read_line(&mut line).await {
        debug!(error = %err, "interactive input read failed, continuing");
    }
}
