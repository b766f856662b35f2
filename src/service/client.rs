//! Request/response client for the capture daemon.
//!
//! One TCP connection, newline-delimited JSON both ways. Requests carry a
//! numeric `id`; the daemon echoes it on the matching reply, so calls can
//! be issued concurrently and correlated through a pending map of oneshot
//! channels. A reader task and a writer task own the two stream halves;
//! the [`ServiceClient`] handle is cheap to share and cancels both tasks
//! when dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::service::codec::WireCodec;
use crate::service::session::RemoteSession;
use crate::service::types::{Device, ServerInfo, TraceTarget};
use crate::service::TraceTargetSource;
use crate::{AppError, Result};

/// Outstanding calls waiting for their reply, keyed by request id.
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>>;

// ── Wire envelopes ────────────────────────────────────────────────────────────

/// Outbound request line. A missing `id` marks a notification that expects
/// no reply.
#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    /// Correlation id; echoed by the daemon on the reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    /// Wire method, e.g. `trace/initialize`.
    method: &'a str,
    /// Method-specific parameters.
    params: Value,
}

/// Inbound reply line.
#[derive(Debug, Deserialize)]
struct WireReply {
    /// Correlation id of the request this reply answers.
    id: Option<u64>,
    /// Payload on success.
    result: Option<Value>,
    /// Error message on failure.
    error: Option<String>,
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Shared handle to one daemon connection.
#[derive(Debug)]
pub struct ServiceClient {
    /// Next request id. Ids are unique per connection, starting at 1.
    next_id: AtomicU64,
    /// Serialized request lines handed to the writer task.
    line_tx: mpsc::Sender<String>,
    /// Calls awaiting their reply.
    pending: PendingMap,
    /// Cancels the reader and writer tasks.
    cancel: CancellationToken,
}

impl ServiceClient {
    /// Connect to the daemon at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Connect`] when the TCP connection cannot be
    /// established within `connect_timeout`.
    pub async fn connect(addr: &str, connect_timeout: Duration) -> Result<Self> {
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                AppError::Connect(format!(
                    "timed out connecting to {addr} after {connect_timeout:?}"
                ))
            })?
            .map_err(|err| AppError::Connect(format!("failed to connect to {addr}: {err}")))?;

        info!(%addr, "connected to capture daemon");
        let (read_half, write_half) = stream.into_split();
        Ok(Self::from_parts(read_half, write_half))
    }

    /// Build a client over an already-established byte stream.
    ///
    /// Spawns the reader and writer tasks. Used by [`Self::connect`] and by
    /// in-memory duplex tests.
    #[must_use]
    pub fn from_parts<R, W>(read_half: R, write_half: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (line_tx, line_rx) = mpsc::channel::<String>(32);
        let cancel = CancellationToken::new();

        tokio::spawn(run_reader(read_half, Arc::clone(&pending), cancel.clone()));
        tokio::spawn(run_writer(write_half, line_rx, cancel.clone()));

        Self {
            next_id: AtomicU64::new(1),
            line_tx,
            pending,
            cancel,
        }
    }

    /// Issue `method` with `params` and wait for the correlated reply.
    ///
    /// An absent `result` field on a successful reply yields
    /// [`Value::Null`].
    pub(crate) async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = serde_json::to_string(&WireRequest {
            id: Some(id),
            method,
            params,
        })
        .map_err(|err| AppError::Rpc(format!("{method}: failed to serialize request: {err}")))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        {
            self.pending.lock().await.insert(id, reply_tx);
        }

        if self.line_tx.send(line).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(AppError::Rpc(format!("{method}: connection closed")));
        }

        // A dropped sender means the client shut down mid-call; surface the
        // same benign marker as a daemon-side stream close.
        let reply = reply_rx.await.map_err(|_| AppError::EndOfStream)?;
        reply.map_err(|err| match err {
            AppError::Rpc(msg) => AppError::Rpc(format!("{method}: {msg}")),
            other => other,
        })
    }

    /// Send `method` as a notification; no reply is expected or awaited.
    pub(crate) async fn notify(&self, method: &str, params: Value) -> Result<()> {
        let line = serde_json::to_string(&WireRequest {
            id: None,
            method,
            params,
        })
        .map_err(|err| AppError::Rpc(format!("{method}: failed to serialize request: {err}")))?;

        self.line_tx
            .send(line)
            .await
            .map_err(|_| AppError::Rpc(format!("{method}: connection closed")))
    }

    /// Query daemon identity and capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Rpc`] on wire failure or a malformed reply.
    pub async fn server_info(&self) -> Result<ServerInfo> {
        let value = self.request("server/info", json!({})).await?;
        serde_json::from_value(value)
            .map_err(|err| AppError::Rpc(format!("server/info: invalid reply: {err}")))
    }

    /// List the identifiers of every device the daemon knows.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Rpc`] on wire failure or a malformed reply.
    pub async fn list_devices(&self) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct Reply {
            devices: Vec<String>,
        }

        let value = self.request("devices/list", json!({})).await?;
        let reply: Reply = serde_json::from_value(value)
            .map_err(|err| AppError::Rpc(format!("devices/list: invalid reply: {err}")))?;
        Ok(reply.devices)
    }

    /// Fetch the full description of one device.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Rpc`] on wire failure or a malformed reply.
    pub async fn device(&self, id: &str) -> Result<Device> {
        let value = self.request("devices/get", json!({ "device": id })).await?;
        serde_json::from_value(value)
            .map_err(|err| AppError::Rpc(format!("devices/get: invalid reply: {err}")))
    }

    /// Find the trace targets on `device` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Rpc`] on wire failure or a malformed reply.
    pub async fn trace_targets(&self, device: &Device, filter: &str) -> Result<Vec<TraceTarget>> {
        #[derive(Deserialize)]
        struct Reply {
            targets: Vec<TraceTarget>,
        }

        let value = self
            .request(
                "targets/find",
                json!({ "device": device.id, "filter": filter }),
            )
            .await?;
        let reply: Reply = serde_json::from_value(value)
            .map_err(|err| AppError::Rpc(format!("targets/find: invalid reply: {err}")))?;
        Ok(reply.targets)
    }

    /// Open a capture session handle over this connection.
    ///
    /// `dispose_grace` bounds how long a best-effort dispose waits to hand
    /// its notification to the writer task.
    #[must_use]
    pub fn trace(self: &Arc<Self>, dispose_grace: Duration) -> RemoteSession {
        RemoteSession::new(Arc::clone(self), dispose_grace)
    }
}

impl Drop for ServiceClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl TraceTargetSource for ServiceClient {
    fn find_trace_targets(
        &self,
        device: &Device,
        filter: &str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<TraceTarget>>> + Send + '_>>
    {
        let device = device.clone();
        let filter = filter.to_owned();
        Box::pin(async move { self.trace_targets(&device, &filter).await })
    }
}

// ── Reader / writer tasks ─────────────────────────────────────────────────────

/// Reader task: decode reply lines and resolve the matching pending calls.
///
/// On a clean stream close every outstanding call resolves with
/// [`AppError::EndOfStream`]; on a connection error they resolve with
/// [`AppError::Rpc`]. Framing errors on a single line are skipped.
async fn run_reader<R>(read_half: R, pending: PendingMap, cancel: CancellationToken)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut framed = FramedRead::new(read_half, WireCodec::new());

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("daemon reader: cancellation received, stopping");
                break;
            }

            item = framed.next() => {
                match item {
                    None => {
                        debug!("daemon reader: stream closed");
                        drain_pending(&pending, || AppError::EndOfStream).await;
                        break;
                    }

                    Some(Err(AppError::Rpc(ref msg))) => {
                        // Framing error on one line, e.g. line too long.
                        warn!(error = msg.as_str(), "daemon reader: framing error, skipping line");
                    }

                    Some(Err(err)) => {
                        warn!(error = %err, "daemon reader: connection error, stopping");
                        let msg = format!("connection lost: {err}");
                        drain_pending(&pending, || AppError::Rpc(msg.clone())).await;
                        break;
                    }

                    Some(Ok(line)) => dispatch_line(&pending, &line).await,
                }
            }
        }
    }
}

/// Resolve the pending call a reply line answers, if any.
async fn dispatch_line(pending: &PendingMap, line: &str) {
    if line.trim().is_empty() {
        return;
    }

    let reply: WireReply = match serde_json::from_str(line) {
        Ok(reply) => reply,
        Err(err) => {
            warn!(error = %err, "daemon reader: malformed reply, skipping line");
            return;
        }
    };

    let Some(id) = reply.id else {
        debug!("daemon reader: reply without id, skipping");
        return;
    };

    let waiter = { pending.lock().await.remove(&id) };
    let Some(reply_tx) = waiter else {
        // Replies to notifications or to calls that already gave up.
        debug!(id, "daemon reader: no pending call for reply");
        return;
    };

    let outcome = match reply.error {
        Some(message) => Err(AppError::Rpc(message)),
        None => Ok(reply.result.unwrap_or(Value::Null)),
    };
    let _ = reply_tx.send(outcome);
}

/// Resolve every outstanding call with an error built by `make_err`.
async fn drain_pending(pending: &PendingMap, make_err: impl Fn() -> AppError) {
    let waiters: Vec<_> = pending.lock().await.drain().collect();
    for (id, reply_tx) in waiters {
        debug!(id, "daemon reader: failing outstanding call");
        let _ = reply_tx.send(Err(make_err()));
    }
}

/// Writer task: encode queued request lines onto the stream.
async fn run_writer<W>(write_half: W, mut line_rx: mpsc::Receiver<String>, cancel: CancellationToken)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut framed = FramedWrite::new(write_half, WireCodec::new());

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("daemon writer: cancellation received, stopping");
                break;
            }

            line = line_rx.recv() => {
                match line {
                    None => {
                        debug!("daemon writer: request channel closed, stopping");
                        break;
                    }
                    Some(line) => {
                        if let Err(err) = framed.send(line).await {
                            warn!(error = %err, "daemon writer: write failed, stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}
