//! Live capture session handle.
//!
//! [`RemoteSession`] binds the `trace/*` wire methods to one capture over
//! an existing [`ServiceClient`] connection. Disposal is guarded by an
//! atomic latch so it runs once no matter how many exit paths reach it,
//! and is a notification on the wire so it stays safe to issue while an
//! `event` call is still in flight on the same connection.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::service::client::ServiceClient;
use crate::service::types::{SessionOptions, TraceEventKind, TraceStatus};
use crate::service::TraceSession;
use crate::{AppError, Result};

/// Handle to one capture session on the daemon.
#[derive(Debug)]
pub struct RemoteSession {
    /// Connection the session lives on.
    client: Arc<ServiceClient>,
    /// Set once the first dispose ran; later calls are no-ops.
    disposed: AtomicBool,
    /// Bounded wait for handing the dispose notification to the writer.
    dispose_grace: Duration,
}

impl RemoteSession {
    /// Bind a new session handle to `client`.
    #[must_use]
    pub fn new(client: Arc<ServiceClient>, dispose_grace: Duration) -> Self {
        Self {
            client,
            disposed: AtomicBool::new(false),
            dispose_grace,
        }
    }
}

impl TraceSession for RemoteSession {
    fn initialize(
        &self,
        options: &SessionOptions,
    ) -> Pin<Box<dyn Future<Output = Result<TraceStatus>> + Send + '_>> {
        let params = serde_json::to_value(options);
        Box::pin(async move {
            let params = params.map_err(|err| {
                AppError::Rpc(format!(
                    "trace/initialize: failed to serialize options: {err}"
                ))
            })?;
            let value = self.client.request("trace/initialize", params).await?;
            serde_json::from_value(value)
                .map_err(|err| AppError::Rpc(format!("trace/initialize: invalid reply: {err}")))
        })
    }

    fn event(
        &self,
        kind: TraceEventKind,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TraceStatus>>> + Send + '_>> {
        Box::pin(async move {
            if self.disposed.load(Ordering::Acquire) {
                return Err(AppError::Rpc("trace/event: session disposed".to_owned()));
            }

            let value = self
                .client
                .request("trace/event", json!({ "event": kind }))
                .await?;
            if value.is_null() {
                return Ok(None);
            }
            let status: TraceStatus = serde_json::from_value(value)
                .map_err(|err| AppError::Rpc(format!("trace/event: invalid reply: {err}")))?;
            Ok(Some(status))
        })
    }

    fn dispose(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if self.disposed.swap(true, Ordering::AcqRel) {
                debug!("trace session already disposed");
                return;
            }

            // Best effort: the session must never hang shutdown on a stuck
            // writer, so the notification send is time-bounded.
            let send = self.client.notify("trace/dispose", json!({}));
            match tokio::time::timeout(self.dispose_grace, send).await {
                Ok(Ok(())) => debug!("trace session disposed"),
                Ok(Err(err)) => debug!(error = %err, "dispose notification not sent"),
                Err(_) => debug!("dispose notification timed out"),
            }
        })
    }
}
