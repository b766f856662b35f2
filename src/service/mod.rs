//! Capture daemon protocol: wire types, codec, client, and the session
//! handle.
//!
//! The orchestrator in [`crate::capture`] never talks to the daemon
//! directly. It consumes the two traits defined here, [`TraceTargetSource`]
//! and [`TraceSession`], so target resolution and the capture state machine
//! can be tested against scripted implementations. [`client::ServiceClient`]
//! and [`session::RemoteSession`] are the shipped implementations speaking
//! newline-delimited JSON over TCP.

pub mod client;
pub mod codec;
pub mod session;
pub mod types;

use std::future::Future;
use std::pin::Pin;

use crate::Result;
pub use types::{
    Api, AppTarget, Device, ServerInfo, SessionOptions, TraceEventKind, TraceState, TraceStatus,
    TraceTarget,
};

/// Source of launchable trace targets, queried per device during target
/// resolution.
pub trait TraceTargetSource: Send + Sync {
    /// Find the targets on `device` whose name or URI matches `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Rpc`](crate::AppError::Rpc) when the query fails
    /// for this device. The resolver treats a per-device failure as "no
    /// candidates from this device", not as a fatal error.
    fn find_trace_targets(
        &self,
        device: &Device,
        filter: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<TraceTarget>>> + Send + '_>>;
}

/// A negotiated capture session.
///
/// The controller drives one session through
/// initialize → poll → stop → dispose. Implementations must tolerate
/// `dispose` racing an in-flight `event` call and must make `dispose`
/// idempotent.
pub trait TraceSession: Send + Sync {
    /// Initialize the session with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Rpc`](crate::AppError::Rpc) when the daemon
    /// rejects the options or the wire call fails. An initialization
    /// failure is fatal to the session.
    fn initialize(
        &self,
        options: &SessionOptions,
    ) -> Pin<Box<dyn Future<Output = Result<TraceStatus>> + Send + '_>>;

    /// Send one event into the session and wait for the resulting status.
    ///
    /// `Ok(None)` means the daemon acknowledged the event without a status
    /// payload; the poll loop treats that as "retry later", never as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::EndOfStream`](crate::AppError::EndOfStream) when
    /// the daemon has closed the stream (benign completion) and
    /// [`AppError::Rpc`](crate::AppError::Rpc) for every other failure.
    fn event(
        &self,
        kind: TraceEventKind,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TraceStatus>>> + Send + '_>>;

    /// Release the session. Idempotent; never fails.
    fn dispose(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}
