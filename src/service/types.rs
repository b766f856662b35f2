//! Domain and wire types shared by the client, the resolver, and the
//! capture controller.
//!
//! Everything here serializes with `serde` into the daemon's JSON wire
//! shapes. Field names are the wire names.

use serde::{Deserialize, Serialize};

/// Graphics API a capture session can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Api {
    /// Vulkan command stream.
    Vulkan,
    /// `OpenGL` ES command stream.
    #[serde(rename = "opengles")]
    OpenGles,
    /// GVR layer on top of `OpenGL` ES.
    Gvr,
}

/// The application a session attaches to.
///
/// Exactly one selector exists per session; the two launch modes are
/// mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppTarget {
    /// Launch the application identified by this target URI.
    Uri(String),
    /// Attach to a process already listening on this local port.
    Port(u16),
}

/// Immutable description of one capture session, sent verbatim as the
/// `trace/initialize` parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)] // independent wire fields, not a state machine
pub struct SessionOptions {
    /// Application selector (URI launch or port attach).
    pub app: AppTarget,
    /// Identifier of the device the session runs on.
    pub device: String,
    /// APIs to record.
    pub apis: Vec<Api>,
    /// Extra command-line arguments passed to the launched application.
    pub additional_args: Vec<String>,
    /// Working directory for the launched application.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Environment entries (`KEY=VALUE`) for the launched application.
    pub env: Vec<String>,
    /// Automatic stop after this many seconds; `0.0` captures manually.
    pub duration_seconds: f32,
    /// Observe frame data every N frames (`0` disables).
    pub observe_frame_frequency: u32,
    /// Observe draw data every N draws (`0` disables).
    pub observe_draw_frequency: u32,
    /// Frame index at which capture starts.
    pub start_frame: u32,
    /// Number of frames to capture (`0` means unbounded).
    pub frames_to_capture: u32,
    /// Disable precompiled shaders.
    pub disable_pcs: bool,
    /// Record device error state alongside the trace.
    pub record_error_state: bool,
    /// Arm the session but wait for an explicit begin event.
    pub defer_start: bool,
    /// Flush each captured command instead of buffering.
    pub no_buffer: bool,
    /// Hide extensions the recorder does not understand.
    pub hide_unknown_extensions: bool,
    /// Clear the device's package cache before launching.
    pub clear_cache: bool,
    /// Path on the daemon host where the capture file is written.
    pub server_local_save_path: String,
}

/// Capture session lifecycle state as reported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceState {
    /// Session exists but initialization has not started.
    Uninitialized,
    /// Daemon is launching or attaching to the application.
    Initializing,
    /// Session armed; capture has not begun.
    Initialized,
    /// Commands are being recorded.
    Capturing,
    /// Capture finished and the file has been finalized.
    Done,
}

/// One status snapshot of a running capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStatus {
    /// Current lifecycle state.
    pub state: TraceState,
    /// Total bytes recorded so far; non-decreasing.
    pub bytes_captured: u64,
}

/// Commands the client can send into a live session via `trace/event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceEventKind {
    /// Request the next status snapshot (blocks until one is available).
    Status,
    /// Begin a deferred capture.
    Begin,
    /// Stop capturing and finalize the file.
    Stop,
}

/// A device known to the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Stable device identifier.
    pub id: String,
    /// Human-readable device name.
    pub name: String,
}

/// One launchable trace target reported by `targets/find`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceTarget {
    /// URI that uniquely identifies the target on its device.
    pub uri: String,
    /// Raw target name.
    pub name: String,
    /// Friendly application name, when the device exposes one.
    pub application_name: Option<String>,
    /// Friendly executable name, when the device exposes one.
    pub executable_name: Option<String>,
}

impl TraceTarget {
    /// Preferred human-readable name: the application name when present,
    /// else the executable name, else the raw target name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if let Some(app) = self.application_name.as_deref() {
            if !app.is_empty() {
                return app;
            }
        }
        if let Some(exe) = self.executable_name.as_deref() {
            if !exe.is_empty() {
                return exe;
            }
        }
        &self.name
    }
}

/// Daemon identity and capabilities, from `server/info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Daemon name.
    pub name: String,
    /// Daemon version string.
    pub version: String,
    /// Identifier of the device the daemon itself runs on, when the daemon
    /// was started with one. Required for port-attach sessions.
    pub server_local_device: Option<String>,
}
