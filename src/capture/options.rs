//! Session options: flag validation and assembly.
//!
//! All validation here is local; nothing touches the daemon, so a bad
//! API name or a malformed flag fails before any session is negotiated.

use std::time::Duration;

use crate::service::{Api, AppTarget, SessionOptions};
use crate::{AppError, Result};

/// Capture file name used when no target display name is known.
pub const DEFAULT_OUTPUT: &str = "capture.gfxtrace";

/// Extension appended to a display name to form the default output path.
pub const TRACE_EXTENSION: &str = "gfxtrace";

/// Raw capture flags as collected from the command line.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)] // mirrors the independent wire toggles
pub struct TraceFlags {
    /// API selector; empty string means every supported API.
    pub api: String,
    /// Explicit output path; `None` derives one from the target.
    pub out: Option<String>,
    /// Extra arguments for the launched application.
    pub additional_args: Vec<String>,
    /// Working directory for the launched application.
    pub cwd: Option<String>,
    /// Environment entries (`KEY=VALUE`).
    pub env: Vec<String>,
    /// Automatic stop after this duration; zero captures manually.
    pub duration: Duration,
    /// Observe frame data every N frames.
    pub observe_frames: u32,
    /// Observe draw data every N draws.
    pub observe_draws: u32,
    /// Frame index at which capture starts.
    pub start_at_frame: u32,
    /// Number of frames to capture.
    pub capture_frames: u32,
    /// Disable precompiled shaders. On unless explicitly turned off.
    pub disable_pcs: bool,
    /// Record device error state.
    pub record_errors: bool,
    /// Arm the session and wait for an explicit begin.
    pub start_defer: bool,
    /// Flush each captured command instead of buffering.
    pub no_buffer: bool,
    /// Hide extensions the recorder does not understand.
    pub hide_unknown_extensions: bool,
    /// Clear the device's package cache before launching.
    pub clear_cache: bool,
}

impl Default for TraceFlags {
    fn default() -> Self {
        Self {
            api: String::new(),
            out: None,
            additional_args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            duration: Duration::ZERO,
            observe_frames: 0,
            observe_draws: 0,
            start_at_frame: 0,
            capture_frames: 0,
            disable_pcs: true,
            record_errors: false,
            start_defer: false,
            no_buffer: false,
            hide_unknown_extensions: false,
            clear_cache: false,
        }
    }
}

/// Map an API selector to the APIs a session records.
///
/// The empty selector means "everything supported".
///
/// # Errors
///
/// Returns [`AppError::Config`] for any selector outside the table.
pub fn parse_apis(api: &str) -> Result<Vec<Api>> {
    match api {
        "vulkan" => Ok(vec![Api::Vulkan]),
        "gles" => Ok(vec![Api::OpenGles, Api::Gvr]),
        "" => Ok(vec![Api::Vulkan, Api::OpenGles, Api::Gvr]),
        other => Err(AppError::Config(format!("unknown API \"{other}\""))),
    }
}

/// Choose the capture file path.
///
/// Precedence: an explicit path wins, then `<display name>.gfxtrace`, then
/// [`DEFAULT_OUTPUT`].
#[must_use]
pub fn output_path(explicit: Option<&str>, display_name: Option<&str>) -> String {
    if let Some(path) = explicit {
        if !path.is_empty() {
            return path.to_owned();
        }
    }
    match display_name {
        Some(name) if !name.is_empty() => format!("{name}.{TRACE_EXTENSION}"),
        _ => DEFAULT_OUTPUT.to_owned(),
    }
}

/// Assemble the immutable session options from validated inputs.
///
/// `app` carries the already-decided launch mode, so a session can never
/// hold both a URI and a port. `apis` comes pre-validated from
/// [`parse_apis`], which callers run before any daemon traffic.
#[must_use]
pub fn build_session_options(
    flags: &TraceFlags,
    app: AppTarget,
    device: &str,
    display_name: Option<&str>,
    apis: Vec<Api>,
) -> SessionOptions {
    let server_local_save_path = output_path(flags.out.as_deref(), display_name);

    SessionOptions {
        app,
        device: device.to_owned(),
        apis,
        additional_args: flags.additional_args.clone(),
        cwd: flags.cwd.clone(),
        env: flags.env.clone(),
        duration_seconds: flags.duration.as_secs_f32(),
        observe_frame_frequency: flags.observe_frames,
        observe_draw_frequency: flags.observe_draws,
        start_frame: flags.start_at_frame,
        frames_to_capture: flags.capture_frames,
        disable_pcs: flags.disable_pcs,
        record_error_state: flags.record_errors,
        defer_start: flags.start_defer,
        no_buffer: flags.no_buffer,
        hide_unknown_extensions: flags.hide_unknown_extensions,
        clear_cache: flags.clear_cache,
        server_local_save_path,
    }
}
