//! Capture orchestration: resolve the target, build the options, drive
//! the session.
//!
//! [`run_trace`] is the trace verb's whole flow. It owns the ordering
//! guarantees: flag validation before any daemon traffic, resolution
//! before session negotiation, interrupt registration scoped to exactly
//! the session run.

pub mod controller;
pub mod interactive;
pub mod options;
pub mod resolve;

use std::sync::Arc;

use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::capture::controller::{SessionController, TraceOutcome};
use crate::capture::options::{build_session_options, parse_apis, TraceFlags};
use crate::capture::resolve::{resolve_target, ResolvedTarget};
use crate::config::GlobalConfig;
use crate::devices::filter_devices;
use crate::interrupt::InterruptGuard;
use crate::service::client::ServiceClient;
use crate::service::{AppTarget, TraceSession};
use crate::{AppError, Result};

/// How the user named the application to trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    /// Resolve this spec against the devices' trace targets.
    Spec(String),
    /// Attach to a process already listening on this port on the daemon's
    /// own device.
    Port(u16),
}

/// Everything the trace verb collected from the command line.
#[derive(Debug, Clone)]
pub struct TraceRequest {
    /// Application selector.
    pub target: TargetSelector,
    /// Device filter applied before target resolution.
    pub device_filter: String,
    /// Raw capture flags.
    pub flags: TraceFlags,
}

/// Run one capture session end to end.
///
/// # Errors
///
/// Returns [`AppError::Config`] for an unknown API, a device filter that
/// matches nothing, or a port attach against a daemon without a local
/// device; resolution errors from [`resolve_target`]; and wire errors
/// from session negotiation or polling. An interrupt is not an error:
/// the outcome is [`TraceOutcome::Cancelled`].
pub async fn run_trace(
    client: &Arc<ServiceClient>,
    config: &GlobalConfig,
    request: TraceRequest,
) -> Result<TraceOutcome> {
    // Reject bad flags before any daemon traffic.
    let apis = parse_apis(&request.flags.api)?;

    let (app, device_id, display_name) = match request.target {
        TargetSelector::Port(port) => {
            let server = client.server_info().await?;
            let Some(local_device) = server.server_local_device else {
                return Err(AppError::Config(
                    "server has no local device for tracing".into(),
                ));
            };
            info!(port, device = %local_device, "attaching to local port");
            (AppTarget::Port(port), local_device, None)
        }

        TargetSelector::Spec(spec) => {
            let devices = filter_devices(client, &request.device_filter).await?;
            if devices.is_empty() {
                return Err(AppError::Config("could not find a matching device".into()));
            }

            let ResolvedTarget {
                uri,
                device,
                display_name,
            } = resolve_target(client.as_ref(), &devices, &spec).await?;

            println!("Tracing {uri}");
            info!(%uri, device = %device.id, "target resolved");
            (AppTarget::Uri(uri), device.id, Some(display_name))
        }
    };

    let options = build_session_options(
        &request.flags,
        app,
        &device_id,
        display_name.as_deref(),
        apis,
    );

    let session: Arc<dyn TraceSession> = Arc::new(client.trace(config.dispose_grace()));
    let cancel = CancellationToken::new();
    let _interrupt = InterruptGuard::register(cancel.clone());

    let controller = SessionController::new(
        session,
        config.status_interval(),
        cancel,
        BufReader::new(tokio::io::stdin()),
    );

    let outcome = controller.run(&options).await?;

    match outcome {
        TraceOutcome::Done | TraceOutcome::EndOfStream => {
            println!("Wrote {}", options.server_local_save_path);
        }
        TraceOutcome::Cancelled => {
            info!("capture interrupted before completion");
        }
    }

    Ok(outcome)
}
