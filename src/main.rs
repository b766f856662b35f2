#![forbid(unsafe_code)]

//! `gfxtap` — command-line client for a remote graphics-trace capture
//! daemon.
//!
//! Resolves an application spec against the daemon's devices, negotiates
//! a capture session, and drives it to completion while forwarding the
//! user's begin/stop keypresses. The daemon writes the capture file on
//! its side; this binary only orchestrates.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use gfxtap::capture::options::TraceFlags;
use gfxtap::capture::{run_trace, TargetSelector, TraceRequest};
use gfxtap::config::GlobalConfig;
use gfxtap::devices::filter_devices;
use gfxtap::service::client::ServiceClient;
use gfxtap::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "gfxtap",
    about = "Capture graphics traces through a remote daemon",
    version,
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Daemon address (host:port). Overrides the config file and the
    /// `GFXTAP_SERVER` environment variable.
    #[arg(long, global = true)]
    server: Option<String>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Capture a trace from an application.
    Trace(TraceArgs),

    /// List the daemon's devices.
    Devices {
        /// Substring filter on device id or name.
        #[arg(long, default_value = "")]
        device: String,
    },
}

#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)] // one flag per independent capture toggle
struct TraceArgs {
    /// Application to trace: a name, package, or target URI.
    #[arg(required_unless_present = "port", conflicts_with = "port")]
    target: Option<String>,

    /// Attach to a process already listening on this port on the daemon's
    /// own device instead of launching an application.
    #[arg(long)]
    port: Option<u16>,

    /// API to capture: vulkan or gles. All supported APIs when omitted.
    #[arg(long, default_value = "")]
    api: String,

    /// Capture file path on the daemon host. Derived from the target name
    /// when omitted.
    #[arg(long)]
    out: Option<String>,

    /// Working directory for the launched application.
    #[arg(long)]
    cwd: Option<String>,

    /// Environment entry (KEY=VALUE) for the launched application.
    /// Repeatable.
    #[arg(long)]
    env: Vec<String>,

    /// Stop capturing automatically after this long (e.g. 30s, 2m).
    #[arg(long = "for", value_parser = humantime::parse_duration, default_value = "0s")]
    duration: Duration,

    /// Observe frame data every N frames.
    #[arg(long, default_value_t = 0)]
    observe_frames: u32,

    /// Observe draw data every N draws.
    #[arg(long, default_value_t = 0)]
    observe_draws: u32,

    /// Frame index at which capture starts.
    #[arg(long, default_value_t = 0)]
    start_at_frame: u32,

    /// Number of frames to capture; 0 captures until stopped.
    #[arg(long, default_value_t = 0)]
    capture_frames: u32,

    /// Arm the session but wait for an explicit start keypress.
    #[arg(long)]
    start_defer: bool,

    /// Disable precompiled shaders. Pass --disable-pcs=false to keep them.
    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    disable_pcs: bool,

    /// Record device error state alongside the trace.
    #[arg(long)]
    record_errors: bool,

    /// Flush each captured command instead of buffering.
    #[arg(long)]
    no_buffer: bool,

    /// Hide extensions the recorder does not understand.
    #[arg(long)]
    hide_unknown_extensions: bool,

    /// Clear the device's package cache before launching.
    #[arg(long)]
    clear_cache: bool,

    /// Substring filter on device id or name.
    #[arg(long, default_value = "")]
    device: String,

    /// Extra arguments passed to the launched application.
    #[arg(last = true)]
    args: Vec<String>,
}

fn main() {
    let args = Cli::parse();

    if let Err(err) = init_tracing(args.log_format) {
        eprintln!("gfxtap: {err}");
        std::process::exit(1);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("gfxtap: failed to build tokio runtime: {err}");
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(run(args));

    // A pending stdin read sits on the blocking pool and cannot be
    // cancelled; a plain runtime drop would wait on it forever.
    runtime.shutdown_background();

    if let Err(err) = result {
        eprintln!("gfxtap: {err}");
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match &args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    config.apply_env_override();
    if let Some(server) = args.server {
        config.server.address = server;
    }
    info!(address = %config.server.address, "configuration loaded");

    // ── Connect to the daemon ───────────────────────────
    let client = Arc::new(
        ServiceClient::connect(&config.server.address, config.connect_timeout()).await?,
    );

    match args.command {
        Command::Trace(trace_args) => {
            let request = trace_request(trace_args)?;
            run_trace(&client, &config, request).await?;
        }
        Command::Devices { device } => {
            let devices = filter_devices(&client, &device).await?;
            for device in &devices {
                println!("{}  {}", device.id, device.name);
            }
        }
    }

    Ok(())
}

/// Convert parsed trace arguments into the library request.
fn trace_request(args: TraceArgs) -> Result<TraceRequest> {
    let target = match (args.target, args.port) {
        (Some(spec), None) => TargetSelector::Spec(spec),
        (None, Some(port)) => TargetSelector::Port(port),
        _ => {
            return Err(AppError::Config(
                "specify exactly one of TARGET or --port".into(),
            ))
        }
    };

    Ok(TraceRequest {
        target,
        device_filter: args.device,
        flags: TraceFlags {
            api: args.api,
            out: args.out,
            additional_args: args.args,
            cwd: args.cwd,
            env: args.env,
            duration: args.duration,
            observe_frames: args.observe_frames,
            observe_draws: args.observe_draws,
            start_at_frame: args.start_at_frame,
            capture_frames: args.capture_frames,
            disable_pcs: args.disable_pcs,
            record_errors: args.record_errors,
            start_defer: args.start_defer,
            no_buffer: args.no_buffer,
            hide_unknown_extensions: args.hide_unknown_extensions,
            clear_cache: args.clear_cache,
        },
    })
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
