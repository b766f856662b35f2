//! Target resolution: from an ambiguous user spec to exactly one
//! launchable URI on one device.
//!
//! Every filtered device is queried through [`TraceTargetSource`]. A
//! query failure on one device removes that device from consideration
//! and nothing else; resolution fails only when the combined candidate
//! set is empty or holds more than one entry.

use tracing::{debug, warn};

use crate::service::{Device, TraceTarget, TraceTargetSource};
use crate::{AppError, Result};

/// Successful resolution: one URI on one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// URI to launch.
    pub uri: String,
    /// Device the target lives on.
    pub device: Device,
    /// Human-readable name used for the default output file name.
    pub display_name: String,
}

/// One candidate produced while querying devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Device that reported the target.
    pub device: Device,
    /// The target itself.
    pub target: TraceTarget,
}

/// Resolve `spec` against `devices`.
///
/// # Errors
///
/// - [`AppError::TargetNotFound`] when no device yields a candidate,
///   including the case where every per-device query failed.
/// - [`AppError::AmbiguousTarget`] when more than one candidate remains;
///   the error carries the rendered [`ambiguity_report`].
pub async fn resolve_target(
    source: &dyn TraceTargetSource,
    devices: &[Device],
    spec: &str,
) -> Result<ResolvedTarget> {
    let mut candidates = Vec::new();

    for device in devices {
        match source.find_trace_targets(device, spec).await {
            Ok(targets) => {
                debug!(device = %device.id, count = targets.len(), "target query");
                candidates.extend(targets.into_iter().map(|target| Candidate {
                    device: device.clone(),
                    target,
                }));
            }
            Err(err) => {
                warn!(device = %device.id, error = %err, "target query failed, skipping device");
            }
        }
    }

    if candidates.len() > 1 {
        return Err(AppError::AmbiguousTarget(ambiguity_report(spec, &candidates)));
    }

    let Some(candidate) = candidates.into_iter().next() else {
        return Err(AppError::TargetNotFound(spec.to_owned()));
    };

    let display_name = candidate.target.display_name().to_owned();
    Ok(ResolvedTarget {
        uri: candidate.target.uri,
        device: candidate.device,
        display_name,
    })
}

/// Render an ambiguous candidate set grouped by device.
///
/// Candidates keep their query order. A device header is printed once per
/// adjacent run of candidates from the same device; every URI appears
/// exactly once.
#[must_use]
pub fn ambiguity_report(spec: &str, candidates: &[Candidate]) -> String {
    let mut report = format!("multiple targets match \"{spec}\":\n");
    let mut last_device: Option<&str> = None;

    for candidate in candidates {
        if last_device != Some(candidate.device.name.as_str()) {
            report.push_str("  ");
            report.push_str(&candidate.device.name);
            report.push_str(":\n");
            last_device = Some(candidate.device.name.as_str());
        }
        report.push_str("    ");
        report.push_str(&candidate.target.uri);
        report.push('\n');
    }

    report
}
