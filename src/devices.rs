//! Device enumeration and filtering.
//!
//! Enumeration is two wire calls: `devices/list` yields identifiers,
//! `devices/get` resolves each into a named [`Device`]. Downstream code
//! (target resolution, the `devices` verb) only ever sees resolved
//! devices, so device names are available without further lookups.

use tracing::debug;

use crate::service::client::ServiceClient;
use crate::service::types::Device;
use crate::Result;

/// Enumerate the daemon's devices and keep those matching `filter`.
///
/// # Errors
///
/// Returns [`AppError::Rpc`](crate::AppError::Rpc) when enumeration or a
/// device lookup fails.
pub async fn filter_devices(client: &ServiceClient, filter: &str) -> Result<Vec<Device>> {
    let ids = client.list_devices().await?;
    debug!(count = ids.len(), filter, "enumerated devices");

    let mut devices = Vec::with_capacity(ids.len());
    for id in ids {
        let device = client.device(&id).await?;
        if device_matches(&device, filter) {
            devices.push(device);
        }
    }
    Ok(devices)
}

/// Substring match against the device id and name. An empty filter matches
/// every device.
#[must_use]
pub fn device_matches(device: &Device, filter: &str) -> bool {
    filter.is_empty() || device.id.contains(filter) || device.name.contains(filter)
}
