//! Replays a [`DisplayConfig`] onto the hardware.
//!
//! Span topology is applied first since enabling or disabling a span map changes which logical
//! displays exist. HDR overrides are a separate pass.

use alloc::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
    backend::DisplayBackend,
    ffi::AdlDisplayTarget,
    result::AdlError,
    snapshot::{HdrConfigs, SpanConfig, SpanMapConfig},
};

/// Error variants for applying span topology.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to validate SLS map {map_index} on adapter {adapter_index}:\n{source}")]
    Validate {
        adapter_index: i32,
        map_index: i32,
        #[source]
        source: AdlError,
    },

    #[error(
        "SLS map {map_index} on adapter {adapter_index} is not supported by the current hardware (reason {reason:#x})"
    )]
    Unsupported {
        adapter_index: i32,
        map_index: i32,
        reason: i32,
    },

    #[error("Failed to create SLS map on adapter {adapter_index}:\n{source}")]
    Create {
        adapter_index: i32,
        #[source]
        source: AdlError,
    },

    #[error("Failed to activate SLS map {map_index} on adapter {adapter_index}:\n{source}")]
    Activate {
        adapter_index: i32,
        map_index: i32,
        #[source]
        source: AdlError,
    },

    #[error("Failed to deactivate SLS map {map_index} on adapter {adapter_index}:\n{source}")]
    Deactivate {
        adapter_index: i32,
        map_index: i32,
        #[source]
        source: AdlError,
    },
}

/// Outcome of an HDR override pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HdrReport {
    /// Displays whose HDR state was set.
    pub applied: usize,
    /// Displays that do not support HDR, or are no longer connected.
    pub skipped: usize,
    /// Displays where setting the state failed.
    pub failed: usize,
}

/// Brings the span topology in line with `desired`.
///
/// Stops at the first failure, maps applied before it stay applied.
#[instrument(skip_all, err)]
pub fn apply_span_config<B: DisplayBackend + ?Sized>(
    backend: &B,
    desired: &SpanConfig,
    active: &SpanConfig,
) -> Result<(), Error> {
    if desired.enabled {
        for map in &desired.maps {
            activate_map(backend, map)?;
        }
    } else if active.enabled {
        for map in &active.maps {
            let adapter_index = map.adapter_index();
            let map_index = map.map_index();

            backend
                .set_sls_map_state(adapter_index, map_index, false)
                .map_err(|source| Error::Deactivate {
                    adapter_index,
                    map_index,
                    source,
                })?;

            info!(adapter_index, map_index, "Deactivated SLS map");
        }
    }

    Ok(())
}

fn activate_map<B: DisplayBackend + ?Sized>(backend: &B, map: &SpanMapConfig) -> Result<(), Error> {
    let adapter_index = map.adapter_index();
    let map_index = map.map_index();

    match backend.set_sls_map_state(adapter_index, map_index, true) {
        Ok(()) => {
            info!(adapter_index, map_index, "Activated SLS map");
            return Ok(());
        }
        Err(e) => {
            warn!("Failed to activate SLS map {map_index}, recreating it:\n{e}");
        }
    }

    let validity = backend
        .validate_sls_map(&map.map, &map.targets)
        .map_err(|source| Error::Validate {
            adapter_index,
            map_index,
            source,
        })?;

    if !validity.is_valid() {
        return Err(Error::Unsupported {
            adapter_index,
            map_index,
            reason: validity.not_supported_reason,
        });
    }

    let new_index = backend
        .create_sls_map(&map.map, &map.targets, map.bezel_percent)
        .map_err(|source| Error::Create {
            adapter_index,
            source,
        })?;

    debug!(adapter_index, map_index, new_index, "Created SLS map");

    backend
        .set_sls_map_state(adapter_index, new_index, true)
        .map_err(|source| Error::Activate {
            adapter_index,
            map_index: new_index,
            source,
        })?;

    info!(adapter_index, map_index = new_index, "Activated recreated SLS map");

    Ok(())
}

/// Sets the HDR state of every display in `desired`.
///
/// Failures are logged per display and never stop the pass.
#[instrument(skip_all)]
pub fn apply_hdr_overrides<B: DisplayBackend + ?Sized>(
    backend: &B,
    desired: &HdrConfigs,
) -> HdrReport {
    let mut report = HdrReport::default();
    let mut targets: BTreeMap<i32, Vec<AdlDisplayTarget>> = BTreeMap::new();

    for (display_index, hdr) in desired.iter() {
        if !hdr.supported {
            report.skipped += 1;
            continue;
        }

        let adapter_index = hdr.adapter_index;
        let adapter_targets = targets
            .entry(adapter_index)
            .or_insert_with(|| current_targets(backend, adapter_index));

        let Some(target) = adapter_targets
            .iter()
            .find(|target| target.display_id.logical_index == display_index)
        else {
            warn!("Display {display_index} is not connected to adapter {adapter_index}");
            report.skipped += 1;
            continue;
        };

        match backend.set_hdr_state(adapter_index, target.display_id, hdr.enabled) {
            Ok(()) => {
                debug!(display_index, enabled = hdr.enabled, "Set HDR state");
                report.applied += 1;
            }
            Err(e) => {
                warn!("Failed to set the HDR state of display {display_index}:\n{e}");
                report.failed += 1;
            }
        }
    }

    report
}

fn current_targets<B: DisplayBackend + ?Sized>(
    backend: &B,
    adapter_index: i32,
) -> Vec<AdlDisplayTarget> {
    let targets = backend.display_map_config(adapter_index).and_then(|buffers| {
        buffers
            .targets
            .to_vec::<AdlDisplayTarget>()
            .map_err(|e| AdlError::from_memory(e, "ADL2_Display_DisplayMapConfig_Get"))
    });

    match targets {
        Ok(targets) => targets
            .into_iter()
            .filter(|target| target.display_id.logical_adapter_index == adapter_index)
            .collect(),
        Err(e) => {
            warn!("Failed to read the display targets of adapter {adapter_index}:\n{e}");
            Vec::new()
        }
    }
}
