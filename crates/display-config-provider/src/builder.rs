//! Builds a [`DisplayConfig`] from the live state of the vendor library.

use alloc::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::{
    backend::DisplayBackend,
    ffi::{AdlAdapterInfo, AdlDisplayInfo, AdlDisplayTarget, AdlMode},
    result::{AdlError, Degradable},
    snapshot::{
        AdapterConfig, BEZEL_COMPENSATED_PERCENT, DisplayConfig, HdrConfig, HdrConfigs,
        SpanConfig, SpanMapConfig, display_identifier,
    },
};

const ADAPTER_INFO_GET: &str = "ADL2_Adapter_AdapterInfo_Get";
const DISPLAY_MAP_CONFIG_GET: &str = "ADL2_Display_DisplayMapConfig_Get";

/// Error variants for building a snapshot.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to enumerate adapters:\n{0}")]
    Adapters(#[source] AdlError),

    #[error("Failed to enumerate the display maps of adapter {adapter_index}:\n{source}")]
    DisplayMaps {
        adapter_index: i32,
        #[source]
        source: AdlError,
    },
}

/// Builds the snapshot of the active configuration.
///
/// Only failures to list adapters or an active adapter's display targets are fatal, every other
/// query failure leaves the affected part of the snapshot empty and is logged.
#[instrument(skip_all, err)]
pub fn build_display_config<B: DisplayBackend + ?Sized>(
    backend: &B,
    vendor_tag: &str,
) -> Result<DisplayConfig, Error> {
    let adapters = adapter_infos(backend)?;

    let primary = match backend.primary_adapter() {
        Ok(index) => Some(index),
        Err(e) => {
            warn!("Failed to query the primary adapter:\n{e}");
            None
        }
    };

    let mut config = DisplayConfig::default();
    let mut identifiers = BTreeSet::new();

    for adapter in &adapters {
        let adapter_index = adapter.adapter_index;

        if !adapter.exists() || !adapter.is_present() {
            continue;
        }

        match backend.adapter_active(adapter_index) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                warn!("Failed to query if adapter {adapter_index} is active:\n{e}");
                continue;
            }
        }

        config
            .adapters
            .insert(AdapterConfig::new(adapter, primary == Some(adapter_index)));

        let targets = display_targets(backend, adapter_index)?;
        let displays = display_infos(backend, adapter_index);

        if targets.len() >= 2 {
            detect_span(backend, adapter_index, &targets, &mut config.span);
        }

        detect_hdr(backend, adapter_index, &targets, &displays, &mut config.hdr);

        for display in displays
            .iter()
            .filter(|display| display.is_connected() && display.is_mapped())
        {
            identifiers.insert(identify(backend, vendor_tag, adapter, display));
        }
    }

    config
        .span
        .maps
        .sort_by_key(|map| (map.adapter_index(), map.map_index()));
    config
        .span
        .enabled_display_modes
        .sort_by_key(|mode| (mode.adapter_index, mode.display_id.logical_index));
    config.display_identifiers = identifiers.into_iter().collect();

    debug!(
        adapters = config.adapters.len(),
        span_maps = config.span.maps.len(),
        hdr_displays = config.hdr.len(),
        displays = config.display_identifiers.len(),
        "Built display config"
    );

    Ok(config)
}

/// Identifies every connected display on every existing adapter, whether or not it is in use.
#[instrument(skip_all, err)]
pub fn connected_display_identifiers<B: DisplayBackend + ?Sized>(
    backend: &B,
    vendor_tag: &str,
) -> Result<BTreeSet<String>, Error> {
    let adapters = adapter_infos(backend)?;
    let mut identifiers = BTreeSet::new();

    for adapter in adapters.iter().filter(|adapter| adapter.exists()) {
        for display in display_infos(backend, adapter.adapter_index)
            .iter()
            .filter(|display| display.is_connected())
        {
            identifiers.insert(identify(backend, vendor_tag, adapter, display));
        }
    }

    Ok(identifiers)
}

fn adapter_infos<B: DisplayBackend + ?Sized>(backend: &B) -> Result<Vec<AdlAdapterInfo>, Error> {
    let view = backend.adapter_infos().map_err(Error::Adapters)?;

    view.to_vec()
        .map_err(|e| Error::Adapters(AdlError::from_memory(e, ADAPTER_INFO_GET)))
}

fn display_targets<B: DisplayBackend + ?Sized>(
    backend: &B,
    adapter_index: i32,
) -> Result<Vec<AdlDisplayTarget>, Error> {
    let to_error = |source| Error::DisplayMaps {
        adapter_index,
        source,
    };

    let buffers = backend.display_map_config(adapter_index).map_err(to_error)?;
    let targets: Vec<AdlDisplayTarget> = buffers
        .targets
        .to_vec()
        .map_err(|e| to_error(AdlError::from_memory(e, DISPLAY_MAP_CONFIG_GET)))?;

    debug!(
        adapter_index,
        maps = buffers.maps.len(),
        targets = targets.len(),
        "Read display maps"
    );

    Ok(targets
        .into_iter()
        .filter(|target| target.display_id.logical_adapter_index == adapter_index)
        .collect())
}

fn display_infos<B: DisplayBackend + ?Sized>(
    backend: &B,
    adapter_index: i32,
) -> Vec<AdlDisplayInfo> {
    let displays = backend
        .display_infos(adapter_index)
        .and_then(|view| {
            view.to_vec::<AdlDisplayInfo>()
                .map_err(|e| AdlError::from_memory(e, "ADL2_Display_DisplayInfo_Get"))
        });

    match displays {
        Ok(displays) => displays
            .into_iter()
            .filter(|display| display.display_id.logical_adapter_index == adapter_index)
            .collect(),
        Err(e) => {
            warn!("Failed to read the displays of adapter {adapter_index}:\n{e}");
            Vec::new()
        }
    }
}

fn identify<B: DisplayBackend + ?Sized>(
    backend: &B,
    vendor_tag: &str,
    adapter: &AdlAdapterInfo,
    display: &AdlDisplayInfo,
) -> String {
    let ddc = backend.ddc_info(adapter.adapter_index, display.display_id.logical_index);

    match display_identifier(vendor_tag, adapter, display, ddc) {
        Degradable::Exact(identifier) => identifier,
        Degradable::Degraded { value, reason } => {
            warn!("Display identifier {value} is incomplete: {reason}");
            value
        }
    }
}

fn current_mode<B: DisplayBackend + ?Sized>(
    backend: &B,
    adapter_index: i32,
    display_index: i32,
) -> Option<AdlMode> {
    let modes = match backend.display_modes(adapter_index, display_index) {
        Ok(modes) => modes,
        Err(e) => {
            warn!("Failed to read the mode of display {display_index}:\n{e}");
            return None;
        }
    };

    if modes.is_empty() {
        return None;
    }

    match modes.read(0) {
        Ok(mode) => Some(mode),
        Err(e) => {
            warn!("Failed to read the mode of display {display_index}:\n{e}");
            None
        }
    }
}

fn detect_span<B: DisplayBackend + ?Sized>(
    backend: &B,
    adapter_index: i32,
    targets: &[AdlDisplayTarget],
    span: &mut SpanConfig,
) {
    let map_index = match backend.sls_map_index(adapter_index, targets) {
        Ok(Some(map_index)) => map_index,
        Ok(None) => return,
        Err(e) => {
            debug!("No SLS map for adapter {adapter_index}:\n{e}");
            return;
        }
    };

    let buffers = match backend.sls_map_config(adapter_index, map_index) {
        Ok(buffers) => buffers,
        Err(e) => {
            warn!("Failed to read SLS map {map_index} on adapter {adapter_index}:\n{e}");
            return;
        }
    };

    let mut map = match SpanMapConfig::from_buffers(&buffers) {
        Ok(map) => map,
        Err(e) => {
            warn!("Failed to copy SLS map {map_index} on adapter {adapter_index}:\n{e}");
            return;
        }
    };
    drop(buffers);

    let cells = map.map.grid.cells();
    if cells != targets.len() as i64 {
        warn!(
            "SLS map {map_index} has {cells} grid cells but adapter {adapter_index} has {} targets",
            targets.len()
        );
        return;
    }

    let mut matched = false;
    for target in targets {
        let Some(mode) = current_mode(backend, adapter_index, target.display_id.logical_index)
        else {
            continue;
        };

        let native = map
            .native_modes
            .iter()
            .any(|native| native.display_mode.same_resolution(&mode));
        let bezel = !native
            && map
                .bezel_modes
                .iter()
                .any(|bezel| bezel.display_mode.same_resolution(&mode));

        if native || bezel {
            matched = true;
            span.enabled_display_modes.push(mode);
        }

        if bezel {
            map.bezel_compensated = true;
            map.bezel_percent = BEZEL_COMPENSATED_PERCENT;
        }
    }

    if matched {
        debug!(adapter_index, map_index, "Detected active SLS map");
        span.enabled = true;
        span.maps.push(map);
    }
}

fn detect_hdr<B: DisplayBackend + ?Sized>(
    backend: &B,
    adapter_index: i32,
    targets: &[AdlDisplayTarget],
    displays: &[AdlDisplayInfo],
    hdr: &mut HdrConfigs,
) {
    for target in targets {
        let display_index = target.display_id.logical_index;

        let Some(display) = displays
            .iter()
            .find(|display| display.display_id.logical_index == display_index)
        else {
            continue;
        };

        let connector = display.connector();
        if !connector.reports_color_state() {
            debug!("Skipping HDR state of display {display_index} on {connector}");
            continue;
        }

        match backend.hdr_state(adapter_index, target.display_id) {
            Ok(state) => {
                hdr.insert_first(
                    display_index,
                    HdrConfig {
                        adapter_index,
                        supported: state.supported,
                        enabled: state.enabled,
                    },
                );
            }
            Err(e) => warn!("Failed to read the HDR state of display {display_index}:\n{e}"),
        }
    }
}
