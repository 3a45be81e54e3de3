//! The display configuration snapshot.

mod identifier;
mod print;

pub use identifier::{PLACEHOLDER, display_identifier};

use alloc::collections::{BTreeMap, BTreeSet, btree_map::Entry};

use serde::{Deserialize, Serialize};

use crate::{
    backend::SlsMapBuffers,
    ffi::{
        AdlAdapterInfo, AdlBezelTransientMode, AdlMode, AdlSlsMap, AdlSlsMode, AdlSlsOffset,
        AdlSlsTarget,
    },
    memory,
};

/// Bezel compensation requested when recreating a map that was active in a bezel mode.
pub const BEZEL_COMPENSATED_PERCENT: i32 = 100;

/// A snapshot of the display configuration of one vendor library.
///
/// Two snapshots are equal when every field is equal. Span maps, span modes and identifiers are
/// sorted so equality does not depend on the order adapters were enumerated in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Adapters that were active when the snapshot was taken.
    pub adapters: BTreeSet<AdapterConfig>,

    /// Span (SLS) topology.
    pub span: SpanConfig,

    /// HDR state keyed by logical display index.
    pub hdr: HdrConfigs,

    /// Sorted, unique identifiers of the active displays.
    pub display_identifiers: Vec<String>,
}

/// An adapter present in a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// PCI device number.
    pub device_number: i32,
    /// PCI bus number.
    pub bus_number: i32,
    /// Index of the adapter in the vendor library.
    pub adapter_index: i32,
    /// Whether this is the primary adapter.
    pub is_primary: bool,
    /// OS display device name, e.g. `\\.\DISPLAY1`.
    pub display_name: String,
    /// OS display index.
    pub os_display_index: i32,
}

impl AdapterConfig {
    /// Builds the adapter entry from its native record.
    pub fn new(info: &AdlAdapterInfo, is_primary: bool) -> Self {
        Self {
            device_number: info.device_number,
            bus_number: info.bus_number,
            adapter_index: info.adapter_index,
            is_primary,
            display_name: info.display_name().unwrap_or_default(),
            os_display_index: info.os_display_index,
        }
    }
}

/// Span (SLS) topology across all adapters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanConfig {
    /// Whether any span map is currently in use.
    pub enabled: bool,

    /// Span maps in use, sorted by adapter then map index.
    pub maps: Vec<SpanMapConfig>,

    /// The current modes of the displays that matched a span map, sorted by adapter then display.
    pub enabled_display_modes: Vec<AdlMode>,
}

/// A span map and everything needed to recreate it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanMapConfig {
    /// The map, its index, grid and orientation.
    pub map: AdlSlsMap,

    /// Displays in the map and their grid positions.
    pub targets: Vec<AdlSlsTarget>,
    /// Uncompensated span resolutions.
    pub native_modes: Vec<AdlSlsMode>,

    /// Offsets that do not belong to a bezel mode.
    pub native_mode_offsets: Vec<AdlSlsOffset>,

    /// Bezel compensated span resolutions.
    pub bezel_modes: Vec<AdlBezelTransientMode>,
    /// Transient modes used while the map is being changed.
    pub transient_modes: Vec<AdlBezelTransientMode>,

    /// Every offset reported for the map.
    pub offsets: Vec<AdlSlsOffset>,

    /// Bezel compensation percentage passed when the map is recreated.
    pub bezel_percent: i32,

    /// Whether a display was found running one of the bezel modes.
    pub bezel_compensated: bool,
}

impl SpanMapConfig {
    /// Copies the map's records out of the native buffers.
    pub fn from_buffers(buffers: &SlsMapBuffers) -> Result<Self, memory::Error> {
        let bezel_modes: Vec<AdlBezelTransientMode> = buffers.bezel_modes.to_vec()?;
        let offsets: Vec<AdlSlsOffset> = buffers.offsets.to_vec()?;

        let native_mode_offsets = offsets
            .iter()
            .filter(|offset| {
                !bezel_modes
                    .iter()
                    .any(|mode| mode.sls_mode_index == offset.bezel_mode_index)
            })
            .copied()
            .collect();

        Ok(Self {
            map: buffers.map,
            targets: buffers.targets.to_vec()?,
            native_modes: buffers.native_modes.to_vec()?,
            native_mode_offsets,
            bezel_modes,
            transient_modes: buffers.transient_modes.to_vec()?,
            offsets,
            bezel_percent: 0,
            bezel_compensated: false,
        })
    }

    /// The adapter the map lives on.
    pub fn adapter_index(&self) -> i32 {
        self.map.adapter_index
    }

    /// The map's index in the driver's database.
    pub fn map_index(&self) -> i32 {
        self.map.sls_map_index
    }
}

/// HDR state of a display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdrConfig {
    /// The adapter the display is on.
    pub adapter_index: i32,
    /// Whether the display can run in HDR.
    pub supported: bool,
    /// Whether HDR is on.
    pub enabled: bool,
}

/// HDR states keyed by logical display index.
///
/// Stored as a list of entries so the snapshot stays representable in TOML.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<HdrEntry>", into = "Vec<HdrEntry>")]
pub struct HdrConfigs(BTreeMap<i32, HdrConfig>);

impl HdrConfigs {
    /// Inserts the state for a display unless one is already recorded, returns whether it was
    /// inserted.
    pub fn insert_first(&mut self, display_index: i32, config: HdrConfig) -> bool {
        match self.0.entry(display_index) {
            Entry::Vacant(entry) => {
                entry.insert(config);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// The state recorded for a display.
    pub fn get(&self, display_index: i32) -> Option<&HdrConfig> {
        self.0.get(&display_index)
    }

    /// Iterates `(display index, state)` in display index order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &HdrConfig)> {
        self.0.iter().map(|(index, config)| (*index, config))
    }

    /// The number of displays with a recorded state.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no state is recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct HdrEntry {
    display_index: i32,
    adapter_index: i32,
    supported: bool,
    enabled: bool,
}

impl From<Vec<HdrEntry>> for HdrConfigs {
    fn from(entries: Vec<HdrEntry>) -> Self {
        let mut configs = Self::default();

        for entry in entries {
            configs.insert_first(
                entry.display_index,
                HdrConfig {
                    adapter_index: entry.adapter_index,
                    supported: entry.supported,
                    enabled: entry.enabled,
                },
            );
        }

        configs
    }
}

impl From<HdrConfigs> for Vec<HdrEntry> {
    fn from(configs: HdrConfigs) -> Self {
        configs
            .0
            .into_iter()
            .map(|(display_index, config)| HdrEntry {
                display_index,
                adapter_index: config.adapter_index,
                supported: config.supported,
                enabled: config.enabled,
            })
            .collect()
    }
}

impl FromIterator<(i32, HdrConfig)> for HdrConfigs {
    fn from_iter<I: IntoIterator<Item = (i32, HdrConfig)>>(iter: I) -> Self {
        let mut configs = Self::default();
        for (display_index, config) in iter {
            configs.insert_first(display_index, config);
        }
        configs
    }
}

#[cfg(test)]
mod tests {
    use super::{HdrConfig, HdrConfigs};

    #[test]
    fn first_hdr_write_wins() {
        let mut configs = HdrConfigs::default();
        let first = HdrConfig {
            adapter_index: 0,
            supported: true,
            enabled: true,
        };
        let second = HdrConfig {
            adapter_index: 4,
            supported: false,
            enabled: false,
        };

        assert!(configs.insert_first(3, first));
        assert!(!configs.insert_first(3, second));
        assert_eq!(configs.get(3), Some(&first));
        assert_eq!(configs.len(), 1);
    }
}
