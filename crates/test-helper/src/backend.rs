//! A vendor backend simulated in memory.

use alloc::{collections::BTreeSet, sync::Arc};

use display_config_provider::{
    AdlError, AdlResult, AdlStatus, DisplayBackend,
    backend::{DisplayMapBuffers, HdrState, SlsMapBuffers, SlsValidity},
    ffi::{
        AdlAdapterInfo, AdlBezelTransientMode, AdlDdcInfo2, AdlDisplayId, AdlDisplayInfo,
        AdlDisplayMap, AdlDisplayTarget, AdlMode, AdlSlsGrid, AdlSlsMap, AdlSlsMode,
        AdlSlsOffset, AdlSlsTarget,
        constants::{
            ADL_DISPLAY_DISPLAYINFO_DISPLAYCONNECTED, ADL_DISPLAY_DISPLAYINFO_DISPLAYMAPPED,
        },
        write_fixed_string,
    },
    memory::{HeapAllocator, NativeAllocator, NativeRecord, NativeView},
};
use parking_lot::Mutex;

const ADL_ERR: AdlStatus = AdlStatus(-1);
const ADL_ERR_INVALID_ADL_IDX: AdlStatus = AdlStatus(-5);
const ADL_ERR_NOT_SUPPORTED: AdlStatus = AdlStatus(-8);

/// A native call made against the simulated backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    AdapterInfos,
    AdapterActive(i32),
    PrimaryAdapter,
    DisplayMapConfig(i32),
    DisplayInfos(i32),
    DdcInfo {
        adapter_index: i32,
        display_index: i32,
    },
    HdrState {
        adapter_index: i32,
        display_index: i32,
    },
    SetHdrState {
        adapter_index: i32,
        display_index: i32,
        enabled: bool,
    },
    SlsMapIndex(i32),
    SlsMapConfig {
        adapter_index: i32,
        map_index: i32,
    },
    ValidateSlsMap {
        adapter_index: i32,
        map_index: i32,
    },
    CreateSlsMap {
        adapter_index: i32,
        map_index: i32,
    },
    SetSlsMapState {
        adapter_index: i32,
        map_index: i32,
        enabled: bool,
    },
    DisplayModes {
        adapter_index: i32,
        display_index: i32,
    },
}

/// Native calls the simulated backend should fail.
#[derive(Clone, Debug, Default)]
pub struct Failures {
    pub adapter_infos: bool,
    /// Adapter info queries fail once this many more have succeeded.
    pub adapter_infos_after: Option<u32>,
    pub primary_adapter: bool,
    pub display_map_config: bool,
    pub ddc_info: bool,
    /// Display indices whose HDR state cannot be read.
    pub hdr_state: BTreeSet<i32>,
    /// Display indices whose HDR state cannot be set.
    pub set_hdr_state: BTreeSet<i32>,
    pub sls_map_index: bool,
    pub validate_sls_map: bool,
    /// Reported as the reason a map is not supported, zero for valid.
    pub not_supported_reason: i32,
    pub create_sls_map: bool,
}

/// A display attached to a simulated adapter.
#[derive(Clone, Debug)]
pub struct SimulatedDisplay {
    pub info: AdlDisplayInfo,
    pub target: AdlDisplayTarget,
    /// EDID data, `None` when the display has none.
    pub ddc: Option<AdlDdcInfo2>,
    /// HDR state, `None` when it cannot be queried.
    pub hdr: Option<HdrState>,
    pub mode: AdlMode,
}

impl SimulatedDisplay {
    /// A connected, mapped display with EDID data and HDR support.
    pub fn new(adapter_index: i32, display_index: i32, connector: i32, name: &str) -> Self {
        let display_id = AdlDisplayId {
            logical_index: display_index,
            physical_index: display_index,
            logical_adapter_index: adapter_index,
            physical_adapter_index: adapter_index,
        };

        let mut info = AdlDisplayInfo {
            display_id,
            display_connector: connector,
            display_info_mask: ADL_DISPLAY_DISPLAYINFO_DISPLAYCONNECTED
                | ADL_DISPLAY_DISPLAYINFO_DISPLAYMAPPED,
            display_info_value: ADL_DISPLAY_DISPLAYINFO_DISPLAYCONNECTED
                | ADL_DISPLAY_DISPLAYINFO_DISPLAYMAPPED,
            ..Default::default()
        };
        write_fixed_string(&mut info.display_name, name);
        write_fixed_string(&mut info.display_manufacturer_name, "SIM");

        let mut ddc = AdlDdcInfo2 {
            supports_ddc: 1,
            manufacturer_id: 0x4c2d,
            product_id: 1000 + display_index,
            ..Default::default()
        };
        write_fixed_string(&mut ddc.display_name, name);

        Self {
            info,
            target: AdlDisplayTarget {
                display_id,
                display_map_index: display_index,
                ..Default::default()
            },
            ddc: Some(ddc),
            hdr: Some(HdrState {
                supported: true,
                enabled: false,
            }),
            mode: mode(adapter_index, display_index, 1920, 1080),
        }
    }

    /// Marks the display as connected but not in use.
    pub fn unmapped(mut self) -> Self {
        self.info.display_info_value &= !ADL_DISPLAY_DISPLAYINFO_DISPLAYMAPPED;
        self
    }

    /// The display's logical index.
    pub fn index(&self) -> i32 {
        self.info.display_id.logical_index
    }

    fn is_mapped(&self) -> bool {
        self.info.is_connected() && self.info.is_mapped()
    }
}

/// A simulated adapter and its displays.
#[derive(Clone, Debug)]
pub struct SimulatedAdapter {
    pub info: AdlAdapterInfo,
    pub active: bool,
    pub displays: Vec<SimulatedDisplay>,
}

impl SimulatedAdapter {
    /// An existing, present and active adapter.
    pub fn new(adapter_index: i32, device_number: i32, name: &str) -> Self {
        let mut info = AdlAdapterInfo {
            adapter_index,
            bus_number: adapter_index + 1,
            device_number,
            vendor_id: 1002,
            present: 1,
            exist: 1,
            os_display_index: adapter_index,
            ..Default::default()
        };
        write_fixed_string(&mut info.adapter_name, name);
        write_fixed_string(
            &mut info.display_name,
            &format!("\\\\.\\DISPLAY{}", adapter_index + 1),
        );

        Self {
            info,
            active: true,
            displays: Vec::new(),
        }
    }

    /// Adds a display with the given connector code.
    pub fn with_display(mut self, display_index: i32, connector: i32, name: &str) -> Self {
        let adapter_index = self.info.adapter_index;
        self.displays
            .push(SimulatedDisplay::new(adapter_index, display_index, connector, name));
        self
    }

    fn display(&self, display_index: i32) -> Option<&SimulatedDisplay> {
        self.displays
            .iter()
            .find(|display| display.index() == display_index)
    }
}

/// A span map known to the simulated driver.
#[derive(Clone, Debug)]
pub struct SimulatedSlsMap {
    pub map: AdlSlsMap,
    pub targets: Vec<AdlSlsTarget>,
    pub native_modes: Vec<AdlSlsMode>,
    pub bezel_modes: Vec<AdlBezelTransientMode>,
    pub transient_modes: Vec<AdlBezelTransientMode>,
    pub offsets: Vec<AdlSlsOffset>,
    pub enabled: bool,
}

impl SimulatedSlsMap {
    /// A map laying `display_indices` out on a `rows` by `columns` grid.
    pub fn new(
        adapter_index: i32,
        map_index: i32,
        rows: i32,
        columns: i32,
        display_indices: &[i32],
    ) -> Self {
        let targets = display_indices
            .iter()
            .enumerate()
            .map(|(position, display_index)| {
                let position = i32::try_from(position).unwrap_or_default();

                AdlSlsTarget {
                    adapter_index,
                    sls_target_index: position,
                    display_target: AdlDisplayTarget {
                        display_id: AdlDisplayId {
                            logical_index: *display_index,
                            physical_index: *display_index,
                            logical_adapter_index: adapter_index,
                            physical_adapter_index: adapter_index,
                        },
                        display_map_index: *display_index,
                        ..Default::default()
                    },
                    sls_grid_position_x: position % columns.max(1),
                    sls_grid_position_y: position / columns.max(1),
                    view_size: mode(adapter_index, *display_index, 1920, 1080),
                    ..Default::default()
                }
            })
            .collect();

        Self {
            map: AdlSlsMap {
                adapter_index,
                sls_map_index: map_index,
                grid: AdlSlsGrid {
                    adapter_index,
                    sls_grid_row: rows,
                    sls_grid_column: columns,
                    ..Default::default()
                },
                num_sls_target: i32::try_from(display_indices.len()).unwrap_or_default(),
                ..Default::default()
            },
            targets,
            native_modes: Vec::new(),
            bezel_modes: Vec::new(),
            transient_modes: Vec::new(),
            offsets: Vec::new(),
            enabled: true,
        }
    }

    /// Adds a native (uncompensated) span resolution.
    pub fn with_native_mode(mut self, x_res: i32, y_res: i32) -> Self {
        let index = i32::try_from(self.native_modes.len()).unwrap_or_default();
        self.native_modes.push(AdlSlsMode {
            adapter_index: self.map.adapter_index,
            sls_mode_index: index,
            sls_map_index: self.map.sls_map_index,
            display_mode: mode(self.map.adapter_index, -1, x_res, y_res),
            ..Default::default()
        });
        self
    }

    /// Adds a bezel compensated span resolution with an offset per target.
    pub fn with_bezel_mode(mut self, x_res: i32, y_res: i32) -> Self {
        let index = 100 + i32::try_from(self.bezel_modes.len()).unwrap_or_default();
        self.bezel_modes.push(AdlBezelTransientMode {
            adapter_index: self.map.adapter_index,
            sls_map_index: self.map.sls_map_index,
            sls_mode_index: index,
            display_mode: mode(self.map.adapter_index, -1, x_res, y_res),
            ..Default::default()
        });

        for target in &self.targets {
            self.offsets.push(AdlSlsOffset {
                adapter_index: self.map.adapter_index,
                sls_map_index: self.map.sls_map_index,
                display_id: target.display_target.display_id,
                bezel_mode_index: index,
                ..Default::default()
            });
        }

        self
    }

    fn display_indices(&self) -> BTreeSet<i32> {
        self.targets
            .iter()
            .map(|target| target.display_target.display_id.logical_index)
            .collect()
    }
}

/// Builds a mode record.
pub fn mode(adapter_index: i32, display_index: i32, x_res: i32, y_res: i32) -> AdlMode {
    AdlMode {
        adapter_index,
        display_id: AdlDisplayId {
            logical_index: display_index,
            physical_index: display_index,
            logical_adapter_index: adapter_index,
            physical_adapter_index: adapter_index,
        },
        x_res,
        y_res,
        colour_depth: 32,
        refresh_rate: 60.0,
        ..Default::default()
    }
}

/// Everything the simulated driver knows.
#[derive(Clone, Debug, Default)]
pub struct SimulatedState {
    pub adapters: Vec<SimulatedAdapter>,
    pub primary_adapter: i32,
    pub sls_maps: Vec<SimulatedSlsMap>,
    pub failures: Failures,
    /// Index given to the next created map.
    pub next_map_index: i32,
}

impl SimulatedState {
    fn adapter(&self, adapter_index: i32) -> AdlResult<&SimulatedAdapter> {
        self.adapters
            .iter()
            .find(|adapter| adapter.info.adapter_index == adapter_index)
            .ok_or_else(|| AdlError::from_status(ADL_ERR_INVALID_ADL_IDX, "simulated adapter"))
    }

    fn display_mut(&mut self, adapter_index: i32, display_index: i32) -> Option<&mut SimulatedDisplay> {
        self.adapters
            .iter_mut()
            .find(|adapter| adapter.info.adapter_index == adapter_index)?
            .displays
            .iter_mut()
            .find(|display| display.index() == display_index)
    }
}

struct Inner {
    state: Mutex<SimulatedState>,
    calls: Mutex<Vec<Call>>,
    allocator: Arc<dyn NativeAllocator>,
}

/// The simulated backend. Clones share the same driver state and call log.
#[derive(Clone)]
pub struct SimulatedBackend {
    inner: Arc<Inner>,
}

impl SimulatedBackend {
    /// A backend whose buffers come from the heap.
    pub fn new(state: SimulatedState) -> Self {
        Self::with_allocator(state, Arc::new(HeapAllocator))
    }

    /// A backend whose buffers come from `allocator`.
    pub fn with_allocator(state: SimulatedState, allocator: Arc<dyn NativeAllocator>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                calls: Mutex::new(Vec::new()),
                allocator,
            }),
        }
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().clone()
    }

    /// Forgets the calls made so far.
    pub fn clear_calls(&self) {
        self.inner.calls.lock().clear();
    }

    /// Changes the driver state.
    pub fn update<R>(&self, f: impl FnOnce(&mut SimulatedState) -> R) -> R {
        f(&mut self.inner.state.lock())
    }

    fn record(&self, call: Call) {
        self.inner.calls.lock().push(call);
    }

    fn view<T: NativeRecord>(&self, records: &[T], call: &'static str) -> AdlResult<NativeView> {
        NativeView::from_records(&self.inner.allocator, records)
            .map_err(|e| AdlError::from_memory(e, call))
    }
}

impl DisplayBackend for SimulatedBackend {
    fn adapter_infos(&self) -> AdlResult<NativeView> {
        const CALL: &str = "ADL2_Adapter_AdapterInfo_Get";
        self.record(Call::AdapterInfos);

        let mut state = self.inner.state.lock();
        if state.failures.adapter_infos {
            return Err(AdlError::from_status(ADL_ERR, CALL));
        }
        if let Some(remaining) = state.failures.adapter_infos_after.as_mut() {
            if *remaining == 0 {
                return Err(AdlError::from_status(ADL_ERR, CALL));
            }
            *remaining -= 1;
        }

        let infos: Vec<AdlAdapterInfo> = state.adapters.iter().map(|adapter| adapter.info).collect();
        self.view(&infos, CALL)
    }

    fn adapter_active(&self, adapter_index: i32) -> AdlResult<bool> {
        self.record(Call::AdapterActive(adapter_index));

        let state = self.inner.state.lock();
        Ok(state.adapter(adapter_index)?.active)
    }

    fn primary_adapter(&self) -> AdlResult<i32> {
        self.record(Call::PrimaryAdapter);

        let state = self.inner.state.lock();
        if state.failures.primary_adapter {
            return Err(AdlError::from_status(ADL_ERR, "ADL2_Adapter_Primary_Get"));
        }

        Ok(state.primary_adapter)
    }

    fn display_map_config(&self, adapter_index: i32) -> AdlResult<DisplayMapBuffers> {
        const CALL: &str = "ADL2_Display_DisplayMapConfig_Get";
        self.record(Call::DisplayMapConfig(adapter_index));

        let state = self.inner.state.lock();
        if state.failures.display_map_config {
            return Err(AdlError::from_status(ADL_ERR, CALL));
        }

        let adapter = state.adapter(adapter_index)?;
        let targets: Vec<AdlDisplayTarget> = adapter
            .displays
            .iter()
            .filter(|display| display.is_mapped())
            .map(|display| display.target)
            .collect();
        let maps: Vec<AdlDisplayMap> = adapter
            .displays
            .iter()
            .filter(|display| display.is_mapped())
            .enumerate()
            .map(|(position, display)| AdlDisplayMap {
                display_map_index: display.target.display_map_index,
                display_mode: display.mode,
                num_display_target: 1,
                first_display_target_array_index: i32::try_from(position).unwrap_or_default(),
                ..Default::default()
            })
            .collect();

        Ok(DisplayMapBuffers {
            maps: self.view(&maps, CALL)?,
            targets: self.view(&targets, CALL)?,
        })
    }

    fn display_infos(&self, adapter_index: i32) -> AdlResult<NativeView> {
        self.record(Call::DisplayInfos(adapter_index));

        let state = self.inner.state.lock();
        let infos: Vec<AdlDisplayInfo> = state
            .adapter(adapter_index)?
            .displays
            .iter()
            .map(|display| display.info)
            .collect();

        self.view(&infos, "ADL2_Display_DisplayInfo_Get")
    }

    fn ddc_info(&self, adapter_index: i32, display_index: i32) -> AdlResult<AdlDdcInfo2> {
        const CALL: &str = "ADL2_Display_DDCInfo2_Get";
        self.record(Call::DdcInfo {
            adapter_index,
            display_index,
        });

        let state = self.inner.state.lock();
        if state.failures.ddc_info {
            return Err(AdlError::from_status(ADL_ERR, CALL));
        }

        let display = state
            .adapter(adapter_index)?
            .display(display_index)
            .ok_or_else(|| AdlError::from_status(ADL_ERR, CALL))?;

        Ok(display.ddc.unwrap_or_default())
    }

    fn hdr_state(&self, adapter_index: i32, display: AdlDisplayId) -> AdlResult<HdrState> {
        const CALL: &str = "ADL2_Display_HDRState_Get";
        let display_index = display.logical_index;
        self.record(Call::HdrState {
            adapter_index,
            display_index,
        });

        let state = self.inner.state.lock();
        if state.failures.hdr_state.contains(&display_index) {
            return Err(AdlError::from_status(ADL_ERR, CALL));
        }

        state
            .adapter(adapter_index)?
            .display(display_index)
            .and_then(|display| display.hdr)
            .ok_or_else(|| AdlError::from_status(ADL_ERR_NOT_SUPPORTED, CALL))
    }

    fn set_hdr_state(
        &self,
        adapter_index: i32,
        display: AdlDisplayId,
        enabled: bool,
    ) -> AdlResult<()> {
        const CALL: &str = "ADL2_Display_HDRState_Set";
        let display_index = display.logical_index;
        self.record(Call::SetHdrState {
            adapter_index,
            display_index,
            enabled,
        });

        let mut state = self.inner.state.lock();
        if state.failures.set_hdr_state.contains(&display_index) {
            return Err(AdlError::from_status(ADL_ERR, CALL));
        }

        let hdr = state
            .display_mut(adapter_index, display_index)
            .and_then(|display| display.hdr.as_mut())
            .ok_or_else(|| AdlError::from_status(ADL_ERR_NOT_SUPPORTED, CALL))?;
        hdr.enabled = enabled;

        Ok(())
    }

    fn sls_map_index(
        &self,
        adapter_index: i32,
        targets: &[AdlDisplayTarget],
    ) -> AdlResult<Option<i32>> {
        self.record(Call::SlsMapIndex(adapter_index));

        let state = self.inner.state.lock();
        if state.failures.sls_map_index {
            return Err(AdlError::from_status(ADL_ERR, "ADL2_Display_SLSMapIndex_Get"));
        }

        let displays: BTreeSet<i32> = targets
            .iter()
            .map(|target| target.display_id.logical_index)
            .collect();

        Ok(state
            .sls_maps
            .iter()
            .find(|map| map.map.adapter_index == adapter_index && map.display_indices() == displays)
            .map(|map| map.map.sls_map_index))
    }

    fn sls_map_config(&self, adapter_index: i32, map_index: i32) -> AdlResult<SlsMapBuffers> {
        const CALL: &str = "ADL2_Display_SLSMapConfig_Get";
        self.record(Call::SlsMapConfig {
            adapter_index,
            map_index,
        });

        let state = self.inner.state.lock();
        let map = state
            .sls_maps
            .iter()
            .find(|map| map.map.adapter_index == adapter_index && map.map.sls_map_index == map_index)
            .ok_or_else(|| AdlError::from_status(ADL_ERR, CALL))?;

        Ok(SlsMapBuffers {
            map: map.map,
            targets: self.view(&map.targets, CALL)?,
            native_modes: self.view(&map.native_modes, CALL)?,
            bezel_modes: self.view(&map.bezel_modes, CALL)?,
            transient_modes: self.view(&map.transient_modes, CALL)?,
            offsets: self.view(&map.offsets, CALL)?,
        })
    }

    fn validate_sls_map(
        &self,
        map: &AdlSlsMap,
        _targets: &[AdlSlsTarget],
    ) -> AdlResult<SlsValidity> {
        self.record(Call::ValidateSlsMap {
            adapter_index: map.adapter_index,
            map_index: map.sls_map_index,
        });

        let state = self.inner.state.lock();
        if state.failures.validate_sls_map {
            return Err(AdlError::from_status(ADL_ERR, "ADL2_Display_SLSMapConfig_Valid"));
        }

        Ok(SlsValidity {
            supported_layout_mode: 0,
            not_supported_reason: state.failures.not_supported_reason,
        })
    }

    fn create_sls_map(
        &self,
        map: &AdlSlsMap,
        targets: &[AdlSlsTarget],
        _bezel_percent: i32,
    ) -> AdlResult<i32> {
        self.record(Call::CreateSlsMap {
            adapter_index: map.adapter_index,
            map_index: map.sls_map_index,
        });

        let mut state = self.inner.state.lock();
        if state.failures.create_sls_map {
            return Err(AdlError::from_status(ADL_ERR, "ADL2_Display_SLSMapConfig_Create"));
        }

        let map_index = state.next_map_index;
        state.next_map_index += 1;

        let mut created = SimulatedSlsMap::new(map.adapter_index, map_index, 0, 0, &[]);
        created.map = AdlSlsMap {
            sls_map_index: map_index,
            ..*map
        };
        created.targets = targets.to_vec();
        created.enabled = false;
        state.sls_maps.push(created);

        Ok(map_index)
    }

    fn set_sls_map_state(
        &self,
        adapter_index: i32,
        map_index: i32,
        enabled: bool,
    ) -> AdlResult<()> {
        self.record(Call::SetSlsMapState {
            adapter_index,
            map_index,
            enabled,
        });

        let mut state = self.inner.state.lock();
        let map = state
            .sls_maps
            .iter_mut()
            .find(|map| map.map.adapter_index == adapter_index && map.map.sls_map_index == map_index)
            .ok_or_else(|| AdlError::from_status(ADL_ERR, "ADL2_Display_SLSMapConfig_SetState"))?;
        map.enabled = enabled;

        Ok(())
    }

    fn display_modes(&self, adapter_index: i32, display_index: i32) -> AdlResult<NativeView> {
        const CALL: &str = "ADL2_Display_Modes_Get";
        self.record(Call::DisplayModes {
            adapter_index,
            display_index,
        });

        let state = self.inner.state.lock();
        let display = state
            .adapter(adapter_index)?
            .display(display_index)
            .ok_or_else(|| AdlError::from_status(ADL_ERR, CALL))?;

        self.view(&[display.mode], CALL)
    }
}
