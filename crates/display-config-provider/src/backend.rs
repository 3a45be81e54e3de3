//! The native call surface the rest of the crate is written against.

use crate::{
    ffi::{AdlDdcInfo2, AdlDisplayId, AdlDisplayTarget, AdlSlsMap, AdlSlsTarget},
    memory::NativeView,
    result::AdlResult,
};

/// The two buffers returned by `ADL2_Display_DisplayMapConfig_Get`.
#[derive(Debug)]
pub struct DisplayMapBuffers {
    /// `ADLDisplayMap` records.
    pub maps: NativeView,
    /// `ADLDisplayTarget` records.
    pub targets: NativeView,
}

/// The record and buffers returned by `ADL2_Display_SLSMapConfig_Get`.
#[derive(Debug)]
pub struct SlsMapBuffers {
    pub map: AdlSlsMap,
    /// `ADLSLSTarget` records.
    pub targets: NativeView,
    /// `ADLSLSMode` records.
    pub native_modes: NativeView,
    /// `ADLBezelTransientMode` records.
    pub bezel_modes: NativeView,
    /// `ADLBezelTransientMode` records.
    pub transient_modes: NativeView,
    /// `ADLSLSOffset` records.
    pub offsets: NativeView,
}

/// HDR support and state of a display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HdrState {
    pub supported: bool,
    pub enabled: bool,
}

/// Result of validating an SLS map against the current hardware.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlsValidity {
    /// Layout image modes the hardware supports for the map.
    pub supported_layout_mode: i32,
    /// Bitmask of reasons the map is not supported, zero if it is.
    pub not_supported_reason: i32,
}

impl SlsValidity {
    /// Whether the map can be created.
    pub fn is_valid(&self) -> bool {
        self.not_supported_reason == 0
    }
}

/// The vendor library's display entry points.
///
/// Methods map one-to-one onto native calls. Every returned [`NativeView`] owns the native buffer
/// and carries the element count reported by the same call.
pub trait DisplayBackend: Send {
    /// `ADL2_Adapter_NumberOfAdapters_Get` followed by `ADL2_Adapter_AdapterInfo_Get`,
    /// returns `AdapterInfo` records.
    fn adapter_infos(&self) -> AdlResult<NativeView>;

    /// `ADL2_Adapter_Active_Get`
    fn adapter_active(&self, adapter_index: i32) -> AdlResult<bool>;

    /// `ADL2_Adapter_Primary_Get`
    fn primary_adapter(&self) -> AdlResult<i32>;

    /// `ADL2_Display_DisplayMapConfig_Get`
    fn display_map_config(&self, adapter_index: i32) -> AdlResult<DisplayMapBuffers>;

    /// `ADL2_Display_DisplayInfo_Get`, returns `ADLDisplayInfo` records.
    fn display_infos(&self, adapter_index: i32) -> AdlResult<NativeView>;

    /// `ADL2_Display_DDCInfo2_Get`
    fn ddc_info(&self, adapter_index: i32, display_index: i32) -> AdlResult<AdlDdcInfo2>;

    /// `ADL2_Display_HDRState_Get`
    fn hdr_state(&self, adapter_index: i32, display: AdlDisplayId) -> AdlResult<HdrState>;

    /// `ADL2_Display_HDRState_Set`
    fn set_hdr_state(
        &self,
        adapter_index: i32,
        display: AdlDisplayId,
        enabled: bool,
    ) -> AdlResult<()>;

    /// `ADL2_Display_SLSMapIndex_Get`, `None` when no SLS map matches the targets.
    fn sls_map_index(
        &self,
        adapter_index: i32,
        targets: &[AdlDisplayTarget],
    ) -> AdlResult<Option<i32>>;

    /// `ADL2_Display_SLSMapConfig_Get`
    fn sls_map_config(&self, adapter_index: i32, map_index: i32) -> AdlResult<SlsMapBuffers>;

    /// `ADL2_Display_SLSMapConfig_Valid`
    fn validate_sls_map(&self, map: &AdlSlsMap, targets: &[AdlSlsTarget])
    -> AdlResult<SlsValidity>;

    /// `ADL2_Display_SLSMapConfig_Create`, returns the new map's index.
    fn create_sls_map(
        &self,
        map: &AdlSlsMap,
        targets: &[AdlSlsTarget],
        bezel_percent: i32,
    ) -> AdlResult<i32>;

    /// `ADL2_Display_SLSMapConfig_SetState`
    fn set_sls_map_state(&self, adapter_index: i32, map_index: i32, enabled: bool)
    -> AdlResult<()>;

    /// `ADL2_Display_Modes_Get`, returns `ADLMode` records for the display's current mode.
    fn display_modes(&self, adapter_index: i32, display_index: i32) -> AdlResult<NativeView>;
}
