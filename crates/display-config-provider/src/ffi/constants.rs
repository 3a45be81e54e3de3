//! Constants from the ADL2 headers.

/// Length of the fixed-size strings embedded in ADL records.
pub const ADL_MAX_PATH: usize = 256;

/// The call succeeded.
pub const ADL_OK: i32 = 0;
/// The call succeeded but a warning was raised.
pub const ADL_OK_WARNING: i32 = 1;

/// Passed to `ADL2_Main_Control_Create` to only enumerate connected adapters.
pub const ADL_ENUM_CONNECTED_ADAPTERS: i32 = 1;

/// `ADL2_Display_DisplayMapConfig_Get` option to return every target on the GPU.
pub const ADL_DISPLAY_DISPLAYMAP_OPTION_GPUINFO: i32 = 0x1;

/// `ADLDisplayInfo::display_info_value` bit: a display is connected.
pub const ADL_DISPLAY_DISPLAYINFO_DISPLAYCONNECTED: i32 = 0x1;
/// `ADLDisplayInfo::display_info_value` bit: a display is mapped under OS.
pub const ADL_DISPLAY_DISPLAYINFO_DISPLAYMAPPED: i32 = 0x2;

/// `ADL2_Display_SLSMapConfig_Get` option, report angles relative to the current orientation.
pub const ADL_DISPLAY_SLSMAPCONFIG_GET_OPTION_RELATIVETO_CURRENTANGLE: i32 = 0x1;
/// `ADL2_Display_SLSMapConfig_Create` option, targets are relative to the current orientation.
pub const ADL_DISPLAY_SLSMAPCONFIG_CREATE_OPTION_RELATIVETO_CURRENTANGLE: i32 = 0x1;

/// Map index reported when no SLS map matches the requested targets.
pub const ADL_INVALID_SLS_MAP_INDEX: i32 = -1;

/// `ADL2_Display_SLSMapConfig_SetState` state enabling a map.
pub const ADL_SLS_MAP_STATE_ENABLED: i32 = 1;
/// `ADL2_Display_SLSMapConfig_SetState` state disabling a map.
pub const ADL_SLS_MAP_STATE_DISABLED: i32 = 0;

/// `ADLDDCInfo2::supports_ddc` is set when EDID data was read.
pub const ADL_DDC_SUPPORTED: i32 = 1;
