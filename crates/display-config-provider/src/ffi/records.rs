use core::ffi::CStr;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use super::{
    ConnectorType,
    constants::{
        ADL_DDC_SUPPORTED, ADL_DISPLAY_DISPLAYINFO_DISPLAYCONNECTED,
        ADL_DISPLAY_DISPLAYINFO_DISPLAYMAPPED, ADL_MAX_PATH,
    },
};

/// Reads a NUL terminated string out of a fixed-size field.
///
/// Returns `None` if the field is unterminated, is not UTF-8, or is blank.
pub fn fixed_string(bytes: &[u8]) -> Option<String> {
    let value = CStr::from_bytes_until_nul(bytes).ok()?.to_str().ok()?.trim();

    if value.is_empty() {
        return None;
    }

    Some(value.to_string())
}

/// Writes `value` into a fixed-size string field, truncating to leave room for the terminator.
pub fn write_fixed_string(field: &mut [u8], value: &str) {
    field.fill(0);
    let len = value.len().min(field.len().saturating_sub(1));
    field[..len].copy_from_slice(&value.as_bytes()[..len]);
}

/// `AdapterInfo`, one entry per OS view of a GPU.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct AdlAdapterInfo {
    pub size: i32,
    pub adapter_index: i32,
    pub udid: [u8; ADL_MAX_PATH],
    pub bus_number: i32,
    pub device_number: i32,
    pub function_number: i32,
    pub vendor_id: i32,
    pub adapter_name: [u8; ADL_MAX_PATH],
    pub display_name: [u8; ADL_MAX_PATH],
    pub present: i32,
    pub exist: i32,
    pub driver_path: [u8; ADL_MAX_PATH],
    pub driver_path_ext: [u8; ADL_MAX_PATH],
    pub pnp_string: [u8; ADL_MAX_PATH],
    pub os_display_index: i32,
}

impl AdlAdapterInfo {
    /// Whether the adapter exists.
    pub fn exists(&self) -> bool {
        self.exist != 0
    }

    /// Whether the adapter is present.
    pub fn is_present(&self) -> bool {
        self.present != 0
    }

    /// The adapter's marketing name.
    pub fn adapter_name(&self) -> Option<String> {
        fixed_string(&self.adapter_name)
    }

    /// The OS display name, e.g. `\\.\DISPLAY1`.
    pub fn display_name(&self) -> Option<String> {
        fixed_string(&self.display_name)
    }
}

impl Default for AdlAdapterInfo {
    fn default() -> Self {
        Self {
            size: size_of::<Self>() as i32,
            ..Zeroable::zeroed()
        }
    }
}

/// `ADLDisplayID`
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct AdlDisplayId {
    pub logical_index: i32,
    pub physical_index: i32,
    pub logical_adapter_index: i32,
    pub physical_adapter_index: i32,
}

/// `ADLMode`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct AdlMode {
    pub adapter_index: i32,
    pub display_id: AdlDisplayId,
    pub x_pos: i32,
    pub y_pos: i32,
    pub x_res: i32,
    pub y_res: i32,
    pub colour_depth: i32,
    pub refresh_rate: f32,
    pub orientation: i32,
    pub mode_flag: i32,
    pub mode_mask: i32,
    pub mode_value: i32,
}

impl AdlMode {
    /// Whether both modes have the same resolution.
    pub fn same_resolution(&self, other: &Self) -> bool {
        self.x_res == other.x_res && self.y_res == other.y_res
    }
}

/// `ADLDisplayMap`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct AdlDisplayMap {
    pub display_map_index: i32,
    pub display_mode: AdlMode,
    pub num_display_target: i32,
    pub first_display_target_array_index: i32,
    pub display_map_mask: i32,
    pub display_map_value: i32,
}

/// `ADLDisplayTarget`
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct AdlDisplayTarget {
    pub display_id: AdlDisplayId,
    pub display_map_index: i32,
    pub display_target_mask: i32,
    pub display_target_value: i32,
}

/// `ADLDisplayInfo`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct AdlDisplayInfo {
    pub display_id: AdlDisplayId,
    pub display_controller_index: i32,
    pub display_name: [u8; ADL_MAX_PATH],
    pub display_manufacturer_name: [u8; ADL_MAX_PATH],
    pub display_type: i32,
    pub display_output_type: i32,
    pub display_connector: i32,
    pub display_info_mask: i32,
    pub display_info_value: i32,
}

impl AdlDisplayInfo {
    /// Whether a display is physically connected.
    pub fn is_connected(&self) -> bool {
        self.display_info_value & ADL_DISPLAY_DISPLAYINFO_DISPLAYCONNECTED != 0
    }

    /// Whether the display is mapped (active) under the OS.
    pub fn is_mapped(&self) -> bool {
        self.display_info_value & ADL_DISPLAY_DISPLAYINFO_DISPLAYMAPPED != 0
    }

    /// The connector the display is attached through.
    pub fn connector(&self) -> ConnectorType {
        ConnectorType::from_code(self.display_connector)
    }

    /// The display's name.
    pub fn display_name(&self) -> Option<String> {
        fixed_string(&self.display_name)
    }

    /// The display's manufacturer name.
    pub fn manufacturer_name(&self) -> Option<String> {
        fixed_string(&self.display_manufacturer_name)
    }
}

impl Default for AdlDisplayInfo {
    fn default() -> Self {
        Zeroable::zeroed()
    }
}

/// `ADLDDCInfo2`, the EDID derived information for a display.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct AdlDdcInfo2 {
    pub size: i32,
    pub supports_ddc: i32,
    pub manufacturer_id: i32,
    pub product_id: i32,
    pub display_name: [u8; ADL_MAX_PATH],
    pub max_h_resolution: i32,
    pub max_v_resolution: i32,
    pub max_refresh: i32,
    pub ptm_cx: i32,
    pub ptm_cy: i32,
    pub ptm_refresh_rate: i32,
    pub ddc_info_flag: i32,
    pub packed_pixel_supported: i32,
    pub panel_pixel_format: i32,
    pub serial_id: i32,
    pub min_luminance_data: i32,
    pub avg_luminance_data: i32,
    pub max_luminance_data: i32,
    pub supported_transfer_function: i32,
    pub supported_color_space: i32,
    pub native_display_chromaticity: [i32; 8],
    pub diffuse_screen_reflectance: i32,
    pub specular_screen_reflectance: i32,
    pub supported_hdr: i32,
    pub freesync_flags: i32,
    pub min_luminance_no_dimming_data: i32,
    pub max_backlight_max_luminance_data: i32,
    pub min_backlight_max_luminance_data: i32,
    pub max_backlight_min_luminance_data: i32,
    pub min_backlight_min_luminance_data: i32,
    pub reserved: [i32; 4],
}

impl AdlDdcInfo2 {
    /// Whether the EDID could be read.
    pub fn supports_ddc(&self) -> bool {
        self.supports_ddc == ADL_DDC_SUPPORTED
    }

    /// The EDID display name.
    pub fn display_name(&self) -> Option<String> {
        fixed_string(&self.display_name)
    }
}

impl Default for AdlDdcInfo2 {
    fn default() -> Self {
        Self {
            size: size_of::<Self>() as i32,
            ..Zeroable::zeroed()
        }
    }
}

/// `ADLSLSGrid`
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct AdlSlsGrid {
    pub adapter_index: i32,
    pub sls_grid_index: i32,
    pub sls_grid_row: i32,
    pub sls_grid_column: i32,
    pub sls_grid_mask: i32,
    pub sls_grid_value: i32,
}

impl AdlSlsGrid {
    /// Number of displays the grid lays out.
    pub fn cells(&self) -> i64 {
        i64::from(self.sls_grid_row) * i64::from(self.sls_grid_column)
    }
}

/// `ADLSLSMap`
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct AdlSlsMap {
    pub adapter_index: i32,
    pub sls_map_index: i32,
    pub grid: AdlSlsGrid,
    pub surface_map_index: i32,
    pub orientation: i32,
    pub num_sls_target: i32,
    pub first_sls_target_array_index: i32,
    pub num_native_mode: i32,
    pub first_native_mode_array_index: i32,
    pub num_bezel_mode: i32,
    pub first_bezel_mode_array_index: i32,
    pub num_bezel_offset: i32,
    pub first_bezel_offset_array_index: i32,
    pub sls_map_mask: i32,
    pub sls_map_value: i32,
}

/// `ADLSLSTarget`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct AdlSlsTarget {
    pub adapter_index: i32,
    pub sls_target_index: i32,
    pub display_target: AdlDisplayTarget,
    pub sls_grid_position_x: i32,
    pub sls_grid_position_y: i32,
    pub view_size: AdlMode,
    pub sls_target_mask: i32,
    pub sls_target_value: i32,
}

/// `ADLSLSMode`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct AdlSlsMode {
    pub adapter_index: i32,
    pub sls_mode_index: i32,
    pub sls_map_index: i32,
    pub display_mode: AdlMode,
    pub sls_native_mode_mask: i32,
    pub sls_native_mode_value: i32,
}

/// `ADLBezelTransientMode`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct AdlBezelTransientMode {
    pub adapter_index: i32,
    pub sls_map_index: i32,
    pub sls_mode_index: i32,
    pub display_mode: AdlMode,
    pub num_bezel_offset: i32,
    pub first_bezel_offset_array_index: i32,
    pub sls_bezel_transient_mode_mask: i32,
    pub sls_bezel_transient_mode_value: i32,
}

/// `ADLSLSOffset`
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct AdlSlsOffset {
    pub adapter_index: i32,
    pub sls_map_index: i32,
    pub display_id: AdlDisplayId,
    pub bezel_mode_index: i32,
    pub bezel_offset_x: i32,
    pub bezel_offset_y: i32,
    pub display_width: i32,
    pub display_height: i32,
    pub bezel_offset_mask: i32,
    pub bezel_offset_value: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_sizes_match_headers() {
        assert_eq!(size_of::<AdlDisplayId>(), 16);
        assert_eq!(size_of::<AdlMode>(), 60);
        assert_eq!(size_of::<AdlDisplayTarget>(), 28);
        assert_eq!(size_of::<AdlSlsGrid>(), 24);
        assert_eq!(size_of::<AdlSlsMap>(), 80);
        assert_eq!(size_of::<AdlAdapterInfo>(), 1572);
        assert_eq!(size_of::<AdlDisplayInfo>(), 552);
    }

    #[test]
    fn fixed_strings() {
        let mut field = [0u8; ADL_MAX_PATH];
        assert_eq!(fixed_string(&field), None);

        write_fixed_string(&mut field, "Radeon RX 7900 XTX");
        assert_eq!(fixed_string(&field).as_deref(), Some("Radeon RX 7900 XTX"));

        let unterminated = [b'a'; 4];
        assert_eq!(fixed_string(&unterminated), None);

        let invalid = [0xff, 0xfe, 0];
        assert_eq!(fixed_string(&invalid), None);
    }

    #[test]
    fn display_info_flags() {
        let mut info = AdlDisplayInfo::default();
        assert!(!info.is_connected());

        info.display_info_value = ADL_DISPLAY_DISPLAYINFO_DISPLAYCONNECTED;
        assert!(info.is_connected());
        assert!(!info.is_mapped());

        info.display_info_value |= ADL_DISPLAY_DISPLAYINFO_DISPLAYMAPPED;
        assert!(info.is_mapped());
    }
}
