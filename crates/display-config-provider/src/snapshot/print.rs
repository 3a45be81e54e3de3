use core::fmt::{self, Display, Write as _};

use crate::ffi::AdlMode;

use super::{DisplayConfig, SpanMapConfig};

fn mode(mode: &AdlMode) -> String {
    format!(
        "{}x{} @ {:.2}Hz ({}, {})",
        mode.x_res, mode.y_res, mode.refresh_rate, mode.x_pos, mode.y_pos
    )
}

fn span_map(f: &mut fmt::Formatter<'_>, map: &SpanMapConfig) -> fmt::Result {
    writeln!(
        f,
        "    Map {} on adapter {}: {}x{} grid, orientation {}, bezel {}%{}",
        map.map_index(),
        map.adapter_index(),
        map.map.grid.sls_grid_column,
        map.map.grid.sls_grid_row,
        map.map.orientation,
        map.bezel_percent,
        if map.bezel_compensated { " (compensated)" } else { "" },
    )?;

    for target in &map.targets {
        writeln!(
            f,
            "      Target display {} at ({}, {}): {}",
            target.display_target.display_id.logical_index,
            target.sls_grid_position_x,
            target.sls_grid_position_y,
            mode(&target.view_size),
        )?;
    }

    let mut modes = String::new();
    for native in &map.native_modes {
        let _ = write!(modes, " [{}]", mode(&native.display_mode));
    }
    writeln!(f, "      Native modes:{modes}")?;

    let mut modes = String::new();
    for bezel in &map.bezel_modes {
        let _ = write!(modes, " [{}]", mode(&bezel.display_mode));
    }
    writeln!(f, "      Bezel modes:{modes}")?;

    writeln!(
        f,
        "      {} transient modes, {} offsets",
        map.transient_modes.len(),
        map.offsets.len()
    )
}

impl Display for DisplayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Adapters:")?;
        for adapter in &self.adapters {
            writeln!(
                f,
                "  [{}] {} (bus {}, device {}, OS display {}){}",
                adapter.adapter_index,
                adapter.display_name,
                adapter.bus_number,
                adapter.device_number,
                adapter.os_display_index,
                if adapter.is_primary { " primary" } else { "" },
            )?;
        }

        writeln!(
            f,
            "Span: {}",
            if self.span.enabled {
                "enabled"
            } else {
                "disabled"
            }
        )?;
        for map in &self.span.maps {
            span_map(f, map)?;
        }
        for display_mode in &self.span.enabled_display_modes {
            writeln!(
                f,
                "    Display {} running {}",
                display_mode.display_id.logical_index,
                mode(display_mode)
            )?;
        }

        writeln!(f, "HDR:")?;
        for (display_index, hdr) in self.hdr.iter() {
            writeln!(
                f,
                "  Display {display_index} on adapter {}: {}, {}",
                hdr.adapter_index,
                if hdr.supported {
                    "supported"
                } else {
                    "unsupported"
                },
                if hdr.enabled { "enabled" } else { "disabled" },
            )?;
        }

        writeln!(f, "Displays:")?;
        for identifier in &self.display_identifiers {
            writeln!(f, "  {identifier}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::snapshot::{AdapterConfig, DisplayConfig, HdrConfig};

    #[test]
    fn dump_lists_every_section() {
        let mut config = DisplayConfig::default();
        config.adapters.insert(AdapterConfig {
            device_number: 3,
            bus_number: 1,
            adapter_index: 0,
            is_primary: true,
            display_name: "\\\\.\\DISPLAY1".to_string(),
            os_display_index: 0,
        });
        config.hdr.insert_first(
            2,
            HdrConfig {
                adapter_index: 0,
                supported: true,
                enabled: false,
            },
        );
        config.display_identifiers = vec!["AMD|3|Radeon|DisplayPort|1|2|Dell".to_string()];

        let dump = config.to_string();

        assert!(dump.contains("[0] \\\\.\\DISPLAY1 (bus 1, device 3, OS display 0) primary"));
        assert!(dump.contains("Span: disabled"));
        assert!(dump.contains("Display 2 on adapter 0: supported, disabled"));
        assert!(dump.contains("  AMD|3|Radeon|DisplayPort|1|2|Dell"));
    }
}
