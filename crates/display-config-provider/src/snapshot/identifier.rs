use crate::{
    ffi::{AdlAdapterInfo, AdlDdcInfo2, AdlDisplayInfo},
    result::{AdlResult, Degradable},
};

/// Written in place of an identifier field that could not be read.
pub const PLACEHOLDER: &str = "#";

/// Builds the stable identifier for a display.
///
/// The identifier is `|` separated: vendor tag, adapter device number, adapter name, connector
/// type, then either the EDID manufacturer id, product id and name, or when EDID data is
/// unavailable the driver's manufacturer and display names.
///
/// The identifier is degraded when the EDID read failed or a field had to be replaced with
/// [`PLACEHOLDER`].
pub fn display_identifier(
    vendor_tag: &str,
    adapter: &AdlAdapterInfo,
    display: &AdlDisplayInfo,
    ddc: AdlResult<AdlDdcInfo2>,
) -> Degradable<String> {
    let mut missing: Vec<&'static str> = Vec::new();
    let mut field = |value: Option<String>, name: &'static str| match value {
        Some(value) if !value.is_empty() => value,
        _ => {
            missing.push(name);
            PLACEHOLDER.to_string()
        }
    };

    let mut parts = vec![
        field(Some(vendor_tag.to_string()), "vendor tag"),
        adapter.device_number.to_string(),
        field(adapter.adapter_name(), "adapter name"),
        field(display.connector().name().map(str::to_string), "connector type"),
    ];

    let mut ddc_failure = None;
    match ddc {
        Ok(ddc) if ddc.supports_ddc() => {
            parts.push(ddc.manufacturer_id.to_string());
            parts.push(ddc.product_id.to_string());
            parts.push(field(ddc.display_name(), "EDID display name"));
        }
        result => {
            if let Err(error) = result {
                ddc_failure = Some(error.to_string());
            }
            parts.push(field(display.manufacturer_name(), "manufacturer name"));
            parts.push(field(display.display_name(), "display name"));
        }
    }

    let identifier = parts.join("|");

    let mut reasons: Vec<String> = Vec::new();
    if let Some(failure) = ddc_failure {
        reasons.push(failure);
    }
    if !missing.is_empty() {
        reasons.push(format!("missing {}", missing.join(", ")));
    }

    if reasons.is_empty() {
        Degradable::Exact(identifier)
    } else {
        Degradable::Degraded {
            value: identifier,
            reason: reasons.join("; "),
        }
    }
}
