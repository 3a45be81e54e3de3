use serde::{Deserialize, Serialize};

/// How the vendor library is loaded and identified.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// DLL names tried in order until one loads.
    pub library_names: Vec<String>,

    /// Leading field of every display identifier.
    pub vendor_tag: String,

    /// Whether the native context only enumerates adapters with a display connected.
    pub connected_adapters_only: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            library_names: vec!["atiadlxx.dll".to_string(), "atiadlxy.dll".to_string()],
            vendor_tag: "AMD".to_string(),
            connected_adapters_only: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LibraryConfig;

    #[test]
    fn missing_fields_use_defaults() {
        let config: LibraryConfig = toml::from_str("vendor_tag = \"ATI\"").unwrap();

        assert_eq!(config.vendor_tag, "ATI");
        assert_eq!(config.library_names, LibraryConfig::default().library_names);
        assert!(config.connected_adapters_only);
    }
}
