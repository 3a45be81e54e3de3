use std::{
    fs, io,
    path::{Path, PathBuf},
};

use display_config_provider::DisplayConfig;
use thiserror::Error;
use tracing::info;

/// Error variants for reading and writing profiles.
#[derive(Debug, Error)]
pub enum Error {
    #[error("'{0}' is not a valid profile name")]
    InvalidName(String),

    #[error("Profile '{0}' does not exist")]
    NotFound(String),

    #[error("Failed to read profile '{name}':\n{source}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to deserialize profile '{name}':\n{source}")]
    Deserialize {
        name: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize profile:\n{0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write profile '{name}':\n{source}")]
    Write {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Display configurations saved as TOML files in a directory.
pub struct ProfileStore {
    directory: PathBuf,
}

impl ProfileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path(&self, name: &str) -> Result<PathBuf, Error> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ' '));

        if !valid {
            return Err(Error::InvalidName(name.to_string()));
        }

        Ok(self.directory.join(format!("{name}.toml")))
    }

    pub fn load(&self, name: &str) -> Result<DisplayConfig, Error> {
        let path = self.path(name)?;

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(name.to_string()));
            }
            Err(source) => {
                return Err(Error::Read {
                    name: name.to_string(),
                    source,
                });
            }
        };

        toml::from_str(&contents).map_err(|source| Error::Deserialize {
            name: name.to_string(),
            source,
        })
    }

    pub fn save(&self, name: &str, config: &DisplayConfig) -> Result<PathBuf, Error> {
        let path = self.path(name)?;
        let to_error = |source| Error::Write {
            name: name.to_string(),
            source,
        };

        let toml_string = toml::to_string_pretty(config)?;

        fs::create_dir_all(&self.directory).map_err(to_error)?;
        fs::write(&path, toml_string.as_bytes()).map_err(to_error)?;

        info!("Saved profile '{name}' to {}", path.display());

        Ok(path)
    }
}
