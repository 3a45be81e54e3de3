use std::{fs::create_dir_all, path::PathBuf};

use crate::failure::Failure;

/// Path to the config directory.
pub fn config_dir() -> PathBuf {
    let dir = dirs::config_dir()
        .ok_or("No config directory is known for this user")
        .log_and_exit("The config directory could not be retrieved")
        .join("Display Profiles");

    create_dir_all(&dir).log("Could not create the config directory");

    dir
}

/// Path to the log directory.
pub fn log_dir() -> PathBuf {
    config_dir().join("logs")
}
