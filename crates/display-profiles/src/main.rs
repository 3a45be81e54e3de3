//! # Display Profiles
//! Saves, checks and applies display configuration profiles.
//!

#![allow(clippy::std_instead_of_alloc)]

use std::process::exit;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use commands::{Command, USAGE};
use directories::log_dir;
use failure::Failure;
use logger::setup_logger;
use profile::ProfileStore;
use settings::Settings;
use tracing::{info, info_span};

mod commands;
mod directories;
mod failure;
mod logger;
mod profile;
mod settings;

/// The Cargo package version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// If this instance should have debug enabled.
pub fn should_debug() -> bool {
    std::env::args().any(|arg| arg.eq("--debug"))
}

fn main() {
    let Some(command) = Command::parse(std::env::args().skip(1)) else {
        eprintln!("{USAGE}");
        exit(2);
    };

    // Set up logger
    let _logger_guards = setup_logger(should_debug(), &log_dir())
        .log_and_exit("The logger could not be set up");

    let _span = info_span!("[Main]").entered();
    info!("Display Profiles v{VERSION}");

    let settings = Settings::load_or_create().log_and_exit("The settings could not be loaded");
    let store = ProfileStore::new(&settings.profile_directory);
    info!("Using profiles in {}", store.directory().display());

    run(&command, &settings, &store);
}

#[cfg(windows)]
fn run(command: &Command, settings: &Settings, store: &ProfileStore) {
    use display_config_provider::DisplayLibrary;

    let library = DisplayLibrary::load(&settings.library);
    if !library.is_installed() {
        failure::log_and_exit(
            "no supported vendor library was found",
            "The display library could not be loaded",
        );
    }

    command
        .run(&library, store)
        .log_and_exit("The command failed");
}

#[cfg(not(windows))]
fn run(_command: &Command, _settings: &Settings, _store: &ProfileStore) {
    failure::log_and_exit(
        "the vendor library is only available on Windows",
        "The display library could not be loaded",
    );
}
