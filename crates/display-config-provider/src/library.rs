//! The vendor binding facade.

use alloc::collections::BTreeSet;
use core::fmt::Display;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    apply::{self, HdrReport, apply_hdr_overrides, apply_span_config},
    backend::DisplayBackend,
    builder::{self, build_display_config, connected_display_identifiers},
    config::LibraryConfig,
    snapshot::{DisplayConfig, HdrConfigs},
};

/// Error variants for the facade.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("The vendor display library is not available")]
    NotAvailable,

    #[error("Failed to refresh the display config:\n{0}")]
    Refresh(#[from] builder::Error),

    #[error("Failed to apply the display config:\n{0}")]
    Apply(#[from] apply::Error),
}

/// A vendor display library and the last known display configuration.
///
/// The facade is either ready, holding a loaded backend, or unavailable for the rest of its
/// lifetime. Every native call sequence runs under the facade's lock.
pub struct DisplayLibrary<B> {
    vendor_tag: String,
    state: Mutex<State<B>>,
}

enum State<B> {
    Ready(Loaded<B>),
    Unavailable,
}

struct Loaded<B> {
    backend: B,
    active: DisplayConfig,
    connected: BTreeSet<String>,
}

impl<B: DisplayBackend> Loaded<B> {
    /// Rebuilds both views of the hardware, replacing them only once both succeed.
    fn refresh(&mut self, vendor_tag: &str) -> Result<(), builder::Error> {
        let active = build_display_config(&self.backend, vendor_tag)?;
        let connected = connected_display_identifiers(&self.backend, vendor_tag)?;

        self.active = active;
        self.connected = connected;

        Ok(())
    }

    fn refresh_after_hdr(&mut self, vendor_tag: &str) {
        if let Err(e) = self.refresh(vendor_tag) {
            warn!("Failed to refresh the display config after applying HDR overrides:\n{e}");
        }
    }
}

impl<B: DisplayBackend> DisplayLibrary<B> {
    /// Loads the backend and takes the first snapshot.
    ///
    /// A load failure leaves the facade unavailable. A failed first snapshot is logged and leaves
    /// an empty configuration in place.
    pub fn initialize<E, F>(config: &LibraryConfig, load: F) -> Self
    where
        E: Display,
        F: FnOnce(&LibraryConfig) -> Result<B, E>,
    {
        let backend = match load(config) {
            Ok(backend) => backend,
            Err(e) => {
                warn!("Vendor display library is not available:\n{e}");
                return Self::unavailable(config);
            }
        };

        info!("Loaded vendor display library");

        let mut loaded = Loaded {
            backend,
            active: DisplayConfig::default(),
            connected: BTreeSet::new(),
        };

        if let Err(e) = loaded.refresh(&config.vendor_tag) {
            warn!("Failed to take the initial display config:\n{e}");
        }

        Self {
            vendor_tag: config.vendor_tag.clone(),
            state: Mutex::new(State::Ready(loaded)),
        }
    }

    /// Wraps an already loaded backend.
    pub fn from_backend(config: &LibraryConfig, backend: B) -> Self {
        Self::initialize(config, |_| Ok::<_, core::convert::Infallible>(backend))
    }

    /// A facade whose library failed to load.
    pub fn unavailable(config: &LibraryConfig) -> Self {
        Self {
            vendor_tag: config.vendor_tag.clone(),
            state: Mutex::new(State::Unavailable),
        }
    }

    fn with_loaded<R>(
        &self,
        f: impl FnOnce(&mut Loaded<B>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let mut state = self.state.lock();

        match &mut *state {
            State::Ready(loaded) => f(loaded),
            State::Unavailable => Err(Error::NotAvailable),
        }
    }

    /// Whether the vendor library loaded.
    pub fn is_installed(&self) -> bool {
        matches!(*self.state.lock(), State::Ready(_))
    }

    /// The tag display identifiers start with.
    pub fn vendor_tag(&self) -> &str {
        &self.vendor_tag
    }

    /// The last known active configuration.
    pub fn active_config(&self) -> Result<DisplayConfig, Error> {
        self.with_loaded(|loaded| Ok(loaded.active.clone()))
    }

    /// Replaces the last known active configuration without touching the hardware.
    pub fn set_active_config(&self, config: DisplayConfig) -> Result<(), Error> {
        self.with_loaded(|loaded| {
            loaded.active = config;
            Ok(())
        })
    }

    /// Identifiers of the displays in the active configuration.
    pub fn current_display_identifiers(&self) -> Result<Vec<String>, Error> {
        self.with_loaded(|loaded| Ok(loaded.active.display_identifiers.clone()))
    }

    /// Identifiers of every display seen connected at the last refresh.
    pub fn connected_display_identifiers(&self) -> Result<Vec<String>, Error> {
        self.with_loaded(|loaded| Ok(loaded.connected.iter().cloned().collect()))
    }

    /// Re-reads the hardware state.
    ///
    /// On failure the previous configuration is kept.
    #[instrument(skip_all, err)]
    pub fn refresh(&self) -> Result<(), Error> {
        let vendor_tag = self.vendor_tag.as_str();

        self.with_loaded(|loaded| {
            loaded.refresh(vendor_tag)?;
            info!("Refreshed display config");
            Ok(())
        })
    }

    /// Whether `desired` equals the active configuration.
    pub fn is_config_active(&self, desired: &DisplayConfig) -> Result<bool, Error> {
        self.with_loaded(|loaded| Ok(loaded.active == *desired))
    }

    /// Whether every display `desired` uses is connected.
    pub fn is_config_possible(&self, desired: &DisplayConfig) -> Result<bool, Error> {
        self.with_loaded(|loaded| {
            Ok(desired
                .display_identifiers
                .iter()
                .all(|identifier| loaded.connected.contains(identifier)))
        })
    }

    /// Whether `desired` is structurally valid, every configuration currently is.
    pub fn is_config_valid(&self, _desired: &DisplayConfig) -> Result<bool, Error> {
        self.with_loaded(|_| Ok(true))
    }

    /// Applies the span topology of `desired`, then its HDR overrides.
    ///
    /// A span failure stops before the HDR pass and leaves the hardware in whatever state the
    /// failed sequence reached. Once HDR overrides have been issued the report is always
    /// returned, a failed refresh after them keeps the previous snapshot.
    #[instrument(skip_all, err)]
    pub fn apply(&self, desired: &DisplayConfig) -> Result<HdrReport, Error> {
        let vendor_tag = self.vendor_tag.as_str();

        self.with_loaded(|loaded| {
            apply_span_config(&loaded.backend, &desired.span, &loaded.active.span)?;
            loaded.refresh(vendor_tag)?;

            let report = apply_hdr_overrides(&loaded.backend, &desired.hdr);
            loaded.refresh_after_hdr(vendor_tag);

            info!(
                hdr_applied = report.applied,
                hdr_failed = report.failed,
                "Applied display config"
            );

            Ok(report)
        })
    }

    /// Applies HDR overrides alone.
    #[instrument(skip_all, err)]
    pub fn apply_hdr(&self, desired: &HdrConfigs) -> Result<HdrReport, Error> {
        let vendor_tag = self.vendor_tag.as_str();

        self.with_loaded(|loaded| {
            let report = apply_hdr_overrides(&loaded.backend, desired);
            loaded.refresh_after_hdr(vendor_tag);
            Ok(report)
        })
    }

    /// Runs `f` against the loaded backend.
    pub fn with_backend<R>(&self, f: impl FnOnce(&B) -> R) -> Result<R, Error> {
        self.with_loaded(|loaded| Ok(f(&loaded.backend)))
    }
}
