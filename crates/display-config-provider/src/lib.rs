//! # Display Config Provider
//! Reads, compares and applies the display configuration (span topology and HDR state) exposed
//! by the AMD ADL2 display library.
//!
//! The native surface is reached through [`DisplayBackend`]. On Windows [`native::Adl2Backend`]
//! binds it to the vendor DLL, anything else can drive the same facade in its place.

extern crate alloc;

pub mod apply;
pub mod backend;
pub mod builder;
mod config;
pub mod ffi;
pub mod library;
mod marshal;
pub mod memory;
#[cfg(windows)]
pub mod native;
mod result;
pub mod snapshot;

pub use apply::HdrReport;
pub use backend::DisplayBackend;
pub use config::LibraryConfig;
pub use library::DisplayLibrary;
pub use marshal::Records;
pub use result::{AdlError, AdlErrorSource, AdlResult, AdlStatus, Degradable};
pub use snapshot::{
    AdapterConfig, DisplayConfig, HdrConfig, HdrConfigs, SpanConfig, SpanMapConfig,
};
