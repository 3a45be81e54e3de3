//! Record layouts and constants of the ADL2 display ABI.
//!
//! Every record is `#[repr(C)]` and [`bytemuck::Pod`] so it can be copied in and out of the
//! native buffers the library hands back.

pub mod constants;
mod connector;
mod records;

pub use connector::ConnectorType;
pub use records::*;
