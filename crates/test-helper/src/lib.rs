//! Shared fixtures for the workspace's tests.

extern crate alloc;

pub mod allocator;
pub mod backend;
pub mod logger;
