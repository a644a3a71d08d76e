//! Shared setup for the beacon binaries

pub mod common;
pub mod server;
