//! Shared building blocks for sonde: target parsing, address enumeration,
//! outcome classification and the scan configuration.

pub mod config;
pub mod network;
