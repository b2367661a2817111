//! Traffic dashboard service
//!
//! HTTP API, live push channel and configuration for the traffic monitor.
//! The binary in `main.rs` wires these together.

pub mod api;
pub mod config;
