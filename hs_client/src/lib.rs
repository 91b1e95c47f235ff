//! Internal modules for the hold'em terminal client.
//!
//! This library provides command parsing and table rendering used by the
//! hs_client binary.

pub mod commands;
pub mod display;
