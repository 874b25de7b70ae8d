//! agent-recorder library crate.
//!
//! This module exposes the internal components for integration testing.

pub mod agents;
pub mod cast;
pub mod config;
pub mod proxy;
pub mod pty;
pub mod recorder;
