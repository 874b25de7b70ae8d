//! PTY module - spawns the recorded command under a pseudo-terminal
//!
//! This module provides abstractions for creating and managing pseudo-terminal
//! (PTY) sessions with child processes.
//!
//! # Structure
//!
//! - [`error`] - Error types for PTY operations
//! - [`size`] - Terminal size configuration
//! - [`host`] - PTY host implementation
//! - [`shell`] - Shell selection utilities

mod error;
mod host;
mod shell;
mod size;

pub use error::PtyError;
pub use host::{PtyHost, PtyHostSplit};
pub use shell::select_shell;
pub use size::PtySize;
