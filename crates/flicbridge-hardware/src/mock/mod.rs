//! Mock vendor SDK implementation for testing and development.
//!
//! This module provides a simulated button manager that can be controlled
//! programmatically without any Bluetooth hardware.

pub mod manager;

// Re-export commonly used types
pub use manager::{MockManager, MockManagerHandle};
