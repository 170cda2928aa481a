//! Core types for the flicbridge button bridge.
//!
//! This crate defines the vocabulary shared by the vendor SDK boundary
//! (`flicbridge-hardware`) and the session controller
//! (`flicbridge-session`): button addresses and snapshots, click events,
//! radio and connection state, and the [`BridgeError`] taxonomy.
//!
//! All types here are plain values. They carry no vendor SDK handles, so
//! they can be cloned, serialized and shipped across any application
//! boundary without lifetime concerns.

pub mod error;
pub mod types;

pub use error::{BridgeError, Result};
pub use types::{
    BatteryStatus, ButtonAddress, ButtonInfo, ClickEvent, ClickEventBuilder, ClickType,
    ConnectionState, RadioState,
};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
