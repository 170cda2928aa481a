//! Session layer of the flicbridge button bridge.
//!
//! This crate turns the raw vendor surface exposed by
//! `flicbridge-hardware` into the stable contract an application consumes:
//!
//! - [`DeviceSessionController`] owns the vendor manager, serializes
//!   commands against the callback stream, and maintains the
//!   [`registry::ButtonRegistry`] of known buttons.
//! - [`EventListener`] (the composition of [`ManagerEvents`] and
//!   [`ButtonEvents`]) is the notification contract; [`ChannelListener`]
//!   adapts it to a [`BridgeEvent`] stream on a tokio channel.
//!
//! The controller is deliberately conservative: commands return plain
//! booleans ("request accepted" or not), completions and failures arrive
//! asynchronously through the listener, and no error ever tears the
//! session down.

pub mod controller;
pub mod listener;
pub mod registry;

// Re-export commonly used types for convenience
pub use controller::DeviceSessionController;
pub use listener::{BridgeEvent, ButtonEvents, ChannelListener, EventListener, ManagerEvents};
