//! Vendor SDK boundary for the flicbridge button bridge.
//!
//! This crate pins down the fixed capability set the bridge needs from a
//! vendor Bluetooth-button SDK and nothing more: manager lifecycle,
//! button lifecycle, and the asynchronous callback stream. The BLE
//! protocol, pairing and security, offline click buffering and
//! paired-record persistence all live behind this boundary and are never
//! reimplemented here.
//!
//! # Design
//!
//! - **One trait, one stream**: [`ButtonManager`] is the command surface;
//!   every asynchronous completion and spontaneous state change arrives as
//!   a [`ManagerEvent`] on the channel obtained from
//!   [`take_events`](traits::ButtonManager::take_events).
//! - **Requests, not results**: mutating trait methods return `Ok` when
//!   the vendor *accepts* a request. Connection establishment, discovery
//!   results and click delivery are all reported later on the stream.
//! - **Native async traits**: `async fn` via RPITIT (Edition 2024), with
//!   the [`AnyButtonManager`] enum wrapper supplying concrete dispatch
//!   where a trait object will not do.
//!
//! # Mock backend
//!
//! [`MockManager`] and [`MockManagerHandle`] form a `(device, handle)`
//! pair: the manager half is handed to the session controller, the handle
//! half scripts the physical world — buttons advertising, pairing,
//! being pressed, dropping their link — for tests and development
//! without hardware.

pub mod devices;
pub mod events;
pub mod mock;
pub mod traits;

// Re-export commonly used types for convenience
pub use devices::AnyButtonManager;
pub use events::{ClickDelivery, ManagerEvent};
pub use mock::{MockManager, MockManagerHandle};
pub use traits::ButtonManager;
