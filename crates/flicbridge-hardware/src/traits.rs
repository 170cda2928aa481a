//! Vendor manager trait definition.
//!
//! This module defines the fixed capability set the bridge needs from a
//! vendor button SDK: manager lifecycle, button lifecycle and the
//! asynchronous callback stream. Everything behind this trait — the BLE
//! stack, the pairing protocol, reconnection backoff, persistence of
//! paired records — is the vendor's business and stays opaque.
//!
//! The trait uses native `async fn` methods (Edition 2024 RPITIT), so it
//! is not object-safe; use the enum wrapper in
//! [`devices`](crate::devices) for concrete dispatch.

#![allow(async_fn_in_trait)]

use flicbridge_core::{ButtonAddress, ButtonInfo, RadioState, Result};
use tokio::sync::mpsc;

use crate::events::ManagerEvent;

/// Capability surface of a vendor button manager.
///
/// All mutating operations are asynchronous *requests*: `Ok(())` means the
/// vendor accepted the request, not that it completed. Completion and
/// every spontaneous state change arrive on the event stream obtained from
/// [`take_events`](ButtonManager::take_events).
///
/// # Examples
///
/// ```no_run
/// use flicbridge_core::{ButtonAddress, RadioState, Result};
/// use flicbridge_hardware::traits::ButtonManager;
///
/// async fn reconnect_all<M: ButtonManager>(manager: &mut M) -> Result<()> {
///     if manager.radio_state() != RadioState::PoweredOn {
///         return Ok(());
///     }
///     for button in manager.known_buttons().await? {
///         manager.connect(&button.address).await?;
///     }
///     Ok(())
/// }
/// ```
pub trait ButtonManager: Send + Sync {
    /// Current power state of the underlying radio.
    fn radio_state(&self) -> RadioState;

    /// Take the vendor callback stream.
    ///
    /// Returns `None` after the first call; there is exactly one stream
    /// per manager instance.
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ManagerEvent>>;

    /// Request passive discovery to start.
    ///
    /// # Errors
    ///
    /// Returns an error if the radio is not powered on.
    async fn start_scan(&mut self) -> Result<()>;

    /// Request the active scan to stop. Best-effort: callbacks already
    /// scheduled may still arrive afterwards.
    async fn stop_scan(&mut self) -> Result<()>;

    /// The vendor's authoritative list of paired buttons, persisted by
    /// the SDK across process restarts.
    ///
    /// # Errors
    ///
    /// Returns an error if the vendor store cannot be read.
    async fn known_buttons(&self) -> Result<Vec<ButtonInfo>>;

    /// Request a connection to a paired button. Establishment is reported
    /// later as [`ManagerEvent::ButtonConnected`].
    ///
    /// # Errors
    ///
    /// Returns an error if the address is unknown to the vendor or the
    /// button is not paired.
    async fn connect(&mut self, address: &ButtonAddress) -> Result<()>;

    /// Request disconnection, or abort a pending connection attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is unknown to the vendor.
    async fn disconnect(&mut self, address: &ButtonAddress) -> Result<()>;

    /// Remove the pairing permanently. The button must be rediscovered
    /// and re-paired before it can be used again.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is unknown to the vendor.
    async fn forget(&mut self, address: &ButtonAddress) -> Result<()>;

    /// Attach or detach click delivery for one button.
    ///
    /// While detached, presses are not delivered to the event stream;
    /// the button itself may still buffer them offline.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is unknown to the vendor.
    async fn set_listening(&mut self, address: &ButtonAddress, listen: bool) -> Result<()>;
}
