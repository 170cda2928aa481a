//! Enum wrapper for vendor manager dispatch.
//!
//! Native `async fn` in traits (RPITIT, Edition 2024) is not object-safe,
//! so the session controller cannot hold a `Box<dyn ButtonManager>`. This
//! enum provides concrete type dispatch instead: zero-cost, monomorphized
//! at compile time, extensible through feature-gated variants when real
//! vendor backends land.

use flicbridge_core::{ButtonAddress, ButtonInfo, RadioState, Result};
use tokio::sync::mpsc;

use crate::events::ManagerEvent;
use crate::mock::MockManager;
use crate::traits::ButtonManager;

/// Enum wrapper for button manager dispatch.
///
/// # Examples
///
/// ```
/// use flicbridge_hardware::devices::AnyButtonManager;
/// use flicbridge_hardware::mock::MockManager;
/// use flicbridge_hardware::traits::ButtonManager;
///
/// let (manager, _handle) = MockManager::new();
/// let any_manager = AnyButtonManager::Mock(manager);
///
/// // Usable polymorphically through the ButtonManager trait
/// let _ = any_manager.radio_state();
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyButtonManager {
    /// Mock manager for development and testing.
    Mock(MockManager),
    // A real flic2lib-backed variant slots in here behind the
    // `vendor-flic2` feature once the native bindings exist.
}

impl ButtonManager for AnyButtonManager {
    fn radio_state(&self) -> RadioState {
        match self {
            Self::Mock(manager) => manager.radio_state(),
        }
    }

    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ManagerEvent>> {
        match self {
            Self::Mock(manager) => manager.take_events(),
        }
    }

    async fn start_scan(&mut self) -> Result<()> {
        match self {
            Self::Mock(manager) => manager.start_scan().await,
        }
    }

    async fn stop_scan(&mut self) -> Result<()> {
        match self {
            Self::Mock(manager) => manager.stop_scan().await,
        }
    }

    async fn known_buttons(&self) -> Result<Vec<ButtonInfo>> {
        match self {
            Self::Mock(manager) => manager.known_buttons().await,
        }
    }

    async fn connect(&mut self, address: &ButtonAddress) -> Result<()> {
        match self {
            Self::Mock(manager) => manager.connect(address).await,
        }
    }

    async fn disconnect(&mut self, address: &ButtonAddress) -> Result<()> {
        match self {
            Self::Mock(manager) => manager.disconnect(address).await,
        }
    }

    async fn forget(&mut self, address: &ButtonAddress) -> Result<()> {
        match self {
            Self::Mock(manager) => manager.forget(address).await,
        }
    }

    async fn set_listening(&mut self, address: &ButtonAddress, listen: bool) -> Result<()> {
        match self {
            Self::Mock(manager) => manager.set_listening(address, listen).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_any_manager_mock_dispatch() {
        let (manager, handle) = MockManager::new();
        let mut any_manager = AnyButtonManager::Mock(manager);

        assert_eq!(any_manager.radio_state(), RadioState::PoweredOn);
        assert!(any_manager.take_events().is_some());

        handle.set_powered(false);
        assert_eq!(any_manager.radio_state(), RadioState::PoweredOff);
        assert!(any_manager.start_scan().await.is_err());
    }
}
