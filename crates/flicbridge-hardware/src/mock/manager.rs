//! Mock vendor manager for testing and development.
//!
//! This module provides a simulated button SDK that can be controlled
//! programmatically for testing without any Bluetooth hardware. The
//! manager half implements [`ButtonManager`]; the handle half plays the
//! physical world — buttons coming into range, being pressed, losing
//! their link — and pushes the resulting callbacks onto the event stream.

use flicbridge_core::{
    BridgeError, ButtonAddress, ButtonInfo, ClickType, ConnectionState, RadioState, Result,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::debug;

use crate::events::{ClickDelivery, ManagerEvent};
use crate::traits::ButtonManager;

/// One scripted button known to the mock world.
#[derive(Debug)]
struct ScriptedButton {
    name: Option<String>,
    paired: bool,
    connected: bool,
    listening: bool,
    press_count: u32,

    /// Presses made while offline, flushed in order on reconnect.
    queued: VecDeque<(Instant, ClickType)>,
}

impl ScriptedButton {
    fn new(name: Option<String>) -> Self {
        Self {
            name,
            paired: false,
            connected: false,
            listening: false,
            press_count: 0,
            queued: VecDeque::new(),
        }
    }

    fn connection_state(&self) -> ConnectionState {
        if self.connected {
            ConnectionState::Connected
        } else if self.paired {
            ConnectionState::Paired
        } else {
            ConnectionState::Discovered
        }
    }

    fn info(&self, address: &ButtonAddress) -> ButtonInfo {
        let mut info = ButtonInfo::new(address.clone());
        info.name = self.name.clone();
        info.press_count = self.press_count;
        info.paired = self.paired;
        info.connection = self.connection_state();
        info
    }
}

/// Shared state between the manager and its handle.
#[derive(Debug)]
struct MockState {
    powered: bool,
    scanning: bool,
    buttons: HashMap<ButtonAddress, ScriptedButton>,
    event_tx: mpsc::UnboundedSender<ManagerEvent>,
}

impl MockState {
    fn emit(&self, event: ManagerEvent) {
        // Receiver gone means the bridge was torn down; nothing to do.
        let _ = self.event_tx.send(event);
    }

    fn button(&self, address: &ButtonAddress) -> Result<&ScriptedButton> {
        self.buttons
            .get(address)
            .ok_or_else(|| BridgeError::unknown_button(address.as_str()))
    }

    fn button_mut(&mut self, address: &ButtonAddress) -> Result<&mut ScriptedButton> {
        self.buttons
            .get_mut(address)
            .ok_or_else(|| BridgeError::unknown_button(address.as_str()))
    }

    /// Replay offline presses in original press order.
    fn flush_queue(&mut self, address: &ButtonAddress) {
        let Some(button) = self.buttons.get_mut(address) else {
            return;
        };
        let presses: Vec<(Instant, ClickType)> = button.queued.drain(..).collect();
        let total = presses.len();
        for (index, (pressed_at, clicks)) in presses.into_iter().enumerate() {
            self.emit(ManagerEvent::ButtonClicked {
                address: address.clone(),
                press: ClickDelivery::queued(clicks, pressed_at.elapsed(), index + 1 == total),
            });
        }
    }
}

/// Mock vendor button manager.
///
/// Created together with a [`MockManagerHandle`]; the handle scripts the
/// physical side while the manager is handed to the session controller.
///
/// # Examples
///
/// ```
/// use flicbridge_hardware::mock::MockManager;
/// use flicbridge_hardware::traits::ButtonManager;
///
/// #[tokio::main]
/// async fn main() -> flicbridge_core::Result<()> {
///     let (mut manager, handle) = MockManager::new();
///     handle.add_button("AA:BB:CC:DD:EE:FF", "Desk button");
///
///     let mut events = manager.take_events().expect("first take");
///     manager.start_scan().await?;
///     handle.advertise(&"AA:BB:CC:DD:EE:FF".into())?;
///
///     let event = events.recv().await.expect("event");
///     println!("vendor callback: {:?}", event);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockManager {
    state: Arc<Mutex<MockState>>,
    event_rx: Option<mpsc::UnboundedReceiver<ManagerEvent>>,
}

impl MockManager {
    /// Create a new mock manager with a powered-on radio.
    pub fn new() -> (Self, MockManagerHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let state = Arc::new(Mutex::new(MockState {
            powered: true,
            scanning: false,
            buttons: HashMap::new(),
            event_tx,
        }));

        let manager = Self {
            state: Arc::clone(&state),
            event_rx: Some(event_rx),
        };

        (manager, MockManagerHandle { state })
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // The mutex is only poisoned if a test panicked mid-update.
        self.state.lock().expect("mock manager state poisoned")
    }
}

impl ButtonManager for MockManager {
    fn radio_state(&self) -> RadioState {
        if self.lock().powered {
            RadioState::PoweredOn
        } else {
            RadioState::PoweredOff
        }
    }

    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ManagerEvent>> {
        self.event_rx.take()
    }

    async fn start_scan(&mut self) -> Result<()> {
        let mut state = self.lock();
        if !state.powered {
            return Err(BridgeError::radio_unavailable(
                RadioState::PoweredOff.to_string(),
            ));
        }
        if state.scanning {
            return Err(BridgeError::ScanActive);
        }
        state.scanning = true;
        debug!("mock scan started");
        Ok(())
    }

    async fn stop_scan(&mut self) -> Result<()> {
        let mut state = self.lock();
        state.scanning = false;
        debug!("mock scan stopped");
        Ok(())
    }

    async fn known_buttons(&self) -> Result<Vec<ButtonInfo>> {
        let state = self.lock();
        let mut buttons: Vec<ButtonInfo> = state
            .buttons
            .iter()
            .filter(|(_, button)| button.paired)
            .map(|(address, button)| button.info(address))
            .collect();
        buttons.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(buttons)
    }

    async fn connect(&mut self, address: &ButtonAddress) -> Result<()> {
        let mut state = self.lock();
        let button = state.button_mut(address)?;
        if !button.paired {
            return Err(BridgeError::not_paired(address.as_str()));
        }
        button.connected = true;
        let listening = button.listening;
        state.emit(ManagerEvent::ButtonConnected {
            address: address.clone(),
        });
        if listening {
            state.flush_queue(address);
        }
        Ok(())
    }

    async fn disconnect(&mut self, address: &ButtonAddress) -> Result<()> {
        let mut state = self.lock();
        let button = state.button_mut(address)?;
        button.connected = false;
        state.emit(ManagerEvent::ButtonDisconnected {
            address: address.clone(),
        });
        Ok(())
    }

    async fn forget(&mut self, address: &ButtonAddress) -> Result<()> {
        let mut state = self.lock();
        let button = state.button_mut(address)?;
        button.paired = false;
        button.connected = false;
        button.listening = false;
        button.queued.clear();
        debug!(address = %address, "mock pairing removed");
        Ok(())
    }

    async fn set_listening(&mut self, address: &ButtonAddress, listen: bool) -> Result<()> {
        let mut state = self.lock();
        let button = state.button_mut(address)?;
        button.listening = listen;
        let flush = listen && button.connected;
        if flush {
            state.flush_queue(address);
        }
        Ok(())
    }
}

/// Handle for scripting the mock manager's physical world.
///
/// The handle is the remote side of the simulation: it decides which
/// buttons are in range, when they advertise, when pairing completes and
/// when they are pressed. All methods are synchronous; emitted callbacks
/// land on the manager's event stream.
///
/// # Examples
///
/// ```
/// use flicbridge_core::ClickType;
/// use flicbridge_hardware::mock::MockManager;
///
/// let (_manager, handle) = MockManager::new();
/// handle.add_button("AA:BB:CC:DD:EE:FF", "Desk button");
///
/// // Pressing an unconnected button queues the press on the device.
/// handle
///     .press(&"AA:BB:CC:DD:EE:FF".into(), ClickType::Single)
///     .unwrap();
/// assert_eq!(handle.queued_count(&"AA:BB:CC:DD:EE:FF".into()), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockManagerHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockManagerHandle {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock manager state poisoned")
    }

    /// Switch the radio on or off.
    ///
    /// Powering off fails any active scan and drops every established
    /// connection, mirroring what a real radio does.
    pub fn set_powered(&self, powered: bool) {
        let mut state = self.lock();
        state.powered = powered;
        if powered {
            return;
        }
        if state.scanning {
            state.scanning = false;
            state.emit(ManagerEvent::ScanFailed {
                message: "radio powered off during scan".to_string(),
            });
        }
        let connected: Vec<ButtonAddress> = state
            .buttons
            .iter()
            .filter(|(_, button)| button.connected)
            .map(|(address, _)| address.clone())
            .collect();
        for address in connected {
            if let Some(button) = state.buttons.get_mut(&address) {
                button.connected = false;
            }
            state.emit(ManagerEvent::ButtonDisconnected { address });
        }
    }

    /// Put a pairable button in range.
    pub fn add_button(&self, address: impl Into<ButtonAddress>, name: impl Into<String>) {
        let mut state = self.lock();
        state
            .buttons
            .entry(address.into())
            .or_insert_with(|| ScriptedButton::new(None))
            .name = Some(name.into());
    }

    /// Broadcast an advertisement from a button.
    ///
    /// Only delivered while a scan is active; with no scan running the
    /// radio simply is not listening.
    ///
    /// # Errors
    ///
    /// Returns an error if the button was never added.
    pub fn advertise(&self, address: &ButtonAddress) -> Result<()> {
        let state = self.lock();
        state.button(address)?;
        if state.scanning {
            state.emit(ManagerEvent::AdvertisementSeen {
                address: address.clone(),
            });
        } else {
            debug!(address = %address, "advertisement dropped, no scan active");
        }
        Ok(())
    }

    /// Finish pairing a button the active scan discovered.
    ///
    /// # Errors
    ///
    /// Returns an error if the button was never added or no scan is
    /// active.
    pub fn complete_pairing(&self, address: &ButtonAddress) -> Result<()> {
        let mut state = self.lock();
        if !state.scanning {
            return Err(BridgeError::NoActiveScan);
        }
        let button = state.button_mut(address)?;
        button.paired = true;
        let info = button.info(address);
        state.emit(ManagerEvent::ScanCompleted { button: info });
        Ok(())
    }

    /// Report an already-paired button encountered by a scan.
    ///
    /// # Errors
    ///
    /// Returns an error if the button was never added or is not paired.
    pub fn report_paired_found(&self, address: &ButtonAddress) -> Result<()> {
        let state = self.lock();
        let button = state.button(address)?;
        if !button.paired {
            return Err(BridgeError::not_paired(address.as_str()));
        }
        let info = button.info(address);
        state.emit(ManagerEvent::PairedButtonFound { button: info });
        Ok(())
    }

    /// Press a button.
    ///
    /// Delivered live when the button is connected and listened to;
    /// otherwise the press is buffered on the device and flushed, in
    /// press order, on the next reconnect.
    ///
    /// # Errors
    ///
    /// Returns an error if the button was never added.
    pub fn press(&self, address: &ButtonAddress, clicks: ClickType) -> Result<()> {
        let mut state = self.lock();
        let button = state.button_mut(address)?;
        button.press_count += 1;
        if button.connected && button.listening {
            state.emit(ManagerEvent::ButtonClicked {
                address: address.clone(),
                press: ClickDelivery::live(clicks),
            });
        } else {
            button.queued.push_back((Instant::now(), clicks));
        }
        Ok(())
    }

    /// Drop an established connection from the remote side.
    ///
    /// # Errors
    ///
    /// Returns an error if the button was never added.
    pub fn drop_connection(&self, address: &ButtonAddress) -> Result<()> {
        let mut state = self.lock();
        let button = state.button_mut(address)?;
        button.connected = false;
        state.emit(ManagerEvent::ButtonDisconnected {
            address: address.clone(),
        });
        Ok(())
    }

    /// Terminate the active scan with a vendor-level failure.
    pub fn fail_scan(&self, message: impl Into<String>) {
        let mut state = self.lock();
        state.scanning = false;
        state.emit(ManagerEvent::ScanFailed {
            message: message.into(),
        });
    }

    /// Inject a raw vendor event, bypassing all mock state.
    ///
    /// Used to simulate stale callbacks that were scheduled before a
    /// cancellation request.
    pub fn inject(&self, event: ManagerEvent) {
        self.lock().emit(event);
    }

    /// Whether a scan is currently active.
    pub fn is_scanning(&self) -> bool {
        self.lock().scanning
    }

    /// Number of presses buffered on a button.
    pub fn queued_count(&self, address: &ButtonAddress) -> usize {
        self.lock()
            .buttons
            .get(address)
            .map(|button| button.queued.len())
            .unwrap_or(0)
    }

    /// Number of buttons in range.
    pub fn button_count(&self) -> usize {
        self.lock().buttons.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn addr(s: &str) -> ButtonAddress {
        ButtonAddress::new(s)
    }

    #[tokio::test]
    async fn test_pairing_flow_emits_scan_completed() {
        let (mut manager, handle) = MockManager::new();
        let mut events = manager.take_events().unwrap();
        handle.add_button("AA:BB", "Desk");

        manager.start_scan().await.unwrap();
        handle.advertise(&addr("AA:BB")).unwrap();
        handle.complete_pairing(&addr("AA:BB")).unwrap();

        assert!(matches!(
            events.recv().await.unwrap(),
            ManagerEvent::AdvertisementSeen { .. }
        ));
        match events.recv().await.unwrap() {
            ManagerEvent::ScanCompleted { button } => {
                assert_eq!(button.address, addr("AA:BB"));
                assert!(button.paired);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_advertisement_dropped_without_scan() {
        let (mut manager, handle) = MockManager::new();
        let mut events = manager.take_events().unwrap();
        handle.add_button("AA:BB", "Desk");

        handle.advertise(&addr("AA:BB")).unwrap();
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_complete_pairing_requires_scan() {
        let (_manager, handle) = MockManager::new();
        handle.add_button("AA:BB", "Desk");

        let result = handle.complete_pairing(&addr("AA:BB"));
        assert!(matches!(result, Err(BridgeError::NoActiveScan)));
    }

    #[tokio::test]
    async fn test_connect_requires_pairing() {
        let (mut manager, handle) = MockManager::new();
        handle.add_button("AA:BB", "Desk");

        let result = manager.connect(&addr("AA:BB")).await;
        assert!(matches!(result, Err(BridgeError::NotPaired { .. })));
    }

    #[tokio::test]
    async fn test_queued_presses_flush_in_order_on_connect() {
        let (mut manager, handle) = MockManager::new();
        let mut events = manager.take_events().unwrap();
        handle.add_button("AA:BB", "Desk");

        manager.start_scan().await.unwrap();
        handle.complete_pairing(&addr("AA:BB")).unwrap();
        manager.stop_scan().await.unwrap();
        manager.set_listening(&addr("AA:BB"), true).await.unwrap();

        // Offline presses buffer on the device.
        handle.press(&addr("AA:BB"), ClickType::Single).unwrap();
        handle.press(&addr("AA:BB"), ClickType::Double).unwrap();
        assert_eq!(handle.queued_count(&addr("AA:BB")), 2);

        tokio::time::sleep(Duration::from_millis(10)).await;
        manager.connect(&addr("AA:BB")).await.unwrap();
        assert_eq!(handle.queued_count(&addr("AA:BB")), 0);

        // ScanCompleted, then Connected, then the flush in press order.
        assert!(matches!(
            events.recv().await.unwrap(),
            ManagerEvent::ScanCompleted { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            ManagerEvent::ButtonConnected { .. }
        ));
        match events.recv().await.unwrap() {
            ManagerEvent::ButtonClicked { press, .. } => {
                assert_eq!(press.clicks, ClickType::Single);
                assert!(press.was_queued);
                assert!(!press.last_queued);
                assert!(press.age >= Duration::from_millis(10));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match events.recv().await.unwrap() {
            ManagerEvent::ButtonClicked { press, .. } => {
                assert_eq!(press.clicks, ClickType::Double);
                assert!(press.was_queued);
                assert!(press.last_queued);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_live_press_when_connected_and_listening() {
        let (mut manager, handle) = MockManager::new();
        let mut events = manager.take_events().unwrap();
        handle.add_button("AA:BB", "Desk");

        manager.start_scan().await.unwrap();
        handle.complete_pairing(&addr("AA:BB")).unwrap();
        manager.connect(&addr("AA:BB")).await.unwrap();
        manager.set_listening(&addr("AA:BB"), true).await.unwrap();
        handle.press(&addr("AA:BB"), ClickType::Hold).unwrap();

        let mut saw_live_click = false;
        while let Ok(event) = events.try_recv() {
            if let ManagerEvent::ButtonClicked { press, .. } = event {
                assert!(!press.was_queued);
                assert_eq!(press.clicks, ClickType::Hold);
                saw_live_click = true;
            }
        }
        assert!(saw_live_click);
    }

    #[tokio::test]
    async fn test_power_off_fails_scan_and_drops_connections() {
        let (mut manager, handle) = MockManager::new();
        let mut events = manager.take_events().unwrap();
        handle.add_button("AA:BB", "Desk");

        manager.start_scan().await.unwrap();
        handle.complete_pairing(&addr("AA:BB")).unwrap();
        manager.connect(&addr("AA:BB")).await.unwrap();

        handle.set_powered(false);
        assert!(!handle.is_scanning());
        assert_eq!(manager.radio_state(), RadioState::PoweredOff);
        assert!(manager.start_scan().await.is_err());

        let mut saw_scan_failed = false;
        let mut saw_disconnect = false;
        while let Ok(event) = events.try_recv() {
            match event {
                ManagerEvent::ScanFailed { .. } => saw_scan_failed = true,
                ManagerEvent::ButtonDisconnected { .. } => saw_disconnect = true,
                _ => {}
            }
        }
        assert!(saw_scan_failed);
        assert!(saw_disconnect);
    }

    #[tokio::test]
    async fn test_forget_clears_pairing_and_queue() {
        let (mut manager, handle) = MockManager::new();
        handle.add_button("AA:BB", "Desk");

        manager.start_scan().await.unwrap();
        handle.complete_pairing(&addr("AA:BB")).unwrap();
        handle.press(&addr("AA:BB"), ClickType::Single).unwrap();

        manager.forget(&addr("AA:BB")).await.unwrap();
        assert_eq!(handle.queued_count(&addr("AA:BB")), 0);
        assert!(manager.known_buttons().await.unwrap().is_empty());
        assert!(manager.connect(&addr("AA:BB")).await.is_err());
    }

    #[tokio::test]
    async fn test_known_buttons_sorted_and_paired_only() {
        let (mut manager, handle) = MockManager::new();
        handle.add_button("CC:DD", "Two");
        handle.add_button("AA:BB", "One");
        handle.add_button("EE:FF", "Unpaired");

        manager.start_scan().await.unwrap();
        handle.complete_pairing(&addr("CC:DD")).unwrap();
        handle.complete_pairing(&addr("AA:BB")).unwrap();

        let buttons = manager.known_buttons().await.unwrap();
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[0].address, addr("AA:BB"));
        assert_eq!(buttons[1].address, addr("CC:DD"));
    }

    #[tokio::test]
    async fn test_take_events_is_single_use() {
        let (mut manager, _handle) = MockManager::new();
        assert!(manager.take_events().is_some());
        assert!(manager.take_events().is_none());
    }
}
