//! Device session controller.
//!
//! This module provides the `DeviceSessionController`, which owns the
//! single connection to the vendor button manager and mediates every
//! button operation through it. Application commands go in one side;
//! vendor callbacks come back on the event stream, get normalized against
//! the button registry, and leave as listener notifications.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐ commands  ┌────────────────────────┐ requests ┌────────────┐
//! │ Application │──────────►│ DeviceSessionController │─────────►│ Vendor SDK │
//! │             │           │  registry · scan state  │          │ (manager)  │
//! │             │◄──────────│      event pump         │◄─────────│            │
//! └─────────────┘ listener  └────────────────────────┘ callbacks └────────────┘
//! ```
//!
//! Commands and the callback pump share one `tokio::sync::Mutex` around
//! the controller state, so a `forget_button` can never race an in-flight
//! discovery callback for the same address: whichever takes the lock
//! first wins, and forget leaves a tombstone for the rest of the scan
//! session.
//!
//! # Error model
//!
//! Precondition failures — uninitialized controller, unresolved address,
//! missing or duplicate scan — return `false` with no event. Operational
//! failures arrive asynchronously as `on_error` notifications and never
//! terminate the session; the controller stays usable after every error.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use flicbridge_hardware::{AnyButtonManager, MockManager};
//! use flicbridge_session::{ChannelListener, DeviceSessionController};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (manager, handle) = MockManager::new();
//!     handle.add_button("80:E4:DA:78:12:34", "Desk button");
//!
//!     let controller = DeviceSessionController::new(AnyButtonManager::Mock(manager));
//!     let (listener, mut events) = ChannelListener::new();
//!     assert!(controller.initialize(Arc::new(listener)).await);
//!
//!     assert!(controller.start_button_scanning().await);
//!     handle.advertise(&"80:E4:DA:78:12:34".into()).unwrap();
//!
//!     // ScanningStarted, then ButtonDiscovered, arrive on the channel.
//!     let first = events.recv().await.unwrap();
//!     println!("{:?}", first);
//!
//!     controller.dispose().await;
//! }
//! ```

use flicbridge_core::{
    ButtonAddress, ButtonInfo, ClickEvent, ConnectionState, RadioState,
};
use flicbridge_hardware::{AnyButtonManager, ButtonManager, ClickDelivery, ManagerEvent};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::listener::EventListener;
use crate::registry::ButtonRegistry;

/// Ephemeral state of one discovery run.
///
/// At most one session is active at a time. Tombstones record addresses
/// forgotten while this session runs, so a discovery callback already in
/// flight for a forgotten address is suppressed; a later session starts
/// clean and may rediscover the button.
#[derive(Debug)]
struct ScanSession {
    id: u64,
    tombstones: HashSet<ButtonAddress>,
}

impl ScanSession {
    fn new(id: u64) -> Self {
        Self {
            id,
            tombstones: HashSet::new(),
        }
    }
}

/// Controller state shared between commands and the event pump.
struct Inner {
    manager: AnyButtonManager,
    registry: ButtonRegistry,
    listener: Option<Arc<dyn EventListener>>,
    scan: Option<ScanSession>,
    next_scan_id: u64,
    pump: Option<JoinHandle<()>>,
    disposed: bool,
}

impl Inner {
    fn is_initialized(&self) -> bool {
        !self.disposed && self.listener.is_some()
    }

    fn notify(&self, f: impl FnOnce(&dyn EventListener)) {
        if let Some(listener) = &self.listener {
            f(listener.as_ref());
        }
    }

    fn is_tombstoned(&self, address: &ButtonAddress) -> bool {
        self.scan
            .as_ref()
            .is_some_and(|scan| scan.tombstones.contains(address))
    }

    fn handle_manager_event(&mut self, event: ManagerEvent) {
        match event {
            ManagerEvent::AdvertisementSeen { address } => {
                if self.is_tombstoned(&address) {
                    debug!(%address, "advertisement for forgotten button suppressed");
                    return;
                }
                if self.scan.is_none() {
                    debug!(%address, "stale advertisement after scan teardown");
                    return;
                }
                self.notify(|l| l.on_button_discovered(&address));
            }
            ManagerEvent::PairedButtonFound { button } => {
                if self.is_tombstoned(&button.address) {
                    debug!(address = %button.address, "discovery of forgotten button suppressed");
                    return;
                }
                if self.scan.is_none() {
                    debug!(address = %button.address, "stale discovery after scan teardown");
                    return;
                }
                self.registry.upsert(button.clone());
                self.notify(|l| l.on_paired_button_found(&button));
            }
            ManagerEvent::ScanCompleted { button } => {
                if self.is_tombstoned(&button.address) {
                    debug!(address = %button.address, "discovery of forgotten button suppressed");
                    return;
                }
                if self.scan.is_none() {
                    debug!(address = %button.address, "stale discovery after scan teardown");
                    return;
                }
                self.registry.upsert(button.clone());
                self.notify(|l| l.on_button_found(&button));
            }
            ManagerEvent::ScanFailed { message } => {
                warn!(%message, "vendor scan failed");
                self.notify(|l| l.on_error(&message));
                if let Some(scan) = self.scan.take() {
                    debug!(session = scan.id, "scan session torn down by failure");
                    self.notify(|l| l.on_button_scanning_stopped());
                }
            }
            ManagerEvent::ButtonConnected { address } => {
                match self
                    .registry
                    .set_connection(&address, ConnectionState::Connected)
                {
                    Some(previous) if previous.is_connected() => {
                        debug!(%address, "repeated connect report ignored");
                    }
                    Some(_) => self.notify(|l| l.on_button_connected()),
                    None => debug!(%address, "connect report for unknown button ignored"),
                }
            }
            ManagerEvent::ButtonDisconnected { address } => {
                match self
                    .registry
                    .set_connection(&address, ConnectionState::Disconnected)
                {
                    Some(previous) if previous.is_connected() => {
                        if let Some(record) = self.registry.get(&address) {
                            let snapshot = record.info.clone();
                            self.notify(|l| l.on_button_connection_lost(&snapshot));
                        }
                    }
                    Some(_) => {
                        // Aborted connection attempt or a repeat; no link
                        // was established, so nothing was lost.
                        debug!(%address, "disconnect report without live link ignored");
                    }
                    None => debug!(%address, "disconnect report for unknown button ignored"),
                }
            }
            ManagerEvent::ButtonClicked { address, press } => {
                self.handle_click(address, press);
            }
            ManagerEvent::Error { message } => {
                self.notify(|l| l.on_error(&message));
            }
            other => {
                // The vendor surface is non-exhaustive; anything new is
                // tolerated as stale-but-valid and dropped.
                debug!(?other, "unhandled vendor event");
            }
        }
    }

    fn handle_click(&mut self, address: ButtonAddress, press: ClickDelivery) {
        let Some(record) = self.registry.get_mut(&address) else {
            debug!(%address, "click from unknown button dropped");
            return;
        };
        if !record.info.connection.is_connected() {
            debug!(%address, "click for disconnected button dropped");
            return;
        }
        if !record.listening {
            debug!(%address, "click for unlistened button dropped");
            return;
        }

        record.info.press_count = record.info.press_count.saturating_add(1);
        let snapshot = record.info.clone();

        let builder = ClickEvent::builder(snapshot, press.clicks);
        let built = if press.was_queued {
            builder.queued(press.age, press.last_queued).build()
        } else {
            builder.age(press.age).build()
        };
        match built {
            Ok(click) => self.notify(|l| l.on_button_clicked(&click)),
            Err(e) => self.notify(|l| l.on_error(&e.to_string())),
        }
    }
}

/// Bridge session over one vendor button manager.
///
/// Cheap to clone the handle side of: all methods take `&self` and the
/// controller can be shared across tasks. Public operations are
/// non-blocking request issuance — a `true` result means "request
/// accepted", with completion reported through the bound listener.
pub struct DeviceSessionController {
    inner: Arc<Mutex<Inner>>,
}

impl DeviceSessionController {
    /// Create a controller over a vendor manager.
    ///
    /// No vendor interaction happens until [`initialize`] is called.
    ///
    /// [`initialize`]: DeviceSessionController::initialize
    pub fn new(manager: AnyButtonManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                manager,
                registry: ButtonRegistry::new(),
                listener: None,
                scan: None,
                next_scan_id: 0,
                pump: None,
                disposed: false,
            })),
        }
    }

    /// Bind the listener that receives all future notifications.
    ///
    /// Must be called before any other operation. Exactly one listener is
    /// bound at a time; calling again replaces the binding (there is no
    /// multi-listener fan-out). The first call preloads the registry from
    /// the vendor's persisted paired-button records and starts the event
    /// pump.
    ///
    /// Returns false if the controller has been disposed.
    pub async fn initialize(&self, listener: Arc<dyn EventListener>) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.disposed {
            return false;
        }
        inner.listener = Some(listener);

        if inner.pump.is_none() {
            match inner.manager.known_buttons().await {
                Ok(buttons) => {
                    for button in buttons {
                        inner.registry.upsert(button);
                    }
                    info!(count = inner.registry.len(), "registry preloaded from vendor records");
                }
                Err(e) => inner.notify(|l| l.on_error(&e.to_string())),
            }

            match inner.manager.take_events() {
                Some(events) => {
                    inner.pump = Some(tokio::spawn(Self::pump(Arc::clone(&self.inner), events)));
                }
                None => warn!("vendor event stream already taken"),
            }
        }
        true
    }

    /// Release the manager resource.
    ///
    /// Stops any active scan (emitting its final `scanning stopped`
    /// notification), detaches every click delegate, clears the registry,
    /// unbinds the listener and stops the event pump. Idempotent: a
    /// second call has no additional effect.
    pub async fn dispose(&self) {
        let mut inner = self.inner.lock().await;
        if inner.disposed {
            return;
        }
        inner.disposed = true;

        if let Some(scan) = inner.scan.take() {
            debug!(session = scan.id, "stopping scan on dispose");
            if let Err(e) = inner.manager.stop_scan().await {
                inner.notify(|l| l.on_error(&e.to_string()));
            }
            inner.notify(|l| l.on_button_scanning_stopped());
        }

        for address in inner.registry.listening_addresses() {
            if let Err(e) = inner.manager.set_listening(&address, false).await {
                inner.notify(|l| l.on_error(&e.to_string()));
            }
        }

        inner.registry.clear();
        inner.listener = None;
        if let Some(pump) = inner.pump.take() {
            pump.abort();
        }
        info!("session controller disposed");
    }

    /// Start passive discovery.
    ///
    /// Returns false — with no event — when the controller is not
    /// initialized, the radio is not powered on, or a scan is already
    /// active. On success exactly one `on_button_scanning_started` fires
    /// before any discovery notification of the new session.
    pub async fn start_button_scanning(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.is_initialized() {
            return false;
        }
        let radio = inner.manager.radio_state();
        if radio != RadioState::PoweredOn {
            debug!(%radio, "scan refused, radio not usable");
            return false;
        }
        if inner.scan.is_some() {
            debug!("scan refused, session already active");
            return false;
        }

        match inner.manager.start_scan().await {
            Ok(()) => {
                let id = inner.next_scan_id;
                inner.next_scan_id += 1;
                inner.scan = Some(ScanSession::new(id));
                info!(session = id, "button scan started");
                inner.notify(|l| l.on_button_scanning_started());
                true
            }
            Err(e) => {
                inner.notify(|l| l.on_error(&e.to_string()));
                false
            }
        }
    }

    /// Tear down the active scan session.
    ///
    /// Returns false when no scan is active. The vendor stop is
    /// best-effort: a discovery callback already scheduled may still
    /// arrive afterwards and is tolerated as stale.
    pub async fn stop_button_scanning(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.is_initialized() {
            return false;
        }
        let Some(scan) = inner.scan.take() else {
            return false;
        };
        if let Err(e) = inner.manager.stop_scan().await {
            inner.notify(|l| l.on_error(&e.to_string()));
        }
        info!(session = scan.id, "button scan stopped");
        inner.notify(|l| l.on_button_scanning_stopped());
        true
    }

    /// Snapshot of every button currently known to the registry, paired
    /// and discovered, sorted by address.
    ///
    /// The returned copy is not invalidated by concurrent registry
    /// mutation.
    pub async fn flic2_buttons(&self) -> Vec<ButtonInfo> {
        self.inner.lock().await.registry.snapshot()
    }

    /// Pure lookup of one button by address. No side effects.
    pub async fn button_for_address(&self, address: &ButtonAddress) -> Option<ButtonInfo> {
        self.inner
            .lock()
            .await
            .registry
            .get(address)
            .map(|record| record.info.clone())
    }

    /// Attach this controller as the click delegate for one button.
    ///
    /// Returns false when the address does not resolve.
    pub async fn listen_to_button(&self, address: &ButtonAddress) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.is_initialized() || !inner.registry.contains(address) {
            return false;
        }
        match inner.manager.set_listening(address, true).await {
            Ok(()) => {
                if let Some(record) = inner.registry.get_mut(address) {
                    record.listening = true;
                }
                true
            }
            Err(e) => {
                inner.notify(|l| l.on_error(&e.to_string()));
                false
            }
        }
    }

    /// Detach the click delegate for one button.
    ///
    /// Returns false when the address does not resolve.
    pub async fn stop_listening_to_button(&self, address: &ButtonAddress) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.is_initialized() || !inner.registry.contains(address) {
            return false;
        }
        match inner.manager.set_listening(address, false).await {
            Ok(()) => {
                if let Some(record) = inner.registry.get_mut(address) {
                    record.listening = false;
                }
                true
            }
            Err(e) => {
                inner.notify(|l| l.on_error(&e.to_string()));
                false
            }
        }
    }

    /// Request a connection to one button.
    ///
    /// True means the request was accepted, not that a connection exists;
    /// establishment is reported later via `on_button_connected`.
    pub async fn connect_button(&self, address: &ButtonAddress) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.is_initialized() || !inner.registry.contains(address) {
            return false;
        }
        match inner.manager.connect(address).await {
            Ok(()) => {
                let _ = inner
                    .registry
                    .set_connection(address, ConnectionState::Connecting);
                true
            }
            Err(e) => {
                inner.notify(|l| l.on_error(&e.to_string()));
                false
            }
        }
    }

    /// Request disconnection, or abort a pending connection attempt.
    ///
    /// Best-effort cancellation: a connect callback already scheduled may
    /// still arrive and is tolerated as stale.
    pub async fn disconnect_button(&self, address: &ButtonAddress) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.is_initialized() || !inner.registry.contains(address) {
            return false;
        }
        match inner.manager.disconnect(address).await {
            Ok(()) => true,
            Err(e) => {
                inner.notify(|l| l.on_error(&e.to_string()));
                false
            }
        }
    }

    /// Remove a button's pairing and registry entry permanently.
    ///
    /// Irreversible: lookups by this address fail until the button is
    /// rediscovered by a later scan. Forget wins over discovery callbacks
    /// already in flight for the same address within the current scan
    /// session.
    pub async fn forget_button(&self, address: &ButtonAddress) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.is_initialized() || !inner.registry.contains(address) {
            return false;
        }
        match inner.manager.forget(address).await {
            Ok(()) => {
                inner.registry.remove(address);
                if let Some(scan) = inner.scan.as_mut() {
                    scan.tombstones.insert(address.clone());
                }
                info!(%address, "button forgotten");
                true
            }
            Err(e) => {
                inner.notify(|l| l.on_error(&e.to_string()));
                false
            }
        }
    }

    /// Drain the vendor callback stream into controller state and
    /// listener notifications.
    async fn pump(inner: Arc<Mutex<Inner>>, mut events: mpsc::UnboundedReceiver<ManagerEvent>) {
        while let Some(event) = events.recv().await {
            let mut guard = inner.lock().await;
            guard.handle_manager_event(event);
        }
        debug!("vendor event stream closed");
    }
}
