//! Listener contracts for bridge notifications.
//!
//! The vendor delegate pattern — one object implementing two broad
//! protocols — is split here into two narrow capabilities:
//! [`ManagerEvents`] for discovery and scan lifecycle, [`ButtonEvents`]
//! for per-button connection and click delivery. [`EventListener`]
//! composes the two; any type implementing both gets it for free.
//!
//! All notification methods are one-way: they take `&self`, return
//! nothing, and run on the controller's event-delivery path, so they
//! must not block. Implementations that need to do real work should hand
//! the notification off — [`ChannelListener`] does exactly that, turning
//! every notification into a [`BridgeEvent`] on a tokio channel.

use flicbridge_core::{ButtonAddress, ButtonInfo, ClickEvent};
use tokio::sync::mpsc;

/// Scan-lifecycle and discovery notifications.
pub trait ManagerEvents: Send + Sync {
    /// A scan encountered a button that is already paired.
    ///
    /// May fire more than once per address within one scan session;
    /// consumers must treat repeats as upserts.
    fn on_paired_button_found(&self, button: &ButtonInfo);

    /// A scan finished pairing and verifying a new button.
    fn on_button_found(&self, button: &ButtonInfo);

    /// A raw advertisement was seen, not yet resolved to a full button.
    fn on_button_discovered(&self, address: &ButtonAddress);

    /// Fired exactly once per successful scan start.
    fn on_button_scanning_started(&self);

    /// Fired exactly once per scan teardown, whether requested or caused
    /// by an error.
    fn on_button_scanning_stopped(&self);

    /// Catch-all failure notice. The session stays alive; no correlation
    /// identifier is attached.
    fn on_error(&self, message: &str);
}

/// Per-button connection and click notifications.
pub trait ButtonEvents: Send + Sync {
    /// A connection transition completed. Fired once per genuine
    /// transition into the connected state, including vendor-driven
    /// reconnections; repeated vendor reports are filtered out.
    fn on_button_connected(&self);

    /// An established link was lost. The vendor SDK keeps trying to
    /// reconnect on its own; success shows up as another
    /// `on_button_connected`.
    fn on_button_connection_lost(&self, button: &ButtonInfo);

    /// A physical press was delivered, live or replayed from the
    /// button's offline queue.
    fn on_button_clicked(&self, click: &ClickEvent);
}

/// The full notification surface of the bridge.
///
/// Blanket-implemented for any type providing both capabilities, so a
/// consumer can implement the two narrow traits separately and compose
/// them.
pub trait EventListener: ManagerEvents + ButtonEvents {}

impl<T: ManagerEvents + ButtonEvents> EventListener for T {}

/// One bridge notification as a value.
///
/// The channel form of the listener contract: every callback becomes a
/// variant an application can receive, match on and correlate at its own
/// pace.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum BridgeEvent {
    /// An already-paired button was found by a scan.
    PairedButtonFound(ButtonInfo),

    /// A new button finished pairing.
    ButtonFound(ButtonInfo),

    /// A raw advertisement was seen.
    ButtonDiscovered(ButtonAddress),

    /// A connection transition completed.
    ButtonConnected,

    /// An established link was lost.
    ButtonConnectionLost(ButtonInfo),

    /// A scan session started.
    ScanningStarted,

    /// A scan session ended.
    ScanningStopped,

    /// A press was delivered.
    ButtonClicked(ClickEvent),

    /// A failure was reported. The session stays alive.
    Error(String),
}

/// Listener that forwards every notification into a tokio channel.
///
/// This is the intended bridge to application code: the controller's
/// delivery path does nothing but an unbounded send, and the application
/// drains [`BridgeEvent`]s wherever it likes.
///
/// # Examples
///
/// ```
/// use flicbridge_session::{BridgeEvent, ChannelListener};
/// use flicbridge_session::listener::ManagerEvents;
///
/// let (listener, mut events) = ChannelListener::new();
/// listener.on_button_scanning_started();
///
/// match events.try_recv().unwrap() {
///     BridgeEvent::ScanningStarted => {}
///     other => panic!("unexpected event: {:?}", other),
/// }
/// ```
#[derive(Debug)]
pub struct ChannelListener {
    event_tx: mpsc::UnboundedSender<BridgeEvent>,
}

impl ChannelListener {
    /// Create a listener and the receiver for its event stream.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BridgeEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Self { event_tx }, event_rx)
    }

    fn send(&self, event: BridgeEvent) {
        // Receiver dropped means the application stopped caring.
        let _ = self.event_tx.send(event);
    }
}

impl ManagerEvents for ChannelListener {
    fn on_paired_button_found(&self, button: &ButtonInfo) {
        self.send(BridgeEvent::PairedButtonFound(button.clone()));
    }

    fn on_button_found(&self, button: &ButtonInfo) {
        self.send(BridgeEvent::ButtonFound(button.clone()));
    }

    fn on_button_discovered(&self, address: &ButtonAddress) {
        self.send(BridgeEvent::ButtonDiscovered(address.clone()));
    }

    fn on_button_scanning_started(&self) {
        self.send(BridgeEvent::ScanningStarted);
    }

    fn on_button_scanning_stopped(&self) {
        self.send(BridgeEvent::ScanningStopped);
    }

    fn on_error(&self, message: &str) {
        self.send(BridgeEvent::Error(message.to_string()));
    }
}

impl ButtonEvents for ChannelListener {
    fn on_button_connected(&self) {
        self.send(BridgeEvent::ButtonConnected);
    }

    fn on_button_connection_lost(&self, button: &ButtonInfo) {
        self.send(BridgeEvent::ButtonConnectionLost(button.clone()));
    }

    fn on_button_clicked(&self, click: &ClickEvent) {
        self.send(BridgeEvent::ButtonClicked(click.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flicbridge_core::{ClickType, ConnectionState};

    #[test]
    fn test_channel_listener_forwards_all_notifications() {
        let (listener, mut events) = ChannelListener::new();
        let button = ButtonInfo::new("AA:BB").paired();
        let address = ButtonAddress::new("AA:BB");
        let click = ClickEvent::live(button.clone(), ClickType::Single);

        listener.on_button_scanning_started();
        listener.on_button_discovered(&address);
        listener.on_paired_button_found(&button);
        listener.on_button_found(&button);
        listener.on_button_connected();
        listener.on_button_connection_lost(&button);
        listener.on_button_clicked(&click);
        listener.on_error("scan failed");
        listener.on_button_scanning_stopped();

        assert!(matches!(
            events.try_recv().unwrap(),
            BridgeEvent::ScanningStarted
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            BridgeEvent::ButtonDiscovered(a) if a == address
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            BridgeEvent::PairedButtonFound(b) if b.connection == ConnectionState::Paired
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            BridgeEvent::ButtonFound(_)
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            BridgeEvent::ButtonConnected
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            BridgeEvent::ButtonConnectionLost(b) if b.address == address
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            BridgeEvent::ButtonClicked(c) if c.clicks == ClickType::Single
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            BridgeEvent::Error(m) if m == "scan failed"
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            BridgeEvent::ScanningStopped
        ));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_does_not_panic() {
        let (listener, events) = ChannelListener::new();
        drop(events);
        listener.on_button_scanning_started();
        listener.on_error("ignored");
    }
}
