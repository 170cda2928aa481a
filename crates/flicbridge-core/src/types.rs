//! Common types shared across the bridge crates.
//!
//! This module defines the value objects that cross the bridge boundary:
//! button addresses, per-button state, click classification and the
//! immutable click event. Everything here is a snapshot type; live vendor
//! SDK handles never leave the hardware crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Stable, opaque identifier of one physical button.
///
/// Addresses are normalized to ASCII uppercase so two spellings of the
/// same Bluetooth device address cannot coexist in a registry.
///
/// # Examples
///
/// ```
/// use flicbridge_core::ButtonAddress;
///
/// let a = ButtonAddress::new("80:e4:da:78:12:34");
/// let b = ButtonAddress::new("80:E4:DA:78:12:34");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "80:E4:DA:78:12:34");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonAddress(String);

impl ButtonAddress {
    /// Create a new address, normalizing to uppercase.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into().to_ascii_uppercase())
    }

    /// Get the normalized address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ButtonAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ButtonAddress {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// Power state of the platform Bluetooth radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadioState {
    /// Radio is on and usable.
    PoweredOn,

    /// Radio is present but switched off.
    PoweredOff,

    /// No usable radio on this platform.
    Unavailable,
}

impl fmt::Display for RadioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoweredOn => write!(f, "powered on"),
            Self::PoweredOff => write!(f, "powered off"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Per-button connection state.
///
/// Transitions are driven by vendor SDK callbacks, with one exception:
/// `Forgotten` is driven directly by the session controller and is
/// terminal until the button is rediscovered by a later scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Advertisement seen, not yet paired.
    Discovered,

    /// Paired with the vendor SDK, not connected.
    Paired,

    /// Connection request in flight.
    Connecting,

    /// Link established; clicks can be delivered.
    Connected,

    /// Link lost; the vendor SDK may be reconnecting.
    Disconnected,

    /// Pairing removed by the application. Terminal.
    Forgotten,
}

impl ConnectionState {
    /// Whether the button can currently deliver click events.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Classification of a physical button interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickType {
    /// Single press and release.
    Single,

    /// Two presses in quick succession.
    Double,

    /// Press held beyond the hold threshold.
    Hold,
}

impl fmt::Display for ClickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Double => write!(f, "double"),
            Self::Hold => write!(f, "hold"),
        }
    }
}

/// Last known battery estimate for a button.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// Estimated charge percentage (0-100).
    pub percentage: u8,

    /// Measured cell voltage.
    pub voltage: f32,
}

/// Snapshot of one physical button.
///
/// The vendor SDK owns the button; this is a non-owning copy of its
/// observable attributes at one point in time. Optional metadata fields
/// mirror what the vendor exposes once a button has been paired.
///
/// # Examples
///
/// ```
/// use flicbridge_core::{ButtonInfo, ConnectionState};
///
/// let info = ButtonInfo::new("80:E4:DA:78:12:34")
///     .with_name("Desk button")
///     .with_serial_number("BA12-C34567");
///
/// assert_eq!(info.connection, ConnectionState::Discovered);
/// assert_eq!(info.name.as_deref(), Some("Desk button"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonInfo {
    /// Stable unique address.
    pub address: ButtonAddress,

    /// Human-readable name, if the vendor knows one.
    pub name: Option<String>,

    /// Vendor serial number, known after pairing.
    pub serial_number: Option<String>,

    /// Button firmware version, known after pairing.
    pub firmware_version: Option<String>,

    /// Last known battery estimate, if any.
    pub battery: Option<BatteryStatus>,

    /// Total presses the vendor has counted for this button.
    pub press_count: u32,

    /// Whether the vendor SDK holds a pairing for this button.
    pub paired: bool,

    /// Current connection state.
    pub connection: ConnectionState,
}

impl ButtonInfo {
    /// Create a new snapshot for a freshly discovered button.
    pub fn new(address: impl Into<ButtonAddress>) -> Self {
        Self {
            address: address.into(),
            name: None,
            serial_number: None,
            firmware_version: None,
            battery: None,
            press_count: 0,
            paired: false,
            connection: ConnectionState::Discovered,
        }
    }

    /// Set the human-readable name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the serial number.
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Set the firmware version.
    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }

    /// Set the battery estimate.
    pub fn with_battery(mut self, battery: BatteryStatus) -> Self {
        self.battery = Some(battery);
        self
    }

    /// Mark the button as paired.
    pub fn paired(mut self) -> Self {
        self.paired = true;
        self.connection = ConnectionState::Paired;
        self
    }
}

impl From<String> for ButtonAddress {
    fn from(address: String) -> Self {
        Self::new(address)
    }
}

/// A reported button interaction.
///
/// Immutable once produced; consumed exactly once by the listener.
/// `was_queued` marks presses the button buffered while disconnected and
/// flushed after reconnect; a flush preserves original press order and
/// its final element carries `last_queued`.
///
/// # Examples
///
/// ```
/// use flicbridge_core::{ButtonInfo, ClickEvent, ClickType};
/// use std::time::Duration;
///
/// let button = ButtonInfo::new("AA:BB:CC:DD:EE:FF").paired();
/// let click = ClickEvent::builder(button, ClickType::Single)
///     .queued(Duration::from_secs(40), false)
///     .build()
///     .unwrap();
///
/// assert!(click.was_queued);
/// assert_eq!(click.age, Duration::from_secs(40));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    /// Snapshot of the originating button.
    pub button: ButtonInfo,

    /// True when the press was buffered offline and delivered after
    /// reconnect.
    pub was_queued: bool,

    /// True for the final press of a queue flush. Implies `was_queued`.
    pub last_queued: bool,

    /// Elapsed time since the physical press.
    pub age: Duration,

    /// Single/double/hold classification.
    pub clicks: ClickType,

    /// When the bridge received the event.
    pub received_at: DateTime<Utc>,
}

impl ClickEvent {
    /// Create a builder for a click event.
    pub fn builder(button: ButtonInfo, clicks: ClickType) -> ClickEventBuilder {
        ClickEventBuilder::new(button, clicks)
    }

    /// Create a live (not queued) click with zero age.
    pub fn live(button: ButtonInfo, clicks: ClickType) -> Self {
        Self {
            button,
            was_queued: false,
            last_queued: false,
            age: Duration::ZERO,
            clicks,
            received_at: Utc::now(),
        }
    }
}

/// Builder for [`ClickEvent`] with validation.
#[derive(Debug, Clone)]
pub struct ClickEventBuilder {
    button: ButtonInfo,
    clicks: ClickType,
    was_queued: bool,
    last_queued: bool,
    age: Duration,
    received_at: Option<DateTime<Utc>>,
}

impl ClickEventBuilder {
    /// Create a new builder with required fields.
    pub fn new(button: ButtonInfo, clicks: ClickType) -> Self {
        Self {
            button,
            clicks,
            was_queued: false,
            last_queued: false,
            age: Duration::ZERO,
            received_at: None,
        }
    }

    /// Mark the click as queued, with its age and whether it closes the
    /// flush.
    pub fn queued(mut self, age: Duration, last_queued: bool) -> Self {
        self.was_queued = true;
        self.last_queued = last_queued;
        self.age = age;
        self
    }

    /// Set the age of a live click (normally near zero).
    pub fn age(mut self, age: Duration) -> Self {
        self.age = age;
        self
    }

    /// Override the received-at timestamp, for replaying recorded events.
    pub fn received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = Some(received_at);
        self
    }

    /// Build the click event.
    ///
    /// # Errors
    ///
    /// Returns an error if `last_queued` is set without `was_queued`.
    pub fn build(self) -> Result<ClickEvent> {
        if self.last_queued && !self.was_queued {
            return Err(BridgeError::invalid_data(
                "last_queued set on a click that was not queued",
            ));
        }

        Ok(ClickEvent {
            button: self.button,
            was_queued: self.was_queued,
            last_queued: self.last_queued,
            age: self.age,
            clicks: self.clicks,
            received_at: self.received_at.unwrap_or_else(Utc::now),
        })
    }
}
