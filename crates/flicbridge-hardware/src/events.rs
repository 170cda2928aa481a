//! Asynchronous callback stream from the vendor SDK.
//!
//! The vendor manager delivers its callbacks from its own event-delivery
//! context. This module models that delegate surface as a single event
//! enum carried over an `mpsc` channel: the session controller drains the
//! channel and normalizes each event for its listener.
//!
//! Ordering: events for a single button arrive in emission order. No
//! ordering is guaranteed across different buttons, and a callback
//! scheduled before a cancellation request may still arrive afterwards —
//! consumers must treat such events as stale but valid.

use flicbridge_core::{ButtonAddress, ButtonInfo, ClickType};
use std::time::Duration;

/// One callback from the vendor button manager.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ManagerEvent {
    /// A raw advertisement was seen during a scan. The device has not yet
    /// been resolved to a full button object.
    AdvertisementSeen {
        /// Address carried by the advertisement.
        address: ButtonAddress,
    },

    /// A scan encountered a button that is already paired.
    PairedButtonFound {
        /// Snapshot of the paired button.
        button: ButtonInfo,
    },

    /// A scan finished pairing and verifying a new button.
    ScanCompleted {
        /// Snapshot of the newly paired button.
        button: ButtonInfo,
    },

    /// A scan terminated with a vendor-level failure.
    ScanFailed {
        /// Human-readable failure description. The vendor contract
        /// carries no error codes.
        message: String,
    },

    /// A connection attempt completed.
    ButtonConnected {
        /// Address of the now-connected button.
        address: ButtonAddress,
    },

    /// An established connection was lost or torn down.
    ButtonDisconnected {
        /// Address of the disconnected button.
        address: ButtonAddress,
    },

    /// A physical press was delivered.
    ButtonClicked {
        /// Address of the originating button.
        address: ButtonAddress,

        /// Press details, including offline-queue metadata.
        press: ClickDelivery,
    },

    /// Any other vendor failure. Never terminates the session.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

/// Press details attached to a [`ManagerEvent::ButtonClicked`] callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickDelivery {
    /// True when the press was buffered while the button was offline and
    /// is being flushed after reconnect.
    pub was_queued: bool,

    /// True for the final press of a queue flush.
    pub last_queued: bool,

    /// Elapsed time since the physical press.
    pub age: Duration,

    /// Single/double/hold classification.
    pub clicks: ClickType,
}

impl ClickDelivery {
    /// A live press delivered while connected.
    pub fn live(clicks: ClickType) -> Self {
        Self {
            was_queued: false,
            last_queued: false,
            age: Duration::ZERO,
            clicks,
        }
    }

    /// A press replayed from the button's offline queue.
    pub fn queued(clicks: ClickType, age: Duration, last_queued: bool) -> Self {
        Self {
            was_queued: true,
            last_queued,
            age,
            clicks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_delivery() {
        let press = ClickDelivery::live(ClickType::Single);
        assert!(!press.was_queued);
        assert!(!press.last_queued);
        assert_eq!(press.age, Duration::ZERO);
    }

    #[test]
    fn test_queued_delivery() {
        let press = ClickDelivery::queued(ClickType::Double, Duration::from_secs(12), true);
        assert!(press.was_queued);
        assert!(press.last_queued);
        assert_eq!(press.age, Duration::from_secs(12));
    }
}
