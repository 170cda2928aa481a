//! Error types for the button bridge.
//!
//! This module defines the error taxonomy shared by the vendor SDK boundary
//! and the session controller. Precondition failures (uninitialized
//! controller, unresolved address) surface to the application as boolean
//! results; these error values travel internally and become `on_error`
//! notifications when a vendor operation fails after acceptance.

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur while bridging to the vendor button SDK.
///
/// There is no fatal category: every variant is locally contained and the
/// session controller remains usable after reporting it.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The controller has not been initialized with a listener.
    #[error("Controller not initialized")]
    NotInitialized,

    /// The address does not resolve to a registered button.
    #[error("Unknown button: {address}")]
    UnknownButton { address: String },

    /// The Bluetooth radio is not powered on or not present.
    #[error("Radio unavailable: {state}")]
    RadioUnavailable { state: String },

    /// A scan session is already active.
    #[error("Scan already active")]
    ScanActive,

    /// No scan session is active.
    #[error("No active scan")]
    NoActiveScan,

    /// The button is known but not paired at the vendor level.
    #[error("Button not paired: {address}")]
    NotPaired { address: String },

    /// The vendor event channel has been closed.
    #[error("Event channel closed: {context}")]
    ChannelClosed { context: String },

    /// Malformed or out-of-range data.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Free-form failure reported by the vendor SDK.
    ///
    /// The vendor contract carries no error codes or correlation ids,
    /// only human-readable strings.
    #[error("Vendor SDK error: {message}")]
    Sdk { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Create a new unknown-button error.
    pub fn unknown_button(address: impl Into<String>) -> Self {
        Self::UnknownButton {
            address: address.into(),
        }
    }

    /// Create a new radio-unavailable error.
    pub fn radio_unavailable(state: impl Into<String>) -> Self {
        Self::RadioUnavailable {
            state: state.into(),
        }
    }

    /// Create a new not-paired error.
    pub fn not_paired(address: impl Into<String>) -> Self {
        Self::NotPaired {
            address: address.into(),
        }
    }

    /// Create a new channel-closed error.
    pub fn channel_closed(context: impl Into<String>) -> Self {
        Self::ChannelClosed {
            context: context.into(),
        }
    }

    /// Create a new invalid-data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new vendor SDK error.
    pub fn sdk(message: impl Into<String>) -> Self {
        Self::Sdk {
            message: message.into(),
        }
    }
}
