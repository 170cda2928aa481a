//! Address-keyed record of known buttons.
//!
//! The registry is the controller's view of every button the vendor SDK
//! has told it about: paired records preloaded at initialization plus
//! buttons discovered by scans. It is an explicit mapping structure —
//! never pointer identity — so forget/re-discover cycles are safe.
//!
//! Discovery callbacks may repeat for one address within a scan; the
//! registry upserts, so its size always counts unique addresses, not
//! callbacks received.

use flicbridge_core::{ButtonAddress, ButtonInfo, ConnectionState};
use std::collections::HashMap;

/// One registry entry: the latest snapshot plus bridge-side flags.
#[derive(Debug, Clone)]
pub struct ButtonRecord {
    /// Latest known snapshot of the button.
    pub info: ButtonInfo,

    /// Whether the controller is attached as this button's click
    /// delegate.
    pub listening: bool,
}

impl ButtonRecord {
    fn new(info: ButtonInfo) -> Self {
        Self {
            info,
            listening: false,
        }
    }
}

/// Address-keyed collection of known buttons.
///
/// # Examples
///
/// ```
/// use flicbridge_core::ButtonInfo;
/// use flicbridge_session::registry::ButtonRegistry;
///
/// let mut registry = ButtonRegistry::new();
/// registry.upsert(ButtonInfo::new("AA:BB").with_name("Desk"));
/// registry.upsert(ButtonInfo::new("aa:bb")); // same address, merges
///
/// assert_eq!(registry.len(), 1);
/// let snapshot = registry.snapshot();
/// assert_eq!(snapshot[0].name.as_deref(), Some("Desk"));
/// ```
#[derive(Debug, Default)]
pub struct ButtonRegistry {
    entries: HashMap<ButtonAddress, ButtonRecord>,
}

impl ButtonRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or merge a snapshot.
    ///
    /// A repeat for an existing address replaces the snapshot but keeps
    /// the listening flag, and keeps previously learned metadata when the
    /// new snapshot lacks it (an advertisement does not carry the name a
    /// pairing already taught us).
    pub fn upsert(&mut self, info: ButtonInfo) {
        match self.entries.get_mut(&info.address) {
            Some(record) => {
                let previous = std::mem::replace(&mut record.info, info);
                if record.info.name.is_none() {
                    record.info.name = previous.name;
                }
                if record.info.serial_number.is_none() {
                    record.info.serial_number = previous.serial_number;
                }
                if record.info.firmware_version.is_none() {
                    record.info.firmware_version = previous.firmware_version;
                }
                if record.info.battery.is_none() {
                    record.info.battery = previous.battery;
                }
            }
            None => {
                self.entries
                    .insert(info.address.clone(), ButtonRecord::new(info));
            }
        }
    }

    /// Remove an entry. Only explicit forget (or an SDK removal report)
    /// calls this.
    pub fn remove(&mut self, address: &ButtonAddress) -> Option<ButtonRecord> {
        self.entries.remove(address)
    }

    /// Look up a record by address.
    pub fn get(&self, address: &ButtonAddress) -> Option<&ButtonRecord> {
        self.entries.get(address)
    }

    /// Look up a record mutably by address.
    pub fn get_mut(&mut self, address: &ButtonAddress) -> Option<&mut ButtonRecord> {
        self.entries.get_mut(address)
    }

    /// Whether an address resolves to an entry.
    pub fn contains(&self, address: &ButtonAddress) -> bool {
        self.entries.contains_key(address)
    }

    /// Number of unique addresses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Owned, address-sorted snapshot of every known button.
    ///
    /// The caller's copy is not invalidated by later registry mutation.
    pub fn snapshot(&self) -> Vec<ButtonInfo> {
        let mut buttons: Vec<ButtonInfo> = self
            .entries
            .values()
            .map(|record| record.info.clone())
            .collect();
        buttons.sort_by(|a, b| a.address.cmp(&b.address));
        buttons
    }

    /// Addresses the controller is currently listening to.
    pub fn listening_addresses(&self) -> Vec<ButtonAddress> {
        self.entries
            .iter()
            .filter(|(_, record)| record.listening)
            .map(|(address, _)| address.clone())
            .collect()
    }

    /// Update one record's connection state, if present.
    ///
    /// Returns the previous state so callers can tell a genuine
    /// transition from a repeated vendor report.
    pub fn set_connection(
        &mut self,
        address: &ButtonAddress,
        state: ConnectionState,
    ) -> Option<ConnectionState> {
        self.entries.get_mut(address).map(|record| {
            std::mem::replace(&mut record.info.connection, state)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> ButtonAddress {
        ButtonAddress::new(s)
    }

    #[test]
    fn test_upsert_never_duplicates() {
        let mut registry = ButtonRegistry::new();
        registry.upsert(ButtonInfo::new("AA:BB"));
        registry.upsert(ButtonInfo::new("AA:BB"));
        registry.upsert(ButtonInfo::new("aa:bb"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_upsert_keeps_learned_metadata() {
        let mut registry = ButtonRegistry::new();
        registry.upsert(
            ButtonInfo::new("AA:BB")
                .with_name("Desk")
                .with_serial_number("BA12-C34567"),
        );

        // A bare snapshot (e.g. from a repeat discovery) must not erase
        // what pairing taught us.
        registry.upsert(ButtonInfo::new("AA:BB"));

        let record = registry.get(&addr("AA:BB")).unwrap();
        assert_eq!(record.info.name.as_deref(), Some("Desk"));
        assert_eq!(record.info.serial_number.as_deref(), Some("BA12-C34567"));
    }

    #[test]
    fn test_upsert_keeps_listening_flag() {
        let mut registry = ButtonRegistry::new();
        registry.upsert(ButtonInfo::new("AA:BB"));
        registry.get_mut(&addr("AA:BB")).unwrap().listening = true;

        registry.upsert(ButtonInfo::new("AA:BB").paired());
        assert!(registry.get(&addr("AA:BB")).unwrap().listening);
        assert!(registry.get(&addr("AA:BB")).unwrap().info.paired);
    }

    #[test]
    fn test_remove_then_lookup_fails() {
        let mut registry = ButtonRegistry::new();
        registry.upsert(ButtonInfo::new("AA:BB"));
        assert!(registry.remove(&addr("AA:BB")).is_some());
        assert!(registry.get(&addr("AA:BB")).is_none());
        assert!(!registry.contains(&addr("AA:BB")));
        assert!(registry.remove(&addr("AA:BB")).is_none());
    }

    #[test]
    fn test_snapshot_is_sorted_and_detached() {
        let mut registry = ButtonRegistry::new();
        registry.upsert(ButtonInfo::new("CC:DD"));
        registry.upsert(ButtonInfo::new("AA:BB"));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot[0].address, addr("AA:BB"));
        assert_eq!(snapshot[1].address, addr("CC:DD"));

        // Mutating the registry must not invalidate the caller's copy.
        registry.clear();
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_set_connection_reports_previous_state() {
        let mut registry = ButtonRegistry::new();
        registry.upsert(ButtonInfo::new("AA:BB").paired());

        assert_eq!(
            registry.set_connection(&addr("AA:BB"), ConnectionState::Connected),
            Some(ConnectionState::Paired)
        );
        assert_eq!(
            registry.get(&addr("AA:BB")).unwrap().info.connection,
            ConnectionState::Connected
        );

        // A repeated report is distinguishable from a transition.
        assert_eq!(
            registry.set_connection(&addr("AA:BB"), ConnectionState::Connected),
            Some(ConnectionState::Connected)
        );
        assert_eq!(
            registry.set_connection(&addr("EE:FF"), ConnectionState::Connected),
            None
        );
    }

    #[test]
    fn test_listening_addresses() {
        let mut registry = ButtonRegistry::new();
        registry.upsert(ButtonInfo::new("AA:BB"));
        registry.upsert(ButtonInfo::new("CC:DD"));
        registry.get_mut(&addr("CC:DD")).unwrap().listening = true;

        let listening = registry.listening_addresses();
        assert_eq!(listening, vec![addr("CC:DD")]);
    }
}
