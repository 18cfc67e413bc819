//! Published state
//!
//! [`StateStore`] is the sink for canonical variables. The engine reads back
//! from it as well: the transfer validator and the date/time converters use
//! values published earlier in the same cycle.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Sink for canonical variables
pub trait StateStore {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: String);
    fn delete(&mut self, name: &str);
    fn register_command(&mut self, name: &str);

    /// Announce the admissible labels of an enumerated variable
    fn set_enum(&mut self, _name: &str, _labels: &[String]) {}

    /// Announce that a variable accepts write requests
    fn set_writable(&mut self, _name: &str) {}
}

/// Serializable view of a [`MemoryStore`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreSnapshot {
    pub variables: BTreeMap<String, String>,
    pub commands: BTreeSet<String>,
    pub enums: BTreeMap<String, Vec<String>>,
    pub writable: BTreeSet<String>,
}

/// In-memory state store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: StoreSnapshot,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.snapshot.variables
    }

    pub fn commands(&self) -> &BTreeSet<String> {
        &self.snapshot.commands
    }

    pub fn enum_labels(&self, name: &str) -> Option<&[String]> {
        self.snapshot.enums.get(name).map(Vec::as_slice)
    }

    pub fn is_writable(&self, name: &str) -> bool {
        self.snapshot.writable.contains(name)
    }

    pub fn snapshot(&self) -> &StoreSnapshot {
        &self.snapshot
    }

    /// Pretty JSON dump of everything published so far
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot)?)
    }
}

impl StateStore for MemoryStore {
    fn get(&self, name: &str) -> Option<String> {
        self.snapshot.variables.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: String) {
        self.snapshot.variables.insert(name.to_string(), value);
    }

    fn delete(&mut self, name: &str) {
        self.snapshot.variables.remove(name);
    }

    fn register_command(&mut self, name: &str) {
        self.snapshot.commands.insert(name.to_string());
    }

    fn set_enum(&mut self, name: &str, labels: &[String]) {
        self.snapshot.enums.insert(name.to_string(), labels.to_vec());
    }

    fn set_writable(&mut self, name: &str) {
        self.snapshot.writable.insert(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete() {
        let mut store = MemoryStore::new();
        store.set("battery.charge", "100".to_string());
        assert_eq!(store.get("battery.charge").as_deref(), Some("100"));
        store.delete("battery.charge");
        assert_eq!(store.get("battery.charge"), None);
    }

    #[test]
    fn json_snapshot_contains_commands() {
        let mut store = MemoryStore::new();
        store.register_command("beeper.on");
        store.set_writable("ups.delay.shutdown");
        let json = store.to_json().unwrap();
        assert!(json.contains("beeper.on"));
        assert!(json.contains("ups.delay.shutdown"));
    }
}
