//! In-flight delivery registry
//!
//! Shared between the scheduler (inserts) and each sequencer (removes itself on
//! completion). Process-local, lost on restart.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::features::alarms::model::DeliveryKey;

#[derive(Clone, Default)]
pub struct PendingDeliveries {
    tasks: Arc<DashMap<DeliveryKey, JoinHandle<()>>>,
}

impl PendingDeliveries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a delivery under `key` unless one is already in flight.
    ///
    /// `spawn` is only called for a new key and runs while the key's slot is
    /// held, so a task that completes immediately still finds its own entry.
    pub fn try_register<F>(&self, key: DeliveryKey, spawn: F) -> bool
    where
        F: FnOnce() -> JoinHandle<()>,
    {
        match self.tasks.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(spawn());
                true
            }
        }
    }

    /// Drop the entry for a finished sequence
    pub fn complete(&self, key: &DeliveryKey) -> bool {
        self.tasks.remove(key).is_some()
    }

    pub fn contains(&self, key: &DeliveryKey) -> bool {
        self.tasks.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Abort every in-flight sequence and forget it. Returns how many were abandoned.
    pub fn abandon_all(&self) -> usize {
        let keys: Vec<DeliveryKey> = self.tasks.iter().map(|entry| *entry.key()).collect();
        keys.iter()
            .filter_map(|key| self.tasks.remove(key))
            .map(|(_, task)| task.abort())
            .count()
    }
}
