//! Host entity-state sink.
//!
//! Entities do not render state themselves; they push every transition to a
//! [`StateSink`] owned by the host. The sink call is synchronous and must be
//! cheap - hosts that need I/O should buffer internally.

use std::sync::Mutex;

use crate::value::StateValue;

/// Receives entity state after every transition.
pub trait StateSink: Send + Sync {
    /// Record the current value and availability of an entity.
    fn write_state(&self, entity_id: &str, value: StateValue, available: bool);
}

/// One recorded `write_state` call.
#[derive(Debug, Clone, PartialEq)]
pub struct StateWrite {
    pub entity_id: String,
    pub value: StateValue,
    pub available: bool,
}

/// Recording sink for tests.
#[derive(Default)]
pub struct RecordingSink {
    writes: Mutex<Vec<StateWrite>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes recorded so far, in order.
    pub fn writes(&self) -> Vec<StateWrite> {
        self.writes.lock().expect("sink lock poisoned").clone()
    }

    /// The most recent write for an entity, if any.
    pub fn last_for(&self, entity_id: &str) -> Option<StateWrite> {
        self.writes
            .lock()
            .expect("sink lock poisoned")
            .iter()
            .rev()
            .find(|w| w.entity_id == entity_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.writes.lock().expect("sink lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StateSink for RecordingSink {
    fn write_state(&self, entity_id: &str, value: StateValue, available: bool) {
        self.writes.lock().expect("sink lock poisoned").push(StateWrite {
            entity_id: entity_id.to_string(),
            value,
            available,
        });
    }
}
