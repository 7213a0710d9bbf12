use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use super::{ScopeKey, SlotStore};
use crate::{EngineError, ResultEngine};

/// In-process slot store.
///
/// Clones share the same slots. Used for guest sessions without a database
/// and in tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> ResultEngine<MutexGuard<'_, HashMap<String, String>>> {
        self.slots
            .lock()
            .map_err(|_| EngineError::PersistenceUnavailable("memory store poisoned".to_string()))
    }

    /// Stores a raw payload, bypassing encoding. Lets tests plant bad data.
    pub fn insert_raw(&self, key: &ScopeKey, payload: impl Into<String>) -> ResultEngine<()> {
        self.slots()?.insert(key.to_string(), payload.into());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots().map(|slots| slots.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SlotStore for MemoryStore {
    async fn read(&self, key: &ScopeKey) -> ResultEngine<Option<String>> {
        Ok(self.slots()?.get(&key.to_string()).cloned())
    }

    async fn write(&self, key: &ScopeKey, payload: String) -> ResultEngine<()> {
        self.slots()?.insert(key.to_string(), payload);
        Ok(())
    }

    async fn remove(&self, key: &ScopeKey) -> ResultEngine<()> {
        self.slots()?.remove(&key.to_string());
        Ok(())
    }
}
