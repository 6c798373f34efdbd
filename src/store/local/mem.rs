use tracing::trace;

use crate::{Result, common::MemCache, store::LocalStore};

/// In-memory local store, used by tests and headless hosts.
#[derive(Clone)]
pub struct MemLocalStore {
    entries: MemCache<String, String>,
}

impl Default for MemLocalStore {
    fn default() -> Self {
        Self::new(64)
    }
}

impl MemLocalStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: MemCache::new(capacity),
        }
    }
}

impl LocalStore for MemLocalStore {
    fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        trace!("MemLocalStore::get({})", key);
        Ok(self.entries.get(&key.to_string()))
    }

    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        trace!("MemLocalStore::set({})", key);
        self.entries.set(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(
        &self,
        key: &str,
    ) -> Result<bool> {
        trace!("MemLocalStore::remove({})", key);
        Ok(self.entries.remove(&key.to_string()).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys())
    }
}
