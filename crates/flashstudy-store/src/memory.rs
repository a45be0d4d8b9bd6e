//! In-memory stores for tests and ephemeral sessions.

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use flashstudy_core::model::ProgressSnapshot;
use flashstudy_core::traits::ProgressStore;

use crate::local::KeyValueStore;

/// Key-value store held in memory.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// Progress store that keeps the last snapshot in memory.
///
/// Unlike the local store it keeps the score.
#[derive(Default)]
pub struct MemoryProgressStore {
    snapshot: Mutex<Option<ProgressSnapshot>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a saved snapshot.
    pub fn with_snapshot(snapshot: ProgressSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
        }
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> Result<Option<ProgressSnapshot>> {
        Ok(self
            .snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    async fn save(&self, snapshot: &ProgressSnapshot) -> Result<()> {
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
