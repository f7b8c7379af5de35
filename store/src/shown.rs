use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use nudge_protocol::ReminderId;
use serde::Deserialize;
use serde::Serialize;

use crate::KeyValueBackend;
use crate::StoreError;

/// Serialized form of one shown-state record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShownEntry {
    pub id: ReminderId,
    pub count: u32,
}

/// Per-domain map of `reminder id -> last shown reminder count`.
///
/// Every mutation is persisted immediately. Persistence failures are logged
/// and otherwise ignored: the in-memory map stays authoritative for the
/// running process.
pub struct ShownStateStore {
    key: String,
    backend: Arc<dyn KeyValueBackend>,
    entries: HashMap<ReminderId, u32>,
}

impl ShownStateStore {
    /// Reads the map stored under `key`. Unreadable or corrupt data yields an
    /// empty store.
    pub fn load(backend: Arc<dyn KeyValueBackend>, key: impl Into<String>) -> Self {
        let key = key.into();
        let entries = match Self::read_entries(backend.as_ref(), &key) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "resetting unreadable shown-state");
                HashMap::new()
            }
        };
        Self {
            key,
            backend,
            entries,
        }
    }

    fn read_entries(
        backend: &dyn KeyValueBackend,
        key: &str,
    ) -> Result<HashMap<ReminderId, u32>, StoreError> {
        let Some(raw) = backend.read(key)? else {
            return Ok(HashMap::new());
        };
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        let list: Vec<ShownEntry> = serde_json::from_str(&raw)?;
        let mut entries = HashMap::with_capacity(list.len());
        for entry in list {
            let count = entries.entry(entry.id).or_insert(entry.count);
            *count = (*count).max(entry.count);
        }
        Ok(entries)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_shown(&self, id: &ReminderId) -> Option<u32> {
        self.entries.get(id).copied()
    }

    /// True iff a count is stored for `id` and it is at least `count`.
    pub fn has_been_shown(&self, id: &ReminderId, count: u32) -> bool {
        self.last_shown(id).is_some_and(|shown| shown >= count)
    }

    pub fn mark_shown(&mut self, id: &ReminderId, count: u32) {
        self.entries.insert(id.clone(), count);
        self.persist();
    }

    /// Drops entries whose id is not active. Returns how many were removed.
    pub fn prune(&mut self, active: &HashSet<ReminderId>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| active.contains(id));
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(key = %self.key, removed, "pruned shown-state");
            self.persist();
        }
        removed
    }

    /// Forgets every entry and deletes the stored key.
    pub fn clear_all(&mut self) {
        self.entries.clear();
        if let Err(err) = self.backend.remove(&self.key) {
            tracing::warn!(key = %self.key, error = %err, "failed to remove shown-state");
        }
    }

    /// Snapshot sorted by id.
    pub fn entries(&self) -> Vec<ShownEntry> {
        let mut list: Vec<ShownEntry> = self
            .entries
            .iter()
            .map(|(id, count)| ShownEntry {
                id: id.clone(),
                count: *count,
            })
            .collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.entries())
            .map_err(StoreError::from)
            .and_then(|json| self.backend.write(&self.key, &json));
        if let Err(err) = result {
            tracing::warn!(key = %self.key, error = %err, "failed to persist shown-state");
        }
    }
}

impl std::fmt::Debug for ShownStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShownStateStore")
            .field("key", &self.key)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}
