//! Content-addressed collection of emitted entries

use super::entry::ResourceEntry;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::trace;

/// Hex SHA-256 of a serialized document
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Collects entries from any number of workers, one entry per content hash.
///
/// When two entries share a hash the one with the smaller ordering key wins,
/// so the result does not depend on which worker emitted first.
#[derive(Debug, Default)]
pub struct Emitter {
    entries: Mutex<HashMap<String, ResourceEntry>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, entry: ResourceEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let keep_existing = entries
            .get(&entry.hash)
            .is_some_and(|existing| existing.ordering_key() <= entry.ordering_key());
        if keep_existing {
            trace!("Duplicate content {} from {}", entry.hash, entry.path);
            return;
        }
        entries.insert(entry.hash.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All unique entries sorted by ordering key
    pub fn into_entries(self) -> Vec<ResourceEntry> {
        let entries = self.entries.into_inner().unwrap_or_else(|e| e.into_inner());
        let mut entries: Vec<ResourceEntry> = entries.into_values().collect();
        entries.sort_by(|a, b| a.ordering_key().cmp(&b.ordering_key()));
        entries
    }
}
