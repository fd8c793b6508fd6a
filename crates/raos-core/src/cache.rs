use crate::types::Extraction;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Cache key for a description: surrounding whitespace trimmed, lowercased.
pub fn normalize_key(description: &str) -> String {
    description.trim().to_lowercase()
}

/// Process-lifetime memo of extraction results, keyed by normalized
/// description. Implementations must be safe to share across tasks.
pub trait ExtractionCache: Send + Sync {
    fn get(&self, description: &str) -> Option<Extraction>;
    fn set(&self, description: &str, extraction: Extraction);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded in-memory cache. Entries are never evicted.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Extraction>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExtractionCache for MemoryCache {
    fn get(&self, description: &str) -> Option<Extraction> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize_key(description))
            .cloned()
    }

    fn set(&self, description: &str, extraction: Extraction) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize_key(description), extraction);
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
