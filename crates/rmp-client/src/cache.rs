//! Size-bounded in-memory professor cache using moka.

use std::sync::Arc;

use moka::sync::Cache;

use rmp_types::ProfessorRecord;

pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Professor records keyed by upstream identifier.
///
/// Only complete, successfully decoded records are ever inserted. Cloning
/// is cheap and clones share the same storage.
#[derive(Clone)]
pub struct ProfessorCache {
    cache: Cache<String, Arc<ProfessorRecord>>,
}

impl ProfessorCache {
    pub fn new(max_entries: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<ProfessorRecord>> {
        self.cache.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cache.contains_key(id)
    }

    pub fn insert(&self, id: String, record: Arc<ProfessorRecord>) {
        self.cache.insert(id, record);
    }

    /// Approximate; moka applies writes lazily.
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for ProfessorCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for ProfessorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfessorCache")
            .field("entries", &self.len())
            .finish()
    }
}
