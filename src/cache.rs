use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use lru::LruCache;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use crate::logging::{log_cache_hit, log_cache_miss};

const DEFAULT_CAPACITY: usize = 128;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CachedResponse {
    pub data: String,
    pub timestamp: i64,
}

/// Generate a hash key from model name and prompt
pub fn cache_key(model: &str, prompt: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    model.hash(&mut hasher);
    prompt.hash(&mut hasher);
    hasher.finish()
}

fn preview(prompt: &str) -> String {
    prompt.chars().take(50).collect()
}

/// LRU of tutor text responses keyed by (model, prompt)
pub struct ResponseCache {
    entries: RwLock<LruCache<u64, CachedResponse>>,
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        ResponseCache {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, model: &str, prompt: &str) -> Option<String> {
        let key = cache_key(model, prompt);
        // `get` bumps recency, so this needs the write half
        let mut cache = self.entries.write();
        match cache.get(&key) {
            Some(cached) => {
                log_cache_hit(key);
                tracing::debug!(model = model, prompt_preview = %preview(prompt), "Tutor cache hit");
                Some(cached.data.clone())
            }
            None => {
                log_cache_miss(key);
                None
            }
        }
    }

    pub fn put(&self, model: &str, prompt: &str, response: &str) {
        let key = cache_key(model, prompt);
        let cached = CachedResponse {
            data: response.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        };
        self.entries.write().put(key, cached);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
