//! Knowledge-context lookup: top matches from the vector index for a chat message.
//!
//! Results are memoized on the exact message text. The cache is bounded and evicts the
//! oldest inserted entry first; it is a best-effort shortcut and never a freshness guarantee.

use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::providers::ContextIndex;

pub const CONTEXT_TOP_K: usize = 3;
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Bounded message → context memo with oldest-first eviction.
#[derive(Debug)]
pub struct ContextCache {
    capacity: usize,
    entries: HashMap<String, Value>,
    order: VecDeque<String>,
}

impl ContextCache {
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&self, message: &str) -> Option<Value> {
        self.entries.get(message).cloned()
    }

    pub fn insert(&mut self, message: &str, context: Value) {
        if self.capacity == 0 {
            return;
        }
        if let Some(slot) = self.entries.get_mut(message) {
            *slot = context;
            return;
        }
        self.entries.insert(message.to_string(), context);
        self.order.push_back(message.to_string());
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct ContextLookup {
    index: Option<Arc<dyn ContextIndex>>,
    cache: Mutex<ContextCache>,
}

impl ContextLookup {
    pub fn new(index: Option<Arc<dyn ContextIndex>>, cache_capacity: usize) -> Self {
        Self {
            index,
            cache: Mutex::new(ContextCache::new(cache_capacity)),
        }
    }

    pub fn is_available(&self) -> bool {
        self.index.is_some()
    }

    /// Context for `message`, or `None` when the index is unavailable or the query failed.
    /// Failures are logged and not memoized.
    pub async fn query(&self, message: &str) -> Option<Value> {
        let Some(index) = self.index.as_ref() else {
            tracing::warn!(target: "pagi::coach::context", "Context index not initialized");
            return None;
        };

        let cached = self.cache().get(message);
        if let Some(hit) = cached {
            tracing::debug!(target: "pagi::coach::context", "Context cache hit");
            return Some(hit);
        }

        match index.query(message, CONTEXT_TOP_K).await {
            Ok(context) => {
                self.cache().insert(message, context.clone());
                Some(context)
            }
            Err(e) => {
                tracing::error!(target: "pagi::coach::context", error = %e, "Context index query failed");
                None
            }
        }
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, ContextCache> {
        // Never held across an await.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingIndex {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ContextIndex for CountingIndex {
        async fn query(&self, text: &str, top_k: usize) -> Result<Value, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Api {
                    provider: "Pinecone",
                    status: 503,
                    body: "down".to_string(),
                });
            }
            Ok(json!([{ "metadata": { "text": text }, "top_k": top_k }]))
        }
    }

    #[test]
    fn cache_evicts_oldest_entry_first() {
        let mut cache = ContextCache::new(2);
        cache.insert("a", json!(1));
        cache.insert("b", json!(2));
        cache.insert("a", json!(10));
        cache.insert("c", json!(3));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("b"), Some(json!(2)));
        assert_eq!(cache.get("c"), Some(json!(3)));
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let mut cache = ContextCache::new(0);
        cache.insert("a", json!(1));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn repeated_messages_query_the_index_once() {
        let index = Arc::new(CountingIndex::default());
        let lookup = ContextLookup::new(Some(index.clone()), DEFAULT_CACHE_CAPACITY);

        let first = lookup.query("Comment améliorer ma productivité ?").await;
        let second = lookup.query("Comment améliorer ma productivité ?").await;
        assert_eq!(first, second);
        assert_eq!(first.unwrap()[0]["top_k"], CONTEXT_TOP_K);
        assert_eq!(index.calls.load(Ordering::SeqCst), 1);

        lookup.query("Autre question").await;
        assert_eq!(index.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_index_is_unavailable() {
        let lookup = ContextLookup::new(None, DEFAULT_CACHE_CAPACITY);
        assert!(!lookup.is_available());
        assert!(lookup.query("hello").await.is_none());
    }

    #[tokio::test]
    async fn failures_are_unavailable_and_not_memoized() {
        let index = Arc::new(CountingIndex {
            fail: true,
            ..Default::default()
        });
        let lookup = ContextLookup::new(Some(index.clone()), DEFAULT_CACHE_CAPACITY);
        assert!(lookup.query("hello").await.is_none());
        assert!(lookup.query("hello").await.is_none());
        assert_eq!(index.calls.load(Ordering::SeqCst), 2);
    }
}
