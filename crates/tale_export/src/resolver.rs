// Object Resolver - Read access to external export objects
//
// Conditions and references point at npcs, items, skills and quests by id. The
// pipeline only reads them, always through this async seam.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tale_types::ExportObject;
use tracing::trace;

/// Infrastructure failure while looking up an object
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    #[error("Object store unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid object data for {id}: {reason}")]
    InvalidData { id: String, reason: String },
}

/// Looks up export objects by id
///
/// A missing object is `Ok(None)`; errors are reserved for the store itself
/// failing.
#[async_trait]
pub trait ObjectResolver: Send + Sync {
    async fn get_object(&self, object_id: &str) -> Result<Option<ExportObject>, ResolveError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// In-Memory Store
// ─────────────────────────────────────────────────────────────────────────────

/// Resolver backed by a concurrent map
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: DashMap<String, ExportObject>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an object
    pub fn insert(&self, object: ExportObject) {
        self.objects.insert(object.id.clone(), object);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl FromIterator<ExportObject> for InMemoryObjectStore {
    fn from_iter<I: IntoIterator<Item = ExportObject>>(iter: I) -> Self {
        let store = Self::new();
        for object in iter {
            store.insert(object);
        }
        store
    }
}

#[async_trait]
impl ObjectResolver for InMemoryObjectStore {
    async fn get_object(&self, object_id: &str) -> Result<Option<ExportObject>, ResolveError> {
        Ok(self.objects.get(object_id).map(|o| o.clone()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-Export Cache
// ─────────────────────────────────────────────────────────────────────────────

/// Caches lookups of an inner resolver for the duration of one export
///
/// Every object is fetched at most once, so all renders of an export see the
/// same snapshot. Misses are cached too.
pub struct CachedObjectResolver {
    inner: Arc<dyn ObjectResolver>,
    cache: DashMap<String, Option<ExportObject>>,
}

impl CachedObjectResolver {
    pub fn new(inner: Arc<dyn ObjectResolver>) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    /// Number of cached lookups (hits and misses)
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl ObjectResolver for CachedObjectResolver {
    async fn get_object(&self, object_id: &str) -> Result<Option<ExportObject>, ResolveError> {
        if let Some(cached) = self.cache.get(object_id) {
            return Ok(cached.clone());
        }

        let object = self.inner.get_object(object_id).await?;
        trace!(object_id, found = object.is_some(), "Resolved export object");
        self.cache.insert(object_id.to_string(), object.clone());
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tale_types::ObjectType;

    struct CountingResolver {
        store: InMemoryObjectStore,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ObjectResolver for CountingResolver {
        async fn get_object(&self, object_id: &str) -> Result<Option<ExportObject>, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.store.get_object(object_id).await
        }
    }

    #[test]
    fn test_in_memory_store() {
        let store: InMemoryObjectStore =
            vec![ExportObject::new("n1", "Bob", ObjectType::Npc)].into_iter().collect();

        let bob = tokio_test::block_on(store.get_object("n1")).unwrap();
        assert_eq!(bob.map(|o| o.name), Some("Bob".to_string()));
        assert!(tokio_test::block_on(store.get_object("n2")).unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_fetches_once() {
        let inner = Arc::new(CountingResolver {
            store: vec![ExportObject::new("n1", "Bob", ObjectType::Npc)]
                .into_iter()
                .collect(),
            calls: AtomicUsize::new(0),
        });
        let cached = CachedObjectResolver::new(inner.clone());

        for _ in 0..3 {
            assert!(cached.get_object("n1").await.unwrap().is_some());
            assert!(cached.get_object("missing").await.unwrap().is_none());
        }

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.cached(), 2);
    }
}
