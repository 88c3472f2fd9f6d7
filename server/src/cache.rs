use dashmap::DashMap;
use std::sync::Arc;

/// What the redirect path needs to know about a link without touching the
/// database: its identity (for click accounting) and where to send the visitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedLink {
    pub id: String,
    pub target_url: String,
}

/// Thread-safe in-memory cache mapping short_code -> CachedLink.
///
/// Warmed on startup from the database, then kept in sync via explicit
/// insert/remove calls after every create and delete.
#[derive(Clone, Debug)]
pub struct LinkCache {
    inner: Arc<DashMap<String, CachedLink>>,
}

impl LinkCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Insert or update a mapping.
    pub fn set(&self, short_code: impl Into<String>, link: CachedLink) {
        self.inner.insert(short_code.into(), link);
    }

    pub fn get(&self, short_code: &str) -> Option<CachedLink> {
        self.inner.get(short_code).map(|v| v.clone())
    }

    /// Remove a mapping (e.g. when a link is deleted).
    pub fn remove(&self, short_code: &str) {
        self.inner.remove(short_code);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for LinkCache {
    fn default() -> Self {
        Self::new()
    }
}
