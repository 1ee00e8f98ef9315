use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::Post;

/// Two-level cache of every post seen so far: author -> post name -> post.
///
/// Entries are never evicted. Reads take a shared lock, writes an exclusive
/// one; neither is held beyond the map operation itself.
#[derive(Debug, Default)]
pub struct PostCache {
    inner: RwLock<HashMap<String, HashMap<String, Arc<Post>>>>,
}

impl PostCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached post. A missing author or name is a plain miss.
    pub fn get_post(&self, author: &str, id: &str) -> Option<Arc<Post>> {
        let guard = self.inner.read();
        guard.get(author)?.get(id).cloned()
    }

    /// Insert or replace the post stored under `(author, id)`.
    pub fn store_post(&self, author: &str, id: &str, post: Arc<Post>) {
        let mut guard = self.inner.write();
        guard
            .entry(author.to_string())
            .or_default()
            .insert(id.to_string(), post);
    }

    /// Number of authors with at least one cached post.
    pub fn author_count(&self) -> usize {
        self.inner.read().len()
    }

    /// Total number of cached posts across all authors.
    pub fn post_count(&self) -> usize {
        self.inner.read().values().map(HashMap::len).sum()
    }
}
