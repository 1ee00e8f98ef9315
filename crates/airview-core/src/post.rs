use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// A displayable post fetched from an author's message server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub title: String,
    /// Rendered HTML
    pub body: String,
    /// Alias of the author, e.g. `alice@example.com`
    pub author: String,
    /// Identifier, unique within the author's namespace
    pub name: String,
    pub published: DateTime<Utc>,
}

/// Convert a frame timestamp (seconds since the epoch) into a point in time.
///
/// Timestamps chrono cannot represent collapse to the epoch instead of failing
/// the whole fetch.
pub fn published_at(timestamp_secs: u64) -> DateTime<Utc> {
    i64::try_from(timestamp_secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_default()
}

/// Posts produced by a single fetch, newest first once sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Collection(Vec<Arc<Post>>);

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, post: Arc<Post>) {
        self.0.push(post);
    }

    /// Order newest first. The sort is stable: posts sharing a timestamp keep
    /// the order in which they were decoded.
    pub fn sort_newest_first(&mut self) {
        self.0.sort_by(|a, b| b.published.cmp(&a.published));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Post>> {
        self.0.iter()
    }
}

impl IntoIterator for Collection {
    type Item = Arc<Post>;
    type IntoIter = std::vec::IntoIter<Arc<Post>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
