// airview-core - In-memory state shared by every request
//
// - Post / Collection: the displayable unit and one fetch's ordered result
// - PostCache: author -> post name -> post, upsert only
// - ViewTracker: lifetime view counts plus an approximate top-K ranking
//
// Everything here is synchronous and lock-based; no I/O.

mod cache;
mod post;
mod tracker;

pub use cache::PostCache;
pub use post::{published_at, Collection, Post};
pub use tracker::{ViewRecord, ViewTracker};
