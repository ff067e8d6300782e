//! Process-local caching layer.
//!
//! Three cooperating pieces:
//! - [`QueryCache`] - read-through memoization of frequent reads
//! - [`ResponseCache`] - HTTP-shaped cache with ETag and stale-while-revalidate
//! - [`RequestDeduper`] - short-TTL collapse of concurrent identical fetches
//!
//! None of these survive the process or synchronize across instances; cache
//! faults never surface to callers.

mod deduper;
mod query_cache;
mod response_cache;

pub use deduper::RequestDeduper;
pub use query_cache::QueryCache;
pub use response_cache::{CachedResponse, Freshness, ResponseCache, ResponseKey};
