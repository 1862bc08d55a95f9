// src/classify/mod.rs
// =============================================================================
// Pure classification logic: no I/O, no async.
//
// Submodules:
// - headers: maps a raw response header block to a cache status and class
// - nocache: decides which URLs are expected to bypass the cache
// =============================================================================

mod headers;
mod nocache;

pub use headers::{classify, CacheClass};
pub use nocache::is_expected_nocache;
