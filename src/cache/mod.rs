//! User cache (Redis or in-process).

pub mod backend;
pub mod user_cache;

pub use backend::{CacheBackend, CacheError};
pub use user_cache::UserCache;
