//! Durable cache of catalog listings.
//!
//! [`CacheStore`] is the typed front used by the resolver. It sits on one of
//! two [`CacheBackend`]s:
//! - [`JsonFileBackend`]: one JSON file per record (default)
//! - [`SqliteBackend`]: one table in a SQLite database

mod atomic;
mod json_file;
mod sqlite;
mod store;
mod traits;

pub use atomic::{atomic_read_json, atomic_write_json};
pub use json_file::{sanitize_key, JsonFileBackend};
pub use sqlite::SqliteBackend;
pub use store::{is_fresh, CacheNamespace, CacheStore};
pub use traits::{CacheBackend, CacheRecord};
