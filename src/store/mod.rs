//! Tree-shaped document store, consumed through a narrow interface.
//!
//! Paths are `/`-separated (`users/{uid}/holdings/NABIL`). The store offers
//! point reads, partial-field merges, and multi-path atomic batch writes; a
//! batch can carry a compare-and-swap guard so a read-modify-write cycle
//! fails instead of losing an update.

pub mod memory;
pub mod rtdb;

pub use memory::MemStore;
pub use rtdb::RtdbClient;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Unavailable(String),

    #[error("write conflict at {0}")]
    Conflict(String),
}

/// Compare-and-swap condition for a batch write: the batch commits only if
/// the value at `path` still equals `expect` (`None` = must be absent).
#[derive(Debug, Clone)]
pub struct WriteGuard {
    pub path: String,
    pub expect: Option<Value>,
}

/// A multi-path write. `Some(value)` sets the path, `None` deletes it.
pub type Updates = BTreeMap<String, Option<Value>>;

#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Point read. Absent paths (and explicit nulls) come back as `None`.
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Merge `patch` into the object at `path`, leaving sibling fields alone.
    async fn merge(&self, path: &str, patch: Map<String, Value>) -> Result<(), StoreError>;

    /// Apply every update in one atomic batch, all-or-nothing. With a guard,
    /// fails with `StoreError::Conflict` instead of committing over a
    /// concurrent change.
    async fn write_batch(&self, updates: Updates, guard: Option<WriteGuard>)
        -> Result<(), StoreError>;
}

/// Globally-unique generated key for push-style inserts.
pub fn push_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
