//! In-memory tree store. Selected when `STORE_URL` is empty; every test runs
//! against it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{split_path, StoreError, TreeStore, Updates, WriteGuard};

#[derive(Clone)]
pub struct MemStore {
    root: Arc<RwLock<Value>>,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            root: Arc::new(RwLock::new(Value::Object(Map::new()))),
        }
    }
}

fn node_at<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for seg in segments {
        cur = cur.as_object()?.get(*seg)?;
    }
    Some(cur)
}

/// Walks to the parent of the final segment, creating objects along the way,
/// and sets the leaf. A non-object met on the way is replaced.
fn set_at(root: &mut Value, segments: &[&str], value: Value) {
    if segments.is_empty() {
        *root = value;
        return;
    }

    let mut cur = root;
    for seg in &segments[..segments.len() - 1] {
        if !cur.is_object() {
            *cur = Value::Object(Map::new());
        }
        cur = cur
            .as_object_mut()
            .expect("just coerced to object")
            .entry(seg.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !cur.is_object() {
        *cur = Value::Object(Map::new());
    }
    cur.as_object_mut()
        .expect("just coerced to object")
        .insert(segments[segments.len() - 1].to_string(), value);
}

/// Removes the leaf and prunes now-empty ancestor objects, so a deleted
/// subtree reads back as absent rather than `{}`.
fn remove_at(root: &mut Value, segments: &[&str]) {
    if segments.is_empty() {
        *root = Value::Object(Map::new());
        return;
    }

    let Some(obj) = root.as_object_mut() else {
        return;
    };

    if segments.len() == 1 {
        obj.remove(segments[0]);
        return;
    }

    if let Some(child) = obj.get_mut(segments[0]) {
        remove_at(child, &segments[1..]);
        if child.as_object().is_some_and(|m| m.is_empty()) {
            obj.remove(segments[0]);
        }
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

#[async_trait]
impl TreeStore for MemStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let root = self.root.read().await;
        Ok(present(node_at(&root, &split_path(path))).cloned())
    }

    async fn merge(&self, path: &str, patch: Map<String, Value>) -> Result<(), StoreError> {
        let mut root = self.root.write().await;
        let segments = split_path(path);
        for (key, value) in patch {
            let mut child = segments.clone();
            child.push(&key);
            if value.is_null() {
                remove_at(&mut root, &child);
            } else {
                set_at(&mut root, &child, value);
            }
        }
        Ok(())
    }

    async fn write_batch(
        &self,
        updates: Updates,
        guard: Option<WriteGuard>,
    ) -> Result<(), StoreError> {
        let mut root = self.root.write().await;

        if let Some(guard) = guard {
            let current = present(node_at(&root, &split_path(&guard.path))).cloned();
            if current != guard.expect {
                return Err(StoreError::Conflict(guard.path));
            }
        }

        for (path, value) in updates {
            let segments = split_path(&path);
            match value {
                Some(v) => set_at(&mut root, &segments, v),
                None => remove_at(&mut root, &segments),
            }
        }

        Ok(())
    }
}
