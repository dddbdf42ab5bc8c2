//! Identity registry: id -> object metadata.
//!
//! Answers attribute queries without touching the remote. Entries are
//! upserted idempotently as objects are observed (listing, create, mkdir)
//! and updated in place by rename/write; they only disappear on explicit
//! removal of the same id.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tokio::sync::RwLock;

use crate::remote::ObjectId;

#[derive(Clone, Debug)]
pub struct ObjectMetadata {
    /// `None` only for the root.
    pub parent: Option<ObjectId>,
    pub name: String,
    /// Unknown until learned from a metadata fetch, a content fetch or a write.
    pub size: Option<u64>,
    pub native_doc: bool,
}

#[derive(Default)]
pub struct IdentityRegistry {
    map: RwLock<HashMap<ObjectId, ObjectMetadata>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent upsert. A re-observation without size information (listings
    /// carry none) must not forget a size already learned.
    pub async fn observe(&self, id: &str, meta: ObjectMetadata) {
        let mut map = self.map.write().await;
        match map.entry(id.to_string()) {
            Entry::Occupied(mut slot) => {
                let size = meta.size.or(slot.get().size);
                *slot.get_mut() = ObjectMetadata { size, ..meta };
            }
            Entry::Vacant(slot) => {
                slot.insert(meta);
            }
        }
    }

    pub async fn get(&self, id: &str) -> Option<ObjectMetadata> {
        self.map.read().await.get(id).cloned()
    }

    /// Partial in-place update after rename/move/write.
    pub async fn update(&self, id: &str, apply: impl FnOnce(&mut ObjectMetadata)) {
        if let Some(meta) = self.map.write().await.get_mut(id) {
            apply(meta);
        }
    }

    pub async fn remove(&self, id: &str) {
        self.map.write().await.remove(id);
    }
}
