//! Directory listing cache.
//!
//! One `DirListing` per directory id: the ordered children as last fetched,
//! a name -> (id, kind) index, and a freshness flag. A stale (or absent)
//! listing is rebuilt wholesale from the remote by whoever holds its lock;
//! structural mutations performed through this process keep a fresh listing
//! current incrementally instead of refetching.
//!
//! The lock table follows the per-key lock-map shape: a `RwLock<HashMap>` of
//! `Arc<Mutex<_>>` slots, so independent directories never contend.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::remote::{ObjectId, ObjectKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub id: ObjectId,
    pub kind: ObjectKind,
}

/// Cached children of one directory. Entry order is whatever the remote
/// returned last; it is not stable across refreshes.
#[derive(Default)]
pub struct DirListing {
    entries: Vec<DirEntry>,
    by_name: HashMap<String, (ObjectId, ObjectKind)>,
    fresh: bool,
}

impl DirListing {
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn mark_stale(&mut self) {
        self.fresh = false;
    }

    /// Replace the whole listing with a freshly fetched one.
    pub fn replace(&mut self, entries: Vec<DirEntry>) {
        self.by_name = entries
            .iter()
            .map(|e| (e.name.clone(), (e.id.clone(), e.kind)))
            .collect();
        self.entries = entries;
        self.fresh = true;
    }

    pub fn get(&self, name: &str) -> Option<(ObjectId, ObjectKind)> {
        self.by_name.get(name).cloned()
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    /// Incremental bookkeeping after a successful remote create. Only valid
    /// on a fresh listing; the name must not already be present.
    pub fn insert(&mut self, entry: DirEntry) {
        debug_assert!(self.fresh, "insert into a stale listing");
        debug_assert!(!self.by_name.contains_key(&entry.name));
        self.by_name
            .insert(entry.name.clone(), (entry.id.clone(), entry.kind));
        self.entries.push(entry);
    }

    /// Incremental bookkeeping after a successful remote delete/move-out.
    pub fn remove(&mut self, name: &str) -> Option<DirEntry> {
        debug_assert!(self.fresh, "remove from a stale listing");
        self.by_name.remove(name)?;
        let pos = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(pos))
    }
}

/// Per-directory listing slots keyed by directory id.
#[derive(Default)]
pub struct DirCache {
    slots: RwLock<HashMap<ObjectId, Arc<Mutex<DirListing>>>>,
}

impl DirCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, dir_id: &str) -> Arc<Mutex<DirListing>> {
        if let Some(slot) = self.slots.read().await.get(dir_id) {
            return slot.clone();
        }
        self.slots
            .write()
            .await
            .entry(dir_id.to_string())
            .or_default()
            .clone()
    }

    /// Lock one directory's listing. The guard is held across the whole
    /// resolve-then-mutate sequence, remote calls included.
    pub async fn lock(&self, dir_id: &str) -> OwnedMutexGuard<DirListing> {
        self.slot(dir_id).await.lock_owned().await
    }

    /// Lock two distinct directories, acquiring in id order so that two
    /// concurrent cross-directory renames in opposite directions cannot
    /// deadlock. Guards are returned in argument order.
    pub async fn lock_pair(
        &self,
        a: &str,
        b: &str,
    ) -> (OwnedMutexGuard<DirListing>, OwnedMutexGuard<DirListing>) {
        debug_assert_ne!(a, b);
        let slot_a = self.slot(a).await;
        let slot_b = self.slot(b).await;
        if a <= b {
            let ga = slot_a.lock_owned().await;
            let gb = slot_b.lock_owned().await;
            (ga, gb)
        } else {
            let gb = slot_b.lock_owned().await;
            let ga = slot_a.lock_owned().await;
            (ga, gb)
        }
    }

    /// Drop the slot for a removed directory. Outstanding guards keep their
    /// own reference; new lookups start from an empty stale listing.
    pub async fn forget(&self, dir_id: &str) {
        self.slots.write().await.remove(dir_id);
    }
}
