//! `DriveFs`: the shared state behind every node.
//!
//! Holds the remote client, the three caches and the inode table. Nodes are
//! thin (id + handle) and route everything through here. Directory listings
//! are resolved under the directory's own lock: a stale listing is refetched
//! wholesale from the remote, with a paging failure aborting the refresh and
//! leaving the last-known-good listing in place.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OwnedMutexGuard, RwLock};

use crate::cache::{ContentStore, DirCache, DirEntry, DirListing, IdentityRegistry, ObjectMetadata};
use crate::error::Result;
use crate::remote::client::list_all_children;
use crate::remote::{ObjectId, ObjectKind, RemoteStore};
use crate::vfs::node::DirNode;

/// FUSE reserves inode 1 for the root.
pub const ROOT_INO: u64 = 1;

pub struct DriveFs<R: RemoteStore> {
    pub(crate) remote: R,
    pub(crate) root: ObjectId,
    pub(crate) dirs: DirCache,
    pub(crate) registry: IdentityRegistry,
    pub(crate) content: ContentStore,
    /// Reverse map from derived inode numbers back to ids, fed as objects
    /// are observed. Hash collisions are possible and unresolved.
    inodes: RwLock<HashMap<u64, (ObjectId, ObjectKind)>>,
}

impl<R: RemoteStore> DriveFs<R> {
    /// Discover the root id from the remote and set up empty caches.
    pub async fn new(remote: R) -> Result<Arc<Self>> {
        let root = remote.root_id().await?;
        let fs = Arc::new(Self {
            remote,
            root: root.clone(),
            dirs: DirCache::new(),
            registry: IdentityRegistry::new(),
            content: ContentStore::new(),
            inodes: RwLock::new(HashMap::new()),
        });
        fs.registry
            .observe(
                &root,
                ObjectMetadata {
                    parent: None,
                    name: "/".to_string(),
                    size: None,
                    native_doc: false,
                },
            )
            .await;
        fs.register_inode(&root, ObjectKind::Directory).await;
        Ok(fs)
    }

    pub fn root(self: &Arc<Self>) -> DirNode<R> {
        DirNode {
            fs: self.clone(),
            id: self.root.clone(),
        }
    }

    /// Numeric handle for an id: FNV-1a, except the root which must be
    /// inode 1 for the kernel.
    pub fn ino(&self, id: &str) -> u64 {
        if id == self.root { ROOT_INO } else { fnv1a64(id) }
    }

    pub(crate) async fn register_inode(&self, id: &str, kind: ObjectKind) {
        self.inodes
            .write()
            .await
            .insert(self.ino(id), (id.to_string(), kind));
    }

    pub(crate) async fn id_for_ino(&self, ino: u64) -> Option<(ObjectId, ObjectKind)> {
        if ino == ROOT_INO {
            return Some((self.root.clone(), ObjectKind::Directory));
        }
        self.inodes.read().await.get(&ino).cloned()
    }

    /// Lock `dir_id`'s listing and make sure it is fresh. The returned guard
    /// is the permit for any follow-up mutation of that listing.
    pub(crate) async fn resolve_dir(&self, dir_id: &str) -> Result<OwnedMutexGuard<DirListing>> {
        let mut guard = self.dirs.lock(dir_id).await;
        self.refresh_if_stale(dir_id, &mut guard).await?;
        Ok(guard)
    }

    /// Refetch all pages and replace the listing wholesale. Every listed
    /// child is observed into the registry and the inode table.
    pub(crate) async fn refresh_if_stale(
        &self,
        dir_id: &str,
        listing: &mut DirListing,
    ) -> Result<()> {
        if listing.is_fresh() {
            return Ok(());
        }
        let children = list_all_children(&self.remote, dir_id).await?;
        let mut entries = Vec::with_capacity(children.len());
        for child in children {
            self.registry
                .observe(
                    &child.id,
                    ObjectMetadata {
                        parent: Some(dir_id.to_string()),
                        name: child.name.clone(),
                        // Listings carry no size; it is learned lazily.
                        size: None,
                        native_doc: child.native_doc,
                    },
                )
                .await;
            self.register_inode(&child.id, child.kind).await;
            entries.push(DirEntry {
                name: child.name,
                id: child.id,
                kind: child.kind,
            });
        }
        listing.replace(entries);
        Ok(())
    }
}

fn fnv1a64(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in s.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_is_deterministic_and_spreads() {
        assert_eq!(fnv1a64("obj-0001"), fnv1a64("obj-0001"));
        assert_ne!(fnv1a64("obj-0001"), fnv1a64("obj-0002"));
        // Known FNV-1a vector.
        assert_eq!(fnv1a64(""), 0xcbf2_9ce4_8422_2325);
    }
}
