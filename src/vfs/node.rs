//! Directory and File nodes: the operation set driven by the mount boundary.
//!
//! Every structural mutation follows the same discipline: resolve the parent
//! listing under its lock, validate against the fresh listing, perform the
//! remote call, and only on success update the local caches. A remote
//! failure therefore leaves the local view in its last-known-good state.

use std::sync::Arc;

use log::warn;

use crate::cache::{DirEntry, ObjectMetadata, content::splice};
use crate::error::{FsError, Result};
use crate::remote::{ObjectId, ObjectKind, RemoteStore};
use crate::vfs::fs::DriveFs;

/// Attributes answered from the identity registry.
#[derive(Clone, Copy, Debug)]
pub struct NodeAttr {
    pub ino: u64,
    pub size: u64,
    pub kind: ObjectKind,
}

/// A resolved object: directory or file.
pub enum Node<R: RemoteStore> {
    Dir(DirNode<R>),
    File(FileNode<R>),
}

impl<R: RemoteStore> Node<R> {
    pub(crate) fn new(fs: Arc<DriveFs<R>>, id: ObjectId, kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Directory => Node::Dir(DirNode { fs, id }),
            ObjectKind::File => Node::File(FileNode { fs, id }),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Node::Dir(d) => &d.id,
            Node::File(f) => &f.id,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Node::Dir(_) => ObjectKind::Directory,
            Node::File(_) => ObjectKind::File,
        }
    }

    pub async fn attributes(&self) -> Result<NodeAttr> {
        match self {
            Node::Dir(d) => Ok(d.attributes()),
            Node::File(f) => f.attributes().await,
        }
    }
}

pub struct DirNode<R: RemoteStore> {
    pub(crate) fs: Arc<DriveFs<R>>,
    pub(crate) id: ObjectId,
}

impl<R: RemoteStore> Clone for DirNode<R> {
    fn clone(&self) -> Self {
        Self {
            fs: self.fs.clone(),
            id: self.id.clone(),
        }
    }
}

impl<R: RemoteStore> DirNode<R> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn attributes(&self) -> NodeAttr {
        NodeAttr {
            ino: self.fs.ino(&self.id),
            size: 0,
            kind: ObjectKind::Directory,
        }
    }

    /// Snapshot of the children, resolving from the remote if stale.
    pub async fn list(&self) -> Result<Vec<DirEntry>> {
        let guard = self.fs.resolve_dir(&self.id).await?;
        Ok(guard.entries().to_vec())
    }

    pub async fn lookup(&self, name: &str) -> Result<Node<R>> {
        let guard = self.fs.resolve_dir(&self.id).await?;
        let Some((id, kind)) = guard.get(name) else {
            return Err(FsError::NotFound);
        };
        drop(guard);
        Ok(Node::new(self.fs.clone(), id, kind))
    }

    pub async fn create_dir(&self, name: &str) -> Result<DirNode<R>> {
        let id = self.create_child(name, ObjectKind::Directory).await?;
        Ok(DirNode {
            fs: self.fs.clone(),
            id,
        })
    }

    /// New files start with size 0 and an empty, already-populated content
    /// buffer; the first write will not refetch.
    pub async fn create_file(&self, name: &str) -> Result<FileNode<R>> {
        let id = self.create_child(name, ObjectKind::File).await?;
        Ok(FileNode {
            fs: self.fs.clone(),
            id,
        })
    }

    async fn create_child(&self, name: &str, kind: ObjectKind) -> Result<ObjectId> {
        let fs = &self.fs;
        // Held across the remote call: concurrent creates under this
        // directory serialize, unrelated directories do not.
        let mut guard = fs.resolve_dir(&self.id).await?;
        if guard.get(name).is_some() {
            return Err(FsError::AlreadyExists);
        }
        let id = match kind {
            ObjectKind::Directory => fs.remote.create_directory(name, &self.id).await?,
            ObjectKind::File => fs.remote.create_file(name, &self.id).await?,
        };
        // A new file's empty buffer and zero size are in place before the
        // name becomes visible, so a lookup racing the create never sees an
        // uninitialized file.
        let size = match kind {
            ObjectKind::File => {
                *fs.content.lock(&id).await = Some(Vec::new());
                Some(0)
            }
            ObjectKind::Directory => None,
        };
        guard.insert(DirEntry {
            name: name.to_string(),
            id: id.clone(),
            kind,
        });
        fs.registry
            .observe(
                &id,
                ObjectMetadata {
                    parent: Some(self.id.clone()),
                    name: name.to_string(),
                    size,
                    native_doc: false,
                },
            )
            .await;
        fs.register_inode(&id, kind).await;
        Ok(id)
    }

    /// Remove a child by name. The remote delete must succeed before any
    /// local state is touched; on failure the entry stays visible.
    pub async fn remove(&self, name: &str) -> Result<()> {
        let fs = &self.fs;
        let mut guard = fs.resolve_dir(&self.id).await?;
        let Some((id, kind)) = guard.get(name) else {
            return Err(FsError::NotFound);
        };
        fs.remote.delete(&id).await?;
        guard.remove(name);
        fs.registry.remove(&id).await;
        fs.content.forget(&id).await;
        if kind == ObjectKind::Directory {
            fs.dirs.forget(&id).await;
        }
        Ok(())
    }

    /// Rename `name` into `dest` as `new_name`; covers both in-place rename
    /// and cross-directory move. Remote move and remote rename are two
    /// separate calls with no rollback between them: if the second fails the
    /// remote holds the moved object under its old name while the local view
    /// stays as before the operation.
    pub async fn rename(&self, name: &str, dest: &DirNode<R>, new_name: &str) -> Result<()> {
        let fs = &self.fs;
        if self.id == dest.id {
            let mut guard = fs.resolve_dir(&self.id).await?;
            // The source must exist even when the rename is a no-op.
            let Some((id, _)) = guard.get(name) else {
                return Err(FsError::NotFound);
            };
            if name == new_name {
                return Ok(());
            }
            if guard.get(new_name).is_some() {
                return Err(FsError::AlreadyExists);
            }
            fs.remote.set_name(&id, new_name).await?;
            if let Some(mut entry) = guard.remove(name) {
                entry.name = new_name.to_string();
                guard.insert(entry);
            }
            fs.registry
                .update(&id, |meta| meta.name = new_name.to_string())
                .await;
            return Ok(());
        }

        let (mut src, mut dst) = fs.dirs.lock_pair(&self.id, &dest.id).await;
        fs.refresh_if_stale(&self.id, &mut src).await?;
        fs.refresh_if_stale(&dest.id, &mut dst).await?;
        let Some((id, _)) = src.get(name) else {
            return Err(FsError::NotFound);
        };
        if dst.get(new_name).is_some() {
            return Err(FsError::AlreadyExists);
        }
        fs.remote.move_object(&id, &self.id, &dest.id).await?;
        if name != new_name {
            if let Err(err) = fs.remote.set_name(&id, new_name).await {
                warn!(
                    "rename {id}: moved to {} but set_name failed, remote keeps old name: {err}",
                    dest.id
                );
                return Err(err);
            }
        }
        if let Some(mut entry) = src.remove(name) {
            entry.name = new_name.to_string();
            dst.insert(entry);
        }
        fs.registry
            .update(&id, |meta| {
                meta.name = new_name.to_string();
                meta.parent = Some(dest.id.clone());
            })
            .await;
        Ok(())
    }
}

pub struct FileNode<R: RemoteStore> {
    pub(crate) fs: Arc<DriveFs<R>>,
    pub(crate) id: ObjectId,
}

impl<R: RemoteStore> Clone for FileNode<R> {
    fn clone(&self) -> Self {
        Self {
            fs: self.fs.clone(),
            id: self.id.clone(),
        }
    }
}

impl<R: RemoteStore> FileNode<R> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Size comes from the registry when known. An unknown size is learned
    /// from the cached buffer, from a metadata fetch for ordinary files, or
    /// — for native documents — by downloading the exported content just to
    /// measure it. That last path means a plain stat can cost a full
    /// download; deliberate, and worth knowing about.
    pub async fn attributes(&self) -> Result<NodeAttr> {
        let fs = &self.fs;
        let Some(meta) = fs.registry.get(&self.id).await else {
            return Err(FsError::NotFound);
        };
        let size = match meta.size {
            Some(size) => size,
            None => {
                let mut buf = fs.content.lock(&self.id).await;
                match &*buf {
                    Some(bytes) => {
                        let len = bytes.len() as u64;
                        fs.registry
                            .update(&self.id, |meta| meta.size = Some(len))
                            .await;
                        len
                    }
                    None if meta.native_doc => {
                        let bytes = fs.remote.open_content(&self.id).await?;
                        let len = bytes.len() as u64;
                        *buf = Some(bytes);
                        fs.registry
                            .update(&self.id, |meta| meta.size = Some(len))
                            .await;
                        len
                    }
                    None => {
                        drop(buf);
                        let fetched = fs.remote.get_metadata(&self.id).await?;
                        let fetched = fetched.size.ok_or_else(|| {
                            FsError::Unsupported(
                                "remote reports no byte size for unconverted content".to_string(),
                            )
                        })?;
                        // A write may have recorded a size while the buffer
                        // lock was released; that size is newer than the
                        // fetched one and wins.
                        let mut size = fetched;
                        fs.registry
                            .update(&self.id, |meta| match meta.size {
                                Some(current) => size = current,
                                None => meta.size = Some(fetched),
                            })
                            .await;
                        size
                    }
                }
            }
        };
        Ok(NodeAttr {
            ino: fs.ino(&self.id),
            size,
            kind: ObjectKind::File,
        })
    }

    /// Whole-object read: first access fetches the full content (export path
    /// for native documents), later reads come from the buffer.
    pub async fn read(&self) -> Result<Vec<u8>> {
        let fs = &self.fs;
        let mut buf = fs.content.lock(&self.id).await;
        if buf.is_none() {
            let bytes = fs.remote.open_content(&self.id).await?;
            fs.registry
                .update(&self.id, |meta| meta.size = Some(bytes.len() as u64))
                .await;
            *buf = Some(bytes);
        }
        Ok((*buf).clone().unwrap_or_default())
    }

    /// Splice `data` at `offset` and re-upload the whole buffer. On upload
    /// failure the local buffer keeps the mutation while the remote keeps
    /// the old bytes; the divergence is not reconciled.
    pub async fn write(&self, offset: u64, data: &[u8]) -> Result<usize> {
        let fs = &self.fs;
        let mut buf = fs.content.lock(&self.id).await;
        if buf.is_none() {
            *buf = Some(fs.remote.open_content(&self.id).await?);
        }
        let bytes = buf.get_or_insert_with(Vec::new);
        splice(bytes, offset, data)?;
        fs.remote.replace_content(&self.id, bytes).await?;
        let new_len = bytes.len() as u64;
        fs.registry
            .update(&self.id, |meta| meta.size = Some(new_len))
            .await;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryRemote;

    async fn fresh_fs() -> (MemoryRemote, Arc<DriveFs<MemoryRemote>>) {
        let remote = MemoryRemote::new();
        let fs = DriveFs::new(remote.clone()).await.unwrap();
        (remote, fs)
    }

    #[tokio::test]
    async fn create_is_visible_without_another_listing_call() {
        let (remote, fs) = fresh_fs().await;
        let root = fs.root();
        root.list().await.unwrap();
        let calls_after_resolve = remote.list_calls();

        root.create_file("a").await.unwrap();
        let entries = root.list().await.unwrap();
        assert!(entries.iter().any(|e| e.name == "a"));
        assert_eq!(remote.list_calls(), calls_after_resolve);
    }

    #[tokio::test]
    async fn lookup_of_absent_name_is_not_found() {
        let (_remote, fs) = fresh_fs().await;
        let root = fs.root();
        root.create_file("present").await.unwrap();
        assert!(matches!(
            root.lookup("absent").await,
            Err(FsError::NotFound)
        ));
    }

    #[tokio::test]
    async fn create_with_taken_name_is_already_exists() {
        let (_remote, fs) = fresh_fs().await;
        let root = fs.root();
        root.create_file("a").await.unwrap();
        assert!(matches!(
            root.create_file("a").await,
            Err(FsError::AlreadyExists)
        ));
        assert!(matches!(
            root.create_dir("a").await,
            Err(FsError::AlreadyExists)
        ));
    }

    #[tokio::test]
    async fn write_extends_overwrites_and_preserves() {
        let (_remote, fs) = fresh_fs().await;
        let root = fs.root();
        let file = root.create_file("f").await.unwrap();

        file.write(0, b"0123456789").await.unwrap();
        file.write(12, b"ABC").await.unwrap();
        let buf = file.read().await.unwrap();
        assert_eq!(buf.len(), 15);
        assert_eq!(&buf[0..10], b"0123456789");
        assert_eq!(&buf[10..12], b"\0\0");
        assert_eq!(&buf[12..15], b"ABC");

        file.write(2, b"xy").await.unwrap();
        let buf = file.read().await.unwrap();
        assert_eq!(&buf[0..6], b"01xy45");
        assert_eq!(&buf[12..15], b"ABC");
        assert_eq!(file.attributes().await.unwrap().size, 15);
    }

    #[tokio::test]
    async fn every_write_is_durable_remotely() {
        let (remote, fs) = fresh_fs().await;
        let root = fs.root();
        let file = root.create_file("f").await.unwrap();
        file.write(0, b"hello").await.unwrap();
        // No flush step exists; the remote already has the bytes.
        assert_eq!(remote.open_content(file.id()).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn failed_upload_fails_the_write_and_leaves_divergence() {
        let (remote, fs) = fresh_fs().await;
        let root = fs.root();
        let file = root.create_file("f").await.unwrap();
        file.write(0, b"old").await.unwrap();

        remote.fail_next("replace_content");
        let err = file.write(0, b"new").await;
        assert!(matches!(err, Err(FsError::RemoteUnavailable(_))));

        // Local buffer kept the mutation, remote kept the old bytes.
        assert_eq!(file.read().await.unwrap(), b"new");
        assert_eq!(remote.open_content(file.id()).await.unwrap(), b"old");
    }

    #[tokio::test]
    async fn rename_conflict_leaves_both_listings_unchanged() {
        let (_remote, fs) = fresh_fs().await;
        let root = fs.root();
        let dir = root.create_dir("d").await.unwrap();
        root.create_file("src").await.unwrap();
        dir.create_file("taken").await.unwrap();

        let root_before = root.list().await.unwrap();
        let dir_before = dir.list().await.unwrap();
        assert!(matches!(
            root.rename("src", &dir, "taken").await,
            Err(FsError::AlreadyExists)
        ));
        assert_eq!(root.list().await.unwrap(), root_before);
        assert_eq!(dir.list().await.unwrap(), dir_before);
    }

    #[tokio::test]
    async fn rename_moves_across_directories_keeping_id() {
        let (_remote, fs) = fresh_fs().await;
        let root = fs.root();
        let dir = root.create_dir("d").await.unwrap();
        let file = root.create_file("a").await.unwrap();
        file.write(0, b"payload").await.unwrap();
        let id = file.id().to_string();

        root.rename("a", &dir, "b").await.unwrap();
        assert!(matches!(root.lookup("a").await, Err(FsError::NotFound)));
        let moved = dir.lookup("b").await.unwrap();
        assert_eq!(moved.id(), id);
        match moved {
            Node::File(f) => assert_eq!(f.read().await.unwrap(), b"payload"),
            Node::Dir(_) => panic!("expected file"),
        }
    }

    #[tokio::test]
    async fn rename_to_same_name_in_place_is_a_noop() {
        let (_remote, fs) = fresh_fs().await;
        let root = fs.root();
        root.create_file("a").await.unwrap();
        root.rename("a", &root, "a").await.unwrap();
        assert!(root.lookup("a").await.is_ok());
    }

    #[tokio::test]
    async fn rename_of_absent_source_is_not_found_even_without_name_change() {
        let (_remote, fs) = fresh_fs().await;
        let root = fs.root();
        assert!(matches!(
            root.rename("ghost", &root, "ghost").await,
            Err(FsError::NotFound)
        ));
        let dir = root.create_dir("d").await.unwrap();
        assert!(matches!(
            root.rename("ghost", &dir, "ghost").await,
            Err(FsError::NotFound)
        ));
    }

    #[tokio::test]
    async fn write_at_unaddressable_offset_is_rejected() {
        let (remote, fs) = fresh_fs().await;
        let root = fs.root();
        let file = root.create_file("f").await.unwrap();
        file.write(0, b"old").await.unwrap();

        assert!(matches!(
            file.write(u64::MAX - 1, b"xy").await,
            Err(FsError::Unsupported(_))
        ));
        // Neither side moved: no splice locally, no upload remotely.
        assert_eq!(file.read().await.unwrap(), b"old");
        assert_eq!(remote.open_content(file.id()).await.unwrap(), b"old");
    }

    #[tokio::test]
    async fn remove_then_lookup_is_not_found_and_remove_again_too() {
        let (_remote, fs) = fresh_fs().await;
        let root = fs.root();
        root.create_file("a").await.unwrap();
        root.remove("a").await.unwrap();
        assert!(matches!(root.lookup("a").await, Err(FsError::NotFound)));
        assert!(matches!(root.remove("a").await, Err(FsError::NotFound)));
    }

    #[tokio::test]
    async fn failed_remote_delete_aborts_local_removal() {
        let (remote, fs) = fresh_fs().await;
        let root = fs.root();
        root.create_file("a").await.unwrap();

        remote.fail_next("delete");
        assert!(matches!(
            root.remove("a").await,
            Err(FsError::RemoteUnavailable(_))
        ));
        // The entry must still be visible locally and remotely.
        assert!(root.lookup("a").await.is_ok());
        root.remove("a").await.unwrap();
    }

    #[tokio::test]
    async fn failed_listing_refresh_keeps_last_known_good() {
        let (remote, fs) = fresh_fs().await;
        let root = fs.root();
        root.create_file("a").await.unwrap();
        let before = root.list().await.unwrap();

        // Force a refresh and make it fail: the old listing must survive.
        remote.create_file("b", "root").await.unwrap();
        let mut guard = fs.dirs.lock("root").await;
        guard.mark_stale();
        drop(guard);
        remote.fail_next("list_children");
        assert!(matches!(
            root.list().await,
            Err(FsError::RemoteUnavailable(_))
        ));
        // Next resolve succeeds and sees the remote-side state.
        let after = root.list().await.unwrap();
        assert!(after.len() > before.len());
    }

    #[tokio::test]
    async fn concurrent_creates_under_one_directory_both_land() {
        let (_remote, fs) = fresh_fs().await;
        let root = fs.root();
        let (a, b) = tokio::join!(root.create_file("left"), root.create_file("right"));
        a.unwrap();
        b.unwrap();
        let entries = root.list().await.unwrap();
        assert!(entries.iter().any(|e| e.name == "left"));
        assert!(entries.iter().any(|e| e.name == "right"));
    }

    #[tokio::test]
    async fn native_doc_stat_downloads_to_learn_size() {
        let (remote, fs) = fresh_fs().await;
        let export = b"exported document body";
        remote.seed_native_doc("root", "doc", export);
        let root = fs.root();

        let node = root.lookup("doc").await.unwrap();
        let attr = node.attributes().await.unwrap();
        assert_eq!(attr.size, export.len() as u64);

        // The side-effect fetch populated the buffer; a read is now local.
        match node {
            Node::File(f) => assert_eq!(f.read().await.unwrap(), export),
            Node::Dir(_) => panic!("expected file"),
        }
    }

    #[tokio::test]
    async fn ordinary_file_stat_uses_metadata_not_content() {
        let (remote, fs) = fresh_fs().await;
        let id = remote.create_file("f", "root").await.unwrap();
        remote.replace_content(&id, b"0123456789").await.unwrap();

        let root = fs.root();
        let node = root.lookup("f").await.unwrap();
        assert_eq!(node.attributes().await.unwrap().size, 10);
        // Content was not fetched just for the stat.
        match node {
            Node::File(f) => {
                assert!(fs.content.lock(f.id()).await.is_none());
            }
            Node::Dir(_) => panic!("expected file"),
        }
    }

    #[tokio::test]
    async fn new_file_answers_stat_and_read_without_remote_fetches() {
        let (remote, fs) = fresh_fs().await;
        let root = fs.root();
        let file = root.create_file("f").await.unwrap();

        // Buffer and size were installed at creation; neither path below may
        // reach the remote.
        remote.fail_next("get_metadata");
        remote.fail_next("open_content");
        assert_eq!(file.attributes().await.unwrap().size, 0);
        assert_eq!(file.read().await.unwrap(), b"");
    }

    /// Delegating remote whose `get_metadata` captures its reply, signals the
    /// test, then parks until released. Models a slow metadata response
    /// arriving after the local state has moved on.
    struct HeldMetadata {
        inner: MemoryRemote,
        entered: Arc<tokio::sync::Notify>,
        release: Arc<tokio::sync::Notify>,
    }

    #[async_trait::async_trait]
    impl RemoteStore for HeldMetadata {
        async fn root_id(&self) -> Result<ObjectId> {
            self.inner.root_id().await
        }

        async fn list_children(
            &self,
            dir_id: &str,
            page_token: Option<&str>,
        ) -> Result<crate::remote::ListPage> {
            self.inner.list_children(dir_id, page_token).await
        }

        async fn create_directory(&self, name: &str, parent_id: &str) -> Result<ObjectId> {
            self.inner.create_directory(name, parent_id).await
        }

        async fn create_file(&self, name: &str, parent_id: &str) -> Result<ObjectId> {
            self.inner.create_file(name, parent_id).await
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.inner.delete(id).await
        }

        async fn move_object(&self, id: &str, from_parent: &str, to_parent: &str) -> Result<()> {
            self.inner.move_object(id, from_parent, to_parent).await
        }

        async fn set_name(&self, id: &str, new_name: &str) -> Result<()> {
            self.inner.set_name(id, new_name).await
        }

        async fn get_metadata(&self, id: &str) -> Result<crate::remote::RemoteMetadata> {
            let reply = self.inner.get_metadata(id).await;
            self.entered.notify_one();
            self.release.notified().await;
            reply
        }

        async fn open_content(&self, id: &str) -> Result<Vec<u8>> {
            self.inner.open_content(id).await
        }

        async fn replace_content(&self, id: &str, data: &[u8]) -> Result<()> {
            self.inner.replace_content(id, data).await
        }
    }

    #[tokio::test]
    async fn stale_metadata_reply_does_not_clobber_a_newer_size() {
        let mem = MemoryRemote::new();
        let id = mem.create_file("f", "root").await.unwrap();
        mem.replace_content(&id, b"old").await.unwrap();

        let entered = Arc::new(tokio::sync::Notify::new());
        let release = Arc::new(tokio::sync::Notify::new());
        let remote = HeldMetadata {
            inner: mem,
            entered: entered.clone(),
            release: release.clone(),
        };
        let fs = DriveFs::new(remote).await.unwrap();
        let root = fs.root();
        let file = match root.lookup("f").await.unwrap() {
            Node::File(f) => f,
            Node::Dir(_) => panic!("expected file"),
        };

        // Stat takes the metadata path (no buffer, size unknown) and parks
        // inside get_metadata with a 3-byte reply in hand.
        let stat_fs = fs.clone();
        let stat = tokio::spawn(async move {
            let file = match stat_fs.root().lookup("f").await.unwrap() {
                Node::File(f) => f,
                Node::Dir(_) => panic!("expected file"),
            };
            file.attributes().await.unwrap()
        });
        entered.notified().await;

        // A write lands while the reply is in flight.
        file.write(0, b"hello world!").await.unwrap();
        release.notify_one();

        // The stale 3-byte reply must not win over the written size.
        let attr = stat.await.unwrap();
        assert_eq!(attr.size, 12);
        assert_eq!(file.attributes().await.unwrap().size, 12);
    }

    #[tokio::test]
    async fn end_to_end_create_write_read_rename() {
        let (_remote, fs) = fresh_fs().await;
        let root = fs.root();
        assert!(root.list().await.unwrap().is_empty());

        let file = root.create_file("a.txt").await.unwrap();
        let id = file.id().to_string();
        assert_eq!(file.attributes().await.unwrap().size, 0);

        file.write(0, b"hello").await.unwrap();
        assert_eq!(file.attributes().await.unwrap().size, 5);
        assert_eq!(file.read().await.unwrap(), b"hello");

        root.rename("a.txt", &root, "b.txt").await.unwrap();
        assert!(matches!(root.lookup("a.txt").await, Err(FsError::NotFound)));
        let renamed = root.lookup("b.txt").await.unwrap();
        assert_eq!(renamed.id(), id);
        match renamed {
            Node::File(f) => assert_eq!(f.read().await.unwrap(), b"hello"),
            Node::Dir(_) => panic!("expected file"),
        }
    }
}
