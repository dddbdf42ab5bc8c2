//! FUSE adapter and request handling
//!
//! Implements the rfuse3 `Filesystem` trait over `DriveFs`, translating
//! kernel requests into node operations and the error taxonomy into errnos.
//! IO is stateless: open/opendir hand out fh=0 and release/flush/fsync are
//! no-ops, because every successful write is already durable remotely before
//! the write call returns.
//!
//! Main components:
//! - `DriveFuse`: the mountable wrapper around a `DriveFs`.
//! - `mount`: helpers for unprivileged mounts.
//! - Attribute and file type conversion between node and FUSE representations.

pub mod mount;

use crate::error::FsError;
use crate::remote::{ObjectKind, RemoteStore};
use crate::vfs::fs::{DriveFs, ROOT_INO};
use crate::vfs::node::{DirNode, FileNode, Node, NodeAttr};
use bytes::Bytes;
use log::debug;
use rfuse3::Result as FuseResult;
use rfuse3::raw::Request;
use rfuse3::raw::reply::{
    DirectoryEntry, DirectoryEntryPlus, ReplyAttr, ReplyCreated, ReplyData, ReplyDirectory,
    ReplyDirectoryPlus, ReplyEntry, ReplyInit, ReplyOpen, ReplyStatFs, ReplyWrite,
};
use std::ffi::{OsStr, OsString};
use std::num::NonZeroU32;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures_util::stream::{self, Stream};
use rfuse3::raw::Filesystem;
use rfuse3::{FileType as FuseFileType, SetAttr, Timestamp};

const TTL: Duration = Duration::from_secs(1);

/// Mountable view over a `DriveFs`.
pub struct DriveFuse<R: RemoteStore> {
    fs: Arc<DriveFs<R>>,
}

impl<R: RemoteStore> DriveFuse<R> {
    pub fn new(fs: Arc<DriveFs<R>>) -> Self {
        Self { fs }
    }

    async fn node_at(&self, ino: u64) -> FuseResult<Node<R>> {
        let Some((id, kind)) = self.fs.id_for_ino(ino).await else {
            return Err(libc::ENOENT.into());
        };
        Ok(Node::new(self.fs.clone(), id, kind))
    }

    async fn dir_at(&self, ino: u64) -> FuseResult<DirNode<R>> {
        match self.node_at(ino).await? {
            Node::Dir(dir) => Ok(dir),
            Node::File(_) => Err(libc::ENOTDIR.into()),
        }
    }

    async fn file_at(&self, ino: u64) -> FuseResult<FileNode<R>> {
        match self.node_at(ino).await? {
            Node::Dir(_) => Err(libc::EISDIR.into()),
            Node::File(file) => Ok(file),
        }
    }

    /// Inode of a directory's recorded parent; the root is its own parent.
    async fn parent_ino(&self, dir: &DirNode<R>) -> u64 {
        match self.fs.registry.get(dir.id()).await.and_then(|m| m.parent) {
            Some(parent_id) => self.fs.ino(&parent_id),
            None => ROOT_INO,
        }
    }
}

fn errno(err: FsError) -> rfuse3::Errno {
    err.errno().into()
}

impl<R> Filesystem for DriveFuse<R>
where
    R: RemoteStore + 'static,
{
    type DirEntryStream<'a>
        = Pin<Box<dyn Stream<Item = FuseResult<DirectoryEntry>> + Send + 'a>>
    where
        Self: 'a;

    type DirEntryPlusStream<'a>
        = Pin<Box<dyn Stream<Item = FuseResult<DirectoryEntryPlus>> + Send + 'a>>
    where
        Self: 'a;

    async fn init(&self, _req: Request) -> FuseResult<ReplyInit> {
        // Whole files travel through memory anyway; 1MiB per write is plenty.
        let max_write = NonZeroU32::new(1024 * 1024).unwrap();
        Ok(ReplyInit { max_write })
    }

    async fn destroy(&self, _req: Request) {}

    async fn lookup(&self, req: Request, parent: u64, name: &OsStr) -> FuseResult<ReplyEntry> {
        let dir = self.dir_at(parent).await?;
        let node = dir.lookup(&name.to_string_lossy()).await.map_err(errno)?;
        let attr = node.attributes().await.map_err(errno)?;
        Ok(ReplyEntry {
            ttl: TTL,
            attr: node_to_fuse_attr(&attr, &req),
            generation: 0,
        })
    }

    async fn getattr(
        &self,
        req: Request,
        ino: u64,
        _fh: Option<u64>,
        _flags: u32,
    ) -> FuseResult<ReplyAttr> {
        let node = self.node_at(ino).await?;
        let attr = node.attributes().await.map_err(errno)?;
        Ok(ReplyAttr {
            ttl: TTL,
            attr: node_to_fuse_attr(&attr, &req),
        })
    }

    async fn setattr(
        &self,
        req: Request,
        ino: u64,
        _fh: Option<u64>,
        set_attr: SetAttr,
    ) -> FuseResult<ReplyAttr> {
        let node = self.node_at(ino).await?;
        let attr = node.attributes().await.map_err(errno)?;
        if let Some(size) = set_attr.size {
            // The remote protocol has no truncate; only a size change that
            // matches the current length (e.g. O_TRUNC on an empty file) is
            // accepted.
            if size != attr.size {
                return Err(libc::EOPNOTSUPP.into());
            }
        }
        Ok(ReplyAttr {
            ttl: TTL,
            attr: node_to_fuse_attr(&attr, &req),
        })
    }

    // Stateless IO: handles carry no server-side state.
    async fn open(&self, _req: Request, ino: u64, _flags: u32) -> FuseResult<ReplyOpen> {
        self.file_at(ino).await?;
        Ok(ReplyOpen { fh: 0, flags: 0 })
    }

    async fn opendir(&self, _req: Request, ino: u64, _flags: u32) -> FuseResult<ReplyOpen> {
        self.dir_at(ino).await?;
        Ok(ReplyOpen { fh: 0, flags: 0 })
    }

    async fn read(
        &self,
        _req: Request,
        ino: u64,
        _fh: u64,
        offset: u64,
        size: u32,
    ) -> FuseResult<ReplyData> {
        let file = self.file_at(ino).await?;
        let buf = file.read().await.map_err(errno)?;
        let start = (offset as usize).min(buf.len());
        let end = (start + size as usize).min(buf.len());
        Ok(ReplyData {
            data: Bytes::copy_from_slice(&buf[start..end]),
        })
    }

    async fn write(
        &self,
        _req: Request,
        ino: u64,
        _fh: u64,
        offset: u64,
        data: &[u8],
        _write_flags: u32,
        _flags: u32,
    ) -> FuseResult<ReplyWrite> {
        let file = self.file_at(ino).await?;
        let written = file.write(offset, data).await.map_err(errno)? as u32;
        Ok(ReplyWrite { written })
    }

    async fn readdir<'a>(
        &'a self,
        _req: Request,
        ino: u64,
        _fh: u64,
        offset: i64,
    ) -> FuseResult<ReplyDirectory<Self::DirEntryStream<'a>>> {
        let dir = self.dir_at(ino).await?;
        let entries = dir.list().await.map_err(errno)?;

        // "." and ".." first; offset is the offset of the previous entry.
        let mut all: Vec<DirectoryEntry> = Vec::with_capacity(entries.len() + 2);
        all.push(DirectoryEntry {
            inode: ino,
            kind: FuseFileType::Directory,
            name: OsString::from("."),
            offset: 1,
        });
        all.push(DirectoryEntry {
            inode: self.parent_ino(&dir).await,
            kind: FuseFileType::Directory,
            name: OsString::from(".."),
            offset: 2,
        });
        for (i, entry) in entries.iter().enumerate() {
            all.push(DirectoryEntry {
                inode: self.fs.ino(&entry.id),
                kind: kind_to_fuse(entry.kind),
                name: OsString::from(entry.name.clone()),
                offset: (i as i64) + 3,
            });
        }

        let start = if offset <= 0 { 0 } else { offset as usize };
        let slice = if start >= all.len() {
            Vec::new()
        } else {
            all[start..].to_vec()
        };
        let boxed: Self::DirEntryStream<'a> = Box::pin(stream::iter(slice.into_iter().map(Ok)));
        Ok(ReplyDirectory { entries: boxed })
    }

    async fn readdirplus<'a>(
        &'a self,
        req: Request,
        ino: u64,
        _fh: u64,
        offset: u64,
        _lock_owner: u64,
    ) -> FuseResult<ReplyDirectoryPlus<Self::DirEntryPlusStream<'a>>> {
        let dir = self.dir_at(ino).await?;
        let entries = dir.list().await.map_err(errno)?;
        let dir_attr = dir.attributes();

        let mut all: Vec<DirectoryEntryPlus> = Vec::with_capacity(entries.len() + 2);
        all.push(DirectoryEntryPlus {
            inode: ino,
            generation: 0,
            kind: FuseFileType::Directory,
            name: OsString::from("."),
            offset: 1,
            attr: node_to_fuse_attr(&dir_attr, &req),
            entry_ttl: TTL,
            attr_ttl: TTL,
        });
        let parent_ino = self.parent_ino(&dir).await;
        all.push(DirectoryEntryPlus {
            inode: parent_ino,
            generation: 0,
            kind: FuseFileType::Directory,
            name: OsString::from(".."),
            offset: 2,
            attr: node_to_fuse_attr(
                &NodeAttr {
                    ino: parent_ino,
                    size: 0,
                    kind: ObjectKind::Directory,
                },
                &req,
            ),
            entry_ttl: TTL,
            attr_ttl: TTL,
        });
        for entry in &entries {
            let node = Node::new(self.fs.clone(), entry.id.clone(), entry.kind);
            // Note: stat of a native document may trigger a content fetch.
            let Ok(attr) = node.attributes().await else {
                debug!("readdirplus: skipping {} (attr fetch failed)", entry.name);
                continue;
            };
            // Offsets number the emitted entries, not the listing positions:
            // a skipped entry must not leave a hole a resume could land in.
            let offset = (all.len() as i64) + 1;
            all.push(DirectoryEntryPlus {
                inode: attr.ino,
                generation: 0,
                kind: kind_to_fuse(entry.kind),
                name: OsString::from(entry.name.clone()),
                offset,
                attr: node_to_fuse_attr(&attr, &req),
                entry_ttl: TTL,
                attr_ttl: TTL,
            });
        }

        let start = if offset == 0 { 0 } else { offset as usize };
        let slice = if start >= all.len() {
            Vec::new()
        } else {
            all[start..].to_vec()
        };
        let boxed: Self::DirEntryPlusStream<'a> = Box::pin(stream::iter(slice.into_iter().map(Ok)));
        Ok(ReplyDirectoryPlus { entries: boxed })
    }

    async fn mkdir(
        &self,
        req: Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
    ) -> FuseResult<ReplyEntry> {
        let dir = self.dir_at(parent).await?;
        let created = dir
            .create_dir(&name.to_string_lossy())
            .await
            .map_err(errno)?;
        Ok(ReplyEntry {
            ttl: TTL,
            attr: node_to_fuse_attr(&created.attributes(), &req),
            generation: 0,
        })
    }

    async fn create(
        &self,
        req: Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _flags: u32,
    ) -> FuseResult<ReplyCreated> {
        let dir = self.dir_at(parent).await?;
        let created = dir
            .create_file(&name.to_string_lossy())
            .await
            .map_err(errno)?;
        let attr = created.attributes().await.map_err(errno)?;
        Ok(ReplyCreated {
            ttl: TTL,
            attr: node_to_fuse_attr(&attr, &req),
            generation: 0,
            fh: 0,
            flags: 0,
        })
    }

    async fn unlink(&self, _req: Request, parent: u64, name: &OsStr) -> FuseResult<()> {
        let dir = self.dir_at(parent).await?;
        let name = name.to_string_lossy();
        match dir.lookup(&name).await.map_err(errno)? {
            Node::Dir(_) => Err(libc::EISDIR.into()),
            Node::File(_) => dir.remove(&name).await.map_err(errno),
        }
    }

    async fn rmdir(&self, _req: Request, parent: u64, name: &OsStr) -> FuseResult<()> {
        let dir = self.dir_at(parent).await?;
        let name = name.to_string_lossy();
        let child = match dir.lookup(&name).await.map_err(errno)? {
            Node::File(_) => return Err(libc::ENOTDIR.into()),
            Node::Dir(child) => child,
        };
        if !child.list().await.map_err(errno)?.is_empty() {
            return Err(errno(FsError::NotEmpty));
        }
        dir.remove(&name).await.map_err(errno)
    }

    async fn rename(
        &self,
        _req: Request,
        parent: u64,
        name: &OsStr,
        new_parent: u64,
        new_name: &OsStr,
    ) -> FuseResult<()> {
        let src = self.dir_at(parent).await?;
        let dst = self.dir_at(new_parent).await?;
        src.rename(&name.to_string_lossy(), &dst, &new_name.to_string_lossy())
            .await
            .map_err(errno)
    }

    async fn statfs(&self, _req: Request, _ino: u64) -> FuseResult<ReplyStatFs> {
        // The remote exposes no capacity numbers; report conservative
        // constants.
        Ok(ReplyStatFs {
            blocks: 0,
            bfree: 0,
            bavail: 0,
            files: 0,
            ffree: u64::MAX,
            bsize: 4096,
            namelen: 255,
            frsize: 4096,
        })
    }

    // ===== stateless handle/sync surface: nothing to release or drain =====

    async fn release(
        &self,
        _req: Request,
        _inode: u64,
        _fh: u64,
        _flags: u32,
        _lock_owner: u64,
        _flush: bool,
    ) -> FuseResult<()> {
        Ok(())
    }

    async fn flush(&self, _req: Request, _inode: u64, _fh: u64, _lock_owner: u64) -> FuseResult<()> {
        Ok(())
    }

    async fn fsync(&self, _req: Request, _inode: u64, _fh: u64, _datasync: bool) -> FuseResult<()> {
        Ok(())
    }

    async fn releasedir(&self, _req: Request, _inode: u64, _fh: u64, _flags: u32) -> FuseResult<()> {
        Ok(())
    }

    async fn fsyncdir(
        &self,
        _req: Request,
        _inode: u64,
        _fh: u64,
        _datasync: bool,
    ) -> FuseResult<()> {
        Ok(())
    }

    async fn forget(&self, _req: Request, _inode: u64, _nlookup: u64) {}

    async fn batch_forget(&self, _req: Request, _inodes: &[(u64, u64)]) {}

    async fn interrupt(&self, _req: Request, _unique: u64) -> FuseResult<()> {
        Ok(())
    }
}

// =============== helpers ===============

fn kind_to_fuse(kind: ObjectKind) -> FuseFileType {
    match kind {
        ObjectKind::Directory => FuseFileType::Directory,
        ObjectKind::File => FuseFileType::RegularFile,
    }
}

fn node_to_fuse_attr(attr: &NodeAttr, req: &Request) -> rfuse3::raw::reply::FileAttr {
    // The remote keeps no POSIX times or modes; use now and fixed perms.
    let now = Timestamp::from(SystemTime::now());
    let perm = match attr.kind {
        ObjectKind::Directory => 0o755,
        ObjectKind::File => 0o644,
    } as u16;
    let blocks = attr.size.div_ceil(512);
    rfuse3::raw::reply::FileAttr {
        ino: attr.ino,
        size: attr.size,
        blocks,
        atime: now,
        mtime: now,
        ctime: now,
        #[cfg(target_os = "macos")]
        crtime: now,
        kind: kind_to_fuse(attr.kind),
        perm,
        nlink: 1,
        uid: req.uid,
        gid: req.gid,
        rdev: 0,
        #[cfg(target_os = "macos")]
        flags: 0,
        blksize: 4096,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryRemote;
    use futures_util::StreamExt;

    fn kernel_req() -> Request {
        Request {
            unique: 0,
            uid: 0,
            gid: 0,
            pid: 0,
        }
    }

    async fn drain_plus(
        fuse: &DriveFuse<MemoryRemote>,
        offset: u64,
    ) -> (Vec<String>, Vec<i64>) {
        let reply = fuse
            .readdirplus(kernel_req(), ROOT_INO, 0, offset, 0)
            .await
            .unwrap();
        let mut entries = reply.entries;
        let mut names = Vec::new();
        let mut offsets = Vec::new();
        while let Some(entry) = entries.next().await {
            let entry = entry.unwrap();
            names.push(entry.name.to_string_lossy().into_owned());
            offsets.push(entry.offset);
        }
        (names, offsets)
    }

    #[tokio::test]
    async fn readdirplus_offsets_number_emitted_entries() {
        let remote = MemoryRemote::new();
        remote.create_file("aaa", "root").await.unwrap();
        // Sorted between the two ordinary files; its stat needs a content
        // download, which is made to fail so the entry is skipped.
        remote.seed_native_doc("root", "mmm", b"body");
        remote.create_file("zzz", "root").await.unwrap();
        let fs = DriveFs::new(remote.clone()).await.unwrap();
        let fuse = DriveFuse::new(fs);

        remote.fail_next("open_content");
        let (names, offsets) = drain_plus(&fuse, 0).await;
        assert_eq!(names, [".", "..", "aaa", "zzz"]);
        // Offsets stay contiguous across the skip, so a resume at the last
        // offset neither repeats nor drops an entry.
        assert_eq!(offsets, [1, 2, 3, 4]);

        remote.fail_next("open_content");
        let (resumed, _) = drain_plus(&fuse, 4).await;
        assert!(resumed.is_empty());
    }
}
