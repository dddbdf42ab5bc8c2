//! In-memory remote store: a complete mock drive for tests and demos.
//!
//! Behaves like the real API surface: opaque ids, paginated listings (20
//! entries per page, matching the production page size), native documents
//! that only expose exported bytes, and injectable per-call failures so the
//! error paths of the cache layer can be exercised.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{FsError, Result};
use crate::remote::client::{ListPage, ObjectId, ObjectKind, RemoteEntry, RemoteMetadata, RemoteStore};

use async_trait::async_trait;

const ROOT_ID: &str = "root";
const PAGE_SIZE: usize = 20;

struct MemObject {
    name: String,
    parent: Option<ObjectId>,
    kind: ObjectKind,
    native_doc: bool,
    content: Vec<u8>,
}

struct Inner {
    objects: Mutex<HashMap<ObjectId, MemObject>>,
    fail_next: Mutex<HashSet<String>>,
    next_id: AtomicU64,
    list_calls: AtomicUsize,
}

/// Cheaply clonable handle; all clones share the same drive state, so tests
/// can keep one handle for injection/inspection after moving another into
/// the filesystem.
#[derive(Clone)]
pub struct MemoryRemote {
    inner: Arc<Inner>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        let mut objects = HashMap::new();
        objects.insert(
            ROOT_ID.to_string(),
            MemObject {
                name: "/".to_string(),
                parent: None,
                kind: ObjectKind::Directory,
                native_doc: false,
                content: Vec::new(),
            },
        );
        Self {
            inner: Arc::new(Inner {
                objects: Mutex::new(objects),
                fail_next: Mutex::new(HashSet::new()),
                next_id: AtomicU64::new(1),
                list_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Make the next call to the named operation fail with RemoteUnavailable.
    pub fn fail_next(&self, op: &str) {
        self.inner.fail_next.lock().unwrap().insert(op.to_string());
    }

    /// Number of `list_children` calls served so far (one per page).
    pub fn list_calls(&self) -> usize {
        self.inner.list_calls.load(Ordering::SeqCst)
    }

    /// Seed a native document whose exported representation is `export`.
    /// Metadata on it reports no byte size.
    pub fn seed_native_doc(&self, parent_id: &str, name: &str, export: &[u8]) -> ObjectId {
        let id = self.alloc_id();
        self.inner.objects.lock().unwrap().insert(
            id.clone(),
            MemObject {
                name: name.to_string(),
                parent: Some(parent_id.to_string()),
                kind: ObjectKind::File,
                native_doc: true,
                content: export.to_vec(),
            },
        );
        id
    }

    fn alloc_id(&self) -> ObjectId {
        let n = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        format!("obj-{n:04}")
    }

    fn check_fail(&self, op: &str) -> Result<()> {
        if self.inner.fail_next.lock().unwrap().remove(op) {
            return Err(FsError::remote(format!("injected {op} failure")));
        }
        Ok(())
    }

    fn create_object(&self, name: &str, parent_id: &str, kind: ObjectKind) -> Result<ObjectId> {
        let id = self.alloc_id();
        let mut objects = self.inner.objects.lock().unwrap();
        if !objects.contains_key(parent_id) {
            return Err(FsError::NotFound);
        }
        objects.insert(
            id.clone(),
            MemObject {
                name: name.to_string(),
                parent: Some(parent_id.to_string()),
                kind,
                native_doc: false,
                content: Vec::new(),
            },
        );
        Ok(id)
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn root_id(&self) -> Result<ObjectId> {
        self.check_fail("root_id")?;
        Ok(ROOT_ID.to_string())
    }

    async fn list_children(&self, dir_id: &str, page_token: Option<&str>) -> Result<ListPage> {
        self.inner.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail("list_children")?;
        let objects = self.inner.objects.lock().unwrap();
        match objects.get(dir_id) {
            Some(o) if o.kind == ObjectKind::Directory => {}
            Some(_) => return Err(FsError::NotADirectory),
            None => return Err(FsError::NotFound),
        }
        let mut children: Vec<RemoteEntry> = objects
            .iter()
            .filter(|(_, o)| o.parent.as_deref() == Some(dir_id))
            .map(|(id, o)| RemoteEntry {
                id: id.clone(),
                name: o.name.clone(),
                kind: o.kind,
                native_doc: o.native_doc,
            })
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));

        let start: usize = match page_token {
            None => 0,
            Some(t) => t
                .parse()
                .map_err(|_| FsError::remote(format!("bad page token {t:?}")))?,
        };
        let end = (start + PAGE_SIZE).min(children.len());
        let next = (end < children.len()).then(|| end.to_string());
        Ok(ListPage {
            entries: children.get(start..end).unwrap_or(&[]).to_vec(),
            next,
        })
    }

    async fn create_directory(&self, name: &str, parent_id: &str) -> Result<ObjectId> {
        self.check_fail("create_directory")?;
        self.create_object(name, parent_id, ObjectKind::Directory)
    }

    async fn create_file(&self, name: &str, parent_id: &str) -> Result<ObjectId> {
        self.check_fail("create_file")?;
        self.create_object(name, parent_id, ObjectKind::File)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.check_fail("delete")?;
        let mut objects = self.inner.objects.lock().unwrap();
        if objects.remove(id).is_none() {
            return Err(FsError::NotFound);
        }
        // The remote deletes a directory's subtree with it.
        let mut doomed: Vec<ObjectId> = vec![id.to_string()];
        while let Some(gone) = doomed.pop() {
            let orphans: Vec<ObjectId> = objects
                .iter()
                .filter(|(_, o)| o.parent.as_deref() == Some(gone.as_str()))
                .map(|(cid, _)| cid.clone())
                .collect();
            for cid in orphans {
                objects.remove(&cid);
                doomed.push(cid);
            }
        }
        Ok(())
    }

    async fn move_object(&self, id: &str, from_parent: &str, to_parent: &str) -> Result<()> {
        self.check_fail("move_object")?;
        if from_parent == to_parent {
            return Ok(());
        }
        let mut objects = self.inner.objects.lock().unwrap();
        if !objects.contains_key(to_parent) {
            return Err(FsError::NotFound);
        }
        let obj = objects.get_mut(id).ok_or(FsError::NotFound)?;
        obj.parent = Some(to_parent.to_string());
        Ok(())
    }

    async fn set_name(&self, id: &str, new_name: &str) -> Result<()> {
        self.check_fail("set_name")?;
        let mut objects = self.inner.objects.lock().unwrap();
        let obj = objects.get_mut(id).ok_or(FsError::NotFound)?;
        obj.name = new_name.to_string();
        Ok(())
    }

    async fn get_metadata(&self, id: &str) -> Result<RemoteMetadata> {
        self.check_fail("get_metadata")?;
        let objects = self.inner.objects.lock().unwrap();
        let obj = objects.get(id).ok_or(FsError::NotFound)?;
        Ok(RemoteMetadata {
            name: obj.name.clone(),
            kind: obj.kind,
            // Native documents have no fixed byte representation.
            size: (!obj.native_doc).then(|| obj.content.len() as u64),
            native_doc: obj.native_doc,
        })
    }

    async fn open_content(&self, id: &str) -> Result<Vec<u8>> {
        self.check_fail("open_content")?;
        let objects = self.inner.objects.lock().unwrap();
        let obj = objects.get(id).ok_or(FsError::NotFound)?;
        if obj.kind == ObjectKind::Directory {
            return Err(FsError::IsADirectory);
        }
        // For native docs this is the export path; for ordinary files, raw bytes.
        Ok(obj.content.clone())
    }

    async fn replace_content(&self, id: &str, data: &[u8]) -> Result<()> {
        self.check_fail("replace_content")?;
        let mut objects = self.inner.objects.lock().unwrap();
        let obj = objects.get_mut(id).ok_or(FsError::NotFound)?;
        if obj.kind == ObjectKind::Directory {
            return Err(FsError::IsADirectory);
        }
        obj.content = data.to_vec();
        Ok(())
    }
}
