//! Per-file content buffers.
//!
//! A buffer appears the first time a file's content is fetched or written and
//! then serves every later read and write; it is never evicted. Each buffer
//! sits behind its own lock, held for the whole read-modify-write-upload
//! sequence so concurrent writers to the same file serialize while unrelated
//! files proceed.
//!
//! `splice` implements the write grammar: zero-extend to cover the write,
//! then overwrite the range. The caller re-uploads the entire buffer
//! afterwards; one write costs one full upload, which is only reasonable for
//! small files (known limitation).

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::error::{FsError, Result};
use crate::remote::ObjectId;

/// `None` until the first fetch or write populates the buffer.
pub type Buffer = Option<Vec<u8>>;

#[derive(Default)]
pub struct ContentStore {
    slots: RwLock<HashMap<ObjectId, Arc<Mutex<Buffer>>>>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock one file's buffer; held across fetch, mutation and upload.
    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<Buffer> {
        let slot = {
            if let Some(slot) = self.slots.read().await.get(id) {
                slot.clone()
            } else {
                self.slots
                    .write()
                    .await
                    .entry(id.to_string())
                    .or_default()
                    .clone()
            }
        };
        slot.lock_owned().await
    }

    /// Drop the buffer of a removed object.
    pub async fn forget(&self, id: &str) {
        self.slots.write().await.remove(id);
    }
}

/// Overwrite `buf[offset..offset + data.len()]`, zero-extending the buffer
/// first if the write reaches past the current end. A write whose end does
/// not fit in the address space is rejected, leaving `buf` untouched.
pub fn splice(buf: &mut Vec<u8>, offset: u64, data: &[u8]) -> Result<()> {
    let end = usize::try_from(offset)
        .ok()
        .and_then(|o| o.checked_add(data.len()))
        .ok_or_else(|| FsError::Unsupported("write extends past addressable range".to_string()))?;
    let offset = end - data.len();
    if end > buf.len() {
        buf.resize(end, 0);
    }
    buf[offset..end].copy_from_slice(data);
    Ok(())
}
