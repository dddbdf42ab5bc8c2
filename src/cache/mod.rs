//! In-memory caches over the remote store.
//!
//! Submodules:
//! - `dir`: per-directory listing cache with freshness tracking and per-id locks.
//! - `registry`: id -> metadata map answering attribute queries in O(1).
//! - `content`: per-file byte buffers and the splice helper for the write path.
//!
//! All three stores are process-wide shared state. Locking is always per-id:
//! each directory listing and each content buffer sits behind its own
//! `tokio::sync::Mutex`, so a stalled remote call only blocks operations on
//! that one id. Nothing here is ever evicted; memory grows with the set of
//! objects touched (documented limitation). Staleness is only ever set by
//! mutations this process performs itself; remote-side changes made by other
//! clients are invisible until a listing is refreshed for some other reason.

pub mod content;
pub mod dir;
pub mod registry;

pub use content::ContentStore;
pub use dir::{DirCache, DirEntry, DirListing};
pub use registry::{IdentityRegistry, ObjectMetadata};
