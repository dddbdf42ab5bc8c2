//! Remote store adapter
//!
//! Submodules:
//! - `client`: the `RemoteStore` trait consumed by the cache and node layers,
//!   plus pagination helpers.
//! - `memory`: a complete in-memory remote used by tests and the demo mount.
//!
//! Responsibilities summary:
//! - Present the remote drive as an async API over opaque object ids:
//!   paginated child listing, create/delete/move/rename, metadata fetch and
//!   whole-object content read/write.
//! - Credential handling and the HTTP wire format live behind concrete
//!   implementations of the trait; the core never sees them.

pub mod client;
pub mod memory;

pub use client::{ListPage, ObjectId, ObjectKind, RemoteEntry, RemoteMetadata, RemoteStore};
pub use memory::MemoryRemote;
