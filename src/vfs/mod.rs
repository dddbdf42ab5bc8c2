//! Virtual filesystem layer over the remote store.
//!
//! `DriveFs` composes the remote client with the three in-memory stores
//! (directory cache, identity registry, content buffers) and hands out
//! `Node`s — the Directory/File operation set the mount boundary drives.
//!
//! Submodules:
//! - `fs`: `DriveFs` itself plus resolve/refresh plumbing and inode mapping.
//! - `node`: the `Node`/`DirNode`/`FileNode` operation set.
//! - `demo`: an end-to-end exercise against the in-memory remote.

pub mod demo;
pub mod fs;
pub mod node;

pub use fs::DriveFs;
pub use node::{DirNode, FileNode, Node, NodeAttr};
