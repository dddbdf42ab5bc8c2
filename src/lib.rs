//! cirrusfs: a remote hierarchical object store (directories and files
//! addressed by opaque ids) exposed as a POSIX-like tree over FUSE, with an
//! in-memory cache of directory structure and file content in front of the
//! remote API.

pub mod cache;
pub mod error;
pub mod fuse;
pub mod remote;
pub mod vfs;
