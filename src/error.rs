//! Error taxonomy shared by the cache layer, the node operations and the
//! FUSE boundary. A remote failure fails only the requesting operation;
//! caches keep their last-known-good state.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FsError>;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such file or directory")]
    NotFound,

    #[error("file exists")]
    AlreadyExists,

    #[error("not a directory")]
    NotADirectory,

    #[error("is a directory")]
    IsADirectory,

    #[error("directory not empty")]
    NotEmpty,

    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl FsError {
    /// Wrap a transport/API failure from the remote store.
    pub fn remote(err: impl std::fmt::Display) -> Self {
        FsError::RemoteUnavailable(err.to_string())
    }

    /// Errno used when surfacing this error through the mount boundary.
    pub fn errno(&self) -> libc::c_int {
        match self {
            FsError::NotFound => libc::ENOENT,
            FsError::AlreadyExists => libc::EEXIST,
            FsError::NotADirectory => libc::ENOTDIR,
            FsError::IsADirectory => libc::EISDIR,
            FsError::NotEmpty => libc::ENOTEMPTY,
            FsError::RemoteUnavailable(_) => libc::EIO,
            FsError::Unsupported(_) => libc::EOPNOTSUPP,
        }
    }
}
