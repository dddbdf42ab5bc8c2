//! Mount helpers for starting/stopping FUSE
//!
//! Notes:
//! - Only supported on Unix-like systems. On Linux we support unprivileged
//!   mount via fusermount3.
//! - These helpers are thin wrappers over rfuse3 raw Session APIs.

use std::path::Path;

use rfuse3::MountOptions;

use crate::fuse::DriveFuse;
use crate::remote::RemoteStore;

/// Build default mount options for cirrusfs.
fn default_mount_options() -> MountOptions {
    let mut mo = MountOptions::default();
    mo.fs_name("cirrusfs");
    // Keep defaults conservative: no allow_other, require empty mountpoint.
    mo
}

/// Mount a `DriveFuse` at the given empty directory using unprivileged mode
/// when available.
#[cfg(target_os = "linux")]
pub async fn mount_unprivileged<R>(
    fs: DriveFuse<R>,
    mount_point: impl AsRef<Path>,
) -> std::io::Result<rfuse3::raw::MountHandle>
where
    R: RemoteStore + 'static,
{
    let opts = default_mount_options();
    let session = rfuse3::raw::Session::new(opts);
    // Prefer unprivileged mount on Linux (requires fusermount3 in PATH)
    session.mount_with_unprivileged(fs, mount_point).await
}

/// Fallback stub for non-Linux targets.
#[cfg(not(target_os = "linux"))]
pub async fn mount_unprivileged<R>(
    _fs: DriveFuse<R>,
    _mount_point: impl AsRef<Path>,
) -> std::io::Result<rfuse3::raw::MountHandle>
where
    R: RemoteStore + 'static,
{
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "FUSE mount is only supported on Linux in this build",
    ))
}
