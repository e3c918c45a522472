//! Copy primitives for single directory and file nodes.

use std::fs;
use std::io;
use std::path::Path;

use filetime::FileTime;

use crate::outcome::CopyOutcome;

/// Copies one node of a tree at a time.
///
/// Implementations never recurse: the caller decides which children follow.
pub trait CopyEntry {
    /// Create `target` as a directory mirroring `source`.
    fn copy_dir(&self, source: &Path, target: &Path) -> io::Result<CopyOutcome>;

    /// Copy the file `source` to `target`, replacing any existing file.
    fn copy_file(&self, source: &Path, target: &Path) -> io::Result<CopyOutcome>;

    /// Settle a directory after all of its children were handled.
    fn finish_dir(&self, _source: &Path, _target: &Path) -> io::Result<()> {
        Ok(())
    }
}

impl<C: CopyEntry + ?Sized> CopyEntry for &C {
    fn copy_dir(&self, source: &Path, target: &Path) -> io::Result<CopyOutcome> {
        (**self).copy_dir(source, target)
    }

    fn copy_file(&self, source: &Path, target: &Path) -> io::Result<CopyOutcome> {
        (**self).copy_file(source, target)
    }

    fn finish_dir(&self, source: &Path, target: &Path) -> io::Result<()> {
        (**self).finish_dir(source, target)
    }
}

/// Writes to the real file system, keeping permissions and timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCopier;

impl FsCopier {
    pub fn new() -> Self {
        Self
    }
}

impl CopyEntry for FsCopier {
    /// Directory permissions and times are applied by
    /// [`finish_dir`](CopyEntry::finish_dir) once the children are in place.
    fn copy_dir(&self, source: &Path, target: &Path) -> io::Result<CopyOutcome> {
        fs::metadata(source)?;

        match fs::create_dir(target) {
            Ok(()) => Ok(CopyOutcome::Copied { bytes: 0 }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let existing = fs::symlink_metadata(target)?;
                if existing.is_dir() {
                    tracing::debug!(path = %target.display(), "directory already present");
                    make_writable(target, &existing)?;
                    return Ok(CopyOutcome::AlreadyPresent);
                }
                // A plain file is in the way; replace it.
                fs::remove_file(target)?;
                fs::create_dir(target)?;
                Ok(CopyOutcome::Copied { bytes: 0 })
            }
            Err(e) => Err(e),
        }
    }

    fn copy_file(&self, source: &Path, target: &Path) -> io::Result<CopyOutcome> {
        let metadata = fs::metadata(source)?;

        // fs::copy opens the target for writing, which fails on a read-only
        // file left by an earlier run.
        match fs::symlink_metadata(target) {
            Ok(existing) if !existing.is_dir() => fs::remove_file(target)?,
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let bytes = fs::copy(source, target)?;
        apply_metadata(&metadata, target)?;
        Ok(CopyOutcome::Copied { bytes })
    }

    fn finish_dir(&self, source: &Path, target: &Path) -> io::Result<()> {
        let metadata = fs::metadata(source)?;
        apply_metadata(&metadata, target)
    }
}

/// Copy permission bits and access/modification times onto `target`.
fn apply_metadata(metadata: &fs::Metadata, target: &Path) -> io::Result<()> {
    fs::set_permissions(target, metadata.permissions())?;
    let atime = FileTime::from_last_access_time(metadata);
    let mtime = FileTime::from_last_modification_time(metadata);
    filetime::set_file_times(target, atime, mtime)
}

/// Give the owner write access to a directory mirrored from a read-only one.
#[cfg(unix)]
fn make_writable(target: &Path, metadata: &fs::Metadata) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = metadata.permissions();
    let mode = permissions.mode();
    if mode & 0o200 == 0 {
        permissions.set_mode(mode | 0o200);
        fs::set_permissions(target, permissions)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn make_writable(_target: &Path, _metadata: &fs::Metadata) -> io::Result<()> {
    Ok(())
}

/// Records nothing and touches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunCopier;

impl DryRunCopier {
    pub fn new() -> Self {
        Self
    }
}

impl CopyEntry for DryRunCopier {
    fn copy_dir(&self, _source: &Path, target: &Path) -> io::Result<CopyOutcome> {
        tracing::debug!(path = %target.display(), "would create directory");
        Ok(CopyOutcome::Planned)
    }

    fn copy_file(&self, _source: &Path, target: &Path) -> io::Result<CopyOutcome> {
        tracing::debug!(path = %target.display(), "would copy file");
        Ok(CopyOutcome::Planned)
    }
}
