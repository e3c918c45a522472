//! Integration tests for dicomcopy-ops.

use std::fs;
use std::path::Path;

use dicomcopy_ops::{CopyEntry, CopyOutcome, DryRunCopier, FsCopier};
use tempfile::TempDir;

/// Mirror a two-level tree node by node, parents first.
fn mirror(copier: &dyn CopyEntry, source: &Path, target: &Path) -> u64 {
    let mut bytes = copier.copy_dir(source, target).unwrap().bytes();
    for entry in fs::read_dir(source).unwrap() {
        let path = entry.unwrap().path();
        let dest = target.join(path.file_name().unwrap());
        bytes += if path.is_dir() {
            mirror(copier, &path, &dest)
        } else {
            copier.copy_file(&path, &dest).unwrap().bytes()
        };
    }
    copier.finish_dir(source, target).unwrap();
    bytes
}

#[test]
fn test_node_by_node_mirror() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("study");
    fs::create_dir_all(source.join("s1")).unwrap();
    fs::write(source.join("s1/i1.MRDC.1"), vec![7u8; 300]).unwrap();
    fs::write(source.join("s1/i2.MRDC.2"), vec![9u8; 200]).unwrap();
    let target = temp.path().join("copy");

    let bytes = mirror(&FsCopier::new(), &source, &target);

    assert_eq!(bytes, 500);
    assert_eq!(fs::read(target.join("s1/i1.MRDC.1")).unwrap(), vec![7u8; 300]);
    assert_eq!(fs::read(target.join("s1/i2.MRDC.2")).unwrap().len(), 200);

    // A second pass overwrites files and leaves directories alone.
    assert_eq!(mirror(&FsCopier::new(), &source, &target), 500);
    assert_eq!(
        FsCopier::new().copy_dir(&source, &target).unwrap(),
        CopyOutcome::AlreadyPresent
    );
}

#[test]
fn test_dry_run_mirror_is_empty() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("study");
    fs::create_dir_all(source.join("s1")).unwrap();
    fs::write(source.join("s1/i1.MRDC.1"), b"data").unwrap();
    let target = temp.path().join("copy");

    assert_eq!(mirror(&DryRunCopier::new(), &source, &target), 0);
    assert!(!target.exists());
}

#[cfg(unix)]
#[test]
fn test_symlinked_file_is_copied_by_content() {
    let temp = TempDir::new().unwrap();
    let real = temp.path().join("real");
    let link = temp.path().join("link");
    let target = temp.path().join("target");
    fs::write(&real, b"linked").unwrap();
    std::os::unix::fs::symlink(&real, &link).unwrap();

    FsCopier::new().copy_file(&link, &target).unwrap();

    let meta = fs::symlink_metadata(&target).unwrap();
    assert!(meta.is_file());
    assert_eq!(fs::read(&target).unwrap(), b"linked");
}

#[test]
fn test_missing_source_is_an_error() {
    let temp = TempDir::new().unwrap();
    let err = FsCopier::new()
        .copy_file(&temp.path().join("absent"), &temp.path().join("target"))
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
