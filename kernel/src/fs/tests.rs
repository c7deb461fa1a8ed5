use alloc::{string::String, sync::Arc};

use super::tmpfs::TmpFS;
use super::*;

fn fs_with_files() -> Arc<TmpFS> {
    let fs = TmpFS::new();
    fs.create_file("/usr/libexec/wasm-launcher", b"\x7fELF", FilePermission::EXECUTABLE).unwrap();
    fs.create_file("/tmp/notes.txt", b"hello", FilePermission::READ_ONLY).unwrap();
    fs
}

#[test]
fn test_normalize_path() {
    assert_eq!(normalize_path("/tmp", "./foo.wasm").unwrap(), "/tmp/foo.wasm");
    assert_eq!(normalize_path("/tmp", "../usr/bin/../lib/x").unwrap(), "/usr/lib/x");
    assert_eq!(normalize_path("/tmp/a/..", "b").unwrap(), "/tmp/b");
    assert_eq!(normalize_path("/", "/../..").unwrap(), "/");
    assert_eq!(normalize_path("/ignored", "//usr///libexec/").unwrap(), "/usr/libexec");
}

#[test]
fn test_normalize_path_rejects_bad_input() {
    assert_eq!(normalize_path("/", "").unwrap_err().kind, FileSystemErrorKind::InvalidPath);
    assert_eq!(normalize_path("/", "/a\0b").unwrap_err().kind, FileSystemErrorKind::InvalidPath);
    assert_eq!(normalize_path("tmp", "foo").unwrap_err().kind, FileSystemErrorKind::InvalidPath);

    let mut long = String::from("/");
    for _ in 0..PATH_MAX {
        long.push('a');
    }
    assert_eq!(normalize_path("/", &long).unwrap_err().kind, FileSystemErrorKind::NameTooLong);
}

#[test]
fn test_open_exec_regular_executable() {
    let fs = fs_with_files();
    let file = open_exec(fs.as_ref(), "/usr/libexec/wasm-launcher").unwrap();
    assert_eq!(file.path(), Some("/usr/libexec/wasm-launcher"));
    assert_eq!(fs.stats().live(), 1);
    drop(file);
    assert_eq!(fs.stats().live(), 0);
    assert_eq!(fs.stats().released(), 1);
}

#[test]
fn test_open_exec_failures_leave_nothing_open() {
    let fs = fs_with_files();

    let err = open_exec(fs.as_ref(), "/missing").unwrap_err();
    assert_eq!(err.kind, FileSystemErrorKind::NotFound);
    assert_eq!(err.errno(), crate::errno::ENOENT);

    let err = open_exec(fs.as_ref(), "/tmp/notes.txt").unwrap_err();
    assert_eq!(err.kind, FileSystemErrorKind::PermissionDenied);
    assert_eq!(err.errno(), crate::errno::EACCES);

    let err = open_exec(fs.as_ref(), "/usr/libexec").unwrap_err();
    assert_eq!(err.kind, FileSystemErrorKind::IsADirectory);

    assert_eq!(fs.stats().live(), 0);
    assert_eq!(fs.stats().opened(), fs.stats().released());
}

#[test]
fn test_tmpfs_read_at() {
    let fs = fs_with_files();
    let file = fs.open("/tmp/notes.txt").unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(file.read_at(0, &mut buf).unwrap(), 5);
    assert_eq!(&buf[..5], b"hello");
    assert_eq!(file.read_at(3, &mut buf).unwrap(), 2);
    assert_eq!(&buf[..2], b"lo");
    assert_eq!(file.read_at(100, &mut buf).unwrap(), 0);
    file.release();
}

#[test]
fn test_tmpfs_permissions_and_remove() {
    let fs = fs_with_files();
    fs.set_permissions("/tmp/notes.txt", FilePermission::EXECUTABLE).unwrap();
    assert!(open_exec(fs.as_ref(), "/tmp/notes.txt").is_ok());

    assert_eq!(
        fs.create_file("/tmp/notes.txt/child", b"", FilePermission::READ_ONLY).unwrap_err().kind,
        FileSystemErrorKind::NotAFile
    );

    let open = fs.open("/tmp/notes.txt").unwrap();
    fs.remove("/tmp/notes.txt").unwrap();
    assert_eq!(fs.open("/tmp/notes.txt").err().unwrap().kind, FileSystemErrorKind::NotFound);
    // Unlinked but still open
    let mut buf = [0u8; 5];
    assert_eq!(open.read_at(0, &mut buf).unwrap(), 5);
    open.release();

    assert_eq!(
        fs.create_file("/usr/libexec/wasm-launcher", b"", FilePermission::EXECUTABLE).unwrap_err().kind,
        FileSystemErrorKind::AlreadyExists
    );
}

#[test]
fn test_double_release_is_counted_not_repeated() {
    let fs = fs_with_files();
    let file = fs.open("/tmp/notes.txt").unwrap();
    file.release();
    file.release();
    assert_eq!(fs.stats().released(), 1);
    assert_eq!(fs.stats().double_releases(), 1);
}
