//! File system abstraction used by the exec path.
//!
//! Only what process creation needs is modelled here: opening a path,
//! reading bytes at an offset, and inspecting type and permissions.
//! [`open_exec`] is the single entry point through which both the candidate
//! binary and any substituted interpreter are opened.

use alloc::{string::String, sync::Arc, vec::Vec};
use core::fmt;

use crate::environment::PATH_MAX;
use crate::errno;
use crate::object::KernelObject;

pub mod tmpfs;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSystemErrorKind {
    NotFound,
    PermissionDenied,
    NotAFile,
    IsADirectory,
    InvalidPath,
    NameTooLong,
    AlreadyExists,
    IoError,
}

#[derive(Clone, PartialEq, Eq)]
pub struct FileSystemError {
    pub kind: FileSystemErrorKind,
    pub message: &'static str,
}

impl FileSystemError {
    pub const fn new(kind: FileSystemErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// Linux errno equivalent of this error
    pub fn errno(&self) -> usize {
        match self.kind {
            FileSystemErrorKind::NotFound | FileSystemErrorKind::InvalidPath => errno::ENOENT,
            FileSystemErrorKind::PermissionDenied
            | FileSystemErrorKind::NotAFile
            | FileSystemErrorKind::IsADirectory => errno::EACCES,
            FileSystemErrorKind::NameTooLong => errno::ENAMETOOLONG,
            FileSystemErrorKind::AlreadyExists => errno::EEXIST,
            FileSystemErrorKind::IoError => errno::EIO,
        }
    }
}

impl fmt::Debug for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileSystemError {{ kind: {:?}, message: {} }}", self.kind, self.message)
    }
}

impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Result type for file system operations
pub type Result<T> = core::result::Result<T, FileSystemError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    RegularFile,
    Directory,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilePermission {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl FilePermission {
    pub const EXECUTABLE: Self = Self { read: true, write: false, execute: true };
    pub const READ_ONLY: Self = Self { read: true, write: false, execute: false };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub file_type: FileType,
    pub size: usize,
    pub permissions: FilePermission,
    pub file_id: u64,
}

/// An open file.
///
/// Each successful [`FileSystem::open`] yields a distinct object; its
/// [`release`](FileObject::release) is called exactly once, when the owning
/// [`KernelObject`] is dropped.
pub trait FileObject: Send + Sync {
    /// Path the file was opened by
    fn path(&self) -> &str;

    fn metadata(&self) -> Result<FileMetadata>;

    /// Read up to `buffer.len()` bytes starting at `offset`.
    /// Returns the number of bytes read; 0 at end of file.
    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<usize>;

    /// Release resources held by this open file
    fn release(&self) {}
}

pub trait FileSystem: Send + Sync {
    fn name(&self) -> &str;

    fn open(&self, path: &str) -> Result<Arc<dyn FileObject>>;
}

/// Open `path` for execution.
///
/// The file must be a regular file with the execute permission set.
/// On failure nothing stays open.
pub fn open_exec(fs: &dyn FileSystem, path: &str) -> Result<KernelObject> {
    let file = KernelObject::File(fs.open(path)?);
    let metadata = match file.as_file() {
        Some(f) => f.metadata()?,
        None => return Err(FileSystemError::new(FileSystemErrorKind::NotAFile, "Not a file object")),
    };
    match metadata.file_type {
        FileType::RegularFile => {}
        FileType::Directory => {
            return Err(FileSystemError::new(FileSystemErrorKind::IsADirectory, "Cannot execute a directory"));
        }
        FileType::Unknown => {
            return Err(FileSystemError::new(FileSystemErrorKind::NotAFile, "Not a regular file"));
        }
    }
    if !metadata.permissions.execute {
        return Err(FileSystemError::new(FileSystemErrorKind::PermissionDenied, "Execute permission denied"));
    }
    Ok(file)
}

/// Resolve `path` against `cwd` into an absolute path without `.`/`..` components.
///
/// `..` at the root stays at the root.
pub fn normalize_path(cwd: &str, path: &str) -> Result<String> {
    if path.is_empty() {
        return Err(FileSystemError::new(FileSystemErrorKind::InvalidPath, "Empty path"));
    }
    if path.contains('\0') {
        return Err(FileSystemError::new(FileSystemErrorKind::InvalidPath, "Path contains NUL"));
    }

    let base = if path.starts_with('/') {
        ""
    } else if cwd.starts_with('/') {
        cwd
    } else {
        return Err(FileSystemError::new(FileSystemErrorKind::InvalidPath, "Working directory is not absolute"));
    };

    let mut components: Vec<&str> = Vec::new();
    for component in base.split('/').chain(path.split('/')) {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            name => components.push(name),
        }
    }

    let mut normalized = String::new();
    for component in &components {
        normalized.push('/');
        normalized.push_str(component);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    if normalized.len() > PATH_MAX {
        return Err(FileSystemError::new(FileSystemErrorKind::NameTooLong, "Path exceeds PATH_MAX"));
    }
    Ok(normalized)
}
