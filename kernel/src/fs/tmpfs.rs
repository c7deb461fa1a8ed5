//! TmpFS - memory-based filesystem
//!
//! A flat map from normalized absolute path to node. Every open produces a
//! fresh [`TmpFileObject`], and [`HandleStats`] counts opens and releases so
//! callers can check that handles are neither leaked nor released twice.

use alloc::{
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use hashbrown::HashMap;
use spin::{Mutex, RwLock};

use super::{
    normalize_path, FileMetadata, FileObject, FilePermission, FileSystem, FileSystemError,
    FileSystemErrorKind, FileType, Result,
};

/// Open/release counters shared by a filesystem and its open files
#[derive(Debug, Default)]
pub struct HandleStats {
    opened: AtomicUsize,
    released: AtomicUsize,
    double_releases: AtomicUsize,
}

impl HandleStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::Acquire)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::Acquire)
    }

    /// Releases requested on an already released file
    pub fn double_releases(&self) -> usize {
        self.double_releases.load(Ordering::Acquire)
    }

    /// Currently open handles
    pub fn live(&self) -> usize {
        self.opened().saturating_sub(self.released())
    }
}

pub struct TmpNode {
    file_type: FileType,
    data: RwLock<Vec<u8>>,
    permissions: Mutex<FilePermission>,
    file_id: u64,
}

impl TmpNode {
    fn new_file(data: Vec<u8>, permissions: FilePermission, file_id: u64) -> Self {
        Self {
            file_type: FileType::RegularFile,
            data: RwLock::new(data),
            permissions: Mutex::new(permissions),
            file_id,
        }
    }

    fn new_directory(file_id: u64) -> Self {
        Self {
            file_type: FileType::Directory,
            data: RwLock::new(Vec::new()),
            permissions: Mutex::new(FilePermission { read: true, write: true, execute: true }),
            file_id,
        }
    }

    fn metadata(&self) -> FileMetadata {
        FileMetadata {
            file_type: self.file_type,
            size: self.data.read().len(),
            permissions: *self.permissions.lock(),
            file_id: self.file_id,
        }
    }
}

pub struct TmpFS {
    nodes: RwLock<HashMap<String, Arc<TmpNode>>>,
    stats: Arc<HandleStats>,
    next_file_id: Mutex<u64>,
    name: String,
}

impl TmpFS {
    pub fn new() -> Arc<Self> {
        let mut nodes = HashMap::new();
        nodes.insert("/".to_string(), Arc::new(TmpNode::new_directory(1)));
        Arc::new(Self {
            nodes: RwLock::new(nodes),
            stats: Arc::new(HandleStats::default()),
            next_file_id: Mutex::new(2), // root is 1
            name: "tmpfs".to_string(),
        })
    }

    pub fn stats(&self) -> &HandleStats {
        &self.stats
    }

    fn generate_file_id(&self) -> u64 {
        let mut next_id = self.next_file_id.lock();
        let id = *next_id;
        *next_id += 1;
        id
    }

    /// Create a regular file, creating missing parent directories.
    pub fn create_file(&self, path: &str, data: &[u8], permissions: FilePermission) -> Result<()> {
        let path = normalize_path("/", path)?;
        let mut nodes = self.nodes.write();
        if nodes.contains_key(&path) {
            return Err(FileSystemError::new(FileSystemErrorKind::AlreadyExists, "File already exists"));
        }
        self.create_parents(&mut nodes, &path)?;
        let node = TmpNode::new_file(data.to_vec(), permissions, self.generate_file_id());
        nodes.insert(path, Arc::new(node));
        Ok(())
    }

    pub fn create_directory(&self, path: &str) -> Result<()> {
        let path = normalize_path("/", path)?;
        let mut nodes = self.nodes.write();
        if nodes.contains_key(&path) {
            return Err(FileSystemError::new(FileSystemErrorKind::AlreadyExists, "Directory already exists"));
        }
        self.create_parents(&mut nodes, &path)?;
        nodes.insert(path, Arc::new(TmpNode::new_directory(self.generate_file_id())));
        Ok(())
    }

    fn create_parents(&self, nodes: &mut HashMap<String, Arc<TmpNode>>, path: &str) -> Result<()> {
        let mut end = 0;
        while let Some(offset) = path[end + 1..].find('/') {
            end += offset + 1;
            let parent = &path[..end];
            match nodes.get(parent) {
                Some(node) if node.file_type != FileType::Directory => {
                    return Err(FileSystemError::new(FileSystemErrorKind::NotAFile, "Parent is not a directory"));
                }
                Some(_) => {}
                None => {
                    let dir = Arc::new(TmpNode::new_directory(self.generate_file_id()));
                    nodes.insert(parent.to_string(), dir);
                }
            }
        }
        Ok(())
    }

    pub fn set_permissions(&self, path: &str, permissions: FilePermission) -> Result<()> {
        let path = normalize_path("/", path)?;
        let nodes = self.nodes.read();
        let node = nodes
            .get(&path)
            .ok_or(FileSystemError::new(FileSystemErrorKind::NotFound, "File not found"))?;
        *node.permissions.lock() = permissions;
        Ok(())
    }

    /// Unlink `path`. Files already open stay readable.
    pub fn remove(&self, path: &str) -> Result<()> {
        let path = normalize_path("/", path)?;
        if path == "/" {
            return Err(FileSystemError::new(FileSystemErrorKind::PermissionDenied, "Cannot remove root"));
        }
        self.nodes
            .write()
            .remove(&path)
            .map(|_| ())
            .ok_or(FileSystemError::new(FileSystemErrorKind::NotFound, "File not found"))
    }
}

impl FileSystem for TmpFS {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, path: &str) -> Result<Arc<dyn FileObject>> {
        let path = normalize_path("/", path)?;
        let node = self
            .nodes
            .read()
            .get(&path)
            .cloned()
            .ok_or(FileSystemError::new(FileSystemErrorKind::NotFound, "File not found"))?;
        self.stats.opened.fetch_add(1, Ordering::AcqRel);
        Ok(Arc::new(TmpFileObject {
            node,
            path,
            stats: self.stats.clone(),
            released: AtomicBool::new(false),
        }))
    }
}

pub struct TmpFileObject {
    node: Arc<TmpNode>,
    path: String,
    stats: Arc<HandleStats>,
    released: AtomicBool,
}

impl FileObject for TmpFileObject {
    fn path(&self) -> &str {
        &self.path
    }

    fn metadata(&self) -> Result<FileMetadata> {
        Ok(self.node.metadata())
    }

    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        if self.released.load(Ordering::Acquire) {
            return Err(FileSystemError::new(FileSystemErrorKind::IoError, "Read from released file"));
        }
        if self.node.file_type != FileType::RegularFile {
            return Err(FileSystemError::new(FileSystemErrorKind::IsADirectory, "Cannot read a directory"));
        }
        let data = self.node.data.read();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
        let to_read = buffer.len().min(data.len() - start);
        buffer[..to_read].copy_from_slice(&data[start..start + to_read]);
        Ok(to_read)
    }

    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            self.stats.double_releases.fetch_add(1, Ordering::AcqRel);
            log::warn!("tmpfs: {} released twice", self.path);
        } else {
            self.stats.released.fetch_add(1, Ordering::AcqRel);
        }
    }
}
