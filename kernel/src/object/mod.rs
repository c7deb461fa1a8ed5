//! Kernel object management
//!
//! A [`KernelObject`] is the owned form of an open resource. It is not
//! `Clone`: exactly one owner exists, and dropping that owner releases the
//! resource exactly once. Handing a file to someone else is a move.

use alloc::sync::Arc;

use crate::fs::{self, FileObject};


pub enum KernelObject {
    File(Arc<dyn FileObject>),
}

impl KernelObject {
    pub fn as_file(&self) -> Option<&dyn FileObject> {
        match self {
            KernelObject::File(file) => Some(file.as_ref()),
        }
    }

    /// Path the underlying file was opened by
    pub fn path(&self) -> Option<&str> {
        self.as_file().map(|f| f.path())
    }

    /// Fill `buffer` from the start of the file, zeroing whatever the file
    /// does not cover. Returns the number of bytes actually read.
    pub fn read_prefix(&self, buffer: &mut [u8]) -> fs::Result<usize> {
        let file = self.as_file().ok_or(fs::FileSystemError::new(
            fs::FileSystemErrorKind::NotAFile,
            "Not a file object",
        ))?;
        buffer.fill(0);
        let mut filled = 0;
        while filled < buffer.len() {
            let n = file.read_at(filled as u64, &mut buffer[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Whether both objects refer to the same open file
    pub fn same_object(&self, other: &KernelObject) -> bool {
        match (self, other) {
            (KernelObject::File(a), KernelObject::File(b)) => Arc::ptr_eq(a, b),
        }
    }
}

impl Drop for KernelObject {
    fn drop(&mut self) {
        match self {
            KernelObject::File(file) => file.release(),
        }
    }
}

impl core::fmt::Debug for KernelObject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            KernelObject::File(file) => f.debug_tuple("File").field(&file.path()).finish(),
        }
    }
}
