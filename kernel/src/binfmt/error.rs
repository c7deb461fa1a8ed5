use core::fmt;

use crate::errno;
use crate::fs::FileSystemError;

/// Errors that fail a process-creation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// Opening or reading a file failed
    Io(FileSystemError),
    /// An argument string or the argument area exceeded its limit
    ArgumentListTooLong,
    /// Allocation failed while copying request data
    OutOfMemory,
    /// An interpreter path exceeded PATH_MAX
    NameTooLong,
    /// No registered format recognized the file
    UnknownFormat,
    /// The redispatch ceiling was exceeded
    FormatLoop { depth: usize },
    /// A recognized file could not be turned into an image
    InvalidImage(&'static str),
}

impl ExecError {
    /// Linux errno the failed call reports
    pub fn errno(&self) -> usize {
        match self {
            ExecError::Io(e) => e.errno(),
            ExecError::ArgumentListTooLong => errno::E2BIG,
            ExecError::OutOfMemory => errno::ENOMEM,
            ExecError::NameTooLong => errno::ENAMETOOLONG,
            ExecError::UnknownFormat | ExecError::InvalidImage(_) => errno::ENOEXEC,
            ExecError::FormatLoop { .. } => errno::ELOOP,
        }
    }
}

impl From<FileSystemError> for ExecError {
    fn from(e: FileSystemError) -> Self {
        ExecError::Io(e)
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Io(e) => write!(f, "I/O error: {}", e),
            ExecError::ArgumentListTooLong => write!(f, "Argument list too long"),
            ExecError::OutOfMemory => write!(f, "Out of memory"),
            ExecError::NameTooLong => write!(f, "Interpreter name too long"),
            ExecError::UnknownFormat => write!(f, "Unknown binary format"),
            ExecError::FormatLoop { depth } => write!(f, "Binary format loop at depth {}", depth),
            ExecError::InvalidImage(msg) => write!(f, "Invalid image: {}", msg),
        }
    }
}

/// Errors from registering or unregistering a format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    AlreadyRegistered(&'static str),
    NotRegistered(&'static str),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::AlreadyRegistered(name) => write!(f, "Binary format already registered: {}", name),
            RegistryError::NotRegistered(name) => write!(f, "Binary format not registered: {}", name),
        }
    }
}
