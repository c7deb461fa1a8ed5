//! Linux errno constants
//!
//! The subset of Linux error numbers that exec failures are reported with.
//! Values match the Linux kernel's generic errno definitions.

/// No such file or directory
pub const ENOENT: usize = 2;

/// I/O error
pub const EIO: usize = 5;

/// Argument list too long
pub const E2BIG: usize = 7;

/// Exec format error
pub const ENOEXEC: usize = 8;

/// Out of memory
pub const ENOMEM: usize = 12;

/// Permission denied
pub const EACCES: usize = 13;

/// File exists
pub const EEXIST: usize = 17;

/// File name too long
pub const ENAMETOOLONG: usize = 36;

/// Too many symbolic links encountered (also: interpreter loop)
pub const ELOOP: usize = 40;
