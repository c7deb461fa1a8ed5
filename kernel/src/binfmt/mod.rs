//! Binary format recognition
//!
//! Process creation hands an [`ExecRequest`] to the [`FormatRegistry`],
//! which offers it to each registered [`BinaryFormat`] in order. A format
//! either declines, commits the request to a process image, or rewrites the
//! request to run through a different file and asks the registry to start
//! recognition over.
//!
//! ```text
//!   execute_binary(path, argv)
//!          │ open_exec + prefix read
//!          ▼
//!   ┌───────────────────────┐  Redispatch (depth + 1, prefix re-read)
//!   │ search_binary_handler │◄────────────────────────┐
//!   └─────────┬─────────────┘                          │
//!             │ offer in registration order            │
//!       ┌─────┴──────┐                                 │
//!       ▼            ▼                                 │
//!   ElfBinfmt     WasmBinfmt ── "\0asm" ── launcher ───┘
//!   Commit(image)
//! ```

use core::fmt;

pub mod config;
pub mod elf;
pub mod error;
pub mod registry;
pub mod request;
pub mod wasm;

#[cfg(test)]
pub mod test_helpers;

pub use config::{ConfigError, RegistryConfig, WasmBinfmtConfig};
pub use error::{ExecError, RegistryError};
pub use registry::FormatRegistry;
pub use request::{ArgVector, ExecRequest, InterpreterIdentity, PreparedExec, Substitution};

/// Result of offering a request to one format
#[derive(Debug)]
pub enum LoadOutcome {
    /// The prefix is not this format; the request is untouched.
    NotRecognized,
    /// The request is ready to be mapped as the given image.
    Commit(LoadedImage),
    /// The request now refers to a different file; recognition must restart.
    Redispatch,
}

/// Description of the image a committed request will be mapped as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub format: &'static str,
    pub entry_point: u64,
    pub machine: u16,
    pub class: u8,
}

/// A pluggable binary format recognizer.
///
/// `load_binary` is called with exclusive access to the request. It must
/// decide recognition from [`ExecRequest::prefix`] alone, and on any error
/// it must leave the request as it found it.
pub trait BinaryFormat: Send + Sync {
    fn name(&self) -> &'static str;

    fn load_binary(&self, request: &mut ExecRequest) -> Result<LoadOutcome, ExecError>;
}

impl fmt::Debug for dyn BinaryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryFormat({})", self.name())
    }
}
