//! # Scarlet binfmt_wasm
//!
//! Binary format recognition for Scarlet process creation, with a
//! WebAssembly format that runs `\0asm` modules through a launcher program.
//!
//! ## Layout
//!
//! - `fs`: file objects, execute permission checks and an in-memory filesystem
//! - `object`: exclusively owned kernel handles
//! - `binfmt`: the exec request, the format registry and the ELF and
//!   WebAssembly formats
//! - `executor`: the exec entry point tying the above together
//! - `earlycon` / `logger`: console output and the `log` backend
//!
//! The crate is `no_std` with `alloc`; unit tests run hosted.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod earlycon;
pub mod environment;
pub mod errno;
pub mod logger;
pub mod traits;
pub mod fs;
pub mod object;
pub mod binfmt;
pub mod executor;

pub use binfmt::{
    BinaryFormat, ExecError, ExecRequest, FormatRegistry, LoadOutcome, LoadedImage, PreparedExec,
    RegistryConfig, WasmBinfmtConfig,
};
pub use binfmt::wasm::{WasmBinfmt, WasmBinfmtModule};
pub use executor::TransparentExecutor;
