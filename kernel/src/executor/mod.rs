//! Transparent Executor Module
//!
//! This module implements the TransparentExecutor, the exec entry point
//! that turns a path and argument vector into a committed process image.
//!
//! The TransparentExecutor:
//! - Resolves and opens the binary through the filesystem
//! - Builds the process-creation request
//! - Hands recognition to the format registry
//! - Does NOT contain format-specific knowledge
//!
//! ## Design Principle
//!
//! - **Executor**: owns the request for the duration of one exec call
//! - **Formats**: recognize and rewrite requests
//! - **No format knowledge in the executor**: a WebAssembly module and a
//!   native ELF go through exactly the same path

pub mod executor;


pub use executor::{ExecutorResult, TransparentExecutor};
