//! Runtime configuration for the format registry and the WebAssembly format.
//!
//! Defaults come from [`crate::environment`]; a kernel command line
//! (`/chosen/bootargs`) may override them:
//!
//! - `binfmt_wasm.launcher=<absolute path>`
//! - `binfmt.max_depth=<n>`

use alloc::string::{String, ToString};
use core::fmt;

use crate::environment::{DEFAULT_LAUNCHER_PATH, DEFAULT_MAX_INTERP_DEPTH, PATH_MAX};

const LAUNCHER_KEY: &str = "binfmt_wasm.launcher";
const MAX_DEPTH_KEY: &str = "binfmt.max_depth";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyPath,
    RelativePath,
    PathTooLong,
    InvalidCharacter,
    InvalidNumber(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyPath => write!(f, "Launcher path is empty"),
            ConfigError::RelativePath => write!(f, "Launcher path must be absolute"),
            ConfigError::PathTooLong => write!(f, "Launcher path exceeds PATH_MAX"),
            ConfigError::InvalidCharacter => write!(f, "Launcher path contains NUL"),
            ConfigError::InvalidNumber(key) => write!(f, "Invalid number for {}", key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WasmBinfmtConfig {
    launcher_path: String,
}

impl WasmBinfmtConfig {
    pub fn new(launcher_path: &str) -> Result<Self, ConfigError> {
        if launcher_path.is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        if !launcher_path.starts_with('/') {
            return Err(ConfigError::RelativePath);
        }
        if launcher_path.contains('\0') {
            return Err(ConfigError::InvalidCharacter);
        }
        if launcher_path.len() > PATH_MAX {
            return Err(ConfigError::PathTooLong);
        }
        Ok(Self { launcher_path: launcher_path.to_string() })
    }

    pub fn from_bootargs(bootargs: &str) -> Result<Self, ConfigError> {
        match bootarg(bootargs, LAUNCHER_KEY) {
            Some(path) => Self::new(path),
            None => Ok(Self::default()),
        }
    }

    pub fn launcher_path(&self) -> &str {
        &self.launcher_path
    }
}

impl Default for WasmBinfmtConfig {
    fn default() -> Self {
        Self { launcher_path: DEFAULT_LAUNCHER_PATH.to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Redispatches allowed before a request fails with a format loop
    pub max_interp_depth: usize,
}

impl RegistryConfig {
    pub fn from_bootargs(bootargs: &str) -> Result<Self, ConfigError> {
        match bootarg(bootargs, MAX_DEPTH_KEY) {
            Some(value) => value
                .parse()
                .map(|max_interp_depth| Self { max_interp_depth })
                .map_err(|_| ConfigError::InvalidNumber(MAX_DEPTH_KEY)),
            None => Ok(Self::default()),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { max_interp_depth: DEFAULT_MAX_INTERP_DEPTH }
    }
}

/// Last value given for `key` on the command line
fn bootarg<'a>(bootargs: &'a str, key: &str) -> Option<&'a str> {
    bootargs
        .split_whitespace()
        .filter_map(|arg| arg.split_once('='))
        .filter(|(k, _)| *k == key)
        .map(|(_, v)| v)
        .last()
}
