//! The in-flight process-creation request
//!
//! An [`ExecRequest`] is built once per exec call and then handed by
//! `&mut` to one format at a time. Formats that rewrite it do so in two
//! phases: everything fallible (opening the new file, copying strings,
//! deriving the interpreter identity) is staged into a [`Substitution`]
//! without touching the request, and [`ExecRequest::substitute`] then
//! installs the staged state in one infallible step. A failure before the
//! commit simply drops the staging, which also closes any file it holds.

use alloc::{collections::VecDeque, string::String, sync::Arc, vec::Vec};

use super::{ExecError, LoadedImage};
use crate::environment::{BINPRM_BUF_SIZE, DEFAULT_ARG_BUDGET, MAX_ARG_STRINGS, MAX_ARG_STRLEN, PATH_MAX};
use crate::fs::FileSystem;
use crate::object::KernelObject;

/// Argument or environment vector with Linux-style limits.
///
/// Every string is charged its length plus a terminating NUL against the
/// byte budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgVector {
    strings: VecDeque<String>,
    bytes: usize,
    budget: usize,
}

impl ArgVector {
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_ARG_BUDGET)
    }

    pub fn with_budget(budget: usize) -> Self {
        Self { strings: VecDeque::new(), bytes: 0, budget }
    }

    pub fn from_strs<S: AsRef<str>>(strings: &[S], budget: usize) -> Result<Self, ExecError> {
        let mut argv = Self::with_budget(budget);
        for s in strings {
            argv.push_back(s.as_ref())?;
        }
        Ok(argv)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(|s| s.as_str())
    }

    /// Bytes charged against the budget so far
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn push_back(&mut self, s: &str) -> Result<(), ExecError> {
        let (copy, cost) = self.prepare(s)?;
        self.strings.push_back(copy);
        self.bytes += cost;
        Ok(())
    }

    /// Insert `s` as the new first argument.
    pub fn push_front(&mut self, s: &str) -> Result<(), ExecError> {
        let (copy, cost) = self.prepare(s)?;
        self.strings.push_front(copy);
        self.bytes += cost;
        Ok(())
    }

    /// Drop argv[0]. An empty vector stays empty.
    pub fn remove_arg_zero(&mut self) -> Option<String> {
        let removed = self.strings.pop_front()?;
        self.bytes -= removed.len() + 1;
        Some(removed)
    }

    /// Copy the vector, reporting allocation failure instead of aborting.
    pub fn try_clone(&self) -> Result<Self, ExecError> {
        let mut strings = VecDeque::new();
        strings
            .try_reserve_exact(self.strings.len())
            .map_err(|_| ExecError::OutOfMemory)?;
        for s in &self.strings {
            strings.push_back(copy_string(s)?);
        }
        Ok(Self { strings, bytes: self.bytes, budget: self.budget })
    }

    pub fn into_vec(self) -> Vec<String> {
        Vec::from(self.strings)
    }

    /// Check limits and copy `s`, reserving room for one more slot.
    fn prepare(&mut self, s: &str) -> Result<(String, usize), ExecError> {
        let cost = s.len() + 1;
        if cost > MAX_ARG_STRLEN || self.strings.len() >= MAX_ARG_STRINGS {
            return Err(ExecError::ArgumentListTooLong);
        }
        match self.bytes.checked_add(cost) {
            Some(total) if total <= self.budget => {}
            _ => return Err(ExecError::ArgumentListTooLong),
        }
        let copy = copy_string(s)?;
        self.strings.try_reserve(1).map_err(|_| ExecError::OutOfMemory)?;
        Ok((copy, cost))
    }
}

impl Default for ArgVector {
    fn default() -> Self {
        Self::new()
    }
}

fn copy_string(s: &str) -> Result<String, ExecError> {
    let mut copy = String::new();
    copy.try_reserve_exact(s.len()).map_err(|_| ExecError::OutOfMemory)?;
    copy.push_str(s);
    Ok(copy)
}

/// Which interpreter now runs a request, and what it replaced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterIdentity {
    path: String,
    format: &'static str,
    ancestry: Vec<String>,
}

impl InterpreterIdentity {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Name of the format that substituted this interpreter
    pub fn format(&self) -> &'static str {
        self.format
    }

    /// Files the request ran through before this interpreter, oldest first
    pub fn ancestry(&self) -> &[String] {
        &self.ancestry
    }
}

/// Fully staged replacement state for a request
#[derive(Debug)]
pub struct Substitution {
    pub argv: ArgVector,
    pub identity: InterpreterIdentity,
    pub file: KernelObject,
}

pub struct ExecRequest {
    vfs: Arc<dyn FileSystem>,
    file: KernelObject,
    buf: [u8; BINPRM_BUF_SIZE],
    buf_len: usize,
    filename: String,
    argv: ArgVector,
    envp: ArgVector,
    interp_depth: usize,
    interpreter: Option<InterpreterIdentity>,
}

impl ExecRequest {
    /// Build a request around an already opened file and buffer its prefix.
    ///
    /// `filename` is the path the caller asked to execute. If the prefix
    /// cannot be read, `file` is released and the error returned.
    pub fn new(
        vfs: Arc<dyn FileSystem>,
        file: KernelObject,
        filename: &str,
        argv: ArgVector,
        envp: ArgVector,
    ) -> Result<Self, ExecError> {
        let mut request = Self {
            vfs,
            file,
            buf: [0; BINPRM_BUF_SIZE],
            buf_len: 0,
            filename: copy_string(filename)?,
            argv,
            envp,
            interp_depth: 0,
            interpreter: None,
        };
        request.reload_prefix()?;
        Ok(request)
    }

    /// Filesystem formats open substituted files through
    pub fn vfs(&self) -> &dyn FileSystem {
        self.vfs.as_ref()
    }

    /// The file that will become the process image
    pub fn file(&self) -> &KernelObject {
        &self.file
    }

    /// Leading bytes of [`file`](Self::file), at most `BINPRM_BUF_SIZE`
    pub fn prefix(&self) -> &[u8] {
        &self.buf[..self.buf_len]
    }

    /// The originally requested path
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Path of the file currently backing the request
    pub fn interp(&self) -> &str {
        self.interpreter
            .as_ref()
            .map_or(self.filename.as_str(), |identity| identity.path.as_str())
    }

    pub fn argv(&self) -> &ArgVector {
        &self.argv
    }

    pub fn envp(&self) -> &ArgVector {
        &self.envp
    }

    /// Number of redispatches so far
    pub fn interp_depth(&self) -> usize {
        self.interp_depth
    }

    pub fn interpreter(&self) -> Option<&InterpreterIdentity> {
        self.interpreter.as_ref()
    }

    /// Stage the identity of `path` taking over this request.
    pub fn derive_interpreter(&self, path: &str, format: &'static str) -> Result<InterpreterIdentity, ExecError> {
        if path.len() > PATH_MAX {
            return Err(ExecError::NameTooLong);
        }
        let previous = self.interpreter.as_ref().map_or(&[][..], |identity| identity.ancestry.as_slice());
        let mut ancestry = Vec::new();
        ancestry
            .try_reserve_exact(previous.len() + 1)
            .map_err(|_| ExecError::OutOfMemory)?;
        for entry in previous {
            ancestry.push(copy_string(entry)?);
        }
        ancestry.push(copy_string(self.interp())?);
        Ok(InterpreterIdentity { path: copy_string(path)?, format, ancestry })
    }

    /// Install staged state. Returns the previous file, which the caller
    /// releases by dropping it.
    pub fn substitute(&mut self, substitution: Substitution) -> KernelObject {
        let Substitution { argv, identity, file } = substitution;
        self.argv = argv;
        self.interpreter = Some(identity);
        core::mem::replace(&mut self.file, file)
    }

    /// Prepare the request for another recognition pass over its new file.
    pub fn begin_redispatch(&mut self) -> Result<(), ExecError> {
        self.interp_depth = self.interp_depth.saturating_add(1);
        self.reload_prefix()
    }

    fn reload_prefix(&mut self) -> Result<(), ExecError> {
        self.buf_len = self.file.read_prefix(&mut self.buf)?;
        Ok(())
    }

    /// Commit the request to `image`.
    pub fn into_prepared(self, image: LoadedImage) -> PreparedExec {
        PreparedExec {
            file: self.file,
            filename: self.filename,
            argv: self.argv,
            envp: self.envp,
            interp_depth: self.interp_depth,
            interpreter: self.interpreter,
            image,
        }
    }
}

impl core::fmt::Debug for ExecRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExecRequest")
            .field("file", &self.file)
            .field("filename", &self.filename)
            .field("argv", &self.argv)
            .field("interp_depth", &self.interp_depth)
            .field("interpreter", &self.interpreter)
            .finish()
    }
}

/// A request committed to an image, ready to be mapped
#[derive(Debug)]
pub struct PreparedExec {
    pub file: KernelObject,
    pub filename: String,
    pub argv: ArgVector,
    pub envp: ArgVector,
    pub interp_depth: usize,
    pub interpreter: Option<InterpreterIdentity>,
    pub image: LoadedImage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binfmt::test_helpers::{launcher_fs, LAUNCHER};
    use crate::fs::{open_exec, FilePermission};

    #[test]
    fn test_push_front_orders_like_a_stack() {
        let mut argv = ArgVector::from_strs(&["./foo.wasm", "a", "b"], DEFAULT_ARG_BUDGET).unwrap();
        assert_eq!(argv.remove_arg_zero().as_deref(), Some("./foo.wasm"));
        argv.push_front("/tmp/foo.wasm").unwrap();
        argv.push_front(LAUNCHER).unwrap();
        assert_eq!(argv.into_vec(), ["/usr/libexec/wasm-launcher", "/tmp/foo.wasm", "a", "b"]);
    }

    #[test]
    fn test_byte_accounting() {
        let mut argv = ArgVector::from_strs(&["ab", "c"], 16).unwrap();
        assert_eq!(argv.bytes(), 5);
        argv.remove_arg_zero();
        assert_eq!(argv.bytes(), 2);
        argv.remove_arg_zero();
        assert_eq!(argv.bytes(), 0);
        assert!(argv.remove_arg_zero().is_none());
        assert!(argv.is_empty());
    }

    #[test]
    fn test_budget_exhaustion_leaves_vector_unchanged() {
        let mut argv = ArgVector::from_strs(&["abc"], 8).unwrap();
        let before = argv.clone();
        assert_eq!(argv.push_front("abcd"), Err(ExecError::ArgumentListTooLong));
        assert_eq!(argv, before);
        argv.push_front("abc").unwrap();
        assert_eq!(argv.bytes(), 8);
    }

    #[test]
    fn test_string_longer_than_max_arg_strlen() {
        let long = "x".repeat(MAX_ARG_STRLEN);
        let mut argv = ArgVector::with_budget(usize::MAX);
        assert_eq!(argv.push_back(&long), Err(ExecError::ArgumentListTooLong));
        assert!(argv.push_back(&long[1..]).is_ok());
    }

    #[test]
    fn test_try_clone_is_equal() {
        let argv = ArgVector::from_strs(&["a", "bb"], 64).unwrap();
        assert_eq!(argv.try_clone().unwrap(), argv);
    }

    #[test]
    fn test_new_request_buffers_prefix() {
        let fs = launcher_fs();
        fs.create_file("/tmp/short", b"\0as", FilePermission::EXECUTABLE).unwrap();
        let file = open_exec(fs.as_ref(), "/tmp/short").unwrap();
        let request = ExecRequest::new(fs.clone(), file, "/tmp/short", ArgVector::new(), ArgVector::new()).unwrap();
        assert_eq!(request.prefix(), b"\0as");
        assert_eq!(request.interp(), "/tmp/short");
        assert_eq!(request.interp_depth(), 0);
        assert!(request.interpreter().is_none());
    }

    #[test]
    fn test_substitute_returns_previous_file() {
        let fs = launcher_fs();
        fs.create_file("/tmp/foo.wasm", b"\0asm", FilePermission::EXECUTABLE).unwrap();
        let file = open_exec(fs.as_ref(), "/tmp/foo.wasm").unwrap();
        let mut request = ExecRequest::new(fs.clone(), file, "/tmp/foo.wasm", ArgVector::new(), ArgVector::new()).unwrap();

        let launcher = open_exec(fs.as_ref(), LAUNCHER).unwrap();
        let identity = request.derive_interpreter(LAUNCHER, "wasm").unwrap();
        let argv = ArgVector::from_strs(&[LAUNCHER, "/tmp/foo.wasm"], DEFAULT_ARG_BUDGET).unwrap();
        let previous = request.substitute(Substitution { argv, identity, file: launcher });

        assert_eq!(previous.path(), Some("/tmp/foo.wasm"));
        assert_eq!(request.file().path(), Some(LAUNCHER));
        assert_eq!(request.interp(), LAUNCHER);
        assert_eq!(request.filename(), "/tmp/foo.wasm");
        assert_eq!(fs.stats().live(), 2);
        drop(previous);
        assert_eq!(fs.stats().live(), 1);

        request.begin_redispatch().unwrap();
        assert_eq!(request.interp_depth(), 1);
        assert_eq!(&request.prefix()[..4], b"\x7fELF");
    }

    #[test]
    fn test_derive_interpreter_ancestry_chain() {
        let fs = launcher_fs();
        fs.create_file("/tmp/foo.wasm", b"\0asm", FilePermission::EXECUTABLE).unwrap();
        let file = open_exec(fs.as_ref(), "/tmp/foo.wasm").unwrap();
        let mut request = ExecRequest::new(fs.clone(), file, "/tmp/foo.wasm", ArgVector::new(), ArgVector::new()).unwrap();

        let first = request.derive_interpreter(LAUNCHER, "wasm").unwrap();
        assert_eq!(first.ancestry(), ["/tmp/foo.wasm"]);
        let launcher = open_exec(fs.as_ref(), LAUNCHER).unwrap();
        drop(request.substitute(Substitution { argv: ArgVector::new(), identity: first, file: launcher }));

        let second = request.derive_interpreter("/usr/bin/other", "test").unwrap();
        assert_eq!(second.ancestry(), ["/tmp/foo.wasm", LAUNCHER]);
        assert_eq!(second.format(), "test");

        let long = "/".repeat(PATH_MAX + 1);
        assert_eq!(request.derive_interpreter(&long, "test"), Err(ExecError::NameTooLong));
    }
}
