//! TransparentExecutor Implementation
//!
//! Nothing outside the request is mutated before the registry commits it,
//! so a failed exec needs no rollback: dropping the request releases every
//! handle it owns and leaves the caller exactly as it was.

use alloc::{string::String, sync::Arc};

use crate::binfmt::{ArgVector, ExecError, ExecRequest, FormatRegistry, PreparedExec};
use crate::environment::DEFAULT_ARG_BUDGET;
use crate::fs::{normalize_path, open_exec, FileSystem};

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecError>;

pub struct TransparentExecutor {
    vfs: Arc<dyn FileSystem>,
    registry: Arc<FormatRegistry>,
    cwd: String,
    arg_budget: usize,
}

impl TransparentExecutor {
    pub fn new(vfs: Arc<dyn FileSystem>, registry: Arc<FormatRegistry>) -> Self {
        Self {
            vfs,
            registry,
            cwd: String::from("/"),
            arg_budget: DEFAULT_ARG_BUDGET,
        }
    }

    /// Directory relative paths are resolved against
    pub fn with_cwd(mut self, cwd: &str) -> ExecutorResult<Self> {
        self.cwd = normalize_path("/", cwd)?;
        Ok(self)
    }

    /// Byte budget for each of argv and envp
    pub fn with_arg_budget(mut self, budget: usize) -> Self {
        self.arg_budget = budget;
        self
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    /// Execute a binary with automatic format detection
    ///
    /// This method:
    /// 1. Resolves `path` against the working directory
    /// 2. Opens it for execution
    /// 3. Builds the request (an empty argv becomes `[""]`)
    /// 4. Lets the registry recognize, and possibly redirect, the request
    /// 5. Returns the committed request
    ///
    /// # Returns
    /// * `Ok(PreparedExec)` ready to be mapped
    /// * `Err(ExecError)` with every handle opened on the way released
    pub fn execute_binary(&self, path: &str, argv: &[&str], envp: &[&str]) -> ExecutorResult<PreparedExec> {
        let result = self.execute_binary_inner(path, argv, envp);
        if let Err(e) = &result {
            log::debug!("exec {}: {} (errno {})", path, e, e.errno());
        }
        result
    }

    fn execute_binary_inner(&self, path: &str, argv: &[&str], envp: &[&str]) -> ExecutorResult<PreparedExec> {
        // Step 1: Resolve and open the binary
        let filename = normalize_path(&self.cwd, path)?;
        let file = open_exec(self.vfs.as_ref(), &filename)?;

        // Step 2: Copy arguments into the request
        let mut args = ArgVector::from_strs(argv, self.arg_budget)?;
        if args.is_empty() {
            log::warn!("exec {}: empty argv, passing \"\" as argv[0]", filename);
            args.push_back("")?;
        }
        let env = ArgVector::from_strs(envp, self.arg_budget)?;
        let mut request = ExecRequest::new(self.vfs.clone(), file, &filename, args, env)?;

        // Step 3: Recognize
        let image = self.registry.search_binary_handler(&mut request)?;

        Ok(request.into_prepared(image))
    }
}
