//! WebAssembly format
//!
//! A file whose first four bytes are `\0asm` is not run directly. Instead
//! the request is rewritten to execute a fixed launcher program with the
//! module's path as its first argument:
//!
//! ```text
//! before: file=/tmp/foo.wasm              argv=["./foo.wasm", "a", "b"]
//! after:  file=/usr/libexec/wasm-launcher argv=["/usr/libexec/wasm-launcher", "/tmp/foo.wasm", "a", "b"]
//! ```
//!
//! and the registry is asked to redispatch, so the launcher's own (native)
//! format is what finally gets committed.

use alloc::sync::Arc;

use super::config::WasmBinfmtConfig;
use super::{BinaryFormat, ExecError, ExecRequest, FormatRegistry, LoadOutcome, RegistryError, Substitution};
use crate::environment::WASM_MAGIC;
use crate::fs::open_exec;

pub struct WasmBinfmt {
    config: WasmBinfmtConfig,
}

impl WasmBinfmt {
    pub fn new(config: WasmBinfmtConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WasmBinfmtConfig {
        &self.config
    }

    /// Whether `prefix` starts with the WebAssembly magic
    pub fn probe(prefix: &[u8]) -> bool {
        prefix.starts_with(&WASM_MAGIC)
    }

    /// Stage the launcher substitution for `request` without modifying it.
    fn stage(&self, request: &ExecRequest) -> Result<Substitution, ExecError> {
        let launcher_path = self.config.launcher_path();

        // Dropping `file` on any error below closes it again.
        let file = open_exec(request.vfs(), launcher_path)?;

        let mut argv = request.argv().try_clone()?;
        argv.remove_arg_zero();
        argv.push_front(request.filename())?;
        argv.push_front(launcher_path)?;

        let identity = request.derive_interpreter(launcher_path, self.name())?;

        Ok(Substitution { argv, identity, file })
    }
}

impl BinaryFormat for WasmBinfmt {
    fn name(&self) -> &'static str {
        "wasm"
    }

    fn load_binary(&self, request: &mut ExecRequest) -> Result<LoadOutcome, ExecError> {
        if !Self::probe(request.prefix()) {
            return Ok(LoadOutcome::NotRecognized);
        }

        let substitution = self.stage(request).map_err(|e| {
            log::debug!("wasm: claim of {} failed: {}", request.filename(), e);
            e
        })?;
        let original = request.substitute(substitution);
        drop(original);

        log::debug!(
            "wasm: {} -> {} (depth {})",
            request.filename(),
            request.interp(),
            request.interp_depth()
        );
        Ok(LoadOutcome::Redispatch)
    }
}

/// Registration lifetime of the WebAssembly format.
///
/// [`init`](Self::init) registers the format with a registry; [`exit`](Self::exit)
/// or dropping the module unregisters it.
pub struct WasmBinfmtModule {
    registry: Arc<FormatRegistry>,
    format: Arc<dyn BinaryFormat>,
    registered: bool,
}

impl WasmBinfmtModule {
    pub fn init(registry: Arc<FormatRegistry>, config: WasmBinfmtConfig) -> Result<Self, RegistryError> {
        log::info!("binfmt_wasm: registering WebAssembly handler (launcher {})", config.launcher_path());
        let format: Arc<dyn BinaryFormat> = Arc::new(WasmBinfmt::new(config));
        registry.register(format.clone())?;
        Ok(Self { registry, format, registered: true })
    }

    pub fn format(&self) -> &Arc<dyn BinaryFormat> {
        &self.format
    }

    pub fn exit(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if !self.registered {
            return;
        }
        self.registered = false;
        if let Err(e) = self.registry.unregister(&self.format) {
            log::warn!("binfmt_wasm: {}", e);
        }
        log::info!("binfmt_wasm: unloaded");
    }
}

impl Drop for WasmBinfmtModule {
    fn drop(&mut self) {
        self.teardown();
    }
}
