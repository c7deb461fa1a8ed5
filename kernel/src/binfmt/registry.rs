//! Format registry
//!
//! Holds the ordered list of [`BinaryFormat`]s and runs recognition for
//! exec requests. The list is guarded by a reader-writer lock: every
//! recognition pass holds the read side while it offers the request, so
//! [`FormatRegistry::unregister`] cannot return while a pass is still using
//! the format being removed.

use alloc::{sync::Arc, vec::Vec};
use hashbrown::HashSet;
use spin::RwLock;

use super::config::RegistryConfig;
use super::{BinaryFormat, ExecError, ExecRequest, LoadOutcome, LoadedImage, RegistryError};

struct Formats {
    ordered: Vec<Arc<dyn BinaryFormat>>,
    names: HashSet<&'static str>,
}

pub struct FormatRegistry {
    formats: RwLock<Formats>,
    config: RegistryConfig,
}

impl FormatRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            formats: RwLock::new(Formats { ordered: Vec::new(), names: HashSet::new() }),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Append `format`; it is offered requests after every format already registered.
    pub fn register(&self, format: Arc<dyn BinaryFormat>) -> Result<(), RegistryError> {
        self.insert(format, false)
    }

    /// Insert `format` ahead of every format already registered.
    pub fn register_front(&self, format: Arc<dyn BinaryFormat>) -> Result<(), RegistryError> {
        self.insert(format, true)
    }

    fn insert(&self, format: Arc<dyn BinaryFormat>, front: bool) -> Result<(), RegistryError> {
        let name = format.name();
        let mut formats = self.formats.write();
        if !formats.names.insert(name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        if front {
            formats.ordered.insert(0, format);
        } else {
            formats.ordered.push(format);
        }
        log::info!("binfmt: registered {}", name);
        Ok(())
    }

    /// Remove `format`. Waits for recognition passes currently using it.
    pub fn unregister(&self, format: &Arc<dyn BinaryFormat>) -> Result<(), RegistryError> {
        let name = format.name();
        let mut formats = self.formats.write();
        let index = formats
            .ordered
            .iter()
            .position(|registered| Arc::ptr_eq(registered, format))
            .ok_or(RegistryError::NotRegistered(name))?;
        formats.ordered.remove(index);
        formats.names.remove(name);
        log::info!("binfmt: unregistered {}", name);
        Ok(())
    }

    /// Registered format names, in the order they are offered requests
    pub fn formats(&self) -> Vec<&'static str> {
        self.formats.read().ordered.iter().map(|f| f.name()).collect()
    }

    /// Run recognition on `request` until a format commits it.
    ///
    /// A redispatch re-reads the prefix from the new file and starts over
    /// from the first format. A request that has already been redispatched
    /// more than `max_interp_depth` times is refused before any format sees
    /// it again.
    pub fn search_binary_handler(&self, request: &mut ExecRequest) -> Result<LoadedImage, ExecError> {
        loop {
            if request.interp_depth() > self.config.max_interp_depth {
                log::warn!(
                    "binfmt: {} exceeded interpreter depth {}",
                    request.filename(),
                    self.config.max_interp_depth
                );
                return Err(ExecError::FormatLoop { depth: request.interp_depth() });
            }

            match self.offer(request)? {
                LoadOutcome::Commit(image) => return Ok(image),
                LoadOutcome::Redispatch => request.begin_redispatch()?,
                LoadOutcome::NotRecognized => return Err(ExecError::UnknownFormat),
            }
        }
    }

    /// One recognition pass: offer `request` to each format in order.
    fn offer(&self, request: &mut ExecRequest) -> Result<LoadOutcome, ExecError> {
        let formats = self.formats.read();
        for format in formats.ordered.iter() {
            match format.load_binary(request)? {
                LoadOutcome::NotRecognized => continue,
                outcome => {
                    log::debug!("binfmt: {} claimed {}", format.name(), request.filename());
                    return Ok(outcome);
                }
            }
        }
        Ok(LoadOutcome::NotRecognized)
    }
}

impl core::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.formats())
            .field("config", &self.config)
            .finish()
    }
}
