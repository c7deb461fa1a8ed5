//! Logger backend for the `log` facade.
//!
//! Records are formatted as `[LEVEL] target: message` and written through
//! the early console.

use log::{Level, LevelFilter, Metadata, Record};

struct EarlyconLogger;

impl log::Log for EarlyconLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn  => "WARN ",
            Level::Info  => "INFO ",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        crate::early_println!("[{}] {}: {}", level, record.target(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: EarlyconLogger = EarlyconLogger;

/// Install the earlycon logger with the given level.
///
/// Only the first call installs the logger; later calls just adjust the level.
pub fn init(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_err() {
        crate::early_println!("[logger] already installed, updating level only");
    }
    log::set_max_level(level);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earlycon::{set_console, take_console, tests::Capture, SINK_TEST_LOCK};
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::sync::Arc;
    use spin::Mutex;

    #[test]
    fn test_records_are_formatted_through_earlycon() {
        let _serial = SINK_TEST_LOCK.lock();
        let out = Arc::new(Mutex::new(String::new()));
        let previous = set_console(Box::new(Capture(out.clone())));

        init(LevelFilter::Info);
        init(LevelFilter::Info);
        log::info!(target: "binfmt_wasm", "registering WebAssembly handler");
        log::debug!(target: "binfmt_wasm", "filtered out");

        match previous {
            Some(console) => { set_console(console); }
            None => { take_console(); }
        }
        let out = out.lock();
        assert!(out.contains("[INFO ] binfmt_wasm: registering WebAssembly handler\n"));
        assert!(!out.contains("filtered out"));
    }
}
