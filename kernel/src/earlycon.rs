//! Early console.
//!
//! This module provides a minimal console interface usable before any richer
//! logging is configured. Output goes to the [`Console`] registered with
//! [`set_console`]; while none is registered, output is discarded.

use alloc::boxed::Box;
use core::fmt::{self, Write};
use spin::Mutex;

use crate::traits::console::Console;

#[macro_export]
macro_rules! early_print {
    ($($arg:tt)*) => ($crate::earlycon::print(format_args!($($arg)*)));
}

#[macro_export]
macro_rules! early_println {
    ($fmt:expr) => ($crate::early_print!(concat!($fmt, "\n")));
    ($fmt:expr, $($arg:tt)*) => ($crate::early_print!(concat!($fmt, "\n"), $($arg)*));
}

static CONSOLE: Mutex<Option<Box<dyn Console>>> = Mutex::new(None);

/// Held by tests that swap the console sink.
#[cfg(test)]
pub(crate) static SINK_TEST_LOCK: Mutex<()> = Mutex::new(());

/// Install the console sink, returning the previous one.
pub fn set_console(console: Box<dyn Console>) -> Option<Box<dyn Console>> {
    CONSOLE.lock().replace(console)
}

pub fn take_console() -> Option<Box<dyn Console>> {
    CONSOLE.lock().take()
}

pub fn print(args: fmt::Arguments) {
    let mut guard = CONSOLE.lock();
    if let Some(console) = guard.as_mut() {
        let mut writer = EarlyConsole { console: console.as_mut() };
        // A failing sink has nowhere to report to.
        let _ = writer.write_fmt(args);
    }
}

struct EarlyConsole<'a> {
    console: &'a mut dyn Console,
}

impl Write for EarlyConsole<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.console.write_str(s)
    }
}
