use core::fmt;

/// Byte sink for early console output.
///
/// Implemented by whatever the embedding kernel uses for boot-time output
/// (a UART, a ring buffer, a test capture).
pub trait Console: Send {
    fn write_str(&mut self, s: &str) -> fmt::Result;

    fn flush(&mut self) {}
}
