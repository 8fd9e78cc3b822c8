//! Tracing and logging (shared process setup).

/// Log output format and subscriber installation.
pub mod logging;

pub use logging::LogFormat;

/// Initialize process-wide logging, honouring `SCANCART_LOG_FORMAT`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    logging::init(LogFormat::from_env());
}

/// Initialize process-wide logging with an explicit format.
pub fn init_with(format: LogFormat) {
    logging::init(format);
}
