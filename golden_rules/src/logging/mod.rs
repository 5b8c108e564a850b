//! Global logging module
//!
//! Thread-safe global logging with a per-thread device context and a small
//! macro interface. Every entry point is a no-op until the global service is
//! initialized, so library code can log unconditionally.

pub mod codes;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{
    ConsoleLogger, Logger, LoggingService, MemoryLogger, NullLogger, StructuredLogger,
};

// ============================================================================
// GLOBAL STATE
// ============================================================================

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

thread_local! {
    static DEVICE_CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize global logging system from runtime preferences
pub fn init_global_logging() -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Configuration validation failed: {}", e))?;

    let logging_service = Arc::new(service::create_configured_service());

    GLOBAL_LOGGER
        .set(logging_service.clone())
        .map_err(|_| "Global logger already initialized")?;

    logging_service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    ));

    Ok(())
}

/// Initialize with custom service (primarily for testing)
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized".to_string())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

/// Safe access to global logger
pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

// ============================================================================
// DEVICE CONTEXT MANAGEMENT
// ============================================================================

pub fn set_device_context(device: &str) {
    DEVICE_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = Some(device.to_string());
    });
}

pub fn clear_device_context() {
    DEVICE_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = None;
    });
}

/// Execute function with the device tagged on every event it logs
pub fn with_device_context<F, R>(device: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let previous = get_current_device_context();
    set_device_context(device);
    let result = f();
    match previous {
        Some(previous) => set_device_context(&previous),
        None => clear_device_context(),
    }
    result
}

/// Get current device context (used by macros)
pub fn get_current_device_context() -> Option<String> {
    DEVICE_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Attach the thread's device context when enabled
pub fn attach_device_context(event: LogEvent) -> LogEvent {
    if !config::include_device_context() || event.context.contains_key("device") {
        return event;
    }
    match get_current_device_context() {
        Some(device) => event.with_context("device", &device),
        None => event,
    }
}

// ============================================================================
// MACRO SUPPORT FUNCTIONS
// ============================================================================

fn dispatch(mut event: LogEvent, context: Vec<(&str, &str)>) {
    let Some(logger) = try_get_global_logger() else {
        return;
    };

    for (key, value) in context {
        event = event.with_context(key, value);
    }

    logger.log_event(attach_device_context(event));
}

/// Log error with context (used by log_error! macro)
pub fn log_error_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::error(code, message), context);
}

/// Log success with context (used by log_success! macro)
pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::success(code, message), context);
}

/// Log info with context (used by log_info! macro)
pub fn log_info_with_context(message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::info(message), context);
}

/// Log warning with context (used by log_warning! macro)
pub fn log_warning_with_context(message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::warning(message), context);
}

/// Log debug with context (used by log_debug! macro)
pub fn log_debug_with_context(message: &str, context: Vec<(&str, &str)>) {
    if config::get_min_log_level() >= LogLevel::Debug {
        dispatch(LogEvent::debug(message), context);
    }
}

/// Safe error logging (falls back to stderr when uninitialized)
pub fn safe_log_error(code: Code, message: &str) {
    if let Some(logger) = try_get_global_logger() {
        logger.log_event(attach_device_context(LogEvent::error(code, message)));
    } else {
        eprintln!("[ERROR] FALLBACK: [{}] {}", code.as_str(), message);
    }
}

/// Get system diagnostics
pub fn get_system_diagnostics() -> String {
    format!(
        "=== Logging System Diagnostics ===\nInitialized: {}\n\n{}",
        is_initialized(),
        config::get_config_summary()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_context_management() {
        assert!(get_current_device_context().is_none());

        set_device_context("rtr-1");
        assert_eq!(get_current_device_context().as_deref(), Some("rtr-1"));

        clear_device_context();
        assert!(get_current_device_context().is_none());
    }

    #[test]
    fn test_with_device_context_restores_previous() {
        set_device_context("outer");

        let result = with_device_context("inner", || {
            assert_eq!(get_current_device_context().as_deref(), Some("inner"));
            42
        });

        assert_eq!(result, 42);
        assert_eq!(get_current_device_context().as_deref(), Some("outer"));
        clear_device_context();
    }

    #[test]
    fn test_attach_device_context() {
        let event = with_device_context("sw-9", || attach_device_context(LogEvent::info("x")));
        assert_eq!(event.context.get("device").map(String::as_str), Some("sw-9"));
    }

    #[test]
    fn test_safe_logging_without_init() {
        safe_log_error(codes::system::INTERNAL_ERROR, "Test error");
        log_info_with_context("ignored", vec![("k", "v")]);
    }

    #[test]
    fn test_diagnostics() {
        let diagnostics = get_system_diagnostics();
        assert!(diagnostics.contains("Logging System Diagnostics"));
    }
}
