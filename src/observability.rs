//! Logging setup and panic capture.
//!
//! # Responsibilities
//! - Install the `tracing` subscriber (filtered by `RUST_LOG`)
//! - Install a panic hook that records the panicking thread's backtrace, so
//!   the recovery middleware can log where the panic happened rather than
//!   where it was caught

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic;
use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

thread_local! {
    static LAST_PANIC: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Default: info level for most crates, debug level for this one
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,snippetbox=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wrap the current panic hook
///
/// The wrapper records location and backtrace for the recovery middleware,
/// then hands the panic to the previous hook, so panics outside a request
/// (startup, spawned tasks) are still reported. Installing twice is a no-op.
pub fn install_panic_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "unknown location".to_string());
            let trace = format!("panicked at {location}\n{}", Backtrace::force_capture());

            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(trace));
            previous(info);
        }));
    });
}

/// Take the backtrace recorded for the most recent panic on this thread
///
/// Falls back to a backtrace of the caller when no hook is installed.
pub fn take_panic_trace() -> String {
    LAST_PANIC
        .with(|slot| slot.borrow_mut().take())
        .unwrap_or_else(|| Backtrace::force_capture().to_string())
}

/// Human-readable panic payload
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_handles_both_string_kinds() {
        let payload = std::panic::catch_unwind(|| panic!("static")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static");

        let n = 3;
        let payload = std::panic::catch_unwind(|| panic!("formatted {n}")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 3");
    }

    #[test]
    fn test_hook_records_panic_location_once() {
        install_panic_hook();
        install_panic_hook();

        let _ = std::panic::catch_unwind(|| panic!("recorded"));
        let trace = take_panic_trace();
        assert!(trace.starts_with("panicked at "), "{trace}");
        assert!(trace.contains("observability.rs"), "{trace}");

        // Slot is emptied by take
        assert!(!take_panic_trace().starts_with("panicked at "));
    }

    #[test]
    fn test_take_panic_trace_always_returns_something() {
        assert!(!take_panic_trace().is_empty());
    }
}
