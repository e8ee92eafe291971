//! Lightweight event tracing for the scheduler/SSI/pager, routed through
//! [`crate::log`] instead of a raw UART so it works identically under the
//! mock machine used in tests. Compiled to a no-op unless the
//! `trace-verbose` feature is enabled, keeping normal test runs quiet.

#[cfg(feature = "trace-verbose")]
pub fn event(tag: &str, detail: core::fmt::Arguments) {
    crate::log::record(crate::log::LogLevel::Debug, &alloc::format!("[{}] {}", tag, detail));
}

#[cfg(not(feature = "trace-verbose"))]
pub fn event(_tag: &str, _detail: core::fmt::Arguments) {}

#[macro_export]
macro_rules! trace_event {
    ($tag:expr, $($arg:tt)*) => {
        $crate::trace::event($tag, format_args!($($arg)*))
    };
}
