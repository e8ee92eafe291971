//! Leveled, ring-buffer-backed logging.
//!
//! Every record is kept in a fixed-capacity ring buffer instead of being
//! written straight to a device, since the kernel this crate models has no
//! real console: the [`machine::Machine`](crate::machine::Machine) trait is
//! the only thing that knows how to turn bytes into device I/O, and logging
//! has to work identically under the mock machine used in tests.

use crate::kutil::ringbuf::RingBuffer;
use alloc::string::String;
use core::sync::atomic::{AtomicU8, Ordering};
use spin::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

pub fn set_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn get_level() -> LogLevel {
    match LOG_LEVEL.load(Ordering::Relaxed) {
        0 => LogLevel::Error,
        1 => LogLevel::Warn,
        2 => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

#[inline]
pub fn is_enabled(level: LogLevel) -> bool {
    level <= get_level()
}

#[derive(Clone)]
pub struct LogRecord {
    pub timestamp_us: u64,
    pub level: LogLevel,
    pub message: String,
}

const LOG_CAPACITY: usize = 256;

struct LogRing {
    inner: RingBuffer<LogRecordSlot, LOG_CAPACITY>,
}

// RingBuffer<T, N> requires T: Copy, so the ring stores a fixed-size byte
// slot rather than the heap-allocated LogRecord directly.
#[derive(Copy, Clone)]
struct LogRecordSlot {
    timestamp_us: u64,
    level: LogLevel,
    len: usize,
    bytes: [u8; 160],
}

static LOG: Mutex<LogRing> = Mutex::new(LogRing {
    inner: RingBuffer::new(),
});

/// Record one log line. Called by the `info!`/`warn!`/`error!`/`debug!`
/// macros; messages longer than the slot capacity are truncated.
pub fn record(level: LogLevel, message: &str) {
    if !is_enabled(level) {
        return;
    }
    let bytes = message.as_bytes();
    let len = bytes.len().min(160);
    let mut slot = LogRecordSlot {
        timestamp_us: crate::time::now_us(),
        level,
        len,
        bytes: [0u8; 160],
    };
    slot.bytes[..len].copy_from_slice(&bytes[..len]);
    LOG.lock().inner.push(slot);
}

/// Drain the current ring contents, oldest first, as owned records.
pub fn drain() -> alloc::vec::Vec<LogRecord> {
    LOG.lock()
        .inner
        .drain_all()
        .into_iter()
        .map(|slot| LogRecord {
            timestamp_us: slot.timestamp_us,
            level: slot.level,
            message: String::from_utf8_lossy(&slot.bytes[..slot.len]).into_owned(),
        })
        .collect()
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log::record($crate::log::LogLevel::Error, &alloc::format!($($arg)*))
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log::record($crate::log::LogLevel::Warn, &alloc::format!($($arg)*))
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log::record($crate::log::LogLevel::Info, &alloc::format!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::log::record($crate::log::LogLevel::Debug, &alloc::format!($($arg)*))
    };
}

/// Minimum log level per build profile.
pub mod policy {
    use super::*;

    pub const PRODUCTION_LEVEL: LogLevel = LogLevel::Warn;
    pub const DEVELOPMENT_LEVEL: LogLevel = LogLevel::Debug;
    pub const TESTING_LEVEL: LogLevel = LogLevel::Debug;

    pub fn set_production() {
        set_level(PRODUCTION_LEVEL);
    }

    pub fn set_development() {
        set_level(DEVELOPMENT_LEVEL);
    }

    pub fn set_testing() {
        set_level(TESTING_LEVEL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_is_dropped() {
        set_level(LogLevel::Error);
        drain();
        record(LogLevel::Debug, "should not appear");
        assert!(drain().is_empty());
        set_level(LogLevel::Info);
    }

    #[test]
    fn records_are_kept_in_order() {
        set_level(LogLevel::Debug);
        drain();
        record(LogLevel::Info, "first");
        record(LogLevel::Info, "second");
        let entries = drain();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].message, "second");
    }
}
