//! RT-safe logging for the echo pipeline.
//!
//! # Architecture
//!
//! ```text
//! ISR / task            LogStream             drain loop
//! ──────────            ─────────             ──────────
//!
//! rt_info!() ─────────▶ [L0][L1][L2] ───────▶ UART TX
//! non-blocking           lock-free             blocking ok
//! ```
//!
//! Interrupt handlers must never block, so they never print. They push a
//! formatted line into a [`LogStream`] and move on; the drain loop in
//! [`crate::uart_logger`] writes it out later. A full ring drops the line and
//! counts the drop.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 96;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Timestamp in microseconds.
    pub timestamp_us: i64,
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    pub const EMPTY: Self = Self {
        timestamp_us: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text, or a placeholder if truncation split a UTF-8 sequence.
    pub fn text(&self) -> &str {
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("<invalid utf8>")
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Lock-free log ring: many producers, one drain.
///
/// A producer claims a slot with a CAS on `write_idx`, fills it, then flips
/// the slot's `ready` flag. The drain only consumes ready slots, so a
/// producer preempted mid-write never exposes a torn entry.
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    ready: [AtomicBool; N],
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: Slots are handed out exclusively by the CAS on write_idx and
// returned by the single drain through the ready flags.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        Self {
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            ready: [const { AtomicBool::new(false) }; N],
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push a log entry. Never blocks; safe from interrupt context.
    ///
    /// Returns `false` if the ring was full and the message was dropped.
    #[inline]
    pub fn push(&self, timestamp_us: i64, level: LogLevel, msg: &[u8]) -> bool {
        let mut write = self.write_idx.load(Ordering::Relaxed);
        loop {
            let read = self.read_idx.load(Ordering::Acquire);
            if write.wrapping_sub(read) >= N as u32 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            match self.write_idx.compare_exchange_weak(
                write,
                write.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => write = current,
            }
        }

        let idx = (write as usize) & Self::MASK;
        let len = msg.len().min(MAX_MSG_LEN);

        // SAFETY: The CAS above gave this producer exclusive use of `idx`
        // until the drain observes `ready[idx]`.
        unsafe {
            let entry = &mut (*self.entries.get())[idx];
            entry.timestamp_us = timestamp_us;
            entry.level = level;
            entry.len = len as u8;
            entry.msg[..len].copy_from_slice(&msg[..len]);
        }

        self.ready[idx].store(true, Ordering::Release);
        true
    }

    /// Take the oldest entry. Single consumer only.
    ///
    /// Returns `None` when empty or when the oldest slot is still being
    /// written by a preempted producer.
    #[inline]
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        let idx = (read as usize) & Self::MASK;
        if !self.ready[idx].load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: ready[idx] is set, the producer is done with this slot.
        let entry = unsafe { (*self.entries.get())[idx] };

        self.ready[idx].store(false, Ordering::Relaxed);
        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Read and reset the dropped counter.
    #[inline]
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }

    /// Number of claimed entries not yet drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Format into a fixed buffer, truncating on overflow.
///
/// Returns the number of bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    let mut writer = SliceWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// `core::fmt::Write` over a byte slice; excess output is discarded.
pub struct SliceWriter<'a> {
    pub buf: &'a mut [u8],
    pub pos: usize,
}

impl core::fmt::Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let to_write = bytes.len().min(self.buf.len() - self.pos);
        self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
        self.pos += to_write;
        Ok(())
    }
}

/// RT-safe log macro.
///
/// ```ignore
/// rt_log!(LogLevel::Info, ISR_LOG_STREAM, now_us, "captured {} samples", n);
/// ```
#[macro_export]
macro_rules! rt_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $stream.push($timestamp, $level, &buf[..len]);
    }};
}

#[macro_export]
macro_rules! rt_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! rt_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! rt_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! rt_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::rt_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_stream_basic() {
        let stream = LogStream::<16>::new();

        assert!(stream.push(1000, LogLevel::Info, b"speech detected"));
        assert_eq!(stream.pending(), 1);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.timestamp_us, 1000);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.text(), "speech detected");

        assert!(stream.drain().is_none());
    }

    #[test]
    fn test_full_ring_drops_without_corrupting() {
        let stream = LogStream::<4>::new();

        for i in 0..4 {
            assert!(stream.push(i, LogLevel::Info, b"x"));
        }
        assert!(!stream.push(5, LogLevel::Info, b"dropped"));
        assert_eq!(stream.dropped(), 1);
        assert_eq!(stream.pending(), 4);

        assert_eq!(stream.drain().unwrap().timestamp_us, 0);
        assert!(stream.push(6, LogLevel::Warn, b"after"));

        let mut last = LogEntry::EMPTY;
        while let Some(e) = stream.drain() {
            last = e;
        }
        assert_eq!(last.timestamp_us, 6);
        assert_eq!(last.text(), "after");
        assert_eq!(stream.take_dropped(), 1);
        assert_eq!(stream.dropped(), 0);
    }

    #[test]
    fn test_long_message_truncated() {
        let stream = LogStream::<4>::new();
        let long = [b'a'; MAX_MSG_LEN + 20];
        stream.push(0, LogLevel::Debug, &long);
        assert_eq!(stream.drain().unwrap().len as usize, MAX_MSG_LEN);
    }

    #[test]
    fn test_macro_formats_into_stream() {
        let stream = LogStream::<4>::new();
        crate::rt_warn!(stream, 42, "cursor {} of {}", 7, 8);
        let entry = stream.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.text(), "cursor 7 of 8");
    }

    #[test]
    fn test_concurrent_producers() {
        use std::sync::Arc;
        use std::thread;

        let stream = Arc::new(LogStream::<64>::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let stream = Arc::clone(&stream);
                thread::spawn(move || {
                    for j in 0..10 {
                        let msg = format!("T{}-{}", t, j);
                        stream.push(j, LogLevel::Info, msg.as_bytes());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut count = 0;
        while let Some(e) = stream.drain() {
            assert!(e.text().starts_with('T'));
            count += 1;
        }
        assert_eq!(count, 40);
    }
}
