//! One-shot binary signals between drivers and tasks.
//!
//! A signal counts to one: releasing an already-released signal is a no-op,
//! and one acquire consumes it. It is a wake-up handoff, not a lock.
//!
//! Interrupt handlers only ever call [`BinarySignal::release_from_isr`].
//! Tasks call [`BinarySignal::acquire`], which may block.

/// How long [`BinarySignal::acquire`] may block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timeout {
    /// Block until released.
    Forever,
    /// Give up after this many milliseconds.
    Millis(u32),
}

/// Outcome of [`BinarySignal::acquire`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acquire {
    Signaled,
    TimedOut,
}

/// Binary semaphore used as a one-shot wake-up.
pub trait BinarySignal: Sync {
    /// Release from task context.
    fn release(&self);

    /// Release from interrupt context. Must never block.
    fn release_from_isr(&self);

    /// Wait for a release, consuming it.
    fn acquire(&self, timeout: Timeout) -> Acquire;
}
