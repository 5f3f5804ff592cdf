//! Runtime fault record.
//!
//! Faults are reported, never retried. A sampling timer that fails to
//! register stalls the cycle for good; this record is what remains for
//! diagnostics.
//!
//! The latest fault is packed into one `AtomicU32` (code in the top byte,
//! cycle number below) so readers never see a code from one fault paired
//! with the cycle of another.

use core::sync::atomic::{AtomicU32, Ordering};

const CODE_SHIFT: u32 = 24;
const CYCLE_MASK: u32 = (1 << CODE_SHIFT) - 1;

/// What failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    None = 0,

    /// Sampling timer registration failed. RecordDone will never fire.
    TimerRegistration = 1,

    /// Sampling timer could not be cancelled after capture.
    TimerCancel = 2,

    /// PWM output or playback clock failed to start.
    /// PlayDone will never fire.
    PlaybackStart = 3,
}

impl FaultCode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::TimerRegistration,
            2 => FaultCode::TimerCancel,
            3 => FaultCode::PlaybackStart,
            _ => FaultCode::None,
        }
    }

    /// Whether the record/play cycle can still make progress.
    pub fn stalls_cycle(self) -> bool {
        matches!(self, FaultCode::TimerRegistration | FaultCode::PlaybackStart)
    }
}

/// Latest fault plus a running count.
///
/// Written by tasks when a collaborator fails, readable from anywhere.
pub struct FaultState {
    /// `code << 24 | cycle`
    last: AtomicU32,
    /// Faults since boot, never cleared.
    count: AtomicU32,
}

impl FaultState {
    pub const fn new() -> Self {
        Self {
            last: AtomicU32::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Record `code` during cycle `cycle` (truncated to 24 bits).
    #[inline]
    pub fn set(&self, code: FaultCode, cycle: u32) {
        let packed = ((code as u32) << CODE_SHIFT) | (cycle & CYCLE_MASK);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.last.store(packed, Ordering::Release);
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.code() != FaultCode::None
    }

    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8((self.last.load(Ordering::Acquire) >> CODE_SHIFT) as u8)
    }

    /// Cycle in which the latest fault happened.
    #[inline]
    pub fn cycle(&self) -> u32 {
        self.last.load(Ordering::Acquire) & CYCLE_MASK
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Drop the active fault. The count is kept.
    #[inline]
    pub fn clear(&self) {
        self.last.store(0, Ordering::Release);
    }

    pub fn snapshot(&self) -> FaultSnapshot {
        let last = self.last.load(Ordering::Acquire);
        FaultSnapshot {
            code: FaultCode::from_u8((last >> CODE_SHIFT) as u8),
            cycle: last & CYCLE_MASK,
            count: self.count(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Consistent copy of [`FaultState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultSnapshot {
    pub code: FaultCode,
    pub cycle: u32,
    pub count: u32,
}

impl FaultSnapshot {
    pub fn is_active(&self) -> bool {
        self.code != FaultCode::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_record_and_clear() {
        let fault = FaultState::new();
        assert!(!fault.is_active());
        assert_eq!(fault.code(), FaultCode::None);

        fault.set(FaultCode::TimerRegistration, 3);

        let snap = fault.snapshot();
        assert!(snap.is_active());
        assert_eq!(snap.code, FaultCode::TimerRegistration);
        assert_eq!(snap.cycle, 3);
        assert_eq!(snap.count, 1);

        fault.clear();
        assert!(!fault.is_active());
        assert_eq!(fault.count(), 1);
    }

    #[test]
    fn test_latest_fault_wins() {
        let fault = FaultState::new();
        fault.set(FaultCode::TimerCancel, 1);
        fault.set(FaultCode::PlaybackStart, 9);

        assert_eq!(fault.code(), FaultCode::PlaybackStart);
        assert_eq!(fault.cycle(), 9);
        assert_eq!(fault.count(), 2);
        assert!(fault.code().stalls_cycle());
        assert!(!FaultCode::TimerCancel.stalls_cycle());
    }

    #[test]
    fn test_cycle_truncated_to_24_bits() {
        let fault = FaultState::new();
        fault.set(FaultCode::TimerCancel, 0x0100_0005);
        assert_eq!(fault.code(), FaultCode::TimerCancel);
        assert_eq!(fault.cycle(), 5);
    }

    #[test]
    fn test_unknown_code_maps_to_none() {
        assert_eq!(FaultCode::from_u8(0xFF), FaultCode::None);
        assert_eq!(FaultCode::from_u8(3), FaultCode::PlaybackStart);
    }
}
