//! Shared audio buffer and phase state.
//!
//! # Architecture
//!
//! ```text
//! SamplingDriver ──write──▶ AudioSystem ──read──▶ PlaybackDriver
//!   (timer ISR)            [u8; N] + cursor        (clock ISR)
//!                           mode, counters
//!        RecordTask / PlayTask reset fields at phase boundaries
//! ```
//!
//! # Sole writers
//!
//! There is no lock. Each field has exactly one writer per phase:
//!
//! | field          | AwaitingSpeech | Recording      | Playing        | boundary                |
//! |----------------|----------------|----------------|----------------|-------------------------|
//! | samples        | -              | SamplingDriver | -              | RecordTask (tone load)  |
//! | cursor         | SamplingDriver | SamplingDriver | PlaybackDriver | RecordTask, PlayTask    |
//! | sample_counter | SamplingDriver | SamplingDriver | -              | RecordTask              |
//! | filter_state   | SamplingDriver | SamplingDriver | -              | RecordTask              |
//! | mode           | SamplingDriver | PlayTask       | PlaybackDriver | RecordTask              |
//!
//! Boundary writes happen only while the drivers of the previous phase are
//! stopped or idle, after the task has taken the matching signal. Mode
//! changes are published with `Release` and observed with `Acquire`, which
//! carries visibility of the sample bytes along with them.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::config::BUFFER_LEN;

/// Pipeline phase. Exactly one is current.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Sampling driver runs the detector on every reading.
    AwaitingSpeech = 0,
    /// Sampling driver fills the buffer.
    Recording = 1,
    /// Playback driver reads the buffer.
    Playing = 2,
}

impl Mode {
    #[inline]
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Recording,
            2 => Self::Playing,
            _ => Self::AwaitingSpeech,
        }
    }
}

/// Capture/playback buffer plus the state every context shares.
///
/// Lives in a `static` and is handed to tasks and drivers as
/// `&'static AudioSystem`.
pub struct AudioSystem<const N: usize = BUFFER_LEN> {
    samples: UnsafeCell<[u8; N]>,
    cursor: AtomicU32,
    mode: AtomicU8,
    sample_counter: AtomicU32,
    /// f32 bit pattern.
    filter_state: AtomicU32,
}

// SAFETY: See the sole-writer table in the module docs. Only `samples` is
// non-atomic, and it is written by one context per phase.
unsafe impl<const N: usize> Sync for AudioSystem<N> {}
unsafe impl<const N: usize> Send for AudioSystem<N> {}

impl<const N: usize> AudioSystem<N> {
    /// Create a zeroed system in AwaitingSpeech.
    pub const fn new() -> Self {
        assert!(N > 0, "Audio buffer must not be empty");
        assert!(N <= u32::MAX as usize, "Audio buffer index must fit in u32");

        Self {
            samples: UnsafeCell::new([0u8; N]),
            cursor: AtomicU32::new(0),
            mode: AtomicU8::new(Mode::AwaitingSpeech as u8),
            sample_counter: AtomicU32::new(0),
            filter_state: AtomicU32::new(0),
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        Mode::from_u8(self.mode.load(Ordering::Acquire))
    }

    #[inline]
    pub fn cursor(&self) -> u32 {
        self.cursor.load(Ordering::Acquire)
    }

    #[inline]
    pub fn sample_counter(&self) -> u32 {
        self.sample_counter.load(Ordering::Acquire)
    }

    #[inline]
    pub fn filter_state(&self) -> f32 {
        f32::from_bits(self.filter_state.load(Ordering::Relaxed))
    }

    /// True once the current recording has filled the buffer.
    #[inline]
    pub fn is_captured(&self) -> bool {
        self.sample_counter() as usize >= N
    }

    /// Read one stored sample. Out-of-range indices read as silence.
    ///
    /// Meaningful only outside Recording, once the writer has handed off.
    #[inline]
    pub fn sample(&self, index: usize) -> u8 {
        if index >= N {
            return 0;
        }
        // SAFETY: Byte read; the writer for this phase is not running (see
        // module docs), so no concurrent write to this slot.
        unsafe { (*self.samples.get())[index] }
    }

    /// RecordTask: start a new cycle with the filter seeded at `baseline`.
    ///
    /// Call only with both drivers stopped.
    pub fn rearm(&self, baseline: f32) {
        self.cursor.store(0, Ordering::Relaxed);
        self.sample_counter.store(0, Ordering::Relaxed);
        self.filter_state.store(baseline.to_bits(), Ordering::Relaxed);
        self.mode.store(Mode::AwaitingSpeech as u8, Ordering::Release);
    }

    /// RecordTask: overwrite the buffer from a generator and mark it captured.
    ///
    /// Call only with both drivers stopped.
    pub fn load_with(&self, mut generate: impl FnMut(usize) -> u8) {
        // SAFETY: No driver is running, the calling task is the only writer.
        let samples = unsafe { &mut *self.samples.get() };
        for (i, slot) in samples.iter_mut().enumerate() {
            *slot = generate(i);
        }
        self.cursor.store(N as u32, Ordering::Relaxed);
        self.sample_counter.store(N as u32, Ordering::Relaxed);
        self.mode.store(Mode::Recording as u8, Ordering::Release);
    }

    /// SamplingDriver: speech detected, begin a recording phase.
    pub(crate) fn begin_recording(&self, filter_seed: f32) {
        self.cursor.store(0, Ordering::Relaxed);
        self.sample_counter.store(0, Ordering::Relaxed);
        self.filter_state.store(filter_seed.to_bits(), Ordering::Relaxed);
        self.mode.store(Mode::Recording as u8, Ordering::Release);
    }

    /// SamplingDriver: update the smoothed amplitude.
    #[inline]
    pub(crate) fn set_filter_state(&self, value: f32) {
        self.filter_state.store(value.to_bits(), Ordering::Relaxed);
    }

    /// SamplingDriver: store at the cursor and advance.
    ///
    /// Returns the new sample count. A full buffer ignores the write.
    #[inline]
    pub(crate) fn store_sample(&self, value: u8) -> u32 {
        let cursor = self.cursor.load(Ordering::Relaxed);
        if cursor as usize >= N {
            return self.sample_counter.load(Ordering::Relaxed);
        }

        // SAFETY: Recording phase, the sampling driver is the only writer.
        unsafe {
            (*self.samples.get())[cursor as usize] = value;
        }

        self.cursor.store(cursor + 1, Ordering::Relaxed);
        let count = self.sample_counter.load(Ordering::Relaxed) + 1;
        // Release: the task that wakes on RecordDone sees every byte.
        self.sample_counter.store(count, Ordering::Release);
        count
    }

    /// PlayTask: reset the cursor and enter Playing.
    pub fn begin_playback(&self) {
        self.cursor.store(0, Ordering::Relaxed);
        self.mode.store(Mode::Playing as u8, Ordering::Release);
    }

    /// PlaybackDriver: advance the oversampled cursor.
    #[inline]
    pub(crate) fn advance_cursor(&self) {
        let cursor = self.cursor.load(Ordering::Relaxed);
        self.cursor.store(cursor + 1, Ordering::Relaxed);
    }

    /// PlaybackDriver: buffer exhausted, go idle until the next cycle.
    #[inline]
    pub(crate) fn finish_playback(&self) {
        self.mode.store(Mode::AwaitingSpeech as u8, Ordering::Release);
    }
}

impl<const N: usize> Default for AudioSystem<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_system_awaits_speech() {
        let system = AudioSystem::<16>::new();
        assert_eq!(system.mode(), Mode::AwaitingSpeech);
        assert_eq!(system.cursor(), 0);
        assert_eq!(system.sample_counter(), 0);
        assert_eq!(system.capacity(), 16);
        assert!(!system.is_captured());
    }

    #[test]
    fn test_store_sample_fills_then_ignores() {
        let system = AudioSystem::<4>::new();
        system.begin_recording(120.0);
        assert_eq!(system.mode(), Mode::Recording);
        assert_eq!(system.filter_state(), 120.0);

        for v in 1..=4u8 {
            assert_eq!(system.store_sample(v * 10), v as u32);
        }
        assert!(system.is_captured());
        assert_eq!(system.cursor(), 4);

        // Full buffer: no write, no count
        assert_eq!(system.store_sample(99), 4);
        assert_eq!(system.sample(3), 40);
        assert_eq!(system.sample(4), 0);
    }

    #[test]
    fn test_rearm_clears_cycle_state() {
        let system = AudioSystem::<4>::new();
        system.begin_recording(50.0);
        system.store_sample(1);
        system.begin_playback();
        system.advance_cursor();

        system.rearm(120.0);

        assert_eq!(system.mode(), Mode::AwaitingSpeech);
        assert_eq!(system.cursor(), 0);
        assert_eq!(system.sample_counter(), 0);
        assert_eq!(system.filter_state(), 120.0);
    }

    #[test]
    fn test_load_with_marks_captured() {
        let system = AudioSystem::<8>::new();
        system.load_with(|i| i as u8 * 2);
        assert!(system.is_captured());
        assert_eq!(system.mode(), Mode::Recording);
        assert_eq!(system.sample(7), 14);
    }

    #[test]
    fn test_mode_from_u8_defaults_to_awaiting() {
        assert_eq!(Mode::from_u8(2), Mode::Playing);
        assert_eq!(Mode::from_u8(7), Mode::AwaitingSpeech);
    }
}
