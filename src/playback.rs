//! Playback driver: oversampled PWM output.
//!
//! Runs in the playback clock's wrap interrupt at
//! `sample_rate * oversampling`. Each logical sample is held for
//! `oversampling` consecutive invocations, which gives the PWM stage more
//! carrier cycles per sample without a separate rate divider.
//!
//! ```text
//! cursor:  0 1 2 .. 7 | 8 9 .. 15 | ... | 8N-8 .. 8N-1
//! level:   buf[0]     | buf[1]    | ... | buf[N-1]  ──▶ PlayDone
//! ```
//!
//! The cursor never passes `N * factor - 1`. The invocation that outputs
//! the final level releases PlayDone and drops the system out of Playing,
//! so later invocations (until the task disables the clock) are idle.

use crate::config::{ConfigError, PlaybackTail};
use crate::hal::PwmLevel;
use crate::logging::LogStream;
use crate::signal::BinarySignal;
use crate::system::{AudioSystem, Mode};

/// Ratio of playback invocations to logical samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Oversampling {
    factor: u32,
    /// Set when `factor` is a power of two.
    shift: Option<u32>,
}

impl Oversampling {
    pub const fn new(factor: u32) -> Result<Self, ConfigError> {
        if factor == 0 {
            return Err(ConfigError::ZeroOversampling);
        }
        let shift = if factor.is_power_of_two() {
            Some(factor.trailing_zeros())
        } else {
            None
        };
        Ok(Self { factor, shift })
    }

    #[inline]
    pub const fn factor(&self) -> u32 {
        self.factor
    }

    /// Logical sample index for an oversampled cursor.
    #[inline]
    pub const fn logical_index(&self, cursor: u32) -> usize {
        match self.shift {
            Some(shift) => (cursor >> shift) as usize,
            None => (cursor / self.factor) as usize,
        }
    }
}

/// What one playback invocation did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackTick {
    /// Level written, cursor advanced.
    Level(u8),
    /// Final level written, PlayDone released.
    Exhausted(u8),
    /// Not playing; output held or silenced per [`PlaybackTail`].
    Idle,
}

/// Playback clock callback.
///
/// Owned by the playback clock's interrupt closure.
pub struct PlaybackDriver<'a, P, G, const N: usize> {
    system: &'a AudioSystem<N>,
    output: P,
    oversampling: Oversampling,
    tail: PlaybackTail,
    play_done: &'a G,
    log: &'a LogStream,
}

impl<'a, P, G, const N: usize> PlaybackDriver<'a, P, G, N>
where
    P: PwmLevel,
    G: BinarySignal,
{
    pub fn new(
        system: &'a AudioSystem<N>,
        output: P,
        oversampling: Oversampling,
        tail: PlaybackTail,
        play_done: &'a G,
        log: &'a LogStream,
    ) -> Self {
        Self {
            system,
            output,
            oversampling,
            tail,
            play_done,
            log,
        }
    }

    /// Last valid oversampled cursor, `N * factor - 1`.
    #[inline]
    pub fn last_cursor(&self) -> u32 {
        N as u32 * self.oversampling.factor() - 1
    }

    /// Handle one wrap interrupt.
    #[inline]
    pub fn on_wrap(&mut self, now_us: i64) -> PlaybackTick {
        if self.system.mode() != Mode::Playing {
            if self.tail == PlaybackTail::Silence {
                self.output.set_level(0);
            }
            return PlaybackTick::Idle;
        }

        let cursor = self.system.cursor();
        let level = self.system.sample(self.oversampling.logical_index(cursor));
        self.output.set_level(level);

        if cursor < self.last_cursor() {
            self.system.advance_cursor();
            PlaybackTick::Level(level)
        } else {
            self.system.finish_playback();
            self.play_done.release_from_isr();
            crate::rt_info!(self.log, now_us, "Playback done after {} wraps", cursor + 1);
            PlaybackTick::Exhausted(level)
        }
    }

    /// Borrow the output, mostly for inspection in tests.
    pub fn output(&self) -> &P {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_of_two_uses_shift() {
        let os = Oversampling::new(8).unwrap();
        assert_eq!(os.logical_index(0), 0);
        assert_eq!(os.logical_index(7), 0);
        assert_eq!(os.logical_index(8), 1);
        assert_eq!(os.logical_index(511_999), 63_999);
    }

    #[test]
    fn test_non_power_of_two_divides() {
        let os = Oversampling::new(6).unwrap();
        assert_eq!(os.logical_index(5), 0);
        assert_eq!(os.logical_index(6), 1);
        assert_eq!(os.logical_index(17), 2);
    }

    #[test]
    fn test_zero_factor_rejected() {
        assert_eq!(Oversampling::new(0), Err(ConfigError::ZeroOversampling));
        assert_eq!(Oversampling::new(1).unwrap().logical_index(9), 9);
    }
}
