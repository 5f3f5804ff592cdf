//! Test tone generator with phase accumulator
//!
//! Fills the shared buffer with a sine tone so the PWM path can be checked
//! by ear at boot without anyone speaking.

use super::lut::{LUT_SIZE, SINE_LUT_U8};
use crate::system::AudioSystem;

/// Level written after the tone ends (PWM duty 0, as after power-up).
pub const SILENCE_LEVEL: u8 = 0;

/// Sine tone generator
///
/// 32-bit phase accumulator, top 8 bits index the LUT.
pub struct ToneGenerator {
    phase: u32,
    phase_inc: u32,
}

impl ToneGenerator {
    /// Create a generator for `freq_hz` at `sample_rate` samples per second.
    pub fn new(freq_hz: u32, sample_rate: u32) -> Self {
        Self {
            phase: 0,
            phase_inc: Self::calc_phase_inc(freq_hz, sample_rate),
        }
    }

    /// phase_inc = (freq * 2^32) / sample_rate
    #[inline]
    fn calc_phase_inc(freq_hz: u32, sample_rate: u32) -> u32 {
        ((freq_hz as u64 * (1u64 << 32)) / sample_rate.max(1) as u64) as u32
    }

    /// Generate next 8-bit sample
    #[inline]
    pub fn next_sample(&mut self) -> u8 {
        let idx = (self.phase >> 24) as usize;
        self.phase = self.phase.wrapping_add(self.phase_inc);
        SINE_LUT_U8[idx % LUT_SIZE]
    }
}

/// Overwrite `system` with `tone_samples` of tone followed by silence.
///
/// Task context only, with both drivers stopped.
pub fn load_test_tone<const N: usize>(
    system: &AudioSystem<N>,
    freq_hz: u32,
    sample_rate: u32,
    tone_samples: usize,
) {
    let mut tone = ToneGenerator::new(freq_hz, sample_rate);
    system.load_with(|i| {
        if i < tone_samples {
            tone.next_sample()
        } else {
            SILENCE_LEVEL
        }
    });
}
