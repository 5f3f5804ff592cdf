//! Module: config
//!
//! Purpose: Static configuration for the voice echo pipeline.
//!
//! Architecture:
//! - Compile-time constants size the static sample buffer
//! - [`EchoConfig`] carries every tunable, with `EchoConfig::DEFAULT`
//!   matching the shipped firmware
//! - Validated once at startup against the buffer capacity; never changes
//!   afterwards, so interrupt handlers read plain copies
//!
//! Safety: Safe. Copy types only.

use core::fmt;

use crate::hal::{alarm_ticks_for_rate, TIMER_TICK_HZ};
use crate::vad::VadConfig;

/// Capture sample rate in Hz.
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Length of one recording in seconds.
pub const RECORD_SECONDS: u32 = 4;

/// Number of 8-bit samples in the shared buffer.
pub const BUFFER_LEN: usize = (SAMPLE_RATE_HZ * RECORD_SECONDS) as usize;

/// Playback driver invocations per logical sample.
pub const OVERSAMPLING: u32 = 8;

/// What the PWM shows once playback has run out of samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackTail {
    /// Keep the final sample level until PWM is disabled.
    Hold,
    /// Drive level 0 on every idle invocation.
    Silence,
}

/// Smoothing + gain coefficients for the capture path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterConfig {
    /// Weight of the previous filter state.
    pub retain: f32,
    /// Weight of the new reading.
    pub blend: f32,
    /// Output gain applied before clamping to 8 bits.
    pub gain: f32,
}

impl FilterConfig {
    pub const DEFAULT: Self = Self {
        retain: 0.85,
        blend: 0.15,
        gain: 1.6,
    };
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Self-test tone played once before the first listening cycle.
///
/// Opt-in: with a tone set, the first cycle only starts listening after the
/// whole buffer (tone, then silence) has played.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToneConfig {
    pub freq_hz: u32,
    pub duration_ms: u32,
}

/// GPIO assignment for the analog input and PWM output.
///
/// The log UART is fixed to UART1 TX on GPIO6.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinConfig {
    pub audio_in: i32,
    pub audio_out: i32,
}

/// Complete pipeline configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EchoConfig {
    /// Capture rate in Hz (sampling timer frequency).
    pub sample_rate_hz: u32,
    /// Recording length in seconds.
    pub record_seconds: u32,
    /// Playback invocations per logical sample.
    pub oversampling: u32,
    /// Speech onset detector thresholds.
    pub vad: VadConfig,
    /// Capture smoothing and gain.
    pub filter: FilterConfig,
    /// PlayTask wait on the play trigger before re-polling.
    pub play_poll_ms: u32,
    /// Output behavior after the last sample.
    pub tail: PlaybackTail,
    /// Optional tone played once at boot. Off by default.
    pub startup_tone: Option<ToneConfig>,
    /// Right shift from raw ADC counts to 8-bit readings (12-bit ADC: 4).
    pub adc_shift: u8,
    pub pins: PinConfig,
}

impl EchoConfig {
    pub const DEFAULT: Self = Self {
        sample_rate_hz: SAMPLE_RATE_HZ,
        record_seconds: RECORD_SECONDS,
        oversampling: OVERSAMPLING,
        vad: VadConfig::DEFAULT,
        filter: FilterConfig::DEFAULT,
        play_poll_ms: 500,
        tail: PlaybackTail::Hold,
        startup_tone: None,
        adc_shift: 4,
        pins: PinConfig {
            audio_in: 7,
            audio_out: 8,
        },
    };

    /// Samples captured per recording.
    #[inline]
    pub const fn buffer_len(&self) -> usize {
        (self.sample_rate_hz as usize) * (self.record_seconds as usize)
    }

    /// Sampling timer period, truncated to whole microseconds.
    #[inline]
    pub const fn sampling_period_us(&self) -> u32 {
        1_000_000 / self.sample_rate_hz
    }

    /// Playback clock rate (wrap interrupts per second).
    #[inline]
    pub const fn playback_rate_hz(&self) -> u32 {
        self.sample_rate_hz * self.oversampling
    }

    /// Number of samples the startup tone covers.
    #[inline]
    pub fn tone_samples(&self) -> usize {
        match self.startup_tone {
            Some(tone) => {
                let samples = self.sample_rate_hz as u64 * tone.duration_ms as u64 / 1000;
                (samples as usize).min(self.buffer_len())
            }
            None => 0,
        }
    }

    /// Check the configuration against a buffer of `capacity` samples.
    pub fn validate_for(&self, capacity: usize) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 || self.sample_rate_hz > 1_000_000 {
            return Err(ConfigError::SampleRate(self.sample_rate_hz));
        }
        if self.record_seconds == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.oversampling == 0 {
            return Err(ConfigError::ZeroOversampling);
        }
        if self.buffer_len() != capacity {
            return Err(ConfigError::BufferMismatch {
                expected: self.buffer_len(),
                capacity,
            });
        }
        if (capacity as u64) * (self.oversampling as u64) > u32::MAX as u64 {
            return Err(ConfigError::PlaybackRange);
        }
        if alarm_ticks_for_rate(TIMER_TICK_HZ, self.playback_rate_hz()).is_none() {
            return Err(ConfigError::PlaybackClockRate(self.playback_rate_hz()));
        }
        if self.vad.hold_samples == 0 {
            return Err(ConfigError::ZeroHold);
        }
        if let Some(tone) = self.startup_tone {
            if tone.freq_hz == 0 || tone.freq_hz as u64 * 2 >= self.sample_rate_hz as u64 {
                return Err(ConfigError::ToneFrequency(tone.freq_hz));
            }
        }
        Ok(())
    }
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Configuration rejected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Sample rate is zero or above 1 MHz.
    SampleRate(u32),
    ZeroDuration,
    ZeroOversampling,
    /// `sample_rate * record_seconds` does not match the static buffer.
    BufferMismatch { expected: usize, capacity: usize },
    /// `capacity * oversampling` does not fit the playback cursor.
    PlaybackRange,
    /// Playback clock rate does not divide the hardware timer clock.
    PlaybackClockRate(u32),
    /// Detector needs at least one reading to trigger.
    ZeroHold,
    /// Tone is zero or at/above Nyquist.
    ToneFrequency(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SampleRate(hz) => write!(f, "sample rate {} Hz out of range", hz),
            Self::ZeroDuration => write!(f, "record duration is zero"),
            Self::ZeroOversampling => write!(f, "oversampling factor is zero"),
            Self::BufferMismatch { expected, capacity } => write!(
                f,
                "buffer holds {} samples, config needs {}",
                capacity, expected
            ),
            Self::PlaybackRange => write!(f, "playback cursor range exceeds u32"),
            Self::PlaybackClockRate(hz) => {
                write!(f, "playback clock {} Hz does not divide the timer clock", hz)
            }
            Self::ZeroHold => write!(f, "detector hold must be at least 1 sample"),
            Self::ToneFrequency(hz) => write!(f, "tone {} Hz not below Nyquist", hz),
        }
    }
}
