//! Sampling driver: speech detection then capture.
//!
//! Runs in the periodic timer interrupt at the sample rate.
//!
//! # Rules
//!
//! - O(1) per invocation, never blocks, never allocates
//! - Only non-blocking signal release (`release_from_isr`)
//! - Logs only through the RT-safe [`LogStream`]
//!
//! ```text
//! AwaitingSpeech ──VAD──▶ Recording ──N samples──▶ RecordDone
//!   read, detect          read, filter, gain,        (timer stops)
//!                         clamp, store
//! ```

use crate::config::EchoConfig;
use crate::filter::SmoothingFilter;
use crate::hal::SampleSource;
use crate::logging::LogStream;
use crate::signal::BinarySignal;
use crate::system::{AudioSystem, Mode};
use crate::vad::VoiceActivityDetector;

/// What one sampling invocation did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingTick {
    /// Reading below threshold, still waiting.
    Idle,
    /// Speech detected; recording starts with the next invocation.
    Triggered,
    /// One sample stored.
    Captured,
    /// Last sample stored, RecordDone released.
    Completed,
    /// Nothing to do (buffer full or not in a sampling phase).
    Halted,
}

impl SamplingTick {
    /// Whether the timer should keep invoking the driver.
    #[inline]
    pub fn keeps_running(self) -> bool {
        !matches!(self, SamplingTick::Completed | SamplingTick::Halted)
    }
}

/// Periodic capture callback.
///
/// Owned by the sampling timer's interrupt closure.
pub struct SamplingDriver<'a, S, G, const N: usize> {
    system: &'a AudioSystem<N>,
    source: S,
    vad: VoiceActivityDetector,
    filter: SmoothingFilter,
    record_done: &'a G,
    log: &'a LogStream,
}

impl<'a, S, G, const N: usize> SamplingDriver<'a, S, G, N>
where
    S: SampleSource,
    G: BinarySignal,
{
    pub fn new(
        system: &'a AudioSystem<N>,
        source: S,
        config: &EchoConfig,
        record_done: &'a G,
        log: &'a LogStream,
    ) -> Self {
        Self {
            system,
            source,
            vad: VoiceActivityDetector::new(config.vad),
            filter: SmoothingFilter::new(config.filter),
            record_done,
            log,
        }
    }

    /// Handle one timer period.
    ///
    /// # Timing
    ///
    /// One ADC read, a compare or a few float ops, one byte store.
    #[inline]
    pub fn on_tick(&mut self, now_us: i64) -> SamplingTick {
        match self.system.mode() {
            Mode::AwaitingSpeech => self.listen(now_us),
            Mode::Recording => self.capture(now_us),
            Mode::Playing => SamplingTick::Halted,
        }
    }

    fn listen(&mut self, now_us: i64) -> SamplingTick {
        let reading = self.source.read();
        if !self.vad.detect(reading) {
            return SamplingTick::Idle;
        }

        self.system.begin_recording(self.vad.baseline() as f32);
        crate::rt_info!(self.log, now_us, "Speech detected (reading {}), recording", reading);
        SamplingTick::Triggered
    }

    fn capture(&mut self, now_us: i64) -> SamplingTick {
        // Completed earlier; the task has not cancelled the timer yet
        if self.system.is_captured() {
            return SamplingTick::Halted;
        }

        let reading = self.source.read();
        let state = self.filter.step(self.system.filter_state(), reading as f32);
        self.system.set_filter_state(state);

        let count = self.system.store_sample(self.filter.amplify(state));
        if count as usize == N {
            self.vad.reset();
            self.record_done.release_from_isr();
            crate::rt_info!(self.log, now_us, "Captured {} samples", count);
            SamplingTick::Completed
        } else {
            SamplingTick::Captured
        }
    }
}
