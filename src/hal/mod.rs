//! Hardware Abstraction Layer for the echo pipeline.
//!
//! Thin wrappers around ESP-IDF peripherals.
//! Business logic stays in core modules, HAL is just I/O.
//!
//! The traits below are the seams the core depends on; the ESP-IDF
//! implementations are only built for `target_os = "espidf"`.

use crate::error::EchoError;

#[cfg(target_os = "espidf")]
pub mod adc;
#[cfg(target_os = "espidf")]
pub mod pwm;
#[cfg(target_os = "espidf")]
pub mod semaphore;
#[cfg(target_os = "espidf")]
pub mod task;
#[cfg(target_os = "espidf")]
pub mod timer;

#[cfg(target_os = "espidf")]
pub use adc::AdcSampleSource;
#[cfg(target_os = "espidf")]
pub use pwm::LedcOutput;
#[cfg(target_os = "espidf")]
pub use semaphore::FreeRtosSignal;
#[cfg(target_os = "espidf")]
pub use task::spawn;
#[cfg(target_os = "espidf")]
pub use timer::{EspPlaybackClock, IsrStop, IsrTimer, SamplingTimer};

/// Hardware timer prescaler: 80 MHz APB / 5.
pub const TIMER_DIVIDER: u32 = 5;

/// Hardware timer tick rate with [`TIMER_DIVIDER`].
pub const TIMER_TICK_HZ: u64 = 80_000_000 / TIMER_DIVIDER as u64;

/// Alarm period firing at exactly `rate_hz`, or `None` if `tick_hz` is not
/// a whole multiple of it.
pub const fn alarm_ticks_for_rate(tick_hz: u64, rate_hz: u32) -> Option<u64> {
    if rate_hz == 0 || tick_hz % rate_hz as u64 != 0 {
        return None;
    }
    Some(tick_hz / rate_hz as u64)
}

/// Alarm period for `interval_us`, or `None` if it is not a whole number
/// of ticks.
pub const fn alarm_ticks_for_interval(tick_hz: u64, interval_us: u32) -> Option<u64> {
    let scaled = tick_hz * interval_us as u64;
    if interval_us == 0 || scaled % 1_000_000 != 0 {
        return None;
    }
    Some(scaled / 1_000_000)
}

/// Microsecond timestamp source used for log lines.
pub type Clock = fn() -> i64;

/// Analog input, one 8-bit-scaled reading per call.
///
/// Called from the sampling timer interrupt: must not block.
pub trait SampleSource {
    fn read(&mut self) -> u16;
}

/// PWM duty output. Called from the playback clock interrupt.
pub trait PwmLevel {
    fn set_level(&mut self, level: u8);
}

/// Periodic timer driving the sampling callback.
///
/// The callback is bound when the implementation is built; this trait only
/// arms and disarms it.
pub trait PeriodicTimer {
    /// Start invoking the callback every `interval_us`.
    fn add_periodic(&mut self, interval_us: u32) -> Result<(), EchoError>;

    /// Stop invoking the callback.
    fn cancel(&mut self) -> Result<(), EchoError>;
}

/// PWM output plus its wrap interrupt, shared by both tasks.
///
/// PlayTask starts it, RecordTask stops it.
pub trait PlaybackClock: Sync {
    /// (Re)initialize PWM and enable the wrap interrupt.
    fn start(&self) -> Result<(), EchoError>;

    /// Disable PWM output and the wrap interrupt.
    fn stop(&self);
}

/// Current time from the ESP high-resolution timer.
#[cfg(target_os = "espidf")]
pub fn now_us() -> i64 {
    // SAFETY: esp_timer_get_time is always safe to call
    unsafe { esp_idf_svc::sys::esp_timer_get_time() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_clock_is_exact() {
        // 16 MHz / 128 kHz
        assert_eq!(TIMER_TICK_HZ, 16_000_000);
        assert_eq!(alarm_ticks_for_rate(TIMER_TICK_HZ, 128_000), Some(125));
    }

    #[test]
    fn test_truncating_rate_rejected() {
        // 1 MHz / 128 kHz would round down to 7 ticks (142.9 kHz)
        assert_eq!(alarm_ticks_for_rate(1_000_000, 128_000), None);
        assert_eq!(alarm_ticks_for_rate(TIMER_TICK_HZ, 0), None);
    }

    #[test]
    fn test_sampling_interval_ticks() {
        assert_eq!(alarm_ticks_for_interval(TIMER_TICK_HZ, 62), Some(992));
        assert_eq!(alarm_ticks_for_interval(TIMER_TICK_HZ, 0), None);
        assert_eq!(alarm_ticks_for_interval(3, 1), None);
    }
}
