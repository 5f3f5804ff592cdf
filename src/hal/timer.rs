//! General-purpose timers for the sampling and playback interrupts.
//!
//! An [`IsrTimer`] is a handle to one hardware timer running from a 16 MHz
//! tick ([`TIMER_DIVIDER`]). The callback is subscribed after construction so
//! it can capture an [`IsrStop`] for the same timer and halt it from inside
//! the interrupt. Tasks arm and disarm through the handle.

use alloc::boxed::Box;
use core::cell::UnsafeCell;

use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::task::CriticalSection;
use esp_idf_svc::hal::timer::{config::Config as TimerConfig, Timer, TimerDriver};

use super::{
    alarm_ticks_for_interval, alarm_ticks_for_rate, LedcOutput, PeriodicTimer, PlaybackClock,
    PwmLevel, TIMER_DIVIDER,
};
use crate::config::ConfigError;
use crate::error::EchoError;

struct TimerCell {
    driver: UnsafeCell<TimerDriver<'static>>,
    lock: CriticalSection,
}

// SAFETY: Task access goes through `lock`. The only unlocked access is
// IsrStop, which only clears the alarm enable bit.
unsafe impl Sync for TimerCell {}
unsafe impl Send for TimerCell {}

/// Auto-reloading hardware timer firing a subscribed callback.
#[derive(Clone, Copy)]
pub struct IsrTimer {
    cell: &'static TimerCell,
}

/// Stops an [`IsrTimer`] from its own interrupt.
#[derive(Clone, Copy)]
pub struct IsrStop {
    cell: &'static TimerCell,
}

impl IsrStop {
    /// Disable the alarm. Interrupt context only.
    #[inline]
    pub fn stop_from_isr(&self) {
        // SAFETY: Runs in the timer's own ISR; enable_alarm takes the
        // ISR-safe path there and only clears the alarm enable bit.
        let driver = unsafe { &mut *self.cell.driver.get() };
        let _ = driver.enable_alarm(false);
    }
}

impl IsrTimer {
    /// Claim `timer`. Lives for the rest of the program.
    pub fn new<T: Timer>(timer: impl Peripheral<P = T> + 'static) -> Result<Self, EchoError> {
        let config = TimerConfig::new().divider(TIMER_DIVIDER).auto_reload(true);
        let driver = TimerDriver::new(timer, &config)?;
        let cell = Box::leak(Box::new(TimerCell {
            driver: UnsafeCell::new(driver),
            lock: CriticalSection::new(),
        }));
        Ok(Self { cell })
    }

    pub fn isr_stop(&self) -> IsrStop {
        IsrStop { cell: self.cell }
    }

    /// Bind the interrupt callback. Call once, before the first arm.
    pub fn subscribe(&self, callback: impl FnMut() + Send + 'static) -> Result<(), EchoError> {
        let _guard = self.cell.lock.enter();
        // SAFETY: Exclusive access under `lock`
        let driver = unsafe { &mut *self.cell.driver.get() };
        // SAFETY: The callback only touches ISR-safe state (atomics, LogStream,
        // FromISR signal release, raw peripheral registers).
        unsafe {
            driver.subscribe(callback)?;
        }
        Ok(())
    }

    /// Arm with the alarm `period_ticks` computes from the tick rate, or
    /// fail with `inexact` if the period is not a whole number of ticks.
    fn arm_ticks(
        &self,
        period_ticks: impl FnOnce(u64) -> Option<u64>,
        inexact: EchoError,
    ) -> Result<(), EchoError> {
        let _guard = self.cell.lock.enter();
        // SAFETY: Exclusive access under `lock`
        let driver = unsafe { &mut *self.cell.driver.get() };

        let alarm = period_ticks(driver.tick_hz()).ok_or(inexact)?;

        driver.enable(false)?;
        driver.set_counter(0)?;
        driver.set_alarm(alarm)?;
        driver.enable_interrupt()?;
        driver.enable_alarm(true)?;
        driver.enable(true)?;
        Ok(())
    }

    /// Stop firing.
    pub fn disarm(&self) -> Result<(), EchoError> {
        let _guard = self.cell.lock.enter();
        // SAFETY: Exclusive access under `lock`
        let driver = unsafe { &mut *self.cell.driver.get() };
        driver.enable_alarm(false)?;
        driver.enable(false)?;
        Ok(())
    }

    /// Fire every `interval_us` microseconds.
    pub fn arm_interval_us(&self, interval_us: u32) -> Result<(), EchoError> {
        self.arm_ticks(
            |tick_hz| alarm_ticks_for_interval(tick_hz, interval_us),
            EchoError::TimerRegistration,
        )
    }

    /// Fire at exactly `rate_hz`. Fails if the tick rate is not a multiple.
    pub fn arm_rate_hz(&self, rate_hz: u32) -> Result<(), EchoError> {
        self.arm_ticks(
            |tick_hz| alarm_ticks_for_rate(tick_hz, rate_hz),
            EchoError::Config(ConfigError::PlaybackClockRate(rate_hz)),
        )
    }
}

/// Sampling timer: the periodic source for the sampling driver.
pub struct SamplingTimer(IsrTimer);

impl SamplingTimer {
    pub fn new(timer: IsrTimer) -> Self {
        Self(timer)
    }
}

impl PeriodicTimer for SamplingTimer {
    fn add_periodic(&mut self, interval_us: u32) -> Result<(), EchoError> {
        self.0
            .arm_interval_us(interval_us)
            .map_err(|_| EchoError::TimerRegistration)
    }

    fn cancel(&mut self) -> Result<(), EchoError> {
        self.0.disarm().map_err(|_| EchoError::TimerCancel)
    }
}

/// LEDC output plus the timer standing in for its wrap interrupt.
pub struct EspPlaybackClock {
    timer: IsrTimer,
    pwm: LedcOutput,
    rate_hz: u32,
}

impl EspPlaybackClock {
    pub fn new(timer: IsrTimer, pwm: LedcOutput, rate_hz: u32) -> Self {
        Self { timer, pwm, rate_hz }
    }
}

impl PlaybackClock for EspPlaybackClock {
    fn start(&self) -> Result<(), EchoError> {
        let mut pwm = self.pwm;
        pwm.set_level(0);
        self.timer.arm_rate_hz(self.rate_hz)
    }

    fn stop(&self) {
        let _ = self.timer.disarm();
        self.pwm.stop();
    }
}
