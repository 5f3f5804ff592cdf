//! Host stand-ins for the ESP-IDF adapters.
//!
//! The hardware timers become polling threads spawned with
//! `std::thread::scope`, so drivers can borrow test-local state.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use voice_echo::config::EchoConfig;
use voice_echo::hal::{PeriodicTimer, PlaybackClock, PwmLevel, SampleSource};
use voice_echo::logging::LogStream;
use voice_echo::{Acquire, BinarySignal, EchoError, SamplingTick, Timeout};

/// Fixed test clock.
pub fn zero_clock() -> i64 {
    0
}

/// Default config with a short play poll.
pub fn test_config(sample_rate_hz: u32) -> EchoConfig {
    let mut config = EchoConfig::DEFAULT;
    config.sample_rate_hz = sample_rate_hz;
    config.record_seconds = 1;
    config.play_poll_ms = 5;
    config
}

/// Binary signal on a mutex + condvar.
pub struct CondvarSignal {
    released: Mutex<bool>,
    cv: Condvar,
    releases: AtomicU32,
}

impl CondvarSignal {
    pub fn new() -> Self {
        Self {
            released: Mutex::new(false),
            cv: Condvar::new(),
            releases: AtomicU32::new(0),
        }
    }

    /// Number of release calls, including ones that found it already set.
    pub fn releases(&self) -> u32 {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn is_released(&self) -> bool {
        *self.released.lock().unwrap()
    }
}

impl BinarySignal for CondvarSignal {
    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        *self.released.lock().unwrap() = true;
        self.cv.notify_all();
    }

    fn release_from_isr(&self) {
        self.release();
    }

    fn acquire(&self, timeout: Timeout) -> Acquire {
        let guard = self.released.lock().unwrap();
        let mut guard = match timeout {
            Timeout::Forever => self.cv.wait_while(guard, |released| !*released).unwrap(),
            Timeout::Millis(ms) => {
                let (guard, result) = self
                    .cv
                    .wait_timeout_while(guard, Duration::from_millis(ms as u64), |released| {
                        !*released
                    })
                    .unwrap();
                if result.timed_out() && !*guard {
                    return Acquire::TimedOut;
                }
                guard
            }
        };
        *guard = false;
        Acquire::Signaled
    }
}

/// Replays a fixed list of readings, then repeats `fallback`.
pub struct ScriptedSource {
    readings: Vec<u16>,
    pos: usize,
    fallback: u16,
}

impl ScriptedSource {
    pub fn new(readings: Vec<u16>, fallback: u16) -> Self {
        Self {
            readings,
            pos: 0,
            fallback,
        }
    }

    /// `silent` baseline readings, then `level` forever.
    pub fn speech_after(silent: usize, level: u16) -> Self {
        Self::new(vec![120; silent], level)
    }

    pub fn consumed(&self) -> usize {
        self.pos
    }
}

impl SampleSource for ScriptedSource {
    fn read(&mut self) -> u16 {
        match self.readings.get(self.pos) {
            Some(&reading) => {
                self.pos += 1;
                reading
            }
            None => self.fallback,
        }
    }
}

/// PWM that records every level written.
#[derive(Default)]
pub struct RecordingPwm {
    pub levels: Vec<u8>,
}

impl PwmLevel for RecordingPwm {
    fn set_level(&mut self, level: u8) {
        self.levels.push(level);
    }
}

/// PWM that only counts writes.
#[derive(Default)]
pub struct CountingPwm {
    pub writes: u64,
    pub last: u8,
}

impl PwmLevel for CountingPwm {
    fn set_level(&mut self, level: u8) {
        self.writes += 1;
        self.last = level;
    }
}

/// Gate shared between a [`FakeTimer`] and the thread that ticks the driver.
///
/// `armed` holds the arm generation while running and 0 while stopped, so a
/// late self-stop from one arm cannot stop the next.
pub struct TimerGate {
    armed: AtomicU32,
    pub arms: AtomicU32,
    pub cancels: AtomicU32,
    /// Driver invocations delivered.
    pub ticks: AtomicU32,
    /// Invocations that returned `Halted`.
    pub halted_ticks: AtomicU32,
}

impl TimerGate {
    pub const fn new() -> Self {
        Self {
            armed: AtomicU32::new(0),
            arms: AtomicU32::new(0),
            cancels: AtomicU32::new(0),
            ticks: AtomicU32::new(0),
            halted_ticks: AtomicU32::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.armed.load(Ordering::SeqCst) != 0
    }

    /// Deliver one tick if armed, stopping the gate when the driver asks to.
    ///
    /// Returns false when not armed.
    pub fn tick(&self, on_tick: impl FnOnce() -> SamplingTick) -> bool {
        let generation = self.armed.load(Ordering::SeqCst);
        if generation == 0 {
            return false;
        }
        self.ticks.fetch_add(1, Ordering::SeqCst);
        let tick = on_tick();
        if tick == SamplingTick::Halted {
            self.halted_ticks.fetch_add(1, Ordering::SeqCst);
        }
        if !tick.keeps_running() {
            let _ = self
                .armed
                .compare_exchange(generation, 0, Ordering::SeqCst, Ordering::SeqCst);
        }
        true
    }
}

/// Periodic timer that flips a [`TimerGate`], optionally failing to arm.
pub struct FakeTimer<'a> {
    gate: &'a TimerGate,
    fail_add: bool,
    pub last_interval_us: u32,
}

impl<'a> FakeTimer<'a> {
    pub fn new(gate: &'a TimerGate) -> Self {
        Self {
            gate,
            fail_add: false,
            last_interval_us: 0,
        }
    }

    pub fn failing(gate: &'a TimerGate) -> Self {
        Self {
            gate,
            fail_add: true,
            last_interval_us: 0,
        }
    }
}

impl PeriodicTimer for FakeTimer<'_> {
    fn add_periodic(&mut self, interval_us: u32) -> Result<(), EchoError> {
        if self.fail_add {
            return Err(EchoError::TimerRegistration);
        }
        self.last_interval_us = interval_us;
        let generation = self.gate.arms.fetch_add(1, Ordering::SeqCst) + 1;
        self.gate.armed.store(generation, Ordering::SeqCst);
        Ok(())
    }

    fn cancel(&mut self) -> Result<(), EchoError> {
        self.gate.cancels.fetch_add(1, Ordering::SeqCst);
        self.gate.armed.store(0, Ordering::SeqCst);
        Ok(())
    }
}

/// Playback clock that flips a flag a wrap thread polls.
pub struct FakePlaybackClock {
    active: AtomicBool,
    fail_start: bool,
    pub starts: AtomicU32,
    pub stops: AtomicU32,
}

impl FakePlaybackClock {
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            fail_start: false,
            starts: AtomicU32::new(0),
            stops: AtomicU32::new(0),
        }
    }

    pub const fn failing() -> Self {
        Self {
            active: AtomicBool::new(false),
            fail_start: true,
            starts: AtomicU32::new(0),
            stops: AtomicU32::new(0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl PlaybackClock for FakePlaybackClock {
    fn start(&self) -> Result<(), EchoError> {
        if self.fail_start {
            return Err(EchoError::PwmInit);
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Drain every entry's text from a log stream.
pub fn drain_texts<const N: usize>(log: &LogStream<N>) -> Vec<String> {
    let mut texts = Vec::new();
    while let Some(entry) = log.drain() {
        texts.push(entry.text().to_string());
    }
    texts
}
