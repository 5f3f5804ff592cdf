//! RecordTask and PlayTask: the two scheduled control loops.
//!
//! # Cycle
//!
//! ```text
//! RecordTask                         PlayTask
//! ──────────                         ────────
//! rearm, arm sampling timer
//! wait RecordDone ◀── SamplingDriver
//! cancel timer, release PlayInit ──▶ wait PlayInit (500 ms re-poll)
//!                                    cursor = 0, Playing, start PWM
//! wait PlayDone ◀──────────────────── PlaybackDriver
//! stop PWM, next cycle
//! ```
//!
//! Tasks touch the shared state only at phase boundaries, after taking the
//! signal that ends the previous phase. Nothing is cancelled mid-phase.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::audio::tone::load_test_tone;
use crate::config::EchoConfig;
use crate::error::EchoError;
use crate::fault::{FaultCode, FaultState};
use crate::hal::{Clock, PeriodicTimer, PlaybackClock};
use crate::logging::LogStream;
use crate::signal::{Acquire, BinarySignal, Timeout};
use crate::system::AudioSystem;

/// The three one-shot signals linking drivers and tasks.
pub struct Signals<'a, G> {
    /// SamplingDriver → RecordTask: buffer full.
    pub record_done: &'a G,
    /// RecordTask → PlayTask: start playback.
    pub play_init: &'a G,
    /// PlaybackDriver → RecordTask: buffer exhausted.
    pub play_done: &'a G,
}

impl<G> Clone for Signals<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G> Copy for Signals<'_, G> {}

/// Counters readable from any context.
pub struct CycleStats {
    cycles: AtomicU32,
    tone_runs: AtomicU32,
    timer_faults: AtomicU32,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycles: AtomicU32::new(0),
            tone_runs: AtomicU32::new(0),
            timer_faults: AtomicU32::new(0),
        }
    }

    /// Completed record/play cycles since boot.
    #[inline]
    pub fn cycles(&self) -> u32 {
        self.cycles.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn tone_runs(&self) -> u32 {
        self.tone_runs.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn timer_faults(&self) -> u32 {
        self.timer_faults.load(Ordering::Relaxed)
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, non-hardware context both tasks need.
#[derive(Clone, Copy)]
pub struct TaskContext<'a, const N: usize> {
    pub system: &'a AudioSystem<N>,
    pub config: &'a EchoConfig,
    pub stats: &'a CycleStats,
    pub fault: &'a FaultState,
    pub log: &'a LogStream,
    pub clock: Clock,
}

/// Arms capture, hands off to playback, waits for the round trip.
pub struct RecordTask<'a, T, C, G, const N: usize> {
    ctx: TaskContext<'a, N>,
    timer: T,
    playback: &'a C,
    signals: Signals<'a, G>,
}

impl<'a, T, C, G, const N: usize> RecordTask<'a, T, C, G, N>
where
    T: PeriodicTimer,
    C: PlaybackClock,
    G: BinarySignal,
{
    pub fn new(ctx: TaskContext<'a, N>, timer: T, playback: &'a C, signals: Signals<'a, G>) -> Self {
        Self {
            ctx,
            timer,
            playback,
            signals,
        }
    }

    /// Play the configured startup tone once. No-op without one.
    ///
    /// Call before the first cycle, with both drivers stopped.
    pub fn play_startup_tone(&mut self) {
        let Some(tone) = self.ctx.config.startup_tone else {
            return;
        };
        let now = (self.ctx.clock)();

        load_test_tone(
            self.ctx.system,
            tone.freq_hz,
            self.ctx.config.sample_rate_hz,
            self.ctx.config.tone_samples(),
        );
        crate::rt_info!(self.ctx.log, now, "Test tone {} Hz, {} ms", tone.freq_hz, tone.duration_ms);

        self.play_and_wait();
        self.ctx.stats.tone_runs.fetch_add(1, Ordering::Relaxed);
    }

    /// Run one full listen → record → play cycle.
    ///
    /// Blocks until playback finishes. If the sampling timer cannot be
    /// registered the fault is recorded and this never returns: nothing
    /// else will release RecordDone.
    pub fn run_cycle(&mut self) {
        let ctx = self.ctx;

        // 1. Reset
        ctx.system.rearm(ctx.config.vad.baseline as f32);

        // 2. Arm sampling
        if let Err(e) = self.timer.add_periodic(ctx.config.sampling_period_us()) {
            ctx.stats.timer_faults.fetch_add(1, Ordering::Relaxed);
            ctx.fault.set(FaultCode::TimerRegistration, ctx.stats.cycles());
            crate::rt_error!(ctx.log, (ctx.clock)(), "Failed to add timer: {}", e);
        } else {
            crate::rt_debug!(ctx.log, (ctx.clock)(), "Listening (cycle {})", ctx.stats.cycles());
        }

        // 3. Wait for the capture
        self.signals.record_done.acquire(Timeout::Forever);

        // 4. Stop sampling, hand over to playback
        if let Err(e) = self.timer.cancel() {
            ctx.fault.set(FaultCode::TimerCancel, ctx.stats.cycles());
            crate::rt_warn!(ctx.log, (ctx.clock)(), "Timer cancel failed: {}", e);
        }
        crate::rt_info!(ctx.log, (ctx.clock)(), "Recording finished, ready to play");

        // 5 + 6. Play, wait, disable PWM
        self.play_and_wait();
        ctx.stats.cycles.fetch_add(1, Ordering::Relaxed);
    }

    fn play_and_wait(&mut self) {
        self.signals.play_init.release();
        self.signals.play_done.acquire(Timeout::Forever);
        self.playback.stop();
    }

    /// Task entry: tone once, then cycle forever.
    pub fn run(mut self) -> ! {
        self.play_startup_tone();
        loop {
            self.run_cycle();
        }
    }
}

/// Result of one PlayTask poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayPoll {
    /// No trigger within the poll interval.
    Idle,
    /// Playback armed and clock started.
    Started,
}

/// Waits for the play trigger and starts the playback clock.
pub struct PlayTask<'a, C, G, const N: usize> {
    ctx: TaskContext<'a, N>,
    playback: &'a C,
    play_init: &'a G,
}

impl<'a, C, G, const N: usize> PlayTask<'a, C, G, N>
where
    C: PlaybackClock,
    G: BinarySignal,
{
    pub fn new(ctx: TaskContext<'a, N>, playback: &'a C, play_init: &'a G) -> Self {
        Self {
            ctx,
            playback,
            play_init,
        }
    }

    /// Wait up to the poll interval for PlayInit; start playback if it came.
    pub fn poll(&mut self) -> Result<PlayPoll, EchoError> {
        let timeout = Timeout::Millis(self.ctx.config.play_poll_ms);
        if self.play_init.acquire(timeout) == Acquire::TimedOut {
            return Ok(PlayPoll::Idle);
        }

        self.ctx.system.begin_playback();
        self.playback.start()?;
        crate::rt_info!(
            self.ctx.log,
            (self.ctx.clock)(),
            "Playing {} samples",
            self.ctx.system.capacity()
        );
        Ok(PlayPoll::Started)
    }

    /// Task entry: poll forever.
    pub fn run(mut self) -> ! {
        loop {
            if let Err(e) = self.poll() {
                // RecordTask stays parked on PlayDone; the fault is the only trace
                self.ctx.fault.set(FaultCode::PlaybackStart, self.ctx.stats.cycles());
                crate::rt_error!(self.ctx.log, (self.ctx.clock)(), "Playback start failed: {}", e);
            }
        }
    }
}
