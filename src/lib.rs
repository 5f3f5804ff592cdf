//! # VoiceEcho
//!
//! Voice-activated record and playback with lock-free phase handoff.
//!
//! ## Architecture
//!
//! One fixed buffer, two interrupt handlers, two tasks:
//! - [`SamplingDriver`] (timer ISR) detects speech, then fills the buffer
//! - [`PlaybackDriver`] (PWM clock ISR) replays it with oversampling
//! - [`RecordTask`] and [`PlayTask`] arm the drivers and wait on signals
//! - No mutexes: every field of [`AudioSystem`] has one writer per phase
//!
//! The core is `no_std` and hardware-independent; [`hal`] holds the
//! ESP-IDF adapters.

#![cfg_attr(not(test), no_std)]

#[cfg(target_os = "espidf")]
extern crate alloc;

pub mod audio;
pub mod config;
pub mod error;
pub mod fault;
pub mod filter;
pub mod hal;
pub mod log_globals;
pub mod logging;
pub mod playback;
pub mod sampling;
pub mod signal;
pub mod system;
pub mod tasks;
pub mod uart_logger;
pub mod vad;

pub use config::{EchoConfig, PlaybackTail, BUFFER_LEN, OVERSAMPLING, SAMPLE_RATE_HZ};
pub use error::EchoError;
pub use fault::{FaultCode, FaultState};
pub use log_globals::{ISR_LOG_STREAM, TASK_LOG_STREAM};
pub use playback::{Oversampling, PlaybackDriver, PlaybackTick};
pub use sampling::{SamplingDriver, SamplingTick};
pub use signal::{Acquire, BinarySignal, Timeout};
pub use system::{AudioSystem, Mode};
pub use tasks::{CycleStats, PlayPoll, PlayTask, RecordTask, Signals, TaskContext};
pub use vad::{VadConfig, VoiceActivityDetector};
