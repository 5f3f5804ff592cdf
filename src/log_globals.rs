//! Global log stream instances.
//!
//! One stream per execution context class so interrupt lines are drained
//! ahead of task chatter.

use crate::logging::LogStream;

/// Interrupt-context log stream.
///
/// Producers: sampling timer ISR and playback clock ISR.
pub static ISR_LOG_STREAM: LogStream = LogStream::new();

/// Task-context log stream.
///
/// Producers: RecordTask, PlayTask and startup code.
pub static TASK_LOG_STREAM: LogStream = LogStream::new();
