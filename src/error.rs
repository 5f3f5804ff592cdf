//! Error types for the echo pipeline.
//!
//! Interrupt handlers never return errors; everything here is produced in
//! task context or during startup.

use core::fmt;

use crate::config::ConfigError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::EspError;

/// Pipeline error with code and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoError {
    /// E01: Configuration rejected at startup
    Config(ConfigError),
    /// E02: Periodic sampling timer could not be registered
    TimerRegistration,
    /// E03: Periodic sampling timer could not be cancelled
    TimerCancel,
    /// E04: PWM output or playback clock failed to start
    PwmInit,
    /// E05: Analog input could not be configured
    AdcInit,
    /// E06: Binary signal could not be allocated
    SignalCreate,
    /// E07: Task could not be created
    TaskCreate,
    /// E08: Raw ESP-IDF error
    #[cfg(target_os = "espidf")]
    Esp(EspError),
}

impl EchoError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "E01",
            Self::TimerRegistration => "E02",
            Self::TimerCancel => "E03",
            Self::PwmInit => "E04",
            Self::AdcInit => "E05",
            Self::SignalCreate => "E06",
            Self::TaskCreate => "E07",
            #[cfg(target_os = "espidf")]
            Self::Esp(_) => "E08",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Config(_) => "invalid configuration",
            Self::TimerRegistration => "failed to add timer",
            Self::TimerCancel => "failed to cancel timer",
            Self::PwmInit => "PWM start failed",
            Self::AdcInit => "ADC init failed",
            Self::SignalCreate => "signal allocation failed",
            Self::TaskCreate => "task creation failed",
            #[cfg(target_os = "espidf")]
            Self::Esp(_) => "ESP-IDF error",
        }
    }
}

impl fmt::Display for EchoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(cause) => write!(f, "{}: {} ({})", self.code(), self.message(), cause),
            #[cfg(target_os = "espidf")]
            Self::Esp(cause) => write!(f, "{}: {} ({})", self.code(), self.message(), cause),
            _ => write!(f, "{}: {}", self.code(), self.message()),
        }
    }
}

impl From<ConfigError> for EchoError {
    fn from(e: ConfigError) -> Self {
        EchoError::Config(e)
    }
}

#[cfg(target_os = "espidf")]
impl From<EspError> for EchoError {
    fn from(e: EspError) -> Self {
        EchoError::Esp(e)
    }
}
