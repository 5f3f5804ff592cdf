//! Startup configuration validation tests

use voice_echo::config::{ConfigError, EchoConfig, ToneConfig};
use voice_echo::{EchoError, VadConfig, BUFFER_LEN};

#[test]
fn test_default_is_valid() {
    assert_eq!(EchoConfig::DEFAULT.validate_for(BUFFER_LEN), Ok(()));
}

#[test]
fn test_buffer_mismatch_rejected() {
    let mut cfg = EchoConfig::DEFAULT;
    cfg.record_seconds = 5;
    assert_eq!(
        cfg.validate_for(BUFFER_LEN),
        Err(ConfigError::BufferMismatch {
            expected: 80_000,
            capacity: BUFFER_LEN,
        })
    );
}

#[test]
fn test_zero_values_rejected() {
    let mut cfg = EchoConfig::DEFAULT;
    cfg.oversampling = 0;
    assert_eq!(cfg.validate_for(BUFFER_LEN), Err(ConfigError::ZeroOversampling));

    let mut cfg = EchoConfig::DEFAULT;
    cfg.sample_rate_hz = 0;
    assert_eq!(cfg.validate_for(BUFFER_LEN), Err(ConfigError::SampleRate(0)));

    let mut cfg = EchoConfig::DEFAULT;
    cfg.vad = VadConfig {
        hold_samples: 0,
        ..VadConfig::DEFAULT
    };
    assert_eq!(cfg.validate_for(BUFFER_LEN), Err(ConfigError::ZeroHold));
}

#[test]
fn test_playback_range_overflow_rejected() {
    let mut cfg = EchoConfig::DEFAULT;
    cfg.oversampling = 100_000;
    assert_eq!(cfg.validate_for(BUFFER_LEN), Err(ConfigError::PlaybackRange));
}

#[test]
fn test_inexact_playback_clock_rejected() {
    // 16 kHz x 3 = 48 kHz does not divide the 16 MHz timer clock
    let mut cfg = EchoConfig::DEFAULT;
    cfg.oversampling = 3;
    assert_eq!(
        cfg.validate_for(BUFFER_LEN),
        Err(ConfigError::PlaybackClockRate(48_000))
    );

    cfg.oversampling = 4;
    assert!(cfg.validate_for(BUFFER_LEN).is_ok());
}

#[test]
fn test_tone_at_nyquist_rejected() {
    let mut cfg = EchoConfig::DEFAULT;
    cfg.startup_tone = Some(ToneConfig {
        freq_hz: 8_000,
        duration_ms: 100,
    });
    assert_eq!(cfg.validate_for(BUFFER_LEN), Err(ConfigError::ToneFrequency(8_000)));

    cfg.startup_tone = None;
    assert!(cfg.validate_for(BUFFER_LEN).is_ok());
}

#[test]
fn test_config_error_wraps_into_echo_error() {
    let err: EchoError = ConfigError::ZeroDuration.into();
    assert_eq!(err.code(), "E01");
    assert_eq!(format!("{}", err), "E01: invalid configuration (record duration is zero)");
}
