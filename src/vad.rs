//! Voice activity detector.
//!
//! Threshold comparison against a static silence baseline. A reading whose
//! distance from the baseline exceeds the margin counts as speech.
//!
//! With the default `hold_samples = 1` this is a stateless edge trigger: a
//! single noisy sample starts a recording. Raising `hold_samples` requires
//! that many consecutive over-margin readings instead.

/// Detector thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VadConfig {
    /// Typical reading during silence (8-bit scale).
    pub baseline: u8,
    /// Distance from baseline that counts as speech (strictly greater).
    pub margin: u8,
    /// Consecutive over-margin readings needed to trigger.
    pub hold_samples: u16,
}

impl VadConfig {
    pub const DEFAULT: Self = Self {
        baseline: 120,
        margin: 50,
        hold_samples: 1,
    };
}

impl Default for VadConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Speech onset detector.
#[derive(Clone, Debug)]
pub struct VoiceActivityDetector {
    baseline: i32,
    margin: i32,
    hold: u16,
    run: u16,
}

impl VoiceActivityDetector {
    pub fn new(config: VadConfig) -> Self {
        Self {
            baseline: config.baseline as i32,
            margin: config.margin as i32,
            hold: config.hold_samples.max(1),
            run: 0,
        }
    }

    #[inline]
    pub fn baseline(&self) -> u8 {
        self.baseline as u8
    }

    /// True when `reading` is far enough from the baseline.
    #[inline]
    pub fn exceeds(&self, reading: u16) -> bool {
        (reading as i32 - self.baseline).abs() > self.margin
    }

    /// Feed one reading; true on the reading that completes the trigger.
    #[inline]
    pub fn detect(&mut self, reading: u16) -> bool {
        if !self.exceeds(reading) {
            self.run = 0;
            return false;
        }

        self.run = self.run.saturating_add(1);
        if self.run >= self.hold {
            self.run = 0;
            true
        } else {
            false
        }
    }

    /// Forget any partial run.
    #[inline]
    pub fn reset(&mut self) {
        self.run = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers_on_fourth_reading() {
        let mut vad = VoiceActivityDetector::new(VadConfig::DEFAULT);
        let readings = [120u16, 120, 121, 200];
        let fired: Vec<bool> = readings.iter().map(|&r| vad.detect(r)).collect();
        assert_eq!(fired, vec![false, false, false, true]);
    }

    #[test]
    fn test_margin_is_strict() {
        let mut vad = VoiceActivityDetector::new(VadConfig::DEFAULT);
        assert!(!vad.detect(170)); // |170-120| = 50, not > 50
        assert!(!vad.detect(70));
        assert!(vad.detect(171));
        assert!(vad.detect(69)); // below baseline counts too
    }

    #[test]
    fn test_single_spike_triggers_by_default() {
        let mut vad = VoiceActivityDetector::new(VadConfig::DEFAULT);
        assert!(vad.detect(255));
        assert!(!vad.detect(120));
    }

    #[test]
    fn test_hold_requires_consecutive_readings() {
        let mut vad = VoiceActivityDetector::new(VadConfig {
            hold_samples: 3,
            ..VadConfig::DEFAULT
        });

        assert!(!vad.detect(200));
        assert!(!vad.detect(200));
        assert!(!vad.detect(120)); // run broken
        assert!(!vad.detect(200));
        assert!(!vad.detect(200));
        assert!(vad.detect(200));
    }

    #[test]
    fn test_reset_drops_partial_run() {
        let mut vad = VoiceActivityDetector::new(VadConfig {
            hold_samples: 2,
            ..VadConfig::DEFAULT
        });
        assert!(!vad.detect(0));
        vad.reset();
        assert!(!vad.detect(0));
        assert!(vad.detect(0));
    }
}
