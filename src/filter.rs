//! Capture smoothing and gain.
//!
//! Single-pole low-pass over the raw readings, then a fixed gain clamped to
//! the 8-bit PWM range. Runs once per captured sample in the timer ISR, so
//! it is a handful of float ops and nothing else.

use crate::config::FilterConfig;

/// Low-pass + gain stage.
#[derive(Clone, Copy, Debug)]
pub struct SmoothingFilter {
    retain: f32,
    blend: f32,
    gain: f32,
}

impl SmoothingFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            retain: config.retain,
            blend: config.blend,
            gain: config.gain,
        }
    }

    /// `state * retain + reading * blend`
    #[inline]
    pub fn step(&self, state: f32, reading: f32) -> f32 {
        state * self.retain + reading * self.blend
    }

    /// Apply gain, clamp to [0, 255], truncate.
    #[inline]
    pub fn amplify(&self, state: f32) -> u8 {
        let amplified = state * self.gain;
        if amplified >= 255.0 {
            255
        } else if amplified > 0.0 {
            amplified as u8
        } else {
            // Negative or NaN
            0
        }
    }
}

impl Default for SmoothingFilter {
    fn default() -> Self {
        Self::new(FilterConfig::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converges_monotonically() {
        let filter = SmoothingFilter::default();
        let mut state = 120.0f32;
        let mut previous = state;

        for i in 1..=70 {
            state = filter.step(state, 200.0);
            assert!(state >= previous, "not monotonic at step {}", i);
            assert!(state <= 200.001, "overshoot at step {}", i);
            previous = state;
            if i == 50 {
                // 80 * 0.85^50
                assert!((200.0 - state - 0.0237).abs() < 1e-3);
            }
        }

        assert!((200.0 - state).abs() < 1e-3);
    }

    #[test]
    fn test_gain_and_clamp() {
        let filter = SmoothingFilter::default();
        assert_eq!(filter.amplify(200.0), 255);
        assert_eq!(filter.amplify(50.0), 80);
        assert_eq!(filter.amplify(0.0), 0);
        assert_eq!(filter.amplify(-5.0), 0);
        assert_eq!(filter.amplify(f32::NAN), 0);
    }

    #[test]
    fn test_custom_coefficients() {
        let filter = SmoothingFilter::new(FilterConfig {
            retain: 0.5,
            blend: 0.5,
            gain: 1.0,
        });
        assert_eq!(filter.step(100.0, 200.0), 150.0);
        assert_eq!(filter.amplify(150.0), 150);
    }
}
