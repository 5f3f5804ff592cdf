//! Sine wave lookup table for the startup test tone
//!
//! 256-entry table covering one full cycle.
//! Values are unsigned 8-bit PWM levels centred on 127.5.

/// Number of entries in the sine LUT
pub const LUT_SIZE: usize = 256;

/// Pre-computed sine wave lookup table
///
/// `((sin(2π·i/256) + 1) / 2) · 255`, rounded to nearest.
/// Index 0 = 128, 64 = 255 (peak), 192 = 0 (trough).
pub static SINE_LUT_U8: [u8; LUT_SIZE] = {
    let mut table = [0u8; LUT_SIZE];
    let mut i = 0;
    while i < LUT_SIZE {
        let angle = (i as f64) * core::f64::consts::PI * 2.0 / (LUT_SIZE as f64);
        let level = (const_sin(angle) + 1.0) / 2.0 * 255.0;
        let rounded = level + 0.5;
        table[i] = if rounded <= 0.0 {
            0
        } else if rounded >= 255.0 {
            255
        } else {
            rounded as u8
        };
        i += 1;
    }
    table
};

/// Const-compatible sine approximation using Taylor series
const fn const_sin(x: f64) -> f64 {
    // Normalize to [-π, π]
    let mut x = x;
    while x > core::f64::consts::PI {
        x -= 2.0 * core::f64::consts::PI;
    }
    while x < -core::f64::consts::PI {
        x += 2.0 * core::f64::consts::PI;
    }

    // Taylor series to x^11 keeps the error at ±π under one 8-bit step
    let x2 = x * x;
    let x3 = x2 * x;
    let x5 = x3 * x2;
    let x7 = x5 * x2;
    let x9 = x7 * x2;
    let x11 = x9 * x2;

    x - x3 / 6.0 + x5 / 120.0 - x7 / 5040.0 + x9 / 362880.0 - x11 / 39916800.0
}
