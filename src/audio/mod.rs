//! Audio helpers outside the record/playback hot path
//!
//! - Sine LUT (8-bit unsigned, const-evaluated)
//! - Startup test tone loaded into the shared buffer

pub mod lut;
pub mod tone;

pub use lut::{LUT_SIZE, SINE_LUT_U8};
pub use tone::{load_test_tone, ToneGenerator};
