//! Parameter-step scaling and DC-offset sample arithmetic.
//!
//! Samples are unsigned and centred on [`VALUE_ZERO`]. User-facing controls
//! arrive as steps on a `0..=NUMBER_OF_STEPS` scale and are mapped into sample
//! units here so every transfer function scales them the same way.

use core::f32::consts::TAU;

use crate::constants::{Sample, ADC_STEP, NUMBER_OF_STEPS, VALUE_RANGE, VALUE_ZERO};

use super::intrinsics::{saturate_sample, saturate_sample_f32};

/// Half-swing of the signal above [`VALUE_ZERO`], in sample units.
pub const SWING: u16 = VALUE_RANGE - VALUE_ZERO;

/// Absolute sample level for a step: `step * ADC_STEP`.
#[inline(always)]
pub fn step_level(step: u16) -> i32 {
    step as i32 * ADC_STEP as i32
}

/// Swing for a step: `step / NUMBER_OF_STEPS` of [`SWING`].
#[inline(always)]
pub fn step_swing(step: u16) -> f32 {
    step as f32 * SWING as f32 / NUMBER_OF_STEPS as f32
}

/// Phase offset for a step, where `NUMBER_OF_STEPS` is a full turn.
#[inline(always)]
pub fn step_phase(step: u16) -> f32 {
    step as f32 * TAU / NUMBER_OF_STEPS as f32
}

/// Lag for a step, where `NUMBER_OF_STEPS` is `max_lag`.
#[inline(always)]
pub fn step_lag(step: u16, max_lag: usize) -> usize {
    step as usize * max_lag / NUMBER_OF_STEPS as usize
}

/// Clamp a percentage parameter to `0..=NUMBER_OF_STEPS`.
#[inline(always)]
pub fn percent(step: u16) -> u16 {
    step.min(NUMBER_OF_STEPS)
}

/// Signed distance of a sample from [`VALUE_ZERO`].
#[inline(always)]
pub fn centered(sample: Sample) -> i32 {
    sample as i32 - VALUE_ZERO as i32
}

/// Re-apply the DC offset to a centred value, saturating into the sample range.
#[inline(always)]
pub fn uncentered(value: i32) -> Sample {
    saturate_sample(value + VALUE_ZERO as i32)
}

/// Float counterpart of [`uncentered`].
#[inline(always)]
pub fn uncentered_f32(value: f32) -> Sample {
    saturate_sample_f32(value + VALUE_ZERO as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_level() {
        assert_eq!(step_level(0), 0);
        assert_eq!(step_level(50), 1650);
        assert_eq!(step_level(100), 3300);
    }

    #[test]
    fn test_step_swing() {
        assert_eq!(step_swing(0), 0.0);
        assert_eq!(step_swing(100), 1300.0);
        assert_eq!(step_swing(50), 650.0);
    }

    #[test]
    fn test_step_lag() {
        assert_eq!(step_lag(0, 4096), 0);
        assert_eq!(step_lag(50, 4096), 2048);
        assert_eq!(step_lag(100, 256), 256);
    }

    #[test]
    fn test_centering_round_trip() {
        assert_eq!(centered(VALUE_ZERO), 0);
        assert_eq!(centered(1500), -500);
        assert_eq!(uncentered(-500), 1500);
        // below the DC floor saturates at zero
        assert_eq!(uncentered(-5000), 0);
        assert_eq!(uncentered_f32(250.7), 2250);
    }

    #[test]
    fn test_percent_clamps() {
        assert_eq!(percent(30), 30);
        assert_eq!(percent(250), 100);
    }
}
