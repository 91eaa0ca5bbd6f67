//! History-reading effects: delay, reverb, and the two-input mixer.

use core::f32::consts::TAU;

use libm::sinf;

use crate::constants::{Sample, DELAY_HISTORY, NUMBER_OF_STEPS};
use crate::dsp::helpers::{centered, percent, step_lag};
use crate::dsp::intrinsics::saturate_sample;

use super::{History, TickContext};

/// The input as it was `length` steps of the delay history ago.
pub fn delay(history: &History<'_>, length: u16) -> Sample {
    history.read(0, step_lag(length, DELAY_HISTORY))
}

/// The previous sample plus a decayed echo.
///
/// The echo lag is `length` steps of the delay history, swept between half
/// and the full lag by a sine at `rate` Hz. `decay` is a percentage.
pub fn reverb(history: &History<'_>, length: u16, decay: u16, rate: u16, ctx: TickContext) -> Sample {
    let sweep = (sinf(TAU * rate as f32 * ctx.seconds()) + 1.0) * 0.25 + 0.5;
    let lag = (step_lag(length, DELAY_HISTORY) as f32 * sweep) as usize;
    let echo = centered(history.read(0, lag)) * percent(decay) as i32 / NUMBER_OF_STEPS as i32;
    saturate_sample(history.read(0, 1) as i32 + echo)
}

/// Blend the two inputs: ratio 0 is input 0 only, `NUMBER_OF_STEPS` input 1
/// only.
pub fn mix(history: &History<'_>, ratio: u16) -> Sample {
    let ratio = percent(ratio) as u32;
    let steps = NUMBER_OF_STEPS as u32;
    let first = history.read(0, 0) as u32;
    let second = history.read(1, 0) as u32;
    ((first * (steps - ratio) + second * ratio) / steps) as Sample
}
