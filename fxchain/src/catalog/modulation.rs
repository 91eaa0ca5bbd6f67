//! Periodic generators and LFO-driven effects.
//!
//! Phase comes from the wrapping tick counter. Sine-shaped curves use
//! `tick / tick_rate` seconds; the other LFO shapes and the triangle
//! generator treat their rate parameter as a period in ticks. Either way a
//! period that does not divide the tick rate jumps when the counter wraps.

use core::f32::consts::TAU;

use libm::sinf;

use crate::constants::{Sample, FLANGE_HISTORY, NUMBER_OF_STEPS};
use crate::dsp::helpers::{centered, percent, step_lag, step_phase, step_swing, uncentered_f32};

use super::{History, TickContext};

/// Sine frequency units per `param1` step.
const SINE_HZ_PER_STEP: f32 = 100.0;

/// Shape of a low-frequency oscillator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    /// Rises and falls linearly over `2 * period` ticks.
    Triangle,
    /// Low for the first half of each period, high for the second.
    Square,
    /// Ramps from 0 to 1 over each period.
    UpSaw,
    /// Ramps from 1 to 0 over each period.
    DownSaw,
    /// Sine at `rate` Hz.
    Sine,
}

impl Waveform {
    /// Decode the `type` parameter: 1 triangle, 2 square, 3 up-saw,
    /// 4 down-saw, anything else sine.
    pub fn from_selector(selector: u16) -> Self {
        match selector {
            1 => Waveform::Triangle,
            2 => Waveform::Square,
            3 => Waveform::UpSaw,
            4 => Waveform::DownSaw,
            _ => Waveform::Sine,
        }
    }

    /// Oscillator value in `0.0..=1.0`.
    ///
    /// `rate` is a period in ticks for the linear shapes (zero acts as one)
    /// and a frequency in Hz for the sine, which is shifted by `phase` radians.
    pub fn value(self, rate: u16, phase: f32, ctx: TickContext) -> f32 {
        let period = rate.max(1) as u32;
        let tick = ctx.tick;
        match self {
            Waveform::Triangle => triangle_unit(tick, period),
            Waveform::Square => {
                if tick % period < period / 2 {
                    0.0
                } else {
                    1.0
                }
            }
            Waveform::UpSaw => (tick % period) as f32 / period as f32,
            Waveform::DownSaw => (period - tick % period) as f32 / period as f32,
            Waveform::Sine => (sinf(TAU * rate as f32 * ctx.seconds() + phase) + 1.0) * 0.5,
        }
    }
}

/// `|tick mod 2p - p| / p`: 1 at the start of each cycle, 0 half-way.
fn triangle_unit(tick: u32, period: u32) -> f32 {
    let position = (tick % (2 * period)) as i64 - period as i64;
    position.unsigned_abs() as f32 / period as f32
}

/// Sine generator: amplitude `amp` steps of swing, `freq * 100` Hz, phase
/// `phase` steps of a turn.
pub fn sine(amp: u16, freq: u16, phase: u16, ctx: TickContext) -> Sample {
    let hz = freq as f32 * SINE_HZ_PER_STEP;
    let x = sinf(TAU * hz * ctx.seconds() + step_phase(phase));
    uncentered_f32(step_swing(amp) * x)
}

/// Triangle generator with a period of `period` ticks and amplitude `amp`
/// steps of swing.
pub fn triangle(period: u16, amp: u16, ctx: TickContext) -> Sample {
    let x = 2.0 * triangle_unit(ctx.tick, period.max(1) as u32) - 1.0;
    uncentered_f32(step_swing(amp) * x)
}

/// Amplitude modulation. At depth 100 the gain swings over `0..=1`, at depth
/// 30 over `0.7..=1`.
pub fn tremolo(v: Sample, depth: u16, rate: u16, phase: u16, selector: u16, ctx: TickContext) -> Sample {
    let depth = percent(depth) as f32 / NUMBER_OF_STEPS as f32;
    let x = Waveform::from_selector(selector).value(rate, step_phase(phase), ctx);
    let gain = 1.0 - depth * (1.0 - x);
    uncentered_f32(centered(v) as f32 * gain)
}

/// Average of the latest sample and one read at an LFO-swept lag of up to
/// `depth` steps of the flange history.
pub fn flange(
    history: &History<'_>,
    rate: u16,
    phase: u16,
    depth: u16,
    selector: u16,
    ctx: TickContext,
) -> Sample {
    let x = Waveform::from_selector(selector).value(rate, step_phase(phase), ctx);
    let max_lag = step_lag(depth, FLANGE_HISTORY);
    let lag = (x * max_lag as f32) as usize;
    let sum = history.latest() as u32 + history.read(0, lag) as u32;
    (sum / 2) as Sample
}
