//! Amplitude-domain shaping: clamps, compressors, quantiser, clipper, gate.

use crate::constants::{Sample, VALUE_ZERO};
use crate::dsp::helpers::{centered, step_level, step_swing, uncentered};
use crate::dsp::intrinsics::saturate_sample;

use super::History;

/// Bits of resolution the converters deliver.
const CONVERTER_BITS: u16 = 12;

/// Noise-gate tolerance per `param0` step, in sample units.
const GATE_STEP: u32 = 5;

/// Cap at `step * ADC_STEP`.
pub fn clamp_max(v: Sample, step: u16) -> Sample {
    v.min(saturate_sample(step_level(step)))
}

/// Floor at `step * ADC_STEP`.
pub fn clamp_min(v: Sample, step: u16) -> Sample {
    v.max(saturate_sample(step_level(step)))
}

/// Divide the excess above `VALUE_ZERO + threshold` by `ratio` (0 acts as 1).
pub fn upward_compressor(v: Sample, threshold: u16, ratio: u16) -> Sample {
    let threshold = VALUE_ZERO as i32 + step_swing(threshold) as i32;
    let ratio = ratio.max(1) as i32;
    let v = v as i32;
    if v > threshold {
        saturate_sample(threshold + (v - threshold) / ratio)
    } else {
        v as Sample
    }
}

/// Divide the excess below `VALUE_ZERO - threshold` by `ratio` (0 acts as 1).
pub fn downward_compressor(v: Sample, threshold: u16, ratio: u16) -> Sample {
    let threshold = VALUE_ZERO as i32 - step_swing(threshold) as i32;
    let ratio = ratio.max(1) as i32;
    let v = v as i32;
    if v < threshold {
        saturate_sample(threshold - (threshold - v) / ratio)
    } else {
        v as Sample
    }
}

/// Keep the top `bits` of a 12-bit sample.
pub fn bit_reduce(v: Sample, bits: u16) -> Sample {
    let shift = CONVERTER_BITS - bits.min(CONVERTER_BITS);
    (v >> shift) << shift
}

/// Clip the swing to `step` of the full swing either side of centre.
pub fn distortion(v: Sample, step: u16) -> Sample {
    let limit = step_swing(step) as i32;
    uncentered(centered(v).clamp(-limit, limit))
}

/// Replace the latest sample with the average of the `window` before it
/// when the two differ by more than `tolerance * 5`.
///
/// The window is clamped to what the input buffer holds.
pub fn noise_gate(history: &History<'_>, tolerance: u16, window: u16) -> Sample {
    let v = history.latest();
    let window = (window as usize).clamp(1, history.capacity(0).saturating_sub(1).max(1));
    let sum: u32 = (1..=window).map(|lag| history.read(0, lag) as u32).sum();
    let avg = sum / window as u32;
    if avg.abs_diff(v as u32) > tolerance as u32 * GATE_STEP {
        avg as Sample
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::CircularBuffer;
    use crate::pool::SampleArena;

    #[test]
    fn clamp_max_caps_at_step() {
        assert_eq!(clamp_max(3000, 50), 1650);
        assert_eq!(clamp_max(1000, 50), 1000);
        assert_eq!(clamp_max(3300, 100), 3300);
    }

    #[test]
    fn clamp_min_floors_at_step() {
        assert_eq!(clamp_min(1000, 50), 1650);
        assert_eq!(clamp_min(3000, 50), 3000);
    }

    #[test]
    fn upward_compressor_divides_excess() {
        // threshold = 2000 + 650 = 2650; excess 400 / 4 = 100
        assert_eq!(upward_compressor(3050, 50, 4), 2750);
        assert_eq!(upward_compressor(2500, 50, 4), 2500);
        // ratio 0 behaves as 1
        assert_eq!(upward_compressor(3050, 50, 0), 3050);
    }

    #[test]
    fn downward_compressor_divides_deficit() {
        // threshold = 2000 - 650 = 1350; deficit 350 / 2 = 175
        assert_eq!(downward_compressor(1000, 50, 2), 1175);
        assert_eq!(downward_compressor(1500, 50, 2), 1500);
    }

    #[test]
    fn bit_reduce_drops_low_bits() {
        assert_eq!(bit_reduce(0x0FFF, 12), 0x0FFF);
        assert_eq!(bit_reduce(0x0FFF, 4), 0x0F00);
        assert_eq!(bit_reduce(0x0FFF, 0), 0);
        // above 12 bits is treated as 12
        assert_eq!(bit_reduce(0x0ABC, 16), 0x0ABC);
    }

    #[test]
    fn distortion_clips_both_sides() {
        // 10 steps = 130 sample units of swing
        assert_eq!(distortion(3000, 10), 2130);
        assert_eq!(distortion(1000, 10), 1870);
        assert_eq!(distortion(2050, 10), 2050);
        assert_eq!(distortion(3000, 0), VALUE_ZERO);
    }

    #[test]
    fn noise_gate_replaces_outliers() {
        let mut arena = SampleArena::new();
        let run = arena.alloc(2048).unwrap();
        let mut buffer = CircularBuffer::new(run, 2048);
        buffer.zero(&mut arena, VALUE_ZERO);
        for _ in 0..8 {
            buffer.write(&mut arena, 2000);
        }
        buffer.write(&mut arena, 3000);
        let inputs = [Some(buffer), None];
        let history = History::new(&arena, &inputs);

        // 1000 away from the 4-sample average, tolerance 50 * 5 = 250
        assert_eq!(noise_gate(&history, 50, 4), 2000);
        // tolerance 200 * 5 = 1000 is not exceeded
        assert_eq!(noise_gate(&history, 200, 4), 3000);
        // a zero window still averages one sample
        assert_eq!(noise_gate(&history, 0, 0), 2000);
    }
}
