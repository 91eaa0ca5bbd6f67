//! ARM saturation instruction wrappers with pure-Rust fallbacks.
//!
//! On `thumbv7em` targets (Cortex-M4/M7 with DSP extension) these compile to
//! single-cycle `USAT` instructions. On other targets (host tests, Cortex-M3
//! parts without the DSP extension) equivalent pure-Rust implementations are
//! used.

use crate::constants::Sample;

/// Saturate an `i32` into the sample range (`0..=65535`).
///
/// Maps to ARM `USAT #16`.
#[inline(always)]
pub fn saturate_sample(val: i32) -> Sample {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let out: u32;
        unsafe {
            core::arch::asm!(
                "usat {out}, #16, {val}",
                out = out(reg) out,
                val = in(reg) val,
            );
        }
        out as Sample
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        if val < 0 {
            0
        } else if val > Sample::MAX as i32 {
            Sample::MAX
        } else {
            val as Sample
        }
    }
}

/// Saturate a float into the sample range, truncating toward zero.
///
/// NaN maps to 0, matching Rust's saturating float-to-int cast.
#[inline(always)]
pub fn saturate_sample_f32(val: f32) -> Sample {
    val as Sample
}
