//! Runtime configuration for the engine.
//!
//! Everything here may change between graph builds; nothing here changes
//! while a graph is live. Pool sizes are compile-time and live in
//! [`constants`](crate::constants).

use crate::catalog::biquad::{Design, PHASER_STAGES};
use crate::constants::{Sample, DEFAULT_TICK_RATE, VALUE_ZERO};
use crate::error::ConfigError;

/// Per-kind biquad designs. Every node of a kind gets its own coefficient set
/// computed from these at build time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiquadDesigns {
    /// Low-pass design.
    pub lowpass: Design,
    /// High-pass design.
    pub highpass: Design,
    /// Single all-pass design.
    pub allpass: Design,
    /// All-pass stages of the phaser, in cascade order.
    pub phaser: [Design; PHASER_STAGES],
}

impl Default for BiquadDesigns {
    fn default() -> Self {
        BiquadDesigns {
            lowpass: Design::new(1000.0, 0.707),
            highpass: Design::new(200.0, 0.707),
            allpass: Design::new(1000.0, 0.707),
            phaser: [
                Design::new(250.0, 0.707),
                Design::new(500.0, 0.707),
                Design::new(1000.0, 0.707),
                Design::new(2000.0, 0.707),
            ],
        }
    }
}

impl BiquadDesigns {
    fn all(&self) -> impl Iterator<Item = &Design> {
        [&self.lowpass, &self.highpass, &self.allpass]
            .into_iter()
            .chain(self.phaser.iter())
    }
}

/// Engine configuration.
///
/// ```
/// use fxchain::config::EngineConfig;
///
/// let config = EngineConfig::default().with_tick_rate(8_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    /// Ticks per second. Periodic generators derive their phase from
    /// `tick / tick_rate`, and the tick counter wraps at this value.
    pub tick_rate: u32,
    /// Value every freshly built input buffer is filled with.
    pub neutral_sample: Sample,
    /// Biquad designs for the IIR filter kinds.
    pub biquad: BiquadDesigns,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            tick_rate: DEFAULT_TICK_RATE,
            neutral_sample: VALUE_ZERO,
            biquad: BiquadDesigns::default(),
        }
    }
}

impl EngineConfig {
    /// Replace the tick rate.
    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Replace the neutral buffer fill value.
    pub fn with_neutral_sample(mut self, neutral: Sample) -> Self {
        self.neutral_sample = neutral;
        self
    }

    /// Replace the biquad design table.
    pub fn with_biquad_designs(mut self, designs: BiquadDesigns) -> Self {
        self.biquad = designs;
        self
    }

    /// Check the configuration can drive a graph.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        let nyquist = self.tick_rate as f32 / 2.0;
        for design in self.biquad.all() {
            if !(design.f0 > 0.0 && design.f0 < nyquist) {
                return Err(ConfigError::CornerAboveNyquist {
                    f0: design.f0,
                    tick_rate: self.tick_rate,
                });
            }
            if !(design.q > 0.0) {
                return Err(ConfigError::NonPositiveQ { q: design.q });
            }
        }
        Ok(())
    }
}
