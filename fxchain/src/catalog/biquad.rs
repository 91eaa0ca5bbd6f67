//! Second-order IIR sections (Audio EQ Cookbook designs).
//!
//! Each biquad node owns its coefficients and its own output history, so two
//! low-pass nodes in one graph are tuned and run independently. Coefficients
//! are computed once when the graph is built; a tick-rate change therefore
//! needs a rebuild to retune them.

use core::f32::consts::TAU;

use libm::{cosf, sinf};

/// Number of all-pass sections in the phaser cascade.
pub const PHASER_STAGES: usize = 4;

/// Corner frequency and quality factor of one section. The sample rate is
/// the engine tick rate, supplied when coefficients are computed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Design {
    /// Corner (or centre) frequency in Hz.
    pub f0: f32,
    /// Quality factor.
    pub q: f32,
}

impl Design {
    /// Create a design.
    pub const fn new(f0: f32, q: f32) -> Self {
        Design { f0, q }
    }
}

/// Normalised direct-form-I coefficients (`a0` divided out).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Coefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

/// `(cos w0, alpha)` for a design at `fs`.
fn prewarp(design: &Design, fs: f32) -> (f32, f32) {
    let w0 = TAU * design.f0 / fs;
    (cosf(w0), sinf(w0) / (2.0 * design.q))
}

impl Coefficients {
    fn normalised(b: [f32; 3], a: [f32; 3]) -> Self {
        Coefficients {
            b0: b[0] / a[0],
            b1: b[1] / a[0],
            b2: b[2] / a[0],
            a1: a[1] / a[0],
            a2: a[2] / a[0],
        }
    }

    /// Low-pass section.
    pub fn lowpass(design: &Design, fs: f32) -> Self {
        let (cw0, alpha) = prewarp(design, fs);
        let omcw0 = 1.0 - cw0;
        Self::normalised(
            [omcw0 / 2.0, omcw0, omcw0 / 2.0],
            [1.0 + alpha, -2.0 * cw0, 1.0 - alpha],
        )
    }

    /// High-pass section.
    pub fn highpass(design: &Design, fs: f32) -> Self {
        let (cw0, alpha) = prewarp(design, fs);
        let opcw0 = 1.0 + cw0;
        Self::normalised(
            [opcw0 / 2.0, -opcw0, opcw0 / 2.0],
            [1.0 + alpha, -2.0 * cw0, 1.0 - alpha],
        )
    }

    /// All-pass section.
    pub fn allpass(design: &Design, fs: f32) -> Self {
        let (cw0, alpha) = prewarp(design, fs);
        Self::normalised(
            [1.0 - alpha, -2.0 * cw0, 1.0 + alpha],
            [1.0 + alpha, -2.0 * cw0, 1.0 - alpha],
        )
    }
}

/// One biquad section with its own input and output history.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Biquad {
    coefficients: Coefficients,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// A section with cleared history.
    pub fn new(coefficients: Coefficients) -> Self {
        Biquad {
            coefficients,
            ..Default::default()
        }
    }

    /// The section's coefficients.
    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Run one (DC-centred) input sample through the section.
    #[inline]
    pub fn process(&mut self, x0: f32) -> f32 {
        let c = &self.coefficients;
        let y0 = c.b0 * x0 + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x0;
        self.y2 = self.y1;
        self.y1 = y0;
        y0
    }
}
