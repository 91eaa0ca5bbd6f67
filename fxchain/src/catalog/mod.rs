//! The filter catalog: every selectable transfer function.
//!
//! A [`FilterKind`] is what a specification record's `function_index` names.
//! Each kind declares its input arity and the history it needs, and
//! [`apply`] computes one output sample from the node's parameters, its
//! input history, and the tick clock.
//!
//! | Index | Kind | Arity | History |
//! |-------|------|-------|---------|
//! | 0 | Source | 1 | 16 |
//! | 1 | Sink | 1 | 16 |
//! | 2-6 | Passthrough, Zero, ClampMax, ClampMin, Sine | 1 | 16 |
//! | 7-8 | Reverb, Delay | 1 | 4096 |
//! | 9 | Mix | 2 | 16 |
//! | 10 | Tremolo | 1 | 16 |
//! | 11 | Flange | 2 | 256 |
//! | 12-16 | compressors, BitReduce, Distortion, Triangle | 1 | 16 |
//! | 17 | NoiseGate | 1 | 2048 |
//! | 18-21 | LowPass, HighPass, AllPass, Phaser | 1 | 32 |
//!
//! Source and Sink are executed by the engine, which owns the hardware
//! collaborators; [`apply`] treats both as pass-through.

pub mod biquad;
mod delay;
mod modulation;
mod shaping;

use core::fmt;

use crate::buffer::CircularBuffer;
use crate::config::BiquadDesigns;
use crate::constants::{
    Sample, BIQUAD_HISTORY, DELAY_HISTORY, FLANGE_HISTORY, NOISE_HISTORY, REGULAR_HISTORY,
    VALUE_ZERO,
};
use crate::dsp::helpers::{centered, uncentered_f32};
use crate::pool::SampleArena;

use biquad::{Biquad, Coefficients, PHASER_STAGES};

pub use modulation::Waveform;

/// A selectable transfer function, numbered by its wire index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FilterKind {
    /// External input: reads the hardware input collaborator.
    Source = 0,
    /// External output: hands its input to the hardware output collaborator.
    Sink = 1,
    /// Copies its input; used to split a signal.
    Passthrough = 2,
    /// Emits the DC-centre value.
    Zero = 3,
    /// Caps the sample at `param0` steps.
    ClampMax = 4,
    /// Floors the sample at `param0` steps.
    ClampMin = 5,
    /// Sine generator.
    Sine = 6,
    /// Modulated echo.
    Reverb = 7,
    /// Fixed delay.
    Delay = 8,
    /// Blends two inputs.
    Mix = 9,
    /// LFO amplitude modulation.
    Tremolo = 10,
    /// LFO-swept comb.
    ///
    /// Accepts two writers like [`Mix`](Self::Mix) but only reads input 0,
    /// so samples from a second writer land in a buffer nothing consumes.
    Flange = 11,
    /// Compresses the swing above a threshold.
    UpwardCompressor = 12,
    /// Compresses the swing below a threshold.
    DownwardCompressor = 13,
    /// Quantises to fewer bits.
    BitReduce = 14,
    /// Hard-clips the swing.
    Distortion = 15,
    /// Triangle generator.
    Triangle = 16,
    /// Replaces outliers with the recent average.
    NoiseGate = 17,
    /// Biquad low-pass.
    LowPass = 18,
    /// Biquad high-pass.
    HighPass = 19,
    /// Biquad all-pass.
    AllPass = 20,
    /// Cascade of all-pass sections.
    Phaser = 21,
}

const KINDS: [FilterKind; FilterKind::COUNT] = [
    FilterKind::Source,
    FilterKind::Sink,
    FilterKind::Passthrough,
    FilterKind::Zero,
    FilterKind::ClampMax,
    FilterKind::ClampMin,
    FilterKind::Sine,
    FilterKind::Reverb,
    FilterKind::Delay,
    FilterKind::Mix,
    FilterKind::Tremolo,
    FilterKind::Flange,
    FilterKind::UpwardCompressor,
    FilterKind::DownwardCompressor,
    FilterKind::BitReduce,
    FilterKind::Distortion,
    FilterKind::Triangle,
    FilterKind::NoiseGate,
    FilterKind::LowPass,
    FilterKind::HighPass,
    FilterKind::AllPass,
    FilterKind::Phaser,
];

/// Number of inputs a kind accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    /// One input buffer, one upstream writer.
    Single,
    /// Two independent input buffers, up to two upstream writers.
    Dual,
}

impl Arity {
    /// Input buffers a node of this arity owns.
    pub fn inputs(self) -> usize {
        match self {
            Arity::Single => 1,
            Arity::Dual => 2,
        }
    }
}

impl FilterKind {
    /// Number of catalog entries.
    pub const COUNT: usize = 22;

    /// Kind registered at a wire index.
    pub fn from_index(index: u16) -> Option<Self> {
        KINDS.get(index as usize).copied()
    }

    /// Wire index of this kind.
    pub fn index(self) -> u16 {
        self as u16
    }

    /// Every kind, in wire-index order.
    pub fn all() -> impl Iterator<Item = FilterKind> {
        KINDS.into_iter()
    }

    /// Declared input arity.
    pub fn arity(self) -> Arity {
        match self {
            FilterKind::Mix | FilterKind::Flange => Arity::Dual,
            _ => Arity::Single,
        }
    }

    /// Whether nodes of this kind own two input buffers.
    pub fn is_multi_input(self) -> bool {
        self.arity() == Arity::Dual
    }

    /// Samples of history each input buffer must hold. Always a power of two.
    pub fn history_len(self) -> usize {
        match self {
            FilterKind::Reverb | FilterKind::Delay => DELAY_HISTORY,
            FilterKind::Flange => FLANGE_HISTORY,
            FilterKind::NoiseGate => NOISE_HISTORY,
            FilterKind::LowPass | FilterKind::HighPass | FilterKind::AllPass | FilterKind::Phaser => {
                BIQUAD_HISTORY
            }
            _ => REGULAR_HISTORY,
        }
    }

    /// Short lowercase name, as printed by the command layer.
    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Source => "source",
            FilterKind::Sink => "sink",
            FilterKind::Passthrough => "passthrough",
            FilterKind::Zero => "zero",
            FilterKind::ClampMax => "max",
            FilterKind::ClampMin => "min",
            FilterKind::Sine => "sine",
            FilterKind::Reverb => "reverb",
            FilterKind::Delay => "delay",
            FilterKind::Mix => "mix",
            FilterKind::Tremolo => "tremolo",
            FilterKind::Flange => "flange",
            FilterKind::UpwardCompressor => "upward-compressor",
            FilterKind::DownwardCompressor => "downward-compressor",
            FilterKind::BitReduce => "bit-reduce",
            FilterKind::Distortion => "distortion",
            FilterKind::Triangle => "triangle",
            FilterKind::NoiseGate => "noise-gate",
            FilterKind::LowPass => "lowpass",
            FilterKind::HighPass => "highpass",
            FilterKind::AllPass => "allpass",
            FilterKind::Phaser => "phaser",
        }
    }
}

impl TryFrom<u16> for FilterKind {
    type Error = u16;

    fn try_from(index: u16) -> Result<Self, u16> {
        FilterKind::from_index(index).ok_or(index)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The tick clock as seen by periodic generators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickContext {
    /// Ticks since the counter last wrapped; always below `tick_rate`.
    pub tick: u32,
    /// Ticks per second.
    pub tick_rate: u32,
}

impl TickContext {
    /// Seconds into the current counter cycle.
    #[inline]
    pub fn seconds(&self) -> f32 {
        self.tick as f32 / self.tick_rate as f32
    }
}

/// Read-only view of one node's input buffers.
pub struct History<'a> {
    arena: &'a SampleArena,
    inputs: &'a [Option<CircularBuffer>; 2],
}

impl<'a> History<'a> {
    /// View `inputs`, whose samples live in `arena`.
    pub fn new(arena: &'a SampleArena, inputs: &'a [Option<CircularBuffer>; 2]) -> Self {
        History { arena, inputs }
    }

    /// Sample `lag` writes back on input `slot`.
    ///
    /// Lags past the buffer are clamped to its oldest sample. A slot the
    /// node does not own reads as [`VALUE_ZERO`].
    #[inline]
    pub fn read(&self, slot: usize, lag: usize) -> Sample {
        match self.inputs.get(slot).copied().flatten() {
            Some(buffer) => buffer.read(self.arena, lag.min(buffer.capacity() - 1)),
            None => VALUE_ZERO,
        }
    }

    /// Most recent sample on input 0.
    #[inline]
    pub fn latest(&self) -> Sample {
        self.read(0, 0)
    }

    /// History length of input `slot`, zero if the node does not own it.
    pub fn capacity(&self, slot: usize) -> usize {
        self.inputs
            .get(slot)
            .copied()
            .flatten()
            .map_or(0, |buffer| buffer.capacity())
    }
}

/// Per-node mutable state carried between ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum FilterState {
    /// The kind keeps no state beyond its input history.
    #[default]
    Stateless,
    /// One biquad section.
    Biquad(Biquad),
    /// Phaser all-pass cascade.
    Phaser([Biquad; PHASER_STAGES]),
}

impl FilterState {
    /// Fresh state for a node of `kind`, with coefficients designed at
    /// `tick_rate`.
    pub fn for_kind(kind: FilterKind, designs: &BiquadDesigns, tick_rate: u32) -> Self {
        let fs = tick_rate as f32;
        match kind {
            FilterKind::LowPass => {
                FilterState::Biquad(Biquad::new(Coefficients::lowpass(&designs.lowpass, fs)))
            }
            FilterKind::HighPass => {
                FilterState::Biquad(Biquad::new(Coefficients::highpass(&designs.highpass, fs)))
            }
            FilterKind::AllPass => {
                FilterState::Biquad(Biquad::new(Coefficients::allpass(&designs.allpass, fs)))
            }
            FilterKind::Phaser => FilterState::Phaser(
                designs
                    .phaser
                    .map(|design| Biquad::new(Coefficients::allpass(&design, fs))),
            ),
            _ => FilterState::Stateless,
        }
    }
}

/// Compute one output sample for a node of `kind`.
pub fn apply(
    kind: FilterKind,
    params: &[u16; 4],
    state: &mut FilterState,
    history: &History<'_>,
    ctx: TickContext,
) -> Sample {
    let [p0, p1, p2, p3] = *params;
    match kind {
        FilterKind::Source | FilterKind::Sink | FilterKind::Passthrough => history.latest(),
        FilterKind::Zero => VALUE_ZERO,
        FilterKind::ClampMax => shaping::clamp_max(history.latest(), p0),
        FilterKind::ClampMin => shaping::clamp_min(history.latest(), p0),
        FilterKind::Sine => modulation::sine(p0, p1, p2, ctx),
        FilterKind::Reverb => delay::reverb(history, p0, p1, p2, ctx),
        FilterKind::Delay => delay::delay(history, p0),
        FilterKind::Mix => delay::mix(history, p0),
        FilterKind::Tremolo => modulation::tremolo(history.latest(), p0, p1, p2, p3, ctx),
        FilterKind::Flange => modulation::flange(history, p0, p1, p2, p3, ctx),
        FilterKind::UpwardCompressor => shaping::upward_compressor(history.latest(), p0, p1),
        FilterKind::DownwardCompressor => shaping::downward_compressor(history.latest(), p0, p1),
        FilterKind::BitReduce => shaping::bit_reduce(history.latest(), p0),
        FilterKind::Distortion => shaping::distortion(history.latest(), p0),
        FilterKind::Triangle => modulation::triangle(p0, p1, ctx),
        FilterKind::NoiseGate => shaping::noise_gate(history, p0, p1),
        FilterKind::LowPass | FilterKind::HighPass | FilterKind::AllPass | FilterKind::Phaser => {
            filter_iir(state, history.latest())
        }
    }
}

/// Run the node's biquad section(s) over the centred input.
fn filter_iir(state: &mut FilterState, input: Sample) -> Sample {
    let x = centered(input) as f32;
    match state {
        FilterState::Biquad(section) => uncentered_f32(section.process(x)),
        FilterState::Phaser(stages) => {
            uncentered_f32(stages.iter_mut().fold(x, |acc, stage| stage.process(acc)))
        }
        FilterState::Stateless => input,
    }
}
