//! # fxchain
//!
//! A `no_std`, heap-free filter graph engine for a sample-per-tick audio
//! effects device. A host describes a graph of filters as a flat list of
//! records; the engine validates it, materialises it from fixed pools,
//! schedules it breadth-first, and on every timer tick pushes one sample
//! from the input collaborator through the graph to the output collaborator.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Memory | [`pool`] / [`buffer`] | Slot pools, two-region sample arena, circular input buffers |
//! | Math | [`dsp`] | Sample-domain scaling and saturation |
//! | Filters | [`catalog`] | The 22 filter kinds and their per-tick functions |
//! | Graph | [`graph`] | Spec records, build transaction, execution queue |
//! | Runtime | [`engine`] | Tick gate, tick loop, transactional rebuilds |
//! | Boundaries | [`io`] | Sample input/output and configuration store traits |
//!
//! ## Quick start
//!
//! ```
//! use fxchain::catalog::FilterKind;
//! use fxchain::config::EngineConfig;
//! use fxchain::engine::{Engine, TickOutcome};
//! use fxchain::graph::SpecRecord;
//! use fxchain::io::{SampleInput, SampleOutput};
//!
//! struct Adc;
//! impl SampleInput for Adc {
//!     fn read_sample(&mut self) -> u16 {
//!         3000
//!     }
//! }
//!
//! struct Dac(u16);
//! impl SampleOutput for Dac {
//!     fn write_sample(&mut self, sample: u16) {
//!         self.0 = sample;
//!     }
//! }
//!
//! let mut engine = Engine::new(EngineConfig::default(), Adc, Dac(0)).unwrap();
//! engine
//!     .apply(&[
//!         SpecRecord::new(FilterKind::Source, 0).with_next(2),
//!         SpecRecord::new(FilterKind::ClampMax, 2).with_next(1).with_params([50, 0, 0, 0]),
//!         SpecRecord::new(FilterKind::Sink, 1),
//!     ])
//!     .unwrap();
//!
//! // In the timer interrupt:
//! assert_eq!(engine.tick(), TickOutcome::Ran);
//! assert_eq!(engine.output().0, 1650);
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `tracing` | no | Build and rebuild events through `tracing` (never on the tick path) |
//!
//! ## Sample domain
//!
//! - **Sample format:** `u16` millivolts ([`constants::Sample`])
//! - **Signal ground:** 2000 ([`constants::VALUE_ZERO`])
//! - **Full scale:** 3300 ([`constants::VALUE_RANGE`])
//! - **Tick rate:** 20 kHz by default ([`constants::DEFAULT_TICK_RATE`])

#![cfg_attr(not(test), no_std)]

pub mod buffer;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod graph;
pub mod io;
pub mod pool;

pub use config::EngineConfig;
pub use engine::{Engine, TickOutcome};
pub use error::{BuildError, ConfigError, EngineError, SlotError, SpecFieldError};
