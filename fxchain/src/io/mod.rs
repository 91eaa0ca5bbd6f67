//! Boundaries to the hardware and to persistent storage.
//!
//! The engine never touches peripherals directly. Each tick it asks a
//! [`SampleInput`] for one sample on behalf of the graph's source node and
//! hands one sample to a [`SampleOutput`] on behalf of its sink. Register
//! setup, conversion timing, and flash programming all live behind these
//! traits.
//!
//! | Trait | Called by | When |
//! |-------|-----------|------|
//! | [`SampleInput`] | source node | once per tick |
//! | [`SampleOutput`] | sink node | once per tick |
//! | [`ConfigStore`] | engine | on load/save commands |

pub mod store;

use crate::constants::Sample;

pub use store::{ConfigStore, MemoryStore, MemoryStoreError, StorageSlot};

/// Hardware input collaborator (typically an ADC).
pub trait SampleInput {
    /// The most recent converted sample. Must not block.
    fn read_sample(&mut self) -> Sample;
}

/// Hardware output collaborator (typically a DAC).
pub trait SampleOutput {
    /// Latch `sample` for output. Must not block.
    fn write_sample(&mut self, sample: Sample);
}

impl<T: SampleInput + ?Sized> SampleInput for &mut T {
    fn read_sample(&mut self) -> Sample {
        (**self).read_sample()
    }
}

impl<T: SampleOutput + ?Sized> SampleOutput for &mut T {
    fn write_sample(&mut self, sample: Sample) {
        (**self).write_sample(sample)
    }
}
