//! Circular sample buffer over an arena block run.
//!
//! A [`CircularBuffer`] holds only the bookkeeping (run handle, mask, write
//! head); the samples themselves stay in the [`SampleArena`] so that a node's
//! upstream writers and the node itself can reach them through the same
//! handle. Capacity is a power of two so wraparound is a masked add.
//!
//! Reads are addressed by lag from the most recent write: lag 0 is the sample
//! just written, lag 1 the one before, and so on. A lag at or beyond the
//! capacity is a caller error.

use crate::constants::Sample;
use crate::pool::{BlockRun, SampleArena};

/// Ring of recent input samples for one node input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircularBuffer {
    run: BlockRun,
    mask: usize,
    /// Total writes so far; wraps, only the masked value is used for addressing.
    head: usize,
}

impl CircularBuffer {
    /// Wrap a granted run as a ring of `capacity` samples.
    ///
    /// `capacity` must be a power of two no larger than the run.
    pub fn new(run: BlockRun, capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two(), "capacity {} not a power of two", capacity);
        debug_assert!(capacity <= run.len());
        CircularBuffer {
            run,
            mask: capacity - 1,
            head: 0,
        }
    }

    /// Number of samples of history the ring holds.
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// The arena run backing this ring.
    pub fn run(&self) -> BlockRun {
        self.run
    }

    /// Fill the whole ring with `neutral` and reset the head.
    pub fn zero(&mut self, arena: &mut SampleArena, neutral: Sample) {
        let capacity = self.capacity();
        arena.samples_mut(self.run)[..capacity].fill(neutral);
        self.head = 0;
    }

    /// Store `value` at the head and advance it.
    #[inline]
    pub fn write(&mut self, arena: &mut SampleArena, value: Sample) {
        arena.samples_mut(self.run)[self.head & self.mask] = value;
        self.head = self.head.wrapping_add(1);
    }

    /// The sample written `lag` writes before the most recent one.
    #[inline]
    pub fn read(&self, arena: &SampleArena, lag: usize) -> Sample {
        debug_assert!(lag <= self.mask, "lag {} beyond capacity {}", lag, self.capacity());
        let position = self.head.wrapping_sub(1).wrapping_sub(lag) & self.mask;
        arena.samples(self.run)[position]
    }
}
