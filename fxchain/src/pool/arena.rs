//! Block arena backing every circular sample buffer.
//!
//! Samples live in two statically sized regions. A request is rounded up to
//! whole [`BUF_BLOCK_LENGTH`] blocks and satisfied by the first run of
//! contiguous free blocks, trying the primary region first and the larger
//! secondary region only when the primary cannot fit it. Runs are never split
//! or grown: a [`BlockRun`] is freed exactly as it was granted.

use crate::constants::{Sample, BUF_BLOCK_LENGTH, PRIMARY_REGION_BLOCKS, SECONDARY_REGION_BLOCKS};

/// Which backing region a run was carved from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    /// Ordinary RAM, tried first.
    Primary,
    /// Spare peripheral RAM, used once the primary region is full.
    Secondary,
}

/// Handle to a run of contiguous blocks granted by [`SampleArena::alloc`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRun {
    region: Region,
    start: u16,
    blocks: u16,
}

impl BlockRun {
    /// Region the run lives in.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Index of the first block in its region.
    pub fn start(&self) -> usize {
        self.start as usize
    }

    /// Number of blocks in the run.
    pub fn blocks(&self) -> usize {
        self.blocks as usize
    }

    /// Number of samples the run can hold.
    pub fn len(&self) -> usize {
        self.blocks() * BUF_BLOCK_LENGTH
    }
}

/// Number of blocks needed to hold `samples` samples (at least one).
pub fn blocks_for(samples: usize) -> usize {
    samples.div_ceil(BUF_BLOCK_LENGTH).max(1)
}

/// One fixed region of blocks with its used/free map.
struct BlockRegion<const B: usize> {
    used: [bool; B],
    data: [[Sample; BUF_BLOCK_LENGTH]; B],
}

impl<const B: usize> BlockRegion<B> {
    fn new() -> Self {
        BlockRegion {
            used: [false; B],
            data: [[0; BUF_BLOCK_LENGTH]; B],
        }
    }

    /// First-fit search for `blocks` contiguous free blocks; marks them used.
    fn claim(&mut self, blocks: usize) -> Option<usize> {
        let mut run_start = 0;
        let mut run_len = 0;
        for index in 0..B {
            if self.used[index] {
                run_len = 0;
                continue;
            }
            if run_len == 0 {
                run_start = index;
            }
            run_len += 1;
            if run_len == blocks {
                self.used[run_start..run_start + blocks].fill(true);
                return Some(run_start);
            }
        }
        None
    }

    fn unclaim(&mut self, start: usize, blocks: usize) {
        debug_assert!(self.used[start..start + blocks].iter().all(|u| *u));
        self.used[start..start + blocks].fill(false);
    }

    fn used_blocks(&self) -> usize {
        self.used.iter().filter(|u| **u).count()
    }

    fn samples(&self, start: usize, blocks: usize) -> &[Sample] {
        self.data[start..start + blocks].as_flattened()
    }

    fn samples_mut(&mut self, start: usize, blocks: usize) -> &mut [Sample] {
        self.data[start..start + blocks].as_flattened_mut()
    }
}

/// Two-region block allocator for sample storage.
pub struct SampleArena {
    primary: BlockRegion<PRIMARY_REGION_BLOCKS>,
    secondary: BlockRegion<SECONDARY_REGION_BLOCKS>,
}

impl SampleArena {
    /// Create an arena with every block free.
    pub fn new() -> Self {
        SampleArena {
            primary: BlockRegion::new(),
            secondary: BlockRegion::new(),
        }
    }

    /// Allocate a run able to hold `samples` samples.
    ///
    /// Returns `None` when neither region has a long enough free run.
    pub fn alloc(&mut self, samples: usize) -> Option<BlockRun> {
        let blocks = blocks_for(samples);
        if blocks > u16::MAX as usize {
            return None;
        }
        let (region, start) = match self.primary.claim(blocks) {
            Some(start) => (Region::Primary, start),
            None => (Region::Secondary, self.secondary.claim(blocks)?),
        };
        Some(BlockRun {
            region,
            start: start as u16,
            blocks: blocks as u16,
        })
    }

    /// Return a whole run to the arena.
    pub fn free(&mut self, run: BlockRun) {
        match run.region {
            Region::Primary => self.primary.unclaim(run.start(), run.blocks()),
            Region::Secondary => self.secondary.unclaim(run.start(), run.blocks()),
        }
    }

    /// Mark every block in both regions free.
    pub fn free_all(&mut self) {
        self.primary.used.fill(false);
        self.secondary.used.fill(false);
    }

    /// Number of blocks currently granted across both regions.
    pub fn blocks_in_use(&self) -> usize {
        self.primary.used_blocks() + self.secondary.used_blocks()
    }

    /// Total number of blocks across both regions.
    pub const fn capacity_blocks() -> usize {
        PRIMARY_REGION_BLOCKS + SECONDARY_REGION_BLOCKS
    }

    /// Longest run either region could ever grant.
    pub const fn max_run_blocks() -> usize {
        if PRIMARY_REGION_BLOCKS > SECONDARY_REGION_BLOCKS {
            PRIMARY_REGION_BLOCKS
        } else {
            SECONDARY_REGION_BLOCKS
        }
    }

    /// Sample storage of a granted run.
    pub fn samples(&self, run: BlockRun) -> &[Sample] {
        match run.region {
            Region::Primary => self.primary.samples(run.start(), run.blocks()),
            Region::Secondary => self.secondary.samples(run.start(), run.blocks()),
        }
    }

    /// Mutable sample storage of a granted run.
    pub fn samples_mut(&mut self, run: BlockRun) -> &mut [Sample] {
        match run.region {
            Region::Primary => self.primary.samples_mut(run.start(), run.blocks()),
            Region::Secondary => self.secondary.samples_mut(run.start(), run.blocks()),
        }
    }
}

impl Default for SampleArena {
    fn default() -> Self {
        Self::new()
    }
}
