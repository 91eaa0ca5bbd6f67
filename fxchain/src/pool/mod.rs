//! Statically sized memory pools backing a filter graph.
//!
//! Three resource kinds are pooled, none of them heap-allocated:
//!
//! | Kind | Storage | Allocation |
//! |------|---------|------------|
//! | Filter nodes | [`SlotPool`] of [`FilterNode`] | first free slot |
//! | Queue links | [`SlotPool`] of [`QueueLink`] | first free slot |
//! | Sample blocks | [`SampleArena`] | first contiguous run, primary then secondary region |
//!
//! Acquisition only happens while a graph is being (re)built. The tick path
//! reads and writes through handles and never acquires or releases.

pub mod arena;
pub mod slots;

use core::fmt;

use crate::constants::{FILTER_POOL_SIZE, QUEUE_POOL_SIZE};
use crate::graph::{FilterNode, QueueLink};

pub use arena::{BlockRun, Region, SampleArena};
pub use slots::{SlotHandle, SlotPool};

/// Handle to a filter node slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeHandle(u8);

impl SlotHandle for NodeHandle {
    fn from_index(index: usize) -> Self {
        NodeHandle(index as u8)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to an execution-queue link slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkHandle(u8);

impl SlotHandle for LinkHandle {
    fn from_index(index: usize) -> Self {
        LinkHandle(index as u8)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Pool of filter nodes.
pub type NodePool = SlotPool<FilterNode, NodeHandle, FILTER_POOL_SIZE>;

/// Pool of execution-queue links.
pub type LinkPool = SlotPool<QueueLink, LinkHandle, QUEUE_POOL_SIZE>;

/// The pooled resource kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolKind {
    /// Filter node slots.
    FilterNode,
    /// Execution-queue link slots.
    QueueLink,
    /// Sample-arena blocks.
    SampleBlock,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::FilterNode => f.write_str("filter node"),
            PoolKind::QueueLink => f.write_str("queue link"),
            PoolKind::SampleBlock => f.write_str("sample block"),
        }
    }
}

/// Occupancy snapshot across all pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolUsage {
    /// Filter node slots in use.
    pub filter_nodes: usize,
    /// Queue link slots in use.
    pub queue_links: usize,
    /// Sample blocks in use.
    pub sample_blocks: usize,
}

/// All pools a graph is materialised from.
pub struct Pools {
    pub(crate) nodes: NodePool,
    pub(crate) links: LinkPool,
    pub(crate) samples: SampleArena,
}

impl Pools {
    /// Create empty pools.
    pub fn new() -> Self {
        Pools {
            nodes: NodePool::new(),
            links: LinkPool::new(),
            samples: SampleArena::new(),
        }
    }

    /// Allocated units of one kind (slots, or blocks for samples).
    pub fn count_in_use(&self, kind: PoolKind) -> usize {
        match kind {
            PoolKind::FilterNode => self.nodes.count_in_use(),
            PoolKind::QueueLink => self.links.count_in_use(),
            PoolKind::SampleBlock => self.samples.blocks_in_use(),
        }
    }

    /// Release every allocated unit of one kind.
    ///
    /// Only meaningful as part of tearing down a whole graph: releasing one
    /// kind while another graph structure still refers to it leaves dangling
    /// handles.
    pub fn release_all(&mut self, kind: PoolKind) {
        match kind {
            PoolKind::FilterNode => self.nodes.release_all(),
            PoolKind::QueueLink => self.links.release_all(),
            PoolKind::SampleBlock => self.samples.free_all(),
        }
    }

    /// Occupancy of every pool.
    pub fn usage(&self) -> PoolUsage {
        PoolUsage {
            filter_nodes: self.count_in_use(PoolKind::FilterNode),
            queue_links: self.count_in_use(PoolKind::QueueLink),
            sample_blocks: self.count_in_use(PoolKind::SampleBlock),
        }
    }

    /// Filter node pool.
    pub fn nodes(&self) -> &NodePool {
        &self.nodes
    }

    /// Queue link pool.
    pub fn links(&self) -> &LinkPool {
        &self.links
    }

    /// Sample arena.
    pub fn samples(&self) -> &SampleArena {
        &self.samples
    }
}

impl Default for Pools {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FilterKind;

    #[test]
    fn usage_tracks_each_kind() {
        let mut pools = Pools::new();
        assert_eq!(pools.usage(), PoolUsage::default());

        pools.nodes.acquire(FilterNode::new(3, FilterKind::Passthrough, [0; 4])).unwrap();
        pools.links.acquire(QueueLink::default()).unwrap();
        pools.samples.alloc(300).unwrap();

        assert_eq!(
            pools.usage(),
            PoolUsage {
                filter_nodes: 1,
                queue_links: 1,
                sample_blocks: 3,
            }
        );
    }

    #[test]
    fn release_all_is_per_kind() {
        let mut pools = Pools::new();
        pools.nodes.acquire(FilterNode::default()).unwrap();
        pools.samples.alloc(16).unwrap();

        pools.release_all(PoolKind::FilterNode);
        assert_eq!(pools.count_in_use(PoolKind::FilterNode), 0);
        assert_eq!(pools.count_in_use(PoolKind::SampleBlock), 1);

        pools.release_all(PoolKind::SampleBlock);
        assert_eq!(pools.count_in_use(PoolKind::SampleBlock), 0);
    }

    #[test]
    fn node_pool_exhaustion() {
        let mut pools = Pools::new();
        for _ in 0..FILTER_POOL_SIZE {
            assert!(pools.nodes.acquire(FilterNode::default()).is_some());
        }
        assert!(pools.nodes.acquire(FilterNode::default()).is_none());
    }
}
