//! Filter graphs: specification records in, scheduled pooled nodes out.
//!
//! A graph is described by a flat list of [`SpecRecord`]s. [`build`]
//! validates the list, materialises one [`FilterNode`] per record from the
//! [`Pools`], wires each declared successor to one of its inputs, and
//! computes the [`ExecutionQueue`] that every tick replays.
//!
//! ```
//! use fxchain::catalog::FilterKind;
//! use fxchain::config::EngineConfig;
//! use fxchain::graph::{build, SpecRecord};
//! use fxchain::pool::Pools;
//!
//! let records = [
//!     SpecRecord::new(FilterKind::Source, 0).with_next(2),
//!     SpecRecord::new(FilterKind::ClampMax, 2).with_next(1).with_params([50, 0, 0, 0]),
//!     SpecRecord::new(FilterKind::Sink, 1),
//! ];
//! let mut pools = Pools::new();
//! let graph = build(&records, &mut pools, &EngineConfig::default()).unwrap();
//! assert_eq!(graph.queue().len(), 3);
//! ```
//!
//! ## Wiring rules
//!
//! - A node may not name itself as a successor ([`BuildError::SelfLoop`]).
//!   This is checked first, whatever the node's fan-in.
//! - A successor accepts as many writers as it has inputs: one, or two for
//!   mix and flange. A further writer is [`BuildError::FanInOverflow`], and
//!   so is any writer into the input node.
//! - Writers claim a successor's inputs in record order; the first writer
//!   gets input 0.
//!
//! These rules are decided from the records alone by [`check_wiring`],
//! before any pool is touched.
//!
//! ## Scheduling
//!
//! The queue is a breadth-first walk from the node at position 0, entering
//! each node only through the edge that writes its input 0. Every scheduled
//! node therefore runs after its first writer, and no node runs twice. A
//! node the walk never enters (its first writer is unreachable, or sits
//! downstream of it) fails the build with [`SpecFieldError::Unscheduled`],
//! so every built graph runs each of its nodes exactly once per tick.
//!
//! [`BuildError::FanInOverflow`]: crate::error::BuildError::FanInOverflow
//! [`BuildError::SelfLoop`]: crate::error::BuildError::SelfLoop
//! [`SpecFieldError::Unscheduled`]: crate::error::SpecFieldError::Unscheduled

mod builder;
mod node;
mod queue;
mod record;

use crate::constants::MAX_RECORDS;
use crate::pool::{NodeHandle, Pools};

pub use builder::{build, check_wiring, requirements, validate, Requirements};
pub use node::{Edge, EdgeSlot, FilterNode};
pub use queue::{ExecutionQueue, QueueLink};
pub use record::{RecordList, SpecRecord};

/// A built, scheduled filter graph.
///
/// Node handles refer into the [`Pools`] the graph was built from. The graph
/// does not release them on drop; pass it back to [`Graph::release`].
#[derive(Debug, PartialEq, Eq)]
pub struct Graph {
    /// Node handles by input position.
    nodes: [Option<NodeHandle>; MAX_RECORDS],
    /// Ids by input position.
    ids: [u16; MAX_RECORDS],
    len: usize,
    queue: ExecutionQueue,
}

impl Graph {
    pub(crate) const fn empty() -> Self {
        Graph {
            nodes: [None; MAX_RECORDS],
            ids: [0; MAX_RECORDS],
            len: 0,
            queue: ExecutionQueue::new(),
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The external-input node, built from input position 0.
    pub fn input(&self) -> Option<NodeHandle> {
        self.nodes[0]
    }

    /// Node built from input position `position`.
    pub fn node_at(&self, position: usize) -> Option<NodeHandle> {
        self.nodes[..self.len].get(position).copied().flatten()
    }

    /// Input position of the node with `id`.
    pub fn position_of(&self, id: u16) -> Option<usize> {
        self.ids[..self.len].iter().position(|&candidate| candidate == id)
    }

    /// Node with `id`.
    pub fn handle_of(&self, id: u16) -> Option<NodeHandle> {
        self.position_of(id).and_then(|position| self.node_at(position))
    }

    /// Node handles in input order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.nodes[..self.len].iter().flatten().copied()
    }

    /// Execution order.
    pub fn queue(&self) -> &ExecutionQueue {
        &self.queue
    }

    /// Return every node, buffer, and queue link to `pools`.
    pub fn release(mut self, pools: &mut Pools) {
        self.release_into(pools);
    }

    pub(crate) fn release_into(&mut self, pools: &mut Pools) {
        self.queue.release(&mut pools.links);
        for handle in self.nodes[..self.len].iter_mut().filter_map(Option::take) {
            let node = pools.nodes.get(handle);
            for buffer in node.inputs.iter().flatten() {
                pools.samples.free(buffer.run());
            }
            pools.nodes.release(handle);
        }
        self.len = 0;
    }

    fn push(&mut self, id: u16, handle: NodeHandle) {
        self.nodes[self.len] = Some(handle);
        self.ids[self.len] = id;
        self.len += 1;
    }
}

#[cfg(test)]
mod verification_tests;
