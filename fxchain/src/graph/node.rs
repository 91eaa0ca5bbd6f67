//! A materialised filter: kind, parameters, input buffers, outgoing edges.

use core::fmt;

use crate::buffer::CircularBuffer;
use crate::catalog::{FilterKind, FilterState};
use crate::pool::NodeHandle;

/// Which successor field of a record an edge came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeSlot {
    /// The `next` field.
    Next,
    /// The `next2` field.
    Next2,
}

impl EdgeSlot {
    /// Both slots, in wiring order.
    pub const ALL: [EdgeSlot; 2] = [EdgeSlot::Next, EdgeSlot::Next2];

    fn index(self) -> usize {
        match self {
            EdgeSlot::Next => 0,
            EdgeSlot::Next2 => 1,
        }
    }
}

impl fmt::Display for EdgeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeSlot::Next => f.write_str("next"),
            EdgeSlot::Next2 => f.write_str("next2"),
        }
    }
}

/// A wired output: the successor and which of its inputs this node feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub(crate) target: NodeHandle,
    pub(crate) input: u8,
}

impl Edge {
    /// Successor node.
    pub fn target(&self) -> NodeHandle {
        self.target
    }

    /// Input buffer of the successor this edge writes. Input 0 marks the
    /// first writer, which is the edge the scheduler follows.
    pub fn input(&self) -> usize {
        self.input as usize
    }
}

/// One node of a built graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterNode {
    pub(crate) id: u16,
    pub(crate) kind: FilterKind,
    pub(crate) params: [u16; 4],
    pub(crate) edges: [Option<Edge>; 2],
    pub(crate) inputs: [Option<CircularBuffer>; 2],
    pub(crate) fan_in: u8,
    pub(crate) state: FilterState,
}

impl FilterNode {
    /// An unwired node with no buffers yet.
    pub fn new(id: u16, kind: FilterKind, params: [u16; 4]) -> Self {
        FilterNode {
            id,
            kind,
            params,
            edges: [None; 2],
            inputs: [None; 2],
            fan_in: 0,
            state: FilterState::Stateless,
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn params(&self) -> &[u16; 4] {
        &self.params
    }

    /// Edge declared in `slot`, if wired.
    pub fn edge(&self, slot: EdgeSlot) -> Option<Edge> {
        self.edges[slot.index()]
    }

    /// Wired edges in slot order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().flatten().copied()
    }

    /// Input buffers, indexed by input number.
    pub fn inputs(&self) -> &[Option<CircularBuffer>; 2] {
        &self.inputs
    }

    /// Upstream writers wired into this node so far.
    pub fn fan_in(&self) -> usize {
        self.fan_in as usize
    }

    /// Most upstream writers this node accepts.
    pub fn fan_in_limit(&self) -> usize {
        self.kind.arity().inputs()
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Claim the next free input for a new writer.
    pub(crate) fn accept_writer(&mut self) -> Option<u8> {
        if self.fan_in() >= self.fan_in_limit() {
            return None;
        }
        let input = self.fan_in;
        self.fan_in += 1;
        Some(input)
    }

    pub(crate) fn set_edge(&mut self, slot: EdgeSlot, edge: Edge) {
        self.edges[slot.index()] = Some(edge);
    }
}

impl Default for FilterNode {
    fn default() -> Self {
        FilterNode::new(0, FilterKind::Passthrough, [0; 4])
    }
}
