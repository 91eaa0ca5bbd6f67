//! Error taxonomy.
//!
//! Every error here is raised synchronously while a graph is being built or
//! the engine is being reconfigured. A built graph has no runtime error
//! conditions: the tick path never fails.

use crate::graph::EdgeSlot;
use crate::io::StorageSlot;
use crate::pool::PoolKind;

/// Why a graph build was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A pool had no room left for the graph being built.
    #[error("{0} pool exhausted")]
    PoolExhausted(PoolKind),
    /// A node would receive writes from more upstream nodes than it has inputs.
    #[error("{slot} edge is a third writer into filter {target}")]
    FanInOverflow {
        /// Successor field that declared the offending edge.
        slot: EdgeSlot,
        /// Id of the over-subscribed successor.
        target: u16,
    },
    /// A node names itself as its own successor.
    #[error("filter {id} outputs to itself through its {slot} edge")]
    SelfLoop {
        /// Successor field that declared the loop.
        slot: EdgeSlot,
        /// Id of the looping node.
        id: u16,
    },
    /// The specification itself is malformed.
    #[error("invalid specification: {0}")]
    InvalidSpecField(#[from] SpecFieldError),
}

impl BuildError {
    /// Numeric status reported to the host command layer.
    ///
    /// Codes 1-4 keep the historical wire values for the edge errors.
    pub fn code(&self) -> u16 {
        match self {
            BuildError::FanInOverflow {
                slot: EdgeSlot::Next,
                ..
            } => 1,
            BuildError::SelfLoop {
                slot: EdgeSlot::Next,
                ..
            } => 2,
            BuildError::FanInOverflow {
                slot: EdgeSlot::Next2,
                ..
            } => 3,
            BuildError::SelfLoop {
                slot: EdgeSlot::Next2,
                ..
            } => 4,
            BuildError::PoolExhausted(_) => 5,
            BuildError::InvalidSpecField(_) => 6,
        }
    }
}

/// Malformed specification input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpecFieldError {
    /// No records at all.
    #[error("specification has no records")]
    Empty,
    /// More records than the filter pool could ever hold.
    #[error("{count} records exceed the limit of {limit}")]
    TooManyRecords {
        /// Records supplied.
        count: usize,
        /// Largest accepted count.
        limit: usize,
    },
    /// A flat word buffer is shorter than its declared record count.
    #[error("{words} words cannot hold {count} records")]
    Truncated {
        /// Words supplied.
        words: usize,
        /// Records declared.
        count: usize,
    },
    /// `function_index` names no catalog entry.
    #[error("record {position}: unknown function index {index}")]
    UnknownFunction {
        /// Position of the record in the input.
        position: usize,
        /// The unrecognised index.
        index: u16,
    },
    /// Two records share an id.
    #[error("id {id} declared more than once")]
    DuplicateId {
        /// The repeated id.
        id: u16,
    },
    /// A successor id matches no record.
    #[error("record {position}: successor id {id} matches no filter")]
    UnknownSuccessor {
        /// Position of the declaring record.
        position: usize,
        /// The dangling id.
        id: u16,
    },
    /// A filter the breadth-first walk from the input never enters, because
    /// its first writer is unreachable or downstream of it.
    #[error("filter {id} is never scheduled")]
    Unscheduled {
        /// Id of the first such filter in record order.
        id: u16,
    },
    /// A storage slot index outside the store's range.
    #[error("storage slot {0} does not exist")]
    InvalidSlot(u8),
}

/// Configuration rejected by [`EngineConfig::validate`](crate::config::EngineConfig::validate).
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The tick rate must be at least 1 Hz.
    #[error("tick rate must be non-zero")]
    ZeroTickRate,
    /// A biquad corner frequency cannot be realised at the tick rate.
    #[error("corner {f0} Hz not below Nyquist at {tick_rate} Hz")]
    CornerAboveNyquist {
        /// The offending corner frequency.
        f0: f32,
        /// The configured tick rate.
        tick_rate: u32,
    },
    /// A biquad quality factor must be positive.
    #[error("biquad Q {q} must be positive")]
    NonPositiveQ {
        /// The offending quality factor.
        q: f32,
    },
}

/// Failure of an engine reconfiguration that may involve a rebuild.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The new configuration is invalid; nothing was changed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Rebuilding the graph under the new configuration failed.
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Failure to apply a graph held in a configuration-store slot.
///
/// Store errors are passed through untouched; the engine does not interpret
/// them.
#[derive(Debug, thiserror::Error)]
pub enum SlotError<E> {
    /// The slot holds no graph.
    #[error("storage slot {0} is empty")]
    Empty(StorageSlot),
    /// The store reported a failure.
    #[error("storage failure: {0:?}")]
    Store(E),
    /// The stored graph could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),
}
