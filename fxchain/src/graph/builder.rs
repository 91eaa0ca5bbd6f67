//! Graph construction: validate, check wiring, materialise, wire, schedule.
//!
//! Everything that can be decided from the records alone (field validity,
//! capacity against empty pools, edge rules, and whether the schedule covers
//! every node) is checked before the first allocation. Past that point only
//! a pool too full for the graph can fail a build.
//!
//! Every allocation made during a build is owned by a [`BuildLedger`] until
//! the build succeeds. Dropping the ledger on any error path returns those
//! allocations to the pools, so a failed build leaves pool occupancy exactly
//! as it found it.

use crate::buffer::CircularBuffer;
use crate::catalog::{FilterKind, FilterState};
use crate::config::EngineConfig;
use crate::constants::{FILTER_POOL_SIZE, MAX_RECORDS, QUEUE_POOL_SIZE};
use crate::error::{BuildError, SpecFieldError};
use crate::pool::arena::blocks_for;
use crate::pool::{NodeHandle, PoolKind, Pools, SampleArena};

use super::{Edge, EdgeSlot, FilterNode, Graph, SpecRecord};

/// Pool resources a specification needs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Requirements {
    /// Filter node slots.
    pub nodes: usize,
    /// Queue link slots, at most one per node.
    pub queue_links: usize,
    /// Sample blocks across all input buffers.
    pub blocks: usize,
    /// Longest contiguous block run any single buffer needs.
    pub largest_run: usize,
}

impl Requirements {
    /// Whether the requirements could be met by completely empty pools.
    ///
    /// Passing this does not guarantee a build succeeds (the arena can still
    /// be too fragmented), but failing it guarantees no build can.
    pub fn check_capacity(&self) -> Result<(), BuildError> {
        if self.nodes > FILTER_POOL_SIZE {
            return Err(BuildError::PoolExhausted(PoolKind::FilterNode));
        }
        if self.queue_links > QUEUE_POOL_SIZE {
            return Err(BuildError::PoolExhausted(PoolKind::QueueLink));
        }
        if self.largest_run > SampleArena::max_run_blocks()
            || self.blocks > SampleArena::capacity_blocks()
        {
            return Err(BuildError::PoolExhausted(PoolKind::SampleBlock));
        }
        Ok(())
    }
}

/// Pool resources `records` would consume if built.
pub fn requirements(records: &[SpecRecord]) -> Result<Requirements, SpecFieldError> {
    let mut needs = Requirements::default();
    for (position, record) in records.iter().enumerate() {
        let kind = kind_of(position, record)?;
        let run = blocks_for(kind.history_len());
        needs.nodes += 1;
        needs.queue_links += 1;
        needs.blocks += run * kind.arity().inputs();
        needs.largest_run = needs.largest_run.max(run);
    }
    Ok(needs)
}

/// Check `records` is well formed without touching any pool.
///
/// Size limits are pool capacity, checked by [`Requirements::check_capacity`].
/// Edge rules are checked by [`check_wiring`].
pub fn validate(records: &[SpecRecord]) -> Result<(), SpecFieldError> {
    if records.is_empty() {
        return Err(SpecFieldError::Empty);
    }
    for (position, record) in records.iter().enumerate() {
        kind_of(position, record)?;
        if records[..position].iter().any(|earlier| earlier.id == record.id) {
            return Err(SpecFieldError::DuplicateId { id: record.id });
        }
    }
    for (position, record) in records.iter().enumerate() {
        for slot in EdgeSlot::ALL {
            if let Some(id) = record.successor(slot) {
                if !records.iter().any(|candidate| candidate.id == id) {
                    return Err(SpecFieldError::UnknownSuccessor { position, id });
                }
            }
        }
    }
    Ok(())
}

/// Check the edge rules and schedule coverage of validated `records`
/// without touching any pool.
///
/// Edges are claimed in record order, `next` before `next2`, exactly as the
/// build wires them. A node naming itself is [`BuildError::SelfLoop`]
/// whatever its fan-in; a writer beyond a node's inputs (or any writer into
/// the input node) is [`BuildError::FanInOverflow`]. Every node must then be
/// entered by the breadth-first walk that follows first-writer edges from
/// position 0, or the build is refused with [`SpecFieldError::Unscheduled`].
pub fn check_wiring(records: &[SpecRecord]) -> Result<(), BuildError> {
    if records.len() > MAX_RECORDS {
        return Err(BuildError::PoolExhausted(PoolKind::FilterNode));
    }
    let mut fan_in = [0usize; MAX_RECORDS];
    let mut first_writer: [Option<usize>; MAX_RECORDS] = [None; MAX_RECORDS];

    for (position, record) in records.iter().enumerate() {
        for slot in EdgeSlot::ALL {
            let Some(target_id) = record.successor(slot) else {
                continue;
            };
            let target = records
                .iter()
                .position(|candidate| candidate.id == target_id)
                .ok_or(SpecFieldError::UnknownSuccessor {
                    position,
                    id: target_id,
                })?;
            if target == position {
                return Err(BuildError::SelfLoop { slot, id: record.id });
            }
            let limit = if target == 0 {
                0
            } else {
                kind_of(target, &records[target])?.arity().inputs()
            };
            if fan_in[target] >= limit {
                return Err(BuildError::FanInOverflow {
                    slot,
                    target: target_id,
                });
            }
            if fan_in[target] == 0 {
                first_writer[target] = Some(position);
            }
            fan_in[target] += 1;
        }
    }

    let mut scheduled = [false; MAX_RECORDS];
    let mut frontier = [0usize; MAX_RECORDS];
    scheduled[0] = true;
    let (mut head, mut tail) = (0, 1);
    while head < tail {
        let writer = frontier[head];
        head += 1;
        for target in 0..records.len() {
            if !scheduled[target] && first_writer[target] == Some(writer) {
                scheduled[target] = true;
                frontier[tail] = target;
                tail += 1;
            }
        }
    }
    match (0..records.len()).find(|&position| !scheduled[position]) {
        Some(position) => Err(SpecFieldError::Unscheduled {
            id: records[position].id,
        }
        .into()),
        None => Ok(()),
    }
}

fn kind_of(position: usize, record: &SpecRecord) -> Result<FilterKind, SpecFieldError> {
    record.kind().ok_or(SpecFieldError::UnknownFunction {
        position,
        index: record.function,
    })
}

/// Build `records` into a scheduled graph, allocating from `pools`.
///
/// A specification that could not fit even empty pools, or that breaks an
/// edge rule, is refused before anything is allocated. On any error nothing
/// stays allocated.
pub fn build(records: &[SpecRecord], pools: &mut Pools, config: &EngineConfig) -> Result<Graph, BuildError> {
    validate(records)?;
    requirements(records)?.check_capacity()?;
    check_wiring(records)?;

    let mut ledger = BuildLedger::new(pools);
    for (position, record) in records.iter().enumerate() {
        let kind = kind_of(position, record)?;
        ledger.materialise(record, kind, config)?;
    }
    for (position, record) in records.iter().enumerate() {
        for slot in EdgeSlot::ALL {
            if let Some(target_id) = record.successor(slot) {
                ledger.wire(position, record.id, slot, target_id)?;
            }
        }
    }
    ledger.schedule()?;

    let graph = ledger.commit();
    #[cfg(feature = "tracing")]
    tracing::debug!(
        nodes = graph.len(),
        scheduled = graph.queue().len(),
        "filter graph built"
    );
    Ok(graph)
}

/// A graph under construction that releases itself unless committed.
struct BuildLedger<'p> {
    pools: &'p mut Pools,
    graph: Graph,
}

impl<'p> BuildLedger<'p> {
    fn new(pools: &'p mut Pools) -> Self {
        BuildLedger {
            pools,
            graph: Graph::empty(),
        }
    }

    /// Allocate the node for `record` and its zeroed input buffers.
    fn materialise(&mut self, record: &SpecRecord, kind: FilterKind, config: &EngineConfig) -> Result<(), BuildError> {
        let handle = self
            .pools
            .nodes
            .acquire(FilterNode::new(record.id, kind, record.params))
            .ok_or(BuildError::PoolExhausted(PoolKind::FilterNode))?;
        // recorded before its buffers so a failed buffer alloc still frees the node
        self.graph.push(record.id, handle);

        let capacity = kind.history_len();
        for input in 0..kind.arity().inputs() {
            let run = self
                .pools
                .samples
                .alloc(capacity)
                .ok_or(BuildError::PoolExhausted(PoolKind::SampleBlock))?;
            let mut buffer = CircularBuffer::new(run, capacity);
            buffer.zero(&mut self.pools.samples, config.neutral_sample);
            self.pools.nodes.get_mut(handle).inputs[input] = Some(buffer);
        }
        self.pools.nodes.get_mut(handle).state = FilterState::for_kind(kind, &config.biquad, config.tick_rate);
        Ok(())
    }

    /// Connect the node at `position` to the node with `target_id`.
    fn wire(&mut self, position: usize, id: u16, slot: EdgeSlot, target_id: u16) -> Result<(), BuildError> {
        let unknown = SpecFieldError::UnknownSuccessor {
            position,
            id: target_id,
        };
        let target_position = self.graph.position_of(target_id).ok_or(unknown)?;
        let target = self.graph.node_at(target_position).ok_or(unknown)?;
        let source = self.node_at(position)?;

        if target_position == position {
            return Err(BuildError::SelfLoop { slot, id });
        }
        let target_node = self.pools.nodes.get(target);
        if target_position == 0 || target_node.fan_in() >= target_node.fan_in_limit() {
            return Err(BuildError::FanInOverflow {
                slot,
                target: target_id,
            });
        }

        let input = self
            .pools
            .nodes
            .get_mut(target)
            .accept_writer()
            .ok_or(BuildError::FanInOverflow {
                slot,
                target: target_id,
            })?;
        self.pools.nodes.get_mut(source).set_edge(slot, Edge { target, input });
        Ok(())
    }

    /// Breadth-first walk from the input node, following first-writer edges
    /// only. The queue being built is the walk's own frontier.
    fn schedule(&mut self) -> Result<(), BuildError> {
        let exhausted = BuildError::PoolExhausted(PoolKind::QueueLink);
        let start = self.node_at(0)?;
        self.graph
            .queue
            .push(&mut self.pools.links, start)
            .ok_or(exhausted)?;

        let mut cursor = self.graph.queue.head();
        while let Some(link) = cursor {
            if let Some(node) = self.pools.links.get(link).node {
                let edges = self.pools.nodes.get(node).edges;
                for edge in edges.iter().flatten().filter(|edge| edge.input == 0) {
                    self.graph
                        .queue
                        .push(&mut self.pools.links, edge.target)
                        .ok_or(exhausted)?;
                }
            }
            // read after pushing: the walk may have just appended behind `link`
            cursor = self.pools.links.get(link).next;
        }

        if self.graph.queue.len() != self.graph.len() {
            let links = &self.pools.links;
            let queue = &self.graph.queue;
            let missing = (0..self.graph.len()).find(|&position| {
                let handle = self.graph.nodes[position];
                !queue.iter(links).any(|queued| Some(queued) == handle)
            });
            let id = missing.map_or(0, |position| self.graph.ids[position]);
            return Err(SpecFieldError::Unscheduled { id }.into());
        }
        Ok(())
    }

    fn node_at(&self, position: usize) -> Result<NodeHandle, BuildError> {
        self.graph
            .node_at(position)
            .ok_or(BuildError::InvalidSpecField(SpecFieldError::Empty))
    }

    /// Hand the finished graph out; the ledger no longer owns it.
    fn commit(mut self) -> Graph {
        core::mem::replace(&mut self.graph, Graph::empty())
    }
}

impl Drop for BuildLedger<'_> {
    fn drop(&mut self) {
        if !self.graph.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::warn!(nodes = self.graph.len(), "rolling back partial graph build");
            self.graph.release_into(self.pools);
        }
    }
}
