//! Property-based tests for graph building and buffer bookkeeping.
//!
//! Checks scheduling order on random trees and on trees with extra forward
//! and backward edges, circular buffer reads against a reference history,
//! and that refused builds and refused applies never disturb the pools or
//! the live graph.

use std::collections::VecDeque;

use fxchain::buffer::CircularBuffer;
use fxchain::catalog::FilterKind;
use fxchain::config::EngineConfig;
use fxchain::constants::{Sample, VALUE_ZERO};
use fxchain::engine::{Engine, TickOutcome};
use fxchain::graph::{build, check_wiring, SpecRecord};
use fxchain::io::{SampleInput, SampleOutput};
use fxchain::pool::{PoolUsage, Pools, SampleArena};
use proptest::prelude::*;
use proptest::sample::Index;

/// Single-input kinds with small buffers.
const KINDS: [FilterKind; 6] = [
    FilterKind::Passthrough,
    FilterKind::ClampMax,
    FilterKind::ClampMin,
    FilterKind::Distortion,
    FilterKind::BitReduce,
    FilterKind::Tremolo,
];

/// Small-history kinds, including the two-input mix.
const DAG_KINDS: [FilterKind; 5] = [
    FilterKind::Passthrough,
    FilterKind::Mix,
    FilterKind::ClampMax,
    FilterKind::Mix,
    FilterKind::Tremolo,
];

/// A tree rooted at a source: node `k` hangs off one of the earlier nodes
/// that still has a free successor field. Ids equal input positions.
fn random_tree(parents: &[Index], kinds: &[Index]) -> (Vec<SpecRecord>, Vec<usize>) {
    random_tree_of(parents, kinds, &KINDS)
}

fn random_tree_of(
    parents: &[Index],
    kinds: &[Index],
    palette: &[FilterKind],
) -> (Vec<SpecRecord>, Vec<usize>) {
    let mut records = vec![SpecRecord::new(FilterKind::Source, 0)];
    let mut children = vec![0usize];
    let mut parent_of = vec![0usize];
    for (k, (parent, kind)) in parents.iter().zip(kinds).enumerate() {
        let id = k + 1;
        let open: Vec<usize> = (0..id).filter(|&j| children[j] < 2).collect();
        let parent = *parent.get(&open);
        records[parent] = if children[parent] == 0 {
            records[parent].with_next(id as u16)
        } else {
            records[parent].with_next2(id as u16)
        };
        children[parent] += 1;
        children.push(0);
        parent_of.push(parent);
        records.push(SpecRecord::new(*kind.get(palette), id as u16));
    }
    (records, parent_of)
}

/// A random tree plus extra edges from nodes with a free successor field to
/// any node, earlier or later. The result may hold self-loops, fan-in
/// overflows, writes into the source, and loops behind a first writer.
fn random_graph(parents: &[Index], kinds: &[Index], extra: &[(Index, Index)]) -> Vec<SpecRecord> {
    let (mut records, _) = random_tree_of(parents, kinds, &DAG_KINDS);
    for (from, to) in extra {
        let open: Vec<usize> = (0..records.len())
            .filter(|&j| records[j].next2 == 0)
            .collect();
        if open.is_empty() {
            break;
        }
        let from = *from.get(&open);
        let to = to.index(records.len()) as u16;
        records[from] = if records[from].next == 0 {
            records[from].with_next(to)
        } else {
            records[from].with_next2(to)
        };
    }
    records
}

struct Level(Sample);

impl SampleInput for Level {
    fn read_sample(&mut self) -> Sample {
        self.0
    }
}

#[derive(Default)]
struct Capture(Vec<Sample>);

impl SampleOutput for Capture {
    fn write_sample(&mut self, sample: Sample) {
        self.0.push(sample);
    }
}

/// Source, `delays` delay lines, sink; four of them fill most of the arena.
fn delay_chain(delays: u16) -> Vec<SpecRecord> {
    let mut records = vec![SpecRecord::new(FilterKind::Source, 0).with_next(2)];
    for id in 2..2 + delays {
        let next = if id + 1 == 2 + delays { 1 } else { id + 1 };
        records.push(
            SpecRecord::new(FilterKind::Delay, id)
                .with_next(next)
                .with_params([10, 0, 0, 0]),
        );
    }
    records.push(SpecRecord::new(FilterKind::Sink, 1));
    records
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A graph builds exactly when its wiring check passes, and a built
    /// graph schedules every node exactly once.
    #[test]
    fn built_graph_schedules_every_node_once(
        parents in prop::collection::vec(any::<Index>(), 0..40),
        kinds in prop::collection::vec(any::<Index>(), 40),
        extra in prop::collection::vec((any::<Index>(), any::<Index>()), 0..6),
    ) {
        let records = random_graph(&parents, &kinds, &extra);
        let wiring = check_wiring(&records);
        let mut pools = Pools::new();

        match build(&records, &mut pools, &EngineConfig::default()) {
            Ok(graph) => {
                prop_assert_eq!(wiring, Ok(()));
                let mut runs = vec![0usize; records.len()];
                for handle in graph.queue().iter(pools.links()) {
                    runs[pools.nodes().get(handle).id() as usize] += 1;
                }
                prop_assert!(runs.iter().all(|&n| n == 1), "schedule counts {:?}", runs);
                graph.release(&mut pools);
            }
            Err(err) => prop_assert_eq!(wiring, Err(err)),
        }
        prop_assert_eq!(pools.usage(), PoolUsage::default());
    }

    /// A refused apply leaves the live graph running and the pools as they
    /// were, including when the pools are too full to build beside it.
    #[test]
    fn refused_apply_keeps_live_graph(
        delays in 1u16..=4,
        parents in prop::collection::vec(any::<Index>(), 0..20),
        kinds in prop::collection::vec(any::<Index>(), 20),
        extra in prop::collection::vec((any::<Index>(), any::<Index>()), 1..6),
    ) {
        let mut engine = Engine::new(EngineConfig::default(), Level(1500), Capture::default()).unwrap();
        let live = delay_chain(delays);
        engine.apply(&live).unwrap();
        let usage = engine.usage();

        let records = random_graph(&parents, &kinds, &extra);
        if engine.apply(&records).is_ok() {
            prop_assert_eq!(engine.records().as_slice(), records.as_slice());
            return Ok(());
        }

        prop_assert_eq!(engine.usage(), usage);
        prop_assert_eq!(engine.records().as_slice(), live.as_slice());
        prop_assert!(engine.graph().is_some());
        prop_assert_eq!(engine.tick(), TickOutcome::Ran);
    }

    /// Every node of a tree is scheduled exactly once, after its writer.
    #[test]
    fn tree_schedules_each_node_once_after_its_writer(
        parents in prop::collection::vec(any::<Index>(), 0..60),
        kinds in prop::collection::vec(any::<Index>(), 60),
    ) {
        let (records, parent_of) = random_tree(&parents, &kinds);
        let mut pools = Pools::new();
        let graph = build(&records, &mut pools, &EngineConfig::default()).unwrap();

        let order: Vec<usize> = graph
            .queue()
            .iter(pools.links())
            .map(|handle| pools.nodes().get(handle).id() as usize)
            .collect();
        prop_assert_eq!(order.len(), records.len());

        let mut seen_at = vec![None; records.len()];
        for (step, &id) in order.iter().enumerate() {
            prop_assert!(seen_at[id].is_none(), "node {} scheduled twice", id);
            seen_at[id] = Some(step);
        }
        for id in 1..records.len() {
            prop_assert!(seen_at[parent_of[id]] < seen_at[id], "node {} ran before its writer", id);
        }

        graph.release(&mut pools);
        prop_assert_eq!(pools.usage(), PoolUsage::default());
    }

    /// A ring reads back exactly what a bounded reference history holds.
    #[test]
    fn circular_buffer_matches_reference(
        capacity_shift in 4usize..12,
        writes in prop::collection::vec(0u16..3300, 0..5000),
    ) {
        let capacity = 1usize << capacity_shift;
        let mut arena = SampleArena::new();
        let run = arena.alloc(capacity).unwrap();
        let mut ring = CircularBuffer::new(run, capacity);
        ring.zero(&mut arena, VALUE_ZERO);

        let mut reference: VecDeque<u16> = std::iter::repeat(VALUE_ZERO).take(capacity).collect();
        for &value in &writes {
            ring.write(&mut arena, value);
            reference.pop_back();
            reference.push_front(value);
        }

        for (lag, &expected) in reference.iter().enumerate() {
            prop_assert_eq!(ring.read(&arena, lag), expected, "lag {}", lag);
        }
    }

    /// A build refused at wiring time leaves occupancy exactly as it was.
    #[test]
    fn refused_build_leaves_pools_unchanged(
        live in prop::collection::vec(any::<Index>(), 0..30),
        bad in prop::collection::vec(any::<Index>(), 1..30),
        kinds in prop::collection::vec(any::<Index>(), 30),
    ) {
        let mut pools = Pools::new();
        let (live_records, _) = random_tree(&live, &kinds);
        let live_graph = build(&live_records, &mut pools, &EngineConfig::default()).unwrap();
        let before = pools.usage();

        // the last node is a leaf; make it name itself as its successor
        let (mut records, _) = random_tree(&bad, &kinds);
        let last = records.len() - 1;
        records[last] = records[last].with_next(last as u16);

        prop_assert!(build(&records, &mut pools, &EngineConfig::default()).is_err());
        prop_assert_eq!(pools.usage(), before);

        live_graph.release(&mut pools);
        prop_assert_eq!(pools.usage(), PoolUsage::default());
    }
}
