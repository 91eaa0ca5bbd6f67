//! The engine: one live graph, its pools, and the periodic tick.
//!
//! The tick path and the reconfiguration path never overlap. Every rebuild
//! first quiesces the [`TickGate`], and a tick that finds the gate quiesced
//! (or already busy) returns without touching the graph.
//!
//! ## Rebuilds
//!
//! A new specification is validated, checked against the capacity of empty
//! pools, and has its wiring and schedule checked before anything is
//! touched. A specification failing any of these is refused and the live
//! graph keeps running. Otherwise the new graph is built next to the live
//! one and swapped in. Only when the pools are too full for both is the
//! live graph torn down and the build retried from empty pools; should that
//! retry fail as well the engine ends up idle with no graph.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::catalog::{self, FilterKind, History, TickContext};
use crate::config::EngineConfig;
use crate::constants::Sample;
use crate::error::{BuildError, ConfigError, EngineError, SlotError};
use crate::graph::{self, Edge, FilterNode, Graph, RecordList, SpecRecord};
use crate::io::{ConfigStore, SampleInput, SampleOutput, StorageSlot};
use crate::pool::{NodePool, PoolKind, PoolUsage, Pools, SampleArena};

/// The specification the engine falls back to: input straight to output.
pub const PASSTHROUGH: [SpecRecord; 2] = [
    SpecRecord::new(FilterKind::Source, 0).with_next(1),
    SpecRecord::new(FilterKind::Sink, 1),
];

const RUNNING: u8 = 0b01;
const BUSY: u8 = 0b10;

/// Interlock between the tick and whoever reconfigures the engine.
///
/// Inside one [`Engine`] the `&mut self` receivers already keep
/// [`Engine::tick`] and a rebuild apart, so the gate only ever reports
/// [`TickOutcome::Quiesced`] there. The gate is built to be shared as a
/// `&TickGate` (a `static`, say) between a reconfiguring context and a tick
/// runner living in an interrupt handler or another thread: every
/// transition is a single atomic operation and only `&self` is needed.
pub struct TickGate {
    state: AtomicU8,
}

impl TickGate {
    /// A gate that lets ticks run.
    pub const fn new() -> Self {
        TickGate {
            state: AtomicU8::new(RUNNING),
        }
    }

    /// Whether ticks are currently allowed.
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) & RUNNING != 0
    }

    /// Whether a tick is in progress.
    pub fn is_busy(&self) -> bool {
        self.state.load(Ordering::Acquire) & BUSY != 0
    }

    /// Stop further ticks and wait out one in progress.
    ///
    /// The wait only spins when another context holds a [`TickGuard`] on
    /// this gate.
    ///
    /// Returns whether ticks were allowed before, so the caller can restore
    /// that with [`resume`](Self::resume).
    pub fn quiesce(&self) -> bool {
        let previous = self.state.fetch_and(!RUNNING, Ordering::AcqRel);
        while self.is_busy() {
            core::hint::spin_loop();
        }
        previous & RUNNING != 0
    }

    /// Allow ticks again.
    pub fn resume(&self) {
        self.state.fetch_or(RUNNING, Ordering::Release);
    }

    /// Claim the gate for one tick.
    ///
    /// Fails with [`TickOutcome::Quiesced`] or [`TickOutcome::Busy`]; the
    /// claim is released when the guard drops.
    pub fn enter(&self) -> Result<TickGuard<'_>, TickOutcome> {
        let mut state = self.state.load(Ordering::Acquire);
        loop {
            if state & RUNNING == 0 {
                return Err(TickOutcome::Quiesced);
            }
            if state & BUSY != 0 {
                return Err(TickOutcome::Busy);
            }
            match self.state.compare_exchange_weak(
                state,
                state | BUSY,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(TickGuard { gate: self }),
                Err(actual) => state = actual,
            }
        }
    }
}

impl Default for TickGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of an in-progress tick; see [`TickGate::enter`].
pub struct TickGuard<'a> {
    gate: &'a TickGate,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.gate.state.fetch_and(!BUSY, Ordering::Release);
    }
}

/// What a call to [`Engine::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Every scheduled node ran once.
    Ran,
    /// A reconfiguration holds the gate; nothing ran.
    Quiesced,
    /// The previous tick has not finished; nothing ran.
    Busy,
    /// No graph is built; nothing ran.
    Idle,
}

/// A filter graph engine driving `I` and `O` once per tick.
pub struct Engine<I, O> {
    config: EngineConfig,
    pools: Pools,
    graph: Option<Graph>,
    records: RecordList,
    tick: u32,
    gate: TickGate,
    input: I,
    output: O,
}

impl<I: SampleInput, O: SampleOutput> Engine<I, O> {
    /// An idle engine with empty pools.
    pub fn new(config: EngineConfig, input: I, output: O) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Engine {
            config,
            pools: Pools::new(),
            graph: None,
            records: RecordList::new(),
            tick: 0,
            gate: TickGate::new(),
            input,
            output,
        })
    }

    /// Replace the live graph with one built from `records`.
    ///
    /// On error the previous graph is still live unless the failure came
    /// from the retry on empty pools, in which case no graph is left. Edge
    /// and schedule errors are always raised before the live graph is
    /// touched.
    pub fn apply(&mut self, records: &[SpecRecord]) -> Result<(), BuildError> {
        graph::validate(records)?;
        graph::requirements(records)?.check_capacity()?;
        graph::check_wiring(records)?;
        let list = RecordList::from_slice(records)?;

        let was_running = self.gate.quiesce();
        let result = self.rebuild(&list);
        if was_running {
            self.gate.resume();
        }
        result
    }

    /// Apply [`PASSTHROUGH`].
    pub fn reset_to_passthrough(&mut self) -> Result<(), BuildError> {
        self.apply(&PASSTHROUGH)
    }

    /// Drop the live graph and return every pooled resource.
    pub fn teardown(&mut self) {
        let was_running = self.gate.quiesce();
        self.release_all();
        self.records.clear();
        if was_running {
            self.gate.resume();
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("graph torn down");
    }

    /// Change the tick rate and rebuild the live graph under it.
    ///
    /// An invalid rate changes nothing. A failed rebuild keeps the new rate.
    pub fn set_tick_rate(&mut self, tick_rate: u32) -> Result<(), EngineError> {
        let config = self.config.with_tick_rate(tick_rate);
        config.validate()?;

        let was_running = self.gate.quiesce();
        self.config = config;
        self.tick = 0;
        let records = self.records;
        let result = if records.is_empty() {
            Ok(())
        } else {
            self.rebuild(&records)
        };
        if was_running {
            self.gate.resume();
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(tick_rate, "tick rate changed");
        result.map_err(EngineError::from)
    }

    /// Build the graph held in `slot` of `store` and make it live.
    pub fn load_slot<S: ConfigStore>(
        &mut self,
        store: &mut S,
        slot: StorageSlot,
    ) -> Result<(), SlotError<S::Error>> {
        let list = store.load(slot).map_err(SlotError::Store)?;
        if list.is_empty() {
            return Err(SlotError::Empty(slot));
        }
        self.apply(&list)?;
        Ok(())
    }

    /// Write the live graph's records into `slot` of `store`.
    pub fn save_slot<S: ConfigStore>(&self, store: &mut S, slot: StorageSlot) -> Result<(), SlotError<S::Error>> {
        if self.records.is_empty() {
            return Err(SlotError::Empty(slot));
        }
        store.save(slot, &self.records).map_err(SlotError::Store)
    }

    /// Run every scheduled node once.
    pub fn tick(&mut self) -> TickOutcome {
        let _guard = match self.gate.enter() {
            Ok(guard) => guard,
            Err(outcome) => return outcome,
        };
        let Some(graph) = self.graph.as_ref() else {
            return TickOutcome::Idle;
        };

        let ctx = TickContext {
            tick: self.tick,
            tick_rate: self.config.tick_rate,
        };
        run_graph(graph, &mut self.pools, &mut self.input, &mut self.output, ctx);

        self.tick += 1;
        if self.tick >= self.config.tick_rate {
            self.tick = 0;
        }
        TickOutcome::Ran
    }

    fn rebuild(&mut self, list: &RecordList) -> Result<(), BuildError> {
        match graph::build(list, &mut self.pools, &self.config) {
            Ok(built) => {
                if let Some(old) = self.graph.replace(built) {
                    old.release(&mut self.pools);
                }
            }
            Err(BuildError::PoolExhausted(_kind)) if self.graph.is_some() => {
                #[cfg(feature = "tracing")]
                tracing::warn!(pool = %_kind, "no room beside live graph, rebuilding from empty pools");
                self.release_all();
                match graph::build(list, &mut self.pools, &self.config) {
                    Ok(built) => self.graph = Some(built),
                    Err(err) => {
                        self.records.clear();
                        #[cfg(feature = "tracing")]
                        tracing::warn!(error = %err, "rebuild failed, engine left idle");
                        return Err(err);
                    }
                }
            }
            Err(err) => return Err(err),
        }
        self.records = *list;
        #[cfg(feature = "tracing")]
        tracing::debug!(nodes = list.len(), usage = ?self.pools.usage(), "graph applied");
        Ok(())
    }

    fn release_all(&mut self) {
        self.graph = None;
        for kind in [PoolKind::QueueLink, PoolKind::FilterNode, PoolKind::SampleBlock] {
            self.pools.release_all(kind);
        }
    }

    /// Records of the live graph; empty when idle.
    pub fn records(&self) -> &RecordList {
        &self.records
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The live graph.
    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    /// Node of the live graph with `id`.
    pub fn node(&self, id: u16) -> Option<&FilterNode> {
        let handle = self.graph.as_ref()?.handle_of(id)?;
        Some(self.pools.nodes().get(handle))
    }

    pub fn pools(&self) -> &Pools {
        &self.pools
    }

    /// Pool occupancy.
    pub fn usage(&self) -> PoolUsage {
        self.pools.usage()
    }

    /// Ticks since the counter last wrapped.
    pub fn tick_count(&self) -> u32 {
        self.tick
    }

    pub fn gate(&self) -> &TickGate {
        &self.gate
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }
}

/// One pass over the execution queue.
fn run_graph<I: SampleInput, O: SampleOutput>(
    graph: &Graph,
    pools: &mut Pools,
    input: &mut I,
    output: &mut O,
    ctx: TickContext,
) {
    for handle in graph.queue().iter(&pools.links) {
        let node = pools.nodes.get_mut(handle);
        let value = match node.kind {
            FilterKind::Source => input.read_sample(),
            FilterKind::Sink => {
                output.write_sample(History::new(&pools.samples, &node.inputs).latest());
                continue;
            }
            kind => {
                let history = History::new(&pools.samples, &node.inputs);
                catalog::apply(kind, &node.params, &mut node.state, &history, ctx)
            }
        };
        let edges = node.edges;
        emit(&mut pools.nodes, &mut pools.samples, &edges, value);
    }
}

/// Push `value` into the input each edge feeds.
fn emit(nodes: &mut NodePool, samples: &mut SampleArena, edges: &[Option<Edge>; 2], value: Sample) {
    for edge in edges.iter().flatten() {
        if let Some(buffer) = nodes.get_mut(edge.target).inputs[edge.input()].as_mut() {
            buffer.write(samples, value);
        }
    }
}
