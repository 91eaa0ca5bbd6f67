//! End-to-end verification of built graphs driven by the engine.
//!
//! These tests assemble graphs from record lists and tick them through
//! scripted input and captured output, verifying:
//!
//! - **Signal paths:** passthrough, clamp, delay, and mix chains
//! - **Rejections:** a refused build leaves the pools and the live graph
//!   as it found them
//! - **Pool accounting:** zero leaks across repeated rebuilds
//! - **Streaming stability:** a full second of ticks through a generator
//! - **Topology:** feedback behind a node's first writer is refused

#[cfg(test)]
mod tests {
    use crate::catalog::FilterKind;
    use crate::config::EngineConfig;
    use crate::constants::{Sample, VALUE_RANGE, VALUE_ZERO};
    use crate::engine::{Engine, TickOutcome};
    use crate::error::{BuildError, SpecFieldError};
    use crate::graph::{build, requirements, EdgeSlot, SpecRecord};
    use crate::io::{SampleInput, SampleOutput};
    use crate::pool::{PoolKind, PoolUsage, Pools};

    /// Input that yields `start`, `start + 1`, ... wrapping inside the range.
    struct Ramp(Sample);

    impl SampleInput for Ramp {
        fn read_sample(&mut self) -> Sample {
            let sample = self.0;
            self.0 = (self.0 + 1) % VALUE_RANGE;
            sample
        }
    }

    /// Input that always yields one value.
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

    fn rec(kind: FilterKind, id: u16) -> SpecRecord {
        SpecRecord::new(kind, id)
    }

    fn engine<I: SampleInput>(input: I) -> Engine<I, Capture> {
        Engine::new(EngineConfig::default(), input, Capture::default()).unwrap()
    }

    fn run<I: SampleInput>(engine: &mut Engine<I, Capture>, ticks: usize) {
        for _ in 0..ticks {
            assert_eq!(engine.tick(), TickOutcome::Ran);
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    //  Verification 1: passthrough copies the input read on the same tick
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn verify_passthrough_tracks_input() {
        let mut engine = engine(Ramp(100));
        engine.reset_to_passthrough().unwrap();
        run(&mut engine, 50);

        let expected: Vec<Sample> = (100..150).collect();
        assert_eq!(engine.output().0, expected);
    }

    // ═══════════════════════════════════════════════════════════════════
    //  Verification 2: a clamp at 50 steps caps the output at 1650 mV
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn verify_clamp_caps_output() {
        let mut engine = engine(Ramp(0));
        engine
            .apply(&[
                rec(FilterKind::Source, 0).with_next(2),
                rec(FilterKind::ClampMax, 2).with_next(1).with_params([50, 0, 0, 0]),
                rec(FilterKind::Sink, 1),
            ])
            .unwrap();
        run(&mut engine, VALUE_RANGE as usize);

        let out = &engine.output().0;
        assert!(out.iter().all(|&s| s <= 1650));
        assert_eq!(out[1000], 1000);
        assert_eq!(out[3000], 1650);
    }

    // ═══════════════════════════════════════════════════════════════════
    //  Verification 3: a self-referencing node is refused untouched
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn verify_self_loop_leaves_pools_unchanged() {
        let mut pools = Pools::new();
        let records = [
            rec(FilterKind::Source, 0).with_next(2),
            rec(FilterKind::Passthrough, 1).with_next(1).with_next2(1),
            rec(FilterKind::Sink, 2),
        ];
        let err = build(&records, &mut pools, &EngineConfig::default()).unwrap_err();
        assert_eq!(err, BuildError::SelfLoop { slot: EdgeSlot::Next, id: 1 });
        assert_eq!(err.code(), 2);
        assert_eq!(pools.usage(), PoolUsage::default());
    }

    // ═══════════════════════════════════════════════════════════════════
    //  Verification 4: delay lines hold the signal back by their lag
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn verify_delay_lags_by_quarter_history() {
        let mut engine = engine(Ramp(0));
        engine
            .apply(&[
                rec(FilterKind::Source, 0).with_next(2),
                rec(FilterKind::Delay, 2).with_next(1).with_params([25, 0, 0, 0]),
                rec(FilterKind::Sink, 1),
            ])
            .unwrap();
        run(&mut engine, 1500);

        let out = &engine.output().0;
        // the buffer starts out neutral
        assert!(out[..1024].iter().all(|&s| s == VALUE_ZERO));
        assert_eq!(out[1024], 0);
        assert_eq!(out[1499], 475);
    }

    // ═══════════════════════════════════════════════════════════════════
    //  Verification 5: mix runs after both writers and blends them
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn verify_mix_blends_two_branches() {
        let mut engine = engine(Level(3000));
        engine
            .apply(&[
                rec(FilterKind::Source, 0).with_next(2).with_next2(3),
                rec(FilterKind::Passthrough, 2).with_next(4),
                rec(FilterKind::Zero, 3).with_next(4),
                rec(FilterKind::Mix, 4).with_next(1).with_params([50, 0, 0, 0]),
                rec(FilterKind::Sink, 1),
            ])
            .unwrap();
        run(&mut engine, 3);

        // (3000 + 2000) / 2 from the very first tick
        assert_eq!(engine.output().0, vec![2500, 2500, 2500]);
    }

    // ═══════════════════════════════════════════════════════════════════
    //  Verification 6: a refused rebuild keeps the live graph running
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn verify_pool_exhaustion_keeps_prior_graph() {
        let mut engine = engine(Level(2200));
        engine.reset_to_passthrough().unwrap();
        let usage = engine.usage();

        // one more node than the filter pool holds
        let mut records = vec![rec(FilterKind::Source, 0).with_next(1)];
        records.extend((1..=100).map(|id| rec(FilterKind::Passthrough, id)));
        let err = engine.apply(&records).unwrap_err();
        assert_eq!(err, BuildError::PoolExhausted(PoolKind::FilterNode));

        assert_eq!(engine.usage(), usage);
        run(&mut engine, 2);
        assert_eq!(engine.output().0, vec![2200, 2200]);
    }

    // ═══════════════════════════════════════════════════════════════════
    //  Verification 7: pool accounting across repeated rebuilds
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn verify_no_leaks_across_rebuilds() {
        let graphs: [&[SpecRecord]; 3] = [
            &[
                rec(FilterKind::Source, 0).with_next(2),
                rec(FilterKind::NoiseGate, 2).with_next(3).with_params([10, 50, 0, 0]),
                rec(FilterKind::LowPass, 3).with_next(1),
                rec(FilterKind::Sink, 1),
            ],
            &[
                rec(FilterKind::Source, 0).with_next(2).with_next2(3),
                rec(FilterKind::Flange, 2).with_next(4).with_params([5, 0, 40, 0]),
                rec(FilterKind::Reverb, 3).with_next(4).with_params([30, 40, 2, 0]),
                rec(FilterKind::Mix, 4).with_next(1).with_params([50, 0, 0, 0]),
                rec(FilterKind::Sink, 1),
            ],
            &[rec(FilterKind::Source, 0).with_next(1), rec(FilterKind::Sink, 1)],
        ];

        let mut engine = engine(Ramp(0));
        for round in 0..30 {
            let records = graphs[round % graphs.len()];
            engine.apply(records).unwrap();
            run(&mut engine, 16);

            let needs = requirements(records).unwrap();
            let usage = engine.usage();
            assert_eq!(usage.filter_nodes, needs.nodes);
            assert_eq!(usage.queue_links, needs.queue_links);
            assert_eq!(usage.sample_blocks, needs.blocks);
        }

        engine.teardown();
        assert_eq!(engine.usage(), PoolUsage::default());
    }

    // ═══════════════════════════════════════════════════════════════════
    //  Verification 8: generators repeat once the tick counter wraps
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn verify_generator_repeats_each_second() {
        let config = EngineConfig::default().with_tick_rate(8_000);
        let mut engine = Engine::new(config, Level(VALUE_ZERO), Capture::default()).unwrap();
        // a sine nothing feeds is never scheduled, so the graph is refused
        let err = engine
            .apply(&[
                rec(FilterKind::Source, 0),
                rec(FilterKind::Sine, 2).with_next(1).with_params([80, 10, 0, 0]),
                rec(FilterKind::Sink, 1),
            ])
            .unwrap_err();
        assert_eq!(err, BuildError::InvalidSpecField(SpecFieldError::Unscheduled { id: 2 }));
        assert!(engine.graph().is_none());

        engine
            .apply(&[
                rec(FilterKind::Source, 0).with_next(2),
                rec(FilterKind::Triangle, 2).with_next(1).with_params([3_000, 100, 0, 0]),
                rec(FilterKind::Sink, 1),
            ])
            .unwrap();
        run(&mut engine, 16_000);

        let out = &engine.output().0;
        // a 3000-tick period only lines up again because the counter wraps
        assert_eq!(out[..8_000], out[8_000..]);
        assert!(out.iter().all(|&s| s <= 2 * VALUE_RANGE));
        assert!(out.iter().any(|&s| s != out[0]));
    }

    // ═══════════════════════════════════════════════════════════════════
    //  Verification 9: a self-loop on a fed node is still a self-loop
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn verify_fed_self_loop_keeps_live_graph() {
        let mut engine = engine(Level(1800));
        engine.reset_to_passthrough().unwrap();
        let usage = engine.usage();

        let err = engine
            .apply(&[
                rec(FilterKind::Source, 0).with_next(2),
                rec(FilterKind::Passthrough, 2).with_next(2).with_next2(2),
                rec(FilterKind::Sink, 1),
            ])
            .unwrap_err();
        assert_eq!(err, BuildError::SelfLoop { slot: EdgeSlot::Next, id: 2 });
        assert_eq!(err.code(), 2);

        assert_eq!(engine.usage(), usage);
        run(&mut engine, 2);
        assert_eq!(engine.output().0, vec![1800, 1800]);
    }

    // ═══════════════════════════════════════════════════════════════════
    //  Verification 10: a loop back into a mix's first writer is refused
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn verify_feedback_into_mix_is_refused() {
        let mut engine = engine(Level(2600));
        engine.reset_to_passthrough().unwrap();
        let usage = engine.usage();

        // the delay is the mix's first writer but only hears from behind it
        let records = [
            rec(FilterKind::Source, 0).with_next(2),
            rec(FilterKind::Delay, 3).with_next(4),
            rec(FilterKind::Passthrough, 2).with_next(4),
            rec(FilterKind::Mix, 4).with_next(5),
            rec(FilterKind::Passthrough, 5).with_next(3).with_next2(1),
            rec(FilterKind::Sink, 1),
        ];
        let err = engine.apply(&records).unwrap_err();
        assert_eq!(err, BuildError::InvalidSpecField(SpecFieldError::Unscheduled { id: 3 }));
        assert_eq!(err.code(), 6);

        let mut pools = Pools::new();
        assert!(build(&records, &mut pools, &EngineConfig::default()).is_err());
        assert_eq!(pools.usage(), PoolUsage::default());

        assert_eq!(engine.usage(), usage);
        run(&mut engine, 2);
        assert_eq!(engine.output().0, vec![2600, 2600]);
    }

    // ═══════════════════════════════════════════════════════════════════
    //  Verification 11: a flange ignores its second writer
    // ═══════════════════════════════════════════════════════════════════

    #[test]
    fn verify_flange_reads_first_input_only() {
        let flange = rec(FilterKind::Flange, 2).with_next(1).with_params([5, 0, 40, 0]);
        let single = [rec(FilterKind::Source, 0).with_next(2), flange, rec(FilterKind::Sink, 1)];
        let doubled = [
            rec(FilterKind::Source, 0).with_next(2).with_next2(3),
            flange,
            rec(FilterKind::Zero, 3).with_next(2),
            rec(FilterKind::Sink, 1),
        ];

        let mut outputs = Vec::new();
        for records in [&single[..], &doubled[..]] {
            let mut engine = engine(Ramp(0));
            engine.apply(records).unwrap();
            run(&mut engine, 600);
            outputs.push(engine.output().0.clone());
        }
        assert_eq!(outputs[0], outputs[1]);
    }
}
