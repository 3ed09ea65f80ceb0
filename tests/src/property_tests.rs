//! Property tests for configuration bounds, timing and alternation

use keyer_core::test_utils::{run_trace, PaddleTrace, RecordingSink, SinkEvent};
use keyer_core::{
    EngineConfig, IambicMode, MemoryMode, PaddleElement, PaddleEngine, PaddleLine, SqueezeMode,
};
use proptest::prelude::*;

fn iambic_mode() -> impl Strategy<Value = IambicMode> {
    prop_oneof![Just(IambicMode::A), Just(IambicMode::B)]
}

fn memory_mode() -> impl Strategy<Value = MemoryMode> {
    prop_oneof![
        Just(MemoryMode::None),
        Just(MemoryMode::DotOnly),
        Just(MemoryMode::DahOnly),
        Just(MemoryMode::DotAndDah),
    ]
}

fn squeeze_mode() -> impl Strategy<Value = SqueezeMode> {
    prop_oneof![Just(SqueezeMode::Snapshot), Just(SqueezeMode::Live)]
}

prop_compose! {
    fn valid_config()(
        speed_wpm in 5u32..=60,
        timing_l in 10u8..=90,
        timing_s in 0u8..=99,
        timing_p in 10u8..=99,
        a in 0.0f32..=100.0,
        b in 0.0f32..=100.0,
        iambic_mode in iambic_mode(),
        memory_mode in memory_mode(),
        squeeze_mode in squeeze_mode(),
    ) -> EngineConfig {
        EngineConfig {
            speed_wpm,
            timing_l,
            timing_s,
            timing_p,
            mem_block_start_pct: a.min(b),
            mem_block_end_pct: a.max(b),
            iambic_mode,
            memory_mode,
            squeeze_mode,
        }
    }
}

/// Paddle edges at random times over roughly one second
fn paddle_trace() -> impl Strategy<Value = PaddleTrace> {
    prop::collection::vec((any::<bool>(), any::<bool>(), 0i64..1_000_000), 0..24).prop_map(
        |edges| {
            edges.into_iter().fold(PaddleTrace::new(), |trace, (is_dah, press, at_us)| {
                let line = if is_dah { PaddleLine::Dah } else { PaddleLine::Dit };
                if press {
                    trace.press(line, at_us)
                } else {
                    trace.release(line, at_us)
                }
            })
        },
    )
}

proptest! {
    #[test]
    fn valid_configs_initialize(config in valid_config()) {
        prop_assert!(PaddleEngine::with_config(config, ()).is_ok());
    }

    #[test]
    fn single_violation_rejected_without_state_change(
        config in valid_config(),
        which in 0usize..6,
    ) {
        let mut bad = config;
        match which {
            0 => bad.speed_wpm = 0,
            1 => bad.timing_l = 91,
            2 => bad.timing_s = 100,
            3 => bad.timing_p = 9,
            4 => bad.mem_block_end_pct = 100.5,
            _ => {
                bad.mem_block_start_pct = 80.0;
                bad.mem_block_end_pct = 20.0;
            }
        }

        let mut engine = PaddleEngine::with_config(config, ()).unwrap();
        engine.update_paddles(true, false);
        engine.tick(0);
        let before = engine.snapshot();
        prop_assert!(engine.initialize(bad).is_err());
        prop_assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn standard_weighting_matches_paris(speed_wpm in 1u32..=100) {
        let config = EngineConfig { speed_wpm, ..EngineConfig::default() };
        let dit = 1_200_000 / speed_wpm as i64;
        prop_assert_eq!(config.dit_duration_us(), dit);
        prop_assert_eq!(config.dah_duration_us(), 3 * dit);
        prop_assert_eq!(config.gap_duration_us(), dit);
    }

    #[test]
    fn held_squeeze_alternates(config in valid_config()) {
        let mut engine = PaddleEngine::with_config(config, RecordingSink::new()).unwrap();
        engine.update_paddles(true, true);
        let step = (engine.dit_duration_us() / 20).max(50);
        let mut now = 0;
        while engine.sink().elements().len() < 6 {
            engine.tick(now);
            now += step;
            prop_assert!(now < 60_000_000, "engine stalled");
        }
        let elements = engine.sink().elements();
        for (i, element) in elements.iter().enumerate() {
            let expected = if i % 2 == 0 { PaddleElement::Dit } else { PaddleElement::Dah };
            prop_assert_eq!(*element, expected);
        }
    }

    #[test]
    fn memory_never_arms_element_being_sent(
        config in valid_config(),
        trace in paddle_trace(),
    ) {
        let mut engine = PaddleEngine::with_config(config, RecordingSink::new()).unwrap();
        run_trace(&mut engine, &trace, 1_000, 1_500_000);

        let mut sending = None;
        for event in engine.sink().events() {
            match *event {
                SinkEvent::ElementStarted { element, .. } => sending = Some(element),
                SinkEvent::ElementFinished { .. } => sending = None,
                SinkEvent::MemoryArmed { is_dah, .. } => {
                    prop_assert!(sending.is_some());
                    prop_assert_ne!(Some(is_dah), sending.map(|e| e.is_dah()));
                }
                _ => {}
            }
        }
    }

    #[test]
    fn key_changes_pair_and_gap_never_skipped(
        config in valid_config(),
        trace in paddle_trace(),
    ) {
        let mut engine = PaddleEngine::with_config(config, RecordingSink::new()).unwrap();
        run_trace(&mut engine, &trace, 1_000, 1_500_000);
        let sink = engine.sink();

        let mut down = false;
        for event in sink.events() {
            if let SinkEvent::KeyState { active, .. } = *event {
                prop_assert_ne!(active, down);
                down = active;
            }
        }
        let gap = engine.gap_duration_us();
        for g in sink.gaps_us() {
            prop_assert!(g >= gap);
        }
    }
}
