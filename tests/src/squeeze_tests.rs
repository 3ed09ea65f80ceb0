//! Squeeze keying tests: alternation, timeline and reference combo tracking

use keyer_core::test_utils::{run_trace, KeyedInterval, PaddleTrace, RecordingSink, SinkEvent};
use keyer_core::{
    EngineConfig, EngineState, IambicMode, MemoryMode, PaddleElement, PaddleEngine, PaddleLine,
    SqueezeMode,
};
use rstest::rstest;

use PaddleElement::{Dah, Dit};

fn engine(config: EngineConfig) -> PaddleEngine<RecordingSink> {
    PaddleEngine::with_config(config, RecordingSink::new()).unwrap()
}

/// Tick from `from_us` to `until_us` inclusive at a fixed step
fn tick_until(engine: &mut PaddleEngine<RecordingSink>, from_us: i64, until_us: i64, step_us: i64) {
    let mut now = from_us;
    while now <= until_us {
        engine.tick(now);
        now += step_us;
    }
}

#[test]
fn test_held_squeeze_timeline_20wpm() {
    println!("\n=== Held squeeze, 20 WPM, window 0-100%, live ===");
    let config = EngineConfig {
        squeeze_mode: SqueezeMode::Live,
        memory_mode: MemoryMode::DotAndDah,
        ..EngineConfig::default()
    };
    let mut e = engine(config);
    e.update_paddles(true, true);
    tick_until(&mut e, 0, 420_000, 1_000);

    let intervals = e.sink().keyed_intervals();
    for i in &intervals {
        println!("  {:?} [{}, {})", i.element, i.start_us, i.end_us);
    }
    assert_eq!(
        intervals,
        vec![
            KeyedInterval { element: Dit, start_us: 0, end_us: 60_000 },
            KeyedInterval { element: Dah, start_us: 120_000, end_us: 300_000 },
            KeyedInterval { element: Dit, start_us: 360_000, end_us: 420_000 },
        ]
    );
    assert_eq!(e.sink().gaps_us(), vec![60_000, 60_000]);
}

#[rstest]
fn test_continuous_squeeze_alternates(
    #[values(IambicMode::A, IambicMode::B)] iambic_mode: IambicMode,
    #[values(SqueezeMode::Snapshot, SqueezeMode::Live)] squeeze_mode: SqueezeMode,
    #[values(MemoryMode::None, MemoryMode::DotAndDah)] memory_mode: MemoryMode,
) {
    let config = EngineConfig { iambic_mode, squeeze_mode, memory_mode, ..EngineConfig::default() };
    let mut e = engine(config);
    let trace = PaddleTrace::new().press(PaddleLine::Dit, 0).press(PaddleLine::Dah, 0);
    run_trace(&mut e, &trace, 1_000, 2_000_000);

    let elements = e.sink().elements();
    assert!(elements.len() >= 6);
    for (i, element) in elements.iter().enumerate() {
        let expected = if i % 2 == 0 { Dit } else { Dah };
        assert_eq!(*element, expected, "element {}", i);
    }
}

#[test]
fn test_squeeze_memory_only_arms_opposite() {
    let mut e = engine(EngineConfig::default());
    let trace = PaddleTrace::new().squeeze(0, 1_000_000);
    run_trace(&mut e, &trace, 1_000, 1_000_000);

    // Every memory arm is for the element not being sent
    let mut sending = None;
    for event in e.sink().events() {
        match *event {
            SinkEvent::ElementStarted { element, .. } => {
                sending = Some(element)
            }
            SinkEvent::MemoryArmed { is_dah, .. } => {
                let sending = sending.expect("memory armed outside an element");
                assert_ne!(is_dah, sending.is_dah());
            }
            _ => {}
        }
    }
    assert!(e.sink().memory_arm_count() > 0);
}

/// Squeeze from reset, then both contacts open in a single sample
fn release_both_at_once(squeeze_mode: SqueezeMode) -> PaddleEngine<RecordingSink> {
    let config = EngineConfig {
        squeeze_mode,
        memory_mode: MemoryMode::None,
        ..EngineConfig::default()
    };
    let mut e = engine(config);
    e.update_paddles(true, true);
    tick_until(&mut e, 0, 30_000, 1_000);
    e.update_paddles(false, false);
    tick_until(&mut e, 31_000, 600_000, 1_000);
    e
}

#[test]
fn test_snapshot_and_live_diverge_on_simultaneous_release() {
    let snapshot = release_both_at_once(SqueezeMode::Snapshot);
    let live = release_both_at_once(SqueezeMode::Live);

    // Snapshot keeps Both as its reference and skips the bonus
    assert_eq!(snapshot.sink().to_morse_string(), ".");
    // Live sees None and appends the opposite element
    assert_eq!(live.sink().to_morse_string(), ".-");
    assert_eq!(live.state(), EngineState::Idle);
}

#[test]
fn test_mode_b_bonus_is_single() {
    let config = EngineConfig { squeeze_mode: SqueezeMode::Live, ..EngineConfig::default() };
    let mut e = engine(config);
    // Squeeze during a dah, release inside it
    let trace = PaddleTrace::new()
        .press(PaddleLine::Dah, 0)
        .press(PaddleLine::Dit, 50_000)
        .release(PaddleLine::Dit, 100_000)
        .release(PaddleLine::Dah, 100_000);
    run_trace(&mut e, &trace, 1_000, 800_000);
    // Dit memory plus bonus dit would give two dits; the bonus is skipped
    assert_eq!(e.sink().to_morse_string(), "-.");
}

#[test]
fn test_gap_precedes_every_queued_element() {
    let mut e = engine(EngineConfig::default());
    let trace = PaddleTrace::new().squeeze(0, 400_000);
    run_trace(&mut e, &trace, 1_000, 1_000_000);
    let gap = e.gap_duration_us();
    for g in e.sink().gaps_us() {
        assert!(g >= gap, "gap {} shorter than {}", g, gap);
    }
}

#[test]
fn test_alternation_restarts_after_reset() {
    let mut e = engine(EngineConfig::default());
    e.update_paddles(false, true);
    tick_until(&mut e, 0, 10_000, 1_000);
    assert_eq!(e.state(), EngineState::SendDah);
    e.reset();
    e.sink_mut().clear();
    e.update_paddles(true, true);
    e.tick(20_000);
    // last_element is Dah after reset, so a squeeze starts with a dit
    assert_eq!(e.sink().elements(), vec![Dit]);
}
