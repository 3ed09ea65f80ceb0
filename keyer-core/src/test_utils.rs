//! Test utilities for keyer core functionality

pub mod output_capture {
    //! Sink that records everything the engine emits

    use crate::sink::KeyingSink;
    use crate::types::PaddleElement;

    /// One sink callback
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum SinkEvent {
        ElementStarted { element: PaddleElement, at_us: i64 },
        ElementFinished { element: PaddleElement, at_us: i64 },
        KeyState { active: bool, at_us: i64 },
        MemoryArmed { is_dah: bool, at_us: i64 },
        Squeeze { at_us: i64 },
    }

    /// Key-down interval of one element
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KeyedInterval {
        pub element: PaddleElement,
        pub start_us: i64,
        pub end_us: i64,
    }

    impl KeyedInterval {
        pub fn duration_us(&self) -> i64 {
            self.end_us - self.start_us
        }
    }

    #[derive(Debug, Default)]
    pub struct RecordingSink {
        events: Vec<SinkEvent>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> &[SinkEvent] {
            &self.events
        }

        pub fn clear(&mut self) {
            self.events.clear();
        }

        /// Elements in start order
        pub fn elements(&self) -> Vec<PaddleElement> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    SinkEvent::ElementStarted { element, .. } => Some(*element),
                    _ => None,
                })
                .collect()
        }

        /// Elements as a dot/dash string
        pub fn to_morse_string(&self) -> String {
            self.elements()
                .iter()
                .map(|e| match e {
                    PaddleElement::Dit => '.',
                    PaddleElement::Dah => '-',
                })
                .collect()
        }

        pub fn keyed_intervals(&self) -> Vec<KeyedInterval> {
            keyed_intervals(&self.events)
        }

        /// Key-up time between consecutive elements
        pub fn gaps_us(&self) -> Vec<i64> {
            self.keyed_intervals()
                .windows(2)
                .map(|w| w[1].start_us - w[0].end_us)
                .collect()
        }

        pub fn squeeze_count(&self) -> usize {
            self.events.iter().filter(|e| matches!(e, SinkEvent::Squeeze { .. })).count()
        }

        pub fn memory_arm_count(&self) -> usize {
            self.events.iter().filter(|e| matches!(e, SinkEvent::MemoryArmed { .. })).count()
        }
    }

    impl KeyingSink for RecordingSink {
        fn on_element_started(&mut self, element: PaddleElement, start_us: i64) {
            self.events.push(SinkEvent::ElementStarted { element, at_us: start_us });
        }

        fn on_element_finished(&mut self, element: PaddleElement, end_us: i64) {
            self.events.push(SinkEvent::ElementFinished { element, at_us: end_us });
        }

        fn on_key_state_changed(&mut self, active: bool, timestamp_us: i64) {
            self.events.push(SinkEvent::KeyState { active, at_us: timestamp_us });
        }

        fn on_memory_window_changed(&mut self, is_dah: bool, _armed: bool, now_us: i64) {
            self.events.push(SinkEvent::MemoryArmed { is_dah, at_us: now_us });
        }

        fn on_squeeze_detected(&mut self, now_us: i64) {
            self.events.push(SinkEvent::Squeeze { at_us: now_us });
        }
    }

    /// Pair element start/finish callbacks into key-down intervals.
    /// An element still keyed at the end of the log is left out.
    pub fn keyed_intervals(events: &[SinkEvent]) -> Vec<KeyedInterval> {
        let mut intervals = Vec::new();
        let mut open: Option<(PaddleElement, i64)> = None;
        for event in events {
            match *event {
                SinkEvent::ElementStarted { element, at_us } => open = Some((element, at_us)),
                SinkEvent::ElementFinished { element, at_us } => {
                    if let Some((started, start_us)) = open.take() {
                        debug_assert_eq!(started, element);
                        intervals.push(KeyedInterval { element, start_us, end_us: at_us });
                    }
                }
                _ => {}
            }
        }
        intervals
    }
}

pub mod paddle_simulator {
    //! Scripted paddle input

    use crate::engine::PaddleEngine;
    use crate::hal::{PaddleEvent, PaddleLine};
    use crate::sink::KeyingSink;

    /// Paddle events ordered by time
    #[derive(Debug, Clone, Default)]
    pub struct PaddleTrace {
        pub events: Vec<PaddleEvent>,
    }

    impl PaddleTrace {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn press(mut self, line: PaddleLine, at_us: i64) -> Self {
            self.events.push(PaddleEvent::new(line, true, at_us));
            self
        }

        pub fn release(mut self, line: PaddleLine, at_us: i64) -> Self {
            self.events.push(PaddleEvent::new(line, false, at_us));
            self
        }

        /// Hold one paddle over `[from_us, to_us)`
        pub fn hold(self, line: PaddleLine, from_us: i64, to_us: i64) -> Self {
            self.press(line, from_us).release(line, to_us)
        }

        /// Both paddles pressed at `from_us` and released at `to_us`
        pub fn squeeze(self, from_us: i64, to_us: i64) -> Self {
            self.press(PaddleLine::Dit, from_us)
                .press(PaddleLine::Dah, from_us)
                .release(PaddleLine::Dit, to_us)
                .release(PaddleLine::Dah, to_us)
        }

        fn sorted(&self) -> Vec<PaddleEvent> {
            let mut events = self.events.clone();
            // Stable: same-time events keep insertion order
            events.sort_by_key(|e| e.timestamp_us);
            events
        }
    }

    /// Step the engine from 0 to `until_us` every `step_us`, applying each
    /// trace event at the first tick at or after its timestamp
    pub fn run_trace<S: KeyingSink>(
        engine: &mut PaddleEngine<S>,
        trace: &PaddleTrace,
        step_us: i64,
        until_us: i64,
    ) {
        let events = trace.sorted();
        let mut next = 0;
        let mut now = 0;
        while now <= until_us {
            while next < events.len() && events[next].timestamp_us <= now {
                engine.on_paddle_event(&events[next]);
                next += 1;
            }
            engine.tick(now);
            now += step_us.max(1);
        }
    }
}

pub use output_capture::{keyed_intervals, KeyedInterval, RecordingSink, SinkEvent};
pub use paddle_simulator::{run_trace, PaddleTrace};
