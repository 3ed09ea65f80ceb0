//! Output side of the engine
//!
//! Every method is called synchronously from inside [`crate::PaddleEngine::tick`]
//! and must not block. Key state changes drive the transmitter and sidetone,
//! so implementations should act on them immediately.

use crate::types::PaddleElement;

/// Receiver of engine events
pub trait KeyingSink {
    /// An element began at `start_us`
    fn on_element_started(&mut self, _element: PaddleElement, _start_us: i64) {}

    /// An element ended at `end_us`
    fn on_element_finished(&mut self, _element: PaddleElement, _end_us: i64) {}

    /// Key down (`true`) or key up (`false`)
    fn on_key_state_changed(&mut self, _active: bool, _timestamp_us: i64) {}

    /// A memory flag was armed; `is_dah` names the memorized element
    fn on_memory_window_changed(&mut self, _is_dah: bool, _armed: bool, _now_us: i64) {}

    /// Both paddles seen closed inside the memory window of the current element
    fn on_squeeze_detected(&mut self, _now_us: i64) {}
}

/// Discards everything
impl KeyingSink for () {}

impl<T: KeyingSink + ?Sized> KeyingSink for &mut T {
    fn on_element_started(&mut self, element: PaddleElement, start_us: i64) {
        (**self).on_element_started(element, start_us)
    }

    fn on_element_finished(&mut self, element: PaddleElement, end_us: i64) {
        (**self).on_element_finished(element, end_us)
    }

    fn on_key_state_changed(&mut self, active: bool, timestamp_us: i64) {
        (**self).on_key_state_changed(active, timestamp_us)
    }

    fn on_memory_window_changed(&mut self, is_dah: bool, armed: bool, now_us: i64) {
        (**self).on_memory_window_changed(is_dah, armed, now_us)
    }

    fn on_squeeze_detected(&mut self, now_us: i64) {
        (**self).on_squeeze_detected(now_us)
    }
}

/// Fan-out to two sinks, first one first (e.g. TX key, then sidetone)
impl<A: KeyingSink, B: KeyingSink> KeyingSink for (A, B) {
    fn on_element_started(&mut self, element: PaddleElement, start_us: i64) {
        self.0.on_element_started(element, start_us);
        self.1.on_element_started(element, start_us);
    }

    fn on_element_finished(&mut self, element: PaddleElement, end_us: i64) {
        self.0.on_element_finished(element, end_us);
        self.1.on_element_finished(element, end_us);
    }

    fn on_key_state_changed(&mut self, active: bool, timestamp_us: i64) {
        self.0.on_key_state_changed(active, timestamp_us);
        self.1.on_key_state_changed(active, timestamp_us);
    }

    fn on_memory_window_changed(&mut self, is_dah: bool, armed: bool, now_us: i64) {
        self.0.on_memory_window_changed(is_dah, armed, now_us);
        self.1.on_memory_window_changed(is_dah, armed, now_us);
    }

    fn on_squeeze_detected(&mut self, now_us: i64) {
        self.0.on_squeeze_detected(now_us);
        self.1.on_squeeze_detected(now_us);
    }
}
