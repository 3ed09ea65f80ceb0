//! Iambic keying engine
//!
//! Polled state machine: paddle edges come in through [`PaddleEngine::on_paddle_event`]
//! (or [`PaddleEngine::update_paddles`]), time advances through
//! [`PaddleEngine::tick`], and all output goes to a [`KeyingSink`].
//!
//! ```text
//! Idle -> SendDit / SendDah -> IntraElementGap -> Idle
//! ```
//!
//! All timing decisions compare `now_us` against absolute timestamps stored
//! when an element or gap started, so a late or irregular clock only
//! stretches elements and never desynchronizes the machine.

use heapless::Deque;

use crate::hal::{PaddleEvent, PaddleLine};
use crate::sink::KeyingSink;
use crate::types::{
    ConfigError, EngineConfig, EngineState, IambicMode, PaddleCombo, PaddleElement, SqueezeMode,
};

/// Pending element queue depth. One memory element and one bonus element
/// can be queued per finished element.
pub const QUEUE_CAPACITY: usize = 4;

/// Copy of the engine runtime state for diagnostics
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineSnapshot {
    pub state: EngineState,
    pub current_element: PaddleElement,
    pub last_element: PaddleElement,
    pub element_start_us: i64,
    pub element_end_us: i64,
    pub gap_start_us: i64,
    pub gap_end_us: i64,
    pub dit_pressed: bool,
    pub dah_pressed: bool,
    pub queue_len: usize,
    pub dot_requested: bool,
    pub dah_requested: bool,
    pub squeeze_seen_this_element: bool,
    pub last_valid_combo: PaddleCombo,
    pub config: EngineConfig,
}

/// Iambic paddle keyer state machine.
///
/// Not synchronized: drive it from a single context (see
/// [`crate::channel::KeyerDriver`]).
pub struct PaddleEngine<S: KeyingSink> {
    config: EngineConfig,
    sink: S,

    state: EngineState,
    current_element: PaddleElement,
    /// Drives squeeze alternation
    last_element: PaddleElement,
    element_start_us: i64,
    element_end_us: i64,
    gap_start_us: i64,
    gap_end_us: i64,

    dit_pressed: bool,
    dah_pressed: bool,

    /// Memory and bonus elements, sent before live paddle state
    queue: Deque<PaddleElement, QUEUE_CAPACITY>,
    dot_requested: bool,
    dah_requested: bool,

    squeeze_seen_this_element: bool,
    /// Reference combo for the Mode B bonus decision
    last_valid_combo: PaddleCombo,
}

impl<S: KeyingSink> PaddleEngine<S> {
    /// Create an engine with [`EngineConfig::default`]
    pub fn new(sink: S) -> Self {
        Self {
            config: EngineConfig::default(),
            sink,
            state: EngineState::Idle,
            current_element: PaddleElement::Dit,
            last_element: PaddleElement::Dah,
            element_start_us: 0,
            element_end_us: 0,
            gap_start_us: 0,
            gap_end_us: 0,
            dit_pressed: false,
            dah_pressed: false,
            queue: Deque::new(),
            dot_requested: false,
            dah_requested: false,
            squeeze_seen_this_element: false,
            last_valid_combo: PaddleCombo::None,
        }
    }

    /// Create an engine with a validated configuration
    pub fn with_config(config: EngineConfig, sink: S) -> Result<Self, ConfigError> {
        let mut engine = Self::new(sink);
        engine.initialize(config)?;
        Ok(engine)
    }

    /// Validate and apply a new configuration, then reset.
    ///
    /// On error nothing changes: the previous configuration and runtime state
    /// stay in place.
    pub fn initialize(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            error!("engine config rejected: {}", e);
            return Err(e);
        }
        self.config = config;
        self.reset();
        info!(
            "engine configured: {} WPM, L-S-P {}-{}-{}, window {}..{}%",
            config.speed_wpm,
            config.timing_l,
            config.timing_s,
            config.timing_p,
            config.mem_block_start_pct,
            config.mem_block_end_pct
        );
        Ok(())
    }

    /// Return to Idle and forget all paddle, memory and squeeze state.
    ///
    /// Does not unkey: the caller must release the transmitter itself.
    pub fn reset(&mut self) {
        self.state = EngineState::Idle;
        self.current_element = PaddleElement::Dit;
        self.last_element = PaddleElement::Dah;
        self.element_start_us = 0;
        self.element_end_us = 0;
        self.gap_start_us = 0;
        self.gap_end_us = 0;
        self.dit_pressed = false;
        self.dah_pressed = false;
        self.queue.clear();
        self.dot_requested = false;
        self.dah_requested = false;
        self.squeeze_seen_this_element = false;
        self.last_valid_combo = PaddleCombo::None;
    }

    /// Apply one paddle edge. Straight key events are ignored.
    pub fn on_paddle_event(&mut self, event: &PaddleEvent) {
        match event.line {
            PaddleLine::Key => return,
            PaddleLine::Dit => self.dit_pressed = event.active,
            PaddleLine::Dah => self.dah_pressed = event.active,
        }
        trace!(
            "paddle {} {} @ {} (state={})",
            event.line,
            event.active,
            event.timestamp_us,
            self.state
        );
        self.update_reference_combo();
    }

    /// Apply both paddle levels at once
    pub fn update_paddles(&mut self, dit: bool, dah: bool) {
        self.dit_pressed = dit;
        self.dah_pressed = dah;
        self.update_reference_combo();
    }

    fn update_reference_combo(&mut self) {
        let combo = self.combo_now();
        let previous = self.last_valid_combo;
        match self.config.squeeze_mode {
            // Frozen at the last non-empty combo
            SqueezeMode::Snapshot => {
                if combo != PaddleCombo::None {
                    self.last_valid_combo = combo;
                }
            }
            SqueezeMode::Live => self.last_valid_combo = combo,
        }
        if previous != self.last_valid_combo {
            trace!("reference combo {} -> {}", previous, self.last_valid_combo);
        }
    }

    /// Advance the state machine to `now_us`
    pub fn tick(&mut self, now_us: i64) {
        loop {
            match self.state {
                EngineState::Idle => {
                    self.run_idle(now_us);
                    return;
                }
                EngineState::SendDit | EngineState::SendDah => {
                    self.check_memory_and_squeeze(now_us);
                    if now_us >= self.element_end_us {
                        let end_us = self.element_end_us;
                        self.finish_element(end_us);
                        // Never skipped, even with a queued element
                        self.enter_gap(end_us);
                    }
                    return;
                }
                EngineState::IntraElementGap => {
                    if now_us < self.gap_end_us {
                        return;
                    }
                    trace!("gap complete ({} us)", now_us.saturating_sub(self.gap_start_us));
                    // Re-evaluate Idle in this same call
                    self.state = EngineState::Idle;
                }
            }
        }
    }

    fn run_idle(&mut self, now_us: i64) {
        if let Some(next) = self.queue.pop_front() {
            self.start_element(next, now_us);
            debug!("sent queued {} ({} left)", next, self.queue.len());
            return;
        }

        let next = match self.combo_now() {
            PaddleCombo::None => return,
            PaddleCombo::Both => self.last_element.opposite(),
            PaddleCombo::DahOnly => PaddleElement::Dah,
            PaddleCombo::DitOnly => PaddleElement::Dit,
        };
        self.start_element(next, now_us);
    }

    fn start_element(&mut self, element: PaddleElement, start_us: i64) {
        let duration = match element {
            PaddleElement::Dit => self.config.dit_duration_us(),
            PaddleElement::Dah => self.config.dah_duration_us(),
        };
        self.state = EngineState::for_element(element);
        self.current_element = element;
        self.element_start_us = start_us;
        // Saturates near i64::MAX
        self.element_end_us = start_us.saturating_add(duration);
        self.last_element = element;
        self.squeeze_seen_this_element = false;

        // Key first, log after
        self.sink.on_element_started(element, start_us);
        self.sink.on_key_state_changed(true, start_us);

        debug!(
            "start {} @ {} dur={} end={} queue={}",
            element,
            start_us,
            duration,
            self.element_end_us,
            self.queue.len()
        );
    }

    fn finish_element(&mut self, end_us: i64) {
        let element = self.current_element;
        let memory_dit = self.dot_requested;
        let memory_dah = self.dah_requested;

        if self.dot_requested {
            self.dot_requested = false;
            self.enqueue(PaddleElement::Dit);
        }
        if self.dah_requested {
            self.dah_requested = false;
            self.enqueue(PaddleElement::Dah);
        }

        if self.config.iambic_mode == IambicMode::B {
            if self.squeeze_seen_this_element && self.last_valid_combo != PaddleCombo::Both {
                let bonus = element.opposite();
                let already_queued = match bonus {
                    PaddleElement::Dit => memory_dit,
                    PaddleElement::Dah => memory_dah,
                };
                if already_queued {
                    debug!("mode B bonus skipped: {} already queued by memory", bonus);
                } else {
                    self.enqueue(bonus);
                    debug!("mode B bonus {} queued", bonus);
                }
            } else if !self.squeeze_seen_this_element {
                trace!("mode B bonus skipped: no squeeze");
            } else {
                trace!("mode B bonus skipped: reference combo is both");
            }
        }

        self.sink.on_element_finished(element, end_us);
        self.sink.on_key_state_changed(false, end_us);

        debug!(
            "finish {} @ {} dur={}",
            element,
            end_us,
            end_us.saturating_sub(self.element_start_us)
        );
    }

    fn enter_gap(&mut self, start_us: i64) {
        self.state = EngineState::IntraElementGap;
        self.gap_start_us = start_us;
        self.gap_end_us = start_us.saturating_add(self.config.gap_duration_us());
        trace!("gap until {} (queue={})", self.gap_end_us, self.queue.len());
    }

    /// Memory only arms the opposite element and the Mode B extra is skipped
    /// when memory already queued it, so each finished element pushes at most
    /// once and Idle drains one per start. A full queue is not reachable
    /// through the public API.
    fn enqueue(&mut self, element: PaddleElement) {
        if self.queue.push_back(element).is_err() {
            warn!("element queue full, dropped {}", element);
        }
    }

    /// Elapsed share of the current element in percent, 0 before it starts
    fn element_progress_pct(&self, now_us: i64) -> f32 {
        let duration = self.element_end_us.saturating_sub(self.element_start_us);
        if duration <= 0 {
            return 0.0;
        }
        let elapsed = now_us.saturating_sub(self.element_start_us);
        if elapsed < 0 {
            return 0.0;
        }
        elapsed as f32 / duration as f32 * 100.0
    }

    fn memory_window_open(&self, now_us: i64) -> bool {
        if self.state.sending().is_none() {
            return false;
        }
        let progress = self.element_progress_pct(now_us);
        progress >= self.config.mem_block_start_pct && progress <= self.config.mem_block_end_pct
    }

    fn check_memory_and_squeeze(&mut self, now_us: i64) {
        if !self.memory_window_open(now_us) {
            return;
        }

        let can_dit = self.config.memory_mode.allows_dit();
        let can_dah = self.config.memory_mode.allows_dah();
        // Only the element opposite to the one being sent may be memorized
        let arm_dit = can_dit && self.current_element != PaddleElement::Dit;
        let arm_dah = can_dah && self.current_element != PaddleElement::Dah;

        match self.combo_now() {
            PaddleCombo::DitOnly if arm_dit => self.arm_memory(PaddleElement::Dit, now_us),
            PaddleCombo::DahOnly if arm_dah => self.arm_memory(PaddleElement::Dah, now_us),
            PaddleCombo::Both => {
                if arm_dit {
                    self.arm_memory(PaddleElement::Dit, now_us);
                }
                if arm_dah {
                    self.arm_memory(PaddleElement::Dah, now_us);
                }
                if !self.squeeze_seen_this_element {
                    self.squeeze_seen_this_element = true;
                    self.sink.on_squeeze_detected(now_us);
                    debug!("squeeze at {}%", self.element_progress_pct(now_us));
                }
            }
            _ => {}
        }
    }

    fn arm_memory(&mut self, element: PaddleElement, now_us: i64) {
        let flag = match element {
            PaddleElement::Dit => &mut self.dot_requested,
            PaddleElement::Dah => &mut self.dah_requested,
        };
        if *flag {
            return;
        }
        *flag = true;
        self.sink.on_memory_window_changed(element.is_dah(), true, now_us);
        debug!("memory armed: {} at {}%", element, self.element_progress_pct(now_us));
    }

    fn combo_now(&self) -> PaddleCombo {
        PaddleCombo::from_pressed(self.dit_pressed, self.dah_pressed)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Returns true while an element is being keyed
    pub fn is_key_down(&self) -> bool {
        self.state.sending().is_some()
    }

    /// Elements waiting to be sent, front first
    pub fn queued_elements(&self) -> impl Iterator<Item = PaddleElement> + '_ {
        self.queue.iter().copied()
    }

    pub fn dit_duration_us(&self) -> i64 {
        self.config.dit_duration_us()
    }

    pub fn dah_duration_us(&self) -> i64 {
        self.config.dah_duration_us()
    }

    pub fn gap_duration_us(&self) -> i64 {
        self.config.gap_duration_us()
    }

    /// PARIS based speed for display; the state machine never uses it
    pub fn effective_wpm(&self) -> f32 {
        self.config.effective_wpm()
    }

    pub fn dash_ratio(&self) -> f32 {
        self.config.dash_ratio()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state,
            current_element: self.current_element,
            last_element: self.last_element,
            element_start_us: self.element_start_us,
            element_end_us: self.element_end_us,
            gap_start_us: self.gap_start_us,
            gap_end_us: self.gap_end_us,
            dit_pressed: self.dit_pressed,
            dah_pressed: self.dah_pressed,
            queue_len: self.queue.len(),
            dot_requested: self.dot_requested,
            dah_requested: self.dah_requested,
            squeeze_seen_this_element: self.squeeze_seen_this_element,
            last_valid_combo: self.last_valid_combo,
            config: self.config,
        }
    }

    /// Log the full runtime state and return it
    pub fn dump_state(&self, now_us: i64) -> EngineSnapshot {
        let snap = self.snapshot();
        info!("=== paddle engine @ {} ===", now_us);
        info!(
            "state={} current={} ({}..{}) last={}",
            snap.state,
            snap.current_element,
            snap.element_start_us,
            snap.element_end_us,
            snap.last_element
        );
        info!("gap {}..{}", snap.gap_start_us, snap.gap_end_us);
        info!("paddles dit={} dah={}", snap.dit_pressed, snap.dah_pressed);
        info!(
            "queue={} memory dit={} dah={}",
            snap.queue_len,
            snap.dot_requested,
            snap.dah_requested
        );
        info!(
            "squeeze seen={} reference={}",
            snap.squeeze_seen_this_element,
            snap.last_valid_combo
        );
        info!("config {}", snap.config);
        snap
    }
}
