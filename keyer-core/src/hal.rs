//! Hardware boundary: paddle events in, key line out

use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::KeyingConfig;
use crate::sink::KeyingSink;

/// Physical input line
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaddleLine {
    Dit,
    Dah,
    /// Straight key input, ignored by the iambic engine
    Key,
}

/// Edge on one input line, produced by the interrupt/sampling layer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PaddleEvent {
    pub line: PaddleLine,
    /// `true` when the contact is closed
    pub active: bool,
    pub timestamp_us: i64,
}

impl PaddleEvent {
    pub const fn new(line: PaddleLine, active: bool, timestamp_us: i64) -> Self {
        Self { line, active, timestamp_us }
    }

    pub const fn dit(active: bool, timestamp_us: i64) -> Self {
        Self::new(PaddleLine::Dit, active, timestamp_us)
    }

    pub const fn dah(active: bool, timestamp_us: i64) -> Self {
        Self::new(PaddleLine::Dah, active, timestamp_us)
    }
}

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// GPIO operation failed
    GpioError,
    /// Invalid configuration
    InvalidConfig,
}

#[cfg(feature = "std")]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::GpioError => write!(f, "GPIO operation failed"),
            HalError::InvalidConfig => write!(f, "Invalid configuration"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Longest accepted contact debounce
pub const MAX_DEBOUNCE_US: i64 = 100_000;

/// Debounce state of one contact
#[derive(Copy, Clone, Debug)]
struct LineState {
    stable: bool,
    candidate: bool,
    candidate_since_us: i64,
}

impl LineState {
    const fn new() -> Self {
        Self { stable: false, candidate: false, candidate_since_us: 0 }
    }

    /// Returns the new stable level when it changes
    fn update(&mut self, raw: bool, now_us: i64, debounce_us: i64) -> Option<bool> {
        if raw != self.candidate {
            self.candidate = raw;
            self.candidate_since_us = now_us;
        }
        if self.candidate != self.stable
            && now_us.saturating_sub(self.candidate_since_us) >= debounce_us
        {
            self.stable = self.candidate;
            return Some(self.stable);
        }
        None
    }
}

/// Polls two active-low paddle contacts and turns level changes into events.
///
/// A level must hold for `debounce_us` before it is reported. With
/// `swap` set the dit contact reports as `Dah` and vice versa.
pub struct PaddleSampler<D, A> {
    dit_pin: D,
    dah_pin: A,
    dit: LineState,
    dah: LineState,
    debounce_us: i64,
    swap: bool,
}

impl<D, A> PaddleSampler<D, A>
where
    D: InputPin,
    A: InputPin,
{
    pub fn new(dit_pin: D, dah_pin: A) -> Self {
        Self {
            dit_pin,
            dah_pin,
            dit: LineState::new(),
            dah: LineState::new(),
            debounce_us: 0,
            swap: false,
        }
    }

    pub fn set_debounce_us(&mut self, debounce_us: i64) -> Result<(), HalError> {
        if !(0..=MAX_DEBOUNCE_US).contains(&debounce_us) {
            return Err(HalError::InvalidConfig);
        }
        self.debounce_us = debounce_us;
        Ok(())
    }

    pub fn set_swap(&mut self, swap: bool) {
        self.swap = swap;
    }

    /// Take the paddle orientation from the keying configuration
    pub fn apply_keying(&mut self, keying: &KeyingConfig) {
        self.set_swap(keying.swap_paddles);
    }

    /// Debounced level of the logical dit and dah paddles
    pub fn levels(&self) -> (bool, bool) {
        if self.swap {
            (self.dah.stable, self.dit.stable)
        } else {
            (self.dit.stable, self.dah.stable)
        }
    }

    /// Read both contacts once and return the events for lines whose
    /// debounced level changed, dit first
    pub fn sample(&mut self, now_us: i64) -> Result<heapless::Vec<PaddleEvent, 2>, HalError> {
        let dit_raw = self.dit_pin.is_low().map_err(|_| HalError::GpioError)?;
        let dah_raw = self.dah_pin.is_low().map_err(|_| HalError::GpioError)?;

        let (dit_line, dah_line) = if self.swap {
            (PaddleLine::Dah, PaddleLine::Dit)
        } else {
            (PaddleLine::Dit, PaddleLine::Dah)
        };

        let mut events = heapless::Vec::new();
        if let Some(active) = self.dit.update(dit_raw, now_us, self.debounce_us) {
            // Capacity is 2, one slot per contact
            let _ = events.push(PaddleEvent::new(dit_line, active, now_us));
        }
        if let Some(active) = self.dah.update(dah_raw, now_us, self.debounce_us) {
            let _ = events.push(PaddleEvent::new(dah_line, active, now_us));
        }
        Ok(events)
    }

    /// Return the pins
    pub fn release(self) -> (D, A) {
        (self.dit_pin, self.dah_pin)
    }
}

/// Drives the transmitter key line from engine key state changes.
///
/// Pin errors cannot be reported back through the engine, so they are
/// counted and logged.
pub struct EmbeddedHalKeyOutput<P> {
    pin: P,
    inverted: bool,
    errors: u32,
}

impl<P> EmbeddedHalKeyOutput<P>
where
    P: OutputPin,
{
    pub fn new(pin: P, inverted: bool) -> Self {
        Self { pin, inverted, errors: 0 }
    }

    pub fn set_state(&mut self, active: bool) -> Result<(), HalError> {
        let output_state = if self.inverted { !active } else { active };
        if output_state {
            self.pin.set_high().map_err(|_| HalError::GpioError)
        } else {
            self.pin.set_low().map_err(|_| HalError::GpioError)
        }
    }

    /// Number of failed pin writes since construction
    pub fn error_count(&self) -> u32 {
        self.errors
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> KeyingSink for EmbeddedHalKeyOutput<P>
where
    P: OutputPin,
{
    fn on_key_state_changed(&mut self, active: bool, timestamp_us: i64) {
        if self.set_state(active).is_err() {
            self.errors = self.errors.saturating_add(1);
            error!("key output write failed (active={}, t={})", active, timestamp_us);
        }
    }
}
