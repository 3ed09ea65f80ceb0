//! Core data types for the iambic keying engine

/// Morse elements produced by the paddles
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaddleElement {
    /// Dit (short element)
    Dit,
    /// Dah (long element)
    Dah,
}

impl PaddleElement {
    /// Returns the opposite element (Dit <-> Dah)
    pub const fn opposite(&self) -> PaddleElement {
        match self {
            PaddleElement::Dit => PaddleElement::Dah,
            PaddleElement::Dah => PaddleElement::Dit,
        }
    }

    pub const fn is_dah(&self) -> bool {
        matches!(self, PaddleElement::Dah)
    }
}

/// Which paddles are currently closed
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaddleCombo {
    None,
    DitOnly,
    DahOnly,
    /// Squeeze
    Both,
}

impl PaddleCombo {
    /// Derive the combo from raw contact state
    pub const fn from_pressed(dit: bool, dah: bool) -> Self {
        match (dit, dah) {
            (true, true) => PaddleCombo::Both,
            (true, false) => PaddleCombo::DitOnly,
            (false, true) => PaddleCombo::DahOnly,
            (false, false) => PaddleCombo::None,
        }
    }
}

/// Iambic keyer mode
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IambicMode {
    /// Mode A: alternate while squeezed, nothing extra on release
    A,
    /// Mode B: one bonus opposite element after a squeeze
    #[default]
    B,
}

/// Which paddles may arm element memory
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryMode {
    None,
    DotOnly,
    DahOnly,
    #[default]
    DotAndDah,
}

impl MemoryMode {
    /// Build from independent dit/dah enable flags
    pub const fn from_flags(enable_dit: bool, enable_dah: bool) -> Self {
        match (enable_dit, enable_dah) {
            (true, true) => MemoryMode::DotAndDah,
            (true, false) => MemoryMode::DotOnly,
            (false, true) => MemoryMode::DahOnly,
            (false, false) => MemoryMode::None,
        }
    }

    /// Returns true if the dit paddle may be memorized
    pub const fn allows_dit(&self) -> bool {
        matches!(self, MemoryMode::DotOnly | MemoryMode::DotAndDah)
    }

    /// Returns true if the dah paddle may be memorized
    pub const fn allows_dah(&self) -> bool {
        matches!(self, MemoryMode::DahOnly | MemoryMode::DotAndDah)
    }
}

/// How the reference combo used for Mode B bonus decisions is tracked
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SqueezeMode {
    /// Keep the last non-empty combo until the next non-empty one (edge trigger)
    #[default]
    Snapshot,
    /// Follow the live combo, including `None` (state latch)
    Live,
}

impl SqueezeMode {
    /// State latch keys track live paddle level, edge-trigger keys snapshot it
    pub const fn from_state_latch(use_state_latch: bool) -> Self {
        if use_state_latch {
            SqueezeMode::Live
        } else {
            SqueezeMode::Snapshot
        }
    }
}

/// Engine FSM states
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineState {
    /// Waiting for queued elements or paddle input
    Idle,
    /// Key down, sending a dit
    SendDit,
    /// Key down, sending a dah
    SendDah,
    /// Key up between two elements
    IntraElementGap,
}

impl EngineState {
    /// Returns the element being keyed, if any
    pub const fn sending(&self) -> Option<PaddleElement> {
        match self {
            EngineState::SendDit => Some(PaddleElement::Dit),
            EngineState::SendDah => Some(PaddleElement::Dah),
            EngineState::Idle | EngineState::IntraElementGap => None,
        }
    }

    pub const fn for_element(element: PaddleElement) -> Self {
        match element {
            PaddleElement::Dit => EngineState::SendDit,
            PaddleElement::Dah => EngineState::SendDah,
        }
    }
}

/// Engine configuration, replaced wholesale on reconfiguration
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Keying speed in words per minute (PARIS)
    pub speed_wpm: u32,
    /// L: dash length, dah = dit * L/10 (10..=90)
    pub timing_l: u8,
    /// S: intra-element gap, gap = dit * S/50 (0..=99)
    pub timing_s: u8,
    /// P: dit weight, dit = theoretical * P/50 (10..=99)
    pub timing_p: u8,
    /// Memory window opens at this percentage of the element
    pub mem_block_start_pct: f32,
    /// Memory window closes at this percentage of the element
    pub mem_block_end_pct: f32,
    pub iambic_mode: IambicMode,
    pub memory_mode: MemoryMode,
    pub squeeze_mode: SqueezeMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            speed_wpm: 20,
            timing_l: 30,
            timing_s: 50,
            timing_p: 50,
            mem_block_start_pct: 0.0,
            mem_block_end_pct: 100.0,
            iambic_mode: IambicMode::B,
            memory_mode: MemoryMode::DotAndDah,
            squeeze_mode: SqueezeMode::Snapshot,
        }
    }
}

impl EngineConfig {
    /// Check every bound the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.speed_wpm == 0 {
            return Err(ConfigError::ZeroSpeed);
        }
        // Negated comparisons also reject NaN
        if !(0.0..=100.0).contains(&self.mem_block_start_pct) {
            return Err(ConfigError::WindowStartOutOfRange(self.mem_block_start_pct));
        }
        if !(0.0..=100.0).contains(&self.mem_block_end_pct) {
            return Err(ConfigError::WindowEndOutOfRange(self.mem_block_end_pct));
        }
        if self.mem_block_start_pct > self.mem_block_end_pct {
            return Err(ConfigError::WindowInverted {
                start: self.mem_block_start_pct,
                end: self.mem_block_end_pct,
            });
        }
        if !(10..=90).contains(&self.timing_l) {
            return Err(ConfigError::TimingLOutOfRange(self.timing_l));
        }
        if self.timing_s > 99 {
            return Err(ConfigError::TimingSOutOfRange(self.timing_s));
        }
        if !(10..=99).contains(&self.timing_p) {
            return Err(ConfigError::TimingPOutOfRange(self.timing_p));
        }
        Ok(())
    }
}

/// Reasons an [`EngineConfig`] is rejected
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// speed_wpm must be > 0
    ZeroSpeed,
    /// mem_block_start_pct outside 0..=100
    WindowStartOutOfRange(f32),
    /// mem_block_end_pct outside 0..=100
    WindowEndOutOfRange(f32),
    /// Window opens after it closes
    WindowInverted { start: f32, end: f32 },
    /// timing_l outside 10..=90
    TimingLOutOfRange(u8),
    /// timing_s outside 0..=99
    TimingSOutOfRange(u8),
    /// timing_p outside 10..=99
    TimingPOutOfRange(u8),
}

#[cfg(feature = "std")]
impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroSpeed => write!(f, "speed_wpm must be > 0"),
            ConfigError::WindowStartOutOfRange(v) => {
                write!(f, "mem_block_start_pct must be 0-100 (got {:.1})", v)
            }
            ConfigError::WindowEndOutOfRange(v) => {
                write!(f, "mem_block_end_pct must be 0-100 (got {:.1})", v)
            }
            ConfigError::WindowInverted { start, end } => {
                write!(f, "memory window invalid (start={:.1}% > end={:.1}%)", start, end)
            }
            ConfigError::TimingLOutOfRange(v) => write!(f, "timing_l must be 10-90 (got {})", v),
            ConfigError::TimingSOutOfRange(v) => write!(f, "timing_s must be 0-99 (got {})", v),
            ConfigError::TimingPOutOfRange(v) => write!(f, "timing_p must be 10-99 (got {})", v),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}
