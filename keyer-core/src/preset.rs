//! Keyer presets (V0-V9) and their timing/memory definitions
//!
//! Families:
//! - V0-V2: SuperKeyer, 55-99% window, state latch, L-S-P 28-48-52
//! - V3-V5: Accukeyer, 60-99% window, state latch, L-S-P 30-50-50 (V3 is the default)
//! - V6-V8: Curtis A, 60-99% window, edge trigger, L-S-P 32-52-48
//! - V9: no memory at all, straight-key style
//!
//! Within a family the three entries enable both memories, dit only and dah only.

use core::str::FromStr;

/// Number of built-in presets (V0-V9)
pub const PRESET_COUNT: usize = 10;

/// Selectable keyer preset
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyingPreset {
    SuperKeyerBoth,
    SuperKeyerDot,
    SuperKeyerDash,
    #[default]
    AccukeyerBoth,
    AccukeyerDot,
    AccukeyerDash,
    CurtisABoth,
    CurtisADot,
    CurtisADash,
    NoMemory,
    /// Every parameter comes from the working configuration
    Manual,
}

impl KeyingPreset {
    /// All table-backed presets in index order
    pub const ALL: [KeyingPreset; PRESET_COUNT] = [
        KeyingPreset::SuperKeyerBoth,
        KeyingPreset::SuperKeyerDot,
        KeyingPreset::SuperKeyerDash,
        KeyingPreset::AccukeyerBoth,
        KeyingPreset::AccukeyerDot,
        KeyingPreset::AccukeyerDash,
        KeyingPreset::CurtisABoth,
        KeyingPreset::CurtisADot,
        KeyingPreset::CurtisADash,
        KeyingPreset::NoMemory,
    ];

    /// Table index (0-9), `None` for Manual
    pub const fn index(&self) -> Option<usize> {
        match self {
            KeyingPreset::SuperKeyerBoth => Some(0),
            KeyingPreset::SuperKeyerDot => Some(1),
            KeyingPreset::SuperKeyerDash => Some(2),
            KeyingPreset::AccukeyerBoth => Some(3),
            KeyingPreset::AccukeyerDot => Some(4),
            KeyingPreset::AccukeyerDash => Some(5),
            KeyingPreset::CurtisABoth => Some(6),
            KeyingPreset::CurtisADot => Some(7),
            KeyingPreset::CurtisADash => Some(8),
            KeyingPreset::NoMemory => Some(9),
            KeyingPreset::Manual => None,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Short name, e.g. "V3" or "MANUAL"
    pub const fn name(&self) -> &'static str {
        match self {
            KeyingPreset::SuperKeyerBoth => "V0",
            KeyingPreset::SuperKeyerDot => "V1",
            KeyingPreset::SuperKeyerDash => "V2",
            KeyingPreset::AccukeyerBoth => "V3",
            KeyingPreset::AccukeyerDot => "V4",
            KeyingPreset::AccukeyerDash => "V5",
            KeyingPreset::CurtisABoth => "V6",
            KeyingPreset::CurtisADot => "V7",
            KeyingPreset::CurtisADash => "V8",
            KeyingPreset::NoMemory => "V9",
            KeyingPreset::Manual => "MANUAL",
        }
    }

    /// Human readable family description
    pub const fn description(&self) -> &'static str {
        match self {
            KeyingPreset::SuperKeyerBoth => "SuperKeyer Both",
            KeyingPreset::SuperKeyerDot => "SuperKeyer Dit",
            KeyingPreset::SuperKeyerDash => "SuperKeyer Dah",
            KeyingPreset::AccukeyerBoth => "Accukeyer Both",
            KeyingPreset::AccukeyerDot => "Accukeyer Dit",
            KeyingPreset::AccukeyerDash => "Accukeyer Dah",
            KeyingPreset::CurtisABoth => "Curtis A Both",
            KeyingPreset::CurtisADot => "Curtis A Dit",
            KeyingPreset::CurtisADash => "Curtis A Dah",
            KeyingPreset::NoMemory => "No Memory",
            KeyingPreset::Manual => "Manual",
        }
    }
}

impl core::fmt::Display for KeyingPreset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Preset name was not one of "V0".."V9" or "manual"
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PresetParseError;

#[cfg(feature = "std")]
impl core::fmt::Display for PresetParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown preset name (expected V0-V9 or MANUAL)")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PresetParseError {}

impl FromStr for KeyingPreset {
    type Err = PresetParseError;

    /// Case-insensitive: "v3" and "V3" both parse, as do "manual" and "MANUAL"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("manual") {
            return Ok(KeyingPreset::Manual);
        }
        KeyingPreset::ALL
            .iter()
            .copied()
            .find(|preset| s.eq_ignore_ascii_case(preset.name()))
            .ok_or(PresetParseError)
    }
}

/// Parse a preset name, failing on anything unrecognized
pub fn parse_preset_name(name: &str) -> Result<KeyingPreset, PresetParseError> {
    name.parse()
}

/// Memory window, memory enables, trigger style and L-S-P of one preset
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PresetConfigData {
    pub memory_open_percent: f32,
    pub memory_close_percent: f32,
    pub enable_dit_memory: bool,
    pub enable_dah_memory: bool,
    /// State latch (true) or edge trigger (false)
    pub use_state_latch: bool,
    pub timing_l: u8,
    pub timing_s: u8,
    pub timing_p: u8,
}

impl PresetConfigData {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        memory_open_percent: f32,
        memory_close_percent: f32,
        enable_dit_memory: bool,
        enable_dah_memory: bool,
        use_state_latch: bool,
        timing_l: u8,
        timing_s: u8,
        timing_p: u8,
    ) -> Self {
        Self {
            memory_open_percent,
            memory_close_percent,
            enable_dit_memory,
            enable_dah_memory,
            use_state_latch,
            timing_l,
            timing_s,
            timing_p,
        }
    }

    /// A zero-filled entry (never written by the user) does not count as a
    /// customization
    pub fn is_initialized(&self) -> bool {
        let window_unset = self.memory_open_percent == 0.0 && self.memory_close_percent == 0.0;
        let lsp_unset = self.timing_l == 0 && self.timing_s == 0 && self.timing_p == 0;
        !(window_unset || lsp_unset)
    }
}

/// Factory preset table, indexed by [`KeyingPreset::index`]
pub const FACTORY_PRESETS: [PresetConfigData; PRESET_COUNT] = [
    PresetConfigData::new(55.0, 99.0, true, true, true, 28, 48, 52),
    PresetConfigData::new(55.0, 99.0, true, false, true, 28, 48, 52),
    PresetConfigData::new(55.0, 99.0, false, true, true, 28, 48, 52),
    PresetConfigData::new(60.0, 99.0, true, true, true, 30, 50, 50),
    PresetConfigData::new(60.0, 99.0, true, false, true, 30, 50, 50),
    PresetConfigData::new(60.0, 99.0, false, true, true, 30, 50, 50),
    PresetConfigData::new(60.0, 99.0, true, true, false, 32, 52, 48),
    PresetConfigData::new(60.0, 99.0, true, false, false, 32, 52, 48),
    PresetConfigData::new(60.0, 99.0, false, true, false, 32, 52, 48),
    PresetConfigData::new(60.0, 99.0, false, false, false, 30, 50, 50),
];

/// Index used when a caller hands Manual to [`resolve`]
const FALLBACK_INDEX: usize = 3;

/// Resolve a preset to its effective definition.
///
/// A user customization at the preset's index wins when it is initialized,
/// otherwise the factory entry is returned. Manual has no table entry and
/// callers are expected to read the working configuration instead; if it is
/// passed anyway the Accukeyer (V3) factory entry comes back.
pub fn resolve(
    preset: KeyingPreset,
    user_overrides: Option<&[PresetConfigData; PRESET_COUNT]>,
) -> PresetConfigData {
    let Some(index) = preset.index() else {
        warn!("resolve: Manual preset has no definition, using V3");
        return FACTORY_PRESETS[FALLBACK_INDEX];
    };

    if let Some(user) = user_overrides.map(|table| table[index]) {
        if user.is_initialized() {
            return user;
        }
    }
    FACTORY_PRESETS[index]
}

/// Factory table copy for seeding the user customization table
pub const fn factory_preset_definitions() -> [PresetConfigData; PRESET_COUNT] {
    FACTORY_PRESETS
}
