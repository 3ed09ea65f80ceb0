//! Working keying configuration and the engine configuration built from it

use crate::preset::{resolve, KeyingPreset, PresetConfigData, PRESET_COUNT};
use crate::types::{EngineConfig, IambicMode, MemoryMode, SqueezeMode};

/// Keying section of the device configuration.
///
/// Owned and persisted by the configuration store; this crate only reads it
/// and derives an [`EngineConfig`] from it.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyingConfig {
    pub preset: KeyingPreset,
    pub speed_wpm: u32,
    pub iambic_mode: IambicMode,
    /// Used as-is for Manual, overwritten by [`apply_preset_defaults`] otherwise
    pub memory_open_percent: f32,
    pub memory_close_percent: f32,
    pub manual_memory_enable_dit: bool,
    pub manual_memory_enable_dah: bool,
    pub manual_use_state_latch: bool,
    /// Swap dit and dah contacts (left-handed operators)
    pub swap_paddles: bool,
    pub timing_l: u8,
    pub timing_s: u8,
    pub timing_p: u8,
    /// User customizations of V0-V9, zero-filled entries are ignored
    pub preset_definitions: [PresetConfigData; PRESET_COUNT],
}

impl Default for KeyingConfig {
    fn default() -> Self {
        Self {
            preset: KeyingPreset::AccukeyerBoth,
            speed_wpm: 20,
            iambic_mode: IambicMode::B,
            memory_open_percent: 60.0,
            memory_close_percent: 99.0,
            manual_memory_enable_dit: true,
            manual_memory_enable_dah: true,
            manual_use_state_latch: true,
            swap_paddles: false,
            timing_l: 30,
            timing_s: 50,
            timing_p: 50,
            preset_definitions: [PresetConfigData::default(); PRESET_COUNT],
        }
    }
}

/// Resolved definition of the selected preset, `None` in Manual mode
pub fn active_preset_config(keying: &KeyingConfig) -> Option<PresetConfigData> {
    match keying.preset {
        KeyingPreset::Manual => None,
        preset => Some(resolve(preset, Some(&keying.preset_definitions))),
    }
}

/// Copy the selected preset's window, memory enables and trigger style into
/// the working configuration. L-S-P is left alone, see [`apply_preset_timing`].
pub fn apply_preset_defaults(keying: &mut KeyingConfig) {
    let Some(preset) = active_preset_config(keying) else {
        return;
    };
    keying.memory_open_percent = preset.memory_open_percent;
    keying.memory_close_percent = preset.memory_close_percent;
    keying.manual_memory_enable_dit = preset.enable_dit_memory;
    keying.manual_memory_enable_dah = preset.enable_dah_memory;
    keying.manual_use_state_latch = preset.use_state_latch;
}

/// Copy the selected preset's L-S-P into the working configuration
pub fn apply_preset_timing(keying: &mut KeyingConfig) {
    let Some(preset) = active_preset_config(keying) else {
        return;
    };
    keying.timing_l = preset.timing_l;
    keying.timing_s = preset.timing_s;
    keying.timing_p = preset.timing_p;
}

fn clamp_pct(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Build the engine configuration for the current keying settings.
///
/// Speed, mode and L-S-P always come from the working configuration. The
/// memory window, memory mode and squeeze mode come from the manual fields in
/// Manual mode and from the resolved preset otherwise. The result is not
/// validated; [`crate::PaddleEngine::initialize`] does that.
pub fn build_engine_config(keying: &KeyingConfig) -> EngineConfig {
    let mut config = EngineConfig {
        speed_wpm: keying.speed_wpm,
        timing_l: keying.timing_l,
        timing_s: keying.timing_s,
        timing_p: keying.timing_p,
        mem_block_start_pct: clamp_pct(keying.memory_open_percent),
        mem_block_end_pct: clamp_pct(keying.memory_close_percent),
        iambic_mode: keying.iambic_mode,
        memory_mode: MemoryMode::from_flags(
            keying.manual_memory_enable_dit,
            keying.manual_memory_enable_dah,
        ),
        squeeze_mode: SqueezeMode::from_state_latch(keying.manual_use_state_latch),
    };

    if let Some(preset) = active_preset_config(keying) {
        config.mem_block_start_pct = clamp_pct(preset.memory_open_percent);
        config.mem_block_end_pct = clamp_pct(preset.memory_close_percent);
        config.memory_mode = MemoryMode::from_flags(preset.enable_dit_memory, preset.enable_dah_memory);
        config.squeeze_mode = SqueezeMode::from_state_latch(preset.use_state_latch);
    }

    if config.lsp_deviates_from_standard() {
        warn!(
            "L-S-P deviates from 30-50-50: L={} S={} P={} (effective WPM {})",
            config.timing_l,
            config.timing_s,
            config.timing_p,
            config.effective_wpm()
        );
    }

    config
}
