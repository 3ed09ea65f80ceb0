#![cfg_attr(not(feature = "std"), no_std)]

//! # Keyer Core
//!
//! Iambic paddle keying engine for embedded systems.
//! Turns paddle edges into timed key-down/key-up output with squeeze memory,
//! Mode A/B and L-S-P weighting, and resolves named keyer presets (V0-V9)
//! into engine configurations.

// Must come first so the logging macros are visible in every module
#[macro_use]
mod fmt;

pub mod types;
pub mod timing;
pub mod preset;
pub mod config;
pub mod sink;
pub mod engine;
pub mod hal;
pub mod channel;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use types::*;
pub use preset::{
    factory_preset_definitions, parse_preset_name, resolve, KeyingPreset, PresetConfigData,
    PresetParseError, FACTORY_PRESETS, PRESET_COUNT,
};
pub use config::{
    active_preset_config, apply_preset_defaults, apply_preset_timing, build_engine_config,
    KeyingConfig,
};
pub use sink::KeyingSink;
pub use engine::{EngineSnapshot, PaddleEngine, QUEUE_CAPACITY};
pub use hal::{EmbeddedHalKeyOutput, HalError, PaddleEvent, PaddleLine, PaddleSampler};
pub use channel::{EventConsumer, EventProducer, KeyerDriver, PaddleEventChannel};

#[cfg(feature = "embassy-time")]
pub use channel::keyer_task;

/// Keyer library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine configuration for the default keying settings (V3, 20 WPM, Mode B)
pub fn default_config() -> EngineConfig {
    build_engine_config(&KeyingConfig::default())
}
