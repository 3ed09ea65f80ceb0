//! L-S-P element timing
//!
//! Timing chain: WPM -> theoretical dit (PARIS, 1.2 s / WPM) -> P weighting ->
//! effective dit, from which dah (L) and the intra-element gap (S) derive.
//! L=30, S=50, P=50 reproduces standard 1:3:1 timing.

use crate::types::EngineConfig;

/// Microseconds in one PARIS dit at 1 WPM
pub const PARIS_DIT_US_PER_WPM: i64 = 1_200_000;

const MICROS_PER_SECOND: f32 = 1_000_000.0;

impl EngineConfig {
    /// Theoretical dit length at `speed_wpm`, truncated
    pub fn dit_theoretical_us(&self) -> i64 {
        PARIS_DIT_US_PER_WPM / self.speed_wpm.max(1) as i64
    }

    /// Effective dit length after P weighting (P=50 is unity)
    pub fn dit_duration_us(&self) -> i64 {
        let p_multiplier = self.timing_p as f32 / 50.0;
        (self.dit_theoretical_us() as f32 * p_multiplier) as i64
    }

    /// Dah length, L=30 gives a 3:1 dash
    pub fn dah_duration_us(&self) -> i64 {
        let l_multiplier = self.timing_l as f32 / 10.0;
        (self.dit_duration_us() as f32 * l_multiplier) as i64
    }

    /// Intra-element gap, S=50 gives one dit
    pub fn gap_duration_us(&self) -> i64 {
        let s_multiplier = self.timing_s as f32 / 50.0;
        (self.dit_duration_us() as f32 * s_multiplier) as i64
    }

    /// Dash to dit ratio (L / 10)
    pub fn dash_ratio(&self) -> f32 {
        self.timing_l as f32 / 10.0
    }

    /// Length of the word PARIS in microseconds with the current L-S-P values.
    ///
    /// 10 dits, 4 dahs, 9 intra-element gaps, 4 inter-character gaps of 3 dits
    /// and one 7-dit word gap. Character and word gaps are not affected by S.
    pub fn paris_word_us(&self) -> i64 {
        let dit = self.dit_duration_us();
        let dah = self.dah_duration_us();
        let gap = self.gap_duration_us();
        10 * dit + 4 * dah + 9 * gap + 4 * 3 * dit + 7 * dit
    }

    /// Words per minute actually produced, for display only.
    ///
    /// Never fed back into the engine.
    pub fn effective_wpm(&self) -> f32 {
        let paris_sec = self.paris_word_us() as f32 / MICROS_PER_SECOND;
        if paris_sec <= 0.0 {
            return 0.0;
        }
        60.0 / paris_sec
    }

    /// Returns true when L-S-P is far enough from 30-50-50 that the effective
    /// speed visibly differs from the nominal one
    pub fn lsp_deviates_from_standard(&self) -> bool {
        let l_deviated = self.timing_l < 20 || self.timing_l > 40;
        let s_deviated = self.timing_s < 30 || self.timing_s > 70;
        let p_deviated = self.timing_p < 30 || self.timing_p > 70;
        l_deviated || s_deviated || p_deviated
    }
}
