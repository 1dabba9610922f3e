//! Sequence configuration, loadable from JSON.
//!
//! Every section falls back to the tuning constants, so a partial (or empty)
//! JSON object is a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::SpawnPattern;
use crate::error::ConfigError;
use crate::types::ArchetypeId;
use crate::wave::WaveDefinition;

/// Parameters of the per-wave count and HP formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Enemies in wave 1 (`N1`).
    pub first_wave_count: u32,
    /// Geometric growth per wave (`M`).
    pub growth_per_wave: f64,
    /// Waves per HP tier (`K`).
    pub hp_step_waves: u32,
    /// HP multiplier per tier (`H`).
    pub hp_step_multiplier: f32,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            first_wave_count: FIRST_WAVE_ENEMY_COUNT,
            growth_per_wave: ENEMY_GROWTH_PER_WAVE,
            hp_step_waves: HP_STEP_WAVES,
            hp_step_multiplier: HP_STEP_MULTIPLIER,
        }
    }
}

/// Spatial distribution settings for burst spawns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Pattern used for every wave unless randomized.
    pub pattern: SpawnPattern,
    /// Pick a fresh pattern (and hash seed) for every wave.
    pub randomize_per_wave: bool,
    pub seed: u32,
    pub max_inset: f32,
    pub column_jitter: f32,
    pub diagonal_spacing: f32,
    pub horizontal_depth: f32,
    pub vertical_padding: f32,
    pub micro_jitter: f32,
    pub sine_wave_count: f32,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            pattern: SpawnPattern::default(),
            randomize_per_wave: false,
            seed: PATTERN_SEED,
            max_inset: MAX_COLUMN_INSET,
            column_jitter: COLUMN_Y_JITTER,
            diagonal_spacing: DIAGONAL_SPACING,
            horizontal_depth: HORIZONTAL_SPAWN_DEPTH,
            vertical_padding: VERTICAL_PADDING,
            micro_jitter: MICRO_JITTER,
            sine_wave_count: SINE_WAVE_COUNT,
        }
    }
}

/// Admission thresholds and per-tick throttling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    pub buffering_enabled: bool,
    /// Entry size that selects buffering.
    pub buffer_threshold: u32,
    /// Remaining-wave size that selects buffering.
    pub buffer_wave_remaining_threshold: u32,
    pub scheduler_enabled: bool,
    /// Entry size at which immediate spawns are capped per tick.
    pub progressive_spawn_threshold: u32,
    /// Per-tick cap while throttled. Zero disables throttling.
    pub max_spawns_per_frame: u32,
    /// Only throttle entries whose interval is zero.
    pub throttle_only_zero_interval: bool,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            buffering_enabled: true,
            buffer_threshold: BUFFER_THRESHOLD,
            buffer_wave_remaining_threshold: BUFFER_WAVE_REMAINING_THRESHOLD,
            scheduler_enabled: true,
            progressive_spawn_threshold: PROGRESSIVE_SPAWN_THRESHOLD,
            max_spawns_per_frame: MAX_ENEMY_SPAWNS_PER_FRAME,
            throttle_only_zero_interval: true,
        }
    }
}

/// Flow of the sequence across waves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Restart from the first wave (or loop virtually) instead of halting.
    pub loop_sequence: bool,
    /// Generate further waves when the list is exhausted.
    pub auto_extend: bool,
    pub max_generated_waves: u32,
    /// Waves generated when no authored waves exist.
    pub initial_generated_waves: u32,
    /// Global floor for the post-combat delay.
    pub inter_wave_delay_secs: f32,
    pub min_first_wave_count: u32,
    /// Rewrite waves 2.. to match the count formula on session start.
    pub adjust_counts_to_formula: bool,
    /// Archetype used by procedural generation.
    pub default_archetype: Option<ArchetypeId>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            loop_sequence: false,
            auto_extend: false,
            max_generated_waves: MAX_GENERATED_WAVES,
            initial_generated_waves: INITIAL_GENERATED_WAVES,
            inter_wave_delay_secs: DEFAULT_INTER_WAVE_DELAY_SECS,
            min_first_wave_count: MIN_FIRST_WAVE_COUNT,
            adjust_counts_to_formula: true,
            default_archetype: None,
        }
    }
}

/// Complete configuration for one wave coordinator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Seed of the per-wave pattern randomizer.
    pub seed: u64,
    pub balance: BalanceConfig,
    pub patterns: PatternConfig,
    pub admission: AdmissionConfig,
    pub flow: FlowConfig,
    /// Authored wave template. Empty means fully procedural.
    pub waves: Vec<WaveDefinition>,
}

impl SequenceConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SequenceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reject values the formulas and patterns cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let balance = &self.balance;
        if !(balance.growth_per_wave.is_finite() && balance.growth_per_wave >= 1.0) {
            return Err(invalid(
                "balance.growth_per_wave",
                format!("must be a finite value >= 1, got {}", balance.growth_per_wave),
            ));
        }
        if balance.hp_step_waves == 0 {
            return Err(invalid("balance.hp_step_waves", "must be at least 1".into()));
        }
        if !(balance.hp_step_multiplier.is_finite() && balance.hp_step_multiplier > 0.0) {
            return Err(invalid(
                "balance.hp_step_multiplier",
                format!("must be positive, got {}", balance.hp_step_multiplier),
            ));
        }

        let patterns = &self.patterns;
        if !(0.0..0.5).contains(&patterns.vertical_padding) {
            return Err(invalid(
                "patterns.vertical_padding",
                format!("must be in [0, 0.5), got {}", patterns.vertical_padding),
            ));
        }
        for (field, value) in [
            ("patterns.max_inset", patterns.max_inset),
            ("patterns.column_jitter", patterns.column_jitter),
            ("patterns.diagonal_spacing", patterns.diagonal_spacing),
            ("patterns.horizontal_depth", patterns.horizontal_depth),
            ("patterns.micro_jitter", patterns.micro_jitter),
            ("patterns.sine_wave_count", patterns.sine_wave_count),
            ("flow.inter_wave_delay_secs", self.flow.inter_wave_delay_secs),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(field, format!("must be finite and >= 0, got {value}")));
            }
        }

        for (index, wave) in self.waves.iter().enumerate() {
            for value in [
                wave.shop_secs,
                wave.preparation_secs,
                wave.post_combat_delay_secs,
            ] {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(invalid(
                        "waves",
                        format!("wave {} has an invalid phase duration {value}", index + 1),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
