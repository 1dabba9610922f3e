//! Per-wave enemy count and HP scaling.

use bulwark_core::config::BalanceConfig;
use bulwark_core::constants::{GENERATED_INTERVAL_DEFAULT, GENERATED_INTERVAL_TIERS};

/// Enemies in wave `wave`: `N1` for the first wave, `ceil(N1 * M^(w-1))` after.
///
/// Waves below 1 are treated as wave 1. Saturates at `u32::MAX`.
pub fn enemy_count_for_wave(cfg: &BalanceConfig, wave: u32) -> u32 {
    let wave = wave.max(1);
    if wave == 1 {
        return cfg.first_wave_count;
    }
    let base = f64::from(cfg.first_wave_count);
    let raw = base * cfg.growth_per_wave.powf(f64::from(wave - 1));
    // Exact products must not be pushed over an integer by rounding noise.
    let count = (raw - 1e-9).ceil().max(base);
    count as u32
}

/// HP multiplier for wave `wave`: `H^floor((w-1)/K)`.
pub fn hp_multiplier_for_wave(cfg: &BalanceConfig, wave: u32) -> f32 {
    let wave = wave.max(1);
    let tiers = (wave - 1) / cfg.hp_step_waves.max(1);
    cfg.hp_step_multiplier
        .powi(i32::try_from(tiers).unwrap_or(i32::MAX))
}

/// Spawn interval for a generated entry of `count` units.
pub fn spawn_interval_for_count(count: u32) -> f32 {
    GENERATED_INTERVAL_TIERS
        .iter()
        .find(|(min_count, _)| count >= *min_count)
        .map(|(_, interval)| *interval)
        .unwrap_or(GENERATED_INTERVAL_DEFAULT)
}
