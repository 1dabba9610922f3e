//! Tuning constants and configuration defaults.

// --- Balance ---

/// Enemies in the very first wave.
pub const FIRST_WAVE_ENEMY_COUNT: u32 = 30;

/// Geometric growth of the enemy count per wave.
pub const ENEMY_GROWTH_PER_WAVE: f64 = 1.5;

/// Number of waves sharing one HP tier.
pub const HP_STEP_WAVES: u32 = 10;

/// HP multiplier applied per completed tier.
pub const HP_STEP_MULTIPLIER: f32 = 1.2;

/// Spawn interval tiers for generated entries: (minimum count, seconds).
/// Larger waves get shorter intervals so the spawn phase stays bounded.
pub const GENERATED_INTERVAL_TIERS: [(u32, f32); 3] = [(500, 0.02), (200, 0.05), (80, 0.1)];

/// Interval for generated entries below every tier.
pub const GENERATED_INTERVAL_DEFAULT: f32 = 0.3;

// --- Phase timing ---

/// Default shop window (seconds).
pub const DEFAULT_SHOP_SECS: f32 = 20.0;

/// Default preparation window (seconds).
pub const DEFAULT_PREPARATION_SECS: f32 = 5.0;

/// Default delay after combat before the next wave (seconds).
pub const DEFAULT_POST_COMBAT_DELAY_SECS: f32 = 2.0;

/// Global floor for the inter-wave delay (seconds).
pub const DEFAULT_INTER_WAVE_DELAY_SECS: f32 = 3.0;

/// Minimum size of the first wave after normalization.
pub const MIN_FIRST_WAVE_COUNT: u32 = FIRST_WAVE_ENEMY_COUNT;

/// Waves generated when the authored template is empty.
pub const INITIAL_GENERATED_WAVES: u32 = 10;

/// Upper bound on the wave list when auto-extension is enabled.
pub const MAX_GENERATED_WAVES: u32 = 200;

// --- Spatial patterns ---

/// 1/φ, the golden ratio conjugate.
pub const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_034;

/// Largest inward inset of legacy column spawns (world units).
pub const MAX_COLUMN_INSET: f32 = 1.5;

/// Normalized ±jitter applied to legacy column rows.
pub const COLUMN_Y_JITTER: f32 = 0.01;

/// Inward step between consecutive diagonal spawns (world units).
pub const DIAGONAL_SPACING: f32 = 0.35;

/// Depth of the spawn band behind the far edge (world units).
pub const HORIZONTAL_SPAWN_DEPTH: f32 = 6.0;

/// Normalized padding kept free at the top and bottom of the edge.
pub const VERTICAL_PADDING: f32 = 0.05;

/// Normalized ±jitter applied after padding remap.
pub const MICRO_JITTER: f32 = 0.004;

/// Full sine periods across the edge for the SineWave pattern.
pub const SINE_WAVE_COUNT: f32 = 2.0;

/// Default seed of the placement hash.
pub const PATTERN_SEED: u32 = 0x5eed_1234;

// --- Admission ---

/// Entry size at which buffering kicks in.
pub const BUFFER_THRESHOLD: u32 = 120;

/// Remaining-wave size at which buffering kicks in.
pub const BUFFER_WAVE_REMAINING_THRESHOLD: u32 = 300;

/// Entry size at which immediate spawns are throttled per tick.
pub const PROGRESSIVE_SPAWN_THRESHOLD: u32 = 60;

/// Immediate spawns allowed per tick while throttled.
pub const MAX_ENEMY_SPAWNS_PER_FRAME: u32 = 20;

// --- Statistics ---

/// Persistent key of the best-run kill counter.
pub const BEST_RUN_KILLS_KEY: &str = "best_run_kills";
