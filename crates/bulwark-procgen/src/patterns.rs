//! Deterministic spatial distribution of burst spawns along the far edge.
//!
//! Every pattern maps the `j`-th of `n` spawns to a normalized edge height
//! `y_norm` in `[0, 1]` and an inward depth behind the edge. The host's edge
//! mapping then turns `y_norm` into a world point, and the depth is
//! subtracted from its x. Randomness comes only from a seeded bit-mixing
//! hash, so equal `(pattern, j, n, seed)` always produce equal output.

use glam::Vec2;

use bulwark_core::config::PatternConfig;
use bulwark_core::constants::GOLDEN_RATIO_CONJUGATE;
use bulwark_core::enums::SpawnPattern;

const STREAM_JITTER: u32 = 0x68e3_1da4;
const STREAM_DEPTH: u32 = 0xb529_7a4d;
const STREAM_MICRO: u32 = 0x1b56_c4e9;
const STREAM_INSET: u32 = 0x7f4a_7c15;

/// Pattern output before conversion to world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSample {
    /// Normalized height along the edge, `0.0..=1.0`.
    pub y_norm: f32,
    /// Distance behind the edge, in world units.
    pub inward: f32,
}

impl EdgeSample {
    /// World position given the host's edge mapping.
    pub fn to_world(self, edge_at: impl Fn(f32) -> Vec2) -> Vec2 {
        let edge = edge_at(self.y_norm);
        Vec2::new(edge.x - self.inward, edge.y)
    }
}

/// Seeded integer hash onto `[0, 1)`.
pub fn hash01(seed: u32, index: u32) -> f32 {
    let mut h = index.wrapping_mul(0x9e37_79b9) ^ seed;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    (h >> 8) as f32 / (1u32 << 24) as f32
}

/// Radical inverse of `index` in `base`.
pub fn halton(index: u32, base: u32) -> f32 {
    let base = base.max(2);
    let mut i = index;
    let mut fraction = 1.0f64;
    let mut result = 0.0f64;
    while i > 0 {
        fraction /= f64::from(base);
        result += fraction * f64::from(i % base);
        i /= base;
    }
    result as f32
}

/// Sample the `j`-th of `n` spawns for `pattern`.
pub fn sample(pattern: SpawnPattern, j: u32, n: u32, seed: u32, cfg: &PatternConfig) -> EdgeSample {
    let n = n.max(1);
    let nf = n as f32;
    let jf = j as f32;
    let stratified = (jf + 0.5) / nf;

    let raw = match pattern {
        SpawnPattern::Column | SpawnPattern::Diagonal => {
            let inset = hash01(seed.wrapping_add(STREAM_INSET), 0) * cfg.max_inset;
            let jitter = signed(hash01(seed.wrapping_add(STREAM_JITTER), j)) * cfg.column_jitter;
            let inward = match pattern {
                SpawnPattern::Diagonal => inset + jf * cfg.diagonal_spacing,
                _ => inset,
            };
            return EdgeSample {
                y_norm: (stratified + jitter).clamp(0.0, 1.0),
                inward,
            };
        }
        SpawnPattern::GoldenSpiral => EdgeSample {
            y_norm: ((jf + 1.0) * GOLDEN_RATIO_CONJUGATE).fract(),
            inward: ((jf + 1.0) / nf).sqrt() * cfg.horizontal_depth,
        },
        SpawnPattern::Halton => EdgeSample {
            y_norm: halton(j + 1, 2),
            inward: halton(j + 1, 3) * cfg.horizontal_depth,
        },
        SpawnPattern::SineWave => {
            let phase = stratified * std::f32::consts::TAU * cfg.sine_wave_count;
            EdgeSample {
                y_norm: stratified,
                inward: (phase.sin() * 0.5 + 0.5) * cfg.horizontal_depth,
            }
        }
        SpawnPattern::PoissonJitter => {
            let cell = 1.0 / nf;
            let offset = (hash01(seed.wrapping_add(STREAM_JITTER), j) - 0.5) * cell * 1.8;
            EdgeSample {
                y_norm: (stratified + offset).clamp(0.0, 1.0),
                inward: hash01(seed.wrapping_add(STREAM_DEPTH), j) * cfg.horizontal_depth,
            }
        }
    };

    let padding = cfg.vertical_padding;
    let padded = padding + raw.y_norm * (1.0 - 2.0 * padding);
    let micro = signed(hash01(seed.wrapping_add(STREAM_MICRO), j)) * cfg.micro_jitter;
    EdgeSample {
        y_norm: (padded + micro).clamp(0.0, 1.0),
        inward: raw.inward,
    }
}

/// World position of the `j`-th of `n` spawns.
pub fn spawn_position(
    pattern: SpawnPattern,
    j: u32,
    n: u32,
    seed: u32,
    cfg: &PatternConfig,
    edge_at: impl Fn(f32) -> Vec2,
) -> Vec2 {
    sample(pattern, j, n, seed, cfg).to_world(edge_at)
}

fn signed(unit: f32) -> f32 {
    unit * 2.0 - 1.0
}
