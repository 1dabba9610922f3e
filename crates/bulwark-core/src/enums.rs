//! Enumeration types used throughout the wave core.

use serde::{Deserialize, Serialize};

/// Top-level phase of the wave sequence. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No sequence running, no timers.
    #[default]
    Idle,
    /// Between-wave shopping window.
    Shop,
    /// Short preparation window before enemies arrive.
    Preparation,
    /// Enemies are being dispatched and fought.
    Combat,
    /// Wave finished; post-combat delay or permanent halt.
    Completed,
}

impl Phase {
    /// Phases whose timer can be skipped or manually advanced.
    pub fn is_countdown(self) -> bool {
        matches!(self, Phase::Shop | Phase::Preparation)
    }
}

/// Spatial distribution used to place burst spawns along the far edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnPattern {
    /// Single column with a fixed inset from the edge.
    Column,
    /// Column that recedes inward with each spawn.
    Diagonal,
    /// Golden-ratio sequence with square-root depth falloff.
    #[default]
    GoldenSpiral,
    /// Halton (2, 3) low-discrepancy sequence.
    Halton,
    /// Evenly spaced rows with sinusoidal depth.
    SineWave,
    /// Stratified rows with hashed jitter.
    PoissonJitter,
}

impl SpawnPattern {
    /// Every pattern, in declaration order.
    pub const ALL: [SpawnPattern; 6] = [
        SpawnPattern::Column,
        SpawnPattern::Diagonal,
        SpawnPattern::GoldenSpiral,
        SpawnPattern::Halton,
        SpawnPattern::SineWave,
        SpawnPattern::PoissonJitter,
    ];

    /// Legacy patterns skip padding remap and micro jitter.
    pub fn is_legacy(self) -> bool {
        matches!(self, SpawnPattern::Column | SpawnPattern::Diagonal)
    }
}

/// How a single unit enters the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdmissionPath {
    /// Handed to the direct-enqueue buffering collaborator.
    Buffered,
    /// Handed to the rate-limited scheduler collaborator.
    Scheduled,
    /// Spawned synchronously through the world collaborator.
    Immediate,
}
