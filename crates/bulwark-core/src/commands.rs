//! Commands sent from the host game to the wave coordinator.
//!
//! Commands are queued and processed at the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::types::EnemyId;

/// All host-side requests the coordinator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WaveCommand {
    /// Begin a new run from the first wave.
    StartSequence,
    /// Abort the running sequence and return to Idle.
    StopSequence,
    /// Leave the current Shop or Preparation phase early.
    Advance,
    /// An enemy left play.
    EnemyDefeated { enemy: EnemyId },
    /// Snapshot run kills into last/best statistics.
    CaptureEndOfRun,
}
