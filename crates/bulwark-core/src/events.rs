//! Lifecycle notifications emitted by the wave coordinator.

use serde::{Deserialize, Serialize};

use crate::enums::Phase;

/// Notification delivered synchronously to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WaveEvent {
    /// Combat began for the given player-facing wave number.
    WaveStarted { wave_number: u32 },
    /// Combat resolved for the given player-facing wave number.
    WaveCompleted { wave_number: u32 },
    /// The active phase changed. Never emitted twice in a row for one phase.
    PhaseChanged { phase: Phase },
    /// Countdown update. `None` means the phase waits for a manual advance.
    PhaseTimerUpdated {
        phase: Phase,
        remaining_secs: Option<f32>,
    },
}
