//! Run statistics and the read-only snapshot handed to HUD consumers.

use serde::{Deserialize, Serialize};

use crate::enums::{Phase, SpawnPattern};
use crate::types::SimTime;

/// Kill counters for the current and previous runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Kills since the last `StartSequence`.
    pub kills_this_run: u32,
    /// Kills captured at the end of the previous run.
    pub last_run_kills: u32,
    /// Highest `last_run_kills` ever captured. Never decreases.
    pub best_run_kills: u32,
}

impl RunStatistics {
    /// Clear the running counter for a new run.
    pub fn begin_run(&mut self) {
        self.kills_this_run = 0;
    }

    /// Record one kill.
    pub fn record_kill(&mut self) {
        self.kills_this_run = self.kills_this_run.saturating_add(1);
    }

    /// Move the running counter into last/best. Returns true when a new best
    /// was set.
    pub fn capture_end_of_run(&mut self) -> bool {
        self.last_run_kills = self.kills_this_run;
        if self.last_run_kills > self.best_run_kills {
            self.best_run_kills = self.last_run_kills;
            true
        } else {
            false
        }
    }
}

/// Complete coordinator state visible to the host after each tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveSnapshot {
    pub time: SimTime,
    pub phase: Phase,
    /// Player-facing wave number (1-based, 0 when idle).
    pub wave_number: u32,
    /// Index into the wave list.
    pub wave_index: usize,
    /// Loop counter used when the list holds a single definition.
    pub virtual_wave: u32,
    pub wave_count: usize,
    /// Countdown of Shop/Preparation. `None` for manual or other phases.
    pub phase_remaining_secs: Option<f32>,
    pub active_enemies: usize,
    /// Units still queued in buffering/scheduling collaborators.
    pub pending_deferred: usize,
    pub pattern: Option<SpawnPattern>,
    pub stats: RunStatistics,
}
