//! Run summary printed as JSON at the end of a simulation.

use serde::Serialize;

use bulwark_core::events::WaveEvent;
use bulwark_core::state::WaveSnapshot;
use bulwark_sim::WaveDiagnostics;

#[derive(Debug, Clone, Serialize)]
pub struct WaveReport {
    pub wave_number: u32,
    pub started_at_secs: f64,
    pub completed_at_secs: Option<f64>,
    pub diagnostics: Option<WaveDiagnostics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub halted: bool,
    pub waves: Vec<WaveReport>,
    pub live_enemies: usize,
    pub final_snapshot: WaveSnapshot,
}

impl RunSummary {
    pub fn completed_waves(&self) -> usize {
        self.waves
            .iter()
            .filter(|w| w.completed_at_secs.is_some())
            .count()
    }
}

/// Folds drained coordinator events into per-wave reports.
#[derive(Debug, Default)]
pub struct WaveRecorder {
    waves: Vec<WaveReport>,
}

impl WaveRecorder {
    pub fn observe(&mut self, events: &[WaveEvent], now_secs: f64, diagnostics: WaveDiagnostics) {
        for event in events {
            match *event {
                WaveEvent::WaveStarted { wave_number } => self.waves.push(WaveReport {
                    wave_number,
                    started_at_secs: now_secs,
                    completed_at_secs: None,
                    diagnostics: None,
                }),
                WaveEvent::WaveCompleted { wave_number } => {
                    if let Some(report) = self
                        .waves
                        .iter_mut()
                        .rev()
                        .find(|w| w.wave_number == wave_number && w.completed_at_secs.is_none())
                    {
                        report.completed_at_secs = Some(now_secs);
                        report.diagnostics = Some(diagnostics);
                    }
                }
                WaveEvent::PhaseChanged { .. } | WaveEvent::PhaseTimerUpdated { .. } => {}
            }
        }
    }

    pub fn completed(&self) -> usize {
        self.waves
            .iter()
            .filter(|w| w.completed_at_secs.is_some())
            .count()
    }

    pub fn into_waves(self) -> Vec<WaveReport> {
        self.waves
    }
}
