//! Runtime wave list.
//!
//! The authored template is never mutated. A session works on a runtime
//! copy that gets pruned, padded with procedural waves, normalized and
//! count-adjusted on first use. The per-wave totals are then captured as a
//! baseline, so later sessions start from the same counts even after
//! virtual looping rewrote them.

use tracing::{debug, warn};

use bulwark_core::config::{BalanceConfig, FlowConfig};
use bulwark_core::types::ArchetypeId;
use bulwark_core::wave::{SpawnEntry, WaveDefinition};
use bulwark_procgen::balance::{enemy_count_for_wave, spawn_interval_for_count};

/// Per-wave totals captured after the first session was prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineSnapshot {
    totals: Vec<u32>,
}

impl BaselineSnapshot {
    pub fn totals(&self) -> &[u32] {
        &self.totals
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Authored template plus the mutable runtime list derived from it.
#[derive(Debug, Clone)]
pub struct WaveStore {
    template: Vec<WaveDefinition>,
    runtime: Vec<WaveDefinition>,
    instantiated: bool,
    baseline: Option<BaselineSnapshot>,
    balance: BalanceConfig,
    flow: FlowConfig,
}

impl WaveStore {
    pub fn new(template: Vec<WaveDefinition>, balance: BalanceConfig, flow: FlowConfig) -> Self {
        Self {
            template,
            runtime: Vec::new(),
            instantiated: false,
            baseline: None,
            balance,
            flow,
        }
    }

    pub fn template(&self) -> &[WaveDefinition] {
        &self.template
    }

    pub fn waves(&self) -> &[WaveDefinition] {
        &self.runtime
    }

    pub fn wave(&self, index: usize) -> Option<&WaveDefinition> {
        self.runtime.get(index)
    }

    /// Mutable access for hosts that edit waves between sessions.
    pub fn wave_mut(&mut self, index: usize) -> Option<&mut WaveDefinition> {
        self.runtime.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.runtime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runtime.is_empty()
    }

    pub fn is_instantiated(&self) -> bool {
        self.instantiated
    }

    pub fn baseline(&self) -> Option<&BaselineSnapshot> {
        self.baseline.as_ref()
    }

    /// Current total of every runtime wave.
    pub fn totals(&self) -> Vec<u32> {
        self.runtime.iter().map(WaveDefinition::total_enemies).collect()
    }

    /// Replace the runtime list with a fresh copy of the template.
    pub fn instantiate(&mut self) {
        self.runtime = self.template.clone();
        self.instantiated = true;
    }

    /// Drop the runtime list and baseline. The next session re-instantiates.
    pub fn reset_runtime(&mut self) {
        self.runtime.clear();
        self.instantiated = false;
        self.baseline = None;
    }

    /// Bring the runtime list into a playable state for a new session.
    pub fn prepare_session(&mut self) {
        if !self.instantiated {
            self.instantiate();
            self.prune_invalid();
            if self.runtime.is_empty() {
                let target = self.flow.initial_generated_waves.max(1) as usize;
                self.extend_generated(target);
            }
            self.normalize_first_wave();
            if self.flow.adjust_counts_to_formula {
                self.adjust_wave_enemy_counts();
            }
            self.ensure_non_empty_waves();
            self.capture_baseline();
        } else {
            self.prune_invalid();
            self.restore_baseline();
            self.normalize_first_wave();
        }
    }

    /// Remove broken entries. Returns how many were dropped.
    pub fn prune_invalid(&mut self) -> usize {
        let mut dropped = 0;
        for (index, wave) in self.runtime.iter_mut().enumerate() {
            let before = wave.entries.len();
            wave.entries.retain(SpawnEntry::is_valid);
            let removed = before - wave.entries.len();
            if removed > 0 {
                warn!(wave = index + 1, removed, "dropped invalid spawn entries");
            }
            dropped += removed;
        }
        dropped
    }

    /// Archetype for generated or synthesized entries.
    pub fn fallback_archetype(&self) -> Option<ArchetypeId> {
        self.flow
            .default_archetype
            .or_else(|| self.runtime.iter().find_map(WaveDefinition::first_archetype))
            .or_else(|| self.template.iter().find_map(WaveDefinition::first_archetype))
    }

    /// A procedural wave sized by the count formula.
    pub fn generate_wave(&self, wave_number: u32) -> Option<WaveDefinition> {
        let archetype = self.fallback_archetype()?;
        let count = self.formula_count(wave_number);
        Some(WaveDefinition::with_entries(vec![SpawnEntry::along_edge(
            archetype,
            count,
            spawn_interval_for_count(count),
        )]))
    }

    /// Append generated waves until the list holds `target_len`. Returns how
    /// many were added.
    pub fn extend_generated(&mut self, target_len: usize) -> usize {
        let mut added = 0;
        while self.runtime.len() < target_len {
            let wave_number = wave_number_at(self.runtime.len());
            let Some(wave) = self.generate_wave(wave_number) else {
                warn!(wave_number, "cannot generate wave: no archetype available");
                break;
            };
            debug!(wave_number, total = wave.total_enemies(), "generated wave");
            self.runtime.push(wave);
            added += 1;
        }
        added
    }

    /// Raise wave 1 to the configured minimum. Returns true when it changed.
    pub fn normalize_first_wave(&mut self) -> bool {
        let minimum = self.flow.min_first_wave_count;
        let fallback = self.fallback_archetype();
        let Some(first) = self.runtime.first_mut() else {
            return false;
        };
        if first.total_enemies() >= minimum {
            return false;
        }

        let base = match (first.entries.first().copied(), fallback) {
            (Some(entry), _) => entry,
            (None, Some(archetype)) => SpawnEntry::along_edge(archetype, 0, 0.0),
            (None, None) => {
                warn!("wave 1 below minimum and no archetype to fill it with");
                return false;
            }
        };
        let interval = if base.along_edge {
            spawn_interval_for_count(minimum)
        } else {
            base.interval_secs
        };
        debug!(from = first.total_enemies(), to = minimum, "normalized wave 1");
        first.entries = vec![SpawnEntry {
            count: minimum,
            interval_secs: interval,
            ..base
        }];
        true
    }

    /// Rewrite waves 2.. to match the count formula. Returns how many changed.
    pub fn adjust_wave_enemy_counts(&mut self) -> usize {
        let mut changed = 0;
        for index in 1..self.runtime.len() {
            let target = self.formula_count(wave_number_at(index));
            if self.runtime[index].total_enemies() != target && self.set_wave_total(index, target) {
                changed += 1;
            }
        }
        changed
    }

    /// Give every zero-total wave the formula count. Returns how many were
    /// filled.
    pub fn ensure_non_empty_waves(&mut self) -> usize {
        let mut filled = 0;
        for index in 0..self.runtime.len() {
            if !self.runtime[index].is_empty() {
                continue;
            }
            let wave_number = wave_number_at(index);
            let mut target = self.formula_count(wave_number);
            if index == 0 {
                target = target.max(self.flow.min_first_wave_count);
            }
            if target == 0 {
                warn!(wave_number, "empty wave left as is: formula count is zero");
                continue;
            }
            if self.set_wave_total(index, target) {
                filled += 1;
            } else {
                warn!(wave_number, "empty wave left as is: no archetype available");
            }
        }
        filled
    }

    /// Make wave `index` spawn exactly `total` units.
    ///
    /// The first entry absorbs the difference; trailing entries are trimmed
    /// from the back when they alone exceed the target. A wave without
    /// entries gets one synthesized from the fallback archetype.
    pub fn set_wave_total(&mut self, index: usize, total: u32) -> bool {
        let fallback = self.fallback_archetype();
        let Some(wave) = self.runtime.get_mut(index) else {
            return false;
        };
        if wave.entries.is_empty() {
            let Some(archetype) = fallback else {
                return false;
            };
            wave.entries.push(SpawnEntry::along_edge(
                archetype,
                total,
                spawn_interval_for_count(total),
            ));
            return true;
        }

        let rest = wave.entries[1..]
            .iter()
            .fold(0u32, |acc, entry| acc.saturating_add(entry.count));
        let mut excess = rest.saturating_sub(total);
        for entry in wave.entries[1..].iter_mut().rev() {
            if excess == 0 {
                break;
            }
            let cut = entry.count.min(excess);
            entry.count -= cut;
            excess -= cut;
        }
        wave.entries[0].count = total - rest.min(total);
        true
    }

    /// Record the current per-wave totals.
    pub fn capture_baseline(&mut self) {
        self.baseline = Some(BaselineSnapshot {
            totals: self.totals(),
        });
    }

    /// Put every wave back to its baseline total.
    ///
    /// A baseline whose length no longer matches the list is discarded and
    /// nothing is restored.
    pub fn restore_baseline(&mut self) -> bool {
        let Some(baseline) = self.baseline.take() else {
            return false;
        };
        if baseline.len() != self.runtime.len() {
            warn!(
                baseline = baseline.len(),
                waves = self.runtime.len(),
                "baseline length mismatch; discarding"
            );
            return false;
        }
        for (index, &total) in baseline.totals.iter().enumerate() {
            if self.runtime[index].total_enemies() != total {
                self.set_wave_total(index, total);
            }
        }
        self.baseline = Some(baseline);
        true
    }

    fn formula_count(&self, wave_number: u32) -> u32 {
        enemy_count_for_wave(&self.balance, wave_number)
    }
}

fn wave_number_at(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRUNT: ArchetypeId = ArchetypeId(1);
    const BRUTE: ArchetypeId = ArchetypeId(2);

    fn balance() -> BalanceConfig {
        BalanceConfig {
            first_wave_count: 10,
            growth_per_wave: 2.0,
            ..Default::default()
        }
    }

    fn flow() -> FlowConfig {
        FlowConfig {
            min_first_wave_count: 10,
            initial_generated_waves: 3,
            ..Default::default()
        }
    }

    fn store(template: Vec<WaveDefinition>) -> WaveStore {
        WaveStore::new(template, balance(), flow())
    }

    fn wave(entries: Vec<SpawnEntry>) -> WaveDefinition {
        WaveDefinition::with_entries(entries)
    }

    #[test]
    fn test_prepare_generates_when_template_empty() {
        let mut store = WaveStore::new(
            Vec::new(),
            balance(),
            FlowConfig {
                default_archetype: Some(GRUNT),
                ..flow()
            },
        );
        store.prepare_session();
        assert_eq!(store.totals(), vec![10, 20, 40]);
        assert!(store.template().is_empty(), "template is never mutated");
    }

    #[test]
    fn test_prepare_without_archetype_stays_empty() {
        let mut store = store(Vec::new());
        store.prepare_session();
        assert!(store.is_empty());
    }

    #[test]
    fn test_prune_drops_broken_entries() {
        let mut broken = SpawnEntry::along_edge(GRUNT, 5, 0.0);
        broken.archetype = None;
        let mut negative = SpawnEntry::along_edge(GRUNT, 5, 0.0);
        negative.interval_secs = -2.0;
        let mut store = store(vec![wave(vec![
            broken,
            SpawnEntry::along_edge(GRUNT, 12, 0.0),
            negative,
        ])]);
        store.instantiate();
        assert_eq!(store.prune_invalid(), 2);
        assert_eq!(store.wave(0).map(WaveDefinition::total_enemies), Some(12));
    }

    #[test]
    fn test_first_wave_topped_up_keeps_entry_shape() {
        let mut store = store(vec![wave(vec![
            SpawnEntry::in_lane(BRUTE, 3, 0.75, Some(2)),
            SpawnEntry::along_edge(GRUNT, 2, 0.0),
        ])]);
        store.instantiate();
        assert!(store.normalize_first_wave());

        let first = store.wave(0).map(|w| w.entries.clone()).unwrap_or_default();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].archetype, Some(BRUTE));
        assert_eq!(first[0].count, 10);
        assert_eq!(first[0].lane, Some(2));
        assert_eq!(first[0].interval_secs, 0.75);
        assert!(!store.normalize_first_wave(), "already at minimum");
    }

    #[test]
    fn test_adjust_leaves_first_wave_alone() {
        let mut store = store(vec![
            wave(vec![SpawnEntry::along_edge(GRUNT, 14, 0.0)]),
            wave(vec![SpawnEntry::along_edge(GRUNT, 3, 0.0)]),
            wave(vec![SpawnEntry::along_edge(GRUNT, 99, 0.0)]),
        ]);
        store.instantiate();
        assert_eq!(store.adjust_wave_enemy_counts(), 2);
        assert_eq!(store.totals(), vec![14, 20, 40]);
    }

    #[test]
    fn test_set_total_trims_trailing_entries() {
        let mut store = store(vec![wave(vec![
            SpawnEntry::along_edge(GRUNT, 4, 0.0),
            SpawnEntry::along_edge(BRUTE, 6, 0.0),
            SpawnEntry::along_edge(BRUTE, 6, 0.0),
        ])]);
        store.instantiate();

        assert!(store.set_wave_total(0, 20));
        let counts: Vec<u32> = store.waves()[0].entries.iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![8, 6, 6]);

        assert!(store.set_wave_total(0, 7));
        let counts: Vec<u32> = store.waves()[0].entries.iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![0, 6, 1]);
        assert_eq!(store.totals(), vec![7]);
    }

    #[test]
    fn test_empty_wave_filled_from_other_wave_archetype() {
        let mut store = store(vec![
            wave(vec![SpawnEntry::along_edge(BRUTE, 10, 0.0)]),
            wave(Vec::new()),
        ]);
        store.instantiate();
        assert_eq!(store.ensure_non_empty_waves(), 1);
        let second = &store.waves()[1];
        assert_eq!(second.first_archetype(), Some(BRUTE));
        assert_eq!(second.total_enemies(), 20);
    }

    #[test]
    fn test_zero_formula_count_leaves_empty_wave() {
        let balance = BalanceConfig {
            first_wave_count: 0,
            ..balance()
        };
        let mut store = WaveStore::new(
            vec![
                wave(vec![SpawnEntry::along_edge(BRUTE, 10, 0.0)]),
                wave(Vec::new()),
            ],
            balance,
            flow(),
        );
        store.instantiate();
        assert_eq!(store.ensure_non_empty_waves(), 0);
        assert!(store.waves()[1].is_empty());
        assert_eq!(store.waves()[1].total_enemies(), 0);
    }

    #[test]
    fn test_baseline_restore_round_trip() {
        let mut store = store(vec![
            wave(vec![SpawnEntry::along_edge(GRUNT, 10, 0.0)]),
            wave(vec![SpawnEntry::along_edge(GRUNT, 20, 0.0)]),
        ]);
        store.prepare_session();
        let captured = store.totals();

        assert!(store.restore_baseline());
        assert_eq!(store.totals(), captured, "restore without mutation is a no-op");

        store.set_wave_total(0, 55);
        store.set_wave_total(1, 3);
        assert!(store.restore_baseline());
        assert_eq!(store.totals(), captured);
    }

    #[test]
    fn test_baseline_length_mismatch_discarded() {
        let mut store = WaveStore::new(
            vec![wave(vec![SpawnEntry::along_edge(GRUNT, 10, 0.0)])],
            balance(),
            flow(),
        );
        store.prepare_session();
        assert_eq!(store.extend_generated(2), 1);
        store.set_wave_total(0, 99);

        assert!(!store.restore_baseline());
        assert_eq!(store.totals(), vec![99, 20], "nothing restored");
        assert!(store.baseline().is_none());
    }

    #[test]
    fn test_second_session_restores_baseline() {
        let mut store = store(vec![wave(vec![SpawnEntry::along_edge(GRUNT, 10, 0.0)])]);
        store.prepare_session();
        store.set_wave_total(0, 80);

        store.prepare_session();
        assert_eq!(store.totals(), vec![10]);
    }

    #[test]
    fn test_reset_runtime_reinstantiates() {
        let mut store = store(vec![wave(vec![SpawnEntry::along_edge(GRUNT, 10, 0.0)])]);
        store.prepare_session();
        store.reset_runtime();
        assert!(!store.is_instantiated());
        assert!(store.baseline().is_none());
        store.prepare_session();
        assert_eq!(store.totals(), vec![10]);
    }
}
