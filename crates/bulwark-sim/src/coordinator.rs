//! Wave coordinator: the phase state machine driving a wave sequence.
//!
//! `WaveCoordinator` owns the runtime wave list and the injected
//! collaborators. The host feeds it `tick(dt)` once per frame and queues
//! commands in between. Each tick first spends the frame's time on the
//! active timer, then steps the machine until it has to wait for time,
//! an advance request, deferred spawns or defeats. A timer started during
//! a tick only begins counting on the next one.

use std::collections::{HashSet, VecDeque};

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use bulwark_core::commands::WaveCommand;
use bulwark_core::config::SequenceConfig;
use bulwark_core::constants::BEST_RUN_KILLS_KEY;
use bulwark_core::enums::{Phase, SpawnPattern};
use bulwark_core::events::WaveEvent;
use bulwark_core::state::{RunStatistics, WaveSnapshot};
use bulwark_core::types::{EnemyId, SimTime};
use bulwark_core::wave::SpawnEntry;
use bulwark_procgen::balance::{enemy_count_for_wave, hp_multiplier_for_wave};
use bulwark_procgen::patterns;

use crate::admission::{Admission, AdmissionController, Placement, UnitRequest};
use crate::collaborators::{BalanceOverrides, Collaborators, ReceiptQueue};
use crate::notify::{EventBus, SubscriptionId};
use crate::store::WaveStore;

/// Phase transitions allowed in a single tick.
const MAX_TRANSITIONS_PER_TICK: usize = 64;

/// Per-wave admission counters, reset at combat start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveDiagnostics {
    pub immediate: u32,
    pub buffered: u32,
    pub scheduled: u32,
    /// Immediate spawns the world refused.
    pub failed: u32,
    /// Ticks cut short by the per-tick spawn cap.
    pub throttle_yields: u32,
}

impl WaveDiagnostics {
    pub fn dispatched(&self) -> u32 {
        self.immediate + self.buffered + self.scheduled + self.failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Idle,
    /// Auto-advancing Shop/Preparation.
    Countdown { remaining: f32 },
    /// Manual Shop/Preparation.
    AwaitAdvance,
    Spawning(SpawnCursor),
    /// Everything dispatched; waiting for defeats and deferred spawns.
    Draining,
    /// Completed phase delay before the next wave.
    Cooldown { remaining: f32 },
    /// Sequence exhausted without looping.
    Halted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct SpawnCursor {
    entry: usize,
    unit: u32,
    dispatched: u32,
    wait: f32,
    run: Option<EntryRun>,
}

impl SpawnCursor {
    fn next_entry(&mut self) {
        self.entry += 1;
        self.unit = 0;
        self.run = None;
    }
}

/// Decisions fixed when an entry starts.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EntryRun {
    buffer: bool,
    throttled: bool,
    edge_points: usize,
    lane_count: usize,
    burst_waited: bool,
}

enum Flow {
    Continue,
    Suspend,
}

enum SpawnProgress {
    Suspended,
    Finished,
}

/// Drives Shop → Preparation → Combat → Completed across a wave sequence.
pub struct WaveCoordinator {
    config: SequenceConfig,
    store: WaveStore,
    admission: AdmissionController,
    collaborators: Collaborators,
    receipts: ReceiptQueue,
    bus: EventBus,
    command_queue: VecDeque<WaveCommand>,
    rng: ChaCha8Rng,

    time: SimTime,
    phase: Phase,
    stage: Stage,
    /// Bumped on every start and stop; deferred spawns from older
    /// generations are ignored.
    generation: u64,
    wave_index: usize,
    virtual_wave: u32,
    advance_requested: bool,
    active: HashSet<EnemyId>,
    stats: RunStatistics,
    pattern: Option<SpawnPattern>,
    pattern_seed: u32,
    diagnostics: WaveDiagnostics,
    frame_spawned: u32,
}

impl WaveCoordinator {
    /// Build a coordinator. `config` is expected to have passed
    /// [`SequenceConfig::validate`].
    pub fn new(config: SequenceConfig, collaborators: Collaborators) -> Self {
        let store = WaveStore::new(config.waves.clone(), config.balance, config.flow);
        let best = collaborators.stats.get_int(BEST_RUN_KILLS_KEY, 0);
        let stats = RunStatistics {
            best_run_kills: u32::try_from(best.max(0)).unwrap_or(u32::MAX),
            ..Default::default()
        };
        Self {
            admission: AdmissionController::new(config.admission),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            pattern_seed: config.patterns.seed,
            store,
            config,
            collaborators,
            receipts: ReceiptQueue::default(),
            bus: EventBus::new(),
            command_queue: VecDeque::new(),
            time: SimTime::default(),
            phase: Phase::Idle,
            stage: Stage::Idle,
            generation: 0,
            wave_index: 0,
            virtual_wave: 1,
            advance_requested: false,
            active: HashSet::new(),
            stats,
            pattern: None,
            diagnostics: WaveDiagnostics::default(),
            frame_spawned: 0,
        }
    }

    // ---- Host surface ----

    /// Queue a command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: WaveCommand) {
        self.command_queue.push_back(command);
    }

    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = WaveCommand>) {
        self.command_queue.extend(commands);
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&WaveEvent) + 'static) -> SubscriptionId {
        self.bus.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<WaveEvent> {
        self.bus.drain()
    }

    /// Advance by `dt` seconds and return the resulting snapshot.
    pub fn tick(&mut self, dt: f32) -> WaveSnapshot {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.frame_spawned = 0;

        if self.is_running() {
            self.time.advance(dt);
            self.consume_time(dt);
        }
        self.collect_receipts();
        self.process_commands();
        if self.is_running() {
            self.run_until_suspended();
        }

        self.snapshot()
    }

    /// Start a new run from the first wave. Rejected while running.
    pub fn start_sequence(&mut self) -> bool {
        if self.is_running() {
            warn!(
                wave_index = self.wave_index,
                phase = ?self.phase,
                "start ignored: sequence already running"
            );
            return false;
        }

        self.store.prepare_session();
        if self.store.is_empty() {
            warn!("start ignored: no waves available");
            return false;
        }

        self.generation += 1;
        self.stats.begin_run();
        self.active.clear();
        self.wave_index = 0;
        self.virtual_wave = 1;
        self.pattern = None;
        self.diagnostics = WaveDiagnostics::default();
        info!(
            waves = self.store.len(),
            generation = self.generation,
            "sequence started"
        );
        self.enter_countdown(Phase::Shop);
        true
    }

    /// Abort the sequence and return to Idle. Pending deferred spawns are
    /// ignored when they arrive.
    pub fn stop_sequence(&mut self) {
        if self.stage == Stage::Idle && self.phase == Phase::Idle {
            return;
        }
        self.generation += 1;
        self.active.clear();
        self.advance_requested = false;
        let _ = self.receipts.drain();
        self.stage = Stage::Idle;
        self.set_phase(Phase::Idle);
        info!(generation = self.generation, "sequence stopped");
    }

    /// Leave the current Shop or Preparation phase. Takes effect on the next
    /// tick. Returns false outside those phases.
    pub fn request_advance(&mut self) -> bool {
        match &mut self.stage {
            Stage::Countdown { remaining } => {
                *remaining = 0.0;
                true
            }
            Stage::AwaitAdvance => {
                self.advance_requested = true;
                true
            }
            _ => {
                debug!(phase = ?self.phase, "advance ignored outside shop/preparation");
                false
            }
        }
    }

    /// Report that `enemy` left play.
    pub fn enemy_defeated(&mut self, enemy: EnemyId) {
        if self.phase == Phase::Idle {
            return;
        }
        // A deferred spawn may be delivered and defeated between ticks.
        self.collect_receipts();
        self.active.remove(&enemy);
        self.stats.record_kill();
    }

    /// Move this run's kills into last/best and persist a new best.
    pub fn capture_end_of_run(&mut self) {
        let new_best = self.stats.capture_end_of_run();
        info!(
            kills = self.stats.last_run_kills,
            best = self.stats.best_run_kills,
            new_best,
            "run captured"
        );
        if !new_best {
            return;
        }
        let store = &mut self.collaborators.stats;
        store.set_int(BEST_RUN_KILLS_KEY, i64::from(self.stats.best_run_kills));
        if let Err(err) = store.save() {
            warn!(error = %err, "failed to persist best run");
        }
    }

    // ---- Queries ----

    /// Running means a sequence was started and has not stopped or halted.
    pub fn is_running(&self) -> bool {
        !matches!(self.stage, Stage::Idle | Stage::Halted)
    }

    pub fn is_halted(&self) -> bool {
        self.stage == Stage::Halted
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Player-facing wave number, 0 while idle.
    pub fn wave_number(&self) -> u32 {
        if self.phase == Phase::Idle {
            0
        } else if self.store.len() == 1 {
            self.virtual_wave
        } else {
            u32::try_from(self.wave_index + 1).unwrap_or(u32::MAX)
        }
    }

    pub fn current_wave_index(&self) -> usize {
        self.wave_index
    }

    pub fn virtual_wave(&self) -> u32 {
        self.virtual_wave
    }

    /// Remaining countdown of an auto Shop/Preparation phase.
    pub fn phase_remaining(&self) -> Option<f32> {
        match self.stage {
            Stage::Countdown { remaining } => Some(remaining.max(0.0)),
            _ => None,
        }
    }

    pub fn active_enemy_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, enemy: EnemyId) -> bool {
        self.active.contains(&enemy)
    }

    pub fn stats(&self) -> RunStatistics {
        self.stats
    }

    pub fn diagnostics(&self) -> WaveDiagnostics {
        self.diagnostics
    }

    pub fn pattern(&self) -> Option<SpawnPattern> {
        self.pattern
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn store(&self) -> &WaveStore {
        &self.store
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn collaborators_mut(&mut self) -> &mut Collaborators {
        &mut self.collaborators
    }

    pub fn snapshot(&self) -> WaveSnapshot {
        WaveSnapshot {
            time: self.time,
            phase: self.phase,
            wave_number: self.wave_number(),
            wave_index: self.wave_index,
            virtual_wave: self.virtual_wave,
            wave_count: self.store.len(),
            phase_remaining_secs: self.phase_remaining(),
            active_enemies: self.active.len(),
            pending_deferred: self.collaborators.pending_deferred(),
            pattern: self.pattern,
            stats: self.stats,
        }
    }

    // ---- Tick internals ----

    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    fn handle_command(&mut self, command: WaveCommand) {
        match command {
            WaveCommand::StartSequence => {
                self.start_sequence();
            }
            WaveCommand::StopSequence => self.stop_sequence(),
            WaveCommand::Advance => {
                self.request_advance();
            }
            WaveCommand::EnemyDefeated { enemy } => self.enemy_defeated(enemy),
            WaveCommand::CaptureEndOfRun => self.capture_end_of_run(),
        }
    }

    fn consume_time(&mut self, dt: f32) {
        match &mut self.stage {
            Stage::Countdown { remaining } => {
                *remaining -= dt;
                let remaining_secs = Some(remaining.max(0.0));
                let phase = self.phase;
                self.bus.emit(WaveEvent::PhaseTimerUpdated {
                    phase,
                    remaining_secs,
                });
            }
            Stage::Spawning(cursor) => cursor.wait -= dt,
            Stage::Cooldown { remaining } => *remaining -= dt,
            _ => {}
        }
    }

    fn collect_receipts(&mut self) {
        for receipt in self.receipts.drain() {
            if receipt.generation != self.generation || !self.is_running() {
                debug!(
                    enemy = receipt.enemy.0,
                    generation = receipt.generation,
                    "ignoring deferred spawn from a stale sequence"
                );
                continue;
            }
            self.register(receipt.enemy, receipt.overrides);
        }
    }

    fn run_until_suspended(&mut self) {
        for _ in 0..MAX_TRANSITIONS_PER_TICK {
            if let Flow::Suspend = self.step() {
                return;
            }
        }
        warn!(
            wave_number = self.wave_number(),
            "transition limit reached this tick; resuming next tick"
        );
    }

    fn step(&mut self) -> Flow {
        match self.stage {
            Stage::Idle | Stage::Halted => Flow::Suspend,
            Stage::Countdown { remaining } if remaining > 0.0 => Flow::Suspend,
            Stage::Countdown { .. } => {
                self.finish_countdown();
                Flow::Continue
            }
            Stage::AwaitAdvance => {
                if std::mem::take(&mut self.advance_requested) {
                    self.finish_countdown();
                    Flow::Continue
                } else {
                    Flow::Suspend
                }
            }
            Stage::Spawning(mut cursor) => match self.drive_spawns(&mut cursor) {
                SpawnProgress::Suspended => {
                    self.stage = Stage::Spawning(cursor);
                    Flow::Suspend
                }
                SpawnProgress::Finished => {
                    debug!(
                        dispatched = cursor.dispatched,
                        "all entries dispatched; draining"
                    );
                    self.stage = Stage::Draining;
                    Flow::Continue
                }
            },
            Stage::Draining => {
                if self.combat_resolved() {
                    self.enter_completed();
                    Flow::Continue
                } else {
                    Flow::Suspend
                }
            }
            Stage::Cooldown { remaining } if remaining > 0.0 => Flow::Suspend,
            Stage::Cooldown { .. } => {
                self.advance_wave();
                Flow::Continue
            }
        }
    }

    // ---- Phases ----

    fn set_phase(&mut self, phase: Phase) {
        if self.phase == phase {
            return;
        }
        debug!(from = ?self.phase, to = ?phase, "phase changed");
        self.phase = phase;
        self.bus.emit(WaveEvent::PhaseChanged { phase });
    }

    fn enter_countdown(&mut self, phase: Phase) {
        let (secs, manual) = match self.store.wave(self.wave_index) {
            Some(wave) if phase == Phase::Shop => (wave.shop_secs, wave.manual_shop),
            Some(wave) => (wave.preparation_secs, wave.manual_preparation),
            None => (0.0, false),
        };
        self.advance_requested = false;
        self.set_phase(phase);

        if manual {
            self.stage = Stage::AwaitAdvance;
            self.bus.emit(WaveEvent::PhaseTimerUpdated {
                phase,
                remaining_secs: None,
            });
        } else {
            let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
            self.stage = Stage::Countdown { remaining: secs };
            self.bus.emit(WaveEvent::PhaseTimerUpdated {
                phase,
                remaining_secs: Some(secs),
            });
        }
    }

    fn finish_countdown(&mut self) {
        if self.phase == Phase::Shop {
            self.enter_countdown(Phase::Preparation);
        } else {
            self.enter_combat();
        }
    }

    fn enter_combat(&mut self) {
        self.active.clear();
        self.diagnostics = WaveDiagnostics::default();
        self.resolve_pattern();

        self.set_phase(Phase::Combat);
        let wave_number = self.wave_number();
        if wave_number == 1 && self.store.normalize_first_wave() {
            warn!("wave 1 below the configured minimum at combat start; topped up");
        }

        let total = self
            .store
            .wave(self.wave_index)
            .map_or(0, |wave| wave.total_enemies());
        info!(
            wave_number,
            total,
            pattern = ?self.pattern,
            hp_multiplier = hp_multiplier_for_wave(&self.config.balance, wave_number),
            "combat started"
        );
        self.bus.emit(WaveEvent::WaveStarted { wave_number });
        self.stage = Stage::Spawning(SpawnCursor::default());
    }

    fn resolve_pattern(&mut self) {
        let patterns = &self.config.patterns;
        if patterns.randomize_per_wave {
            let index = self.rng.gen_range(0..SpawnPattern::ALL.len());
            self.pattern = Some(SpawnPattern::ALL[index]);
            self.pattern_seed = self.rng.gen();
        } else {
            self.pattern = Some(patterns.pattern);
            self.pattern_seed = patterns.seed;
        }
    }

    fn combat_resolved(&mut self) -> bool {
        // Deferred spawns delivered during this tick must be counted first.
        self.collect_receipts();
        self.active.is_empty() && self.collaborators.pending_deferred() == 0
    }

    fn enter_completed(&mut self) {
        let wave_number = self.wave_number();
        self.set_phase(Phase::Completed);
        self.bus.emit(WaveEvent::WaveCompleted { wave_number });

        let d = self.diagnostics;
        info!(
            wave_number,
            immediate = d.immediate,
            buffered = d.buffered,
            scheduled = d.scheduled,
            failed = d.failed,
            throttle_yields = d.throttle_yields,
            "wave completed"
        );

        let post_combat = self
            .store
            .wave(self.wave_index)
            .map_or(0.0, |wave| wave.post_combat_delay_secs);
        let delay = post_combat.max(self.config.flow.inter_wave_delay_secs);
        self.stage = Stage::Cooldown {
            remaining: if delay.is_finite() { delay } else { 0.0 },
        };
    }

    fn advance_wave(&mut self) {
        let flow = self.config.flow;
        let len = self.store.len();

        if len == 1 && flow.loop_sequence {
            self.virtual_wave = self.virtual_wave.saturating_add(1);
            let target = enemy_count_for_wave(&self.config.balance, self.virtual_wave);
            self.store.set_wave_total(0, target);
            debug!(virtual_wave = self.virtual_wave, target, "looping single wave");
            self.enter_countdown(Phase::Shop);
            return;
        }

        if self.wave_index + 1 < len {
            self.wave_index += 1;
            self.enter_countdown(Phase::Shop);
            return;
        }

        if flow.auto_extend
            && len < flow.max_generated_waves as usize
            && self.store.extend_generated(len + 1) > 0
        {
            self.wave_index += 1;
            debug!(wave_count = self.store.len(), "extended wave list");
            self.enter_countdown(Phase::Shop);
            return;
        }

        if flow.loop_sequence {
            self.wave_index = 0;
            info!("sequence exhausted; looping to the first wave");
            self.enter_countdown(Phase::Shop);
            return;
        }

        info!(waves = len, "sequence exhausted; halting");
        self.stage = Stage::Halted;
    }

    // ---- Spawning ----

    fn drive_spawns(&mut self, cursor: &mut SpawnCursor) -> SpawnProgress {
        let wave_number = self.wave_number();
        let overrides = BalanceOverrides {
            hp_multiplier: hp_multiplier_for_wave(&self.config.balance, wave_number),
            wave_number,
        };

        loop {
            if cursor.wait > 0.0 {
                return SpawnProgress::Suspended;
            }
            let Some(wave) = self.store.wave(self.wave_index) else {
                return SpawnProgress::Finished;
            };
            let wave_total = wave.total_enemies();
            let Some(entry) = wave.entries.get(cursor.entry).copied() else {
                return SpawnProgress::Finished;
            };
            let Some(archetype) = entry.archetype else {
                cursor.next_entry();
                continue;
            };

            let run = match cursor.run {
                Some(run) => run,
                None => {
                    let remaining = wave_total.saturating_sub(cursor.dispatched);
                    let run = self.begin_entry(&entry, remaining);
                    cursor.run = Some(run);
                    run
                }
            };

            if cursor.unit >= entry.count {
                if entry.along_edge && entry.interval_secs > 0.0 && !run.burst_waited {
                    cursor.run = Some(EntryRun {
                        burst_waited: true,
                        ..run
                    });
                    cursor.wait = entry.interval_secs;
                    return SpawnProgress::Suspended;
                }
                cursor.next_entry();
                continue;
            }

            if run.throttled && self.frame_spawned >= self.admission.frame_cap() {
                self.diagnostics.throttle_yields += 1;
                return SpawnProgress::Suspended;
            }

            let request = UnitRequest {
                archetype,
                placement: self.placement_for(&entry, &run, cursor.unit),
            };
            let admission = self.admission.admit(
                &mut self.collaborators,
                request,
                run.buffer,
                overrides,
                &self.receipts,
                self.generation,
            );
            self.record_admission(admission, overrides);
            cursor.unit += 1;
            cursor.dispatched += 1;

            if !entry.along_edge && entry.interval_secs > 0.0 {
                cursor.wait = entry.interval_secs;
                return SpawnProgress::Suspended;
            }
        }
    }

    fn begin_entry(&mut self, entry: &SpawnEntry, remaining_wave_count: u32) -> EntryRun {
        let buffer = self.admission.should_buffer(entry.count, remaining_wave_count);
        let throttled = self.admission.throttles(entry);
        let (edge_points, lane_count) = if entry.along_edge {
            (0, 0)
        } else {
            let world = &mut self.collaborators.world;
            let edge_points = world.ensure_edge_spawn_points(entry.count as usize);
            (edge_points, world.lane_count())
        };
        if let Some(lane) = entry.lane {
            if lane_count > 0 && lane as usize >= lane_count {
                warn!(lane, lane_count, "lane out of range; wrapping");
            }
        }
        debug!(
            count = entry.count,
            along_edge = entry.along_edge,
            buffer,
            throttled,
            "entry started"
        );
        EntryRun {
            buffer,
            throttled,
            edge_points,
            lane_count,
            burst_waited: false,
        }
    }

    fn placement_for(&self, entry: &SpawnEntry, run: &EntryRun, unit: u32) -> Placement {
        if entry.along_edge {
            let world = &self.collaborators.world;
            let position = patterns::spawn_position(
                self.pattern.unwrap_or(self.config.patterns.pattern),
                unit,
                entry.count,
                self.pattern_seed,
                &self.config.patterns,
                |t| world.edge_position_at_normalized_y(t),
            );
            return Placement::Position(position);
        }
        let lane = match entry.lane {
            Some(lane) if run.lane_count > 0 => lane % run.lane_count as u32,
            Some(lane) => lane,
            None => unit % run.edge_points.max(1) as u32,
        };
        Placement::Lane(lane)
    }

    fn record_admission(&mut self, admission: Admission, overrides: BalanceOverrides) {
        if admission.is_immediate() {
            self.frame_spawned += 1;
        }
        match admission {
            Admission::Spawned(enemy) => {
                self.diagnostics.immediate += 1;
                self.register(enemy, overrides);
            }
            Admission::Buffered => self.diagnostics.buffered += 1,
            Admission::Scheduled => self.diagnostics.scheduled += 1,
            Admission::Failed => self.diagnostics.failed += 1,
        }
    }

    /// Track `enemy` and apply wave scaling once.
    fn register(&mut self, enemy: EnemyId, overrides: BalanceOverrides) {
        if self.active.insert(enemy) {
            self.collaborators
                .lifecycle
                .apply_balance_overrides(enemy, overrides);
        }
    }
}

impl std::fmt::Debug for WaveCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaveCoordinator")
            .field("phase", &self.phase)
            .field("stage", &self.stage)
            .field("wave_index", &self.wave_index)
            .field("virtual_wave", &self.virtual_wave)
            .field("generation", &self.generation)
            .field("active", &self.active.len())
            .finish_non_exhaustive()
    }
}
