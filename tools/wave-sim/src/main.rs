//! wave-sim: headless driver for the BULWARK wave coordinator.
//!
//! Usage:
//!   wave-sim run --config waves.json --max-ticks 20000 --kill-chance 0.05
//!   wave-sim defaults > waves.json

mod report;
mod world;

use std::cell::RefCell;
use std::error::Error;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;
use std::str::FromStr;

use hecs::World;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bulwark_core::commands::WaveCommand;
use bulwark_core::config::SequenceConfig;
use bulwark_core::types::ArchetypeId;
use bulwark_sim::collaborators::PersistentStatsStore;
use bulwark_sim::stats::{JsonStatsStore, MemoryStatsStore};
use bulwark_sim::{Collaborators, WaveCoordinator};

use report::{RunSummary, WaveRecorder};
use world::{Arena, EcsLifecycle, EcsSpawner, SharedWorld, TrickleBuffer};

fn main() {
    init_logging();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "run" => cmd_run(&args[2..]),
        "defaults" => cmd_defaults(),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        error!(error = %e, "wave-sim failed");
        process::exit(1);
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    eprintln!(
        "wave-sim: BULWARK wave sequence simulator\n\
         \n\
         Commands:\n\
         \n\
         run       Run a wave sequence against a mock ECS world\n\
         \n\
           --config <path>       Sequence config JSON (default: built-in defaults)\n\
           --max-ticks <N>       Tick limit (default: 20000)\n\
           --dt <secs>           Seconds per tick (default: 0.05)\n\
           --waves <N>           Stop after N completed waves (default: 10)\n\
           --kill-chance <p>     Per-enemy defeat chance each tick (default: 0.05)\n\
           --seed <N>            Seed for simulated defeats (default: 1)\n\
           --buffer-rate <N>     Route buffered spawns through a queue releasing N per tick\n\
           --stats <path>        Persist best-run kills to this JSON file\n\
         \n\
         defaults  Print the default config as JSON\n\
         \n\
         Examples:\n\
         \n\
           wave-sim defaults > waves.json\n\
           RUST_LOG=debug wave-sim run --config waves.json --waves 3\n"
    );
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn parse_flag<T>(args: &[String], name: &str, default: T) -> Result<T, Box<dyn Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match flag(args, name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| format!("invalid value for {name}: {raw} ({e})").into()),
        None => Ok(default),
    }
}

/// Driver settings around one simulated run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub max_ticks: u64,
    pub dt: f32,
    pub waves: usize,
    pub kill_chance: f64,
    pub seed: u64,
    pub buffer_rate: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_ticks: 20_000,
            dt: 0.05,
            waves: 10,
            kill_chance: 0.05,
            seed: 1,
            buffer_rate: None,
        }
    }
}

impl RunOptions {
    fn from_args(args: &[String]) -> Result<Self, Box<dyn Error>> {
        let defaults = Self::default();
        let kill_chance: f64 = parse_flag(args, "--kill-chance", defaults.kill_chance)?;
        if !(0.0..=1.0).contains(&kill_chance) {
            return Err(format!("--kill-chance must be in [0, 1], got {kill_chance}").into());
        }
        let dt: f32 = parse_flag(args, "--dt", defaults.dt)?;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(format!("--dt must be positive, got {dt}").into());
        }
        let buffer_rate = match flag(args, "--buffer-rate") {
            Some(_) => Some(parse_flag(args, "--buffer-rate", 0usize)?),
            None => None,
        };
        Ok(Self {
            max_ticks: parse_flag(args, "--max-ticks", defaults.max_ticks)?,
            dt,
            waves: parse_flag(args, "--waves", defaults.waves)?,
            kill_chance,
            seed: parse_flag(args, "--seed", defaults.seed)?,
            buffer_rate,
        })
    }
}

// --- Run command ---

fn cmd_run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let config = match flag(args, "--config") {
        Some(path) => SequenceConfig::from_path(&PathBuf::from(path))?,
        None => default_config(),
    };
    let options = RunOptions::from_args(args)?;

    let summary = match flag(args, "--stats") {
        Some(path) => simulate(config, &options, JsonStatsStore::open(path)?),
        None => simulate(config, &options, MemoryStatsStore::new()),
    };

    info!(
        ticks = summary.ticks,
        completed = summary.completed_waves(),
        halted = summary.halted,
        "simulation finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_defaults() -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(&default_config())?);
    Ok(())
}

/// Defaults plus an archetype, so procedural waves have something to spawn.
fn default_config() -> SequenceConfig {
    let mut config = SequenceConfig::default();
    config.flow.default_archetype = Some(ArchetypeId(1));
    config
}

/// Run `config` until it halts, `options.waves` waves complete or the tick
/// limit is hit, then capture the run's statistics.
pub fn simulate<S>(config: SequenceConfig, options: &RunOptions, stats: S) -> RunSummary
where
    S: PersistentStatsStore + 'static,
{
    let world: SharedWorld = Rc::new(RefCell::new(World::new()));
    let arena = Arena::default();

    let mut collaborators = Collaborators::new(
        EcsSpawner::new(Rc::clone(&world), arena),
        EcsLifecycle::new(Rc::clone(&world)),
        stats,
    );
    let trickle = options
        .buffer_rate
        .map(|rate| TrickleBuffer::new(Rc::clone(&world), arena, rate));
    if let Some(buffer) = &trickle {
        collaborators = collaborators.with_buffered(buffer.clone());
    }

    let mut coordinator = WaveCoordinator::new(config, collaborators);
    let mut recorder = WaveRecorder::default();
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);

    coordinator.queue_command(WaveCommand::StartSequence);
    let mut ticks = 0;
    while ticks < options.max_ticks {
        coordinator.tick(options.dt);
        ticks += 1;

        if let Some(buffer) = &trickle {
            buffer.release();
        }
        let defeated = world::roll_defeats(&world, &mut rng, options.kill_chance);
        coordinator.queue_commands(
            defeated
                .into_iter()
                .map(|enemy| WaveCommand::EnemyDefeated { enemy }),
        );

        let events = coordinator.drain_events();
        recorder.observe(
            &events,
            coordinator.time().elapsed_secs,
            coordinator.diagnostics(),
        );
        if coordinator.is_halted() || recorder.completed() >= options.waves {
            break;
        }
    }

    coordinator.queue_command(WaveCommand::CaptureEndOfRun);
    let final_snapshot = coordinator.tick(0.0);

    RunSummary {
        ticks,
        halted: coordinator.is_halted(),
        waves: recorder.into_waves(),
        live_enemies: world::live_enemies(&world),
        final_snapshot,
    }
}
