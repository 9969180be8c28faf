mod flight;
mod streamer;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use neonspire_core::jobs::JobSystem;
use neonspire_shared::{Building, CityConfig, CityGenerator};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flight::Flight;
use streamer::{ChunkStreamer, StreamEvent, StreamSettings};

const DEFAULT_STEPS: u32 = 200;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();

    let mut seed: Option<u64> = None;
    let mut steps = DEFAULT_STEPS;
    let mut speed: Option<f32> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut stream_config_path: Option<PathBuf> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => seed = Some(parse_value(&mut args, "--seed")),
            "--steps" => steps = parse_value(&mut args, "--steps"),
            "--speed" => speed = Some(parse_value(&mut args, "--speed")),
            "--config" => config_path = Some(PathBuf::from(expect_value(&mut args, "--config"))),
            "--stream-config" => {
                stream_config_path = Some(PathBuf::from(expect_value(&mut args, "--stream-config")));
            }
            "--help" | "-h" => {
                println!(
                    "Usage: neonspire_flythrough [--seed <u64>] [--steps <u32>] [--speed <f32>] \
                     [--config <path>] [--stream-config <path>]"
                );
                return;
            }
            other => {
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
        }
    }

    let config = match config_path {
        Some(path) => match CityConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("failed to load city config {}: {err}", path.display());
                std::process::exit(1);
            }
        },
        None => CityConfig::default(),
    };
    let mut settings = match stream_config_path {
        Some(path) => match StreamSettings::load(&path) {
            Ok(settings) => settings,
            Err(err) => {
                eprintln!("failed to load stream settings {}: {err}", path.display());
                std::process::exit(1);
            }
        },
        None => StreamSettings::default(),
    };
    if let Some(seed) = seed {
        settings.world_seed = seed;
    }

    let jobs = match JobSystem::new(settings.worker_threads) {
        Ok(jobs) => jobs,
        Err(err) => {
            eprintln!("failed to start worker pool: {err}");
            std::process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        eprintln!("\nShutdown signal received, landing...");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("failed to set Ctrl+C handler: {err}");
    }

    let mut flight = Flight::default();
    if let Some(speed) = speed {
        flight.speed = speed;
    }
    run(config, settings, &jobs, flight, steps, &running);
}

#[derive(Debug, Default)]
struct FlightLog {
    loaded: usize,
    unloaded: usize,
    chunk_changes: usize,
}

impl FlightLog {
    fn record(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::ChunkLoaded(_) => self.loaded += 1,
            StreamEvent::ChunkUnloaded(_) => self.unloaded += 1,
            StreamEvent::ObserverMoved { .. } => self.chunk_changes += 1,
        }
    }
}

fn run(
    config: CityConfig,
    settings: StreamSettings,
    jobs: &JobSystem,
    mut flight: Flight,
    steps: u32,
    running: &AtomicBool,
) {
    let mut city = CityGenerator::new(config);
    let (mut streamer, events) = ChunkStreamer::new(settings);
    info!(
        "Flying {steps} steps over seed {} on {} worker threads",
        streamer.settings().world_seed,
        jobs.thread_count()
    );

    let mut log = FlightLog::default();
    streamer.update(&mut city, jobs, flight.position);
    for step in 0..steps {
        if !running.load(Ordering::SeqCst) {
            info!("Stopped after {step} steps");
            break;
        }
        events.drain().into_iter().for_each(|event| log.record(event));
        streamer.update(&mut city, jobs, flight.advance());
    }
    events.drain().into_iter().for_each(|event| log.record(event));

    if let Some(chunk) = streamer.current_chunk() {
        info!(
            "Landed in chunk ({}, {}) after {} chunk changes: {} loaded, {} unloaded",
            chunk.x, chunk.z, log.chunk_changes, log.loaded, log.unloaded
        );
    }
    info!(
        "{} chunks resident: {} buildings, {} neon lights, {} light volumes",
        city.loaded_chunk_count(),
        city.buildings().len(),
        city.neon_lights().len(),
        city.light_volumes().len()
    );

    let skyline = city.buildings().iter().map(Building::top).fold(0.0, f32::max);
    let branch_pairs: usize = city
        .buildings()
        .iter()
        .map(|building| building.branch_pairs().count())
        .sum();
    let beams = city.light_volumes().iter().filter(|volume| volume.is_beam()).count();
    info!("Skyline peaks at {skyline:.1} with {branch_pairs} branch pairs and {beams} beams");
}

fn expect_value(args: &mut impl Iterator<Item = String>, flag: &str) -> String {
    let Some(value) = args.next() else {
        eprintln!("{flag} expects an argument");
        std::process::exit(2);
    };
    value
}

fn parse_value<T>(args: &mut impl Iterator<Item = String>, flag: &str) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = expect_value(args, flag);
    match value.parse::<T>() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("invalid value '{value}' for {flag}: {err}");
            std::process::exit(2);
        }
    }
}
