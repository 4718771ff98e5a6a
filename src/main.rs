// --- File: main.rs ---
use evolarium::{MapType, Simulation, SimulationConfig};
use std::path::PathBuf;
use std::time::Instant;

const DEFAULT_TICK_LIMIT: u64 = 20_000;
const STATUS_INTERVAL_SECS: f64 = 1.0;

/// Options for a headless run.
///
/// Environment variables:
/// - `EVOLARIUM_CONFIG` - JSON file with a [`SimulationConfig`]
/// - `EVOLARIUM_TICKS` - tick limit (default: 20000)
/// - `EVOLARIUM_SEED` - rng seed
/// - `EVOLARIUM_MAP` - map type, e.g. `island`
///
/// CLI flags `--config`, `--ticks`, `--seed`, `--map` and `--speed` take
/// precedence over the environment.
#[derive(Debug, Clone)]
struct RunOptions {
    config_path: Option<PathBuf>,
    tick_limit: u64,
    seed: Option<u64>,
    map: Option<String>,
    speed: u32,
}

impl RunOptions {
    fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let value = |flag: &str, var: &str| {
            Self::parse_cli_value(&args, flag).or_else(|| std::env::var(var).ok())
        };
        RunOptions {
            config_path: value("--config", "EVOLARIUM_CONFIG").map(PathBuf::from),
            tick_limit: value("--ticks", "EVOLARIUM_TICKS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TICK_LIMIT),
            seed: value("--seed", "EVOLARIUM_SEED").and_then(|v| v.parse().ok()),
            map: value("--map", "EVOLARIUM_MAP"),
            speed: Self::parse_cli_value(&args, "--speed")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
        }
    }

    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| (pair[0] == flag).then(|| pair[1].clone()))
    }

    fn simulation_config(&self) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config_path {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => SimulationConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(map) = &self.map {
            let name = serde_json::Value::String(map.to_lowercase());
            config.map_type = serde_json::from_value::<MapType>(name)?;
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let options = RunOptions::load();
    let mut simulation = Simulation::new(options.simulation_config()?)?;
    simulation.set_speed_multiplier(options.speed);

    let started = Instant::now();
    let mut last_status = Instant::now();
    let mut ticks_at_last_status = 0;
    while simulation.tick_count() < options.tick_limit && !simulation.is_finished() {
        simulation.tick();

        let elapsed_secs = last_status.elapsed().as_secs_f64();
        if elapsed_secs >= STATUS_INTERVAL_SECS {
            let stats = simulation.stats();
            let tps = (stats.tick - ticks_at_last_status) as f64 / elapsed_secs;
            log::info!(
                "tick {} gen {} - prey: {}, predators: {}, cannibals: {}, food: {} - {:.0} ticks/s",
                stats.tick,
                stats.generation,
                stats.population,
                stats.active_predators,
                stats.active_cannibals,
                stats.food_count,
                tps
            );
            ticks_at_last_status = stats.tick;
            last_status = Instant::now();
        }
    }

    log::info!(
        "stopped after {} ticks in {:.2}s",
        simulation.tick_count(),
        started.elapsed().as_secs_f64()
    );
    match simulation.final_stats() {
        Some(summary) => println!("{}", serde_json::to_string_pretty(summary)?),
        None => println!("{}", serde_json::to_string_pretty(simulation.stats())?),
    }
    Ok(())
}

// --- End of File: main.rs ---
