use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use clap::{Parser, ValueEnum};
use navigation_sim::domain::{
    navigation, point_navigation, Environment, HasRobotPosition, NavigationEnvironment,
    PointNavigationEnvironment, Prepared,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    controller::{Controller, SeekTarget},
    simulator::Settings,
};

mod controller;
mod simulator;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    /// Robot with heading and distance sensors
    Navigation,
    /// Point-mass robot moved by displacements
    PointNavigation,
}

#[derive(Parser, Debug)]
#[command(name = "navsim")]
#[command(about = "Runs a target-seeking robot through one navigation episode")]
struct Cli {
    #[arg(long, value_enum, default_value_t = Kind::Navigation)]
    environment: Kind,

    /// Prepared arena, overrides the one in the configuration file: empty, a_barrier,
    /// b_barrier, c_barrier, u_barrier, upside_down_u_barrier, e_maze, flat_maze,
    /// deceptive_maze or decimal_maze
    #[arg(long)]
    arena: Option<Prepared>,

    /// Environment configuration (JSON), defaults apply to missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = 1000)]
    steps: usize,

    /// Seconds between two steps
    #[arg(long, default_value_t = 0.1)]
    dt: f64,

    /// Distance to the target at which the episode ends
    #[arg(long, default_value_t = 0.01)]
    tolerance: f64,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    ensure!(cli.dt > 0.0, "time step must be positive, got {}", cli.dt);
    ensure!(
        cli.tolerance >= 0.0,
        "tolerance must be non-negative, got {}",
        cli.tolerance
    );

    let rng = ChaCha8Rng::seed_from_u64(cli.seed);
    let settings = Settings {
        steps: cli.steps,
        dt: cli.dt,
        tolerance: cli.tolerance,
    };
    info!(environment = ?cli.environment, seed = cli.seed, steps = cli.steps, "starting episode");

    match cli.environment {
        Kind::Navigation => {
            let mut configuration: navigation::Configuration = load(cli.config.as_deref())?;
            if let Some(prepared) = cli.arena {
                configuration.arena = prepared.arena().clone();
            }
            run(NavigationEnvironment::new(configuration, rng)?, settings)
        }
        Kind::PointNavigation => {
            let mut configuration: point_navigation::Configuration =
                load(cli.config.as_deref())?;
            if let Some(prepared) = cli.arena {
                configuration.arena = prepared.arena().clone();
            }
            run(PointNavigationEnvironment::new(configuration, rng)?, settings)
        }
    }
}

fn load<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse configuration {}", path.display()))
}

fn run<E>(mut environment: E, settings: Settings) -> Result<()>
where
    E: Environment,
    E::State: Clone + HasRobotPosition,
    SeekTarget: Controller<E::State>,
{
    let outcome = simulator::simulate(&mut environment, &mut SeekTarget, settings)?;
    let position = environment.state().robot_position();
    let distance = environment.distance_to_target();
    info!(
        steps = outcome.len(),
        x = position.x(),
        y = position.y(),
        distance,
        reached = distance <= settings.tolerance,
        "episode finished"
    );
    Ok(())
}
