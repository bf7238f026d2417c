use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tripfare::config::EngineConfig;
use tripfare::engine::Engine;
use tripfare::entities::Coordinates;
use tripfare::error::Error;
use tripfare::external::straight_line::StraightLineClient;
use tripfare::simulation::{Executor, SimulationConfig};
use tripfare::store::{MemoryOfferStore, MemoryTripStore};

/// Drives simulated riders through preview and commit against an in-process engine.
#[derive(Debug, Parser)]
#[command(name = "simulate")]
struct Arguments {
    /// Number of distinct riders.
    #[arg(long, env = "SIM_RIDERS", default_value_t = 100)]
    riders: usize,

    /// Preview/commit rounds each rider goes through.
    #[arg(long, env = "SIM_TRIPS_PER_RIDER", default_value_t = 5)]
    trips_per_rider: usize,

    /// Concurrent workers pulling riders off the queue.
    #[arg(long, env = "SIM_WORKERS", default_value_t = 16)]
    workers: usize,

    /// Chance that a rider fires a second, concurrent commit for the same fare.
    #[arg(long, env = "SIM_DUPLICATE_COMMIT_PROBABILITY", default_value_t = 0.2)]
    duplicate_commit_probability: f64,

    #[arg(long, env = "SIM_CENTER_LATITUDE", default_value_t = 52.52)]
    center_latitude: f64,

    #[arg(long, env = "SIM_CENTER_LONGITUDE", default_value_t = 13.405)]
    center_longitude: f64,

    /// Standard deviation of trip endpoints around the centre, in degrees.
    #[arg(long, env = "SIM_SPREAD", default_value_t = 0.05)]
    spread: f64,
}

impl From<Arguments> for SimulationConfig {
    fn from(args: Arguments) -> Self {
        Self {
            riders: args.riders,
            trips_per_rider: args.trips_per_rider,
            workers: args.workers,
            duplicate_commit_probability: args.duplicate_commit_probability,
            center: Coordinates::new(args.center_latitude, args.center_longitude),
            spread: args.spread,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let args = Arguments::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    if let Err(err) = run(args).await {
        tracing::error!("simulation failed: {}", err);
        std::process::exit(1);
    }
}

async fn run(args: Arguments) -> Result<(), Error> {
    let trips = Arc::new(MemoryTripStore::new());

    let engine = Engine::new(
        EngineConfig::default(),
        Arc::new(StraightLineClient::default()),
        Arc::new(MemoryOfferStore::new()),
        trips.clone(),
    )?;

    let report = Executor::new(Arc::new(engine), args.into())?.run().await;

    println!("{:#?}", report);
    println!("trips persisted: {}", trips.len().await);

    Ok(())
}

#[test]
fn arguments_map_onto_simulation_config() {
    let args = Arguments::try_parse_from([
        "simulate",
        "--riders",
        "7",
        "--workers",
        "2",
        "--duplicate-commit-probability",
        "0.9",
    ])
    .unwrap();

    let config: SimulationConfig = args.into();
    assert_eq!(config.riders, 7);
    assert_eq!(config.trips_per_rider, 5);
    assert_eq!(config.workers, 2);
    assert_eq!(config.duplicate_commit_probability, 0.9);
    assert_eq!(config.center, Coordinates::new(52.52, 13.405));

    assert!(Arguments::try_parse_from(["simulate", "--riders", "abc"]).is_err());
}
