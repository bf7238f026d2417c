use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tripfare::config::{Config, RoutingProvider};
use tripfare::engine::Engine;
use tripfare::error::Error;
use tripfare::external::{osrm::OsrmClient, straight_line::StraightLineClient, DynRoutingClient};
use tripfare::server::serve;
use tripfare::store::{MemoryOfferStore, MemoryTripStore};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run().await {
        tracing::error!("tripfare exited: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let config = Config::from_env()?;

    let routing: DynRoutingClient = match config.routing_provider {
        RoutingProvider::Osrm => Arc::new(OsrmClient::new(config.osrm_api_base.clone())),
        RoutingProvider::StraightLine => Arc::new(StraightLineClient::default()),
    };

    let engine = Engine::new(
        config.engine,
        routing,
        Arc::new(MemoryOfferStore::new()),
        Arc::new(MemoryTripStore::new()),
    )?;

    serve(engine, config.http_addr).await
}
