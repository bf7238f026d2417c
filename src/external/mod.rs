pub mod osrm;
pub mod straight_line;

use std::sync::Arc;

use async_trait::async_trait;

use crate::entities::{Coordinates, Route};
use crate::error::Error;

/// An external routing provider. One attempt per call, no retries; any
/// provider failure surfaces as `Error::RoutingUnavailable`.
#[async_trait]
pub trait RoutingClient {
    async fn find_route(&self, pickup: Coordinates, destination: Coordinates) -> Result<Route, Error>;
}

pub type DynRoutingClient = Arc<dyn RoutingClient + Send + Sync>;
