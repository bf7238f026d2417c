use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entities::{FareOffer, Route};

/// What a successful preview hands back: the route and one offer per package.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TripPreview {
    pub route: Arc<Route>,
    pub fares: Vec<FareOffer>,
}
