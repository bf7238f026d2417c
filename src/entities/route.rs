use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

/// A routing provider's answer for one pickup/destination pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub geometry: Vec<Coordinates>,
    /// meters
    pub distance: f64,
    /// seconds
    pub duration: f64,
}

impl Route {
    pub fn new(geometry: Vec<Coordinates>, distance: f64, duration: f64) -> Self {
        Self {
            geometry,
            distance,
            duration,
        }
    }
}
