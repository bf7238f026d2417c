use async_trait::async_trait;

use super::RoutingClient;
use crate::{
    entities::{Coordinates, Route},
    error::Error,
};

const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Offline routing: great-circle distance travelled at a constant speed.
#[derive(Clone, Debug)]
pub struct StraightLineClient {
    /// meters per second
    pub speed: f64,
}

impl Default for StraightLineClient {
    fn default() -> Self {
        Self { speed: 10.0 }
    }
}

pub fn haversine_distance(a: &Coordinates, b: &Coordinates) -> f64 {
    let (lat_a, lat_b) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = lat_b - lat_a;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

#[async_trait]
impl RoutingClient for StraightLineClient {
    #[tracing::instrument(skip(self))]
    async fn find_route(&self, pickup: Coordinates, destination: Coordinates) -> Result<Route, Error> {
        let distance = haversine_distance(&pickup, &destination);

        Ok(Route::new(
            vec![pickup, destination],
            distance,
            distance / self.speed,
        ))
    }
}

#[test]
fn one_degree_of_latitude_is_about_111_km() {
    let distance = haversine_distance(&Coordinates::new(0.0, 0.0), &Coordinates::new(1.0, 0.0));
    assert!((distance - 111_195.0).abs() < 10.0);

    assert_eq!(
        haversine_distance(&Coordinates::new(12.3, 45.6), &Coordinates::new(12.3, 45.6)),
        0.0
    );
}

#[test]
fn duration_follows_speed() {
    use tokio_test::block_on;

    let client = StraightLineClient { speed: 20.0 };
    let route = block_on(client.find_route(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 1.0)))
        .unwrap();

    assert_eq!(route.geometry.len(), 2);
    assert!((route.duration - route.distance / 20.0).abs() < 1e-9);
}
