use async_trait::async_trait;
use geo_types::LineString;
use serde::{Deserialize, Serialize};

use super::RoutingClient;
use crate::{
    entities::{Coordinates, Route},
    error::Error,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Response {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: Geometry,
}

/// GeoJSON LineString, positions as `[longitude, latitude]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct Geometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Clone, Debug)]
pub struct OsrmClient {
    http: reqwest::Client,
    api_base: String,
}

impl OsrmClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn route_url(&self, pickup: &Coordinates, destination: &Coordinates) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.api_base,
            pickup.longitude,
            pickup.latitude,
            destination.longitude,
            destination.latitude
        )
    }
}

#[async_trait]
impl RoutingClient for OsrmClient {
    #[tracing::instrument(skip(self))]
    async fn find_route(&self, pickup: Coordinates, destination: Coordinates) -> Result<Route, Error> {
        let res = self
            .http
            .get(self.route_url(&pickup, &destination))
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if status_code != 200 {
            return Err(Error::RoutingUnavailable(format!(
                "osrm responded with status {}",
                status_code
            )));
        }

        let data: Response = res.json().await?;

        data.into_route()
    }
}

impl Response {
    fn into_route(self) -> Result<Route, Error> {
        if self.code != "Ok" {
            return Err(Error::RoutingUnavailable(format!("osrm code {}", self.code)));
        }

        let route = self
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| Error::RoutingUnavailable("osrm returned no routes".into()))?;

        if !(route.distance.is_finite() && route.duration.is_finite())
            || route.distance < 0.0
            || route.duration < 0.0
        {
            return Err(Error::RoutingUnavailable("osrm returned a malformed route".into()));
        }

        let line = LineString::<f64>::from(route.geometry.coordinates);
        let geometry = line.into_points().into_iter().map(Coordinates::from).collect();

        Ok(Route::new(geometry, route.distance, route.duration))
    }
}

#[test]
fn route_url_puts_longitude_first() {
    let client = OsrmClient::new("http://localhost:5000/");
    let url = client.route_url(&Coordinates::new(52.5, 13.4), &Coordinates::new(48.1, 11.5));

    assert_eq!(url, "http://localhost:5000/route/v1/driving/13.4,52.5;11.5,48.1");
}

#[test]
fn first_route_is_decoded() {
    let body = serde_json::json!({
        "code": "Ok",
        "routes": [
            {
                "distance": 1000.0,
                "duration": 120.0,
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[13.4, 52.5], [13.41, 52.51]]
                }
            },
            {
                "distance": 2000.0,
                "duration": 300.0,
                "geometry": { "type": "LineString", "coordinates": [] }
            }
        ]
    });

    let data: Response = serde_json::from_value(body).unwrap();
    let route = data.into_route().unwrap();

    assert_eq!(route.distance, 1000.0);
    assert_eq!(route.duration, 120.0);
    assert_eq!(
        route.geometry,
        vec![Coordinates::new(52.5, 13.4), Coordinates::new(52.51, 13.41)]
    );
}

#[test]
fn provider_rejections_are_routing_failures() {
    let data: Response = serde_json::from_value(serde_json::json!({ "code": "NoRoute" })).unwrap();
    assert!(matches!(data.into_route(), Err(Error::RoutingUnavailable(_))));

    let data: Response =
        serde_json::from_value(serde_json::json!({ "code": "Ok", "routes": [] })).unwrap();
    assert!(matches!(data.into_route(), Err(Error::RoutingUnavailable(_))));
}
