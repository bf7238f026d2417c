use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn validate(&self, name: &str) -> Result<(), Error> {
        if !self.is_valid() {
            return Err(Error::InvalidRequest(format!("{} is not a valid coordinate", name)));
        }

        Ok(())
    }
}

// geo-types uses x = longitude, y = latitude
impl From<Coordinates> for Point<f64> {
    fn from(coordinates: Coordinates) -> Self {
        Point::new(coordinates.longitude, coordinates.latitude)
    }
}

impl From<Point<f64>> for Coordinates {
    fn from(point: Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

#[test]
fn coordinates_outside_the_globe_are_rejected() {
    assert!(Coordinates::new(0.0, 0.0).is_valid());
    assert!(Coordinates::new(-90.0, 180.0).is_valid());

    assert!(!Coordinates::new(90.5, 0.0).is_valid());
    assert!(!Coordinates::new(0.0, -180.1).is_valid());
    assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());

    let err = Coordinates::new(100.0, 0.0).validate("pickup").unwrap_err();
    assert_eq!(err, Error::InvalidRequest("pickup is not a valid coordinate".into()));
}

#[test]
fn point_conversion_swaps_axes() {
    let point: Point<f64> = Coordinates::new(52.52, 13.40).into();
    assert_eq!(point.x(), 13.40);
    assert_eq!(point.y(), 52.52);

    assert_eq!(Coordinates::from(point), Coordinates::new(52.52, 13.40));
}
