//! Fare pricing: a pure function of a route, a package catalog and the
//! per-distance / per-duration rates.

use crate::entities::{Package, PackageCatalog, Route};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricingConfig {
    /// minor currency units per meter
    pub price_per_meter: f64,
    /// minor currency units per second
    pub price_per_second: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            price_per_meter: 0.01,
            price_per_second: 0.05,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FareEstimate {
    pub package: Package,
    pub total_price_in_cents: i64,
}

/// One estimate per catalog package, in catalog order.
pub fn estimate(route: &Route, catalog: &PackageCatalog, pricing: &PricingConfig) -> Vec<FareEstimate> {
    let distance_fare = route.distance * pricing.price_per_meter;
    let time_fare = route.duration * pricing.price_per_second;

    catalog
        .iter()
        .map(|(package, base_price)| FareEstimate {
            package,
            total_price_in_cents: (base_price as f64 + distance_fare + time_fare).round() as i64,
        })
        .collect()
}

#[cfg(test)]
fn route(distance: f64, duration: f64) -> Route {
    Route::new(vec![], distance, duration)
}

#[test]
fn estimate_adds_distance_and_time_to_base_price() {
    let catalog = PackageCatalog::new([(Package::Sedan, 200), (Package::Suv, 300)]);

    let estimates = estimate(&route(1000.0, 120.0), &catalog, &PricingConfig::default());

    assert_eq!(
        estimates,
        vec![
            FareEstimate {
                package: Package::Sedan,
                total_price_in_cents: 216
            },
            FareEstimate {
                package: Package::Suv,
                total_price_in_cents: 316
            },
        ]
    );
}

#[test]
fn estimate_follows_catalog_order() {
    let estimates = estimate(
        &route(5400.0, 900.0),
        &PackageCatalog::default(),
        &PricingConfig::default(),
    );

    let packages: Vec<Package> = estimates.iter().map(|e| e.package).collect();
    assert_eq!(
        packages,
        vec![Package::Sedan, Package::Suv, Package::Van, Package::Luxury]
    );
}

#[test]
fn zero_length_route_costs_the_base_price() {
    let estimates = estimate(&route(0.0, 0.0), &PackageCatalog::default(), &PricingConfig::default());

    let prices: Vec<i64> = estimates.iter().map(|e| e.total_price_in_cents).collect();
    assert_eq!(prices, vec![200, 300, 400, 1000]);
}

#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn estimate_is_deterministic(distance in 0.0f64..2_000_000.0, duration in 0.0f64..200_000.0) {
            let route = route(distance, duration);
            let catalog = PackageCatalog::default();
            let pricing = PricingConfig::default();

            prop_assert_eq!(
                estimate(&route, &catalog, &pricing),
                estimate(&route.clone(), &catalog.clone(), &pricing)
            );
        }

        #[test]
        fn estimate_never_undercuts_base_price(distance in 0.0f64..2_000_000.0, duration in 0.0f64..200_000.0) {
            let catalog = PackageCatalog::default();

            for fare in estimate(&route(distance, duration), &catalog, &PricingConfig::default()) {
                prop_assert!(fare.total_price_in_cents >= catalog.base_price(fare.package).unwrap());
            }
        }
    }
}
