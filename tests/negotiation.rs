use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use tripfare::api::{FareAPI, TripAPI};
use tripfare::auth::User;
use tripfare::config::EngineConfig;
use tripfare::engine::Engine;
use tripfare::entities::{Coordinates, FareOffer, FareStatus, Package, PackageCatalog, Route, Trip};
use tripfare::error::Error;
use tripfare::external::{DynRoutingClient, RoutingClient};
use tripfare::store::{MemoryOfferStore, MemoryTripStore, OfferStore, TripStore};

struct FixedRoute {
    distance: f64,
    duration: f64,
}

#[async_trait]
impl RoutingClient for FixedRoute {
    async fn find_route(&self, pickup: Coordinates, destination: Coordinates) -> Result<Route, Error> {
        Ok(Route::new(vec![pickup, destination], self.distance, self.duration))
    }
}

struct FailingRoute;

#[async_trait]
impl RoutingClient for FailingRoute {
    async fn find_route(&self, _: Coordinates, _: Coordinates) -> Result<Route, Error> {
        Err(Error::RoutingUnavailable("provider returned 503".into()))
    }
}

struct HangingRoute;

#[async_trait]
impl RoutingClient for HangingRoute {
    async fn find_route(&self, _: Coordinates, _: Coordinates) -> Result<Route, Error> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(Error::Unexpected("unreachable".into()))
    }
}

/// Delegates to a memory store but refuses the nth write.
struct FlakyOfferStore {
    inner: MemoryOfferStore,
    writes: AtomicUsize,
    fail_on: usize,
}

#[async_trait]
impl OfferStore for FlakyOfferStore {
    async fn create_offer(&self, offer: FareOffer) -> Result<Uuid, Error> {
        if self.writes.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
            return Err(Error::Storage("disk full".into()));
        }

        self.inner.create_offer(offer).await
    }

    async fn find_offer(&self, id: Uuid) -> Result<FareOffer, Error> {
        self.inner.find_offer(id).await
    }

    async fn try_commit_offer(&self, id: Uuid, trip_id: Uuid) -> Result<bool, Error> {
        self.inner.try_commit_offer(id, trip_id).await
    }
}

struct UnwritableTripStore;

#[async_trait]
impl TripStore for UnwritableTripStore {
    async fn create_trip(&self, _: Trip) -> Result<Uuid, Error> {
        Err(Error::Storage("read-only replica".into()))
    }

    async fn find_trip(&self, _: Uuid) -> Result<Trip, Error> {
        Err(Error::TripNotFound)
    }
}

fn two_package_config() -> EngineConfig {
    EngineConfig {
        catalog: PackageCatalog::new(vec![(Package::Sedan, 200), (Package::Suv, 300)]),
        ..EngineConfig::default()
    }
}

fn engine_with(config: EngineConfig, routing: DynRoutingClient) -> (Engine, Arc<MemoryOfferStore>) {
    let offers = Arc::new(MemoryOfferStore::new());
    let engine = Engine::new(config, routing, offers.clone(), Arc::new(MemoryTripStore::new())).unwrap();

    (engine, offers)
}

fn fixed_route() -> DynRoutingClient {
    Arc::new(FixedRoute {
        distance: 1000.0,
        duration: 120.0,
    })
}

fn berlin() -> (Coordinates, Coordinates) {
    (Coordinates::new(52.52, 13.405), Coordinates::new(52.50, 13.45))
}

#[tokio::test]
async fn preview_then_commit() {
    let (engine, offers) = engine_with(two_package_config(), fixed_route());
    let user = User::new("rider-1");
    let (pickup, destination) = berlin();

    let preview = engine.preview_trip(user.clone(), pickup, destination).await.unwrap();

    assert_eq!(preview.route.distance, 1000.0);
    assert_eq!(preview.route.duration, 120.0);

    let prices: Vec<(Package, i64)> = preview
        .fares
        .iter()
        .map(|fare| (fare.package, fare.total_price_in_cents))
        .collect();
    assert_eq!(prices, vec![(Package::Sedan, 216), (Package::Suv, 316)]);
    assert_eq!(offers.len().await, 2);

    let sedan = preview.fares[0].clone();
    let trip = engine.create_trip(user.clone(), sedan.id).await.unwrap();

    assert_eq!(trip.status.name(), "pending");
    assert_eq!(trip.user_id, "rider-1");
    assert_eq!(trip.selected_fare.package.slug(), "sedan");
    assert_eq!(trip.selected_fare.total_price_in_cents, 216);
    assert_eq!(trip.driver_id, None);

    assert_eq!(
        engine.create_trip(user.clone(), sedan.id).await,
        Err(Error::FareAlreadyCommitted)
    );

    // the sibling offer from the same preview is still open
    let suv = engine.find_fare(user.clone(), preview.fares[1].id).await.unwrap();
    assert_eq!(suv.status, FareStatus::Open);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_commits_yield_exactly_one_trip() {
    let (engine, _) = engine_with(two_package_config(), fixed_route());
    let engine = Arc::new(engine);
    let (pickup, destination) = berlin();

    let preview = engine
        .preview_trip(User::new("rider-1"), pickup, destination)
        .await
        .unwrap();
    let fare_id = preview.fares[0].id;

    let attempts = 16;
    let handles: Vec<_> = (0..attempts)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.create_trip(User::new("rider-1"), fare_id).await })
        })
        .collect();

    let mut trips = vec![];
    let mut rejected = 0;

    for result in futures::future::join_all(handles).await {
        match result.unwrap() {
            Ok(trip) => trips.push(trip),
            Err(Error::FareAlreadyCommitted) => rejected += 1,
            Err(err) => panic!("unexpected error: {}", err),
        }
    }

    assert_eq!(trips.len(), 1);
    assert_eq!(rejected, attempts - 1);

    let committed = engine.find_fare(User::new("rider-1"), fare_id).await.unwrap();
    assert_eq!(committed.status, FareStatus::Committed { trip_id: trips[0].id });
}

#[tokio::test]
async fn routing_failure_creates_no_offers() {
    let (engine, offers) = engine_with(two_package_config(), Arc::new(FailingRoute));
    let (pickup, destination) = berlin();

    let err = engine
        .preview_trip(User::new("rider-1"), pickup, destination)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RoutingUnavailable(_)));
    assert_eq!(offers.len().await, 0);
}

#[tokio::test]
async fn slow_routing_times_out() {
    let config = EngineConfig {
        routing_timeout: Duration::from_millis(20),
        ..two_package_config()
    };
    let (engine, offers) = engine_with(config, Arc::new(HangingRoute));
    let (pickup, destination) = berlin();

    let err = engine
        .preview_trip(User::new("rider-1"), pickup, destination)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RoutingUnavailable(_)));
    assert_eq!(offers.len().await, 0);
}

#[tokio::test]
async fn cancelled_preview_writes_nothing() {
    let (engine, offers) = engine_with(two_package_config(), Arc::new(HangingRoute));
    let (pickup, destination) = berlin();

    let outcome = tokio::time::timeout(
        Duration::from_millis(20),
        engine.preview_trip(User::new("rider-1"), pickup, destination),
    )
    .await;

    assert!(outcome.is_err());
    assert_eq!(offers.len().await, 0);
}

#[tokio::test]
async fn storage_failure_mid_preview_keeps_earlier_offers() {
    let store = Arc::new(FlakyOfferStore {
        inner: MemoryOfferStore::new(),
        writes: AtomicUsize::new(0),
        fail_on: 3,
    });

    let engine = Engine::new(
        EngineConfig::default(),
        fixed_route(),
        store.clone(),
        Arc::new(MemoryTripStore::new()),
    )
    .unwrap();
    let (pickup, destination) = berlin();

    let err = engine
        .preview_trip(User::new("rider-1"), pickup, destination)
        .await
        .unwrap_err();

    assert_eq!(err, Error::Storage("disk full".into()));
    assert_eq!(store.inner.len().await, 2);
}

#[tokio::test]
async fn expired_offers_cannot_be_committed() {
    let config = EngineConfig {
        fare_ttl: chrono::Duration::milliseconds(1),
        ..two_package_config()
    };
    let (engine, _) = engine_with(config, fixed_route());
    let (pickup, destination) = berlin();
    let user = User::new("rider-1");

    let preview = engine.preview_trip(user.clone(), pickup, destination).await.unwrap();

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(
        engine.create_trip(user.clone(), preview.fares[0].id).await,
        Err(Error::FareExpired)
    );
    assert_eq!(
        engine.create_trip(User::new("rider-2"), preview.fares[0].id).await,
        Err(Error::FareExpired)
    );

    // expiry is derived, the stored offer never changes
    let stored = engine.find_fare(user, preview.fares[0].id).await.unwrap();
    assert_eq!(stored.status, FareStatus::Open);
}

#[tokio::test]
async fn offers_belong_to_the_previewing_user() {
    let (engine, _) = engine_with(two_package_config(), fixed_route());
    let (pickup, destination) = berlin();

    let preview = engine
        .preview_trip(User::new("rider-1"), pickup, destination)
        .await
        .unwrap();
    let fare_id = preview.fares[0].id;

    assert_eq!(
        engine.create_trip(User::new("rider-2"), fare_id).await,
        Err(Error::NotAuthorized)
    );

    // the rejected attempt left the offer open for its owner
    assert!(engine.create_trip(User::new("rider-1"), fare_id).await.is_ok());
}

#[tokio::test]
async fn unknown_offers_are_not_found() {
    let (engine, _) = engine_with(two_package_config(), fixed_route());

    assert_eq!(
        engine.create_trip(User::new("rider-1"), Uuid::new_v4()).await,
        Err(Error::FareNotFound)
    );
}

#[tokio::test]
async fn failed_trip_write_leaves_the_offer_committed() {
    let engine = Engine::new(
        two_package_config(),
        fixed_route(),
        Arc::new(MemoryOfferStore::new()),
        Arc::new(UnwritableTripStore),
    )
    .unwrap();
    let (pickup, destination) = berlin();
    let user = User::new("rider-1");

    let preview = engine.preview_trip(user.clone(), pickup, destination).await.unwrap();
    let fare_id = preview.fares[0].id;

    assert_eq!(
        engine.create_trip(user.clone(), fare_id).await,
        Err(Error::Storage("read-only replica".into()))
    );

    let offer = engine.find_fare(user.clone(), fare_id).await.unwrap();
    assert!(offer.is_committed());
    assert_eq!(
        engine.create_trip(user, fare_id).await,
        Err(Error::FareAlreadyCommitted)
    );
}
