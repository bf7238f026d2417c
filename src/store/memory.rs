use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OfferStore, TripStore};
use crate::entities::{FareOffer, Trip};
use crate::error::Error;

struct Table<T> {
    rows: RwLock<HashMap<Uuid, T>>,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    async fn insert(&self, id: Uuid, row: T) -> Result<Uuid, Error> {
        match self.rows.write().await.entry(id) {
            Entry::Occupied(_) => Err(Error::Storage(format!("duplicate key {}", id))),
            Entry::Vacant(entry) => {
                entry.insert(row);
                Ok(id)
            }
        }
    }

    async fn get(&self, id: &Uuid) -> Option<T> {
        self.rows.read().await.get(id).cloned()
    }

    async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

pub struct MemoryOfferStore {
    offers: Table<FareOffer>,
}

impl MemoryOfferStore {
    pub fn new() -> Self {
        Self {
            offers: Table::new(),
        }
    }

    pub async fn len(&self) -> usize {
        self.offers.len().await
    }
}

impl Default for MemoryOfferStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OfferStore for MemoryOfferStore {
    #[tracing::instrument(skip(self, offer), fields(id = %offer.id))]
    async fn create_offer(&self, offer: FareOffer) -> Result<Uuid, Error> {
        self.offers.insert(offer.id, offer).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_offer(&self, id: Uuid) -> Result<FareOffer, Error> {
        self.offers.get(&id).await.ok_or(Error::FareNotFound)
    }

    #[tracing::instrument(skip(self))]
    async fn try_commit_offer(&self, id: Uuid, trip_id: Uuid) -> Result<bool, Error> {
        // the write guard spans the check and the transition
        let mut offers = self.offers.rows.write().await;
        let offer = offers.get_mut(&id).ok_or(Error::FareNotFound)?;

        match offer.commit(trip_id) {
            Ok(()) => Ok(true),
            Err(Error::FareAlreadyCommitted) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

pub struct MemoryTripStore {
    trips: Table<Trip>,
}

impl MemoryTripStore {
    pub fn new() -> Self {
        Self {
            trips: Table::new(),
        }
    }

    pub async fn len(&self) -> usize {
        self.trips.len().await
    }
}

impl Default for MemoryTripStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TripStore for MemoryTripStore {
    #[tracing::instrument(skip(self, trip), fields(id = %trip.id))]
    async fn create_trip(&self, trip: Trip) -> Result<Uuid, Error> {
        self.trips.insert(trip.id, trip).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_trip(&self, id: Uuid) -> Result<Trip, Error> {
        self.trips.get(&id).await.ok_or(Error::TripNotFound)
    }
}

#[tokio::test]
async fn offers_are_write_once() {
    use crate::entities::test_offer;
    use chrono::Duration;

    let store = MemoryOfferStore::new();
    let offer = test_offer("u1", Duration::minutes(10));

    let id = store.create_offer(offer.clone()).await.unwrap();
    assert_eq!(id, offer.id);
    assert_eq!(store.find_offer(id).await.unwrap(), offer);

    let err = store.create_offer(offer.clone()).await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
    assert_eq!(store.len().await, 1);

    assert_eq!(store.find_offer(Uuid::new_v4()).await, Err(Error::FareNotFound));
}

#[tokio::test]
async fn try_commit_flips_an_offer_once() {
    use crate::entities::{test_offer, FareStatus};
    use chrono::Duration;

    let store = MemoryOfferStore::new();
    let id = store
        .create_offer(test_offer("u1", Duration::minutes(10)))
        .await
        .unwrap();
    let trip_id = Uuid::new_v4();

    assert!(store.try_commit_offer(id, trip_id).await.unwrap());
    assert!(!store.try_commit_offer(id, Uuid::new_v4()).await.unwrap());

    let offer = store.find_offer(id).await.unwrap();
    assert_eq!(offer.status, FareStatus::Committed { trip_id });

    assert_eq!(
        store.try_commit_offer(Uuid::new_v4(), trip_id).await,
        Err(Error::FareNotFound)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_try_commit_has_one_winner() {
    use crate::entities::test_offer;
    use chrono::Duration;
    use std::sync::Arc;

    let store = Arc::new(MemoryOfferStore::new());
    let id = store
        .create_offer(test_offer("u1", Duration::minutes(10)))
        .await
        .unwrap();

    let attempts = (0..32).map(|_| {
        let store = store.clone();
        tokio::spawn(async move { store.try_commit_offer(id, Uuid::new_v4()).await })
    });

    let winners = futures::future::join_all(attempts)
        .await
        .into_iter()
        .filter(|result| *result.as_ref().unwrap().as_ref().unwrap())
        .count();

    assert_eq!(winners, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_never_lose_writes() {
    use crate::entities::test_offer;
    use chrono::Duration;
    use std::sync::Arc;

    let store = Arc::new(MemoryOfferStore::new());

    let writers = (0..64).map(|_| {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .create_offer(test_offer("u1", Duration::minutes(10)))
                .await
        })
    });

    for result in futures::future::join_all(writers).await {
        result.unwrap().unwrap();
    }

    assert_eq!(store.len().await, 64);
}

#[tokio::test]
async fn trips_are_looked_up_by_id() {
    use crate::entities::test_offer;
    use chrono::Duration;

    let store = MemoryTripStore::new();
    let trip = Trip::new("u1".into(), test_offer("u1", Duration::minutes(10)));

    let id = store.create_trip(trip.clone()).await.unwrap();
    assert_eq!(store.find_trip(id).await.unwrap(), trip);
    assert_eq!(store.find_trip(Uuid::new_v4()).await, Err(Error::TripNotFound));
    assert_eq!(store.len().await, 1);
}
