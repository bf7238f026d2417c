//! Storage contracts for offers and trips.
//!
//! Implementations own the canonical copies and must be safe to share across
//! concurrent requests without any locking by the caller.

mod memory;

pub use memory::{MemoryOfferStore, MemoryTripStore};

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{FareOffer, Trip};
use crate::error::Error;

#[async_trait]
pub trait OfferStore {
    /// Persists a new offer. Fails with `Storage` if the id is already taken.
    async fn create_offer(&self, offer: FareOffer) -> Result<Uuid, Error>;

    async fn find_offer(&self, id: Uuid) -> Result<FareOffer, Error>;

    /// Atomically moves an open offer to committed. Returns `false` when the
    /// offer was already committed; concurrent callers on the same id see
    /// exactly one `true`.
    async fn try_commit_offer(&self, id: Uuid, trip_id: Uuid) -> Result<bool, Error>;
}

#[async_trait]
pub trait TripStore {
    async fn create_trip(&self, trip: Trip) -> Result<Uuid, Error>;

    async fn find_trip(&self, id: Uuid) -> Result<Trip, Error>;
}

pub type DynOfferStore = std::sync::Arc<dyn OfferStore + Send + Sync>;
pub type DynTripStore = std::sync::Arc<dyn TripStore + Send + Sync>;
