use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Coordinates, FareOffer, Trip, TripPreview};
use crate::error::Error;

#[async_trait]
pub trait FareAPI {
    /// Routes pickup to destination, prices every catalog package and
    /// persists one offer per package owned by `user`.
    async fn preview_trip(
        &self,
        user: User,
        pickup: Coordinates,
        destination: Coordinates,
    ) -> Result<TripPreview, Error>;

    async fn find_fare(&self, user: User, id: Uuid) -> Result<FareOffer, Error>;
}

#[async_trait]
pub trait TripAPI {
    /// Promotes an owned, unexpired, uncommitted offer into a pending trip.
    async fn create_trip(&self, user: User, fare_id: Uuid) -> Result<Trip, Error>;

    async fn find_trip(&self, user: User, id: Uuid) -> Result<Trip, Error>;
}

pub trait API: FareAPI + TripAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
