use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::TripAPI,
    auth::User,
    entities::Trip,
    error::Error,
};

#[async_trait]
impl TripAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_trip(&self, user: User, fare_id: Uuid) -> Result<Trip, Error> {
        user.validate()?;

        // weak checks on a snapshot, the store's commit transition is authoritative
        let offer = self.offers.find_offer(fare_id).await?;

        // expiry answers before ownership
        if offer.is_expired_at(Utc::now()) {
            tracing::info!("fare expired at {}, rejecting commit", offer.expires_at);
            return Err(Error::FareExpired);
        }

        self.authorize(user.clone(), "commit", offer.clone())?;

        if offer.is_committed() {
            tracing::info!("fare already committed, rejecting commit");
            return Err(Error::FareAlreadyCommitted);
        }

        let mut trip = Trip::new(user.id, offer);

        // claimed before the trip is written; a failed write below leaves the offer committed
        if !self.offers.try_commit_offer(fare_id, trip.id).await? {
            tracing::info!("lost commit race for fare, rejecting commit");
            return Err(Error::FareAlreadyCommitted);
        }

        // frozen copy reflects the committed state
        trip.selected_fare.commit(trip.id)?;

        if let Err(err) = self.trips.create_trip(trip.clone()).await {
            tracing::error!(
                trip_id = %trip.id,
                "fare committed but trip could not be persisted: {}",
                err
            );
            return Err(err);
        }

        tracing::info!(trip_id = %trip.id, "created trip");

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn find_trip(&self, user: User, id: Uuid) -> Result<Trip, Error> {
        user.validate()?;

        let trip = self.trips.find_trip(id).await?;

        self.authorize(user, "read", trip.clone())?;

        Ok(trip)
    }
}

#[tokio::test]
async fn committed_fare_becomes_a_pending_trip() {
    use crate::api::FareAPI;
    use crate::config::EngineConfig;
    use crate::entities::{Coordinates, FareStatus};

    let (engine, _) = super::test_engine(EngineConfig::default());
    let user = User::new("u1");

    let preview = engine
        .preview_trip(user.clone(), Coordinates::new(0.0, 0.0), Coordinates::new(0.1, 0.1))
        .await
        .unwrap();
    let fare = preview.fares[1].clone();

    let trip = engine.create_trip(user.clone(), fare.id).await.unwrap();

    assert!(trip.is_pending());
    assert_eq!(trip.status.name(), "pending");
    assert_eq!(trip.user_id, "u1");
    assert_eq!(trip.driver_id, None);
    assert_eq!(trip.selected_fare.id, fare.id);
    assert_eq!(trip.selected_fare.package, fare.package);
    assert_eq!(
        trip.selected_fare.status,
        FareStatus::Committed { trip_id: trip.id }
    );

    assert_eq!(engine.find_trip(user.clone(), trip.id).await.unwrap(), trip);
    assert_eq!(
        engine.find_fare(user.clone(), fare.id).await.unwrap().status,
        FareStatus::Committed { trip_id: trip.id }
    );
}

#[tokio::test]
async fn expired_offers_are_expired_for_every_caller() {
    use crate::api::FareAPI;
    use crate::config::EngineConfig;
    use crate::entities::Coordinates;

    let (engine, _) = super::test_engine(EngineConfig {
        fare_ttl: chrono::Duration::zero(),
        ..EngineConfig::default()
    });

    let preview = engine
        .preview_trip(User::new("u1"), Coordinates::new(0.0, 0.0), Coordinates::new(0.1, 0.1))
        .await
        .unwrap();
    let id = preview.fares[0].id;

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    assert_eq!(engine.create_trip(User::new("u2"), id).await, Err(Error::FareExpired));
    assert_eq!(engine.create_trip(User::new("u1"), id).await, Err(Error::FareExpired));

    assert!(!engine.find_fare(User::new("u1"), id).await.unwrap().is_committed());
}

#[tokio::test]
async fn trips_are_only_visible_to_their_owner() {
    use crate::api::FareAPI;
    use crate::config::EngineConfig;
    use crate::entities::Coordinates;

    let (engine, _) = super::test_engine(EngineConfig::default());

    let preview = engine
        .preview_trip(User::new("u1"), Coordinates::new(0.0, 0.0), Coordinates::new(0.1, 0.1))
        .await
        .unwrap();
    let trip = engine
        .create_trip(User::new("u1"), preview.fares[0].id)
        .await
        .unwrap();

    assert_eq!(engine.find_trip(User::new("u2"), trip.id).await, Err(Error::NotAuthorized));
    assert_eq!(
        engine.find_trip(User::new("u1"), Uuid::new_v4()).await,
        Err(Error::TripNotFound)
    );
}
