use super::Engine;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::FareAPI,
    auth::User,
    entities::{Coordinates, FareOffer, Route, TripPreview},
    error::Error,
    pricing,
};

#[async_trait]
impl FareAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn preview_trip(
        &self,
        user: User,
        pickup: Coordinates,
        destination: Coordinates,
    ) -> Result<TripPreview, Error> {
        user.validate()?;
        pickup.validate("pickup")?;
        destination.validate("destination")?;

        let route = Arc::new(self.route_between(pickup, destination).await?);

        let estimates = pricing::estimate(&route, &self.config.catalog, &self.config.pricing);
        let created_at = Utc::now();

        let mut fares = Vec::with_capacity(estimates.len());

        for estimate in estimates {
            let offer = FareOffer::new(
                user.id.clone(),
                estimate.package,
                estimate.total_price_in_cents,
                route.clone(),
                created_at,
                self.config.fare_ttl,
            )?;

            // offers already written stay written, there is no multi-offer transaction
            if let Err(err) = self.offers.create_offer(offer.clone()).await {
                tracing::warn!(
                    persisted = fares.len(),
                    "failed to persist fare offer, aborting preview: {}",
                    err
                );
                return Err(err);
            }

            fares.push(offer);
        }

        tracing::info!(count = fares.len(), "persisted fare offers");

        Ok(TripPreview { route, fares })
    }

    #[tracing::instrument(skip(self))]
    async fn find_fare(&self, user: User, id: Uuid) -> Result<FareOffer, Error> {
        user.validate()?;

        let offer = self.offers.find_offer(id).await?;

        self.authorize(user, "read", offer.clone())?;

        Ok(offer)
    }
}

impl Engine {
    /// One bounded attempt against the routing provider.
    async fn route_between(&self, pickup: Coordinates, destination: Coordinates) -> Result<Route, Error> {
        let attempt = self.routing.find_route(pickup, destination);

        let result = match tokio::time::timeout(self.config.routing_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(Error::RoutingUnavailable(format!(
                "no route within {:?}",
                self.config.routing_timeout
            ))),
        };

        if let Err(err) = &result {
            tracing::warn!("routing failed, no offers created: {}", err);
        }

        result
    }
}

#[tokio::test]
async fn preview_creates_one_offer_per_package() {
    use crate::config::EngineConfig;
    use crate::entities::Package;

    let (engine, offers) = super::test_engine(EngineConfig::default());

    let preview = engine
        .preview_trip(
            User::new("u1"),
            Coordinates::new(52.52, 13.40),
            Coordinates::new(52.50, 13.45),
        )
        .await
        .unwrap();

    let packages: Vec<Package> = preview.fares.iter().map(|fare| fare.package).collect();
    assert_eq!(
        packages,
        vec![Package::Sedan, Package::Suv, Package::Van, Package::Luxury]
    );

    for fare in preview.fares.iter() {
        assert_eq!(fare.user_id, "u1");
        assert!(Arc::ptr_eq(&fare.route, &preview.route));
        assert!(!fare.is_committed());
        assert_eq!(fare.expires_at - fare.created_at, engine.config().fare_ttl);
    }

    assert_eq!(offers.len().await, 4);
}

#[tokio::test]
async fn preview_rejects_malformed_input_before_routing() {
    use crate::config::EngineConfig;

    let (engine, offers) = super::test_engine(EngineConfig::default());

    let err = engine
        .preview_trip(User::new(""), Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 1.0))
        .await
        .unwrap_err();
    assert_eq!(err, Error::InvalidRequest("user id is required".into()));

    let err = engine
        .preview_trip(User::new("u1"), Coordinates::new(0.0, 0.0), Coordinates::new(91.0, 1.0))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Error::InvalidRequest("destination is not a valid coordinate".into())
    );

    assert_eq!(offers.len().await, 0);
}

#[tokio::test]
async fn fares_are_only_visible_to_their_owner() {
    use crate::config::EngineConfig;

    let (engine, _) = super::test_engine(EngineConfig::default());

    let preview = engine
        .preview_trip(User::new("u1"), Coordinates::new(0.0, 0.0), Coordinates::new(0.1, 0.1))
        .await
        .unwrap();
    let id = preview.fares[0].id;

    assert_eq!(engine.find_fare(User::new("u1"), id).await.unwrap(), preview.fares[0]);
    assert_eq!(engine.find_fare(User::new("u2"), id).await, Err(Error::NotAuthorized));
    assert_eq!(
        engine.find_fare(User::new("u1"), Uuid::new_v4()).await,
        Err(Error::FareNotFound)
    );
}

#[tokio::test]
async fn unrepresentable_fare_ttl_fails_preview_without_writes() {
    use crate::config::EngineConfig;

    let (engine, offers) = super::test_engine(EngineConfig {
        fare_ttl: chrono::Duration::max_value(),
        ..EngineConfig::default()
    });

    let err = engine
        .preview_trip(User::new("u1"), Coordinates::new(0.0, 0.0), Coordinates::new(0.1, 0.1))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Environment(_)));
    assert_eq!(offers.len().await, 0);
}
