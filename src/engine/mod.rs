mod fare_api;
mod trip_api;

use oso::Oso;

use crate::{
    api::API,
    auth::authorizor,
    config::EngineConfig,
    error::Error,
    external::DynRoutingClient,
    store::{DynOfferStore, DynTripStore},
};

/// The negotiation engine. Holds no request state of its own; offers and
/// trips live in the injected stores.
pub struct Engine {
    config: EngineConfig,
    routing: DynRoutingClient,
    offers: DynOfferStore,
    trips: DynTripStore,
    authorizor: Oso,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(
        config: EngineConfig,
        routing: DynRoutingClient,
        offers: DynOfferStore,
        trips: DynTripStore,
    ) -> Result<Self, Error> {
        Ok(Self {
            config,
            routing,
            offers,
            trips,
            authorizor: authorizor::new()?,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Engine {
    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar,
        Resource: oso::ToPolar,
    {
        if self.authorizor.is_allowed(actor, action, resource)? {
            return Ok(());
        }

        Err(Error::NotAuthorized)
    }
}

impl API for Engine {}

#[cfg(test)]
fn test_engine(config: EngineConfig) -> (Engine, std::sync::Arc<crate::store::MemoryOfferStore>) {
    use crate::external::straight_line::StraightLineClient;
    use crate::store::{MemoryOfferStore, MemoryTripStore};
    use std::sync::Arc;

    let offers = Arc::new(MemoryOfferStore::new());

    let engine = Engine::new(
        config,
        Arc::new(StraightLineClient::default()),
        offers.clone(),
        Arc::new(MemoryTripStore::new()),
    )
    .unwrap();

    (engine, offers)
}
