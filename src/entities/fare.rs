use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Package, Route};
use crate::error::Error;

/// A priced quote for one package against one route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, PolarClass)]
pub struct FareOffer {
    pub id: Uuid,
    #[polar(attribute)]
    pub user_id: String,
    pub package: Package,
    pub total_price_in_cents: i64,
    pub route: Arc<Route>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: Status,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Status {
    Open,
    Committed { trip_id: Uuid },
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Open => "open".into(),
            Self::Committed { trip_id: _ } => "committed".into(),
        }
    }
}

impl FareOffer {
    pub fn new(
        user_id: String,
        package: Package,
        total_price_in_cents: i64,
        route: Arc<Route>,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, Error> {
        let expires_at = created_at
            .checked_add_signed(ttl)
            .ok_or_else(|| Error::Environment(format!("fare ttl {} overflows expiry", ttl)))?;

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            package,
            total_price_in_cents,
            route,
            created_at,
            expires_at,
            status: Status::Open,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_committed(&self) -> bool {
        matches!(self.status, Status::Committed { trip_id: _ })
    }

    /// The only mutation an offer ever sees.
    #[tracing::instrument(skip(self), fields(id = %self.id))]
    pub fn commit(&mut self, trip_id: Uuid) -> Result<(), Error> {
        match self.status {
            Status::Open => {
                self.status = Status::Committed { trip_id };
                Ok(())
            }
            _ => Err(Error::FareAlreadyCommitted),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_offer(user_id: &str, ttl: Duration) -> FareOffer {
    use crate::entities::Coordinates;

    let route = Route::new(
        vec![Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 1.0)],
        1000.0,
        120.0,
    );

    FareOffer::new(user_id.into(), Package::Sedan, 216, Arc::new(route), Utc::now(), ttl).unwrap()
}

#[test]
fn offer_expires_after_its_ttl() {
    let offer = test_offer("u1", Duration::minutes(10));

    assert_eq!(offer.expires_at - offer.created_at, Duration::minutes(10));
    assert!(!offer.is_expired_at(offer.created_at));
    assert!(!offer.is_expired_at(offer.expires_at));
    assert!(offer.is_expired_at(offer.expires_at + Duration::milliseconds(1)));
}

#[test]
fn offer_commits_only_once() {
    let mut offer = test_offer("u1", Duration::minutes(10));
    let trip_id = Uuid::new_v4();

    assert_eq!(offer.status.name(), "open");
    offer.commit(trip_id).unwrap();

    assert!(offer.is_committed());
    assert_eq!(offer.status, Status::Committed { trip_id });
    assert_eq!(offer.commit(Uuid::new_v4()), Err(Error::FareAlreadyCommitted));
    assert_eq!(offer.status, Status::Committed { trip_id });
}

#[test]
fn unrepresentable_expiry_is_an_error() {
    let route = Arc::new(Route::new(vec![], 0.0, 0.0));

    let result = FareOffer::new("u1".into(), Package::Sedan, 200, route, Utc::now(), Duration::max_value());

    assert!(matches!(result, Err(Error::Environment(_))));
}
