use oso::{Oso, PolarClass};

use crate::auth::User;
use crate::entities::{FareOffer, Trip};
use crate::error::Error;

pub fn new() -> Result<Oso, Error> {
    let mut o = Oso::new();

    o.register_class(User::get_polar_class())?;
    o.register_class(FareOffer::get_polar_class())?;
    o.register_class(Trip::get_polar_class())?;

    o.load_str(include_str!("rules.polar"))?;

    Ok(o)
}

#[test]
fn offer_owner_may_read_and_commit() {
    use crate::entities::test_offer;
    use chrono::Duration;

    let authorizor = new().unwrap();

    let owner = User::new("u1");
    let offer = test_offer("u1", Duration::minutes(10));

    let result = authorizor.query_rule("has_role", (owner.clone(), "owner", offer.clone()));
    assert!(result.unwrap().next().unwrap().is_ok());

    assert!(authorizor.is_allowed(owner.clone(), "read", offer.clone()).unwrap());
    assert!(authorizor.is_allowed(owner.clone(), "commit", offer.clone()).unwrap());
}

#[test]
fn strangers_may_not_touch_an_offer() {
    use crate::entities::test_offer;
    use chrono::Duration;

    let authorizor = new().unwrap();

    let stranger = User::new("u2");
    let offer = test_offer("u1", Duration::minutes(10));

    let result = authorizor.query_rule("has_role", (stranger.clone(), "owner", offer.clone()));
    assert!(result.unwrap().next().is_none());

    assert!(!authorizor.is_allowed(stranger.clone(), "read", offer.clone()).unwrap());
    assert!(!authorizor.is_allowed(stranger.clone(), "commit", offer.clone()).unwrap());
}

#[test]
fn only_the_trip_owner_may_read_a_trip() {
    use crate::entities::test_offer;
    use chrono::Duration;

    let authorizor = new().unwrap();

    let trip = Trip::new("u1".into(), test_offer("u1", Duration::minutes(10)));

    assert!(authorizor.is_allowed(User::new("u1"), "read", trip.clone()).unwrap());
    assert!(!authorizor.is_allowed(User::new("u2"), "read", trip.clone()).unwrap());
    assert!(!authorizor.is_allowed(User::new("u1"), "commit", trip.clone()).unwrap());
}
