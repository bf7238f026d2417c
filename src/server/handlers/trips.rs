use std::sync::Arc;

use axum::extract::{Extension, Json, Path, Query};
use serde::{Deserialize, Serialize};

use super::fares::{FindParams, RideFare};
use crate::api::DynAPI;
use crate::auth::User;
use crate::entities::{Coordinates, Route, Trip};
use crate::error::Error;
use crate::server::parse_id;

#[derive(Serialize, Deserialize)]
pub struct PreviewParams {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub pickup: Coordinates,
    pub destination: Coordinates,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub route: Arc<Route>,
    #[serde(rename = "fareOffers")]
    pub fare_offers: Vec<RideFare>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "fareOfferID", alias = "rideFareID")]
    pub fare_offer_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateResponse {
    #[serde(rename = "tripID")]
    pub trip_id: String,
    pub trip: TripView,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripView {
    pub id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    pub status: String,
    #[serde(rename = "selectedFare")]
    pub selected_fare: RideFare,
}

impl From<&Trip> for TripView {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id.to_string(),
            user_id: trip.user_id.clone(),
            status: trip.status.name(),
            selected_fare: RideFare::from(&trip.selected_fare),
        }
    }
}

#[axum_macros::debug_handler]
pub async fn preview(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<PreviewParams>,
) -> Result<Json<PreviewResponse>, Error> {
    let preview = api
        .preview_trip(User::new(params.user_id), params.pickup, params.destination)
        .await?;

    Ok(Json(PreviewResponse {
        fare_offers: preview.fares.iter().map(RideFare::from).collect(),
        route: preview.route,
    }))
}

#[axum_macros::debug_handler]
pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<CreateParams>,
) -> Result<Json<CreateResponse>, Error> {
    let fare_id = parse_id(&params.fare_offer_id, "fare offer")?;
    let trip = api.create_trip(User::new(params.user_id), fare_id).await?;

    Ok(Json(CreateResponse {
        trip_id: trip.id.to_string(),
        trip: TripView::from(&trip),
    }))
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<String>,
    Query(params): Query<FindParams>,
) -> Result<Json<TripView>, Error> {
    let trip = api
        .find_trip(User::new(params.user_id), parse_id(&id, "trip")?)
        .await?;

    Ok(Json(TripView::from(&trip)))
}

#[cfg(test)]
fn test_api() -> DynAPI {
    use crate::config::EngineConfig;
    use crate::engine::Engine;
    use crate::external::straight_line::StraightLineClient;
    use crate::store::{MemoryOfferStore, MemoryTripStore};

    let engine = Engine::new(
        EngineConfig::default(),
        Arc::new(StraightLineClient::default()),
        Arc::new(MemoryOfferStore::new()),
        Arc::new(MemoryTripStore::new()),
    )
    .unwrap();

    Arc::new(engine)
}

#[tokio::test]
async fn preview_then_create_over_the_wire_schema() {
    let api = test_api();

    let params: PreviewParams = serde_json::from_value(serde_json::json!({
        "userID": "u1",
        "pickup": { "latitude": 0.0, "longitude": 0.0 },
        "destination": { "latitude": 0.01, "longitude": 0.01 }
    }))
    .unwrap();

    let Json(preview) = preview(Extension(api.clone()), Json(params)).await.unwrap();
    assert_eq!(preview.fare_offers.len(), 4);
    assert_eq!(preview.fare_offers[0].package_slug, "sedan");

    let body = serde_json::to_value(&preview).unwrap();
    assert!(body["fareOffers"][0]["totalPriceInCents"].is_f64());
    assert!(body["route"]["distance"].is_f64());

    let params: CreateParams = serde_json::from_value(serde_json::json!({
        "userID": "u1",
        "rideFareID": preview.fare_offers[0].id
    }))
    .unwrap();

    let Json(created) = create(Extension(api.clone()), Json(params)).await.unwrap();
    assert_eq!(created.trip.id, created.trip_id);
    assert_eq!(created.trip.status, "pending");
    assert_eq!(created.trip.user_id, "u1");
    assert_eq!(created.trip.selected_fare, preview.fare_offers[0]);

    let Json(found) = find(
        Extension(api.clone()),
        Path(created.trip_id.clone()),
        Query(FindParams {
            user_id: "u1".into(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(found, created.trip);
}

#[tokio::test]
async fn wire_errors_keep_their_kind() {
    let api = test_api();

    let params = CreateParams {
        user_id: "u1".into(),
        fare_offer_id: "not-a-uuid".into(),
    };
    let err = create(Extension(api.clone()), Json(params)).await.unwrap_err();
    assert_eq!(err.rpc_status(), "INVALID_ARGUMENT");

    let params = CreateParams {
        user_id: "u1".into(),
        fare_offer_id: uuid::Uuid::new_v4().to_string(),
    };
    let err = create(Extension(api.clone()), Json(params)).await.unwrap_err();
    assert_eq!(err, Error::FareNotFound);
}
