use axum::extract::{Extension, Json, Path, Query};
use serde::{Deserialize, Serialize};

use crate::api::DynAPI;
use crate::auth::User;
use crate::entities::FareOffer;
use crate::error::Error;
use crate::server::parse_id;

#[derive(Serialize, Deserialize)]
pub struct FindParams {
    #[serde(rename = "userID")]
    pub user_id: String,
}

/// Wire shape of a fare offer. Prices travel as a plain number of minor units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RideFare {
    pub id: String,
    #[serde(rename = "packageSlug")]
    pub package_slug: String,
    #[serde(rename = "totalPriceInCents")]
    pub total_price_in_cents: f64,
}

impl From<&FareOffer> for RideFare {
    fn from(offer: &FareOffer) -> Self {
        Self {
            id: offer.id.to_string(),
            package_slug: offer.package.slug().into(),
            total_price_in_cents: offer.total_price_in_cents as f64,
        }
    }
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<String>,
    Query(params): Query<FindParams>,
) -> Result<Json<RideFare>, Error> {
    let fare = api
        .find_fare(User::new(params.user_id), parse_id(&id, "fare")?)
        .await?;

    Ok(Json(RideFare::from(&fare)))
}
