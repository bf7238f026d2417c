use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::FareOffer;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, PolarClass)]
pub struct Trip {
    pub id: Uuid,
    #[polar(attribute)]
    pub user_id: String,
    pub status: Status,
    pub selected_fare: FareOffer,
    pub driver_id: Option<String>,
}

/// Later dispatch stages (driver assignment, completion) belong to a
/// separate subsystem and are not modelled here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Status {
    Pending,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Pending => "pending".into(),
        }
    }
}

impl Trip {
    pub fn new(user_id: String, selected_fare: FareOffer) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            status: Status::Pending,
            selected_fare,
            driver_id: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, Status::Pending)
    }
}
