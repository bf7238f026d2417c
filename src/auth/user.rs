use oso::PolarClass;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The caller on whose behalf an engine operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, PolarClass)]
pub struct User {
    #[polar(attribute)]
    pub id: String,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidRequest("user id is required".into()));
        }

        Ok(())
    }
}

#[test]
fn blank_user_ids_are_rejected() {
    assert!(User::new("u1").validate().is_ok());
    assert_eq!(
        User::new("  ").validate(),
        Err(Error::InvalidRequest("user id is required".into()))
    );
}
