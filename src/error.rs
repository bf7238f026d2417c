use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use thiserror::Error;

/// Every failure the engine and its collaborators can surface.
///
/// Codes `1..=99` are internal failures whose text never leaves the server;
/// codes from `100` up are definitive answers the caller can act on.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error("environment error: {0}")]
    Environment(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("routing unavailable: {0}")]
    RoutingUnavailable(String),

    #[error("authorization engine error: {0}")]
    Authorization(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("fare not found")]
    FareNotFound,

    #[error("fare expired")]
    FareExpired,

    #[error("fare already committed")]
    FareAlreadyCommitted,

    #[error("not authorized")]
    NotAuthorized,

    #[error("trip not found")]
    TripNotFound,
}

impl Error {
    pub fn code(&self) -> i32 {
        match self {
            Self::Environment(_) => 1,
            Self::Storage(_) => 2,
            Self::RoutingUnavailable(_) => 3,
            Self::Authorization(_) => 4,
            Self::Unexpected(_) => 5,
            Self::InvalidRequest(_) => 100,
            Self::FareNotFound => 101,
            Self::FareExpired => 102,
            Self::FareAlreadyCommitted => 103,
            Self::NotAuthorized => 104,
            Self::TripNotFound => 105,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.code(), 1..=99)
    }

    /// Name of the RPC status this error maps to at the façade boundary.
    pub fn rpc_status(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) | Self::FareExpired | Self::FareAlreadyCommitted => {
                "INVALID_ARGUMENT"
            }
            Self::NotAuthorized => "PERMISSION_DENIED",
            Self::FareNotFound | Self::TripNotFound => "NOT_FOUND",
            _ => "INTERNAL",
        }
    }

    /// Text safe to hand to an untrusted caller.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            return "Internal Server Error".into();
        }

        self.to_string()
    }

    pub fn status_code(&self) -> StatusCode {
        match self.rpc_status() {
            "INVALID_ARGUMENT" => StatusCode::BAD_REQUEST,
            "PERMISSION_DENIED" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        Self::Environment(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::RoutingUnavailable(err.to_string())
    }
}

impl From<oso::OsoError> for Error {
    fn from(err: oso::OsoError) -> Self {
        Self::Authorization(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.is_internal() {
            tracing::error!(code = self.code(), "request failed: {}", self);
        }

        let body = Json(json!({
            "code": self.code(),
            "status": self.rpc_status(),
            "error": self.public_message(),
        }));

        (self.status_code(), body).into_response()
    }
}

#[test]
fn internal_errors_are_grouped_below_one_hundred() {
    assert!(Error::Storage("disk".into()).is_internal());
    assert!(Error::RoutingUnavailable("timeout".into()).is_internal());
    assert!(!Error::FareExpired.is_internal());
    assert!(!Error::InvalidRequest("user id is required".into()).is_internal());
}

#[test]
fn commit_rejections_map_to_distinct_rpc_statuses() {
    assert_eq!(Error::NotAuthorized.rpc_status(), "PERMISSION_DENIED");
    assert_eq!(Error::FareExpired.rpc_status(), "INVALID_ARGUMENT");
    assert_eq!(Error::FareAlreadyCommitted.rpc_status(), "INVALID_ARGUMENT");
    assert_eq!(Error::FareNotFound.rpc_status(), "NOT_FOUND");
    assert_eq!(
        Error::RoutingUnavailable("down".into()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn internal_error_text_is_not_rendered() {
    let err = Error::Storage("connection refused at 10.0.0.3".into());
    assert_eq!(err.public_message(), "Internal Server Error");

    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(Error::FareExpired.public_message(), "fare expired");
}
