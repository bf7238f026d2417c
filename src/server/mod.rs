mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::api::{DynAPI, API};
use crate::error::Error;
use crate::server::handlers::{fares, trips};

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/trips/preview", post(trips::preview))
        .route("/trips", post(trips::create))
        .route("/trips/:id", get(trips::find))
        .route("/fares/:id", get(fares::find))
        .layer(Extension(api))
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let app = router(Arc::new(api) as DynAPI);

    tracing::info!("listening on {}", addr);

    axum::Server::try_bind(&addr)
        .map_err(|err| Error::Unexpected(err.to_string()))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| Error::Unexpected(err.to_string()))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
        return;
    }

    tracing::info!("shutting down");
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw.trim()).map_err(|_| Error::InvalidRequest(format!("malformed {} id", what)))
}

#[test]
fn malformed_ids_are_invalid_requests() {
    assert!(parse_id("8f2b1e0e-62a4-4d4e-9c1a-6f0f3b9f4a11", "fare").is_ok());
    assert_eq!(
        parse_id("123", "fare"),
        Err(Error::InvalidRequest("malformed fare id".into()))
    );
}
