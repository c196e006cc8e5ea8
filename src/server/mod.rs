//! HTTP surface.
//!
//! Every route delegates to [`Services`]; handlers only translate between
//! the wire shapes and the service types. Failures render through
//! [`ApiError`].

pub mod error;
mod routes;

use std::net::SocketAddr;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post, put};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::services::Services;

pub use error::ApiError;

/// Build the application router.
pub fn router(services: Services) -> Router {
    let max_body_bytes = services.config().server.max_body_bytes;

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/generate-code", post(routes::generate_code))
        .route("/api/review-code", post(routes::review_code))
        .route("/api/generate-docs", post(routes::generate_docs))
        .route("/api/chat", post(routes::chat))
        .route("/api/create-sandbox", post(routes::create_sandbox))
        .route(
            "/api/sessions/{id}",
            get(routes::get_session).delete(routes::delete_session),
        )
        .route("/api/sessions/{id}/nodes", put(routes::put_nodes))
        .route(
            "/api/sessions/{id}/customizations",
            patch(routes::patch_customizations),
        )
        .with_state(services)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until Ctrl-C.
pub async fn serve(services: Services, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(services);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
