pub mod error;
pub mod owner;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health))
        // Requirements
        .route(
            "/api/requirements",
            get(routes::requirements::list_requirements)
                .post(routes::requirements::create_requirement),
        )
        .route(
            "/api/requirements/mine",
            get(routes::requirements::list_my_requirements),
        )
        .route(
            "/api/requirements/{id}",
            get(routes::requirements::get_requirement)
                .put(routes::requirements::update_requirement)
                .delete(routes::requirements::delete_requirement),
        )
        .route(
            "/api/requirements/{id}/extract",
            post(routes::requirements::extract_requirement),
        )
        .route(
            "/api/requirements/{id}/generate-ui",
            post(routes::requirements::generate_ui),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Serve the API on a pre-bound listener.
///
/// Accepting a bound `TcpListener` lets the caller read the actual port
/// before starting (useful when `port = 0` and the OS picks a free port).
pub async fn serve_on(listener: tokio::net::TcpListener, app_state: AppState) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(app_state);

    tracing::info!("RAOS API listening on http://localhost:{actual_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
