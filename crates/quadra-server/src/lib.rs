pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        .route("/api/invitations/live", get(routes::events::sse_pending))
        // Invitations
        .route(
            "/api/invitations",
            get(routes::invitations::list_pending).post(routes::invitations::create_invitation),
        )
        .route(
            "/api/invitations/{id}",
            get(routes::invitations::get_invitation),
        )
        .route(
            "/api/invitations/{id}/decision",
            post(routes::invitations::decide_invitation),
        )
        // Teams
        .route(
            "/api/teams/{team_id}/invitations",
            get(routes::invitations::team_invitations),
        )
        .route(
            "/api/teams/{team_id}/members",
            get(routes::members::list_members),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the roster API server.
pub async fn serve(app_state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(app_state, listener).await
}

/// Start the roster API server on a pre-bound listener.
///
/// Lets the caller read the actual port first (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(app_state: AppState, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(app_state);

    tracing::info!("quadra roster API listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
