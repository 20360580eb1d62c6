pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use axum::routing::{get, post, put};
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
        .route("/api/health", get(routes::health::health))
        // Board, stages, custom fields
        .route("/api/workspaces/{ws}/board", get(routes::stages::get_board))
        .route("/api/workspaces/{ws}/stages", get(routes::stages::list_stages))
        .route(
            "/api/workspaces/{ws}/stages/{id}/required-fields",
            put(routes::stages::put_required_fields),
        )
        .route(
            "/api/workspaces/{ws}/custom-fields",
            get(routes::stages::list_custom_fields),
        )
        // Leads
        .route(
            "/api/workspaces/{ws}/leads",
            get(routes::leads::list_leads).post(routes::leads::create_lead),
        )
        .route(
            "/api/workspaces/{ws}/leads/{id}",
            get(routes::leads::get_lead).patch(routes::leads::update_lead),
        )
        .route(
            "/api/workspaces/{ws}/leads/{id}/move",
            post(routes::leads::move_lead),
        )
        .route(
            "/api/workspaces/{ws}/leads/{id}/activity",
            get(routes::leads::list_activity),
        )
        .route(
            "/api/workspaces/{ws}/leads/{id}/messages",
            get(routes::leads::list_messages),
        )
        // Campaigns
        .route(
            "/api/workspaces/{ws}/campaigns",
            get(routes::campaigns::list_campaigns).post(routes::campaigns::create_campaign),
        )
        .route(
            "/api/workspaces/{ws}/campaigns/{id}",
            get(routes::campaigns::get_campaign).put(routes::campaigns::update_campaign),
        )
        .route(
            "/api/workspaces/{ws}/leads/{id}/messages/{message_id}/sent",
            post(routes::messages::mark_sent),
        )
        // Functions
        .route(
            "/functions/v1/generate-message",
            post(routes::functions::generate_message),
        )
        .route(
            "/functions/v1/auto-generate",
            post(routes::functions::auto_generate),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the leadflow API server on `host:port`.
pub async fn serve(app_state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(app_state, listener).await
}

/// Start the server on a pre-bound listener.
///
/// Lets the caller read the actual port before starting (useful when
/// `port = 0` and the OS picks a free port).
pub async fn serve_on(
    app_state: AppState,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    let app = build_router(app_state);

    tracing::info!("leadflow API listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
