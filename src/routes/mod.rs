/// Application routes configuration
use crate::handlers::{
    analyze, classify, examples, health, known_planets, missions, proxy_exoplanet, AppState,
};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        .route("/api/health", get(health))
        // Raw archive proxy
        .route("/api/exoplanet", get(proxy_exoplanet))
        // Normalized lookups
        .route("/api/analyze", get(analyze))
        .route("/api/known-planets", get(known_planets))
        .route("/api/classify", post(classify))
        // Mission metadata
        .route("/api/missions", get(missions))
        .route("/api/examples/:mission", get(examples))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
