pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod health;
pub mod placement;
pub mod room_registry;
pub mod session;
pub mod state;
pub mod timer;
pub mod turn_engine;
pub mod ws;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use config::ServerConfig;
use state::AppState;

/// Build the Axum router and application state from a config.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState) {
    let web_root = config.web_root.clone();
    let state = AppState::new(config);

    let api_routes = Router::new()
        .route("/rooms/{code}", axum::routing::get(api::get_room))
        .layer(CorsLayer::permissive());

    let app = Router::new()
        .route("/ws", axum::routing::get(ws::ws_handler))
        .route("/health", axum::routing::get(health::health_check))
        .nest("/api/v1", api_routes)
        .fallback_service(ServeDir::new(&web_root))
        .with_state(state.clone());

    (app, state)
}
