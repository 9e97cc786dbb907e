use axum::{middleware, Router};

use crate::chat::{messages, presence};
use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// Inject session verification keys into request extensions so the Claims
/// extractor can find them.
async fn inject_session_keys(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    req.extensions_mut().insert(state.session_keys());
    next.run(req).await
}

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // Authenticated routes (Claims extractor validates the session token)
    let chat_routes = Router::new()
        .route("/api/messages", axum::routing::post(messages::send_message))
        .route(
            "/api/messages/{other_id}",
            axum::routing::get(messages::get_history),
        )
        .route("/api/presence", axum::routing::get(presence::get_presence));

    // WebSocket endpoint (auth via query param or cookie, checked before upgrade)
    let ws_routes = Router::new().route("/ws", axum::routing::get(ws_handler::ws_upgrade));

    let health = Router::new().route("/health", axum::routing::get(health_check));

    Router::new()
        .merge(chat_routes)
        .merge(ws_routes)
        .merge(health)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            inject_session_keys,
        ))
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
