//! Presence read endpoint backed by the connection registry.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::Claims;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineResponse {
    pub online: Vec<String>,
}

/// GET /api/presence - Identity ids with a live connection. JWT auth required.
pub async fn get_presence(State(state): State<AppState>, _claims: Claims) -> Json<OnlineResponse> {
    Json(OnlineResponse {
        online: state.registry.online_identities(),
    })
}
