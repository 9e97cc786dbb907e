use std::sync::Arc;

use crate::auth::middleware::SessionKeys;
use crate::config::WsConfig;
use crate::db::DbPool;
use crate::ws::registry::ConnectionRegistry;
use crate::ws::transport::WsTransport;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection wrapped in Arc<Mutex>
    pub db: DbPool,
    /// JWT verification secret shared with the account service
    pub jwt_secret: Vec<u8>,
    /// Cookie consulted when no explicit token is given
    pub session_cookie: String,
    /// Outbound channels of open WebSocket connections
    pub transport: Arc<WsTransport>,
    /// Identity <-> connection presence registry, emitting through `transport`
    pub registry: Arc<ConnectionRegistry>,
    /// Ping/pong liveness settings
    pub ws: WsConfig,
}

impl AppState {
    pub fn new(db: DbPool, jwt_secret: Vec<u8>, session_cookie: String, ws: WsConfig) -> Self {
        let transport = Arc::new(WsTransport::new());
        let registry = Arc::new(ConnectionRegistry::new(transport.clone()));
        Self {
            db,
            jwt_secret,
            session_cookie,
            transport,
            registry,
            ws,
        }
    }

    pub fn session_keys(&self) -> SessionKeys {
        SessionKeys {
            secret: self.jwt_secret.clone(),
            cookie_name: self.session_cookie.clone(),
        }
    }
}
