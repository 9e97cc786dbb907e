use std::net::SocketAddr;
use tokio::net::TcpListener;

use bookbuddy_server::config::{generate_config_template, Config};
use bookbuddy_server::{auth, db, routes, state};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("bookbuddy_server=info"))?;
    if config.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().pretty().with_env_filter(filter).init();
    }

    tracing::info!("BookBuddy server v{} starting", env!("CARGO_PKG_VERSION"));

    let db = db::init_db(&config.data_dir)?;

    // Shared with the account service that issues session tokens
    let jwt_secret = auth::jwt::load_or_generate_jwt_secret(&config.data_dir)?;

    let ws_config = config.ws_config();
    tracing::info!(
        ping_interval_secs = ws_config.ping_interval_secs,
        pong_timeout_secs = ws_config.pong_timeout_secs,
        session_cookie = %config.session_cookie,
        "Real-time layer configured"
    );

    let app_state = state::AppState::new(db, jwt_secret, config.session_cookie.clone(), ws_config);
    let app = routes::build_router(app_state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
