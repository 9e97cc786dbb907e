use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// BookBuddy real-time server
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "bookbuddy-server", version, about = "BookBuddy real-time server")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "BOOKBUDDY_PORT", default_value = "4000")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "BOOKBUDDY_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./bookbuddy.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "BOOKBUDDY_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Data directory for persistent state (DB, signing key)
    #[arg(long, env = "BOOKBUDDY_DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Name of the cookie carrying the session token
    #[arg(long, env = "BOOKBUDDY_SESSION_COOKIE", default_value = "token")]
    pub session_cookie: String,

    /// WebSocket liveness settings (loaded from [ws] section in TOML)
    #[arg(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws: Option<WsConfig>,
}

/// Liveness policing for registered WebSocket connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsConfig {
    /// Seconds between server pings (default: 30)
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,

    /// Seconds to wait for a pong before closing (default: 10)
    #[serde(default = "default_pong_timeout")]
    pub pong_timeout_secs: u64,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval(),
            pong_timeout_secs: default_pong_timeout(),
        }
    }
}

impl WsConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn pong_timeout(&self) -> Duration {
        Duration::from_secs(self.pong_timeout_secs)
    }
}

fn default_ping_interval() -> u64 {
    30
}

fn default_pong_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 4000,
            bind_address: "0.0.0.0".to_string(),
            config: "./bookbuddy.toml".to_string(),
            json_logs: false,
            generate_config: false,
            data_dir: "./data".to_string(),
            session_cookie: "token".to_string(),
            ws: None,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (BOOKBUDDY_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("BOOKBUDDY_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }

    pub fn ws_config(&self) -> WsConfig {
        self.ws.clone().unwrap_or_default()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# BookBuddy Real-time Server Configuration
# Place this file at ./bookbuddy.toml or specify with --config <path>
# All settings can be overridden via environment variables (BOOKBUDDY_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 4000)
# port = 4000

# Bind address (default: 0.0.0.0, all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Data directory for the SQLite database and JWT signing key.
# The account service that issues session tokens must share data_dir/jwt_secret.
# data_dir = "./data"

# Cookie holding the session token when no ?token= is given on /ws
# session_cookie = "token"

# ---- WebSocket liveness ----
# [ws]
# ping_interval_secs = 30
# pong_timeout_secs = 10
"#
    .to_string()
}
