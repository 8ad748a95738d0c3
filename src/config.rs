use std::env;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Labdesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn default_log_filter() -> &'static str {
    "info,labdesk=debug"
}

/// Runtime configuration, read from the environment.
///
/// `LABDESK_DB` — path to the SQLite database file
/// `JWT_SECRET` — HMAC key for bearer tokens
/// `PORT` — HTTP listen port
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let db_path = env::var("LABDESK_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_db_path());
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using development default");
            "labdesk-dev-secret".to_string()
        });
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(4810);

        Self {
            db_path,
            jwt_secret,
            port,
        }
    }
}

/// Get the application data directory (~/Labdesk/ on all platforms)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Labdesk")
}

fn default_db_path() -> PathBuf {
    app_data_dir().join("labdesk.db")
}
