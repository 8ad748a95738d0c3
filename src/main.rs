use tracing_subscriber::EnvFilter;

use labdesk::api::server;
use labdesk::config::{self, AppConfig};
use labdesk::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let app_config = AppConfig::from_env();

    if let Some(parent) = app_config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // Open once at startup so migrations run before the first request
    db::open_database(&app_config.db_path)?;
    tracing::info!(db = %app_config.db_path.display(), "database ready");

    server::serve(app_config).await?;
    Ok(())
}
