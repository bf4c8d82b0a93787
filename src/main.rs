//! Bootstrap binary: initializes logging, loads the configuration, and
//! prepares the database schema. The request layer (out of scope here)
//! connects on top of the same configuration.

use dotenvy::dotenv;
use finboard::config;
use finboard::errors::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Non-fatal: env vars can be set externally.
    dotenv().ok();

    let app_config = config::load_app_configuration()?;
    info!(database_url = %app_config.database_url, "configuration loaded");

    let db = config::database::create_connection(&app_config.database_url).await?;
    config::database::create_tables(&db).await?;
    info!(media_root = %app_config.media_root.display(), "database ready");

    Ok(())
}
