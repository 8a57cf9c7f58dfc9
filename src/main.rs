use anyhow::Context;
use helpdesk_server::core::shared::utils::{create_conn, run_migrations};
use helpdesk_server::{run_axum_server, AppConfig, AppState};
use log::{error, info};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    info!("Opening database at {}", config.database.url);
    let pool = match create_conn(&config.database.url, config.database.max_connections) {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database {}: {}", config.database.url, e);
            return Err(e).context("database pool creation failed");
        }
    };

    run_migrations(&pool)
        .map_err(|e| anyhow::anyhow!(e))
        .context("schema creation failed")?;

    let app_state = Arc::new(AppState::new(config, pool));
    run_axum_server(app_state).await?;

    info!("Server stopped");
    Ok(())
}
