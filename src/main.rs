use animal_intake::config::Config;
use animal_intake::server::Server;
use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("animal_intake={},tower_http=debug", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting animal intake service");
    tracing::info!(
        "Configuration: bind_addr={}, wipe_interval_ms={}, ip_rate_limit={}, key_rate_limit={}, rate_window_ms={}",
        config.bind_addr,
        config.wipe_interval_ms,
        config.ip_rate_limit,
        config.key_rate_limit,
        config.rate_window_ms
    );

    let server = Server::new(config)
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
