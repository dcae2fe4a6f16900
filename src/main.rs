use plex_curator::{config::Config, services};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        url = %config.plex_url,
        libraries = ?config.library_names,
        wait_seconds = config.wait_seconds,
        create_collections = config.create_collections,
        add_to_watchlist = config.add_to_watchlist,
        "Configuration loaded"
    );

    // Only a failed server connection ends the loop
    services::run(&config).await?;
    Ok(())
}
