use std::sync::Arc;
use anyhow::{Context, Result};
use catalog_query::catalog::http::HttpCatalog;
use catalog_query::config::Config;
use catalog_query::{fetch, hash, parse};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("catalog_query=info"))
        )
        .init();

    let mut args = std::env::args().skip(1);
    let input = args
        .next()
        .context("Usage: catalog-query <QUERY> [CONFIG]")?;

    // Load config, falling back to defaults when no file is given
    let mut config = match args.next() {
        Some(config_path) => {
            let config = Config::load(&config_path)
                .with_context(|| format!("Failed to load config from {}", config_path))?;
            tracing::info!("Loaded config from {}", config_path);
            config
        }
        None => Config::default(),
    };
    config.apply_env();

    let query = Arc::new(parse(&input)?);
    tracing::info!("Querying {} at {}", query, config.catalog.address);

    let catalog = HttpCatalog::new(&config.catalog)
        .context("Failed to create catalog client")?;

    // Cancel the in-flight lookup on ctrl-c
    let cancel_query = query.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            cancel_query.cancel();
        }
    });

    let (services, meta) = match fetch(&query, &catalog, config.query_options()).await {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => {
            tracing::info!("{}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        "Found {} instances at index {} (fingerprint {})",
        services.len(),
        meta.last_index,
        hash::fingerprint(&services)
    );

    let json = serde_json::to_string_pretty(&services)
        .context("Failed to serialize services")?;
    println!("{}", json);

    Ok(())
}
