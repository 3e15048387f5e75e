use std::{path::Path, sync::Arc, time::Duration};

use reel_rec::{
    config::Config,
    db::{create_redis_client, Cache, CacheWriterHandle},
    routes::{create_router, AppState},
    services::{
        posters::{CredentialChain, OfflinePosterResolver, TmdbPosterResolver, TmdbSettings},
        PosterResolver,
    },
    store::DataState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reel_rec=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let data = DataState::load(
        Path::new(&config.catalog_path),
        Path::new(&config.similarity_path),
    );

    let (cache, cache_writer) = match &config.redis_url {
        Some(url) => connect_cache(url, config.poster_cache_ttl).await?,
        None => (None, None),
    };

    let poster_resolver = build_poster_resolver(&config, &data, cache)?;
    tracing::info!(
        resolver = poster_resolver.name(),
        workers = config.poster_workers,
        "Poster resolver ready"
    );

    let state = Arc::new(AppState {
        data,
        poster_resolver,
        poster_workers: config.poster_workers,
    });
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Poster cache, or none when Redis cannot be reached
async fn connect_cache(
    url: &str,
    ttl_secs: u64,
) -> anyhow::Result<(Option<Cache>, Option<CacheWriterHandle>)> {
    let client = create_redis_client(url)?;
    match Cache::connect(client, Duration::from_secs(ttl_secs)).await {
        Ok((cache, writer)) => {
            tracing::info!(ttl_secs, "Poster cache enabled");
            Ok((Some(cache), Some(writer)))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, running without poster cache");
            Ok((None, None))
        }
    }
}

/// TMDB when keys are configured, offline placeholders otherwise
fn build_poster_resolver(
    config: &Config,
    data: &DataState,
    cache: Option<Cache>,
) -> anyhow::Result<Arc<dyn PosterResolver>> {
    let credentials = CredentialChain::from_config(config);
    if !credentials.is_empty() {
        let resolver =
            TmdbPosterResolver::new(TmdbSettings::from_config(config), credentials, cache)?;
        return Ok(Arc::new(resolver));
    }

    tracing::warn!("No TMDB credentials configured, serving placeholder posters");
    let resolver = match data {
        DataState::Ready(store) => OfflinePosterResolver::new(store, config.placeholder_url.clone()),
        DataState::Unavailable { .. } => {
            OfflinePosterResolver::generic(config.placeholder_url.clone())
        }
    };
    Ok(Arc::new(resolver))
}
