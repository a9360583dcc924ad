use std::sync::Arc;

use anyhow::Context;

use pulseboard_api::auth::AuthService;
use pulseboard_api::cache::{CacheStore, CachedRepository, MemoryStore, RedisStore};
use pulseboard_api::config::{CacheKind, Settings};
use pulseboard_api::datasource::DataRepository;
use pulseboard_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Fail fast: invalid configuration must never serve traffic.
    let settings = Arc::new(Settings::load().context("invalid configuration")?);
    tracing::info!(
        env = %settings.app_env,
        source = %settings.data_source,
        cache = %settings.cache_type,
        "starting {}",
        settings.app_title
    );
    if settings.disable_auth {
        tracing::warn!("authentication is DISABLED; do not use this mode in production");
    }

    let repository = DataRepository::from_settings(&settings)?;
    let store: Arc<dyn CacheStore> = match settings.cache_type {
        CacheKind::Simple => Arc::new(MemoryStore::new()),
        CacheKind::Redis => {
            let redis_url = settings
                .redis_url
                .as_deref()
                .context("REDIS_URL is required for RedisCache")?;
            Arc::new(RedisStore::new(redis_url)?)
        }
    };
    let data = CachedRepository::new(repository, store, settings.cache_timeout_seconds);
    let auth = AuthService::new(&settings);

    let state = AppState {
        settings: settings.clone(),
        auth: Arc::new(auth),
        data: Arc::new(data),
    };
    let router = pulseboard_api::app(state);

    let bind_addr = format!("0.0.0.0:{}", settings.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    println!("🚀 {} listening on http://{}", settings.app_title, bind_addr);

    axum::serve(listener, router).await.context("server")?;
    Ok(())
}
