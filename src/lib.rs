pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

use config::{AppConfig, CacheBackend};
use services::ascii_decoder::{AsciiDecoder, PrefixRule};
use services::cache::{CacheStore, JsonFileStore, RedisStore, ResolutionCache};
use services::classifier::DeviceClassifier;
use services::lookup::{self, http::build_client};
use services::resolver::IdentifierResolver;
use services::taxonomy::TaxonomyRegistry;

/// Shared application state passed to all Axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub classifier: Arc<DeviceClassifier>,
    pub resolver: Arc<IdentifierResolver>,
    pub db: Option<PgPool>,
    pub config: AppConfig,
}

impl AppState {
    /// Build the registry, open the cache, and assemble the lookup chain.
    ///
    /// Any taxonomy, cache, or source configuration problem is fatal.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let registry = Arc::new(TaxonomyRegistry::builtin()?);
        tracing::info!(device_types = registry.len(), "Taxonomy loaded");

        let db = match &config.database_url {
            Some(url) => Some(db::create_pool(url, config.database_max_connections).await?),
            None => None,
        };

        let store: Box<dyn CacheStore> = match config.cache_backend {
            CacheBackend::File => Box::new(JsonFileStore::new(&config.cache_path)),
            CacheBackend::Redis => {
                let url = config
                    .redis_url
                    .as_deref()
                    .ok_or(errors::ConfigError::Missing("REDIS_URL"))?;
                Box::new(RedisStore::open(url, &config.redis_cache_key)?)
            }
        };
        let cache = Arc::new(ResolutionCache::open(store).await?);

        let client = build_client(&config.user_agent)?;
        let chain = lookup::build_chain(
            &config.lookup_sources,
            config.lookup_timeout,
            &client,
            db.as_ref(),
        )?;
        tracing::info!(sources = ?chain.configs(), "Lookup chain configured");

        let decoder = AsciiDecoder::new(
            config
                .ascii_prefixes
                .iter()
                .cloned()
                .map(PrefixRule::Exact)
                .chain([PrefixRule::LeadingOneBelow(config.ascii_prefix_max_discriminator)])
                .collect(),
        );
        let mut resolver = IdentifierResolver::new(cache, chain, decoder);
        if config.single_flight {
            resolver = resolver.with_single_flight();
        }

        Ok(Self {
            classifier: Arc::new(DeviceClassifier::new(registry)),
            resolver: Arc::new(resolver),
            db,
            config,
        })
    }
}
