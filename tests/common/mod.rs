//! Shared fixtures: counting mock sources and an in-process app state.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use netident::config::{AppConfig, CacheBackend};
use netident::errors::SourceError;
use netident::models::resolution::SourceHit;
use netident::services::ascii_decoder::AsciiDecoder;
use netident::services::cache::{JsonFileStore, ResolutionCache};
use netident::services::classifier::DeviceClassifier;
use netident::services::lookup::{LookupChain, LookupSource};
use netident::services::resolver::IdentifierResolver;
use netident::services::taxonomy::TaxonomyRegistry;
use netident::AppState;

pub const TIMEOUT: Duration = Duration::from_millis(100);

/// Mock source answering from a fixed table, counting every call.
pub struct CountingSource {
    name: &'static str,
    answers: Vec<(&'static str, &'static str)>,
    fail: bool,
    calls: AtomicUsize,
}

impl CountingSource {
    pub fn answering(name: &'static str, answers: Vec<(&'static str, &'static str)>) -> Arc<Self> {
        Arc::new(Self {
            name,
            answers,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            answers: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LookupSource for CountingSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn lookup(&self, identifier: &str) -> Result<Option<SourceHit>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SourceError::Status(502));
        }
        Ok(self
            .answers
            .iter()
            .find(|(oid, _)| *oid == identifier)
            .map(|(_, name)| SourceHit::named(*name)))
    }
}

pub async fn open_cache(dir: &tempfile::TempDir) -> Arc<ResolutionCache> {
    let store = JsonFileStore::new(dir.path().join("oid_cache.json"));
    Arc::new(ResolutionCache::open(Box::new(store)).await.unwrap())
}

pub fn chain_of(sources: &[Arc<CountingSource>]) -> LookupChain {
    sources.iter().fold(LookupChain::new(), |chain, s| {
        chain.with_source(s.clone(), TIMEOUT)
    })
}

pub fn test_config(dir: &tempfile::TempDir) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cache_backend: CacheBackend::File,
        cache_path: dir.path().join("oid_cache.json").display().to_string(),
        redis_url: None,
        redis_cache_key: "netident:test".to_string(),
        database_url: None,
        database_max_connections: 1,
        lookup_sources: Vec::new(),
        lookup_timeout: TIMEOUT,
        ascii_prefix_max_discriminator: 20,
        ascii_prefixes: Vec::new(),
        single_flight: false,
        icon_base_url: "/nedi/icon_library".to_string(),
        user_agent: "netident-tests".to_string(),
    }
}

/// App state with the built-in taxonomy and the given mock sources.
pub async fn test_state(dir: &tempfile::TempDir, sources: &[Arc<CountingSource>]) -> AppState {
    let registry = Arc::new(TaxonomyRegistry::builtin().unwrap());
    let resolver =
        IdentifierResolver::new(open_cache(dir).await, chain_of(sources), AsciiDecoder::default());
    AppState {
        classifier: Arc::new(DeviceClassifier::new(registry)),
        resolver: Arc::new(resolver),
        db: None,
        config: test_config(dir),
    }
}
