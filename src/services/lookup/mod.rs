//! Lookup source chain: ordered, independently time-bounded name lookups.
//!
//! Each source is queried in priority order with its own timeout. The first
//! non-empty name wins; timeouts, transport failures and "not found" all
//! advance to the next source and are never surfaced to the caller.

pub mod http;
pub mod local_db;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use sqlx::PgPool;

use crate::errors::{ConfigError, SourceError};
use crate::models::resolution::{LookupSourceConfig, SourceHit};

use self::http::{HttpLookup, OidRegistry};
use self::local_db::{LocalDbLookup, LOCAL_DB_SOURCE};

/// One external resolution strategy.
#[async_trait]
pub trait LookupSource: Send + Sync {
    /// Stable name reported as the resolution source.
    fn name(&self) -> &str;

    /// Look up `identifier`. `Ok(None)` means an explicit "not found".
    async fn lookup(&self, identifier: &str) -> Result<Option<SourceHit>, SourceError>;
}

/// A source plus its chain position and timeout.
#[derive(Clone)]
struct ChainMember {
    config: LookupSourceConfig,
    source: Arc<dyn LookupSource>,
}

/// Name produced by the chain, tagged with the winning source.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainHit {
    pub source: String,
    pub hit: SourceHit,
}

/// Ordered chain of lookup sources.
#[derive(Clone, Default)]
pub struct LookupChain {
    members: Vec<ChainMember>,
}

impl std::fmt::Debug for LookupChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.members.iter().map(|m| &m.config))
            .finish()
    }
}

impl LookupChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source at the next priority position.
    pub fn with_source(mut self, source: Arc<dyn LookupSource>, timeout: Duration) -> Self {
        let config = LookupSourceConfig {
            name: source.name().to_string(),
            priority_order: self.members.len(),
            timeout,
        };
        self.members.push(ChainMember { config, source });
        self
    }

    pub fn configs(&self) -> Vec<LookupSourceConfig> {
        self.members.iter().map(|m| m.config.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Query sources in order until one returns a non-empty name.
    ///
    /// Worst-case latency is the sum of all source timeouts.
    pub async fn lookup(&self, identifier: &str) -> Option<ChainHit> {
        for member in &self.members {
            let name = member.config.name.as_str();
            let outcome =
                tokio::time::timeout(member.config.timeout, member.source.lookup(identifier)).await;

            match outcome {
                Ok(Ok(Some(hit))) => {
                    let trimmed = hit.name.trim();
                    if trimmed.is_empty() {
                        tracing::debug!(source = name, identifier, "Source returned an empty name");
                        continue;
                    }
                    tracing::debug!(
                        source = name,
                        identifier,
                        resolved = trimmed,
                        "Source resolved identifier"
                    );
                    return Some(ChainHit {
                        source: name.to_string(),
                        hit: SourceHit {
                            name: trimmed.to_string(),
                            description: hit.description.filter(|d| !d.trim().is_empty()),
                        },
                    });
                }
                Ok(Ok(None)) => {
                    tracing::debug!(source = name, identifier, "Source has no entry");
                }
                Ok(Err(e)) => {
                    tracing::debug!(source = name, identifier, error = %e, "Source lookup failed");
                }
                Err(_) => {
                    tracing::debug!(
                        source = name,
                        identifier,
                        timeout_ms = member.config.timeout.as_millis() as u64,
                        "Source lookup timed out"
                    );
                }
            }
        }
        None
    }
}

/// Build the chain from configured source names, in the order given.
///
/// `local-db` is skipped with a warning when no pool is available; any
/// other unknown name is a configuration error.
pub fn build_chain(
    names: &[String],
    timeout: Duration,
    client: &reqwest::Client,
    pool: Option<&PgPool>,
) -> Result<LookupChain, ConfigError> {
    let mut chain = LookupChain::new();
    for name in names {
        if name == LOCAL_DB_SOURCE {
            match pool {
                Some(pool) => {
                    chain = chain.with_source(Arc::new(LocalDbLookup::new(pool.clone())), timeout);
                }
                None => tracing::warn!("local-db source configured without DATABASE_URL; skipping"),
            }
            continue;
        }
        let registry = OidRegistry::from_name(name).ok_or_else(|| ConfigError::Invalid {
            key: "LOOKUP_SOURCES",
            value: name.clone(),
        })?;
        chain = chain.with_source(Arc::new(HttpLookup::new(registry, client.clone())), timeout);
    }
    Ok(chain)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scriptable sources for chain and resolver tests.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    pub enum Behavior {
        Hit(&'static str),
        NotFound,
        Fail,
        Hang,
    }

    pub struct ScriptedSource {
        pub name: &'static str,
        pub behavior: Behavior,
        pub calls: AtomicUsize,
    }

    impl ScriptedSource {
        pub fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name,
                behavior,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LookupSource for ScriptedSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn lookup(&self, _identifier: &str) -> Result<Option<SourceHit>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Hit(name) => Ok(Some(SourceHit::named(name))),
                Behavior::NotFound => Ok(None),
                Behavior::Fail => Err(SourceError::Status(503)),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(None)
                }
            }
        }
    }
}
