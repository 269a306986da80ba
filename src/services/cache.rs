//! Durable resolution cache: identifier -> resolved name.
//!
//! The whole cache is held in memory and loaded once at startup. Every `put`
//! is persisted before it returns; writes are serialized so the persisted
//! representation never interleaves two updates. Entries never expire.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use tokio::sync::{Mutex, RwLock};

use crate::errors::CacheError;
use crate::models::resolution::CacheEntry;

/// Persistence backend for the resolution cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;

    /// Load every persisted entry.
    async fn load(&self) -> Result<HashMap<String, CacheEntry>, CacheError>;

    /// Persist `changed`. `snapshot` is the full cache including `changed`,
    /// for backends that rewrite everything.
    async fn persist(
        &self,
        snapshot: &HashMap<String, CacheEntry>,
        changed: &CacheEntry,
    ) -> Result<(), CacheError>;
}

/// JSON file store, replaced atomically on each write.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CacheStore for JsonFileStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn load(&self) -> Result<HashMap<String, CacheEntry>, CacheError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn persist(
        &self,
        snapshot: &HashMap<String, CacheEntry>,
        _changed: &CacheEntry,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| CacheError::Task(e.to_string()))?
    }
}

/// Write to a temp file in the target directory, fsync, then rename over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    use std::io::Write;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CacheError::Io(e.error))?;
    Ok(())
}

/// Redis hash store: one field per identifier, JSON-encoded entry as value.
#[derive(Debug, Clone)]
pub struct RedisStore {
    client: redis::Client,
    hash_key: String,
}

impl RedisStore {
    pub fn open(url: &str, hash_key: &str) -> Result<Self, CacheError> {
        Ok(Self {
            client: redis::Client::open(url)?,
            hash_key: hash_key.to_string(),
        })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn load(&self) -> Result<HashMap<String, CacheEntry>, CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: HashMap<String, String> = conn.hgetall(&self.hash_key).await?;

        let mut entries = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            match serde_json::from_str::<CacheEntry>(&value) {
                Ok(entry) => {
                    entries.insert(key, entry);
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping undecodable cache entry");
                }
            }
        }
        Ok(entries)
    }

    async fn persist(
        &self,
        _snapshot: &HashMap<String, CacheEntry>,
        changed: &CacheEntry,
    ) -> Result<(), CacheError> {
        let value = serde_json::to_string(changed)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.hset(&self.hash_key, &changed.key, value).await?;
        Ok(())
    }
}

/// In-memory resolution cache backed by a durable store.
pub struct ResolutionCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    write_lock: Mutex<()>,
    store: Box<dyn CacheStore>,
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("backend", &self.store.backend())
            .finish_non_exhaustive()
    }
}

impl ResolutionCache {
    /// Load all persisted entries from `store`.
    pub async fn open(store: Box<dyn CacheStore>) -> Result<Self, CacheError> {
        let entries = store.load().await?;
        tracing::info!(
            backend = store.backend(),
            entries = entries.len(),
            "Resolution cache loaded"
        );
        Ok(Self {
            entries: RwLock::new(entries),
            write_lock: Mutex::new(()),
            store,
        })
    }

    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(key).cloned()
    }

    /// Insert or overwrite an entry and persist it before returning.
    ///
    /// The in-memory value is kept even if persistence fails; the error is
    /// returned so the caller can log it.
    pub async fn put(
        &self,
        key: &str,
        value: &str,
        source: &str,
        description: Option<String>,
    ) -> Result<CacheEntry, CacheError> {
        let entry = CacheEntry {
            key: key.to_string(),
            value: value.to_string(),
            source: source.to_string(),
            description,
            resolved_at: Utc::now(),
        };

        let _writer = self.write_lock.lock().await;

        let snapshot = {
            let mut entries = self.entries.write().await;
            if let Some(previous) = entries.get(key) {
                if previous.source != entry.source {
                    tracing::debug!(
                        key = %key,
                        old_source = %previous.source,
                        new_source = %entry.source,
                        "Overwriting cache entry from a different source"
                    );
                }
            }
            entries.insert(key.to_string(), entry.clone());
            entries.clone()
        };

        self.store.persist(&snapshot, &entry).await?;
        Ok(entry)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }
}
