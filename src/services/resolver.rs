//! Identifier resolver: cache, then lookup chain, then ASCII decoding.
//!
//! Successful resolutions (anything other than `unresolved`) are written
//! back to the cache keyed by the exact raw identifier, so a key is looked
//! up externally at most once. Unresolved results are recomputed on the
//! next call, which retries transiently unavailable sources.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ResolveError;
use crate::models::resolution::{
    DeviceTypeHint, Resolution, SOURCE_ASCII_DECODE, SOURCE_CACHE, SOURCE_UNRESOLVED,
};
use crate::services::ascii_decoder::AsciiDecoder;
use crate::services::cache::ResolutionCache;
use crate::services::lookup::LookupChain;

/// Resolves dotted numeric identifiers to human-readable names.
#[derive(Debug)]
pub struct IdentifierResolver {
    cache: Arc<ResolutionCache>,
    chain: LookupChain,
    decoder: AsciiDecoder,
    in_flight: Option<InFlightMap>,
}

impl IdentifierResolver {
    pub fn new(cache: Arc<ResolutionCache>, chain: LookupChain, decoder: AsciiDecoder) -> Self {
        Self {
            cache,
            chain,
            decoder,
            in_flight: None,
        }
    }

    /// Collapse concurrent resolutions of the same uncached key into one.
    pub fn with_single_flight(mut self) -> Self {
        self.in_flight = Some(std::sync::Mutex::new(HashMap::new()));
        self
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn chain(&self) -> &LookupChain {
        &self.chain
    }

    #[cfg(test)]
    fn in_flight_keys(&self) -> usize {
        self.in_flight
            .as_ref()
            .map_or(0, |map| map.lock().unwrap_or_else(|e| e.into_inner()).len())
    }

    /// Resolve `raw`, optionally prefixing the display name with a device hint.
    ///
    /// Never fails for input matching `^\d+(\.\d+)*$`; at worst the original
    /// identifier comes back with source `unresolved`.
    pub async fn resolve(
        &self,
        raw: &str,
        hint: Option<&DeviceTypeHint>,
    ) -> Result<Resolution, ResolveError> {
        validate(raw)?;

        if let Some(resolution) = self.from_cache(raw, hint).await {
            return Ok(resolution);
        }

        let Some(in_flight) = &self.in_flight else {
            return Ok(self.resolve_uncached(raw, hint).await);
        };

        let slot = InFlightSlot::claim(in_flight, raw);
        let _guard = slot.lock.lock().await;
        // Another caller may have resolved this key while we waited.
        let resolution = match self.from_cache(raw, hint).await {
            Some(resolution) => resolution,
            None => self.resolve_uncached(raw, hint).await,
        };

        Ok(resolution)
    }

    /// Resolve a combined device name such as `FortiAP-1.16.70.80...`.
    pub async fn resolve_device_name(&self, device_name: &str) -> Result<Resolution, ResolveError> {
        let (hint, raw) = DeviceTypeHint::split(device_name);
        self.resolve(raw, hint.as_ref()).await
    }

    async fn from_cache(&self, raw: &str, hint: Option<&DeviceTypeHint>) -> Option<Resolution> {
        let entry = self.cache.get(raw).await?;
        tracing::debug!(identifier = raw, origin = %entry.source, "Resolution cache hit");
        Some(build(raw, entry.value, SOURCE_CACHE, entry.description, hint))
    }

    async fn resolve_uncached(&self, raw: &str, hint: Option<&DeviceTypeHint>) -> Resolution {
        if let Some(found) = self.chain.lookup(raw).await {
            self.remember(raw, &found.hit.name, &found.source, found.hit.description.clone())
                .await;
            return build(raw, found.hit.name, &found.source, found.hit.description, hint);
        }

        if let Some(decoded) = self.decoder.decode(raw) {
            tracing::debug!(identifier = raw, decoded = %decoded, "Identifier ASCII-decoded");
            self.remember(raw, &decoded, SOURCE_ASCII_DECODE, None).await;
            return build(raw, decoded, SOURCE_ASCII_DECODE, None, hint);
        }

        tracing::debug!(identifier = raw, "Identifier left unresolved");
        build(raw, raw.to_string(), SOURCE_UNRESOLVED, None, hint)
    }

    async fn remember(&self, raw: &str, value: &str, source: &str, description: Option<String>) {
        if let Err(e) = self.cache.put(raw, value, source, description).await {
            tracing::warn!(identifier = raw, source, error = %e, "Failed to persist resolution");
        }
    }
}

type InFlightMap = std::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// A caller's claim on a per-key lock. Dropping it (including when the
/// resolve future is cancelled) removes the map entry once no other caller
/// holds it.
struct InFlightSlot<'a> {
    map: &'a InFlightMap,
    key: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> InFlightSlot<'a> {
    fn claim(map: &'a InFlightMap, key: &'a str) -> Self {
        let lock = map
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key.to_string())
            .or_default()
            .clone();
        Self { map, key, lock }
    }
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        let mut map = self.map.lock().unwrap_or_else(|e| e.into_inner());
        let last = map
            .get(self.key)
            .is_some_and(|lock| Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) <= 2);
        if last {
            map.remove(self.key);
        }
    }
}

/// Reject empty input and anything that is not a dotted decimal sequence.
fn validate(raw: &str) -> Result<(), ResolveError> {
    if raw.is_empty() {
        return Err(ResolveError::Empty);
    }
    let well_formed = raw
        .split('.')
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
    if !well_formed {
        return Err(ResolveError::Malformed(raw.to_string()));
    }
    Ok(())
}

fn build(
    raw: &str,
    name: String,
    source: &str,
    description: Option<String>,
    hint: Option<&DeviceTypeHint>,
) -> Resolution {
    let display_name = match hint {
        Some(hint) => hint.apply(&name),
        None => name.clone(),
    };
    Resolution {
        identifier: raw.to_string(),
        name,
        display_name,
        source: source.to_string(),
        description,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::services::cache::JsonFileStore;
    use crate::services::lookup::testing::{Behavior, ScriptedSource};

    const T: Duration = Duration::from_millis(50);
    const FORTIAP_SERIAL: &str = "1.16.70.80.50.51.49.70.84.70.50.48.48.50.51.48.52.51";

    async fn cache(dir: &tempfile::TempDir) -> Arc<ResolutionCache> {
        let store = JsonFileStore::new(dir.path().join("cache.json"));
        Arc::new(ResolutionCache::open(Box::new(store)).await.unwrap())
    }

    #[test]
    fn validation_rules() {
        assert_eq!(validate(""), Err(ResolveError::Empty));
        assert!(validate("1").is_ok());
        assert!(validate("1.3.6.1.2.1.1.1.0").is_ok());
        assert!(validate("1.3.x").is_err());
        assert!(validate("1..3").is_err());
        assert!(validate(".1.3").is_err());
        assert!(validate("1.3.").is_err());
        assert!(validate("-1.3").is_err());
    }

    #[tokio::test]
    async fn malformed_input_does_not_touch_cache_or_sources() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new("a", Behavior::Hit("x"));
        let resolver = IdentifierResolver::new(
            cache(&dir).await,
            LookupChain::new().with_source(source.clone(), T),
            AsciiDecoder::default(),
        );

        let err = resolver.resolve("FortiAP", None).await.unwrap_err();
        assert!(matches!(err, ResolveError::Malformed(_)));
        assert_eq!(source.calls(), 0);
        assert!(resolver.cache().is_empty().await);
    }

    #[tokio::test]
    async fn chain_hit_is_cached_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new("alvestrand", Behavior::Hit("sysDescr"));
        let resolver = IdentifierResolver::new(
            cache(&dir).await,
            LookupChain::new().with_source(source.clone(), T),
            AsciiDecoder::default(),
        );

        let first = resolver.resolve("1.3.6.1.2.1.1.1.0", None).await.unwrap();
        assert_eq!(first.name, "sysDescr");
        assert_eq!(first.source, "alvestrand");

        let second = resolver.resolve("1.3.6.1.2.1.1.1.0", None).await.unwrap();
        assert_eq!(second.name, "sysDescr");
        assert_eq!(second.source, SOURCE_CACHE);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn ascii_fallback_when_sources_fail() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = IdentifierResolver::new(
            cache(&dir).await,
            LookupChain::new()
                .with_source(ScriptedSource::new("a", Behavior::Fail), T)
                .with_source(ScriptedSource::new("b", Behavior::Hang), T),
            AsciiDecoder::default(),
        );

        let hint = DeviceTypeHint::new("FortiAP");
        let resolution = resolver.resolve(FORTIAP_SERIAL, Some(&hint)).await.unwrap();
        assert_eq!(resolution.name, "FP231FTF20023043");
        assert_eq!(resolution.display_name, "FortiAP-FP231FTF20023043");
        assert_eq!(resolution.source, SOURCE_ASCII_DECODE);
        assert_eq!(
            resolver.cache().get(FORTIAP_SERIAL).await.unwrap().source,
            SOURCE_ASCII_DECODE
        );
    }

    #[tokio::test]
    async fn unresolved_is_not_cached_and_retried() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new("a", Behavior::NotFound);
        let resolver = IdentifierResolver::new(
            cache(&dir).await,
            LookupChain::new().with_source(source.clone(), T),
            AsciiDecoder::default(),
        );

        let first = resolver.resolve("1.3.6.1.2.1.1.1.0", None).await.unwrap();
        assert_eq!(first.name, "1.3.6.1.2.1.1.1.0");
        assert_eq!(first.source, SOURCE_UNRESOLVED);
        assert!(!first.is_resolved());
        assert!(resolver.cache().is_empty().await);

        let second = resolver.resolve("1.3.6.1.2.1.1.1.0", None).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn unresolved_with_hint_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let resolver =
            IdentifierResolver::new(cache(&dir).await, LookupChain::new(), AsciiDecoder::default());
        let resolution = resolver.resolve_device_name("FortiSwitch-1.3.6.1").await.unwrap();
        assert_eq!(resolution.display_name, "FortiSwitch-1.3.6.1");
        assert_eq!(resolution.source, SOURCE_UNRESOLVED);
    }

    #[tokio::test]
    async fn single_flight_collapses_concurrent_lookups() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new("slowish", Behavior::Hit("ifDescr"));
        let resolver = Arc::new(
            IdentifierResolver::new(
                cache(&dir).await,
                LookupChain::new().with_source(source.clone(), T),
                AsciiDecoder::default(),
            )
            .with_single_flight(),
        );

        let mut handles = Vec::new();
        for _ in 0..8 {
            let resolver = resolver.clone();
            handles.push(tokio::spawn(async move {
                resolver.resolve("1.3.6.1.2.1.2.2.1.2", None).await.unwrap()
            }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap().name, "ifDescr");
        }
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn cancelled_resolve_releases_its_key() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = IdentifierResolver::new(
            cache(&dir).await,
            LookupChain::new().with_source(ScriptedSource::new("slow", Behavior::Hang), T),
            AsciiDecoder::default(),
        )
        .with_single_flight();

        let cancelled =
            tokio::time::timeout(Duration::from_millis(5), resolver.resolve("1.3.6.1", None)).await;
        assert!(cancelled.is_err());
        assert_eq!(resolver.in_flight_keys(), 0);

        let finished = resolver.resolve("1.3.6.1", None).await.unwrap();
        assert_eq!(finished.source, SOURCE_UNRESOLVED);
        assert_eq!(resolver.in_flight_keys(), 0);
    }
}
