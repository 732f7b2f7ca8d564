use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tpconfirm_protocol::wire::{EnrichmentRequest, WIRE_CHANNEL};
use tpconfirm_protocol::{
    ActorId, EnrichmentKind, RemoteEnrichmentResult, RemoteEnrichmentSource, RemoteIdentity,
};

use crate::error::{TransportError, TransportResult};
use crate::transport::EnrichmentTransport;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

type LookupKey = (EnrichmentKind, String, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedSourceOptions {
    pub request_timeout: Duration,
    /// Age after which a cached answer is refreshed on its next lookup and
    /// dropped by [`RemoteEnrichmentSource::evict_expired`].
    pub cache_ttl: Duration,
}

impl Default for CachedSourceOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

#[derive(Debug, Clone)]
struct Cached<T> {
    value: T,
    fetched_at: Instant,
}

impl<T> Cached<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// [`RemoteEnrichmentSource`] that answers from a cache and fills it in the
/// background.
///
/// The first lookup of a value fires one request through the transport and
/// returns `None`; later lookups return the cached answer once it lands.
/// An answer older than the cache TTL is still returned, but the lookup
/// also fires a refresh. At most one request per (kind, actor, viewer) is in
/// flight at a time.
#[derive(Clone)]
pub struct CachedEnrichmentSource {
    inner: Arc<CachedSourceInner>,
    runtime: Handle,
}

struct CachedSourceInner {
    transport: Arc<dyn EnrichmentTransport>,
    options: CachedSourceOptions,
    next_request_id: AtomicU64,
    regions: DashMap<String, Cached<String>>,
    dimensions: DashMap<(String, String), Cached<String>>,
    identities: DashMap<String, Cached<RemoteIdentity>>,
    in_flight: DashMap<LookupKey, u64>,
    requests_total: AtomicU64,
    failures_total: AtomicU64,
}

impl CachedEnrichmentSource {
    pub fn new(transport: Arc<dyn EnrichmentTransport>, runtime: Handle) -> Self {
        Self::with_options(transport, runtime, CachedSourceOptions::default())
    }

    pub fn with_options(
        transport: Arc<dyn EnrichmentTransport>,
        runtime: Handle,
        options: CachedSourceOptions,
    ) -> Self {
        Self {
            inner: Arc::new(CachedSourceInner {
                transport,
                options,
                next_request_id: AtomicU64::new(1),
                regions: DashMap::new(),
                dimensions: DashMap::new(),
                identities: DashMap::new(),
                in_flight: DashMap::new(),
                requests_total: AtomicU64::new(0),
                failures_total: AtomicU64::new(0),
            }),
            runtime,
        }
    }

    pub fn requests_total(&self) -> u64 {
        self.inner.requests_total.load(Ordering::Relaxed)
    }

    pub fn failures_total(&self) -> u64 {
        self.inner.failures_total.load(Ordering::Relaxed)
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.len()
    }

    pub fn cached_entries(&self) -> usize {
        self.inner.regions.len() + self.inner.dimensions.len() + self.inner.identities.len()
    }

    fn fire(
        &self,
        kind: EnrichmentKind,
        actor_name: &str,
        viewer_name: Option<&str>,
        viewer_id: Option<&ActorId>,
    ) {
        let key = (
            kind,
            normalize(actor_name),
            viewer_name.map(normalize).unwrap_or_default(),
        );
        let request_id = match self.inner.in_flight.entry(key.clone()) {
            Entry::Occupied(_) => return,
            Entry::Vacant(slot) => {
                let request_id = self.inner.allocate_request_id();
                slot.insert(request_id);
                request_id
            }
        };

        let request = EnrichmentRequest {
            request_id,
            kind,
            actor_name: actor_name.to_owned(),
            viewer_name: viewer_name.map(str::to_owned),
            viewer_id: viewer_id.cloned(),
        };
        self.inner.requests_total.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            channel = WIRE_CHANNEL,
            request_id,
            kind = kind.as_str(),
            actor = actor_name,
            "requesting remote enrichment"
        );

        let inner = Arc::clone(&self.inner);
        self.runtime.spawn(async move {
            match inner.exchange(&request).await {
                Ok(result) => inner.store(&key, result),
                Err(error) => {
                    inner.failures_total.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        error = %error,
                        request_id = request.request_id,
                        kind = request.kind.as_str(),
                        actor = %request.actor_name,
                        "remote enrichment request failed"
                    );
                }
            }
            inner.in_flight.remove(&key);
        });
    }
}

impl CachedSourceInner {
    fn allocate_request_id(&self) -> u64 {
        let mut current = self.next_request_id.load(Ordering::Relaxed);
        loop {
            let next = current
                .checked_add(1)
                .expect("enrichment request id space exhausted");
            match self.next_request_id.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return current,
                Err(actual) => current = actual,
            }
        }
    }

    async fn exchange(&self, request: &EnrichmentRequest) -> TransportResult<RemoteEnrichmentResult> {
        let response = tokio::time::timeout(
            self.options.request_timeout,
            self.transport.request(request.clone()),
        )
            .await
            .map_err(|_| TransportError::Timeout {
                request_id: request.request_id,
            })??;
        if response.request_id != request.request_id {
            return Err(TransportError::Mismatched {
                expected: request.request_id,
                actual: response.request_id,
            });
        }
        Ok(response.result)
    }

    fn store(&self, key: &LookupKey, result: RemoteEnrichmentResult) {
        let (_, actor, viewer) = key;
        if let Some(region) = result.region.filter(|value| !value.trim().is_empty()) {
            self.regions.insert(actor.clone(), Cached::new(region));
        }
        if let Some(dimension) = result.dimension.filter(|value| !value.trim().is_empty()) {
            self.dimensions
                .insert((actor.clone(), viewer.clone()), Cached::new(dimension));
        }
        if let Some(identity) = result.identity.filter(|identity| !identity.value.trim().is_empty()) {
            self.identities.insert(actor.clone(), Cached::new(identity));
        }
    }

    /// Cached value for `key` and whether it is still within the TTL.
    fn read<K: Eq + Hash, T: Clone>(&self, cache: &DashMap<K, Cached<T>>, key: &K) -> Option<(T, bool)> {
        cache
            .get(key)
            .map(|entry| (entry.value.clone(), entry.is_fresh(self.options.cache_ttl)))
    }

    fn evict<K: Eq + Hash, T>(&self, cache: &DashMap<K, Cached<T>>) -> usize {
        let mut evicted = 0;
        cache.retain(|_, entry| {
            let keep = entry.is_fresh(self.options.cache_ttl);
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }
}

impl RemoteEnrichmentSource for CachedEnrichmentSource {
    fn resolve_region(&self, actor_name: &str) -> Option<String> {
        let cached = self.inner.read(&self.inner.regions, &normalize(actor_name));
        if !matches!(cached, Some((_, true))) {
            self.fire(EnrichmentKind::Region, actor_name, None, None);
        }
        cached.map(|(region, _)| region)
    }

    fn resolve_dimension(&self, actor_name: &str, viewer_name: &str) -> Option<String> {
        let key = (normalize(actor_name), normalize(viewer_name));
        let cached = self.inner.read(&self.inner.dimensions, &key);
        if !matches!(cached, Some((_, true))) {
            self.fire(EnrichmentKind::Dimension, actor_name, Some(viewer_name), None);
        }
        cached.map(|(dimension, _)| dimension)
    }

    fn resolve_identity(&self, viewer: &ActorId, actor_name: &str) -> Option<RemoteIdentity> {
        let cached = self.inner.read(&self.inner.identities, &normalize(actor_name));
        if !matches!(cached, Some((_, true))) {
            self.fire(EnrichmentKind::Identity, actor_name, None, Some(viewer));
        }
        cached.map(|(identity, _)| identity)
    }

    fn forget(&self, actor_name: &str) {
        let name = normalize(actor_name);
        self.inner.regions.remove(&name);
        self.inner.identities.remove(&name);
        self.inner
            .dimensions
            .retain(|(actor, viewer), _| actor != &name && viewer != &name);
    }

    fn evict_expired(&self) -> usize {
        let evicted = self.inner.evict(&self.inner.regions)
            + self.inner.evict(&self.inner.dimensions)
            + self.inner.evict(&self.inner.identities);
        if evicted > 0 {
            tracing::debug!(evicted, "evicted expired remote enrichment answers");
        }
        evicted
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::runtime::Handle;
    use tokio::sync::Notify;
    use tokio::time::timeout;
    use tpconfirm_protocol::wire::{EnrichmentRequest, EnrichmentResponse};
    use tpconfirm_protocol::{ActorId, RemoteEnrichmentSource, RemoteIdentity};

    use super::{CachedEnrichmentSource, CachedSourceOptions};
    use crate::error::{TransportError, TransportResult};
    use crate::memory::InMemoryTransport;
    use crate::transport::EnrichmentTransport;

    const TEST_TIMEOUT: Duration = Duration::from_secs(2);

    async fn eventually<T>(mut probe: impl FnMut() -> Option<T>) -> T {
        timeout(TEST_TIMEOUT, async {
            loop {
                if let Some(value) = probe() {
                    return value;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("value resolved before timeout")
    }

    async fn settle(source: &CachedEnrichmentSource) {
        timeout(TEST_TIMEOUT, async {
            while source.in_flight() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("in-flight requests settled");
    }

    #[tokio::test]
    async fn first_lookup_fires_request_and_later_lookup_hits_cache() {
        let transport = Arc::new(InMemoryTransport::default());
        transport.set_region("Alex", "Orange");
        let source = CachedEnrichmentSource::new(transport, Handle::current());

        assert_eq!(source.resolve_region("Alex"), None);
        let region = eventually(|| source.resolve_region("alex")).await;

        assert_eq!(region, "Orange");
        assert_eq!(source.requests_total(), 1);
    }

    #[tokio::test]
    async fn dimension_is_cached_per_actor_and_viewer_pair() {
        let transport = Arc::new(InMemoryTransport::default());
        transport.set_dimension("Alex", "world_nether");
        let source = CachedEnrichmentSource::new(transport, Handle::current());

        assert_eq!(source.resolve_dimension("Alex", "Steve"), None);
        let dimension = eventually(|| source.resolve_dimension("Alex", "Steve")).await;
        assert_eq!(dimension, "world_nether");

        assert_eq!(source.resolve_dimension("Alex", "Blake"), None);
        assert_eq!(source.requests_total(), 2);
    }

    #[tokio::test]
    async fn identity_lookup_carries_viewer_id() {
        let transport = Arc::new(InMemoryTransport::default());
        let identity = RemoteIdentity {
            value: "dGV4dHVyZQ==".to_owned(),
            signature: "c2ln".to_owned(),
        };
        transport.set_identity("Alex", identity.clone());
        let source = CachedEnrichmentSource::new(transport, Handle::current());
        let viewer = ActorId::new("steve");

        assert_eq!(source.resolve_identity(&viewer, "Alex"), None);
        let resolved = eventually(|| source.resolve_identity(&viewer, "Alex")).await;
        assert_eq!(resolved, identity);
    }

    struct GatedTransport {
        gate: Notify,
        calls: AtomicU64,
    }

    #[async_trait]
    impl EnrichmentTransport for GatedTransport {
        async fn request(&self, request: EnrichmentRequest) -> TransportResult<EnrichmentResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(EnrichmentResponse {
                request_id: request.request_id,
                actor_name: request.actor_name,
                result: Default::default(),
            })
        }
    }

    #[tokio::test]
    async fn concurrent_lookups_share_one_in_flight_request() {
        let transport = Arc::new(GatedTransport {
            gate: Notify::new(),
            calls: AtomicU64::new(0),
        });
        let source = CachedEnrichmentSource::new(transport.clone(), Handle::current());

        for _ in 0..5 {
            assert_eq!(source.resolve_region("Alex"), None);
        }
        tokio::task::yield_now().await;

        assert_eq!(source.requests_total(), 1);
        assert_eq!(source.in_flight(), 1);
        transport.gate.notify_one();
        settle(&source).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    struct FailingTransport;

    #[async_trait]
    impl EnrichmentTransport for FailingTransport {
        async fn request(&self, _request: EnrichmentRequest) -> TransportResult<EnrichmentResponse> {
            Err(TransportError::Unavailable("no route to Orange".to_owned()))
        }
    }

    #[tokio::test]
    async fn failed_request_is_retried_by_a_later_lookup() {
        let source = CachedEnrichmentSource::new(Arc::new(FailingTransport), Handle::current());

        assert_eq!(source.resolve_region("Alex"), None);
        settle(&source).await;
        assert_eq!(source.failures_total(), 1);

        assert_eq!(source.resolve_region("Alex"), None);
        settle(&source).await;
        assert_eq!(source.requests_total(), 2);
        assert_eq!(source.failures_total(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_transport_times_out_without_caching() {
        let transport = Arc::new(InMemoryTransport::new(Duration::from_secs(30)));
        transport.set_region("Alex", "Orange");
        let source = CachedEnrichmentSource::with_options(
            transport,
            Handle::current(),
            CachedSourceOptions {
                request_timeout: Duration::from_millis(500),
                ..CachedSourceOptions::default()
            },
        );

        assert_eq!(source.resolve_region("Alex"), None);
        tokio::time::sleep(Duration::from_secs(1)).await;
        settle(&source).await;

        assert_eq!(source.failures_total(), 1);
        assert_eq!(source.in_flight(), 0);
    }

    #[tokio::test]
    async fn forget_drops_cached_values_for_actor() {
        let transport = Arc::new(InMemoryTransport::default());
        transport.set_region("Alex", "Orange");
        let source = CachedEnrichmentSource::new(transport.clone(), Handle::current());
        source.resolve_region("Alex");
        eventually(|| source.resolve_region("Alex")).await;

        source.forget("ALEX");
        transport.set_region("Alex", "Lime");

        assert_eq!(source.resolve_region("Alex"), None);
        assert_eq!(eventually(|| source.resolve_region("Alex")).await, "Lime");
    }

    fn with_ttl(transport: Arc<InMemoryTransport>, ttl: Duration) -> CachedEnrichmentSource {
        CachedEnrichmentSource::with_options(
            transport,
            Handle::current(),
            CachedSourceOptions {
                cache_ttl: ttl,
                ..CachedSourceOptions::default()
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn expired_region_is_served_while_a_refresh_fetches_the_new_value() {
        let transport = Arc::new(InMemoryTransport::default());
        transport.set_region("Alex", "Orange");
        let source = with_ttl(transport.clone(), Duration::from_secs(30));

        assert_eq!(source.resolve_region("Alex"), None);
        assert_eq!(eventually(|| source.resolve_region("Alex")).await, "Orange");
        transport.set_region("Alex", "Lime");

        for _ in 0..50 {
            assert_eq!(source.resolve_region("Alex").as_deref(), Some("Orange"));
        }
        assert_eq!(source.requests_total(), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(source.resolve_region("Alex").as_deref(), Some("Orange"));
        assert_eq!(source.requests_total(), 2);

        let refreshed = eventually(|| source.resolve_region("Alex").filter(|region| region == "Lime")).await;
        assert_eq!(refreshed, "Lime");
        settle(&source).await;
        assert_eq!(source.requests_total(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn evict_expired_bounds_per_viewer_dimension_entries() {
        let transport = Arc::new(InMemoryTransport::default());
        transport.set_dimension("Alex", "world");
        let source = with_ttl(transport, Duration::from_secs(30));

        for viewer in 0..20 {
            let viewer = format!("viewer{viewer}");
            source.resolve_dimension("Alex", &viewer);
            eventually(|| source.resolve_dimension("Alex", &viewer)).await;
        }
        assert_eq!(source.cached_entries(), 20);
        assert_eq!(source.evict_expired(), 0);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(source.evict_expired(), 20);
        assert_eq!(source.cached_entries(), 0);
    }

    #[tokio::test]
    async fn forget_drops_entries_where_actor_is_the_viewer() {
        let transport = Arc::new(InMemoryTransport::default());
        transport.set_dimension("Alex", "world_nether");
        let source = CachedEnrichmentSource::new(transport, Handle::current());
        source.resolve_dimension("Alex", "Steve");
        eventually(|| source.resolve_dimension("Alex", "Steve")).await;
        source.resolve_dimension("Alex", "Blake");
        eventually(|| source.resolve_dimension("Alex", "Blake")).await;

        source.forget("steve");

        assert_eq!(source.cached_entries(), 1);
        assert_eq!(source.resolve_dimension("Alex", "Blake").as_deref(), Some("world_nether"));
        settle(&source).await;
        assert_eq!(source.resolve_dimension("Alex", "Steve"), None);
    }
}
