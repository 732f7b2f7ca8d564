use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tpconfirm_protocol::wire::{self, EnrichmentRequest, EnrichmentResponse};
use tpconfirm_protocol::{EnrichmentKind, RemoteEnrichmentResult, RemoteIdentity};

use crate::error::TransportResult;
use crate::transport::EnrichmentTransport;

/// Transport answering from an in-process table of remote actors.
///
/// Requests and responses go through the JSON wire codec so the payloads
/// match what a messaging channel would carry.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    latency: Duration,
    actors: DashMap<String, RemoteEnrichmentResult>,
}

impl InMemoryTransport {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            actors: DashMap::new(),
        }
    }

    pub fn set_region(&self, actor_name: &str, region: impl Into<String>) {
        self.record(actor_name).region = Some(region.into());
    }

    pub fn set_dimension(&self, actor_name: &str, dimension: impl Into<String>) {
        self.record(actor_name).dimension = Some(dimension.into());
    }

    pub fn set_identity(&self, actor_name: &str, identity: RemoteIdentity) {
        self.record(actor_name).identity = Some(identity);
    }

    pub fn forget(&self, actor_name: &str) -> bool {
        self.actors.remove(&actor_name.to_ascii_lowercase()).is_some()
    }

    fn record(&self, actor_name: &str) -> dashmap::mapref::one::RefMut<'_, String, RemoteEnrichmentResult> {
        self.actors
            .entry(actor_name.to_ascii_lowercase())
            .or_default()
    }

    fn answer(&self, request: &EnrichmentRequest) -> RemoteEnrichmentResult {
        let Some(known) = self.actors.get(&request.actor_name.to_ascii_lowercase()) else {
            return RemoteEnrichmentResult::default();
        };
        match request.kind {
            EnrichmentKind::Region => RemoteEnrichmentResult {
                region: known.region.clone(),
                ..Default::default()
            },
            EnrichmentKind::Dimension => RemoteEnrichmentResult {
                dimension: known.dimension.clone(),
                ..Default::default()
            },
            EnrichmentKind::Identity => RemoteEnrichmentResult {
                identity: known.identity.clone(),
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl EnrichmentTransport for InMemoryTransport {
    async fn request(&self, request: EnrichmentRequest) -> TransportResult<EnrichmentResponse> {
        let payload = wire::encode(&request)?;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let received: EnrichmentRequest = wire::decode(&payload)?;
        let response = EnrichmentResponse {
            request_id: received.request_id,
            actor_name: received.actor_name.clone(),
            result: self.answer(&received),
        };
        let payload = wire::encode(&response)?;
        Ok(wire::decode(&payload)?)
    }
}
