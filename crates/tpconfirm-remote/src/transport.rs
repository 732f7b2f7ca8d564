use async_trait::async_trait;
use tpconfirm_protocol::wire::{EnrichmentRequest, EnrichmentResponse};

use crate::error::TransportResult;

/// Request/response channel to the process that owns a remote actor.
#[async_trait]
pub trait EnrichmentTransport: Send + Sync {
    async fn request(&self, request: EnrichmentRequest) -> TransportResult<EnrichmentResponse>;
}
