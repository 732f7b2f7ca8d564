//! JSON envelopes exchanged with the cross-process messaging transport.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enrichment::{EnrichmentKind, RemoteEnrichmentResult};
use crate::ids::ActorId;

pub const WIRE_CHANNEL: &str = "tpconfirm:enrichment";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentRequest {
    pub request_id: u64,
    pub kind: EnrichmentKind,
    pub actor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_id: Option<ActorId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentResponse {
    pub request_id: u64,
    pub actor_name: String,
    #[serde(default)]
    pub result: RemoteEnrichmentResult,
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("failed to encode enrichment message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode enrichment message: {0}")]
    Decode(#[source] serde_json::Error),
}

pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, WireError> {
    serde_json::to_vec(message).map_err(WireError::Encode)
}

pub fn decode<'a, T: Deserialize<'a>>(payload: &'a [u8]) -> Result<T, WireError> {
    serde_json::from_slice(payload).map_err(WireError::Decode)
}
