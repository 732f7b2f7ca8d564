use thiserror::Error;
use tpconfirm_protocol::wire::WireError;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("enrichment transport unavailable: {0}")]
    Unavailable(String),
    #[error("enrichment request {request_id} timed out")]
    Timeout { request_id: u64 },
    #[error("enrichment response for request {expected} carried id {actual}")]
    Mismatched { expected: u64, actual: u64 },
    #[error(transparent)]
    Wire(#[from] WireError),
}

pub type TransportResult<T> = Result<T, TransportError>;
