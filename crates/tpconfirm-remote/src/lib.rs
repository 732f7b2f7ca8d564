//! Non-blocking remote enrichment backed by an asynchronous transport.

pub mod cached;
pub mod error;
pub mod memory;
pub mod transport;

pub use cached::{CachedEnrichmentSource, CachedSourceOptions};
pub use error::{TransportError, TransportResult};
pub use memory::InMemoryTransport;
pub use transport::EnrichmentTransport;
