use serde::{Deserialize, Serialize};

use crate::ids::ActorId;
use crate::surface::RemoteIdentity;

/// Best-effort, non-blocking lookup of data about actors that live in
/// another process. Every call returns the best value known right now;
/// `None` means "no answer yet", never an error.
pub trait RemoteEnrichmentSource: Send + Sync {
    fn resolve_region(&self, actor_name: &str) -> Option<String>;

    /// May fire an out-of-band request the first time a pair is seen.
    fn resolve_dimension(&self, actor_name: &str, viewer_name: &str) -> Option<String>;

    fn resolve_identity(&self, viewer: &ActorId, actor_name: &str) -> Option<RemoteIdentity>;

    /// Drops whatever is known about `actor_name`, whether it was looked up
    /// or did the looking.
    fn forget(&self, _actor_name: &str) {}

    /// Drops answers that outlived their freshness window. Returns how many
    /// were dropped.
    fn evict_expired(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteEnrichmentResult {
    pub region: Option<String>,
    pub dimension: Option<String>,
    pub identity: Option<RemoteIdentity>,
}

impl RemoteEnrichmentResult {
    pub fn is_empty(&self) -> bool {
        self.region.is_none() && self.dimension.is_none() && self.identity.is_none()
    }
}

/// Which stream of enrichment data a lookup or poller deals with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentKind {
    Region,
    Dimension,
    Identity,
}

impl EnrichmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Dimension => "dimension",
            Self::Identity => "identity",
        }
    }
}
