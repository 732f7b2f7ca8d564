use std::sync::Arc;

use tpconfirm_protocol::{ActorDirectory, RemoteEnrichmentSource, SurfaceHost};
use tpconfirm_scheduler::Scheduler;
use tpconfirm_state::SessionTracker;

use crate::identity::IdentityApplier;
use crate::registry::SurfaceRegistry;

/// Collaborators shared by the surface builder and its pollers.
#[derive(Clone)]
pub struct SurfaceServices {
    pub registry: Arc<SurfaceRegistry>,
    pub sessions: Arc<SessionTracker>,
    pub directory: Arc<dyn ActorDirectory>,
    pub source: Arc<dyn RemoteEnrichmentSource>,
    pub host: Arc<dyn SurfaceHost>,
    pub scheduler: Arc<dyn Scheduler>,
    pub identity: Arc<dyn IdentityApplier>,
}
