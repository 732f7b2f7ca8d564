use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;
use tpconfirm_protocol::{ActorId, RegionRole, Surface, SurfaceId};

use crate::enrichment::EnrichmentState;

/// A surface currently shown to a viewer, plus its enrichment bookkeeping.
///
/// Lock order is `enrichment` before `surface`.
#[derive(Debug)]
pub struct LiveSurface {
    id: SurfaceId,
    viewer: ActorId,
    sender_name: String,
    enrichment: Mutex<EnrichmentState>,
    surface: Mutex<Surface>,
}

impl LiveSurface {
    pub fn new(surface: Surface, enrichment: EnrichmentState) -> Self {
        Self {
            id: surface.id,
            viewer: surface.viewer.clone(),
            sender_name: surface.sender_name.clone(),
            enrichment: Mutex::new(enrichment),
            surface: Mutex::new(surface),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn viewer(&self) -> &ActorId {
        &self.viewer
    }

    pub fn sender_name(&self) -> &str {
        &self.sender_name
    }

    pub fn role_at(&self, slot: usize) -> Option<RegionRole> {
        self.surface().role_at(slot)
    }

    pub fn snapshot(&self) -> Surface {
        self.surface().clone()
    }

    pub fn enrichment_snapshot(&self) -> EnrichmentState {
        self.enrichment().clone()
    }

    pub(crate) fn enrichment(&self) -> MutexGuard<'_, EnrichmentState> {
        self.enrichment
            .lock()
            .expect("live surface enrichment lock poisoned")
    }

    pub(crate) fn surface(&self) -> MutexGuard<'_, Surface> {
        self.surface.lock().expect("live surface lock poisoned")
    }
}

/// The surface each viewer currently has open. At most one per viewer.
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    open: DashMap<ActorId, Arc<LiveSurface>>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, live: LiveSurface) -> Arc<LiveSurface> {
        let live = Arc::new(live);
        self.open.insert(live.viewer().clone(), Arc::clone(&live));
        live
    }

    pub fn current(&self, viewer: &ActorId) -> Option<Arc<LiveSurface>> {
        self.open.get(viewer).map(|live| Arc::clone(live.value()))
    }

    /// The viewer's open surface, but only if it is still `surface_id`.
    pub fn current_if(&self, viewer: &ActorId, surface_id: SurfaceId) -> Option<Arc<LiveSurface>> {
        self.current(viewer).filter(|live| live.id() == surface_id)
    }

    pub fn remove(&self, viewer: &ActorId) -> Option<Arc<LiveSurface>> {
        self.open.remove(viewer).map(|(_, live)| live)
    }

    pub fn remove_surface(&self, viewer: &ActorId, surface_id: SurfaceId) -> Option<Arc<LiveSurface>> {
        self.open
            .remove_if(viewer, |_, live| live.id() == surface_id)
            .map(|(_, live)| live)
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}
