use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tpconfirm_config::EnrichmentSettings;
use tpconfirm_protocol::{ActorId, EnrichmentKind, RegionGraphic, RemoteIdentity, SurfaceId};

use crate::dimension::DimensionMaterials;
use crate::placeholder::is_placeholder_value;
use crate::registry::LiveSurface;
use crate::services::SurfaceServices;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Polling { attempts: u32 },
    Resolved { attempts: u32 },
    TimedOut,
    Aborted { attempts: u32 },
}

impl PollerState {
    pub fn is_finished(self) -> bool {
        !matches!(self, Self::Polling { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollerStatsSnapshot {
    pub started_total: u64,
    pub polls_total: u64,
    pub resolved_total: u64,
    pub timed_out_total: u64,
    pub aborted_total: u64,
}

#[derive(Debug, Default)]
pub struct PollerStats {
    started_total: AtomicU64,
    polls_total: AtomicU64,
    resolved_total: AtomicU64,
    timed_out_total: AtomicU64,
    aborted_total: AtomicU64,
}

impl PollerStats {
    pub fn snapshot(&self) -> PollerStatsSnapshot {
        PollerStatsSnapshot {
            started_total: self.started_total.load(Ordering::Relaxed),
            polls_total: self.polls_total.load(Ordering::Relaxed),
            resolved_total: self.resolved_total.load(Ordering::Relaxed),
            timed_out_total: self.timed_out_total.load(Ordering::Relaxed),
            aborted_total: self.aborted_total.load(Ordering::Relaxed),
        }
    }

    fn record_transition(&self, state: PollerState) {
        let counter = match state {
            PollerState::Polling { .. } => return,
            PollerState::Resolved { .. } => &self.resolved_total,
            PollerState::TimedOut => &self.timed_out_total,
            PollerState::Aborted { .. } => &self.aborted_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Everything a poller needs besides its own target.
pub struct PollerContext {
    pub settings: EnrichmentSettings,
    pub dimension_materials: DimensionMaterials,
    pub services: SurfaceServices,
    pub stats: Arc<PollerStats>,
}

enum Lookup {
    Text(String),
    Identity(RemoteIdentity),
}

/// Bounded-retry polling of one enrichment stream for one open surface.
///
/// Each tick runs on the main context through the scheduler and either
/// reschedules itself or finishes. Once finished it never touches the
/// surface again.
pub struct EnrichmentPoller {
    kind: EnrichmentKind,
    viewer: ActorId,
    surface_id: SurfaceId,
    sender_name: String,
    context: Arc<PollerContext>,
    state: Mutex<PollerState>,
}

impl EnrichmentPoller {
    pub fn new(kind: EnrichmentKind, live: &LiveSurface, context: Arc<PollerContext>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            viewer: live.viewer().clone(),
            surface_id: live.id(),
            sender_name: live.sender_name().to_owned(),
            context,
            state: Mutex::new(PollerState::Polling { attempts: 0 }),
        })
    }

    pub fn kind(&self) -> EnrichmentKind {
        self.kind
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    pub fn state(&self) -> PollerState {
        *self.state.lock().expect("enrichment poller state lock poisoned")
    }

    /// Schedules the first poll one interval from now.
    pub fn start(self: &Arc<Self>) {
        self.context
            .stats
            .started_total
            .fetch_add(1, Ordering::Relaxed);
        self.schedule_next();
    }

    /// Runs one poll. Returns the state after the poll.
    pub fn poll(self: &Arc<Self>) -> PollerState {
        let mut state = self.state.lock().expect("enrichment poller state lock poisoned");
        let PollerState::Polling { attempts } = *state else {
            return *state;
        };

        let services = &self.context.services;
        let live = if services.directory.is_online(&self.viewer) {
            services.registry.current_if(&self.viewer, self.surface_id)
        } else {
            None
        };
        let Some(live) = live else {
            *state = PollerState::Aborted { attempts };
            self.context.stats.record_transition(*state);
            tracing::debug!(
                viewer = %self.viewer,
                surface = %self.surface_id,
                kind = self.kind.as_str(),
                attempts,
                "enrichment poller aborted, surface no longer open"
            );
            return *state;
        };

        let attempts = attempts + 1;
        self.context.stats.polls_total.fetch_add(1, Ordering::Relaxed);

        if let Some(lookup) = self.lookup() {
            *state = PollerState::Resolved { attempts };
            self.context.stats.record_transition(*state);
            tracing::debug!(
                viewer = %self.viewer,
                surface = %self.surface_id,
                kind = self.kind.as_str(),
                attempts,
                "enrichment resolved"
            );
            self.apply_resolved(&live, lookup);
            return *state;
        }

        if attempts >= self.context.settings.max_attempts {
            *state = PollerState::TimedOut;
            self.context.stats.record_transition(*state);
            tracing::debug!(
                viewer = %self.viewer,
                surface = %self.surface_id,
                kind = self.kind.as_str(),
                attempts,
                "enrichment timed out, showing fallback"
            );
            self.apply_fallback(&live);
            return *state;
        }

        *state = PollerState::Polling { attempts };
        drop(state);
        self.schedule_next();
        PollerState::Polling { attempts }
    }

    fn schedule_next(self: &Arc<Self>) {
        let poller = Arc::clone(self);
        self.context.services.scheduler.run_after(
            self.context.settings.poll_interval,
            Box::new(move || {
                poller.poll();
            }),
        );
    }

    fn lookup(&self) -> Option<Lookup> {
        let services = &self.context.services;
        let loading_text = &self.context.settings.loading_text;
        let text = match self.kind {
            EnrichmentKind::Region => services.source.resolve_region(&self.sender_name),
            EnrichmentKind::Dimension => {
                let viewer_name = services.directory.display_name(&self.viewer);
                services
                    .source
                    .resolve_dimension(&self.sender_name, &viewer_name)
            }
            EnrichmentKind::Identity => {
                return services
                    .source
                    .resolve_identity(&self.viewer, &self.sender_name)
                    .filter(|identity| !identity.value.trim().is_empty())
                    .map(Lookup::Identity);
            }
        };
        text.filter(|value| !is_placeholder_value(value, loading_text))
            .map(|value| Lookup::Text(value.trim().to_owned()))
    }

    fn apply_resolved(&self, live: &LiveSurface, lookup: Lookup) {
        match lookup {
            Lookup::Text(value) => self.rewrite_text(live, &value, true),
            Lookup::Identity(identity) => self.apply_identity(live, &identity),
        }
    }

    fn apply_fallback(&self, live: &LiveSurface) {
        let fallback = match self.kind {
            EnrichmentKind::Region => self.context.settings.region_fallback.clone(),
            EnrichmentKind::Dimension => self.context.settings.dimension_fallback.clone(),
            EnrichmentKind::Identity => return,
        };
        self.rewrite_text(live, &fallback, false);
    }

    fn rewrite_text(&self, live: &LiveSurface, value: &str, swap_material: bool) {
        let mut enrichment = live.enrichment();
        enrichment.set_value(self.kind, value);
        let rendered = enrichment.render_targets(self.kind);

        let snapshot = {
            let mut surface = live.surface();
            for (slot, lines) in rendered {
                let Some(region) = surface.region_mut(slot) else {
                    continue;
                };
                region.lines = lines;
                if swap_material && self.kind == EnrichmentKind::Dimension {
                    if let RegionGraphic::Material(material) = &mut region.graphic {
                        *material = self.context.dimension_materials.material_for(value).to_owned();
                    }
                }
            }
            surface.clone()
        };
        drop(enrichment);
        self.context.services.host.refresh(&snapshot);
    }

    fn apply_identity(&self, live: &LiveSurface, identity: &RemoteIdentity) {
        let targets = live.enrichment().identity_targets.clone();
        let snapshot = {
            let mut surface = live.surface();
            let mut applied = false;
            for slot in targets {
                if let Some(region) = surface.region_mut(slot) {
                    applied |= self
                        .context
                        .services
                        .identity
                        .apply_remote_identity(region, identity);
                }
            }
            applied.then(|| surface.clone())
        };
        match snapshot {
            Some(snapshot) => self.context.services.host.refresh(&snapshot),
            None => tracing::debug!(
                viewer = %self.viewer,
                surface = %self.surface_id,
                "remote identity could not be applied, keeping placeholder"
            ),
        }
    }
}
