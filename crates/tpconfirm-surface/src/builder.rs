use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tpconfirm_config::EnrichmentSettings;
use tpconfirm_protocol::{
    ActorId, EnrichmentKind, LocalActor, Region, RegionGraphic, RequestType, Surface, SurfaceId,
    SurfaceIdAllocator,
};

use crate::enrichment::{EnrichmentState, TargetTemplate};
use crate::placeholder::Placeholders;
use crate::poller::{EnrichmentPoller, PollerContext, PollerStats, PollerStatsSnapshot};
use crate::registry::LiveSurface;
use crate::services::SurfaceServices;
use crate::template::{RegionDescriptor, SurfaceTemplate};

/// Result of opening a surface: its id and the pollers started for it.
pub struct OpenedSurface {
    pub id: SurfaceId,
    pub pollers: Vec<Arc<EnrichmentPoller>>,
}

impl OpenedSurface {
    pub fn poller(&self, kind: EnrichmentKind) -> Option<&Arc<EnrichmentPoller>> {
        self.pollers.iter().find(|poller| poller.kind() == kind)
    }
}

/// Renders confirmation surfaces from the configured template and starts
/// enrichment for the data that is not available yet.
pub struct ConfirmationSurfaceBuilder {
    template: SurfaceTemplate,
    context: Arc<PollerContext>,
    ids: SurfaceIdAllocator,
    opened_total: AtomicU64,
}

impl ConfirmationSurfaceBuilder {
    pub fn new(
        template: SurfaceTemplate,
        settings: EnrichmentSettings,
        services: SurfaceServices,
    ) -> Self {
        let dimension_materials = template.dimension_materials.clone();
        Self {
            template,
            context: Arc::new(PollerContext {
                settings,
                dimension_materials,
                services,
                stats: Arc::new(PollerStats::default()),
            }),
            ids: SurfaceIdAllocator::default(),
            opened_total: AtomicU64::new(0),
        }
    }

    pub fn opened_total(&self) -> u64 {
        self.opened_total.load(Ordering::Relaxed)
    }

    pub fn poller_stats(&self) -> PollerStatsSnapshot {
        self.context.stats.snapshot()
    }

    /// Opens a confirmation surface for `viewer` about the request from
    /// `sender_name`, replacing whatever surface the viewer had open.
    pub fn open(&self, viewer: &ActorId, sender_name: &str, request_type: RequestType) -> OpenedSurface {
        let services = &self.context.services;
        let settings = &self.context.settings;
        let id = self.ids.allocate();
        let local = services.directory.local_actor(sender_name);

        let mut enrichment = match &local {
            Some(actor) => EnrichmentState::new(sender_name, &actor.region, &actor.dimension),
            None => EnrichmentState::new(sender_name, &settings.loading_text, &settings.loading_text),
        };
        let placeholders = enrichment.placeholders();

        let mut regions = BTreeMap::new();
        for descriptor in &self.template.regions {
            let region = self.render_region(descriptor, &placeholders, local.as_ref());
            if local.is_none() {
                record_targets(&mut enrichment, descriptor);
            }
            regions.insert(descriptor.slot, region);
        }

        let mut surface = Surface {
            id,
            viewer: viewer.clone(),
            sender_name: sender_name.to_owned(),
            request_type,
            title: placeholders.render(self.template.title_for(request_type)),
            rows: self.template.rows,
            regions,
        };

        if !enrichment.identity_targets.is_empty() {
            self.apply_cached_identity(viewer, sender_name, &mut surface, &mut enrichment);
        }

        // The session must exist before the host can report a close.
        services.sessions.open(viewer, Some(sender_name.to_owned()), id);
        let live = services.registry.register(LiveSurface::new(surface, enrichment));
        services.host.open(&live.snapshot());
        self.opened_total.fetch_add(1, Ordering::Relaxed);

        let pollers = self.start_pollers(&live);
        tracing::info!(
            viewer = %viewer,
            sender = sender_name,
            surface = %id,
            request_type = request_type.as_str(),
            local = local.is_some(),
            pollers = pollers.len(),
            "opened confirmation surface"
        );

        OpenedSurface { id, pollers }
    }

    fn render_region(
        &self,
        descriptor: &RegionDescriptor,
        placeholders: &Placeholders,
        local: Option<&LocalActor>,
    ) -> Region {
        let graphic = if descriptor.requires_remote_data {
            match local {
                Some(actor) => RegionGraphic::LocalIdentity(actor.id.clone()),
                None => RegionGraphic::PlaceholderIdentity,
            }
        } else if descriptor.needs_dimension() && local.is_some() {
            RegionGraphic::Material(
                self.template
                    .dimension_materials
                    .material_for(&placeholders.dimension)
                    .to_owned(),
            )
        } else {
            RegionGraphic::Material(descriptor.material.clone())
        };

        Region {
            slot: descriptor.slot,
            role: descriptor.role,
            graphic,
            lines: placeholders.render_lines(&descriptor.text),
        }
    }

    fn apply_cached_identity(
        &self,
        viewer: &ActorId,
        sender_name: &str,
        surface: &mut Surface,
        enrichment: &mut EnrichmentState,
    ) {
        let services = &self.context.services;
        let Some(identity) = services
            .source
            .resolve_identity(viewer, sender_name)
            .filter(|identity| !identity.value.trim().is_empty())
        else {
            return;
        };
        for slot in &enrichment.identity_targets {
            if let Some(region) = surface.region_mut(*slot) {
                // Unsupported hosts keep the placeholder identity.
                services.identity.apply_remote_identity(region, &identity);
            }
        }
        enrichment.identity_targets.clear();
    }

    fn start_pollers(&self, live: &Arc<LiveSurface>) -> Vec<Arc<EnrichmentPoller>> {
        let enrichment = live.enrichment_snapshot();
        [
            EnrichmentKind::Region,
            EnrichmentKind::Dimension,
            EnrichmentKind::Identity,
        ]
        .into_iter()
        .filter(|kind| enrichment.has_targets(*kind))
        .map(|kind| {
            let poller = EnrichmentPoller::new(kind, live, Arc::clone(&self.context));
            poller.start();
            poller
        })
        .collect()
    }
}

fn record_targets(enrichment: &mut EnrichmentState, descriptor: &RegionDescriptor) {
    let target = || TargetTemplate {
        slot: descriptor.slot,
        lines: descriptor.text.clone(),
    };
    if descriptor.needs_region() {
        enrichment.region_targets.push(target());
    }
    if descriptor.needs_dimension() {
        enrichment.dimension_targets.push(target());
    }
    if descriptor.requires_remote_data {
        enrichment.identity_targets.push(descriptor.slot);
    }
}
