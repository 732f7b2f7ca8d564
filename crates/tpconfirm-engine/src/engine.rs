use std::sync::{Arc, Weak};
use std::time::Duration;

use tpconfirm_config::{ConfirmationSettings, TpConfirmConfig};
use tpconfirm_protocol::{
    ActorDirectory, ActorId, RemoteEnrichmentSource, RemoteRequestNotification, RequestType,
    SurfaceHost, SurfaceId, TeleportService, ToggleState,
};
use tpconfirm_scheduler::{Clock, Scheduler};
use tpconfirm_state::{BypassWindow, PendingRequestStore, SessionTracker};
use tpconfirm_surface::{
    ConfirmationSurfaceBuilder, IdentityApplier, OpenedSurface, SurfaceRegistry, SurfaceServices,
    SurfaceTemplate,
};

use crate::interceptor::{CommandInterceptor, InterceptOutcome};
use crate::router::{ActionRouter, ClickOutcome, CloseOutcome, RouterParts};
use crate::stats::{ConfirmationStatsSnapshot, EngineCounters};

/// Host-provided collaborators the engine is built from.
pub struct EngineCollaborators {
    pub host: Arc<dyn SurfaceHost>,
    pub service: Arc<dyn TeleportService>,
    pub directory: Arc<dyn ActorDirectory>,
    pub source: Arc<dyn RemoteEnrichmentSource>,
    pub toggles: Arc<dyn ToggleState>,
    pub scheduler: Arc<dyn Scheduler>,
    pub clock: Arc<dyn Clock>,
    pub identity: Arc<dyn IdentityApplier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteRequestIgnored {
    BlankSender,
    UnknownType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRequestOutcome {
    Recorded,
    Opened { surface_id: SurfaceId },
    Ignored(RemoteRequestIgnored),
}

/// Owns the shared state of the confirmation flow and routes host events
/// into it. Constructed once per process.
pub struct ConfirmationEngine {
    settings: ConfirmationSettings,
    store: Arc<PendingRequestStore>,
    bypass: Arc<BypassWindow>,
    sessions: Arc<SessionTracker>,
    registry: Arc<SurfaceRegistry>,
    builder: Arc<ConfirmationSurfaceBuilder>,
    interceptor: CommandInterceptor,
    router: ActionRouter,
    directory: Arc<dyn ActorDirectory>,
    source: Arc<dyn RemoteEnrichmentSource>,
    toggles: Arc<dyn ToggleState>,
    scheduler: Arc<dyn Scheduler>,
    cache_ttl: Duration,
    counters: Arc<EngineCounters>,
}

impl ConfirmationEngine {
    pub fn new(config: &TpConfirmConfig, collaborators: EngineCollaborators) -> Self {
        let EngineCollaborators {
            host,
            service,
            directory,
            source,
            toggles,
            scheduler,
            clock,
            identity,
        } = collaborators;
        let settings = config.confirmation_settings();
        let enrichment = config.enrichment_settings();
        let cache_ttl = enrichment.cache_ttl;
        let store = Arc::new(PendingRequestStore::new(Arc::clone(&clock)));
        let bypass = Arc::new(BypassWindow::new(clock));
        let sessions = Arc::new(SessionTracker::new());
        let registry = Arc::new(SurfaceRegistry::new());
        let counters = Arc::new(EngineCounters::default());

        let builder = Arc::new(ConfirmationSurfaceBuilder::new(
            SurfaceTemplate::from_config(&config.surface_template()),
            enrichment,
            SurfaceServices {
                registry: Arc::clone(&registry),
                sessions: Arc::clone(&sessions),
                directory: Arc::clone(&directory),
                source: Arc::clone(&source),
                host: Arc::clone(&host),
                scheduler: Arc::clone(&scheduler),
                identity,
            },
        ));
        let interceptor = CommandInterceptor::new(
            settings.clone(),
            Arc::clone(&store),
            Arc::clone(&bypass),
            Arc::clone(&toggles),
            Arc::clone(&host),
            Arc::clone(&builder),
            Arc::clone(&counters),
        );
        let router = ActionRouter::new(RouterParts {
            settings: settings.clone(),
            store: Arc::clone(&store),
            bypass: Arc::clone(&bypass),
            sessions: Arc::clone(&sessions),
            registry: Arc::clone(&registry),
            host,
            service,
            scheduler: Arc::clone(&scheduler),
            counters: Arc::clone(&counters),
        });

        Self {
            settings,
            store,
            bypass,
            sessions,
            registry,
            builder,
            interceptor,
            router,
            directory,
            source,
            toggles,
            scheduler,
            cache_ttl,
            counters,
        }
    }

    /// Offers a command typed by `actor` to the engine. When the outcome
    /// cancels the command the host must not forward it.
    pub fn intercept_command(&self, actor: &ActorId, raw: &str) -> InterceptOutcome {
        self.interceptor.intercept(actor, raw)
    }

    pub fn on_click(&self, viewer: &ActorId, slot: usize) -> ClickOutcome {
        self.router.on_click(viewer, slot)
    }

    pub fn on_close(&self, viewer: &ActorId, surface_id: SurfaceId) -> CloseOutcome {
        self.router.on_close(viewer, surface_id)
    }

    /// Records an incoming teleport request and, if configured, shows the
    /// target a confirmation surface for it right away.
    pub fn on_remote_request(&self, notification: &RemoteRequestNotification) -> RemoteRequestOutcome {
        let sender_name = notification.sender_name.trim();
        if sender_name.is_empty() {
            return RemoteRequestOutcome::Ignored(RemoteRequestIgnored::BlankSender);
        }
        let request_type = match notification.request_type.parse::<RequestType>() {
            Ok(request_type) => request_type,
            Err(error) => {
                tracing::debug!(
                    error = %error,
                    viewer = %notification.target,
                    sender = sender_name,
                    "ignoring teleport request notification"
                );
                return RemoteRequestOutcome::Ignored(RemoteRequestIgnored::UnknownType);
            }
        };

        let target = &notification.target;
        self.store
            .set(target, sender_name, notification.sender_id.clone(), request_type);
        EngineCounters::bump(&self.counters.remote_requests_total);
        tracing::debug!(
            viewer = %target,
            sender = sender_name,
            request_type = request_type.as_str(),
            "recorded pending teleport request"
        );

        let auto_open = self.settings.enabled
            && self.settings.auto_open_on_request
            && self.toggles.auto_open_enabled(target)
            && self.directory.is_online(target);
        if !auto_open {
            return RemoteRequestOutcome::Recorded;
        }
        let opened = self.builder.open(target, sender_name, request_type);
        RemoteRequestOutcome::Opened {
            surface_id: opened.id,
        }
    }

    /// Opens a confirmation surface directly, bypassing command resolution.
    pub fn open_surface(&self, viewer: &ActorId, sender_name: &str, request_type: RequestType) -> OpenedSurface {
        self.builder.open(viewer, sender_name, request_type)
    }

    /// Forgets everything about an actor leaving the process, including
    /// cached remote answers keyed by its name. No terminal command is issued
    /// for its open surface.
    pub fn on_disconnect(&self, actor: &ActorId) -> usize {
        self.registry.remove(actor);
        self.sessions.close(actor);
        self.source.forget(&self.directory.display_name(actor));
        self.store.clear(actor)
    }

    pub fn prune_stale(&self) -> usize {
        let Some(max_age) = self.settings.stale_request_after else {
            return 0;
        };
        let evicted = self.store.prune_stale(max_age);
        if evicted > 0 {
            self.counters
                .stale_requests_pruned_total
                .fetch_add(evicted as u64, std::sync::atomic::Ordering::Relaxed);
            tracing::debug!(evicted, "pruned stale teleport requests");
        }
        evicted
    }

    pub fn evict_expired_enrichment(&self) -> usize {
        let evicted = self.source.evict_expired();
        if evicted > 0 {
            self.counters
                .enrichment_evicted_total
                .fetch_add(evicted as u64, std::sync::atomic::Ordering::Relaxed);
        }
        evicted
    }

    /// Schedules staleness eviction every `stale_request_secs` and expired
    /// enrichment eviction every `cache_ttl_secs`. Stops once the engine is
    /// dropped.
    pub fn start_maintenance(self: &Arc<Self>) {
        if let Some(interval) = self.settings.stale_request_after {
            Self::schedule_recurring(
                Arc::downgrade(self),
                Arc::clone(&self.scheduler),
                interval,
                |engine| {
                    engine.prune_stale();
                },
            );
        }
        Self::schedule_recurring(
            Arc::downgrade(self),
            Arc::clone(&self.scheduler),
            self.cache_ttl,
            |engine| {
                engine.evict_expired_enrichment();
            },
        );
    }

    fn schedule_recurring(
        engine: Weak<Self>,
        scheduler: Arc<dyn Scheduler>,
        interval: Duration,
        job: fn(&Self),
    ) {
        let next_scheduler = Arc::clone(&scheduler);
        scheduler.run_after(
            interval,
            Box::new(move || {
                let Some(live) = engine.upgrade() else {
                    return;
                };
                job(&live);
                drop(live);
                Self::schedule_recurring(engine, next_scheduler, interval, job);
            }),
        );
    }

    pub fn stats(&self) -> ConfirmationStatsSnapshot {
        let counters = &self.counters;
        ConfirmationStatsSnapshot {
            pending_requests: self.store.len(),
            open_sessions: self.sessions.len(),
            remote_requests_total: EngineCounters::load(&counters.remote_requests_total),
            surfaces_opened_total: self.builder.opened_total(),
            commands_intercepted_total: EngineCounters::load(&counters.commands_intercepted_total),
            commands_unresolved_total: EngineCounters::load(&counters.commands_unresolved_total),
            terminal_dispatches_total: EngineCounters::load(&counters.terminal_dispatches_total),
            dispatch_failures_total: EngineCounters::load(&counters.dispatch_failures_total),
            auto_denies_total: EngineCounters::load(&counters.auto_denies_total),
            stale_requests_pruned_total: EngineCounters::load(&counters.stale_requests_pruned_total),
            enrichment_evicted_total: EngineCounters::load(&counters.enrichment_evicted_total),
            pollers: self.builder.poller_stats(),
        }
    }

    pub fn settings(&self) -> &ConfirmationSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<PendingRequestStore> {
        &self.store
    }

    pub fn bypass(&self) -> &Arc<BypassWindow> {
        &self.bypass
    }

    pub fn sessions(&self) -> &Arc<SessionTracker> {
        &self.sessions
    }

    pub fn registry(&self) -> &Arc<SurfaceRegistry> {
        &self.registry
    }
}
