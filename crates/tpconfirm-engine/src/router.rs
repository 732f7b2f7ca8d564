use std::sync::Arc;

use tpconfirm_config::ConfirmationSettings;
use tpconfirm_protocol::{
    ActorId, Feedback, RegionRole, SurfaceHost, SurfaceId, TeleportService, TerminalAction,
    TerminalCommand,
};
use tpconfirm_scheduler::Scheduler;
use tpconfirm_state::{BypassWindow, PendingRequestStore, SessionTracker};
use tpconfirm_surface::SurfaceRegistry;

use crate::stats::EngineCounters;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickIgnored {
    NoSurface,
    NotTerminal,
    NoSession,
    AlreadyActed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The terminal command is scheduled; it runs after the dispatch delay.
    Dispatching {
        action: TerminalAction,
        sender_name: Option<String>,
        surface_id: SurfaceId,
    },
    Ignored(ClickIgnored),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The surface was not the viewer's live surface.
    NoSession,
    AlreadyActed,
    AutoDenyDisabled,
    NoSender,
    AutoDenied { sender_name: String },
}

/// Applies the single terminal action of an open surface, from a click or
/// from the viewer abandoning it.
pub struct ActionRouter {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    settings: ConfirmationSettings,
    store: Arc<PendingRequestStore>,
    bypass: Arc<BypassWindow>,
    sessions: Arc<SessionTracker>,
    registry: Arc<SurfaceRegistry>,
    host: Arc<dyn SurfaceHost>,
    service: Arc<dyn TeleportService>,
    scheduler: Arc<dyn Scheduler>,
    counters: Arc<EngineCounters>,
}

pub(crate) struct RouterParts {
    pub(crate) settings: ConfirmationSettings,
    pub(crate) store: Arc<PendingRequestStore>,
    pub(crate) bypass: Arc<BypassWindow>,
    pub(crate) sessions: Arc<SessionTracker>,
    pub(crate) registry: Arc<SurfaceRegistry>,
    pub(crate) host: Arc<dyn SurfaceHost>,
    pub(crate) service: Arc<dyn TeleportService>,
    pub(crate) scheduler: Arc<dyn Scheduler>,
    pub(crate) counters: Arc<EngineCounters>,
}

impl ActionRouter {
    pub(crate) fn new(parts: RouterParts) -> Self {
        let RouterParts {
            settings,
            store,
            bypass,
            sessions,
            registry,
            host,
            service,
            scheduler,
            counters,
        } = parts;
        Self {
            inner: Arc::new(RouterInner {
                settings,
                store,
                bypass,
                sessions,
                registry,
                host,
                service,
                scheduler,
                counters,
            }),
        }
    }

    pub fn on_click(&self, viewer: &ActorId, slot: usize) -> ClickOutcome {
        let inner = &self.inner;
        let Some(live) = inner.registry.current(viewer) else {
            return ClickOutcome::Ignored(ClickIgnored::NoSurface);
        };
        let action = match live.role_at(slot) {
            Some(RegionRole::Accept) => TerminalAction::Accept,
            Some(RegionRole::Deny) => TerminalAction::Deny,
            _ => return ClickOutcome::Ignored(ClickIgnored::NotTerminal),
        };
        match inner.sessions.get(viewer) {
            Some(session) if session.surface_id == live.id() => {}
            _ => return ClickOutcome::Ignored(ClickIgnored::NoSession),
        }
        let Some(session) = inner.sessions.mark_acted(viewer) else {
            return ClickOutcome::Ignored(ClickIgnored::AlreadyActed);
        };

        let surface_id = session.surface_id;
        let sender_name = session
            .sender_name
            .or_else(|| inner.store.get(viewer).map(|request| request.sender_name));

        inner.bypass.arm(viewer, inner.settings.bypass_window);
        if inner.settings.play_feedback {
            let feedback = match action {
                TerminalAction::Accept => Feedback::Accept,
                TerminalAction::Deny => Feedback::Deny,
            };
            inner.host.play_feedback(viewer, feedback);
        }
        if inner.settings.close_on_click {
            inner.host.close(viewer);
        }

        let task_inner = Arc::clone(inner);
        let task_viewer = viewer.clone();
        let task_sender = sender_name.clone();
        inner.scheduler.run_after(
            inner.settings.dispatch_delay,
            Box::new(move || {
                task_inner.dispatch(&task_viewer, action, task_sender.as_deref());
                if let Some(sender) = task_sender.as_deref() {
                    task_inner.store.remove(&task_viewer, sender);
                }
                task_inner.sessions.close_surface(&task_viewer, surface_id);
                task_inner.registry.remove_surface(&task_viewer, surface_id);
            }),
        );

        ClickOutcome::Dispatching {
            action,
            sender_name,
            surface_id,
        }
    }

    pub fn on_close(&self, viewer: &ActorId, surface_id: SurfaceId) -> CloseOutcome {
        let inner = &self.inner;
        inner.registry.remove_surface(viewer, surface_id);
        let Some(session) = inner.sessions.close_surface(viewer, surface_id) else {
            return CloseOutcome::NoSession;
        };
        if session.acted {
            return CloseOutcome::AlreadyActed;
        }
        if !inner.settings.auto_deny_on_close {
            return CloseOutcome::AutoDenyDisabled;
        }
        let Some(sender_name) = session
            .sender_name
            .or_else(|| inner.store.get(viewer).map(|request| request.sender_name))
        else {
            tracing::debug!(viewer = %viewer, surface = %surface_id, "surface closed with no resolvable sender");
            return CloseOutcome::NoSender;
        };

        inner.bypass.arm(viewer, inner.settings.bypass_window);
        inner.store.remove(viewer, &sender_name);
        EngineCounters::bump(&inner.counters.auto_denies_total);
        tracing::info!(
            viewer = %viewer,
            sender = %sender_name,
            surface = %surface_id,
            "surface abandoned, auto-denying request"
        );

        let task_inner = Arc::clone(inner);
        let task_viewer = viewer.clone();
        let task_sender = sender_name.clone();
        inner.scheduler.run_now(Box::new(move || {
            task_inner.dispatch(&task_viewer, TerminalAction::Deny, Some(&task_sender));
        }));

        CloseOutcome::AutoDenied { sender_name }
    }
}

impl RouterInner {
    fn dispatch(&self, viewer: &ActorId, action: TerminalAction, sender_name: Option<&str>) {
        let verb = match action {
            TerminalAction::Accept => &self.settings.accept_command,
            TerminalAction::Deny => &self.settings.deny_command,
        };
        let command = TerminalCommand {
            action,
            verb: verb.clone(),
            sender_name: sender_name
                .filter(|_| self.settings.include_sender_in_command)
                .map(str::to_owned),
        };

        match self.service.dispatch(viewer, &command) {
            Ok(()) => {
                EngineCounters::bump(&self.counters.terminal_dispatches_total);
                tracing::info!(viewer = %viewer, command = %command, "dispatched terminal command");
            }
            Err(error) => {
                EngineCounters::bump(&self.counters.dispatch_failures_total);
                tracing::warn!(
                    error = %error,
                    viewer = %viewer,
                    command = %command,
                    "terminal command dispatch failed"
                );
                self.host
                    .send_message(viewer, &self.settings.dispatch_failed_message);
            }
        }
    }
}
