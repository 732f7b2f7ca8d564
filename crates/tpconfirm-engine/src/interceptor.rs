use std::sync::Arc;

use tpconfirm_config::ConfirmationSettings;
use tpconfirm_protocol::{ActorId, RequestType, SurfaceHost, SurfaceId, TerminalAction, ToggleState};
use tpconfirm_state::{BypassWindow, PendingRequestStore};
use tpconfirm_surface::placeholder::SENDER_TOKEN;
use tpconfirm_surface::ConfirmationSurfaceBuilder;

use crate::command::ParsedCommand;
use crate::stats::EngineCounters;

/// Why a command was left for normal processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassThrough {
    /// Issued by the engine itself inside an armed bypass window.
    Bypassed,
    FeatureDisabled,
    ActorOptedOut,
    UnrecognizedVerb,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptOutcome {
    PassThrough(PassThrough),
    /// The command was cancelled and no surface could be opened.
    Suppressed { message: String },
    /// The command was cancelled and a confirmation surface opened instead.
    Opened {
        action: TerminalAction,
        sender_name: String,
        request_type: RequestType,
        surface_id: SurfaceId,
    },
}

impl InterceptOutcome {
    /// Whether the original command must be kept from the teleport service.
    pub fn cancels_command(&self) -> bool {
        !matches!(self, Self::PassThrough(_))
    }
}

/// Turns accept/deny commands typed by a player into confirmation surfaces.
pub struct CommandInterceptor {
    settings: ConfirmationSettings,
    store: Arc<PendingRequestStore>,
    bypass: Arc<BypassWindow>,
    toggles: Arc<dyn ToggleState>,
    host: Arc<dyn SurfaceHost>,
    builder: Arc<ConfirmationSurfaceBuilder>,
    counters: Arc<EngineCounters>,
}

impl CommandInterceptor {
    pub(crate) fn new(
        settings: ConfirmationSettings,
        store: Arc<PendingRequestStore>,
        bypass: Arc<BypassWindow>,
        toggles: Arc<dyn ToggleState>,
        host: Arc<dyn SurfaceHost>,
        builder: Arc<ConfirmationSurfaceBuilder>,
        counters: Arc<EngineCounters>,
    ) -> Self {
        Self {
            settings,
            store,
            bypass,
            toggles,
            host,
            builder,
            counters,
        }
    }

    pub fn intercept(&self, actor: &ActorId, raw: &str) -> InterceptOutcome {
        if self.bypass.is_active(actor) {
            tracing::debug!(actor = %actor, command = raw, "bypass window active, passing command through");
            return InterceptOutcome::PassThrough(PassThrough::Bypassed);
        }
        if !self.settings.enabled {
            return InterceptOutcome::PassThrough(PassThrough::FeatureDisabled);
        }
        if !self.toggles.confirmation_enabled(actor) {
            return InterceptOutcome::PassThrough(PassThrough::ActorOptedOut);
        }

        let Some(command) = ParsedCommand::parse(raw) else {
            return InterceptOutcome::PassThrough(PassThrough::UnrecognizedVerb);
        };
        let Some(action) = self.classify(&command.verb) else {
            return InterceptOutcome::PassThrough(PassThrough::UnrecognizedVerb);
        };
        EngineCounters::bump(&self.counters.commands_intercepted_total);

        let Some((sender_name, request_type)) = self.resolve(actor, command.first_arg()) else {
            let message = match command.first_arg() {
                Some(sender) => self
                    .settings
                    .no_request_from_sender_message
                    .replace(SENDER_TOKEN, sender),
                None => self.settings.no_pending_request_message.clone(),
            };
            EngineCounters::bump(&self.counters.commands_unresolved_total);
            tracing::debug!(actor = %actor, command = raw, "no pending request to confirm");
            self.host.send_message(actor, &message);
            return InterceptOutcome::Suppressed { message };
        };

        let opened = self.builder.open(actor, &sender_name, request_type);
        InterceptOutcome::Opened {
            action,
            sender_name,
            request_type,
            surface_id: opened.id,
        }
    }

    fn classify(&self, verb: &str) -> Option<TerminalAction> {
        if self.settings.accept_verbs.iter().any(|candidate| candidate == verb) {
            Some(TerminalAction::Accept)
        } else if self.settings.deny_verbs.iter().any(|candidate| candidate == verb) {
            Some(TerminalAction::Deny)
        } else {
            None
        }
    }

    /// Canonical sender name and request type for a command issued by
    /// `actor`, optionally naming the sender.
    fn resolve(&self, actor: &ActorId, argument: Option<&str>) -> Option<(String, RequestType)> {
        let latest = self.store.get(actor);
        let Some(argument) = argument else {
            return latest.map(|request| (request.sender_name, request.request_type));
        };
        if let Some(request) = self.store.get_from(actor, argument) {
            return Some((request.sender_name, request.request_type));
        }
        latest.map(|request| (argument.to_owned(), request.request_type))
    }
}
