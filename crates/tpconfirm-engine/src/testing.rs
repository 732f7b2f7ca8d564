//! Fakes and a deterministic rig for driving the engine in tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tpconfirm_config::TpConfirmConfig;
use tpconfirm_protocol::{
    ActorId, TeleportService, TeleportServiceError, TeleportServiceResult,
    TerminalCommand, ToggleState,
};
use tpconfirm_scheduler::ManualScheduler;
use tpconfirm_surface::ProfileIdentityApplier;

pub use tpconfirm_surface::testing::{HostEvent, RecordingHost, ScriptedSource, StaticDirectory};

use crate::engine::{ConfirmationEngine, EngineCollaborators};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedCommand {
    pub actor: ActorId,
    pub command: TerminalCommand,
}

impl DispatchedCommand {
    pub fn command_line(&self) -> String {
        self.command.command_line()
    }
}

/// Teleport service that records every command and answers from a queue
/// of scripted failures, succeeding otherwise.
#[derive(Debug, Default)]
pub struct RecordingTeleportService {
    dispatched: Mutex<Vec<DispatchedCommand>>,
    failures: Mutex<VecDeque<TeleportServiceError>>,
}

impl RecordingTeleportService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, error: TeleportServiceError) {
        self.failures
            .lock()
            .expect("recording service lock poisoned")
            .push_back(error);
    }

    pub fn dispatched(&self) -> Vec<DispatchedCommand> {
        self.dispatched
            .lock()
            .expect("recording service lock poisoned")
            .clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.dispatched()
            .iter()
            .map(DispatchedCommand::command_line)
            .collect()
    }
}

impl TeleportService for RecordingTeleportService {
    fn dispatch(&self, actor: &ActorId, command: &TerminalCommand) -> TeleportServiceResult<()> {
        self.dispatched
            .lock()
            .expect("recording service lock poisoned")
            .push(DispatchedCommand {
                actor: actor.clone(),
                command: command.clone(),
            });
        match self
            .failures
            .lock()
            .expect("recording service lock poisoned")
            .pop_front()
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Per-actor toggles; actors are enabled unless switched off.
#[derive(Debug, Default)]
pub struct SwitchableToggles {
    disabled: Mutex<Vec<ActorId>>,
    auto_open_disabled: Mutex<Vec<ActorId>>,
}

impl SwitchableToggles {
    pub fn disable(&self, actor: &ActorId) {
        self.disabled
            .lock()
            .expect("toggle lock poisoned")
            .push(actor.clone());
    }

    pub fn disable_auto_open(&self, actor: &ActorId) {
        self.auto_open_disabled
            .lock()
            .expect("toggle lock poisoned")
            .push(actor.clone());
    }
}

impl ToggleState for SwitchableToggles {
    fn confirmation_enabled(&self, actor: &ActorId) -> bool {
        !self
            .disabled
            .lock()
            .expect("toggle lock poisoned")
            .contains(actor)
    }

    fn auto_open_enabled(&self, actor: &ActorId) -> bool {
        self.confirmation_enabled(actor)
            && !self
                .auto_open_disabled
                .lock()
                .expect("toggle lock poisoned")
                .contains(actor)
    }
}

/// An engine wired to recording fakes and virtual time.
pub struct TestRig {
    pub engine: Arc<ConfirmationEngine>,
    pub scheduler: ManualScheduler,
    pub host: Arc<RecordingHost>,
    pub service: Arc<RecordingTeleportService>,
    pub directory: Arc<StaticDirectory>,
    pub source: Arc<ScriptedSource>,
    pub toggles: Arc<SwitchableToggles>,
}

impl TestRig {
    pub fn new() -> Self {
        Self::with_config(TpConfirmConfig::default())
    }

    pub fn with_config(config: TpConfirmConfig) -> Self {
        let scheduler = ManualScheduler::new();
        let host = Arc::new(RecordingHost::new());
        let service = Arc::new(RecordingTeleportService::new());
        let directory = Arc::new(StaticDirectory::new());
        let source = Arc::new(ScriptedSource::new());
        let toggles = Arc::new(SwitchableToggles::default());
        let engine = Arc::new(ConfirmationEngine::new(
            &config,
            EngineCollaborators {
                host: host.clone(),
                service: service.clone(),
                directory: directory.clone(),
                source: source.clone(),
                toggles: toggles.clone(),
                scheduler: Arc::new(scheduler.clone()),
                clock: Arc::new(scheduler.clock().clone()),
                identity: Arc::new(ProfileIdentityApplier),
            },
        ));
        Self {
            engine,
            scheduler,
            host,
            service,
            directory,
            source,
            toggles,
        }
    }
}

impl Default for TestRig {
    fn default() -> Self {
        Self::new()
    }
}
