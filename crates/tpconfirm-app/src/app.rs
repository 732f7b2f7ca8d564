use std::io::Write;
use std::sync::Arc;

use tpconfirm_engine::{ConfirmationEngine, InterceptOutcome};
use tpconfirm_protocol::{RemoteEnrichmentSource, RemoteRequestNotification, SurfaceHost};
use tpconfirm_remote::{CachedEnrichmentSource, InMemoryTransport};

use crate::commands::{ConsoleCommand, RemoteField, HELP};
use crate::console::{ConsoleDirectory, ConsoleHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleFlow {
    Continue,
    Quit,
}

/// Feeds console lines into the engine. Runs on the main context only.
pub struct ConsoleApp<W> {
    engine: Arc<ConfirmationEngine>,
    host: Arc<ConsoleHost<W>>,
    directory: Arc<ConsoleDirectory>,
    transport: Arc<InMemoryTransport>,
    source: CachedEnrichmentSource,
}

impl<W: Write + Send + 'static> ConsoleApp<W> {
    pub fn new(
        engine: Arc<ConfirmationEngine>,
        host: Arc<ConsoleHost<W>>,
        directory: Arc<ConsoleDirectory>,
        transport: Arc<InMemoryTransport>,
        source: CachedEnrichmentSource,
    ) -> Self {
        Self {
            engine,
            host,
            directory,
            transport,
            source,
        }
    }

    pub fn handle_line(&self, line: &str) -> ConsoleFlow {
        let command = match ConsoleCommand::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return ConsoleFlow::Continue,
            Err(error) => {
                self.host.writeln(&error.to_string());
                return ConsoleFlow::Continue;
            }
        };
        let flow = self.apply(command);
        self.report_closes();
        flow
    }

    /// Forwards closes the host performed on its own (after a click, or
    /// when a surface was replaced) to the engine.
    pub fn report_closes(&self) {
        for (viewer, surface_id) in self.host.take_closed() {
            let outcome = self.engine.on_close(&viewer, surface_id);
            tracing::debug!(viewer = %viewer, surface = %surface_id, ?outcome, "surface close handled");
        }
    }

    fn apply(&self, command: ConsoleCommand) -> ConsoleFlow {
        match command {
            ConsoleCommand::Request {
                target,
                sender,
                request_type,
            } => {
                let outcome = self.engine.on_remote_request(&RemoteRequestNotification {
                    target,
                    sender_name: sender,
                    sender_id: None,
                    request_type,
                });
                self.host.writeln(&format!("[request] {outcome:?}"));
            }
            ConsoleCommand::Command { actor, text } => {
                match self.engine.intercept_command(&actor, &text) {
                    InterceptOutcome::PassThrough(reason) => {
                        self.host
                            .writeln(&format!("[passthrough {reason:?}] {actor}: {text}"));
                    }
                    outcome => self.host.writeln(&format!("[intercepted] {outcome:?}")),
                }
            }
            ConsoleCommand::Click { viewer, slot } => {
                let outcome = self.engine.on_click(&viewer, slot);
                self.host.writeln(&format!("[click] {outcome:?}"));
            }
            ConsoleCommand::Close { viewer } => {
                if self.host.open_surface(&viewer).is_none() {
                    self.host.writeln(&format!("[close] {viewer} has no open surface"));
                }
                self.host.close(&viewer);
            }
            ConsoleCommand::Remote { actor, field } => {
                match field {
                    RemoteField::Region(value) => self.transport.set_region(&actor, value),
                    RemoteField::Dimension(value) => self.transport.set_dimension(&actor, value),
                    RemoteField::Identity(identity) => self.transport.set_identity(&actor, identity),
                }
                self.source.forget(&actor);
            }
            ConsoleCommand::Local {
                name,
                region,
                dimension,
            } => self.directory.add_local(&name, &region, &dimension),
            ConsoleCommand::Stats => {
                self.host.writeln(&format!("[stats] {:?}", self.engine.stats()));
            }
            ConsoleCommand::Help => self.host.writeln(HELP),
            ConsoleCommand::Quit => return ConsoleFlow::Quit,
        }
        ConsoleFlow::Continue
    }
}
