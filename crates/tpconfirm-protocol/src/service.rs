use std::fmt;

use thiserror::Error;

use crate::ids::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalAction {
    Accept,
    Deny,
}

impl fmt::Display for TerminalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept => f.write_str("accept"),
            Self::Deny => f.write_str("deny"),
        }
    }
}

/// The accept/deny command issued to the teleport service on behalf of a
/// player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalCommand {
    pub action: TerminalAction,
    pub verb: String,
    pub sender_name: Option<String>,
}

impl TerminalCommand {
    pub fn command_line(&self) -> String {
        match &self.sender_name {
            Some(sender) => format!("{} {}", self.verb, sender),
            None => self.verb.clone(),
        }
    }
}

impl fmt::Display for TerminalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TeleportServiceError {
    #[error("teleport service rejected command `{command}`")]
    Rejected { command: String },
    #[error("teleport service unavailable: {0}")]
    Unavailable(String),
}

pub type TeleportServiceResult<T> = Result<T, TeleportServiceError>;

/// The external home/teleport service that actually performs accept/deny.
pub trait TeleportService: Send + Sync {
    fn dispatch(&self, actor: &ActorId, command: &TerminalCommand) -> TeleportServiceResult<()>;
}
