//! Teleport request confirmation: command interception, confirmation
//! surfaces and the at-most-once terminal action.

pub mod command;
pub mod engine;
pub mod interceptor;
pub mod router;
pub mod stats;
pub mod testing;

pub use command::ParsedCommand;
pub use engine::{
    ConfirmationEngine, EngineCollaborators, RemoteRequestIgnored, RemoteRequestOutcome,
};
pub use interceptor::{CommandInterceptor, InterceptOutcome, PassThrough};
pub use router::{ActionRouter, ClickIgnored, ClickOutcome, CloseOutcome};
pub use stats::ConfirmationStatsSnapshot;
