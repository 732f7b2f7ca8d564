//! Console host for exercising the confirmation engine by hand.

pub mod app;
pub mod cli;
pub mod commands;
pub mod console;

pub use app::{ConsoleApp, ConsoleFlow};
pub use cli::{parse_cli_flags, CliError, CliFlags};
pub use commands::{ConsoleCommand, ConsoleCommandError};
pub use console::{ConsoleDirectory, ConsoleHost, LoggingTeleportService};
