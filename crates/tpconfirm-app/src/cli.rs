use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_REMOTE_LATENCY_MS: u64 = 250;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliFlags {
    pub config_path: Option<PathBuf>,
    pub remote_latency: Duration,
    pub help: bool,
}

impl Default for CliFlags {
    fn default() -> Self {
        Self {
            config_path: None,
            remote_latency: Duration::from_millis(DEFAULT_REMOTE_LATENCY_MS),
            help: false,
        }
    }
}

pub const CLI_HELP: &str = "\
usage: tpconfirm [--config <path>] [--remote-latency-ms <millis>]

Reads console commands from stdin; type `help` once running.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("Missing value after {flag}. Use {flag} <{placeholder}>.")]
    MissingValue {
        flag: &'static str,
        placeholder: &'static str,
    },
    #[error("Invalid {flag} value '{value}'. Expected a whole number of milliseconds.")]
    InvalidMillis { flag: &'static str, value: String },
    #[error("Unknown argument '{0}'. Use --help for usage.")]
    UnknownArgument(String),
}

pub fn parse_cli_flags(args: impl IntoIterator<Item = String>) -> Result<CliFlags, CliError> {
    let mut flags = CliFlags::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args.next().ok_or(CliError::MissingValue {
                    flag: "--config",
                    placeholder: "path",
                })?;
                flags.config_path = Some(PathBuf::from(value));
            }
            "--remote-latency-ms" => {
                let flag = "--remote-latency-ms";
                let value = args.next().ok_or(CliError::MissingValue {
                    flag,
                    placeholder: "millis",
                })?;
                let millis = value
                    .parse::<u64>()
                    .map_err(|_| CliError::InvalidMillis { flag, value: value.clone() })?;
                flags.remote_latency = Duration::from_millis(millis);
            }
            "--help" | "-h" => flags.help = true,
            other => return Err(CliError::UnknownArgument(other.to_owned())),
        }
    }

    Ok(flags)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{parse_cli_flags, CliError};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[test]
    fn parses_config_path_and_latency() {
        let flags = parse_cli_flags(args(&["--config", "/tmp/tp.toml", "--remote-latency-ms", "40"]))
            .expect("valid flags");
        assert_eq!(flags.config_path, Some(PathBuf::from("/tmp/tp.toml")));
        assert_eq!(flags.remote_latency, Duration::from_millis(40));
        assert!(!flags.help);
    }

    #[test]
    fn rejects_missing_values_and_unknown_flags() {
        let missing = parse_cli_flags(args(&["--config"])).expect_err("missing value");
        assert_eq!(
            missing,
            CliError::MissingValue {
                flag: "--config",
                placeholder: "path",
            }
        );
        assert!(missing.to_string().contains("--config <path>"));

        let unknown = parse_cli_flags(args(&["--verbose"])).expect_err("unknown flag");
        assert_eq!(unknown, CliError::UnknownArgument("--verbose".to_owned()));

        let invalid = parse_cli_flags(args(&["--remote-latency-ms", "soon"])).expect_err("bad number");
        assert!(matches!(invalid, CliError::InvalidMillis { ref value, .. } if value == "soon"));
        assert!(invalid.to_string().contains("'soon'"));
    }
}
