use thiserror::Error;
use tpconfirm_protocol::{ActorId, RemoteIdentity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteField {
    Region(String),
    Dimension(String),
    Identity(RemoteIdentity),
}

/// One line typed into the console host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Request {
        target: ActorId,
        sender: String,
        request_type: String,
    },
    Command {
        actor: ActorId,
        text: String,
    },
    Click {
        viewer: ActorId,
        slot: usize,
    },
    Close {
        viewer: ActorId,
    },
    Remote {
        actor: String,
        field: RemoteField,
    },
    Local {
        name: String,
        region: String,
        dimension: String,
    },
    Stats,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleCommandError {
    #[error("unknown console command `{0}`, try `help`")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid slot `{0}`")]
    InvalidSlot(String),
}

const REQUEST_USAGE: &str = "request <target> <sender> [DIRECT|TO_SENDER]";
const CMD_USAGE: &str = "cmd <actor> <command text>";
const CLICK_USAGE: &str = "click <viewer> <slot>";
const CLOSE_USAGE: &str = "close <viewer>";
const REMOTE_USAGE: &str = "remote <actor> region|dimension <value> | remote <actor> identity <value> [signature]";
const LOCAL_USAGE: &str = "local <name> <region> <dimension>";

pub const HELP: &str = "\
commands:
  request <target> <sender> [DIRECT|TO_SENDER]
  cmd <actor> <command text>
  click <viewer> <slot>
  close <viewer>
  remote <actor> region|dimension <value>
  remote <actor> identity <value> [signature]
  local <name> <region> <dimension>
  stats
  quit";

impl ConsoleCommand {
    /// Parses a console line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, ConsoleCommandError> {
        let mut tokens = line.split_whitespace();
        let Some(head) = tokens.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = tokens.collect();

        let command = match head.to_ascii_lowercase().as_str() {
            "request" => match rest.as_slice() {
                [target, sender] => Self::Request {
                    target: ActorId::from(*target),
                    sender: (*sender).to_owned(),
                    request_type: "DIRECT".to_owned(),
                },
                [target, sender, request_type] => Self::Request {
                    target: ActorId::from(*target),
                    sender: (*sender).to_owned(),
                    request_type: (*request_type).to_owned(),
                },
                _ => return Err(ConsoleCommandError::Usage(REQUEST_USAGE)),
            },
            "cmd" => match rest.split_first() {
                Some((actor, text)) if !text.is_empty() => Self::Command {
                    actor: ActorId::from(*actor),
                    text: text.join(" "),
                },
                _ => return Err(ConsoleCommandError::Usage(CMD_USAGE)),
            },
            "click" => match rest.as_slice() {
                [viewer, slot] => Self::Click {
                    viewer: ActorId::from(*viewer),
                    slot: slot
                        .parse()
                        .map_err(|_| ConsoleCommandError::InvalidSlot((*slot).to_owned()))?,
                },
                _ => return Err(ConsoleCommandError::Usage(CLICK_USAGE)),
            },
            "close" => match rest.as_slice() {
                [viewer] => Self::Close {
                    viewer: ActorId::from(*viewer),
                },
                _ => return Err(ConsoleCommandError::Usage(CLOSE_USAGE)),
            },
            "remote" => Self::Remote {
                actor: rest
                    .first()
                    .map(|actor| (*actor).to_owned())
                    .ok_or(ConsoleCommandError::Usage(REMOTE_USAGE))?,
                field: parse_remote_field(rest.get(1..).unwrap_or_default())?,
            },
            "local" => match rest.as_slice() {
                [name, region, dimension] => Self::Local {
                    name: (*name).to_owned(),
                    region: (*region).to_owned(),
                    dimension: (*dimension).to_owned(),
                },
                _ => return Err(ConsoleCommandError::Usage(LOCAL_USAGE)),
            },
            "stats" => Self::Stats,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(ConsoleCommandError::Unknown(other.to_owned())),
        };
        Ok(Some(command))
    }
}

fn parse_remote_field(tokens: &[&str]) -> Result<RemoteField, ConsoleCommandError> {
    match tokens {
        [kind, value] if kind.eq_ignore_ascii_case("region") => {
            Ok(RemoteField::Region((*value).to_owned()))
        }
        [kind, value] if kind.eq_ignore_ascii_case("dimension") => {
            Ok(RemoteField::Dimension((*value).to_owned()))
        }
        [kind, value, signature @ ..]
            if kind.eq_ignore_ascii_case("identity") && signature.len() <= 1 =>
        {
            Ok(RemoteField::Identity(RemoteIdentity {
                value: (*value).to_owned(),
                signature: signature.first().map(|s| (*s).to_owned()).unwrap_or_default(),
            }))
        }
        _ => Err(ConsoleCommandError::Usage(REMOTE_USAGE)),
    }
}

#[cfg(test)]
mod tests {
    use tpconfirm_protocol::ActorId;

    use super::{ConsoleCommand, ConsoleCommandError, RemoteField};

    #[test]
    fn parses_command_text_with_spaces() {
        let parsed = ConsoleCommand::parse("cmd steve /tpaccept Alex").expect("valid line");
        assert_eq!(
            parsed,
            Some(ConsoleCommand::Command {
                actor: ActorId::new("steve"),
                text: "/tpaccept Alex".to_owned(),
            })
        );
    }

    #[test]
    fn request_type_defaults_to_direct() {
        let parsed = ConsoleCommand::parse("request steve Alex").expect("valid line");
        assert_eq!(
            parsed,
            Some(ConsoleCommand::Request {
                target: ActorId::new("steve"),
                sender: "Alex".to_owned(),
                request_type: "DIRECT".to_owned(),
            })
        );
    }

    #[test]
    fn parses_remote_identity_with_optional_signature() {
        let parsed = ConsoleCommand::parse("remote Alex identity abc").expect("valid line");
        assert!(matches!(
            parsed,
            Some(ConsoleCommand::Remote {
                field: RemoteField::Identity(ref identity),
                ..
            }) if identity.value == "abc" && identity.signature.is_empty()
        ));
    }

    #[test]
    fn blank_lines_are_skipped_and_bad_lines_explained() {
        assert_eq!(ConsoleCommand::parse("   "), Ok(None));
        assert_eq!(
            ConsoleCommand::parse("click steve eleven"),
            Err(ConsoleCommandError::InvalidSlot("eleven".to_owned()))
        );
        assert!(matches!(
            ConsoleCommand::parse("teleport"),
            Err(ConsoleCommandError::Unknown(_))
        ));
        assert!(matches!(
            ConsoleCommand::parse("remote Alex colour blue"),
            Err(ConsoleCommandError::Usage(_))
        ));
    }
}
