use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::ActorId;

/// Direction of a teleport request relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    /// The sender wants to teleport to the target.
    Direct,
    /// The sender wants the target to teleport to them.
    ToSender,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "DIRECT",
            Self::ToSender => "TO_SENDER",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown request type `{0}`")]
pub struct UnknownRequestType(pub String);

impl FromStr for RequestType {
    type Err = UnknownRequestType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "DIRECT" | "TPA" => Ok(Self::Direct),
            "TO_SENDER" | "TPAHERE" => Ok(Self::ToSender),
            _ => Err(UnknownRequestType(raw.to_owned())),
        }
    }
}

/// A "remote request received" event from the teleport service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRequestNotification {
    pub target: ActorId,
    pub sender_name: String,
    pub sender_id: Option<ActorId>,
    /// Raw type tag as carried by the notification; unknown tags are ignored.
    pub request_type: String,
}
