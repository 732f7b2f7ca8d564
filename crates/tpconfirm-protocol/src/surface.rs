use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, SurfaceId};
use crate::request::RequestType;

pub const SLOTS_PER_ROW: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionRole {
    Accept,
    Deny,
    Filler,
    Info,
}

impl RegionRole {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Accept | Self::Deny)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIdentity {
    pub value: String,
    pub signature: String,
}

/// What a region draws besides its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionGraphic {
    Material(String),
    /// Identity of an actor the host can resolve on its own.
    LocalIdentity(ActorId),
    /// Default identity shown while a remote identity is pending.
    PlaceholderIdentity,
    RemoteIdentity(RemoteIdentity),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub slot: usize,
    pub role: RegionRole,
    pub graphic: RegionGraphic,
    /// First line is the display name, the rest is descriptive text.
    pub lines: Vec<String>,
}

/// A rendered confirmation surface for one viewer and one pending request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surface {
    pub id: SurfaceId,
    pub viewer: ActorId,
    pub sender_name: String,
    pub request_type: RequestType,
    pub title: String,
    pub rows: usize,
    pub regions: BTreeMap<usize, Region>,
}

impl Surface {
    pub fn capacity(&self) -> usize {
        self.rows * SLOTS_PER_ROW
    }

    pub fn region(&self, slot: usize) -> Option<&Region> {
        self.regions.get(&slot)
    }

    pub fn region_mut(&mut self, slot: usize) -> Option<&mut Region> {
        self.regions.get_mut(&slot)
    }

    pub fn role_at(&self, slot: usize) -> Option<RegionRole> {
        self.regions.get(&slot).map(|region| region.role)
    }
}
