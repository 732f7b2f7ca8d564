use tpconfirm_config::{RegionConfigToml, SurfaceConfigToml};
use tpconfirm_protocol::{RegionRole, RequestType, SLOTS_PER_ROW};

use crate::dimension::DimensionMaterials;
use crate::placeholder::{mentions_dimension, mentions_region};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionDescriptor {
    pub slot: usize,
    pub role: RegionRole,
    pub material: String,
    pub text: Vec<String>,
    /// The region's graphic is the sender's visual identity.
    pub requires_remote_data: bool,
}

impl RegionDescriptor {
    pub fn needs_region(&self) -> bool {
        mentions_region(&self.text)
    }

    pub fn needs_dimension(&self) -> bool {
        mentions_dimension(&self.text)
    }
}

/// Validated, render-ready form of the configured surface layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceTemplate {
    pub title_direct: String,
    pub title_to_sender: String,
    pub rows: usize,
    pub regions: Vec<RegionDescriptor>,
    pub dimension_materials: DimensionMaterials,
}

impl SurfaceTemplate {
    /// Builds the template, skipping entries with an unknown role or an
    /// address outside the grid. Later entries for the same slot win.
    pub fn from_config(config: &SurfaceConfigToml) -> Self {
        let rows = config.rows.max(1);
        let capacity = rows * SLOTS_PER_ROW;
        let mut regions: Vec<RegionDescriptor> = Vec::with_capacity(config.regions.len());

        for entry in &config.regions {
            let Some(descriptor) = descriptor_from_config(entry, capacity) else {
                continue;
            };
            regions.retain(|existing| existing.slot != descriptor.slot);
            regions.push(descriptor);
        }

        Self {
            title_direct: config.title_direct.clone(),
            title_to_sender: config.title_to_sender.clone(),
            rows,
            regions,
            dimension_materials: DimensionMaterials::from(&config.dimension_materials),
        }
    }

    pub fn title_for(&self, request_type: RequestType) -> &str {
        match request_type {
            RequestType::Direct => &self.title_direct,
            RequestType::ToSender => &self.title_to_sender,
        }
    }

    pub fn capacity(&self) -> usize {
        self.rows * SLOTS_PER_ROW
    }
}

fn descriptor_from_config(entry: &RegionConfigToml, capacity: usize) -> Option<RegionDescriptor> {
    let Some(role) = parse_role(&entry.role) else {
        tracing::warn!(
            slot = entry.slot,
            role = %entry.role,
            "skipping surface region with unknown role"
        );
        return None;
    };
    let slot = match usize::try_from(entry.slot) {
        Ok(slot) if slot < capacity => slot,
        _ => {
            tracing::warn!(
                slot = entry.slot,
                capacity,
                "skipping surface region outside the grid"
            );
            return None;
        }
    };

    Some(RegionDescriptor {
        slot,
        role,
        material: entry.material.trim().to_owned(),
        text: entry.text.clone(),
        requires_remote_data: entry.requires_remote_data,
    })
}

fn parse_role(raw: &str) -> Option<RegionRole> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "accept" | "confirm" => Some(RegionRole::Accept),
        "deny" | "decline" | "cancel" => Some(RegionRole::Deny),
        "filler" | "border" => Some(RegionRole::Filler),
        "info" | "informational" => Some(RegionRole::Info),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use tpconfirm_config::{RegionConfigToml, SurfaceConfigToml};
    use tpconfirm_protocol::{RegionRole, RequestType};

    use super::SurfaceTemplate;

    fn region(slot: i64, role: &str, text: &[&str]) -> RegionConfigToml {
        RegionConfigToml {
            slot,
            role: role.to_owned(),
            material: "STONE".to_owned(),
            text: text.iter().map(|line| (*line).to_owned()).collect(),
            requires_remote_data: false,
        }
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let config = SurfaceConfigToml {
            rows: 1,
            regions: vec![
                region(-1, "accept", &["Accept"]),
                region(9, "deny", &["Deny"]),
                region(2, "teleport-now", &["???"]),
                region(3, "Accept", &["Accept"]),
            ],
            ..SurfaceConfigToml::default()
        };

        let template = SurfaceTemplate::from_config(&config);
        assert_eq!(template.regions.len(), 1);
        assert_eq!(template.regions[0].slot, 3);
        assert_eq!(template.regions[0].role, RegionRole::Accept);
    }

    #[test]
    fn later_entry_for_same_slot_wins() {
        let config = SurfaceConfigToml {
            regions: vec![region(4, "filler", &[" "]), region(4, "info", &["%region%"])],
            ..SurfaceConfigToml::default()
        };

        let template = SurfaceTemplate::from_config(&config);
        assert_eq!(template.regions.len(), 1);
        assert_eq!(template.regions[0].role, RegionRole::Info);
        assert!(template.regions[0].needs_region());
        assert!(!template.regions[0].needs_dimension());
    }

    #[test]
    fn title_depends_on_request_type() {
        let template = SurfaceTemplate::from_config(&SurfaceConfigToml::default());
        assert_eq!(
            template.title_for(RequestType::Direct),
            "%sender% wants to teleport to you"
        );
        assert_eq!(
            template.title_for(RequestType::ToSender),
            "%sender% wants you to teleport to them"
        );
        assert_eq!(template.capacity(), 27);
    }
}
