use tpconfirm_protocol::{Region, RegionGraphic, RemoteIdentity};

/// Strategy for injecting a remote actor's visual identity into a region.
///
/// Host variants differ in whether and how this is possible; returning
/// `false` means "not supported here" and leaves the region untouched.
pub trait IdentityApplier: Send + Sync {
    fn apply_remote_identity(&self, region: &mut Region, identity: &RemoteIdentity) -> bool;
}

/// Stores the identity value and signature on the region graphic.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileIdentityApplier;

impl IdentityApplier for ProfileIdentityApplier {
    fn apply_remote_identity(&self, region: &mut Region, identity: &RemoteIdentity) -> bool {
        if identity.value.trim().is_empty() {
            return false;
        }
        region.graphic = RegionGraphic::RemoteIdentity(identity.clone());
        true
    }
}

/// For hosts that cannot render foreign identities at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedIdentityApplier;

impl IdentityApplier for UnsupportedIdentityApplier {
    fn apply_remote_identity(&self, _region: &mut Region, _identity: &RemoteIdentity) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use tpconfirm_protocol::{Region, RegionGraphic, RegionRole, RemoteIdentity};

    use super::{IdentityApplier, ProfileIdentityApplier, UnsupportedIdentityApplier};

    fn head() -> Region {
        Region {
            slot: 4,
            role: RegionRole::Info,
            graphic: RegionGraphic::PlaceholderIdentity,
            lines: vec!["Alex".to_owned()],
        }
    }

    fn identity(value: &str) -> RemoteIdentity {
        RemoteIdentity {
            value: value.to_owned(),
            signature: "sig".to_owned(),
        }
    }

    #[test]
    fn profile_strategy_replaces_placeholder_graphic() {
        let mut region = head();
        assert!(ProfileIdentityApplier.apply_remote_identity(&mut region, &identity("dGV4dHVyZQ==")));
        assert_eq!(region.graphic, RegionGraphic::RemoteIdentity(identity("dGV4dHVyZQ==")));
    }

    #[test]
    fn profile_strategy_rejects_blank_identity() {
        let mut region = head();
        assert!(!ProfileIdentityApplier.apply_remote_identity(&mut region, &identity(" ")));
        assert_eq!(region.graphic, RegionGraphic::PlaceholderIdentity);
    }

    #[test]
    fn unsupported_strategy_leaves_region_untouched() {
        let mut region = head();
        assert!(!UnsupportedIdentityApplier.apply_remote_identity(&mut region, &identity("abc")));
        assert_eq!(region, head());
    }
}
