//! Shared types and collaborator contracts for the teleport confirmation
//! engine.

pub mod enrichment;
pub mod host;
pub mod ids;
pub mod request;
pub mod service;
pub mod surface;
pub mod wire;

pub use enrichment::{EnrichmentKind, RemoteEnrichmentResult, RemoteEnrichmentSource};
pub use host::{ActorDirectory, AllEnabled, Feedback, LocalActor, SurfaceHost, ToggleState};
pub use ids::{ActorId, SurfaceId, SurfaceIdAllocator};
pub use request::{RemoteRequestNotification, RequestType, UnknownRequestType};
pub use service::{
    TeleportService, TeleportServiceError, TeleportServiceResult, TerminalAction,
    TerminalCommand,
};
pub use surface::{Region, RegionGraphic, RegionRole, RemoteIdentity, Surface, SLOTS_PER_ROW};

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::enrichment::EnrichmentKind;
    use crate::ids::{ActorId, SurfaceId, SurfaceIdAllocator};
    use crate::request::RequestType;
    use crate::service::{TerminalAction, TerminalCommand};
    use crate::surface::{Region, RegionGraphic, RegionRole, Surface};
    use crate::wire::{self, EnrichmentRequest, EnrichmentResponse, WireError};

    #[test]
    fn actor_id_serializes_as_plain_string() {
        let actor = ActorId::new("steve");
        let serialized = serde_json::to_string(&actor).expect("serialize actor id");
        assert_eq!(serialized, "\"steve\"");
    }

    #[test]
    fn request_type_parses_wire_tags_case_insensitively() {
        assert_eq!("direct".parse::<RequestType>(), Ok(RequestType::Direct));
        assert_eq!("TO_SENDER".parse::<RequestType>(), Ok(RequestType::ToSender));
        assert_eq!("to-sender".parse::<RequestType>(), Ok(RequestType::ToSender));
        assert!("sideways".parse::<RequestType>().is_err());
    }

    #[test]
    fn surface_ids_are_allocated_monotonically() {
        let allocator = SurfaceIdAllocator::default();
        assert_eq!(allocator.allocate(), SurfaceId::new(1));
        assert_eq!(allocator.allocate(), SurfaceId::new(2));
    }

    #[test]
    fn terminal_command_line_includes_sender_only_when_present() {
        let with_sender = TerminalCommand {
            action: TerminalAction::Accept,
            verb: "tpaccept".to_owned(),
            sender_name: Some("Alex".to_owned()),
        };
        let bare = TerminalCommand {
            action: TerminalAction::Deny,
            verb: "tpdeny".to_owned(),
            sender_name: None,
        };

        assert_eq!(with_sender.command_line(), "tpaccept Alex");
        assert_eq!(bare.command_line(), "tpdeny");
    }

    #[test]
    fn surface_reports_roles_by_slot() {
        let mut regions = BTreeMap::new();
        regions.insert(
            11,
            Region {
                slot: 11,
                role: RegionRole::Accept,
                graphic: RegionGraphic::Material("LIME_WOOL".to_owned()),
                lines: vec!["Accept".to_owned()],
            },
        );
        let surface = Surface {
            id: SurfaceId::new(7),
            viewer: ActorId::new("steve"),
            sender_name: "Alex".to_owned(),
            request_type: RequestType::Direct,
            title: "Request".to_owned(),
            rows: 3,
            regions,
        };

        assert_eq!(surface.capacity(), 27);
        assert_eq!(surface.role_at(11), Some(RegionRole::Accept));
        assert!(surface.role_at(11).is_some_and(RegionRole::is_terminal));
        assert_eq!(surface.role_at(12), None);
    }

    #[test]
    fn wire_request_omits_absent_viewer_fields() {
        let request = EnrichmentRequest {
            request_id: 3,
            kind: EnrichmentKind::Region,
            actor_name: "Alex".to_owned(),
            viewer_name: None,
            viewer_id: None,
        };
        let encoded = wire::encode(&request).expect("encode request");
        let text = String::from_utf8(encoded).expect("utf8 payload");

        assert_eq!(
            text,
            r#"{"request_id":3,"kind":"region","actor_name":"Alex"}"#
        );
    }

    #[test]
    fn wire_response_without_result_decodes_as_empty() {
        let response: EnrichmentResponse =
            wire::decode(br#"{"request_id":9,"actor_name":"Alex"}"#).expect("decode response");
        assert!(response.result.is_empty());
    }

    #[test]
    fn wire_decode_reports_malformed_payloads() {
        let error = wire::decode::<EnrichmentResponse>(b"{not json").expect_err("malformed");
        assert!(matches!(error, WireError::Decode(_)));
    }
}
