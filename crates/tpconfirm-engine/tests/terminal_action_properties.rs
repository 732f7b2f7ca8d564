use std::time::Duration;

use proptest::prelude::*;
use tpconfirm_config::TpConfirmConfig;
use tpconfirm_engine::testing::TestRig;
use tpconfirm_engine::{ClickOutcome, CloseOutcome, InterceptOutcome};
use tpconfirm_protocol::{ActorId, RemoteRequestNotification};

#[derive(Debug, Clone)]
enum SurfaceEvent {
    Click(usize),
    Close,
    Advance(u64),
}

fn surface_event() -> impl Strategy<Value = SurfaceEvent> {
    prop_oneof![
        prop::sample::select(vec![0_usize, 4, 11, 13, 15, 26]).prop_map(SurfaceEvent::Click),
        Just(SurfaceEvent::Close),
        (0_u64..150).prop_map(SurfaceEvent::Advance),
    ]
}

proptest! {
    #[test]
    fn click_and_close_interleavings_never_dispatch_twice(
        events in prop::collection::vec(surface_event(), 1..32),
        auto_deny_on_close in any::<bool>(),
    ) {
        let mut config = TpConfirmConfig::default();
        config.confirmation.auto_deny_on_close = auto_deny_on_close;
        let rig = TestRig::with_config(config);
        let viewer = ActorId::new("steve");
        rig.engine.on_remote_request(&RemoteRequestNotification {
            target: viewer.clone(),
            sender_name: "Alex".to_owned(),
            sender_id: None,
            request_type: "DIRECT".to_owned(),
        });
        let surface_id = match rig.engine.intercept_command(&viewer, "/tpaccept") {
            InterceptOutcome::Opened { surface_id, .. } => surface_id,
            other => panic!("expected an opened surface, got {other:?}"),
        };

        let mut clicked = 0;
        let mut auto_denied = 0;
        let mut closed_before_click = false;
        for event in events {
            match event {
                SurfaceEvent::Click(slot) => {
                    if matches!(rig.engine.on_click(&viewer, slot), ClickOutcome::Dispatching { .. }) {
                        clicked += 1;
                    }
                }
                SurfaceEvent::Close => {
                    let outcome = rig.engine.on_close(&viewer, surface_id);
                    if clicked == 0 && outcome != CloseOutcome::NoSession {
                        closed_before_click = true;
                    }
                    if matches!(outcome, CloseOutcome::AutoDenied { .. }) {
                        auto_denied += 1;
                    }
                }
                SurfaceEvent::Advance(millis) => {
                    rig.scheduler.advance(Duration::from_millis(millis));
                }
            }
        }
        rig.scheduler.advance(Duration::from_secs(3));

        let dispatched = rig.service.dispatched().len();
        prop_assert!(dispatched <= 1);
        prop_assert!(clicked + auto_denied <= 1);
        prop_assert_eq!(dispatched, clicked + auto_denied);
        prop_assert_eq!(auto_denied == 1, closed_before_click && auto_deny_on_close);
    }
}
