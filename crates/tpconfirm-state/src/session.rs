use dashmap::DashMap;
use tpconfirm_protocol::{ActorId, SurfaceId};

/// One open confirmation surface and whether it has been acted upon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub viewer: ActorId,
    pub sender_name: Option<String>,
    pub surface_id: SurfaceId,
    pub acted: bool,
}

#[derive(Debug, Default)]
pub struct SessionTracker {
    sessions: DashMap<ActorId, Session>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session, replacing whatever the viewer had open before.
    pub fn open(
        &self,
        viewer: &ActorId,
        sender_name: Option<String>,
        surface_id: SurfaceId,
    ) -> Session {
        let session = Session {
            viewer: viewer.clone(),
            sender_name,
            surface_id,
            acted: false,
        };
        if let Some(replaced) = self.sessions.insert(viewer.clone(), session.clone()) {
            tracing::debug!(
                viewer = %viewer,
                replaced = %replaced.surface_id,
                surface = %surface_id,
                "replaced open confirmation session"
            );
        }
        session
    }

    /// Check-and-set of the `acted` flag. Returns the session only for the
    /// call that flipped it, so exactly one caller may issue a terminal
    /// command per session.
    pub fn mark_acted(&self, viewer: &ActorId) -> Option<Session> {
        let mut session = self.sessions.get_mut(viewer)?;
        if session.acted {
            return None;
        }
        session.acted = true;
        Some(session.value().clone())
    }

    pub fn get(&self, viewer: &ActorId) -> Option<Session> {
        self.sessions.get(viewer).map(|session| session.value().clone())
    }

    pub fn close(&self, viewer: &ActorId) -> Option<Session> {
        self.sessions.remove(viewer).map(|(_, session)| session)
    }

    /// Removes the viewer's session only if it still belongs to `surface_id`.
    pub fn close_surface(&self, viewer: &ActorId, surface_id: SurfaceId) -> Option<Session> {
        self.sessions
            .remove_if(viewer, |_, session| session.surface_id == surface_id)
            .map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
