use crate::ids::ActorId;
use crate::surface::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Accept,
    Deny,
}

/// The UI runtime that displays surfaces to viewers.
///
/// All calls are made from the main execution context.
pub trait SurfaceHost: Send + Sync {
    fn open(&self, surface: &Surface);
    /// Redraw an already-open surface after in-place mutation.
    fn refresh(&self, surface: &Surface);
    fn close(&self, viewer: &ActorId);
    fn send_message(&self, viewer: &ActorId, message: &str);
    fn play_feedback(&self, viewer: &ActorId, feedback: Feedback);
}

/// An actor present in this process, whose data is available synchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalActor {
    pub id: ActorId,
    pub name: String,
    pub region: String,
    pub dimension: String,
}

pub trait ActorDirectory: Send + Sync {
    fn is_online(&self, actor: &ActorId) -> bool;
    fn local_actor(&self, name: &str) -> Option<LocalActor>;
    fn display_name(&self, actor: &ActorId) -> String {
        actor.as_str().to_owned()
    }
}

/// Per-actor feature switches. Storage lives outside this system.
pub trait ToggleState: Send + Sync {
    fn confirmation_enabled(&self, actor: &ActorId) -> bool;
    fn auto_open_enabled(&self, actor: &ActorId) -> bool {
        self.confirmation_enabled(actor)
    }
}

/// Every actor has every feature enabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllEnabled;

impl ToggleState for AllEnabled {
    fn confirmation_enabled(&self, _actor: &ActorId) -> bool {
        true
    }
}
