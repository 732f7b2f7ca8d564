use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tpconfirm_protocol::ActorId;
use tpconfirm_scheduler::Clock;

/// Short-lived per-actor suppression of command interception, armed right
/// before the engine issues a command on that actor's behalf.
pub struct BypassWindow {
    clock: Arc<dyn Clock>,
    expiries: DashMap<ActorId, Instant>,
}

impl BypassWindow {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            expiries: DashMap::new(),
        }
    }

    /// Opens or extends the window; an already later expiry is kept.
    pub fn arm(&self, actor: &ActorId, duration: Duration) -> Instant {
        let expiry = self.clock.now() + duration;
        let mut entry = self.expiries.entry(actor.clone()).or_insert(expiry);
        if expiry > *entry {
            *entry = expiry;
        }
        *entry
    }

    /// True while `now < expiry`. Expired entries are evicted on read.
    pub fn is_active(&self, actor: &ActorId) -> bool {
        let now = self.clock.now();
        let Some(expiry) = self.expiries.get(actor).map(|entry| *entry) else {
            return false;
        };
        if now < expiry {
            return true;
        }
        self.expiries.remove_if(actor, |_, expiry| *expiry <= now);
        false
    }

    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}
