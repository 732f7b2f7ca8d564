use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tpconfirm_protocol::{ActorId, RequestType};
use tpconfirm_scheduler::Clock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub target: ActorId,
    pub sender_name: String,
    pub sender_id: Option<ActorId>,
    pub request_type: RequestType,
    pub created_at: Instant,
}

impl PendingRequest {
    fn is_from(&self, sender_name: &str) -> bool {
        self.sender_name.eq_ignore_ascii_case(sender_name.trim())
    }
}

/// Outstanding teleport requests keyed by target.
///
/// Each target keeps its requests in arrival order; the last one is the
/// "most recent" used when a command names no sender. At most one request
/// per `(target, sender)` is retained.
pub struct PendingRequestStore {
    clock: Arc<dyn Clock>,
    requests: DashMap<ActorId, Vec<PendingRequest>>,
}

impl PendingRequestStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            requests: DashMap::new(),
        }
    }

    /// Records a request, replacing any earlier one from the same sender.
    /// Blank sender names are ignored.
    pub fn set(
        &self,
        target: &ActorId,
        sender_name: &str,
        sender_id: Option<ActorId>,
        request_type: RequestType,
    ) -> bool {
        let sender_name = sender_name.trim();
        if sender_name.is_empty() {
            return false;
        }

        let request = PendingRequest {
            target: target.clone(),
            sender_name: sender_name.to_owned(),
            sender_id,
            request_type,
            created_at: self.clock.now(),
        };
        let mut entry = self.requests.entry(target.clone()).or_default();
        entry.retain(|existing| !existing.is_from(sender_name));
        entry.push(request);
        true
    }

    /// Most recently set request for `target`.
    pub fn get(&self, target: &ActorId) -> Option<PendingRequest> {
        self.requests
            .get(target)
            .and_then(|requests| requests.last().cloned())
    }

    pub fn get_from(&self, target: &ActorId, sender_name: &str) -> Option<PendingRequest> {
        self.requests.get(target).and_then(|requests| {
            requests
                .iter()
                .find(|request| request.is_from(sender_name))
                .cloned()
        })
    }

    pub fn remove(&self, target: &ActorId, sender_name: &str) -> Option<PendingRequest> {
        let removed = {
            let mut requests = self.requests.get_mut(target)?;
            let index = requests
                .iter()
                .position(|request| request.is_from(sender_name))?;
            requests.remove(index)
        };
        self.requests
            .remove_if(target, |_, requests| requests.is_empty());
        Some(removed)
    }

    pub fn clear(&self, target: &ActorId) -> usize {
        self.requests
            .remove(target)
            .map_or(0, |(_, requests)| requests.len())
    }

    /// Drops requests older than `max_age`; returns how many were evicted.
    pub fn prune_stale(&self, max_age: Duration) -> usize {
        let now = self.clock.now();
        let mut evicted = 0;
        self.requests.retain(|_, requests| {
            let before = requests.len();
            requests.retain(|request| now.saturating_duration_since(request.created_at) < max_age);
            evicted += before - requests.len();
            !requests.is_empty()
        });
        evicted
    }

    pub fn pending_for(&self, target: &ActorId) -> Vec<PendingRequest> {
        self.requests
            .get(target)
            .map(|requests| requests.value().clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.requests.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
