use std::sync::atomic::{AtomicU64, Ordering};

use tpconfirm_surface::PollerStatsSnapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfirmationStatsSnapshot {
    pub pending_requests: usize,
    pub open_sessions: usize,
    pub remote_requests_total: u64,
    pub surfaces_opened_total: u64,
    pub commands_intercepted_total: u64,
    pub commands_unresolved_total: u64,
    pub terminal_dispatches_total: u64,
    pub dispatch_failures_total: u64,
    pub auto_denies_total: u64,
    pub stale_requests_pruned_total: u64,
    pub enrichment_evicted_total: u64,
    pub pollers: PollerStatsSnapshot,
}

#[derive(Debug, Default)]
pub(crate) struct EngineCounters {
    pub(crate) remote_requests_total: AtomicU64,
    pub(crate) commands_intercepted_total: AtomicU64,
    pub(crate) commands_unresolved_total: AtomicU64,
    pub(crate) terminal_dispatches_total: AtomicU64,
    pub(crate) dispatch_failures_total: AtomicU64,
    pub(crate) auto_denies_total: AtomicU64,
    pub(crate) stale_requests_pruned_total: AtomicU64,
    pub(crate) enrichment_evicted_total: AtomicU64,
}

impl EngineCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn load(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
