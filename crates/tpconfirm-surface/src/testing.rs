//! In-memory collaborators for exercising surfaces without a real host.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use tpconfirm_protocol::{
    ActorDirectory, ActorId, EnrichmentKind, Feedback, LocalActor, RemoteEnrichmentSource,
    RemoteIdentity, Surface, SurfaceHost,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Opened(Surface),
    Refreshed(Surface),
    Closed(ActorId),
    Message(ActorId, String),
    Feedback(ActorId, Feedback),
}

#[derive(Debug, Default)]
pub struct RecordingHost {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().expect("recording host lock poisoned").clone()
    }

    pub fn opened(&self) -> Vec<Surface> {
        self.filter(|event| match event {
            HostEvent::Opened(surface) => Some(surface.clone()),
            _ => None,
        })
    }

    pub fn refreshed(&self) -> Vec<Surface> {
        self.filter(|event| match event {
            HostEvent::Refreshed(surface) => Some(surface.clone()),
            _ => None,
        })
    }

    pub fn closed(&self) -> Vec<ActorId> {
        self.filter(|event| match event {
            HostEvent::Closed(viewer) => Some(viewer.clone()),
            _ => None,
        })
    }

    pub fn messages_for(&self, viewer: &ActorId) -> Vec<String> {
        self.filter(|event| match event {
            HostEvent::Message(target, message) if target == viewer => Some(message.clone()),
            _ => None,
        })
    }

    pub fn feedback_for(&self, viewer: &ActorId) -> Vec<Feedback> {
        self.filter(|event| match event {
            HostEvent::Feedback(target, feedback) if target == viewer => Some(*feedback),
            _ => None,
        })
    }

    /// Latest state of the surface shown to `viewer`, opened or refreshed.
    pub fn last_surface(&self, viewer: &ActorId) -> Option<Surface> {
        self.filter(|event| match event {
            HostEvent::Opened(surface) | HostEvent::Refreshed(surface)
                if &surface.viewer == viewer =>
            {
                Some(surface.clone())
            }
            _ => None,
        })
        .pop()
    }

    fn record(&self, event: HostEvent) {
        self.events
            .lock()
            .expect("recording host lock poisoned")
            .push(event);
    }

    fn filter<T>(&self, select: impl Fn(&HostEvent) -> Option<T>) -> Vec<T> {
        self.events
            .lock()
            .expect("recording host lock poisoned")
            .iter()
            .filter_map(select)
            .collect()
    }
}

impl SurfaceHost for RecordingHost {
    fn open(&self, surface: &Surface) {
        self.record(HostEvent::Opened(surface.clone()));
    }

    fn refresh(&self, surface: &Surface) {
        self.record(HostEvent::Refreshed(surface.clone()));
    }

    fn close(&self, viewer: &ActorId) {
        self.record(HostEvent::Closed(viewer.clone()));
    }

    fn send_message(&self, viewer: &ActorId, message: &str) {
        self.record(HostEvent::Message(viewer.clone(), message.to_owned()));
    }

    fn play_feedback(&self, viewer: &ActorId, feedback: Feedback) {
        self.record(HostEvent::Feedback(viewer.clone(), feedback));
    }
}

/// Directory where every actor is online unless marked otherwise.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    offline: Mutex<HashSet<ActorId>>,
    locals: Mutex<HashMap<String, LocalActor>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_local(&self, actor: LocalActor) {
        self.locals
            .lock()
            .expect("static directory lock poisoned")
            .insert(actor.name.to_ascii_lowercase(), actor);
    }

    pub fn set_offline(&self, actor: &ActorId) {
        self.offline
            .lock()
            .expect("static directory lock poisoned")
            .insert(actor.clone());
    }
}

impl ActorDirectory for StaticDirectory {
    fn is_online(&self, actor: &ActorId) -> bool {
        !self
            .offline
            .lock()
            .expect("static directory lock poisoned")
            .contains(actor)
    }

    fn local_actor(&self, name: &str) -> Option<LocalActor> {
        self.locals
            .lock()
            .expect("static directory lock poisoned")
            .get(&name.to_ascii_lowercase())
            .cloned()
    }
}

#[derive(Debug, Clone)]
enum ScriptedAnswer {
    Text(String),
    Identity(RemoteIdentity),
}

/// Remote source whose answers appear after a fixed number of lookups.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    state: Mutex<ScriptedSourceState>,
}

#[derive(Debug, Default)]
struct ScriptedSourceState {
    calls: HashMap<EnrichmentKind, u32>,
    answers: HashMap<EnrichmentKind, (u32, ScriptedAnswer)>,
    forgotten: Vec<String>,
    eviction_runs: u32,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// From lookup number `call` (1-based) on, region lookups return `value`.
    pub fn answer_region_on(&self, call: u32, value: &str) {
        self.script(EnrichmentKind::Region, call, ScriptedAnswer::Text(value.to_owned()));
    }

    pub fn answer_dimension_on(&self, call: u32, value: &str) {
        self.script(EnrichmentKind::Dimension, call, ScriptedAnswer::Text(value.to_owned()));
    }

    pub fn answer_identity_on(&self, call: u32, identity: RemoteIdentity) {
        self.script(EnrichmentKind::Identity, call, ScriptedAnswer::Identity(identity));
    }

    pub fn calls(&self, kind: EnrichmentKind) -> u32 {
        self.lock().calls.get(&kind).copied().unwrap_or_default()
    }

    pub fn forgotten(&self) -> Vec<String> {
        self.lock().forgotten.clone()
    }

    pub fn eviction_runs(&self) -> u32 {
        self.lock().eviction_runs
    }

    fn script(&self, kind: EnrichmentKind, call: u32, answer: ScriptedAnswer) {
        self.lock().answers.insert(kind, (call, answer));
    }

    fn next(&self, kind: EnrichmentKind) -> Option<ScriptedAnswer> {
        let mut state = self.lock();
        let calls = state.calls.entry(kind).or_default();
        *calls += 1;
        let calls = *calls;
        state
            .answers
            .get(&kind)
            .filter(|(from, _)| calls >= *from)
            .map(|(_, answer)| answer.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptedSourceState> {
        self.state.lock().expect("scripted source lock poisoned")
    }
}

impl RemoteEnrichmentSource for ScriptedSource {
    fn resolve_region(&self, _actor_name: &str) -> Option<String> {
        match self.next(EnrichmentKind::Region)? {
            ScriptedAnswer::Text(value) => Some(value),
            ScriptedAnswer::Identity(_) => None,
        }
    }

    fn resolve_dimension(&self, _actor_name: &str, _viewer_name: &str) -> Option<String> {
        match self.next(EnrichmentKind::Dimension)? {
            ScriptedAnswer::Text(value) => Some(value),
            ScriptedAnswer::Identity(_) => None,
        }
    }

    fn resolve_identity(&self, _viewer: &ActorId, _actor_name: &str) -> Option<RemoteIdentity> {
        match self.next(EnrichmentKind::Identity)? {
            ScriptedAnswer::Identity(identity) => Some(identity),
            ScriptedAnswer::Text(_) => None,
        }
    }

    fn forget(&self, actor_name: &str) {
        self.lock().forgotten.push(actor_name.to_owned());
    }

    fn evict_expired(&self) -> usize {
        self.lock().eviction_runs += 1;
        0
    }
}
