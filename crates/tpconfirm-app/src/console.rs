use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

use dashmap::DashMap;
use tpconfirm_protocol::{
    ActorDirectory, ActorId, Feedback, LocalActor, RegionGraphic, Surface, SurfaceHost, SurfaceId,
    TeleportService, TeleportServiceResult, TerminalCommand,
};

/// Surface host that prints surfaces to a writer and remembers which
/// surface each viewer has open, so closes can be reported back.
pub struct ConsoleHost<W> {
    out: Mutex<W>,
    open: Mutex<HashMap<ActorId, SurfaceId>>,
    closed: Mutex<Vec<(ActorId, SurfaceId)>>,
}

impl<W: Write + Send> ConsoleHost<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            open: Mutex::new(HashMap::new()),
            closed: Mutex::new(Vec::new()),
        }
    }

    /// Surfaces closed since the last call, in close order.
    pub fn take_closed(&self) -> Vec<(ActorId, SurfaceId)> {
        std::mem::take(&mut *self.closed.lock().expect("console host lock poisoned"))
    }

    pub fn open_surface(&self, viewer: &ActorId) -> Option<SurfaceId> {
        self.open
            .lock()
            .expect("console host lock poisoned")
            .get(viewer)
            .copied()
    }

    pub fn writeln(&self, line: &str) {
        let mut out = self.out.lock().expect("console host lock poisoned");
        if let Err(error) = writeln!(out, "{line}") {
            tracing::warn!(error = %error, "failed to write console output");
        }
    }

    fn print_surface(&self, label: &str, surface: &Surface) {
        let mut text = format!(
            "[{label} {} for {}] {}",
            surface.id, surface.viewer, surface.title
        );
        for region in surface.regions.values() {
            text.push_str(&format!(
                "\n  [{:>2}] {:?} {}: {}",
                region.slot,
                region.role,
                describe_graphic(&region.graphic),
                region.lines.join(" | ")
            ));
        }
        self.writeln(&text);
    }
}

fn describe_graphic(graphic: &RegionGraphic) -> String {
    match graphic {
        RegionGraphic::Material(material) => material.clone(),
        RegionGraphic::LocalIdentity(actor) => format!("head({actor})"),
        RegionGraphic::PlaceholderIdentity => "head(?)".to_owned(),
        RegionGraphic::RemoteIdentity(identity) => format!("head(remote:{})", identity.value),
    }
}

impl<W: Write + Send> SurfaceHost for ConsoleHost<W> {
    fn open(&self, surface: &Surface) {
        let replaced = self
            .open
            .lock()
            .expect("console host lock poisoned")
            .insert(surface.viewer.clone(), surface.id);
        if let Some(replaced) = replaced {
            // Opening over a surface closes it, as real inventory hosts do.
            self.closed
                .lock()
                .expect("console host lock poisoned")
                .push((surface.viewer.clone(), replaced));
        }
        self.print_surface("open", surface);
    }

    fn refresh(&self, surface: &Surface) {
        self.print_surface("refresh", surface);
    }

    fn close(&self, viewer: &ActorId) {
        let closed = self
            .open
            .lock()
            .expect("console host lock poisoned")
            .remove(viewer);
        if let Some(surface_id) = closed {
            self.writeln(&format!("[close {surface_id} for {viewer}]"));
            self.closed
                .lock()
                .expect("console host lock poisoned")
                .push((viewer.clone(), surface_id));
        }
    }

    fn send_message(&self, viewer: &ActorId, message: &str) {
        self.writeln(&format!("[message to {viewer}] {message}"));
    }

    fn play_feedback(&self, viewer: &ActorId, feedback: Feedback) {
        self.writeln(&format!("[feedback for {viewer}] {feedback:?}"));
    }
}

/// Teleport service stand-in that logs the commands it would run.
#[derive(Debug, Default)]
pub struct LoggingTeleportService;

impl TeleportService for LoggingTeleportService {
    fn dispatch(&self, actor: &ActorId, command: &TerminalCommand) -> TeleportServiceResult<()> {
        tracing::info!(actor = %actor, command = %command, "teleport service received command");
        Ok(())
    }
}

/// Every actor is online; actors registered with [`ConsoleDirectory::add_local`]
/// are resolved without remote lookups.
#[derive(Debug, Default)]
pub struct ConsoleDirectory {
    locals: DashMap<String, LocalActor>,
}

impl ConsoleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_local(&self, name: &str, region: &str, dimension: &str) {
        self.locals.insert(
            name.to_ascii_lowercase(),
            LocalActor {
                id: ActorId::new(name.to_ascii_lowercase()),
                name: name.to_owned(),
                region: region.to_owned(),
                dimension: dimension.to_owned(),
            },
        );
    }
}

impl ActorDirectory for ConsoleDirectory {
    fn is_online(&self, _actor: &ActorId) -> bool {
        true
    }

    fn local_actor(&self, name: &str) -> Option<LocalActor> {
        self.locals
            .get(&name.to_ascii_lowercase())
            .map(|actor| actor.value().clone())
    }
}
