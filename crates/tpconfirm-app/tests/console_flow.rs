use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tpconfirm_app::{ConsoleApp, ConsoleDirectory, ConsoleFlow, ConsoleHost, LoggingTeleportService};
use tpconfirm_config::TpConfirmConfig;
use tpconfirm_engine::{ConfirmationEngine, EngineCollaborators};
use tpconfirm_protocol::AllEnabled;
use tpconfirm_remote::{CachedEnrichmentSource, InMemoryTransport};
use tpconfirm_scheduler::ManualScheduler;
use tpconfirm_surface::ProfileIdentityApplier;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().expect("buffer lock").clone()).expect("utf8 output")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

struct Console {
    app: ConsoleApp<SharedBuffer>,
    engine: Arc<ConfirmationEngine>,
    scheduler: ManualScheduler,
    output: SharedBuffer,
}

fn console() -> Console {
    let scheduler = ManualScheduler::new();
    let output = SharedBuffer::default();
    let host = Arc::new(ConsoleHost::new(output.clone()));
    let directory = Arc::new(ConsoleDirectory::new());
    let transport = Arc::new(InMemoryTransport::default());
    let source = CachedEnrichmentSource::new(transport.clone(), Handle::current());
    let engine = Arc::new(ConfirmationEngine::new(
        &TpConfirmConfig::default(),
        EngineCollaborators {
            host: host.clone(),
            service: Arc::new(LoggingTeleportService),
            directory: directory.clone(),
            source: Arc::new(source.clone()),
            toggles: Arc::new(AllEnabled),
            scheduler: Arc::new(scheduler.clone()),
            clock: Arc::new(scheduler.clock().clone()),
            identity: Arc::new(ProfileIdentityApplier),
        },
    ));
    Console {
        app: ConsoleApp::new(Arc::clone(&engine), host, directory, transport, source),
        engine,
        scheduler,
        output,
    }
}

#[tokio::test]
async fn click_through_console_dispatches_once() {
    let console = console();
    for line in [
        "local Alex Lobby world_nether",
        "request steve Alex",
        "cmd steve /tpaccept",
        "click steve 11",
    ] {
        assert_eq!(console.app.handle_line(line), ConsoleFlow::Continue);
    }
    console.scheduler.advance(Duration::from_millis(50));

    let stats = console.engine.stats();
    assert_eq!(stats.terminal_dispatches_total, 1);
    assert_eq!(stats.auto_denies_total, 0);
    let output = console.output.text();
    assert!(output.contains("Alex wants to teleport to you"));
    assert!(output.contains("Server: Lobby | World: world_nether"));
    assert!(output.contains("NETHERRACK"));
    assert!(output.contains("[feedback for steve] Accept"));
}

#[tokio::test]
async fn closing_from_console_auto_denies() {
    let console = console();
    console.app.handle_line("request steve Alex TO_SENDER");
    console.app.handle_line("cmd steve tpdeny");
    console.app.handle_line("close steve");
    console.scheduler.run_pending();

    let stats = console.engine.stats();
    assert_eq!(stats.auto_denies_total, 1);
    assert_eq!(stats.terminal_dispatches_total, 1);
    assert_eq!(stats.open_sessions, 0);
}

#[tokio::test]
async fn unknown_lines_are_explained_and_quit_stops() {
    let console = console();
    assert_eq!(console.app.handle_line("teleport now"), ConsoleFlow::Continue);
    assert!(console.output.text().contains("unknown console command `teleport`"));
    assert_eq!(console.app.handle_line("quit"), ConsoleFlow::Quit);
}
