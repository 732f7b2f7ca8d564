use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tpconfirm_app::cli::CLI_HELP;
use tpconfirm_app::{
    parse_cli_flags, ConsoleApp, ConsoleDirectory, ConsoleFlow, ConsoleHost,
    LoggingTeleportService,
};
use tpconfirm_config::{load_from_env, load_from_path};
use tpconfirm_engine::{ConfirmationEngine, EngineCollaborators};
use tpconfirm_protocol::AllEnabled;
use tpconfirm_remote::{CachedEnrichmentSource, CachedSourceOptions, InMemoryTransport};
use tpconfirm_scheduler::{main_loop, SystemClock};
use tpconfirm_surface::ProfileIdentityApplier;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let flags = parse_cli_flags(std::env::args().skip(1))?;
    if flags.help {
        println!("{CLI_HELP}");
        return Ok(());
    }

    let config = match &flags.config_path {
        Some(path) => load_from_path(path)?,
        None => load_from_env()?,
    };

    let (scheduler, mut main_context) = main_loop(Handle::current());
    let host = Arc::new(ConsoleHost::new(std::io::stdout()));
    let directory = Arc::new(ConsoleDirectory::new());
    let transport = Arc::new(InMemoryTransport::new(flags.remote_latency));
    let source = CachedEnrichmentSource::with_options(
        transport.clone(),
        Handle::current(),
        CachedSourceOptions {
            cache_ttl: config.enrichment_settings().cache_ttl,
            ..CachedSourceOptions::default()
        },
    );

    let engine = Arc::new(ConfirmationEngine::new(
        &config,
        EngineCollaborators {
            host: host.clone(),
            service: Arc::new(LoggingTeleportService),
            directory: directory.clone(),
            source: Arc::new(source.clone()),
            toggles: Arc::new(AllEnabled),
            scheduler: Arc::new(scheduler),
            clock: Arc::new(SystemClock),
            identity: Arc::new(ProfileIdentityApplier),
        },
    ));
    engine.start_maintenance();
    let console = ConsoleApp::new(engine, host, directory, transport, source);

    let (lines_tx, mut lines_rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if lines_tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    tracing::warn!(error = %error, "failed to read console input");
                    break;
                }
            }
        }
    });

    tracing::info!("tpconfirm console ready, type `help` for commands");
    loop {
        tokio::select! {
            line = lines_rx.recv() => {
                let Some(line) = line else {
                    break;
                };
                if console.handle_line(&line) == ConsoleFlow::Quit {
                    break;
                }
            }
            ran = main_context.run_next() => {
                if !ran {
                    break;
                }
                console.report_closes();
            }
        }
    }

    Ok(())
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}
