/// Looper - segment loop player
///
/// Opens an optional video, then drives the engine from a line-oriented
/// console on stdin. Engine events are printed from a separate thread.
use anyhow::Context;
use clap::Parser;
use looper_desktop::{Engine, EngineCommand, EngineHandle, HeadlessPlayer, Session};
use std::io::BufRead;
use std::path::PathBuf;
use std::thread;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod console;

use crate::config::LooperConfig;
use crate::console::ConsoleCommand;

#[derive(Parser)]
#[command(name = "looper")]
#[command(about = "Loop named segments of a video", long_about = None)]
struct Cli {
    /// Video to open on start
    path: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, env = "LOOPER_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr, stdout belongs to the console
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "looper=info,looper_desktop=info,looper_storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config =
        LooperConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    tracing::info!("Data directory: {}", config.data_dir().display());

    let session = Session::new(config.sidecar_store(), config.recent_files());
    let media = HeadlessPlayer::new(config.headless.bytes_per_second);
    let engine = Engine::spawn(Box::new(media), config.engine_config(), session)?;

    let events = engine.events().clone();
    let printer = thread::Builder::new()
        .name("looper-events".to_string())
        .spawn(move || {
            for event in events {
                if let Some(text) = console::describe(&event) {
                    println!("{text}");
                }
            }
        })?;

    if let Some(path) = cli.path {
        if path.is_file() {
            engine.send(EngineCommand::LoadVideo(path))?;
        } else {
            tracing::warn!("Ignoring {}: not a file", path.display());
        }
    }

    println!("Type 'help' for commands");
    run_console(&engine)?;

    engine.shutdown()?;
    if printer.join().is_err() {
        tracing::error!("Event printer panicked");
    }

    Ok(())
}

/// Read commands until `quit` or end of input
fn run_console(engine: &EngineHandle) -> anyhow::Result<()> {
    let stdin = std::io::stdin();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;

        let command = match console::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        if command == ConsoleCommand::Quit {
            break;
        }

        if let Err(message) = execute(engine, &command)? {
            println!("{message}");
        }
    }

    Ok(())
}

/// Run one console command
///
/// The outer error is an engine failure, the inner one a user mistake.
fn execute(
    engine: &EngineHandle,
    command: &ConsoleCommand,
) -> anyhow::Result<Result<(), String>> {
    if let Some(engine_command) = console::simple_command(command) {
        engine.send(engine_command)?;
        return Ok(Ok(()));
    }

    let status = match console::status_or_busy(engine.status())? {
        Ok(status) => status,
        Err(message) => return Ok(Err(message)),
    };

    let engine_command = match command {
        ConsoleCommand::Segments => {
            println!("{}", console::render_segments(&status));
            return Ok(Ok(()));
        }
        ConsoleCommand::Status => {
            println!("{}", console::render_status(&status));
            return Ok(Ok(()));
        }
        ConsoleCommand::Recent => {
            println!("{}", console::render_recent(&status.recent_files));
            return Ok(Ok(()));
        }
        ConsoleCommand::Help => {
            println!("{}", console::HELP);
            return Ok(Ok(()));
        }
        ConsoleCommand::Loop(n) => {
            console::segment_at(&status, *n).map(EngineCommand::PlaySegment)
        }
        ConsoleCommand::Delete(n) => {
            console::segment_at(&status, *n).map(EngineCommand::DeleteSegment)
        }
        ConsoleCommand::Rename(n, name) => {
            console::segment_at(&status, *n).map(|id| EngineCommand::RenameSegment {
                id,
                name: name.clone(),
            })
        }
        ConsoleCommand::OpenRecent(n) => {
            console::recent_at(&status, *n).map(EngineCommand::OpenRecent)
        }
        other => Err(format!("unsupported command: {other:?}")),
    };

    match engine_command {
        Ok(engine_command) => {
            engine.send(engine_command)?;
            Ok(Ok(()))
        }
        Err(message) => Ok(Err(message)),
    }
}
