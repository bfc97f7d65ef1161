//! scav-announcer-rs: periodic spoken announcements of scavenger hunt items.

mod catalog;
mod config;
mod cycler;
mod error;
mod history;
mod menu;
mod notifier;
mod scheduler;
mod selector;
mod service;
mod speech;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "scav-announcer-rs", about = "Scavenger hunt item announcer")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hunt document (PDF or form-feed separated text); overrides config
    #[arg(short, long)]
    document: Option<PathBuf>,

    /// Seed for random selection
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive menu (default)
    Menu,
    /// Print the most recent announcements
    History {
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// List voices offered by the speech backend
    Voices,
    /// Speak a sample sentence with the configured voice
    TestVoice,
}

fn init_logging(config: &config::LoggingConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
    };

    let file_layer = config.file.as_ref().and_then(|path| {
        match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            ),
            Err(e) => {
                eprintln!("Failed to open log file {}: {e}", path.display());
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
}

/// The `history` subcommand. Needs no speech backend.
fn recent_history(config: &config::Config, count: Option<usize>) -> error::Result<String> {
    let history = history::HistoryStore::load(config.history.resolved_path())?;
    let n = count.unwrap_or(config.history.recent_limit);
    Ok(history::format_recent(
        history.recent(n),
        config.preview.max_item_chars,
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = config::Config::load(args.config.as_deref());
    init_logging(&config.logging, args.verbose);
    info!("scav-announcer-rs starting");
    info!("Config loaded: {:?}", config.schedule);

    if let Some(document) = args.document {
        config.document.path = document;
    }

    match args.command.unwrap_or(Command::Menu) {
        Command::Voices => {
            let speaker = speech::CommandSpeaker::new(&config.tts)?;
            for name in speaker.list_voices(&config.tts.voice) {
                println!("{name}");
            }
            return Ok(());
        }
        Command::TestVoice => {
            let speaker = speech::CommandSpeaker::new(&config.tts)?;
            speaker.test_voice(&speech::VoiceSettings::from(&config.tts))?;
            return Ok(());
        }
        Command::History { count } => {
            println!("{}", recent_history(&config, count)?);
            return Ok(());
        }
        Command::Menu => {}
    }

    let speaker = Arc::new(speech::CommandSpeaker::new(&config.tts)?);

    let catalog = match catalog::Catalog::load(&config.document.path) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: Could not read the scavenger hunt list!");
            return Err(e.into());
        }
    };

    let history = history::HistoryStore::open(config.history.resolved_path());
    info!("{} past announcements on record", history.len());

    let app = service::ScavAnnouncer::new(config, catalog, speaker, history, args.seed);
    menu::Menu::new(app).run().await;

    Ok(())
}
