#![forbid(unsafe_code)]

mod app;
mod background;
mod channel;
mod constants;
mod dom;
mod engine;
mod fetcher;
mod geometry;
mod input;
mod metadata;
mod preview;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{Level as TraceLevel, info, warn};
use tracing_subscriber::FmtSubscriber;

use app::App;
use channel::Notification;
use dom::Document;
use fetcher::ChannelFetcher;
use geometry::Size;
use input::InputEvent;
use settings::Settings;

#[derive(Parser)]
#[command(name = "linkpeek", about = "Link preview trigger/lifecycle daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Content-side daemon: replay an input-event trace through the engine
    Run {
        /// JSON-lines trace file (stdin when omitted)
        #[arg(long)]
        trace: Option<PathBuf>,

        #[arg(long, default_value_t = 1920)]
        viewport_width: i32,

        #[arg(long, default_value_t = 1080)]
        viewport_height: i32,
    },

    /// Background service: settings store and content fetcher
    Fetcher,
}

/// Trace entries that are not raw input events: page construction, clock
/// advancement and simulated background pushes
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum TraceEntry {
    Anchor { parent: usize, href: String },
    Element { parent: usize },
    Wait { ms: u64 },
    ShowPreview { url: String },
    SettingsUpdated,
}

fn main() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    match cli.command {
        Command::Run { trace, viewport_width, viewport_height } => {
            run_content(trace, Size::new(viewport_width, viewport_height))?
        }
        Command::Fetcher => background::run()?,
    }
    Ok(())
}

fn run_content(trace: Option<PathBuf>, viewport: Size) -> Result<()> {
    // Separate connections for settings and fetches, so a fetch in flight
    // never blocks a settings reload
    let mut settings_channel = ChannelFetcher::connect();
    let settings = settings_channel.get_settings().unwrap_or_else(|| {
        info!("No settings from background service, using defaults");
        Settings::default()
    });
    info!(viewport = ?viewport, trigger = ?settings.trigger, "Starting content daemon");

    let fetcher = ChannelFetcher::connect();
    let mut app = App::new(settings, Document::new(), viewport, fetcher);

    let reader: Box<dyn BufRead> = match trace {
        Some(path) => Box::new(std::io::BufReader::new(
            std::fs::File::open(&path)
                .with_context(|| format!("Failed to open trace file {}", path.display()))?,
        )),
        None => Box::new(std::io::stdin().lock()),
    };

    for line in reader.lines() {
        let line = line.context("Failed to read trace line")?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        if let Ok(entry) = serde_json::from_str::<TraceEntry>(&line) {
            apply_trace_entry(&mut app, &mut settings_channel, entry);
        } else if let Ok(event) = serde_json::from_str::<InputEvent>(&line) {
            app.handle_event(event, Instant::now());
        } else {
            warn!(line = %line, "Unrecognized trace line, skipping");
        }

        app.poll(Instant::now());
    }

    app.preview.close_preview();
    Ok(())
}

fn apply_trace_entry(
    app: &mut App<ChannelFetcher>,
    settings_channel: &mut ChannelFetcher,
    entry: TraceEntry,
) {
    match entry {
        TraceEntry::Anchor { parent, href } => {
            let Some(parent) = app.document.node_by_index(parent) else {
                warn!(parent = ?parent, "Anchor under unknown parent, skipping");
                return;
            };
            app.document.create_anchor(parent, href);
        }
        TraceEntry::Element { parent } => {
            let Some(parent) = app.document.node_by_index(parent) else {
                warn!(parent = ?parent, "Element under unknown parent, skipping");
                return;
            };
            app.document.create_element(parent);
        }
        TraceEntry::Wait { ms } => {
            std::thread::sleep(std::time::Duration::from_millis(ms));
        }
        TraceEntry::ShowPreview { url } => {
            app.handle_notification(Notification::ShowPreview { url }, Instant::now());
        }
        TraceEntry::SettingsUpdated => {
            app.handle_notification(Notification::SettingsUpdated, Instant::now());
            match settings_channel.get_settings() {
                Some(settings) => app.update_settings(settings),
                None => warn!("Settings reload failed, keeping last-known settings"),
            }
        }
    }
}
