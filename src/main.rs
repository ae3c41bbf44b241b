mod app;
mod config;
mod input;
mod lyrics;
mod ncm;
mod queue;
mod storage;
mod tui;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use lyrics::LyricDocument;
use ncm::models::{Track, TrackId};
use ncm::{NcmClient, TrackResolver};
use queue::{PlayMode, QueueKind, RuntimeQueue};
use std::path::{Path, PathBuf};
use storage::StorageHandle;

#[derive(Debug, Parser)]
#[command(
    name = "tonearm",
    version,
    about = "Synchronized lyrics and play queue for NetEase Cloud Music"
)]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a local LRC file and print the timed lines.
    Parse {
        file: PathBuf,
        /// LRC file with translated lines to merge in.
        #[arg(long)]
        translation: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Fetch and print lyrics for a track.
    Lyrics {
        id: TrackId,
        #[arg(long)]
        json: bool,
    },
    /// Print the playable URL of a track.
    Url { id: TrackId },
    /// Follow a local LRC file in an interactive view.
    Follow {
        file: PathBuf,
        #[arg(long)]
        translation: Option<PathBuf>,
    },
    /// Play tracks headless, printing lyric lines as they come up.
    /// Without ids, resumes the saved session.
    Play {
        ids: Vec<TrackId>,
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Treat the ids as the liked-songs playlist with this id (enables smart mode).
        #[arg(long)]
        liked: Option<u64>,
        /// Stop after this many tracks.
        #[arg(long)]
        tracks: Option<usize>,
    },
    /// Print the last saved session.
    Restore,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Smart,
    RepeatList,
    Shuffle,
    RepeatOne,
}

impl From<ModeArg> for PlayMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Smart => PlayMode::Smart,
            ModeArg::RepeatList => PlayMode::RepeatList,
            ModeArg::Shuffle => PlayMode::Shuffle,
            ModeArg::RepeatOne => PlayMode::RepeatOne,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command {
        Command::Parse {
            file,
            translation,
            json,
        } => {
            let doc = load_lrc(&file, translation.as_deref())?;
            print_document(&doc, json)?;
        }
        Command::Lyrics { id, json } => {
            let client = NcmClient::new(&cfg.api)?;
            let payload = client.lyrics(id).await?;
            let doc = LyricDocument::from_payload(&payload, cfg.lyrics.merge_translation);
            print_document(&doc, json)?;
        }
        Command::Url { id } => {
            let client = NcmClient::new(&cfg.api)?;
            match client.audio_url(id).await?.url {
                Some(url) => println!("{url}"),
                None => anyhow::bail!("track {id} has no playable url"),
            }
        }
        Command::Follow { file, translation } => {
            let doc = load_lrc(&file, translation.as_deref())?;
            let title = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            let mut terminal = tui::TerminalGuard::enter().context("init terminal")?;
            app::follow::run(terminal.terminal_mut(), &cfg, title, doc).await?;
        }
        Command::Play {
            ids,
            mode,
            liked,
            tracks,
        } => {
            let client = NcmClient::new(&cfg.api)?;
            let storage = StorageHandle::new(cfg.paths.database());
            let mut session = app::Session::restore(cfg.clone(), client.clone(), storage).await;
            if let Some(mode) = mode {
                session.set_play_mode(mode.into());
            }

            let first = if ids.is_empty() {
                if session.queue().is_empty() {
                    anyhow::bail!("nothing to resume; pass track ids");
                }
                session.play_current().await
            } else {
                let queue = build_queue(&client, &ids, liked).await;
                session.start_queue(queue, ids, 0).await
            };
            let limit = tracks.unwrap_or_else(|| session.queue().len());
            app::headless::run_queue(&mut session, first, limit).await;
            if let Some(np) = session.now_playing() {
                tracing::info!(
                    track = %np.track.display_name(),
                    history = session.queue().history().len(),
                    "stopped"
                );
            }
        }
        Command::Restore => {
            let storage = StorageHandle::new(cfg.paths.database());
            match app::load_snapshot(&storage).await {
                Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
                None => println!("No saved session."),
            }
        }
    }

    Ok(())
}

fn load_lrc(file: &Path, translation: Option<&Path>) -> anyhow::Result<LyricDocument> {
    let raw = std::fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;
    let doc = lyrics::parse_lrc(&raw);
    match translation {
        Some(path) => {
            let tr = std::fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(lyrics::merge_translation(doc, &tr))
        }
        None => Ok(doc),
    }
}

fn print_document(doc: &LyricDocument, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(doc)?);
        return Ok(());
    }
    if doc.is_empty() {
        println!("(no lyrics)");
    }
    for line in &doc.lines {
        if doc.no_timestamp {
            println!("{}", line.text);
        } else {
            println!(
                "{}",
                tui::plain::format_line(line.time, &line.text, line.translation.as_deref())
            );
        }
    }
    Ok(())
}

/// Look up each id; tracks the API does not know keep a bare placeholder.
async fn build_queue(client: &NcmClient, ids: &[TrackId], liked: Option<u64>) -> RuntimeQueue {
    let mut tracks = Vec::with_capacity(ids.len());
    for &id in ids {
        let track = match client.track_detail(id).await {
            Ok(Some(t)) => t,
            Ok(None) => placeholder(id),
            Err(e) => {
                tracing::warn!(track_id = id, "track detail failed: {e:#}");
                placeholder(id)
            }
        };
        tracks.push(track);
    }

    match liked {
        Some(id) => RuntimeQueue {
            id,
            name: "Liked songs".to_string(),
            kind: QueueKind::Liked,
            tracks,
        },
        None => RuntimeQueue {
            id: 0,
            name: "Command line".to_string(),
            kind: QueueKind::Regular,
            tracks,
        },
    }
}

fn placeholder(id: TrackId) -> Track {
    Track {
        id,
        name: id.to_string(),
        artists: Vec::new(),
        album: None,
        duration_ms: None,
    }
}
