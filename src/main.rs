//! lyric-sync - plays lyrics against a simulated media clock and logs what
//! a renderer would show

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use lyric_sync::features::Settings;
use lyric_sync::features::lyrics::engine::{
    FrameClock, FrameDriver, MonotonicClock, STOP_SENTINEL_MS, ScrollIntent, SharedEngine,
};
use lyric_sync::features::lyrics::provider::load_document;
use lyric_sync::features::lyrics::{
    FileLyricsProvider, HttpLyricsProvider, LyricDocument, LyricsQuery, SyncEngine,
};

/// How often the simulated player reports its position
const MEDIA_CLOCK_INTERVAL_MS: u64 = 250;

const USAGE: &str = "usage: lyric-sync <FILE> | --id <MUSIC_ID> | --search <QUERY> [--isrc <ISRC>] [--start <MS>]";

enum Source {
    File(PathBuf),
    Query(LyricsQuery),
}

struct Args {
    source: Source,
    start_ms: f64,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut file = None;
    let mut query = LyricsQuery::default();
    let mut start_ms = 0.0;

    while let Some(arg) = args.next() {
        let mut value = |name: &str| args.next().with_context(|| format!("{} needs a value", name));
        match arg.as_str() {
            "--id" => query.music_id = Some(value("--id")?),
            "--search" => query.query = Some(value("--search")?),
            "--isrc" => query.isrc = Some(value("--isrc")?),
            "--start" => {
                start_ms = value("--start")?
                    .parse()
                    .context("--start must be a number of milliseconds")?
            }
            "-h" | "--help" => bail!(USAGE),
            other if other.starts_with("--") => bail!("unknown option {}\n{}", other, USAGE),
            other => file = Some(PathBuf::from(other)),
        }
    }

    let source = match file {
        Some(path) => Source::File(path),
        None if !query.is_empty() => Source::Query(query),
        None => bail!(USAGE),
    };
    Ok(Args { source, start_ms })
}

async fn load(source: &Source, settings: &Settings) -> Result<LyricDocument> {
    match source {
        Source::File(path) => FileLyricsProvider::load_file(path).await,
        Source::Query(query) => {
            if let Some(dir) = &settings.provider.lyrics_dir {
                if let Some(document) = load_document(&FileLyricsProvider::new(dir), query).await {
                    return Ok(document);
                }
            }
            let http = HttpLyricsProvider::new(settings.provider.base_url.as_str())?;
            load_document(&http, query)
                .await
                .context("no lyrics found")
        }
    }
}

fn format_ms(ms: u64) -> String {
    format!("{:02}:{:02}.{:03}", ms / 60_000, (ms / 1000) % 60, ms % 1000)
}

fn log_scroll(intent: ScrollIntent) {
    tracing::debug!(
        "Scroll to row {} ({:?}, {:?})",
        intent.target.line_index(),
        intent.target,
        intent.reason
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = parse_args()?;
    let settings = Settings::load();
    let document = load(&args.source, &settings).await?;

    let end_ms = document
        .lines()
        .iter()
        .map(|line| line.end_ms)
        .max()
        .unwrap_or(0) as f64
        + 1000.0;
    tracing::info!(
        "Playing {} lines ({}) from {}",
        document.len(),
        if document.is_word_synced() {
            "word synced"
        } else {
            "line synced"
        },
        format_ms(args.start_ms.max(0.0) as u64)
    );

    let clock = MonotonicClock::new();
    let engine: SharedEngine = Arc::new(Mutex::new(SyncEngine::new(settings.engine_config())));
    engine.lock().set_document(Some(document), clock.now_ms());

    let (intent_tx, mut intents) = mpsc::unbounded_channel();
    let driver = FrameDriver::spawn(
        engine.clone(),
        clock,
        settings.playback.frame_interval(),
        intent_tx,
    );

    let mut media = tokio::time::interval(std::time::Duration::from_millis(
        MEDIA_CLOCK_INTERVAL_MS,
    ));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = media.tick() => {
                let now = clock.now_ms();
                let position = args.start_ms + now;
                if position > end_ms {
                    break;
                }

                let mut engine = engine.lock();
                let update = engine.set_current_time(position, now);
                if let Some(intent) = update.scroll {
                    log_scroll(intent);
                }
                if update.gap_changed {
                    if let Some(gap) = engine.gap() {
                        tracing::info!(
                            "♪ instrumental, {:.1}s",
                            gap.duration_ms() as f64 / 1000.0
                        );
                    }
                }
                if update.active_changed {
                    if let Some(document) = engine.document() {
                        for &index in engine.active_lines() {
                            let Some(line) = document.line(index) else { continue };
                            let side = if line.is_opposite_speaker { ">>" } else { "" };
                            tracing::info!("[{}] {}{}", format_ms(line.start_ms), side, line.text());
                            if line.has_background {
                                tracing::info!("           ({})", line.background_text());
                            }
                        }
                    }
                }
                let snapshot = engine.snapshot();
                tracing::trace!("{}", serde_json::to_string(&snapshot)?);
            }
            Some(intent) = intents.recv() => log_scroll(intent),
            _ = &mut ctrl_c => break,
        }
    }

    engine.lock().set_current_time(STOP_SENTINEL_MS, clock.now_ms());
    driver.shutdown();
    Ok(())
}
