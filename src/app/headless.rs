//! Headless playback: walks the queue against a wall clock and prints lyric
//! lines as they become active.

use super::{NowPlaying, PlaybackOutcome, Session};
use crate::lyrics::parser::LAST_LINE_DURATION;
use crate::lyrics::{
    LyricDocument, LyricPlayer, LyricPlayerOptions, LyricRenderer, PlaybackClock, WallClock,
};
use crate::ncm::TrackResolver;
use crate::tui::PlainRenderer;
use std::time::{Duration, Instant};

/// How long a track runs: its reported duration, else until the last lyric
/// line has had its time.
pub fn playback_length(track: &crate::ncm::models::Track, doc: &LyricDocument) -> f64 {
    if let Some(ms) = track.duration_ms.filter(|&ms| ms > 0) {
        return ms as f64 / 1000.0;
    }
    match doc.lines.last() {
        Some(last) if !doc.no_timestamp => last.time + LAST_LINE_DURATION,
        _ => LAST_LINE_DURATION,
    }
}

/// Tick the player's frame loop until it stops or `done` says so.
pub async fn drive_frames<R, C>(
    player: &mut LyricPlayer<R, C>,
    period: Duration,
    mut done: impl FnMut(&LyricPlayer<R, C>) -> bool,
) where
    R: LyricRenderer,
    C: PlaybackClock,
{
    let mut frames = tokio::time::interval(period.max(Duration::from_millis(1)));
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        frames.tick().await;
        if done(player) || !player.on_frame(Instant::now()) {
            break;
        }
    }
}

/// Play `first`, then keep following the queue until `limit` tracks were
/// attempted or nothing is left.
pub async fn run_queue<R: TrackResolver>(
    session: &mut Session<R>,
    first: PlaybackOutcome,
    limit: usize,
) {
    let mut outcome = first;
    let mut attempts = 0;
    loop {
        attempts += 1;
        let played = match outcome {
            PlaybackOutcome::Playing(np) => {
                play_through(session, &np).await;
                true
            }
            PlaybackOutcome::Unavailable { track_id } => {
                println!("skipping {track_id}: no playable url");
                false
            }
            PlaybackOutcome::Failed(msg) => {
                println!("skipping: {msg}");
                false
            }
            PlaybackOutcome::Stale | PlaybackOutcome::Idle => break,
        };
        if attempts >= limit {
            break;
        }
        outcome = if played {
            session.on_track_ended().await
        } else {
            session.advance(true).await
        };
    }
}

async fn play_through<R: TrackResolver>(session: &Session<R>, np: &NowPlaying) {
    let cfg = session.config();
    let doc = session.lyrics().clone();
    let length = playback_length(&np.track, &doc);
    println!(
        "== {} ({}) [{}]",
        np.track.display_name(),
        crate::lyrics::format_time(length),
        session.queue().play_mode().label()
    );

    let now = Instant::now();
    let mut clock = WallClock::new();
    clock.resume(now);
    let mut player = LyricPlayer::new(
        PlainRenderer::new(std::io::stdout()),
        clock,
        LyricPlayerOptions::from(&cfg.lyrics),
    )
    .on_line_change(|index| tracing::debug!(index, "active line"));
    player.set_lyrics(doc.lines, doc.no_timestamp, now);
    player.play();

    let period = Duration::from_millis(cfg.lyrics.frame_interval_ms);
    drive_frames(&mut player, period, |p| {
        p.clock().position_at(Instant::now()) >= length
    })
    .await;

    // Untimed or empty lyrics stop the frame loop at once; wait out the track.
    let left = length - player.clock().position_at(Instant::now());
    if left > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(left)).await;
    }
    player.destroy();
}
