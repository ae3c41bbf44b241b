//! Lyric player: keeps the highlighted line in step with playback time.
//!
//! The player never schedules anything itself. The host calls
//! [`LyricPlayer::on_frame`] once per display frame while it returns `true`,
//! which mirrors a `requestAnimationFrame` loop and keeps the logic testable
//! with a fake clock and renderer.

use super::clock::PlaybackClock;
use super::parser::LyricLine;
use super::renderer::{LyricRenderer, RenderedLine, RenderedLyrics, ScrollMode};
use std::time::{Duration, Instant};

pub type LineClickFn = Box<dyn FnMut(f64, usize)>;
pub type LineChangeFn = Box<dyn FnMut(usize)>;

#[derive(Debug, Clone, Copy)]
pub struct LyricPlayerOptions {
    /// Auto-scroll is suspended this long after the last manual scroll.
    pub user_scroll_hold: Duration,
    pub spacer_ratio: f32,
}

impl Default for LyricPlayerOptions {
    fn default() -> Self {
        Self {
            user_scroll_hold: Duration::from_secs(3),
            spacer_ratio: 0.45,
        }
    }
}

impl From<&crate::config::LyricsConfig> for LyricPlayerOptions {
    fn from(cfg: &crate::config::LyricsConfig) -> Self {
        Self {
            user_scroll_hold: Duration::from_secs_f64(cfg.scroll_hold_secs.max(0.0)),
            spacer_ratio: cfg.spacer_ratio,
        }
    }
}

/// Index of the line active at `time`.
///
/// Before the first line maps to 0, at or past the last line maps to the last
/// one; otherwise the `i` with `lines[i].time <= time < lines[i + 1].time`.
pub fn find_current_line(lines: &[LyricLine], time: f64) -> Option<usize> {
    let last = lines.len().checked_sub(1)?;
    if time < lines[0].time {
        return Some(0);
    }
    if time >= lines[last].time {
        return Some(last);
    }
    let after = lines.partition_point(|l| l.time <= time);
    Some(after.saturating_sub(1).min(last))
}

pub struct LyricPlayer<R: LyricRenderer, C: PlaybackClock> {
    renderer: R,
    clock: C,
    options: LyricPlayerOptions,
    lyrics: Vec<LyricLine>,
    rendered: Vec<RenderedLine>,
    no_timestamp: bool,
    current_index: Option<usize>,
    playing: bool,
    /// A frame is scheduled; cleared on pause/destroy.
    frame_requested: bool,
    scroll_hold_until: Option<Instant>,
    destroyed: bool,
    on_line_click: Option<LineClickFn>,
    on_line_change: Option<LineChangeFn>,
}

impl<R: LyricRenderer, C: PlaybackClock> LyricPlayer<R, C> {
    pub fn new(renderer: R, clock: C, options: LyricPlayerOptions) -> Self {
        Self {
            renderer,
            clock,
            options,
            lyrics: Vec::new(),
            rendered: Vec::new(),
            no_timestamp: false,
            current_index: None,
            playing: false,
            frame_requested: false,
            scroll_hold_until: None,
            destroyed: false,
            on_line_click: None,
            on_line_change: None,
        }
    }

    pub fn on_line_click(mut self, f: impl FnMut(f64, usize) + 'static) -> Self {
        self.on_line_click = Some(Box::new(f));
        self
    }

    pub fn on_line_change(mut self, f: impl FnMut(usize) + 'static) -> Self {
        self.on_line_change = Some(Box::new(f));
        self
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lyrics
    }

    /// Replace the lyrics and redraw. Timed lyrics start on line 0.
    pub fn set_lyrics(&mut self, lines: Vec<LyricLine>, no_timestamp: bool, now: Instant) {
        if self.destroyed {
            return;
        }
        self.lyrics = lines;
        self.no_timestamp = no_timestamp;
        self.current_index = None;
        self.render();

        if !no_timestamp && !self.lyrics.is_empty() {
            self.update_line(0, true, now);
        }
    }

    pub fn play(&mut self) {
        if self.no_timestamp || self.destroyed {
            return;
        }
        self.playing = true;
        self.frame_requested = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
        self.frame_requested = false;
    }

    /// One sync-loop iteration. Returns whether the next frame should run.
    pub fn on_frame(&mut self, now: Instant) -> bool {
        if !self.frame_requested || !self.playing || self.no_timestamp || self.destroyed {
            self.frame_requested = false;
            return false;
        }

        let time = self.clock.current_time();
        if let Some(index) = find_current_line(&self.lyrics, time)
            && Some(index) != self.current_index
        {
            self.update_line(index, false, now);
        }
        true
    }

    /// Re-derive the active line after a seek and jump to it.
    pub fn sync_index(&mut self, now: Instant) {
        if self.no_timestamp || self.destroyed {
            return;
        }
        let time = self.clock.current_time();
        if let Some(index) = find_current_line(&self.lyrics, time) {
            self.update_line(index, true, now);
        }
        if self.playing {
            self.frame_requested = true;
        }
    }

    /// Manual scroll input; re-arms the auto-scroll hold.
    pub fn on_wheel(&mut self, now: Instant) {
        if self.destroyed {
            return;
        }
        self.scroll_hold_until = Some(now + self.options.user_scroll_hold);
    }

    pub fn is_user_scrolling(&self, now: Instant) -> bool {
        self.scroll_hold_until.is_some_and(|until| now < until)
    }

    /// A rendered line was clicked; reports its start time for seeking.
    pub fn on_click(&mut self, index: usize) {
        if self.no_timestamp || self.destroyed {
            return;
        }
        let Some(line) = self.lyrics.get(index) else {
            return;
        };
        let time = line.time;
        if let Some(cb) = self.on_line_click.as_mut() {
            cb(time, index);
        }
    }

    pub fn index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Stop the loop, detach callbacks and release rendered state. The player
    /// is inert afterwards.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.pause();
        self.scroll_hold_until = None;
        self.on_line_click = None;
        self.on_line_change = None;
        self.lyrics.clear();
        self.rendered.clear();
        self.current_index = None;
        self.renderer.clear();
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn render(&mut self) {
        if self.lyrics.is_empty() {
            self.rendered.clear();
            self.renderer.render_empty();
            return;
        }

        self.rendered = self
            .lyrics
            .iter()
            .map(|l| RenderedLine {
                index: l.index,
                time: l.time,
                text: if l.text.is_empty() {
                    "...".to_string()
                } else {
                    l.text.clone()
                },
                translation: l.translation.clone(),
            })
            .collect();

        self.renderer.render(&RenderedLyrics {
            lines: self.rendered.clone(),
            untimed: self.no_timestamp,
            spacer_ratio: self.options.spacer_ratio,
        });
    }

    fn update_line(&mut self, index: usize, force: bool, now: Instant) {
        if Some(index) == self.current_index && !force {
            return;
        }
        if index >= self.rendered.len() {
            return;
        }

        let previous = self.current_index.filter(|&i| i < self.rendered.len());
        self.current_index = Some(index);
        self.renderer.highlight(previous, index);

        if force {
            self.renderer.scroll_to(index, ScrollMode::Immediate);
        } else if !self.is_user_scrolling(now) {
            self.renderer.scroll_to(index, ScrollMode::Smooth);
        }

        if let Some(cb) = self.on_line_change.as_mut() {
            cb(index);
        }
    }
}
