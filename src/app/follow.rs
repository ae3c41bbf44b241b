//! Interactive lyric view driven by a wall clock.

use super::actions::Action;
use super::events::{Event, LyricEvent};
use crate::config::Config;
use crate::input;
use crate::lyrics::{LyricDocument, LyricPlayer, LyricPlayerOptions, WallClock};
use crate::tui::{self, FollowStatus, LyricView, TuiTerminal};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

type FollowPlayer = LyricPlayer<LyricView, Rc<RefCell<WallClock>>>;

pub struct Follow {
    player: FollowPlayer,
    clock: Rc<RefCell<WallClock>>,
    title: String,
}

impl Follow {
    /// Build the player and wire its callbacks into `tx`.
    pub fn new(cfg: &Config, title: String, tx: mpsc::Sender<Event>) -> Self {
        let clock = Rc::new(RefCell::new(WallClock::new()));
        let changes = tx.clone();
        let player = LyricPlayer::new(
            LyricView::new(),
            clock.clone(),
            LyricPlayerOptions::from(&cfg.lyrics),
        )
        .on_line_change(move |index| {
            let _ = changes.try_send(Event::Lyric(LyricEvent::LineChanged(index)));
        })
        .on_line_click(move |time, index| {
            let _ = tx.try_send(Event::Lyric(LyricEvent::LineClicked { time, index }));
        });

        Self {
            player,
            clock,
            title,
        }
    }

    pub fn start(&mut self, doc: LyricDocument, now: Instant) {
        self.player.set_lyrics(doc.lines, doc.no_timestamp, now);
        self.clock.borrow_mut().resume(now);
        self.player.play();
    }

    #[cfg(test)]
    pub fn player(&self) -> &FollowPlayer {
        &self.player
    }

    pub fn position(&self, now: Instant) -> f64 {
        self.clock.borrow().position_at(now)
    }

    /// One display frame: advance sync and the scroll animation.
    pub fn frame(&mut self, now: Instant) {
        self.player.on_frame(now);
        self.player.renderer_mut().tick();
    }

    /// Returns `false` when the view should close.
    pub fn handle_action(&mut self, action: Action, now: Instant) -> bool {
        match action {
            Action::Quit => return false,
            Action::TogglePause => {
                if self.clock.borrow().is_running() {
                    self.clock.borrow_mut().pause(now);
                    self.player.pause();
                } else {
                    self.clock.borrow_mut().resume(now);
                    self.player.play();
                }
            }
            Action::SeekBy(delta) => {
                let target = self.position(now) + delta;
                self.seek(target, now);
            }
            Action::Scroll(rows) => {
                self.player.on_wheel(now);
                self.player.renderer_mut().scroll_by(rows);
            }
            Action::Click { column, row } => {
                if let Some(index) = self.player.renderer().line_at(column, row) {
                    self.player.on_click(index);
                }
            }
            Action::Resize => {}
        }
        true
    }

    pub fn handle_lyric(&mut self, event: LyricEvent, now: Instant) {
        match event {
            LyricEvent::LineClicked { time, index } => {
                tracing::debug!(index, time, "seek to clicked line");
                self.seek(time, now);
            }
            LyricEvent::LineChanged(index) => tracing::debug!(index, "active line"),
        }
    }

    pub fn status(&self, now: Instant) -> FollowStatus {
        FollowStatus {
            title: self.title.clone(),
            position: self.position(now),
            paused: !self.clock.borrow().is_running(),
            line: self.player.index(),
            total: self.player.lines().len(),
        }
    }

    pub fn draw(&mut self, terminal: &mut TuiTerminal, now: Instant) -> anyhow::Result<()> {
        let status = self.status(now);
        tui::draw_follow(terminal, self.player.renderer_mut(), &status)
    }

    pub fn finish(&mut self) {
        self.player.destroy();
    }

    fn seek(&mut self, seconds: f64, now: Instant) {
        self.clock.borrow_mut().seek(seconds, now);
        self.player.sync_index(now);
    }
}

pub async fn run(
    terminal: &mut TuiTerminal,
    cfg: &Config,
    title: String,
    doc: LyricDocument,
) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<Event>(256);
    input::spawn_input_task(tx.clone());

    let mut follow = Follow::new(cfg, title, tx);
    follow.start(doc, Instant::now());

    let period = Duration::from_millis(cfg.lyrics.frame_interval_ms.max(1));
    let mut frames = tokio::time::interval(period);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = frames.tick() => {
                let now = Instant::now();
                follow.frame(now);
                follow.draw(terminal, now)?;
            }
            Some(ev) = rx.recv() => {
                let now = Instant::now();
                match ev {
                    Event::Input(input) => {
                        if let Some(action) = input::map_input_to_action(input)
                            && !follow.handle_action(action, now)
                        {
                            break;
                        }
                    }
                    Event::Lyric(lyric) => follow.handle_lyric(lyric, now),
                }
            }
        }
    }

    follow.finish();
    Ok(())
}
