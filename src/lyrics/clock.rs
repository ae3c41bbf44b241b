//! Playback time sources for the lyric player.

use std::time::Instant;

/// Live audio position in seconds.
pub trait PlaybackClock {
    fn current_time(&self) -> f64;
}

/// Wall-clock stand-in for an audio element: runs from `start`, pausable,
/// seekable.
#[derive(Debug, Clone)]
pub struct WallClock {
    started: Option<Instant>,
    offset: f64,
}

impl WallClock {
    /// A paused clock at position 0.
    pub fn new() -> Self {
        Self {
            started: None,
            offset: 0.0,
        }
    }

    pub fn position_at(&self, now: Instant) -> f64 {
        match self.started {
            Some(start) => self.offset + now.saturating_duration_since(start).as_secs_f64(),
            None => self.offset,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    pub fn resume(&mut self, now: Instant) {
        if self.started.is_none() {
            self.started = Some(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        self.offset = self.position_at(now);
        self.started = None;
    }

    pub fn seek(&mut self, seconds: f64, now: Instant) {
        self.offset = seconds.max(0.0);
        if self.started.is_some() {
            self.started = Some(now);
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock for WallClock {
    fn current_time(&self) -> f64 {
        self.position_at(Instant::now())
    }
}

impl<C: PlaybackClock + ?Sized> PlaybackClock for std::rc::Rc<std::cell::RefCell<C>> {
    fn current_time(&self) -> f64 {
        self.borrow().current_time()
    }
}
