use crate::ncm::models::{Track, TrackId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of previous indices remembered for "previous" in shuffle.
pub const HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayMode {
    /// Liked-songs only: the tail of the queue comes from the recommendation endpoint.
    Smart,
    #[default]
    RepeatList,
    Shuffle,
    RepeatOne,
}

impl PlayMode {
    pub fn label(self) -> &'static str {
        match self {
            PlayMode::Smart => "Mode: Smart",
            PlayMode::RepeatList => "Mode: Repeat list",
            PlayMode::Shuffle => "Mode: Shuffle",
            PlayMode::RepeatOne => "Mode: Repeat one",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueKind {
    /// The user's liked-songs playlist (`specialType == 5` on the API).
    Liked,
    #[default]
    Regular,
}

/// The collection the user started playback from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeQueue {
    pub id: u64,
    pub name: String,
    pub kind: QueueKind,
    pub tracks: Vec<Track>,
}

impl RuntimeQueue {
    pub fn is_liked(&self) -> bool {
        self.kind == QueueKind::Liked
    }
}

/// Bounded list of previously played indices; oldest entries fall off first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    entries: VecDeque<usize>,
    capacity: usize,
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, index: usize) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(index);
    }

    /// Re-bound to `capacity`, keeping the newest entries.
    pub fn resized(self, capacity: usize) -> Self {
        let mut history = Self::with_capacity(capacity);
        for index in self.entries {
            history.push(index);
        }
        history
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.entries.iter()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

/// Persisted form of [`PlaybackQueue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub queue: Option<RuntimeQueue>,
    pub track_ids: Vec<TrackId>,
    pub current_index: usize,
    pub play_mode: PlayMode,
    pub history: History,
    pub current_track: Option<Track>,
}

/// Track selection state: what is queued, where we are, and how to move on.
///
/// Methods only compute and commit indices. Resolving the chosen track is the
/// session's job.
#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    queue: Option<RuntimeQueue>,
    track_ids: Vec<TrackId>,
    current_index: usize,
    play_mode: PlayMode,
    history: History,
    current_track: Option<Track>,
}

impl PlaybackQueue {
    pub fn new(play_mode: PlayMode, history_capacity: usize) -> Self {
        Self {
            play_mode,
            history: History::with_capacity(history_capacity),
            ..Self::default()
        }
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.play_mode = mode;
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.track_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track_ids.is_empty()
    }

    pub fn runtime_queue(&self) -> Option<&RuntimeQueue> {
        self.queue.as_ref()
    }

    pub fn track_ids(&self) -> &[TrackId] {
        &self.track_ids
    }

    pub fn track_at(&self, index: usize) -> Option<&Track> {
        self.queue.as_ref().and_then(|q| q.tracks.get(index))
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    /// Record the track that actually started playing.
    pub fn set_current_track(&mut self, track: Track) {
        self.current_track = Some(track);
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Where playback goes after the current track under `mode`.
    /// `None` when nothing is queued.
    pub fn compute_next_index(&self, mode: PlayMode) -> Option<usize> {
        let len = self.track_ids.len();
        if len == 0 {
            return None;
        }
        let next = match mode {
            PlayMode::Smart | PlayMode::RepeatList => (self.current_index + 1) % len,
            PlayMode::Shuffle => rand::rng().random_range(0..len),
            PlayMode::RepeatOne => self.current_index,
        };
        Some(next)
    }

    /// Natural end of the current track. Returns the index to resolve next.
    pub fn on_track_ended(&mut self) -> Option<usize> {
        let next = self.compute_next_index(self.play_mode)?;
        if next > self.track_ids.len().saturating_sub(1) {
            return None;
        }
        self.set_index(next);
        Some(self.current_index)
    }

    /// Explicit next/previous from the user.
    pub fn advance(&mut self, forward: bool) -> Option<usize> {
        let len = self.track_ids.len();
        if len == 0 {
            return None;
        }

        match (self.play_mode, forward) {
            (PlayMode::Shuffle, true) => self.on_track_ended(),
            (PlayMode::Shuffle, false) => {
                // Back through what was actually played, not index - 1.
                let target = match self.history.pop() {
                    Some(i) if i < len => i,
                    _ => self.compute_next_index(PlayMode::Shuffle)?,
                };
                self.current_index = target;
                Some(target)
            }
            (_, true) => {
                let next = if self.current_index + 1 >= len {
                    0
                } else {
                    self.current_index + 1
                };
                self.set_index(next);
                Some(next)
            }
            (_, false) => {
                let prev = if self.current_index == 0 {
                    len - 1
                } else {
                    self.current_index - 1
                };
                self.set_index(prev);
                Some(prev)
            }
        }
    }

    /// The user picked a specific row.
    pub fn select(&mut self, index: usize) -> Option<usize> {
        if index >= self.track_ids.len() {
            return None;
        }
        self.set_index(index);
        Some(index)
    }

    /// Replace the active queue. Returns `true` when the smart tail should be
    /// refreshed.
    pub fn set_runtime_queue(&mut self, queue: RuntimeQueue, ids: Vec<TrackId>) -> bool {
        if !queue.is_liked() && self.play_mode == PlayMode::Smart {
            self.play_mode = PlayMode::RepeatList;
        }
        self.queue = Some(queue);
        self.track_ids = ids;
        self.clamp_index();
        self.needs_smart_refresh()
    }

    pub fn needs_smart_refresh(&self) -> bool {
        self.play_mode == PlayMode::Smart && self.queue.as_ref().is_some_and(|q| q.is_liked())
    }

    /// Swap in a new track list for the active queue (smart refresh results).
    pub fn replace_tracks(&mut self, tracks: Vec<Track>, ids: Vec<TrackId>) {
        if let Some(queue) = self.queue.as_mut() {
            queue.tracks = tracks;
            self.track_ids = ids;
            self.clamp_index();
        }
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            queue: self.queue.clone(),
            track_ids: self.track_ids.clone(),
            current_index: self.current_index,
            play_mode: self.play_mode,
            history: self.history.clone(),
            current_track: self.current_track.clone(),
        }
    }

    /// Rebuild from a snapshot. The history bound comes from `history_capacity`,
    /// not from whatever the snapshot recorded.
    pub fn restore(snapshot: QueueSnapshot, history_capacity: usize) -> Self {
        let mut q = Self {
            queue: snapshot.queue,
            track_ids: snapshot.track_ids,
            current_index: snapshot.current_index,
            play_mode: snapshot.play_mode,
            history: snapshot.history.resized(history_capacity),
            current_track: snapshot.current_track,
        };
        q.clamp_index();
        q
    }

    /// Every actual index change remembers where we came from.
    fn set_index(&mut self, index: usize) {
        if index != self.current_index {
            self.history.push(self.current_index);
        }
        self.current_index = index;
    }

    fn clamp_index(&mut self) {
        if self.current_index >= self.track_ids.len() {
            self.current_index = 0;
        }
    }
}
