pub mod actions;
pub mod events;
pub mod follow;
pub mod headless;

use crate::config::Config;
use crate::lyrics::LyricDocument;
use crate::ncm::models::{LyricPayload, Track, TrackId};
use crate::ncm::TrackResolver;
use crate::queue::{PlayMode, PlaybackQueue, QueueSnapshot, RuntimeQueue};
use crate::storage::{self, SESSION_KEY, StorageHandle};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub track: Track,
    pub url: String,
}

/// What happened to a request to start a track.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackOutcome {
    Playing(NowPlaying),
    /// The track resolved but has no playable URL.
    Unavailable { track_id: TrackId },
    /// The resolver failed; previous playback state is untouched.
    Failed(String),
    /// A newer request was issued while this one was in flight.
    Stale,
    /// Nothing to play.
    Idle,
}

/// Everything written to durable storage on a track change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub queue: QueueSnapshot,
    pub now_playing: Option<NowPlaying>,
    pub lyrics: Option<LyricDocument>,
    pub saved_at: i64,
}

/// Monotonic token for "latest request wins".
#[derive(Debug, Default)]
struct RequestGeneration {
    latest: u64,
}

impl RequestGeneration {
    fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.latest
    }
}

#[derive(Debug)]
pub struct ResolveTicket {
    generation: u64,
    track: Track,
    cached_lyrics: Option<LyricDocument>,
}

#[derive(Debug)]
pub struct Resolution {
    generation: u64,
    track: Track,
    result: anyhow::Result<Resolved>,
}

#[derive(Debug)]
struct Resolved {
    detail: Option<Track>,
    url: Option<String>,
    lyrics: LyricDocument,
    /// False when the lyric fetch failed and `lyrics` is a stand-in.
    lyrics_fetched: bool,
}

/// Application context: owns the play queue and everything needed to turn a
/// queue position into a playing track.
pub struct Session<R: TrackResolver> {
    cfg: Config,
    resolver: R,
    storage: Option<StorageHandle>,
    queue: PlaybackQueue,
    now_playing: Option<NowPlaying>,
    lyrics: LyricDocument,
    lyric_cache: LruCache<TrackId, LyricDocument>,
    generation: RequestGeneration,
}

impl<R: TrackResolver> Session<R> {
    pub fn new(cfg: Config, resolver: R, storage: Option<StorageHandle>) -> Self {
        let queue = PlaybackQueue::new(cfg.playback.play_mode, cfg.playback.history_capacity);
        let cache_size =
            NonZeroUsize::new(cfg.playback.lyric_cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            cfg,
            resolver,
            storage,
            queue,
            now_playing: None,
            lyrics: LyricDocument::from_payload(&LyricPayload::default(), false),
            lyric_cache: LruCache::new(cache_size),
            generation: RequestGeneration::default(),
        }
    }

    /// Start from the last saved snapshot, or fresh when there is none.
    pub async fn restore(cfg: Config, resolver: R, storage: StorageHandle) -> Self {
        let snapshot = load_snapshot(&storage).await;
        let mut session = Self::new(cfg, resolver, Some(storage));
        if let Some(s) = snapshot {
            tracing::info!(index = s.queue.current_index, "restored playback session");
            session.queue =
                PlaybackQueue::restore(s.queue, session.cfg.playback.history_capacity);
            session.now_playing = s.now_playing;
            if let Some(doc) = s.lyrics {
                session.lyrics = doc;
            }
        }
        session
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn queue(&self) -> &PlaybackQueue {
        &self.queue
    }

    pub fn now_playing(&self) -> Option<&NowPlaying> {
        self.now_playing.as_ref()
    }

    pub fn lyrics(&self) -> &LyricDocument {
        &self.lyrics
    }

    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.queue.set_play_mode(mode);
    }

    /// Replace the active queue, then refresh the smart tail if it applies.
    pub async fn set_runtime_queue(&mut self, queue: RuntimeQueue, ids: Vec<TrackId>) {
        if self.queue.set_runtime_queue(queue, ids) {
            self.refresh_smart_queue().await;
        }
    }

    /// Install a new queue and play `index` from it. A smart refresh waits
    /// until that track is playing so it seeds the recommendations.
    pub async fn start_queue(
        &mut self,
        queue: RuntimeQueue,
        ids: Vec<TrackId>,
        index: usize,
    ) -> PlaybackOutcome {
        if !(self.queue.play_mode() == PlayMode::Smart && queue.is_liked()) {
            self.set_runtime_queue(queue, ids).await;
            return self.play_index(index).await;
        }
        self.queue.set_runtime_queue(queue, ids);
        let outcome = self.play_index(index).await;
        if matches!(outcome, PlaybackOutcome::Playing(_)) {
            self.refresh_smart_queue().await;
        }
        outcome
    }

    /// Pull the recommendation list for the liked-songs queue in smart mode.
    pub async fn refresh_smart_queue(&mut self) {
        if !self.queue.needs_smart_refresh() {
            return;
        }
        let Some(queue_id) = self.queue.runtime_queue().map(|q| q.id) else {
            return;
        };
        let current = self
            .queue
            .current_track()
            .or_else(|| self.queue.track_at(self.queue.current_index()))
            .map(|t| t.id);
        let Some(current) = current else {
            return;
        };

        match self.resolver.recommendation_queue(queue_id, current).await {
            Ok(entries) => {
                let tracks: Vec<Track> = entries.into_iter().filter_map(|e| e.song_info).collect();
                if tracks.is_empty() {
                    tracing::debug!(queue_id, "smart queue came back empty");
                    return;
                }
                let ids = tracks.iter().map(|t| t.id).collect();
                tracing::info!(queue_id, count = tracks.len(), "smart queue refreshed");
                self.queue.replace_tracks(tracks, ids);
            }
            Err(e) => tracing::warn!(queue_id, "smart queue refresh failed: {e:#}"),
        }
    }

    /// Jump to `index` and play it.
    pub async fn play_index(&mut self, index: usize) -> PlaybackOutcome {
        if self.queue.select(index).is_none() {
            return PlaybackOutcome::Idle;
        }
        self.play_at(index).await
    }

    /// Replay whatever the queue currently points at.
    pub async fn play_current(&mut self) -> PlaybackOutcome {
        let index = self.queue.current_index();
        self.play_at(index).await
    }

    /// The audio source finished the current track.
    pub async fn on_track_ended(&mut self) -> PlaybackOutcome {
        match self.queue.on_track_ended() {
            Some(index) => self.play_at(index).await,
            None => PlaybackOutcome::Idle,
        }
    }

    /// User pressed next/previous.
    pub async fn advance(&mut self, forward: bool) -> PlaybackOutcome {
        match self.queue.advance(forward) {
            Some(index) => self.play_at(index).await,
            None => PlaybackOutcome::Idle,
        }
    }

    async fn play_at(&mut self, index: usize) -> PlaybackOutcome {
        let Some(ticket) = self.begin_resolve(index) else {
            return PlaybackOutcome::Idle;
        };
        let resolution = self.resolve(ticket).await;
        self.apply(resolution).await
    }

    /// Issue a request for the track at `index`. Any earlier ticket becomes stale.
    pub fn begin_resolve(&mut self, index: usize) -> Option<ResolveTicket> {
        let track = self.queue.track_at(index)?.clone();
        let cached_lyrics = self.lyric_cache.get(&track.id).cloned();
        Some(ResolveTicket {
            generation: self.generation.issue(),
            track,
            cached_lyrics,
        })
    }

    /// Fetch URL, detail and lyrics for a ticket. URL and detail must both
    /// succeed; lyrics are best effort.
    pub async fn resolve(&self, ticket: ResolveTicket) -> Resolution {
        let ResolveTicket {
            generation,
            track,
            cached_lyrics,
        } = ticket;
        let id = track.id;

        let media = async {
            tokio::try_join!(self.resolver.audio_url(id), self.resolver.track_detail(id))
        };
        let lyrics = async move {
            match cached_lyrics {
                Some(doc) => (doc, true),
                None => self.fetch_lyrics(id).await,
            }
        };
        let (media, lyrics) = tokio::join!(media, lyrics);

        let (lyrics, lyrics_fetched) = lyrics;

        let result = media.map(|(source, detail)| Resolved {
            detail,
            url: source.url,
            lyrics,
            lyrics_fetched,
        });
        Resolution {
            generation,
            track,
            result,
        }
    }

    /// Commit a resolution unless a newer request superseded it.
    pub async fn apply(&mut self, resolution: Resolution) -> PlaybackOutcome {
        let Resolution {
            generation,
            track,
            result,
        } = resolution;

        if !self.generation.is_current(generation) {
            tracing::debug!(track_id = track.id, "dropping stale resolution");
            return PlaybackOutcome::Stale;
        }

        let resolved = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(track_id = track.id, "resolve failed: {e:#}");
                return PlaybackOutcome::Failed(format!("{e:#}"));
            }
        };

        let Some(url) = resolved.url else {
            tracing::warn!(track_id = track.id, "no playable url");
            return PlaybackOutcome::Unavailable { track_id: track.id };
        };

        let track = resolved.detail.unwrap_or(track);
        if resolved.lyrics_fetched {
            self.lyric_cache.put(track.id, resolved.lyrics.clone());
        }
        self.lyrics = resolved.lyrics;
        self.queue.set_current_track(track.clone());
        let now_playing = NowPlaying { track, url };
        self.now_playing = Some(now_playing.clone());
        tracing::info!(track = %now_playing.track.display_name(), "now playing");

        tokio::join!(self.persist(), self.scrobble(now_playing.track.id));
        PlaybackOutcome::Playing(now_playing)
    }

    /// Report the play to the server. Failures are logged and dropped.
    async fn scrobble(&self, id: TrackId) {
        let source = self.queue.runtime_queue().map(|q| q.id);
        if let Err(e) = self.resolver.scrobble(id, source).await {
            tracing::warn!(track_id = id, "scrobble failed: {e:#}");
        }
    }

    /// The second value is false when the fetch failed and the document is
    /// an empty stand-in that must not be cached.
    async fn fetch_lyrics(&self, id: TrackId) -> (LyricDocument, bool) {
        let merge = self.cfg.lyrics.merge_translation;

        if let Some(storage) = self.storage.clone()
            && let Ok(Ok(Some(payload))) =
                tokio::task::spawn_blocking(move || storage.get_lyrics(id)).await
        {
            return (LyricDocument::from_payload(&payload, merge), true);
        }

        match self.resolver.lyrics(id).await {
            Ok(payload) => {
                if let Some(storage) = self.storage.clone() {
                    let cached = payload.clone();
                    let now = storage::now_unix();
                    let res =
                        tokio::task::spawn_blocking(move || storage.cache_lyrics(id, &cached, now))
                            .await;
                    if let Ok(Err(e)) = res {
                        tracing::debug!(track_id = id, "lyrics cache write failed: {e:#}");
                    }
                }
                (LyricDocument::from_payload(&payload, merge), true)
            }
            Err(e) => {
                tracing::warn!(track_id = id, "lyrics unavailable: {e:#}");
                (
                    LyricDocument::from_payload(&LyricPayload::default(), false),
                    false,
                )
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            queue: self.queue.snapshot(),
            now_playing: self.now_playing.clone(),
            lyrics: Some(self.lyrics.clone()),
            saved_at: storage::now_unix(),
        }
    }

    async fn persist(&self) {
        let Some(storage) = self.storage.clone() else {
            return;
        };
        let raw = match serde_json::to_string(&self.snapshot()) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("serialize session: {e}");
                return;
            }
        };
        let now = storage::now_unix();
        match tokio::task::spawn_blocking(move || storage.put(SESSION_KEY, &raw, now)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("save session: {e:#}"),
            Err(e) => tracing::warn!("save session task: {e}"),
        }
    }
}

pub async fn load_snapshot(storage: &StorageHandle) -> Option<SessionSnapshot> {
    let storage = storage.clone();
    let raw = match tokio::task::spawn_blocking(move || storage.get(SESSION_KEY)).await {
        Ok(Ok(raw)) => raw?,
        Ok(Err(e)) => {
            tracing::warn!("load session: {e:#}");
            return None;
        }
        Err(e) => {
            tracing::warn!("load session task: {e}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!("discarding unreadable session snapshot: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ncm::models::{AudioSource, RecommendationEntry};
    use crate::queue::QueueKind;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeResolver {
        urls: HashMap<TrackId, Option<String>>,
        lyrics: HashMap<TrackId, String>,
        failing: Vec<TrackId>,
        delays: HashMap<TrackId, Duration>,
        recommendations: Vec<RecommendationEntry>,
        lyric_calls: Mutex<usize>,
        /// Number of leading `lyrics` calls that time out.
        lyric_timeouts: usize,
        recommendation_calls: Mutex<usize>,
        recommendation_seeds: Mutex<Vec<TrackId>>,
        scrobbles: Mutex<Vec<(TrackId, Option<u64>)>>,
        scrobble_down: bool,
    }

    impl TrackResolver for FakeResolver {
        async fn lyrics(&self, id: TrackId) -> anyhow::Result<LyricPayload> {
            let call = {
                let mut calls = self.lyric_calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if call <= self.lyric_timeouts {
                anyhow::bail!("lyrics for {id} timed out");
            }
            match self.lyrics.get(&id) {
                Some(raw) => Ok(LyricPayload {
                    primary: raw.clone(),
                    translation: None,
                }),
                None => anyhow::bail!("no lyrics for {id}"),
            }
        }

        async fn audio_url(&self, id: TrackId) -> anyhow::Result<AudioSource> {
            if let Some(d) = self.delays.get(&id) {
                tokio::time::sleep(*d).await;
            }
            if self.failing.contains(&id) {
                anyhow::bail!("http 502 for {id}");
            }
            Ok(AudioSource {
                url: self.urls.get(&id).cloned().unwrap_or(Some(format!("https://cdn/{id}.flac"))),
            })
        }

        async fn track_detail(&self, id: TrackId) -> anyhow::Result<Option<Track>> {
            let mut t = track(id);
            t.album = Some("Detailed".to_string());
            Ok(Some(t))
        }

        async fn recommendation_queue(
            &self,
            _queue_id: u64,
            current: TrackId,
        ) -> anyhow::Result<Vec<RecommendationEntry>> {
            *self.recommendation_calls.lock().unwrap() += 1;
            self.recommendation_seeds.lock().unwrap().push(current);
            Ok(self.recommendations.clone())
        }

        async fn scrobble(&self, id: TrackId, source_id: Option<u64>) -> anyhow::Result<()> {
            self.scrobbles.lock().unwrap().push((id, source_id));
            if self.scrobble_down {
                anyhow::bail!("scrobble rejected");
            }
            Ok(())
        }
    }

    fn track(id: TrackId) -> Track {
        Track {
            id,
            name: format!("Song {id}"),
            artists: vec!["Artist".to_string()],
            album: None,
            duration_ms: Some(200_000),
        }
    }

    fn runtime(kind: QueueKind, ids: &[TrackId]) -> (RuntimeQueue, Vec<TrackId>) {
        (
            RuntimeQueue {
                id: 500,
                name: "queue".to_string(),
                kind,
                tracks: ids.iter().copied().map(track).collect(),
            },
            ids.to_vec(),
        )
    }

    async fn session_with(resolver: FakeResolver, ids: &[TrackId]) -> Session<FakeResolver> {
        let mut s = Session::new(Config::default(), resolver, None);
        let (q, ids) = runtime(QueueKind::Regular, ids);
        s.set_runtime_queue(q, ids).await;
        s
    }

    #[tokio::test]
    async fn test_play_index_resolves_track_and_lyrics() {
        let mut resolver = FakeResolver::default();
        resolver
            .lyrics
            .insert(2, "[00:01.00]one\n[00:04.00]two".to_string());
        let mut s = session_with(resolver, &[1, 2, 3]).await;

        let outcome = s.play_index(1).await;
        let PlaybackOutcome::Playing(np) = outcome else {
            panic!("expected Playing, got {outcome:?}");
        };
        assert_eq!(np.track.id, 2);
        assert_eq!(np.track.album.as_deref(), Some("Detailed"));
        assert_eq!(np.url, "https://cdn/2.flac");
        assert_eq!(s.lyrics().lines.len(), 2);
        assert_eq!(s.queue().current_index(), 1);
        assert_eq!(s.queue().current_track().map(|t| t.id), Some(2));
    }

    #[tokio::test]
    async fn test_missing_url_is_unavailable_and_keeps_state() {
        let mut resolver = FakeResolver::default();
        resolver.urls.insert(2, None);
        let mut s = session_with(resolver, &[1, 2]).await;

        assert!(matches!(s.play_index(0).await, PlaybackOutcome::Playing(_)));
        assert_eq!(
            s.play_index(1).await,
            PlaybackOutcome::Unavailable { track_id: 2 }
        );
        assert_eq!(s.now_playing().map(|n| n.track.id), Some(1));
    }

    #[tokio::test]
    async fn test_resolver_failure_keeps_previous_playback() {
        let resolver = FakeResolver {
            failing: vec![3],
            ..Default::default()
        };
        let mut s = session_with(resolver, &[1, 2, 3]).await;

        assert!(matches!(s.play_index(0).await, PlaybackOutcome::Playing(_)));
        let outcome = s.play_index(2).await;
        assert!(matches!(outcome, PlaybackOutcome::Failed(ref m) if m.contains("502")));
        assert_eq!(s.now_playing().map(|n| n.track.id), Some(1));
        assert_eq!(s.queue().current_track().map(|t| t.id), Some(1));
    }

    #[tokio::test]
    async fn test_lyrics_failure_does_not_block_playback() {
        let mut s = session_with(FakeResolver::default(), &[1]).await;
        assert!(matches!(s.play_index(0).await, PlaybackOutcome::Playing(_)));
        assert!(s.lyrics().is_empty());
        assert!(s.lyrics().no_timestamp);
    }

    #[tokio::test]
    async fn test_slow_earlier_response_is_discarded() {
        let mut resolver = FakeResolver::default();
        resolver.delays.insert(1, Duration::from_millis(30));
        let mut s = session_with(resolver, &[1, 2]).await;

        let first = s.begin_resolve(0).unwrap();
        let second = s.begin_resolve(1).unwrap();
        let (r1, r2) = tokio::join!(s.resolve(first), s.resolve(second));

        assert!(matches!(s.apply(r2).await, PlaybackOutcome::Playing(_)));
        assert_eq!(s.apply(r1).await, PlaybackOutcome::Stale);
        assert_eq!(s.now_playing().map(|n| n.track.id), Some(2));
    }

    #[tokio::test]
    async fn test_track_end_advances_with_wraparound() {
        let mut s = session_with(FakeResolver::default(), &[1, 2]).await;
        s.play_index(1).await;
        let outcome = s.on_track_ended().await;
        assert!(matches!(outcome, PlaybackOutcome::Playing(ref n) if n.track.id == 1));
        assert_eq!(s.queue().history().len(), 2);
    }

    #[tokio::test]
    async fn test_repeat_one_replays_same_track() {
        let mut s = session_with(FakeResolver::default(), &[1, 2]).await;
        s.set_play_mode(PlayMode::RepeatOne);
        s.play_index(0).await;
        let outcome = s.on_track_ended().await;
        assert!(matches!(outcome, PlaybackOutcome::Playing(ref n) if n.track.id == 1));
    }

    #[tokio::test]
    async fn test_advance_on_empty_queue_is_idle() {
        let mut s = Session::new(Config::default(), FakeResolver::default(), None);
        assert_eq!(s.advance(true).await, PlaybackOutcome::Idle);
        assert_eq!(s.on_track_ended().await, PlaybackOutcome::Idle);
        assert_eq!(s.play_index(3).await, PlaybackOutcome::Idle);
    }

    #[tokio::test]
    async fn test_lyrics_are_cached_between_plays() {
        let mut resolver = FakeResolver::default();
        resolver.lyrics.insert(1, "[00:01.00]a\n[00:02.00]b".to_string());
        let mut s = session_with(resolver, &[1, 2]).await;

        s.play_index(0).await;
        s.play_index(1).await;
        s.play_index(0).await;
        assert_eq!(s.lyrics().lines.len(), 2);
        assert_eq!(*s.resolver.lyric_calls.lock().unwrap(), 2);

        // Track 2's fetch failed, so it is asked for again.
        s.play_index(1).await;
        assert_eq!(*s.resolver.lyric_calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_lyrics_refetched_after_transient_failure() {
        let mut resolver = FakeResolver {
            lyric_timeouts: 1,
            ..Default::default()
        };
        resolver.lyrics.insert(1, "[00:01.00]a\n[00:02.00]b".to_string());
        resolver.lyrics.insert(2, "[00:01.00]c".to_string());
        let mut s = session_with(resolver, &[1, 2]).await;

        assert!(matches!(s.play_index(0).await, PlaybackOutcome::Playing(_)));
        assert!(s.lyrics().is_empty());
        s.play_index(1).await;
        s.play_index(0).await;
        assert_eq!(s.lyrics().lines.len(), 2);
        assert_eq!(*s.resolver.lyric_calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_track_start_is_scrobbled_with_source_list() {
        let mut s = session_with(FakeResolver::default(), &[1, 2]).await;
        s.play_index(1).await;
        s.on_track_ended().await;
        assert_eq!(
            *s.resolver.scrobbles.lock().unwrap(),
            vec![(2, Some(500)), (1, Some(500))]
        );
    }

    #[tokio::test]
    async fn test_scrobble_failure_does_not_block_playback() {
        let resolver = FakeResolver {
            scrobble_down: true,
            ..Default::default()
        };
        let mut s = session_with(resolver, &[1]).await;
        assert!(matches!(s.play_index(0).await, PlaybackOutcome::Playing(_)));
        assert_eq!(s.now_playing().map(|n| n.track.id), Some(1));
    }

    #[tokio::test]
    async fn test_unavailable_track_is_not_scrobbled() {
        let mut resolver = FakeResolver::default();
        resolver.urls.insert(1, None);
        let mut s = session_with(resolver, &[1]).await;
        s.play_index(0).await;
        assert!(s.resolver.scrobbles.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_smart_mode_on_liked_queue_pulls_recommendations() {
        let resolver = FakeResolver {
            recommendations: vec![
                RecommendationEntry {
                    song_info: Some(track(10)),
                },
                RecommendationEntry { song_info: None },
                RecommendationEntry {
                    song_info: Some(track(11)),
                },
            ],
            ..Default::default()
        };
        let mut s = Session::new(Config::default(), resolver, None);
        s.set_play_mode(PlayMode::Smart);
        let (q, ids) = runtime(QueueKind::Liked, &[1, 2, 3]);
        s.set_runtime_queue(q, ids).await;

        assert_eq!(s.queue().play_mode(), PlayMode::Smart);
        assert_eq!(s.queue().track_ids(), &[10, 11]);
        assert_eq!(s.queue().track_at(1).map(|t| t.id), Some(11));
    }

    #[tokio::test]
    async fn test_start_queue_plays_first_id_before_smart_refresh() {
        let resolver = FakeResolver {
            recommendations: vec![
                RecommendationEntry {
                    song_info: Some(track(10)),
                },
                RecommendationEntry {
                    song_info: Some(track(11)),
                },
            ],
            ..Default::default()
        };
        let mut s = Session::new(Config::default(), resolver, None);
        s.set_play_mode(PlayMode::Smart);
        // A track left over from an earlier session must not seed the refresh.
        s.queue.set_current_track(track(99));
        let (q, ids) = runtime(QueueKind::Liked, &[1, 2, 3]);

        let outcome = s.start_queue(q, ids, 0).await;
        assert!(matches!(outcome, PlaybackOutcome::Playing(ref n) if n.track.id == 1));
        assert_eq!(*s.resolver.recommendation_seeds.lock().unwrap(), vec![1]);
        assert_eq!(s.queue().track_ids(), &[10, 11]);
        assert_eq!(s.now_playing().map(|n| n.track.id), Some(1));
    }

    #[tokio::test]
    async fn test_smart_mode_on_regular_queue_falls_back() {
        let mut s = Session::new(Config::default(), FakeResolver::default(), None);
        s.set_play_mode(PlayMode::Smart);
        let (q, ids) = runtime(QueueKind::Regular, &[1, 2]);
        s.set_runtime_queue(q, ids).await;

        assert_eq!(s.queue().play_mode(), PlayMode::RepeatList);
        assert_eq!(*s.resolver.recommendation_calls.lock().unwrap(), 0);
        assert_eq!(s.queue().track_ids(), &[1, 2]);
    }

    #[tokio::test]
    async fn test_snapshot_survives_restart() {
        let path = std::env::temp_dir()
            .join(format!("tonearm-session-{}", std::process::id()))
            .join("state.sqlite3");
        let handle = StorageHandle::new(path.clone());

        let mut resolver = FakeResolver::default();
        resolver.lyrics.insert(2, "[00:01.00]a\n[00:02.00]b".to_string());
        let mut s = Session::new(Config::default(), resolver, Some(handle.clone()));
        let (q, ids) = runtime(QueueKind::Regular, &[1, 2, 3]);
        s.set_runtime_queue(q, ids).await;
        s.set_play_mode(PlayMode::Shuffle);
        s.play_index(1).await;

        let restored = Session::restore(Config::default(), FakeResolver::default(), handle).await;
        assert_eq!(restored.queue().current_index(), 1);
        assert_eq!(restored.queue().play_mode(), PlayMode::Shuffle);
        assert_eq!(restored.now_playing().map(|n| n.track.id), Some(2));
        assert_eq!(restored.lyrics().lines.len(), 2);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
