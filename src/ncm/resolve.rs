use super::models::{AudioSource, LyricPayload, RecommendationEntry, Track, TrackId};

/// Everything the playback core needs from the outside world about a track.
///
/// `NcmClient` is the HTTP implementation; tests plug in an in-memory fake.
#[allow(async_fn_in_trait)]
pub trait TrackResolver {
    async fn lyrics(&self, id: TrackId) -> anyhow::Result<LyricPayload>;

    async fn audio_url(&self, id: TrackId) -> anyhow::Result<AudioSource>;

    async fn track_detail(&self, id: TrackId) -> anyhow::Result<Option<Track>>;

    /// Smart-mode continuation for `queue_id`, seeded by the playing track.
    async fn recommendation_queue(
        &self,
        queue_id: u64,
        current: TrackId,
    ) -> anyhow::Result<Vec<RecommendationEntry>>;

    /// Report that `id` started playing from the list `source_id`.
    async fn scrobble(&self, id: TrackId, source_id: Option<u64>) -> anyhow::Result<()>;
}
