use super::models::wire::{
    DetailResponse, IntelligenceResponse, LyricResponse, Status, UrlResponse,
};
use super::models::{AudioSource, LyricPayload, RecommendationEntry, Track, TrackId};
use super::resolve::TrackResolver;
use crate::config::ApiConfig;
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    base_url: String,
    cookie: Option<String>,
}

/// HTTP client for a NeteaseCloudMusicApi-compatible server.
#[derive(Debug, Clone)]
pub struct NcmClient {
    inner: Arc<Inner>,
}

impl NcmClient {
    const USER_AGENT: &'static str = "tonearm/0.1.0";

    pub fn new(cfg: &ApiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: cfg.base_url.trim_end_matches('/').to_string(),
                cookie: cfg.cookie.clone().filter(|c| !c.is_empty()),
            }),
        })
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}{}?", self.inner.base_url, path);
        for (k, v) in params {
            url.push_str(&format!("{}={}&", k, urlencoding::encode(v)));
        }
        if let Some(cookie) = &self.inner.cookie {
            let value = format!("MUSIC_U={cookie};");
            url.push_str(&format!("cookie={}&", urlencoding::encode(&value)));
        }
        // The server caches identical URLs for two minutes.
        url.push_str(&format!("timestamp={}", unix_millis()));
        url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> anyhow::Result<T> {
        let url = self.url(path, params);
        tracing::debug!(%path, "api request");
        self.send(path, self.inner.http.get(&url)).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> anyhow::Result<T> {
        let url = self.url(path, &[]);
        tracing::debug!(%path, "api post");
        self.send(path, self.inner.http.post(&url).json(body)).await
    }

    /// Send a request and check the `code` envelope before decoding.
    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> anyhow::Result<T> {
        let response = request
            .send()
            .await
            .with_context(|| format!("send {path}"))?;
        let http_status = response.status();
        let v: serde_json::Value = response
            .json()
            .await
            .with_context(|| format!("parse {path} json"))?;

        let status: Status =
            serde_json::from_value(v.clone()).with_context(|| format!("{path} status"))?;
        if !http_status.is_success() || !status.is_ok() {
            anyhow::bail!("{path} failed ({http_status}): {}", status.describe());
        }

        serde_json::from_value(v).with_context(|| format!("decode {path}"))
    }
}

impl TrackResolver for NcmClient {
    async fn lyrics(&self, id: TrackId) -> anyhow::Result<LyricPayload> {
        let r: LyricResponse = self.get("/lyric/new", &[("id", id.to_string())]).await?;
        Ok(r.into())
    }

    async fn audio_url(&self, id: TrackId) -> anyhow::Result<AudioSource> {
        let r: UrlResponse = self
            .get(
                "/song/url/v1",
                &[("id", id.to_string()), ("level", "lossless".to_string())],
            )
            .await?;
        Ok(r.into())
    }

    async fn track_detail(&self, id: TrackId) -> anyhow::Result<Option<Track>> {
        let r: DetailResponse = self.get("/song/detail", &[("ids", id.to_string())]).await?;
        Ok(r.songs.into_iter().next().map(Track::from))
    }

    async fn recommendation_queue(
        &self,
        queue_id: u64,
        current: TrackId,
    ) -> anyhow::Result<Vec<RecommendationEntry>> {
        let r: IntelligenceResponse = self
            .get(
                "/playmode/intelligence/list",
                &[
                    ("pid", queue_id.to_string()),
                    ("id", current.to_string()),
                    ("sid", current.to_string()),
                ],
            )
            .await?;
        Ok(r.data.into_iter().map(Into::into).collect())
    }

    async fn scrobble(&self, id: TrackId, source_id: Option<u64>) -> anyhow::Result<()> {
        let body = scrobble_body(id, source_id);
        let _: Status = self.post("/scrobble", &body).await?;
        Ok(())
    }
}

fn scrobble_body(id: TrackId, source_id: Option<u64>) -> serde_json::Value {
    match source_id {
        Some(sid) => serde_json::json!({ "id": id, "sourceid": sid }),
        None => serde_json::json!({ "id": id }),
    }
}

fn unix_millis() -> i128 {
    time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}
