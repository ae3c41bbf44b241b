//! Typed shapes for the music API.
//!
//! The `wire` structs mirror the JSON the server sends and are only used at
//! the boundary. Everything past `ncm` works with the narrowed core types.

use serde::{Deserialize, Serialize};

pub type TrackId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub duration_ms: Option<u64>,
}

impl Track {
    /// "Name - Artist, Artist" for list rows and log lines.
    pub fn display_name(&self) -> String {
        if self.artists.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.name, self.artists.join(", "))
        }
    }
}

/// Raw lyric texts for one track. Either side may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LyricPayload {
    pub primary: String,
    pub translation: Option<String>,
}

/// Playable source for a track; `url` is `None` when the track is unavailable
/// (region lock, no copyright, VIP only).
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSource {
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationEntry {
    pub song_info: Option<Track>,
}

pub mod wire {
    use super::{AudioSource, LyricPayload, RecommendationEntry, Track};
    use serde::Deserialize;

    /// Fields shared by every response envelope.
    #[derive(Debug, Deserialize)]
    pub struct Status {
        pub code: i64,
        #[serde(default)]
        pub message: Option<String>,
        #[serde(default)]
        pub msg: Option<String>,
    }

    impl Status {
        pub fn is_ok(&self) -> bool {
            self.code == 200
        }

        pub fn describe(&self) -> String {
            self.message
                .clone()
                .or_else(|| self.msg.clone())
                .unwrap_or_else(|| format!("api returned code {}", self.code))
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct LyricBlock {
        #[serde(default)]
        pub lyric: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct LyricResponse {
        #[serde(default)]
        pub lrc: Option<LyricBlock>,
        #[serde(default)]
        pub tlyric: Option<LyricBlock>,
    }

    impl From<LyricResponse> for LyricPayload {
        fn from(r: LyricResponse) -> Self {
            let primary = r.lrc.map(|b| b.lyric).unwrap_or_default();
            let translation = r
                .tlyric
                .map(|b| b.lyric)
                .filter(|t| !t.trim().is_empty());
            Self {
                primary,
                translation,
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct UrlEntry {
        #[serde(default)]
        pub url: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct UrlResponse {
        #[serde(default)]
        pub data: Vec<UrlEntry>,
    }

    impl From<UrlResponse> for AudioSource {
        fn from(r: UrlResponse) -> Self {
            let url = r
                .data
                .into_iter()
                .next()
                .and_then(|e| e.url)
                .filter(|u| !u.is_empty());
            Self { url }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct ArtistRef {
        #[serde(default)]
        pub name: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct AlbumRef {
        #[serde(default)]
        pub name: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct SongDetail {
        pub id: u64,
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub ar: Vec<ArtistRef>,
        #[serde(default)]
        pub al: Option<AlbumRef>,
        #[serde(default)]
        pub dt: Option<u64>,
    }

    impl From<SongDetail> for Track {
        fn from(s: SongDetail) -> Self {
            Self {
                id: s.id,
                name: s.name,
                artists: s.ar.into_iter().filter_map(|a| a.name).collect(),
                album: s.al.and_then(|a| a.name).filter(|n| !n.is_empty()),
                duration_ms: s.dt,
            }
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct DetailResponse {
        #[serde(default)]
        pub songs: Vec<SongDetail>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct IntelligenceEntry {
        #[serde(default)]
        pub song_info: Option<SongDetail>,
    }

    #[derive(Debug, Deserialize)]
    pub struct IntelligenceResponse {
        #[serde(default)]
        pub data: Vec<IntelligenceEntry>,
    }

    impl From<IntelligenceEntry> for RecommendationEntry {
        fn from(e: IntelligenceEntry) -> Self {
            Self {
                song_info: e.song_info.map(Track::from),
            }
        }
    }
}
