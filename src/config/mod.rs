use crate::queue::PlayMode;
use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub paths: PathsConfig,
    pub lyrics: LyricsConfig,
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of a NeteaseCloudMusicApi-compatible server.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// `MUSIC_U` login token, sent as the `cookie` query parameter.
    pub cookie: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsConfig {
    /// How long auto-scroll stays suspended after a manual scroll.
    pub scroll_hold_secs: f64,
    /// Height of the top/bottom spacers as a fraction of the viewport.
    pub spacer_ratio: f32,
    /// Sync loop period.
    pub frame_interval_ms: u64,
    /// Attach translated lines to the primary lyric when available.
    pub merge_translation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub play_mode: PlayMode,
    pub history_capacity: usize,
    /// Parsed lyric documents kept in memory.
    pub lyric_cache_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 30,
            cookie: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from("dev", "tonearm", "tonearm");
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("tonearm"));
        Self { data_dir }
    }
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            scroll_hold_secs: 3.0,
            spacer_ratio: 0.45,
            frame_interval_ms: 16,
            merge_translation: true,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            play_mode: PlayMode::Smart,
            history_capacity: crate::queue::HISTORY_CAPACITY,
            lyric_cache_size: 32,
        }
    }
}

impl PathsConfig {
    pub fn database(&self) -> PathBuf {
        self.data_dir.join("state.sqlite3")
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj =
        ProjectDirs::from("dev", "tonearm", "tonearm").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        write_config(&cfg, &path)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

fn write_config(cfg: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    // The api cookie is a login token.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}
