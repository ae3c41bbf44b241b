//! Lyrics: parsing, translation merge, and time-synchronized display.
//!
//! This module provides:
//! - LRC parser producing time-indexed lines
//! - Lyric player that tracks the active line against a playback clock
//! - Renderer and clock seams so the player runs headless

pub mod clock;
pub mod parser;
pub mod player;
pub mod renderer;

pub use clock::{PlaybackClock, WallClock};
pub use parser::{ParseResult, format_time, merge_translation, parse_lrc};
pub use player::{LyricPlayer, LyricPlayerOptions};
pub use renderer::{LyricRenderer, RenderedLine, RenderedLyrics, ScrollMode};

use crate::ncm::models::LyricPayload;

/// Lyrics ready for display, built from an API payload.
pub type LyricDocument = ParseResult;

impl ParseResult {
    /// Parse the primary text and, when asked, attach the translation.
    ///
    /// A lone line is the API's "instrumental, enjoy" placeholder and is
    /// treated as no lyrics at all.
    pub fn from_payload(payload: &LyricPayload, merge: bool) -> Self {
        let mut doc = parse_lrc(&payload.primary);
        if merge && let Some(translation) = payload.translation.as_deref() {
            doc = merge_translation(doc, translation);
        }
        if doc.lines.len() == 1 {
            doc.lines.clear();
        }
        doc
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_from_payload_merges_translation() {
        let payload = LyricPayload {
            primary: "[00:01.00]hello\n[00:03.00]world".to_string(),
            translation: Some("[00:01.00]bonjour".to_string()),
        };
        let doc = LyricDocument::from_payload(&payload, true);
        assert_eq!(doc.lines[0].translation.as_deref(), Some("bonjour"));

        let doc = LyricDocument::from_payload(&payload, false);
        assert!(doc.lines[0].translation.is_none());
    }

    #[test]
    fn test_single_line_document_is_empty() {
        let payload = LyricPayload {
            primary: "[00:00.00]Instrumental, please enjoy".to_string(),
            translation: None,
        };
        assert!(LyricDocument::from_payload(&payload, true).is_empty());
    }
}
