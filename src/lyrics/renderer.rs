//! Render target seam for the lyric player.

/// One row in the rendered-line cache.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLine {
    pub index: usize,
    /// Start time in seconds.
    pub time: f64,
    /// Display text; empty lyric lines show as "...".
    pub text: String,
    pub translation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLyrics {
    pub lines: Vec<RenderedLine>,
    /// Lines are static text; no highlight will follow.
    pub untimed: bool,
    /// Top/bottom spacer height as a fraction of the viewport, so the first
    /// and last lines can sit in the middle.
    pub spacer_ratio: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Eased scroll for line-to-line progress.
    Smooth,
    /// Jump straight there (initial layout, seeks).
    Immediate,
}

/// What the lyric player needs from a view.
pub trait LyricRenderer {
    fn render(&mut self, lyrics: &RenderedLyrics);

    /// Placeholder for a track without lyrics.
    fn render_empty(&mut self);

    fn highlight(&mut self, previous: Option<usize>, current: usize);

    /// Bring `index` to the vertical center.
    fn scroll_to(&mut self, index: usize, mode: ScrollMode);

    /// Drop everything drawn so far.
    fn clear(&mut self);
}
