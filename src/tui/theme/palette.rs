//! Color palette - Monochrome grayscale

use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    /// Active lyric line and untimed text.
    pub fg_primary: Color,
    /// Inactive lines, translations, status bar.
    pub fg_secondary: Color,
    pub accent: Color,
    pub border: Color,
}

impl Palette {
    pub const MONO: Self = Self {
        fg_primary: Color::Rgb(255, 255, 255),   // #ffffff white
        fg_secondary: Color::Rgb(136, 136, 136), // #888888 medium gray
        accent: Color::Rgb(200, 200, 200),       // #c8c8c8 light gray
        border: Color::Rgb(64, 64, 64),          // #404040 dark gray
    };
}

impl Default for Palette {
    fn default() -> Self {
        Self::MONO
    }
}
