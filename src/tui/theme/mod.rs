//! Theme configuration - Monochrome grayscale

pub mod palette;

pub use palette::Palette;
use ratatui::symbols::border;

#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub palette: Palette,
}

impl Theme {
    /// Rounded corners on every panel.
    pub fn border_set(&self) -> border::Set<'static> {
        border::ROUNDED
    }
}

pub fn get_theme() -> Theme {
    Theme::default()
}
