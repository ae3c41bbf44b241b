#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    Lyric(LyricEvent),
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(crossterm::event::KeyEvent),
    Mouse(crossterm::event::MouseEvent),
    Resize,
}

/// Raised by the lyric player's callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum LyricEvent {
    LineChanged(usize),
    LineClicked { time: f64, index: usize },
}
