#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    TogglePause,
    /// Relative seek in seconds.
    SeekBy(f64),
    /// Manual scroll by rows; negative is up.
    Scroll(i32),
    /// Mouse press at terminal coordinates.
    Click { column: u16, row: u16 },
    Resize,
}
