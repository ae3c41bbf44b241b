use crate::app::actions::Action;
use crate::app::events::{Event, InputEvent};
use crossterm::event::{
    self, Event as CtEvent, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use tokio::sync::mpsc;

/// Seconds moved by the arrow keys.
pub const SEEK_STEP_SECS: f64 = 5.0;

/// Rows moved per wheel notch.
const WHEEL_ROWS: i32 = 3;

pub fn spawn_input_task(tx: mpsc::Sender<Event>) {
    tokio::task::spawn_blocking(move || {
        loop {
            if event::poll(std::time::Duration::from_millis(250)).unwrap_or(false) {
                let ev = match event::read() {
                    Ok(CtEvent::Key(k)) if k.kind == KeyEventKind::Press => InputEvent::Key(k),
                    Ok(CtEvent::Mouse(m)) => InputEvent::Mouse(m),
                    Ok(CtEvent::Resize(_, _)) => InputEvent::Resize,
                    Ok(_) | Err(_) => continue,
                };
                if tx.blocking_send(Event::Input(ev)).is_err() {
                    break;
                }
            } else if tx.is_closed() {
                break;
            }
        }
    });
}

pub fn map_input_to_action(ev: InputEvent) -> Option<Action> {
    match ev {
        InputEvent::Resize => Some(Action::Resize),
        InputEvent::Mouse(m) => match m.kind {
            MouseEventKind::ScrollUp => Some(Action::Scroll(-WHEEL_ROWS)),
            MouseEventKind::ScrollDown => Some(Action::Scroll(WHEEL_ROWS)),
            MouseEventKind::Down(MouseButton::Left) => Some(Action::Click {
                column: m.column,
                row: m.row,
            }),
            _ => None,
        },
        InputEvent::Key(k) => match k.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Char(' ') => Some(Action::TogglePause),
            KeyCode::Left | KeyCode::Char('h') => Some(Action::SeekBy(-SEEK_STEP_SECS)),
            KeyCode::Right | KeyCode::Char('l') => Some(Action::SeekBy(SEEK_STEP_SECS)),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::Scroll(-1)),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::Scroll(1)),
            _ => None,
        },
    }
}
