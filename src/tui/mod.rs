use crate::lyrics::format_time;
use anyhow::Context;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use std::io::{self, Stdout};

pub mod lyric_view;
pub mod plain;
pub mod theme;

pub use lyric_view::LyricView;
pub use plain::PlainRenderer;

pub type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

pub struct TerminalGuard {
    terminal: TuiTerminal,
}

impl TerminalGuard {
    pub fn enter() -> anyhow::Result<Self> {
        enable_raw_mode().context("enable raw mode")?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("enter alt screen + mouse capture")?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("create terminal")?;

        Ok(Self { terminal })
    }

    pub fn terminal_mut(&mut self) -> &mut TuiTerminal {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best-effort cleanup; don't panic in Drop.
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, DisableMouseCapture);
    }
}

/// Bottom bar of the follow view.
#[derive(Debug, Clone, Default)]
pub struct FollowStatus {
    pub title: String,
    pub position: f64,
    pub paused: bool,
    pub line: Option<usize>,
    pub total: usize,
}

pub fn draw_follow(
    terminal: &mut TuiTerminal,
    view: &mut LyricView,
    status: &FollowStatus,
) -> anyhow::Result<()> {
    terminal
        .draw(|f| render_follow(f, view, status))
        .context("terminal draw")?;
    Ok(())
}

fn render_follow(frame: &mut Frame, view: &mut LyricView, status: &FollowStatus) {
    let theme = theme::get_theme();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    view.draw(frame, rows[0], &status.title);

    let state = if status.paused { "paused " } else { "playing" };
    let line = match status.line {
        Some(i) => format!("line {}/{}", i + 1, status.total),
        None => format!("{} lines", status.total),
    };
    let bar = Line::from(vec![
        Span::styled(
            format!(" {state}  {}  ", format_time(status.position)),
            Style::default().fg(theme.palette.fg_primary),
        ),
        Span::styled(line, Style::default().fg(theme.palette.fg_secondary)),
        Span::styled(
            "   space pause  ←/→ seek  wheel scroll  click jump  q quit",
            Style::default().fg(theme.palette.fg_secondary),
        ),
    ]);
    frame.render_widget(Paragraph::new(bar), rows[1]);
}
