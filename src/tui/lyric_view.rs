//! Scrolling lyric panel for the terminal.
//!
//! Rows are laid out as: top spacer, one row per lyric line plus one per
//! translation, bottom spacer. Spacers let the first and last lines reach
//! the middle of the panel.

use crate::lyrics::{LyricRenderer, RenderedLine, RenderedLyrics, ScrollMode};
use crate::tui::theme::get_theme;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

/// Fraction of the remaining distance covered per frame.
const EASING: f32 = 0.25;

#[derive(Debug, Clone, Copy)]
struct Row {
    line: usize,
}

#[derive(Debug, Default)]
pub struct LyricView {
    lines: Vec<RenderedLine>,
    untimed: bool,
    empty: bool,
    spacer_ratio: f32,
    current: Option<usize>,
    /// Line the viewport follows; `None` while the user scrolls freely.
    focus: Option<usize>,
    snap: bool,
    /// Top row of the viewport, fractional while easing.
    offset: f32,
    /// Inner area from the last draw.
    area: Rect,
}

impl LyricView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> u16 {
        self.offset.round().max(0.0) as u16
    }

    /// Advance the scroll animation one frame. Returns whether it is still moving.
    pub fn tick(&mut self) -> bool {
        let Some(target) = self.focus.and_then(|i| self.target_offset(i)) else {
            return false;
        };
        let distance = target - self.offset;
        if self.snap || distance.abs() < 0.5 {
            self.offset = target;
            self.snap = false;
            return false;
        }
        self.offset += distance * EASING;
        true
    }

    /// Free scroll by `rows`; detaches the viewport from the active line.
    pub fn scroll_by(&mut self, rows: i32) {
        self.focus = None;
        self.snap = false;
        self.offset = (self.offset.round() + rows as f32).clamp(0.0, self.max_offset());
    }

    /// Lyric line under a terminal cell, if any.
    pub fn line_at(&self, column: u16, row: u16) -> Option<usize> {
        let a = self.area;
        if column < a.x || column >= a.x + a.width || row < a.y || row >= a.y + a.height {
            return None;
        }
        let content_row = (self.offset() + (row - a.y)) as usize;
        let row = content_row.checked_sub(self.spacer())?;
        let rows = self.rows();
        rows.get(row).and_then(|r| self.lines.get(r.line)).map(|l| l.index)
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect, title: &str) {
        let theme = get_theme();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_set(theme.border_set())
            .border_style(Style::default().fg(theme.palette.border))
            .title(format!(" {title} "))
            .title_style(Style::default().fg(theme.palette.accent));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.area = inner;

        if self.empty {
            let pad = inner.height.saturating_sub(1) / 2;
            let mut text: Vec<Line> = (0..pad).map(|_| Line::default()).collect();
            text.push(Line::from(Span::styled(
                "No lyrics",
                Style::default().fg(theme.palette.fg_secondary),
            )));
            frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
            return;
        }

        let spacer = self.spacer();
        let mut text: Vec<Line> = (0..spacer).map(|_| Line::default()).collect();
        for line in &self.lines {
            let active = !self.untimed && self.current == Some(line.index);
            let style = if self.untimed || active {
                Style::default().fg(theme.palette.fg_primary)
            } else {
                Style::default().fg(theme.palette.fg_secondary)
            };
            let style = if active {
                style.add_modifier(Modifier::BOLD)
            } else {
                style
            };
            text.push(Line::from(Span::styled(line.text.clone(), style)));
            if let Some(tr) = &line.translation {
                text.push(Line::from(Span::styled(
                    tr.clone(),
                    style.add_modifier(Modifier::ITALIC),
                )));
            }
        }
        text.extend((0..spacer).map(|_| Line::default()));

        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .scroll((self.offset(), 0));
        frame.render_widget(paragraph, inner);
    }

    fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::with_capacity(self.lines.len());
        for (i, line) in self.lines.iter().enumerate() {
            rows.push(Row { line: i });
            if line.translation.is_some() {
                rows.push(Row { line: i });
            }
        }
        rows
    }

    fn spacer(&self) -> usize {
        (self.area.height as f32 * self.spacer_ratio).round() as usize
    }

    fn max_offset(&self) -> f32 {
        let total = self.rows().len() + 2 * self.spacer();
        total.saturating_sub(self.area.height as usize) as f32
    }

    /// Offset that puts the middle of line `index` at the middle of the panel.
    fn target_offset(&self, index: usize) -> Option<f32> {
        let pos = self.lines.iter().position(|l| l.index == index)?;
        let top = self.rows().iter().position(|r| r.line == pos)?;
        let height = if self.lines[pos].translation.is_some() { 2.0 } else { 1.0 };
        let center = (self.spacer() + top) as f32 + height / 2.0;
        Some((center - self.area.height as f32 / 2.0).clamp(0.0, self.max_offset()))
    }
}

impl LyricRenderer for LyricView {
    fn render(&mut self, lyrics: &RenderedLyrics) {
        self.lines = lyrics.lines.clone();
        self.untimed = lyrics.untimed;
        self.spacer_ratio = lyrics.spacer_ratio;
        self.empty = false;
        self.current = None;
        self.focus = None;
        self.offset = 0.0;
    }

    fn render_empty(&mut self) {
        self.lines.clear();
        self.empty = true;
        self.current = None;
        self.focus = None;
        self.offset = 0.0;
    }

    fn highlight(&mut self, _previous: Option<usize>, current: usize) {
        self.current = Some(current);
    }

    fn scroll_to(&mut self, index: usize, mode: ScrollMode) {
        self.focus = Some(index);
        self.snap = mode == ScrollMode::Immediate;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};

    fn lyrics(n: usize, translated: bool) -> RenderedLyrics {
        RenderedLyrics {
            lines: (0..n)
                .map(|i| RenderedLine {
                    index: i,
                    time: i as f64,
                    text: format!("line {i}"),
                    translation: translated.then(|| format!("trans {i}")),
                })
                .collect(),
            untimed: false,
            spacer_ratio: 0.5,
        }
    }

    fn draw(view: &mut LyricView, terminal: &mut Terminal<TestBackend>) -> Vec<String> {
        terminal
            .draw(|f| view.draw(f, f.area(), "test"))
            .unwrap();
        let buf = terminal.backend().buffer();
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_immediate_scroll_centers_line() {
        // 10 inner rows, spacer 5.
        let mut terminal = Terminal::new(TestBackend::new(30, 12)).unwrap();
        let mut view = LyricView::new();
        view.render(&lyrics(20, false));
        draw(&mut view, &mut terminal);

        view.highlight(None, 6);
        view.scroll_to(6, ScrollMode::Immediate);
        assert!(!view.tick());
        let rows = draw(&mut view, &mut terminal);

        // Line 6 sits at content row 5 + 6 = 11; centered means offset 11 + 0.5 - 5.
        assert_eq!(view.offset(), 7);
        let middle = rows.iter().position(|r| r.contains("line 6")).unwrap();
        assert_eq!(middle, 5);
    }

    #[test]
    fn test_smooth_scroll_eases_toward_target() {
        let mut terminal = Terminal::new(TestBackend::new(30, 12)).unwrap();
        let mut view = LyricView::new();
        view.render(&lyrics(20, false));
        draw(&mut view, &mut terminal);

        view.scroll_to(10, ScrollMode::Smooth);
        assert!(view.tick());
        let first = view.offset();
        assert!(first > 0 && first < 11);

        let mut frames = 1;
        while view.tick() {
            frames += 1;
            assert!(frames < 100, "animation never settles");
        }
        assert_eq!(view.offset(), 11);
    }

    #[test]
    fn test_click_maps_rows_to_lines() {
        let mut terminal = Terminal::new(TestBackend::new(30, 12)).unwrap();
        let mut view = LyricView::new();
        view.render(&lyrics(4, true));
        draw(&mut view, &mut terminal);

        // Border at row 0, spacer rows 1..=5, then line 0 and its translation.
        assert_eq!(view.line_at(5, 3), None);
        assert_eq!(view.line_at(5, 6), Some(0));
        assert_eq!(view.line_at(5, 7), Some(0));
        assert_eq!(view.line_at(5, 8), Some(1));
        assert_eq!(view.line_at(0, 8), None, "border column");
    }

    #[test]
    fn test_manual_scroll_detaches_and_clamps() {
        let mut terminal = Terminal::new(TestBackend::new(30, 12)).unwrap();
        let mut view = LyricView::new();
        view.render(&lyrics(5, false));
        draw(&mut view, &mut terminal);

        view.scroll_to(2, ScrollMode::Immediate);
        view.tick();
        view.scroll_by(-100);
        assert_eq!(view.offset(), 0);
        assert!(!view.tick(), "no focus after manual scroll");

        // 5 lines + 2 * 5 spacer rows in a 10-row panel.
        view.scroll_by(100);
        assert_eq!(view.offset(), 5);
    }

    #[test]
    fn test_highlighted_line_is_bold() {
        let mut terminal = Terminal::new(TestBackend::new(30, 12)).unwrap();
        let mut view = LyricView::new();
        view.render(&lyrics(3, false));
        view.highlight(None, 1);
        draw(&mut view, &mut terminal);

        let buf = terminal.backend().buffer();
        let (x, y) = (0..buf.area.height)
            .find_map(|y| {
                (0..buf.area.width)
                    .find(|&x| buf[(x, y)].symbol() == "l" && buf[(x + 5, y)].symbol() == "1")
                    .map(|x| (x, y))
            })
            .unwrap();
        assert!(buf[(x, y)].modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_empty_and_clear() {
        let mut terminal = Terminal::new(TestBackend::new(30, 12)).unwrap();
        let mut view = LyricView::new();
        view.render_empty();
        let rows = draw(&mut view, &mut terminal);
        assert!(rows.iter().any(|r| r.contains("No lyrics")));

        view.render(&lyrics(2, false));
        view.clear();
        let rows = draw(&mut view, &mut terminal);
        assert!(!rows.iter().any(|r| r.contains("line")));
        assert_eq!(view.offset(), 0);
    }
}
