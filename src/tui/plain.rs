//! Line-oriented renderer for headless runs: prints each line as it becomes
//! active.

use crate::lyrics::{LyricRenderer, RenderedLine, RenderedLyrics, ScrollMode, format_time};
use std::io::Write;

pub struct PlainRenderer<W: Write> {
    out: W,
    lines: Vec<RenderedLine>,
}

impl<W: Write> PlainRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            lines: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// `[mm:ss.xx] text`, with the translation indented on the next line.
pub fn format_line(time: f64, text: &str, translation: Option<&str>) -> String {
    let mut s = format!("[{}] {}", format_time(time), text);
    if let Some(tr) = translation {
        s.push_str("\n           ");
        s.push_str(tr);
    }
    s
}

impl<W: Write> LyricRenderer for PlainRenderer<W> {
    fn render(&mut self, lyrics: &RenderedLyrics) {
        self.lines = lyrics.lines.clone();
        if lyrics.untimed {
            for line in &self.lines {
                let _ = writeln!(self.out, "{}", line.text);
            }
        }
    }

    fn render_empty(&mut self) {
        self.lines.clear();
        let _ = writeln!(self.out, "(no lyrics)");
    }

    fn highlight(&mut self, _previous: Option<usize>, current: usize) {
        if let Some(line) = self.lines.iter().find(|l| l.index == current) {
            let _ = writeln!(
                self.out,
                "{}",
                format_line(line.time, &line.text, line.translation.as_deref())
            );
        }
    }

    fn scroll_to(&mut self, _index: usize, _mode: ScrollMode) {}

    fn clear(&mut self) {
        self.lines.clear();
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lyrics(untimed: bool) -> RenderedLyrics {
        RenderedLyrics {
            lines: vec![
                RenderedLine {
                    index: 0,
                    time: 1.5,
                    text: "hello".to_string(),
                    translation: Some("bonjour".to_string()),
                },
                RenderedLine {
                    index: 1,
                    time: 65.0,
                    text: "world".to_string(),
                    translation: None,
                },
            ],
            untimed,
            spacer_ratio: 0.45,
        }
    }

    #[test]
    fn test_prints_active_lines() {
        let mut r = PlainRenderer::new(Vec::new());
        r.render(&lyrics(false));
        r.highlight(None, 1);
        r.highlight(Some(1), 0);
        r.highlight(Some(0), 9);
        let out = String::from_utf8(r.into_inner()).unwrap();
        assert_eq!(
            out,
            "[01:05.00] world\n[00:01.50] hello\n           bonjour\n"
        );
    }

    #[test]
    fn test_untimed_prints_everything_once() {
        let mut r = PlainRenderer::new(Vec::new());
        r.render(&lyrics(true));
        r.render_empty();
        let out = String::from_utf8(r.into_inner()).unwrap();
        assert_eq!(out, "hello\nworld\n(no lyrics)\n");
    }
}
