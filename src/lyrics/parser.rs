//! LRC format parser
//!
//! Parses line-synchronized lyrics:
//! [mm:ss.xx] Lyrics line here
//!
//! Example:
//! [00:24.46]First line
//! [03:05.32][01:28.24]A chorus that appears twice

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Duration given to the last timed line, which has no successor to measure against.
pub const LAST_LINE_DURATION: f64 = 5.0;

/// Max distance between a primary and a translated timestamp to pair them.
pub const MERGE_TOLERANCE_SECS: f64 = 0.5;

/// ASCII digits only; `\d` would also accept other scripts' digits.
static TIME_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([0-9]{1,2}:[0-9]{1,2}(?:[.:][0-9]{1,3})?)\]").expect("time tag regex")
});

static METADATA_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[a-zA-Z]+:").expect("metadata tag regex"));

/// A single line of lyrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Start time in seconds
    pub time: f64,
    /// Seconds until the next line starts
    pub duration: f64,
    pub text: String,
    /// Position in the final sequence
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl LyricLine {
    fn new(time: f64, text: String) -> Self {
        Self {
            time,
            duration: 0.0,
            text,
            index: 0,
            translation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub lines: Vec<LyricLine>,
    /// No usable timing: show as static text, no sync.
    pub no_timestamp: bool,
}

impl ParseResult {
    fn untimed(lines: Vec<LyricLine>) -> Self {
        Self {
            lines,
            no_timestamp: true,
        }
    }
}

/// Parse LRC text into an ordered, indexed line sequence. Never fails: bad
/// tags degrade to time 0.
pub fn parse_lrc(raw: &str) -> ParseResult {
    if raw.trim().is_empty() {
        return ParseResult::untimed(Vec::new());
    }

    let mut lines = Vec::new();
    let mut need_sort = false;

    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
        // JSON credit blocks and [ti:...] style metadata
        if line.starts_with('{') || METADATA_TAG.is_match(line) {
            continue;
        }

        let mut times = Vec::new();
        let mut text_start = 0;
        for cap in TIME_TAG.captures_iter(line) {
            times.push(parse_time(&cap[1]));
            if let Some(m) = cap.get(0) {
                text_start = m.end();
            }
        }

        if times.is_empty() {
            lines.push(LyricLine::new(0.0, line.trim().to_string()));
            continue;
        }

        let text = line[text_start..].trim().to_string();
        if times.len() > 1 {
            need_sort = true;
        }
        lines.extend(times.into_iter().map(|t| LyricLine::new(t, text.clone())));
    }

    if !lines.iter().any(|l| l.time > 0.0) {
        for (i, line) in lines.iter_mut().enumerate() {
            line.index = i;
        }
        return ParseResult::untimed(lines);
    }

    // Only multi-tag lines can land out of order here; single-tag input keeps
    // the author's order.
    if need_sort {
        lines.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    let times: Vec<f64> = lines.iter().map(|l| l.time).collect();
    for (i, line) in lines.iter_mut().enumerate() {
        line.index = i;
        line.duration = match times.get(i + 1) {
            // Unsorted single-tag input can step backwards.
            Some(next) => (next - line.time).max(0.0),
            None => LAST_LINE_DURATION,
        };
    }

    ParseResult {
        lines,
        no_timestamp: false,
    }
}

/// Attach translated text to the primary lines it lines up with.
pub fn merge_translation(mut primary: ParseResult, translation: &str) -> ParseResult {
    let translated = parse_lrc(translation);
    if primary.no_timestamp || translated.no_timestamp || translated.lines.is_empty() {
        return primary;
    }

    let mut candidates: Vec<&LyricLine> = translated
        .lines
        .iter()
        .filter(|l| !l.text.is_empty())
        .collect();
    candidates.sort_by(|a, b| a.time.total_cmp(&b.time));

    for line in primary.lines.iter_mut() {
        if let Some(t) = nearest(&candidates, line.time)
            && (t.time - line.time).abs() <= MERGE_TOLERANCE_SECS
        {
            line.translation = Some(t.text.clone());
        }
    }
    primary
}

fn nearest<'a>(sorted: &[&'a LyricLine], time: f64) -> Option<&'a LyricLine> {
    let pos = sorted.partition_point(|l| l.time < time);
    let after = sorted.get(pos).copied();
    let before = pos.checked_sub(1).and_then(|i| sorted.get(i)).copied();
    match (before, after) {
        (Some(b), Some(a)) => {
            if (time - b.time) <= (a.time - time) {
                Some(b)
            } else {
                Some(a)
            }
        }
        (b, a) => b.or(a),
    }
}

/// Convert "mm:ss", "mm:ss.fff" or "mm:ss:fff" to seconds. Anything else is 0.
fn parse_time(s: &str) -> f64 {
    let parts: Vec<&str> = s.split([':', '.']).collect();
    let (min, sec, frac) = match parts.as_slice() {
        [m, s] => (*m, *s, None),
        [m, s, f] => (*m, *s, Some(*f)),
        _ => return 0.0,
    };

    let (Ok(min), Ok(sec)) = (min.parse::<u32>(), sec.parse::<u32>()) else {
        return 0.0;
    };
    let frac = match frac {
        Some(f) if !f.is_empty() => match f.parse::<u32>() {
            Ok(v) => v as f64 / 10f64.powi(f.len() as i32),
            Err(_) => return 0.0,
        },
        _ => 0.0,
    };

    min as f64 * 60.0 + sec as f64 + frac
}

/// Render seconds as an LRC-style `mm:ss.xx` stamp.
pub fn format_time(seconds: f64) -> String {
    let centis = (seconds.max(0.0) * 100.0).round() as u64;
    format!(
        "{:02}:{:02}.{:02}",
        centis / 6000,
        (centis / 100) % 60,
        centis % 100
    )
}
