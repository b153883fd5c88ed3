use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::log_debug;

/// Minutes of worked time. Never negative.
pub type Minutes = u32;

fn hour_minute_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]+)시간\s*([0-9]+)분").expect("hour-minute pattern"))
}

fn colon_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]+):([0-9]+)").expect("colon pattern"))
}

fn hours_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]+)시간").expect("hours-only pattern"))
}

/// Parse a duration written as `9시간 47분`, `23:20` or `8시간`.
///
/// Patterns are tried in that order and the first match wins. Text matching
/// none of them (or overflowing `u32`) yields `0`.
pub fn parse_to_minutes(text: &str) -> Minutes {
    if text.is_empty() {
        return 0;
    }

    let parsed = if let Some(caps) = hour_minute_re().captures(text) {
        hours_and_minutes(&caps)
    } else if let Some(caps) = colon_re().captures(text) {
        hours_and_minutes(&caps)
    } else if let Some(caps) = hours_only_re().captures(text) {
        number(&caps, 1).and_then(|hours| hours.checked_mul(60))
    } else {
        return 0;
    };

    parsed.unwrap_or_else(|| {
        log_debug!("duration '{}' overflows, treating as 0", text);
        0
    })
}

fn hours_and_minutes(caps: &Captures<'_>) -> Option<Minutes> {
    let hours = number(caps, 1)?;
    let minutes = number(caps, 2)?;
    hours.checked_mul(60)?.checked_add(minutes)
}

fn number(caps: &Captures<'_>, group: usize) -> Option<Minutes> {
    caps.get(group)?.as_str().parse().ok()
}

/// `107` → `1시간 47분`.
pub fn format_worded(minutes: Minutes) -> String {
    format!("{}시간 {:02}분", minutes / 60, minutes % 60)
}

/// `107` → `01:47`.
pub fn format_clock(minutes: Minutes) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
