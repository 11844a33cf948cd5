use chrono::{Datelike, NaiveDateTime};
use parley_core::models::MessagePreview;
use unicode_width::UnicodeWidthChar;

/// Days back for which a weekday name is shown instead of a date.
const WEEKDAY_RANGE_DAYS: i64 = 6;

/// Truncate to a display width, adding an ellipsis when truncated.
pub fn truncate_with_ellipsis(s: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    let width: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if width <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }

    let budget = max_width - 3;
    let mut used = 0;
    let mut truncated = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        truncated.push(c);
    }
    truncated.push_str("...");
    truncated
}

/// Room-list timestamp: `HH:MM` today, the weekday within the last six
/// days, an ISO date otherwise.
pub fn format_room_timestamp(ts: NaiveDateTime, now: NaiveDateTime) -> String {
    let days = (now.date() - ts.date()).num_days();
    if days == 0 {
        ts.format("%H:%M").to_string()
    } else if (1..=WEEKDAY_RANGE_DAYS).contains(&days) {
        ts.weekday().to_string()
    } else {
        ts.format("%Y-%m-%d").to_string()
    }
}

/// Banner clock above the recency list.
pub fn format_banner(now: NaiveDateTime) -> String {
    now.format("%H:%M  %A %Y-%m-%d").to_string()
}

pub fn format_message_time(ts: NaiveDateTime) -> String {
    ts.format("%H:%M").to_string()
}

/// Second line of a detailed room row.
pub fn preview_line(preview: Option<&MessagePreview>) -> String {
    match preview {
        Some(p) if p.sender_name.is_empty() => p.body.replace('\n', " "),
        Some(p) => format!("{}: {}", p.sender_name, p.body.replace('\n', " ")),
        None => String::new(),
    }
}

/// Splits text into lines of at most `width` cells. Existing newlines are
/// kept; long words are broken.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut used = 0;
        for c in paragraph.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > width {
                lines.push(std::mem::take(&mut line));
                used = 0;
            }
            line.push(c);
            used += w;
        }
        lines.push(line);
    }
    lines
}

/// Typing line under the conversation title.
pub fn typing_text(users: &[String]) -> String {
    match users {
        [] => String::new(),
        [one] => format!("{} is typing...", one),
        [first, second] => format!("{} and {} are typing...", first, second),
        [first, second, third] => format!("{}, {} and {} are typing...", first, second, third),
        _ => "Several people are typing...".to_string(),
    }
}

/// Case-insensitive subsequence match. Returns the matched char positions.
pub fn fuzzy_match(needle: &str, haystack: &str) -> Option<Vec<usize>> {
    let mut positions = Vec::new();
    let mut chars = haystack.chars().enumerate();
    for n in needle.chars().flat_map(char::to_lowercase) {
        loop {
            let (i, h) = chars.next()?;
            if h.to_lowercase().eq(std::iter::once(n)) {
                positions.push(i);
                break;
            }
        }
    }
    Some(positions)
}
