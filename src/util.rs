use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, Offset};

/// Extracts the badge number from a display name of the form `"137 - Petro K. Montserrat"`.
/// Returns `None` unless the name starts with digits followed (after optional spaces) by `-`.
pub fn parse_badge(display_name: &str) -> Option<String> {
    let digits_end = display_name
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(display_name.len());
    if digits_end == 0 {
        return None;
    }
    let rest = display_name[digits_end..].trim_start();
    if rest.starts_with('-') {
        Some(display_name[..digits_end].to_string())
    } else {
        None
    }
}

/// The part of a display name after its `"<badge> -"` prefix, or the whole name if there is none.
pub fn name_without_badge(display_name: &str) -> &str {
    match parse_badge(display_name) {
        Some(badge) => display_name[badge.len()..]
            .trim_start()
            .trim_start_matches('-')
            .trim_start(),
        None => display_name,
    }
}

/// A lookup query is a non-empty run of ASCII digits, ignoring surrounding whitespace.
pub fn as_badge_query(text: &str) -> Option<&str> {
    let text = text.trim();
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        Some(text)
    } else {
        None
    }
}

/// Current time as epoch milliseconds.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Time between two epoch-millisecond instants; clamped to zero when `end < start`.
pub fn elapsed(start_ms: i64, end_ms: i64) -> Duration {
    Duration::from_millis(end_ms.saturating_sub(start_ms).max(0) as u64)
}

/// The host's current UTC offset, used when no offset is configured.
pub fn local_offset() -> FixedOffset {
    Local::now().offset().fix()
}

/// Format an epoch-millisecond instant as `HH:MM` in the given offset.
pub fn format_clock(ms: i64, offset: &FixedOffset) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(at) => at.with_timezone(offset).format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// Format a duration as `"2 horas 1 minuto"`. Seconds are truncated.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    format!(
        "{h} hora{} {m} minuto{}",
        if h != 1 { "s" } else { "" },
        if m != 1 { "s" } else { "" }
    )
}

/// Channel name for a ticket: `<prefix>-<username>`, lowercased, keeping only `[a-z0-9-]`.
pub fn ticket_channel_name(prefix: &str, username: &str) -> String {
    format!("{prefix}-{username}")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}
