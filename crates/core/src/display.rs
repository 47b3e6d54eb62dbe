//! Display formatting shared by the gallery and admin templates.

use chrono::{DateTime, Utc};

/// Shown in place of a missing date.
pub const MISSING_DATE: &str = "—";

/// Format a timestamp as `Mon D, YYYY` (e.g. `Mar 4, 2025`).
#[must_use]
pub fn format_display_date(date: Option<DateTime<Utc>>) -> String {
    date.map_or_else(
        || MISSING_DATE.to_string(),
        |date| date.format("%b %-d, %Y").to_string(),
    )
}

/// Cut `text` to at most `max` characters, appending an ellipsis if cut.
#[must_use]
pub fn excerpt(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}

/// Strip tags from editor HTML, leaving plain text for previews.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_format_display_date() {
        let date = Utc.with_ymd_and_hms(2025, 3, 4, 15, 0, 0).single();
        assert_eq!(format_display_date(date), "Mar 4, 2025");
    }

    #[test]
    fn test_missing_date() {
        assert_eq!(format_display_date(None), "—");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("a longer sentence", 8), "a longer…");
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Hello <strong>world</strong></p><p>again</p>"),
            "Hello world again"
        );
    }
}
