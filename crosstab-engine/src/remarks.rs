//! FILENAME: crosstab-engine/src/remarks.rs
//! Remark Formatter - annotation rows to per-entity text blocks.
//!
//! Time-windowed annotations get a `"time {start} to {end} total {duration} - "`
//! prefix; non-empty line bodies are serially numbered and newline-joined.
//! Everything here is display text. Nothing feeds the matrix, so parse
//! failures degrade to omission instead of failing the build.

use chrono::{NaiveDateTime, NaiveTime};
use smallvec::SmallVec;

use crate::rows::FieldValue;

// ============================================================================
// TIME PARSING
// ============================================================================

/// Accepted window time shapes. Drivers deliver either a bare time or a
/// full timestamp depending on the column type.
const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a window time from field text. Returns None for anything that is
/// not a recognizable time.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(trimmed, format) {
            return Some(time);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(stamp.time());
        }
    }
    None
}

// ============================================================================
// WINDOW PREFIX
// ============================================================================

/// Renders the duration suffix of a window prefix. Short windows read as
/// whole minutes, longer ones as fractional hours.
pub fn duration_phrase(hours: f64) -> String {
    let minutes = (hours * 60.0).round();
    if minutes <= 60.0 {
        format!("{} minutes", minutes as i64)
    } else {
        format!("{:.2} hrs", hours)
    }
}

/// Builds the `"time {start} to {end} total {duration} - "` prefix for a
/// time-windowed annotation. If either end of the window is missing or
/// unparseable, no prefix at all is produced; a partial prefix is never
/// emitted.
pub fn window_prefix(
    start: &FieldValue,
    end: &FieldValue,
    duration_hours: f64,
) -> Option<String> {
    let start = parse_time(start.as_text()?)?;
    let end = parse_time(end.as_text()?)?;
    Some(format!(
        "time {} to {} total {} - ",
        start.format("%H:%M"),
        end.format("%H:%M"),
        duration_phrase(duration_hours)
    ))
}

// ============================================================================
// LINE ASSEMBLY
// ============================================================================

/// Accumulates one entity's remark lines in resolution order.
///
/// Empty bodies are skipped without consuming a serial number, so the
/// numbering over the surviving lines is always 1..n.
#[derive(Debug, Default)]
pub struct RemarkWriter {
    lines: SmallVec<[String; 4]>,
}

impl RemarkWriter {
    pub fn new() -> Self {
        RemarkWriter::default()
    }

    pub fn push(&mut self, body: String) {
        if body.is_empty() {
            return;
        }
        let serial = self.lines.len() + 1;
        self.lines.push(format!("{}. {}", serial, body));
    }

    /// Joins the numbered lines into the entity's text block. An entity
    /// with no surviving lines gets an empty string, not an absent value.
    pub fn finish(&self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_shapes() {
        assert_eq!(
            parse_time("10:00"),
            NaiveTime::from_hms_opt(10, 0, 0)
        );
        assert_eq!(
            parse_time("23:59:30"),
            NaiveTime::from_hms_opt(23, 59, 30)
        );
        assert_eq!(
            parse_time("2024-03-01T06:30:00"),
            NaiveTime::from_hms_opt(6, 30, 0)
        );
        assert_eq!(
            parse_time("2024-03-01 06:30:00"),
            NaiveTime::from_hms_opt(6, 30, 0)
        );
        assert_eq!(parse_time(""), None);
        assert_eq!(parse_time("sometime after lunch"), None);
    }

    #[test]
    fn test_duration_phrase_buckets() {
        assert_eq!(duration_phrase(0.75), "45 minutes");
        assert_eq!(duration_phrase(1.0), "60 minutes");
        assert_eq!(duration_phrase(1.5), "1.50 hrs");
        assert_eq!(duration_phrase(2.25), "2.25 hrs");
        assert_eq!(duration_phrase(0.0), "0 minutes");
    }

    #[test]
    fn test_window_prefix_requires_both_ends() {
        let prefix = window_prefix(
            &FieldValue::Text("10:00".to_string()),
            &FieldValue::Text("10:45".to_string()),
            0.75,
        );
        assert_eq!(
            prefix.as_deref(),
            Some("time 10:00 to 10:45 total 45 minutes - ")
        );

        assert_eq!(
            window_prefix(&FieldValue::Text("10:00".to_string()), &FieldValue::Null, 0.75),
            None
        );
        assert_eq!(
            window_prefix(
                &FieldValue::Text("??".to_string()),
                &FieldValue::Text("10:45".to_string()),
                0.75
            ),
            None
        );
    }

    #[test]
    fn test_window_prefix_renders_zero_padded() {
        let prefix = window_prefix(
            &FieldValue::Text("6:05".to_string()),
            &FieldValue::Text("2024-03-01 07:00:00".to_string()),
            0.92,
        );
        assert_eq!(
            prefix.as_deref(),
            Some("time 06:05 to 07:00 total 55 minutes - ")
        );
    }

    #[test]
    fn test_writer_skips_empty_without_serial() {
        let mut writer = RemarkWriter::new();
        writer.push("jam".to_string());
        writer.push(String::new());
        writer.push("cleared".to_string());
        assert_eq!(writer.finish(), "1. jam\n2. cleared");
    }

    #[test]
    fn test_writer_empty_block_is_empty_string() {
        let writer = RemarkWriter::new();
        assert_eq!(writer.finish(), "");
    }

    #[test]
    fn test_writer_is_deterministic() {
        let build = || {
            let mut writer = RemarkWriter::new();
            writer.push("time 10:00 to 10:45 total 45 minutes - jam".to_string());
            writer.push("belt checked".to_string());
            writer.finish()
        };
        assert_eq!(build(), build());
    }
}
