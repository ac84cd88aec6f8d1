//! iCalendar feed for upcoming meetings.
//!
//! One VEVENT per future dated book, fixed 3-hour duration. Emission is a
//! small local writer: RFC 5545 needs CRLF line endings and escaped text
//! values, nothing more for a feed this size.

use chrono::{DateTime, Duration, Utc};

use crate::models::Book;

const PROD_ID: &str = "-//Fireside Bookgroup//EN";
const MEETING_DURATION_HOURS: i64 = 3;

/// Escape a text value per RFC 5545 (backslash, semicolon, comma, newline).
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

fn summary(book: &Book) -> String {
    match book.author.as_deref() {
        Some(author) if !author.is_empty() => format!(
            "Bookgroup: {} by {}, proposer {}",
            book.title, author, book.proposer
        ),
        _ => format!("Bookgroup: {}, proposer {}", book.title, book.proposer),
    }
}

/// Build the calendar document for every dated book after `now`.
pub fn build_calendar(books: &[Book], now: DateTime<Utc>) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PROD_ID),
        "CALSCALE:GREGORIAN".to_string(),
    ];

    for book in books {
        let Some(start) = book.meeting_date else {
            continue;
        };
        if start <= now {
            continue;
        }
        let end = start + Duration::hours(MEETING_DURATION_HOURS);

        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}", book.id));
        lines.push(format!("DTSTAMP:{}", format_utc(start)));
        lines.push(format!("DTSTART:{}", format_utc(start)));
        lines.push(format!("DTEND:{}", format_utc(end)));
        lines.push(format!("SUMMARY:{}", escape_text(&summary(book))));
        lines.push("END:VEVENT".to_string());
    }

    lines.push("END:VCALENDAR".to_string());
    lines.join("\r\n") + "\r\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn book(id: &str, title: &str, meeting_date: Option<DateTime<Utc>>) -> Book {
        Book {
            id: id.to_string(),
            title: title.to_string(),
            author: Some("Keri Hulme".to_string()),
            proposer: "Mike".to_string(),
            isbn: None,
            cover_url: None,
            meeting_date,
            month: meeting_date.map(|d| d.format("%m").to_string().parse().unwrap()),
            year: meeting_date.map(|_| 2025),
        }
    }

    #[test]
    fn test_only_future_dated_books_emitted() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let past = Utc.with_ymd_and_hms(2025, 5, 20, 7, 30, 0).unwrap();
        let future = Utc.with_ymd_and_hms(2025, 7, 15, 7, 30, 0).unwrap();

        let books = vec![
            book("past", "Old Pick", Some(past)),
            book("future", "New Pick", Some(future)),
            book("undated", "No Date", None),
        ];

        let ics = build_calendar(&books, now);
        assert!(!ics.contains("UID:past"));
        assert!(!ics.contains("UID:undated"));
        assert!(ics.contains("UID:future"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
    }

    #[test]
    fn test_event_has_three_hour_duration() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2025, 7, 15, 7, 30, 0).unwrap();

        let ics = build_calendar(&[book("b1", "The Bone People", Some(start))], now);
        assert!(ics.contains("DTSTART:20250715T073000Z"));
        assert!(ics.contains("DTEND:20250715T103000Z"));
    }

    #[test]
    fn test_summary_escaped_and_crlf_terminated() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2025, 7, 15, 7, 30, 0).unwrap();

        let ics = build_calendar(&[book("b1", "Smith; Jones", Some(start))], now);
        assert!(ics.contains("SUMMARY:Bookgroup: Smith\\; Jones by Keri Hulme\\, proposer Mike"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert!(ics.lines().next().unwrap().starts_with("BEGIN:VCALENDAR"));
    }

    #[test]
    fn test_empty_list_is_valid_calendar() {
        let now = Utc::now();
        let ics = build_calendar(&[], now);
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.contains("PRODID:-//Fireside Bookgroup//EN"));
        assert!(!ics.contains("BEGIN:VEVENT"));
    }
}
