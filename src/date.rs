//! Parsing of the `YYYY-MM-DD` dates used in forms and query strings.

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse a calendar date in the form `YYYY-MM-DD`, e.g. "2025-01-15".
///
/// Surrounding whitespace is ignored. Returns `None` for anything else,
/// including impossible dates such as "2025-02-30".
pub fn parse_iso_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), ISO_DATE).ok()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::date::parse_iso_date;

    #[test]
    fn parses_iso_date() {
        assert_eq!(parse_iso_date("2025-01-15"), Some(date!(2025 - 01 - 15)));
    }

    #[test]
    fn rejects_day_first_date() {
        assert_eq!(parse_iso_date("15-01-2025"), None);
    }

    #[test]
    fn rejects_impossible_date() {
        assert_eq!(parse_iso_date("2025-02-30"), None);
    }

    #[test]
    fn rejects_empty_string() {
        assert_eq!(parse_iso_date(""), None);
    }
}
