//! Lenient calendar-date parsing shared by the search classifier and the
//! date filter inputs.
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Formats tried in order when no configuration overrides them.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parses free text into a calendar day.
///
/// Besides the configured day formats this accepts RFC 3339 timestamps,
/// naive date-times, `YYYY-MM` (first of the month) and a bare four digit
/// year (first of January), mirroring what a browser date parser accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParser {
    formats: Vec<String>,
}

impl Default for DateParser {
    fn default() -> Self {
        Self {
            formats: DEFAULT_DATE_FORMATS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl DateParser {
    #[must_use]
    pub fn with_formats(formats: Vec<String>) -> Self {
        if formats.is_empty() {
            return Self::default();
        }
        Self { formats }
    }

    #[must_use]
    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    #[must_use]
    pub fn parse(&self, input: &str) -> Option<NaiveDate> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        self.formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
            .or_else(|| {
                DateTime::parse_from_rfc3339(input)
                    .ok()
                    .map(|stamp| stamp.date_naive())
            })
            .or_else(|| {
                DATETIME_FORMATS
                    .iter()
                    .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
                    .map(|stamp| stamp.date())
            })
            .or_else(|| parse_year_month(input))
            .or_else(|| parse_bare_year(input))
    }
}

fn parse_year_month(input: &str) -> Option<NaiveDate> {
    let (year, month) = input.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    if !year.chars().chain(month.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

fn parse_bare_year(input: &str) -> Option<NaiveDate> {
    if input.len() != 4 || !input.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    // Leading zeros ("0042") are numbers, not years.
    if input.starts_with('0') {
        return None;
    }
    NaiveDate::from_ymd_opt(input.parse().ok()?, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parses_common_day_formats() {
        let parser = DateParser::default();
        assert_eq!(parser.parse("2024-03-05"), Some(day(2024, 3, 5)));
        assert_eq!(parser.parse(" 2024/03/05 "), Some(day(2024, 3, 5)));
        assert_eq!(parser.parse("03/05/2024"), Some(day(2024, 3, 5)));
        assert_eq!(parser.parse("Mar 5, 2024"), Some(day(2024, 3, 5)));
        assert_eq!(parser.parse("5 March 2024"), Some(day(2024, 3, 5)));
    }

    #[test]
    fn parses_timestamps_and_partial_dates() {
        let parser = DateParser::default();
        assert_eq!(
            parser.parse("2024-03-05T10:30:00+02:00"),
            Some(day(2024, 3, 5))
        );
        assert_eq!(parser.parse("2024-03-05 23:59:59"), Some(day(2024, 3, 5)));
        assert_eq!(parser.parse("2024-03"), Some(day(2024, 3, 1)));
        assert_eq!(parser.parse("2024"), Some(day(2024, 1, 1)));
    }

    #[test]
    fn rejects_non_dates() {
        let parser = DateParser::default();
        assert_eq!(parser.parse(""), None);
        assert_eq!(parser.parse("42"), None);
        assert_eq!(parser.parse("0042"), None);
        assert_eq!(parser.parse("12345"), None);
        assert_eq!(parser.parse("2024-13-01"), None);
        assert_eq!(parser.parse("bolts"), None);
        assert_eq!(parser.parse("sales@acme.io"), None);
    }

    #[test]
    fn custom_formats_replace_defaults() {
        let parser = DateParser::with_formats(vec!["%d/%m/%Y".to_string()]);
        assert_eq!(parser.parse("05/03/2024"), Some(day(2024, 3, 5)));
        assert_eq!(parser.parse("Mar 5, 2024"), None);
        // Partial shapes are always recognised.
        assert_eq!(parser.parse("2024"), Some(day(2024, 1, 1)));

        let fallback = DateParser::with_formats(vec![]);
        assert_eq!(fallback, DateParser::default());
    }
}
