use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::detect::DateFormat;

/// A single cell that could not be normalized. Row-scoped: callers collect
/// these into the import result instead of propagating them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldParseError {
    #[error("value is empty")]
    Empty,

    #[error("cannot parse '{raw}' as a date (expected {expected})")]
    Date { raw: String, expected: &'static str },

    #[error("cannot parse '{raw}' as an amount")]
    Amount { raw: String },
}

// Accepts an optional time suffix: bank exports often ship ISO timestamps
// in the date column, and the detector votes ISO on those.
static YMD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})(?:[T ]\d{1,2}:\d{2}(?::\d{2})?)?$").unwrap()
});
static SLASH_TRIPLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[-/](\d{1,2})[-/](\d{4})$").unwrap());
static DOTTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{4})$").unwrap());

/// Last-resort layouts for values that do not match the run's format.
const FALLBACK_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%m/%d/%y",
];

/// Parse one date cell under the format locked in for the run. Day/month
/// order comes from `format` alone; it is never re-guessed per value, so the
/// same raw string always parses the same way within one import.
pub fn parse_date(raw: &str, format: DateFormat) -> Result<NaiveDate, FieldParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FieldParseError::Empty);
    }

    let shaped = match format {
        DateFormat::Iso => YMD.captures(raw).and_then(|c| {
            ymd(c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?)
        }),
        DateFormat::Us => SLASH_TRIPLE.captures(raw).and_then(|c| {
            ymd(c[3].parse().ok()?, c[1].parse().ok()?, c[2].parse().ok()?)
        }),
        DateFormat::EuVn | DateFormat::Uk => SLASH_TRIPLE.captures(raw).and_then(|c| {
            ymd(c[3].parse().ok()?, c[2].parse().ok()?, c[1].parse().ok()?)
        }),
        DateFormat::Dot => DOTTED.captures(raw).and_then(|c| {
            ymd(c[3].parse().ok()?, c[2].parse().ok()?, c[1].parse().ok()?)
        }),
        DateFormat::Text => parse_text_date(raw),
        DateFormat::Auto => None,
    };
    if let Some(date) = shaped {
        return Ok(date);
    }

    // Free-form fallback before giving up on the cell.
    for layout in FALLBACK_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, layout) {
            return Ok(date);
        }
    }

    Err(FieldParseError::Date {
        raw: raw.to_string(),
        expected: format.expected(),
    })
}

fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn parse_text_date(raw: &str) -> Option<NaiveDate> {
    const LAYOUTS: &[&str] = &[
        "%b %d, %Y",
        "%B %d, %Y",
        "%b %d %Y",
        "%B %d %Y",
        "%d %b %Y",
        "%d %B %Y",
        "%d-%b-%Y",
    ];
    LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(raw, layout).ok())
}

/// Parse one amount cell into a signed value. Strips currency symbols and
/// quotes, accepts parenthesized negatives, and disambiguates separators by
/// a fixed rule: a trailing comma + two digits means comma is the decimal
/// separator and dots are thousands ("1.234,56"); otherwise commas are
/// thousands separators ("1,234.56").
pub fn parse_amount(raw: &str) -> Result<f64, FieldParseError> {
    let bad = || FieldParseError::Amount { raw: raw.trim().to_string() };

    let mut s: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '"' | '\'' | '$' | '€' | '£' | '¥' | '₫'))
        .collect();
    if s.is_empty() {
        return Err(FieldParseError::Empty);
    }

    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        negative = true;
        s = inner.to_string();
    }

    static COMMA_DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\d{2}$").unwrap());
    let plain = if COMMA_DECIMAL.is_match(&s) {
        s.replace('.', "").replace(',', ".")
    } else {
        s.replace(',', "")
    };

    let value: f64 = plain.parse().map_err(|_| bad())?;
    if !value.is_finite() {
        return Err(bad());
    }
    Ok(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_date_iso() {
        assert_eq!(parse_date("2024-03-04", DateFormat::Iso).unwrap(), d(2024, 3, 4));
        assert_eq!(parse_date("2024/3/4", DateFormat::Iso).unwrap(), d(2024, 3, 4));
    }

    #[test]
    fn test_parse_date_us_vs_eu_order() {
        // The format alone decides day/month order for the same raw string.
        assert_eq!(parse_date("03/04/2024", DateFormat::Us).unwrap(), d(2024, 3, 4));
        assert_eq!(parse_date("03/04/2024", DateFormat::EuVn).unwrap(), d(2024, 4, 3));
        assert_eq!(parse_date("03/04/2024", DateFormat::Uk).unwrap(), d(2024, 4, 3));
    }

    #[test]
    fn test_parse_date_iso_timestamp_keeps_date_part() {
        assert_eq!(parse_date("2024-03-04 10:23:00", DateFormat::Iso).unwrap(), d(2024, 3, 4));
        assert_eq!(parse_date("2024-03-04T10:23:00", DateFormat::Iso).unwrap(), d(2024, 3, 4));
        assert_eq!(parse_date("2024-03-04 10:23", DateFormat::Iso).unwrap(), d(2024, 3, 4));
        // A US-format run still parses these via the fallback layouts.
        assert_eq!(parse_date("2024-03-04 10:23:00", DateFormat::Us).unwrap(), d(2024, 3, 4));
    }

    #[test]
    fn test_parse_date_iso_rejects_trailing_garbage() {
        assert!(parse_date("2024-03-04 banana", DateFormat::Iso).is_err());
    }

    #[test]
    fn test_parse_date_dot() {
        assert_eq!(parse_date("31.12.2024", DateFormat::Dot).unwrap(), d(2024, 12, 31));
    }

    #[test]
    fn test_parse_date_text() {
        assert_eq!(parse_date("Mar 4, 2024", DateFormat::Text).unwrap(), d(2024, 3, 4));
        assert_eq!(parse_date("4 March 2024", DateFormat::Text).unwrap(), d(2024, 3, 4));
    }

    #[test]
    fn test_parse_date_falls_back_across_formats() {
        // ISO value in a US-format run still parses via the fallback.
        assert_eq!(parse_date("2024-03-04", DateFormat::Us).unwrap(), d(2024, 3, 4));
    }

    #[test]
    fn test_parse_date_empty() {
        assert_eq!(parse_date("  ", DateFormat::Iso), Err(FieldParseError::Empty));
    }

    #[test]
    fn test_parse_date_garbage_names_expected_format() {
        let err = parse_date("soon", DateFormat::Us).unwrap_err();
        assert_eq!(
            err,
            FieldParseError::Date { raw: "soon".to_string(), expected: "MM/DD/YYYY" }
        );
    }

    #[test]
    fn test_parse_date_rejects_impossible_dates() {
        assert!(parse_date("2024-13-01", DateFormat::Iso).is_err());
        assert!(parse_date("02/30/2024", DateFormat::Us).is_err());
    }

    #[test]
    fn test_parse_amount_plain_and_us_thousands() {
        assert_eq!(parse_amount("1234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("-12.50").unwrap(), -12.50);
    }

    #[test]
    fn test_parse_amount_comma_decimal() {
        assert_eq!(parse_amount("1.234,56").unwrap(), 1234.56);
        assert_eq!(parse_amount("57,00").unwrap(), 57.0);
    }

    #[test]
    fn test_parse_amount_currency_symbols_and_quotes() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("\"500.00\"").unwrap(), 500.0);
        assert_eq!(parse_amount("-$50.00").unwrap(), -50.0);
        assert_eq!(parse_amount("1.234,56₫").unwrap(), 1234.56);
    }

    #[test]
    fn test_parse_amount_parenthesized_negative() {
        assert_eq!(parse_amount("(500.00)").unwrap(), -500.0);
        assert_eq!(parse_amount("($1,234.56)").unwrap(), -1234.56);
    }

    #[test]
    fn test_parse_amount_failures() {
        assert_eq!(parse_amount("   "), Err(FieldParseError::Empty));
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("inf").is_err());
        assert!(parse_amount("NaN").is_err());
    }
}
