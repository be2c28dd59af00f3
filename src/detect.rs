use std::sync::LazyLock;

use regex::Regex;

/// Date layouts a statement can use. `Auto` is only a request: before any row
/// is parsed it resolves to a concrete format, which then holds for the whole
/// run so identical raw strings never parse two different ways in one import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateFormat {
    /// YYYY-MM-DD or YYYY/MM/DD
    Iso,
    /// MM/DD/YYYY
    Us,
    /// DD/MM/YYYY, common to most of Europe and Vietnam
    EuVn,
    /// DD/MM/YYYY (parsed identically to EuVn; separate key for users who
    /// think of their bank as British rather than continental)
    Uk,
    /// DD.MM.YYYY
    Dot,
    /// Alphabetic month, e.g. "Mar 4, 2024" or "4 March 2024"
    Text,
    Auto,
}

impl DateFormat {
    pub fn from_key(key: &str) -> Option<DateFormat> {
        match key.to_lowercase().as_str() {
            "iso" => Some(DateFormat::Iso),
            "us" => Some(DateFormat::Us),
            "eu" | "vn" => Some(DateFormat::EuVn),
            "uk" => Some(DateFormat::Uk),
            "dot" => Some(DateFormat::Dot),
            "text" => Some(DateFormat::Text),
            "auto" => Some(DateFormat::Auto),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            DateFormat::Iso => "iso",
            DateFormat::Us => "us",
            DateFormat::EuVn => "eu",
            DateFormat::Uk => "uk",
            DateFormat::Dot => "dot",
            DateFormat::Text => "text",
            DateFormat::Auto => "auto",
        }
    }

    /// What a value in this format looks like, for error messages.
    pub fn expected(&self) -> &'static str {
        match self {
            DateFormat::Iso => "YYYY-MM-DD",
            DateFormat::Us => "MM/DD/YYYY",
            DateFormat::EuVn => "DD/MM/YYYY",
            DateFormat::Uk => "DD/MM/YYYY",
            DateFormat::Dot => "DD.MM.YYYY",
            DateFormat::Text => "a date with a month name",
            DateFormat::Auto => "a date",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DateFormatDetection {
    pub format: DateFormat,
    /// Share of non-empty samples that voted for the winner, 0..1.
    pub confidence: f64,
    pub samples: Vec<String>,
}

static ISO_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}").unwrap());
static SLASH_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[-/]\d{1,2}[-/]\d{4}$").unwrap());
static DOT_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}\.\d{1,2}\.\d{4}$").unwrap());

/// One sample's vote. The `> 12` rule is the documented lossy heuristic: a
/// first group that cannot be a month forces day-first, while an ambiguous
/// value like "03/04/2024" votes US and the run-level plurality decides.
fn vote(sample: &str) -> Option<DateFormat> {
    if ISO_SHAPE.is_match(sample) {
        return Some(DateFormat::Iso);
    }
    if DOT_SHAPE.is_match(sample) {
        return Some(DateFormat::Dot);
    }
    if let Some(caps) = SLASH_SHAPE.captures(sample) {
        let first: u32 = caps[1].parse().ok()?;
        if first > 12 {
            return Some(DateFormat::EuVn);
        }
        return Some(DateFormat::Us);
    }
    if sample.chars().any(|c| c.is_ascii_alphabetic()) {
        return Some(DateFormat::Text);
    }
    None
}

/// Guess the date layout from sampled cell values. Plurality of per-sample
/// votes wins; ties resolve in the fixed order ISO > US > EU/VN > DOT > TEXT.
/// Advisory only: the caller locks the result for the entire run.
pub fn detect(samples: &[&str]) -> DateFormatDetection {
    const TIE_ORDER: [DateFormat; 5] = [
        DateFormat::Iso,
        DateFormat::Us,
        DateFormat::EuVn,
        DateFormat::Dot,
        DateFormat::Text,
    ];

    let non_empty: Vec<&str> = samples
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    let mut votes = std::collections::HashMap::new();
    for sample in &non_empty {
        if let Some(format) = vote(sample) {
            *votes.entry(format).or_insert(0usize) += 1;
        }
    }

    let mut winner = DateFormat::Iso;
    let mut best = 0usize;
    for format in TIE_ORDER {
        let count = votes.get(&format).copied().unwrap_or(0);
        if count > best {
            winner = format;
            best = count;
        }
    }

    let confidence = if non_empty.is_empty() {
        0.0
    } else {
        best as f64 / non_empty.len() as f64
    };

    DateFormatDetection {
        format: winner,
        confidence,
        samples: non_empty.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_iso() {
        let d = detect(&["2024-03-04", "2024-12-31", "2024/01/05"]);
        assert_eq!(d.format, DateFormat::Iso);
        assert_eq!(d.confidence, 1.0);
    }

    #[test]
    fn test_detect_us_when_first_group_fits_a_month() {
        let d = detect(&["03/04/2024", "12/31/2024"]);
        assert_eq!(d.format, DateFormat::Us);
    }

    #[test]
    fn test_detect_day_first_when_first_group_exceeds_twelve() {
        let d = detect(&["31/12/2024", "15/01/2024", "04/07/2024"]);
        assert_eq!(d.format, DateFormat::EuVn);
        assert!((d.confidence - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_detect_dot() {
        let d = detect(&["31.12.2024", "04.03.2024"]);
        assert_eq!(d.format, DateFormat::Dot);
    }

    #[test]
    fn test_detect_text() {
        let d = detect(&["Mar 4, 2024", "4 March 2024"]);
        assert_eq!(d.format, DateFormat::Text);
    }

    #[test]
    fn test_detect_ignores_empty_samples() {
        let d = detect(&["", "  ", "2024-03-04"]);
        assert_eq!(d.format, DateFormat::Iso);
        assert_eq!(d.confidence, 1.0);
        assert_eq!(d.samples, vec!["2024-03-04"]);
    }

    #[test]
    fn test_detected_iso_timestamps_then_parse() {
        // The ISO shape check is prefix-only, so timestamp columns vote ISO;
        // the parser must then accept the same values.
        let samples = ["2024-03-04 10:23:00", "2024-03-05 09:00:00"];
        let d = detect(&samples);
        assert_eq!(d.format, DateFormat::Iso);
        assert_eq!(d.confidence, 1.0);
        for sample in samples {
            assert!(crate::normalize::parse_date(sample, d.format).is_ok(), "{sample}");
        }
    }

    #[test]
    fn test_detect_tie_breaks_toward_iso_then_us() {
        // One ISO vote, one US vote: ISO wins the tie by order.
        let d = detect(&["2024-03-04", "03/04/2024"]);
        assert_eq!(d.format, DateFormat::Iso);
        assert_eq!(d.confidence, 0.5);
    }

    #[test]
    fn test_detect_no_votes() {
        let d = detect(&["???", "12345678"]);
        assert_eq!(d.format, DateFormat::Iso);
        assert_eq!(d.confidence, 0.0);
    }
}
