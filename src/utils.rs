// Utility functions
use serde::{Deserialize, Deserializer, de};

/// Text markers CSV exporters commonly write for a missing cell.
const MISSING_MARKERS: [&str; 7] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// Returns true when a raw CSV cell should be treated as a missing value.
pub fn is_missing_cell(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed)
}

/// Parses boolean-like text: true/false, 1/0, yes/no, any case.
pub fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "1.0" | "yes" => Some(true),
        "false" | "0" | "0.0" | "no" => Some(false),
        _ => None,
    }
}

pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| de::Error::custom(format!("invalid boolean flag: {:?}", raw)))
}

/// Rounds to two decimals, the precision reported aggregates are kept at.
/// Halves go to the even neighbour.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Minimal escaping for text interpolated into HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Formats an optional metric for display, `-` when absent.
pub fn format_optional(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_missing_markers() {
        assert!(is_missing_cell(""));
        assert!(is_missing_cell("  "));
        assert!(is_missing_cell("NaN"));
        assert!(is_missing_cell("None"));
        assert!(!is_missing_cell("0"));
        assert!(!is_missing_cell("pop"));
    }

    #[test]
    fn parses_flags_in_any_case() {
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag("FALSE"), Some(false));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(80.0), 80.0);
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(-0.005001), -0.01);
    }

    #[test]
    fn rounds_halves_to_even() {
        assert_eq!(round2(80.125), 80.12);
        assert_eq!(round2(80.375), 80.38);
        assert_eq!(round2(0.5), 0.5);
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("r&b <live>"), "r&amp;b &lt;live&gt;");
    }

    #[test]
    fn formats_absent_values_as_dash() {
        assert_eq!(format_optional(Some(3.14159), 2), "3.14");
        assert_eq!(format_optional(None, 2), "-");
    }
}
