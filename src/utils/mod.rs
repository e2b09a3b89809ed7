use chrono::Utc;
use regex::Regex;
use std::sync::LazyLock;

static RE_DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*").unwrap());

pub const MIN_NUMBER_DIGITS: usize = 3;

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Numeric value of the last digit run in `value`, ignoring thousands
/// separators. Anything unusable yields 0.
pub fn extract_numeric_value(value: Option<&str>) -> u64 {
    let Some(value) = value else {
        return 0;
    };

    RE_DIGIT_RUN
        .find_iter(value)
        .last()
        .map(|run| run.as_str().replace(',', ""))
        .and_then(|digits| digits.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Zero-pads `n` to `min_digits`; values from 1000 up get comma grouping.
pub fn format_with_padding(n: u64, min_digits: usize) -> String {
    let padded = format!("{:0>width$}", n, width = min_digits);
    if n < 1000 {
        return padded;
    }
    group_thousands(&padded)
}

pub fn format_document_number(prefix: &str, n: u64) -> String {
    format!("{}-{}", prefix, format_with_padding(n, MIN_NUMBER_DIGITS))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_handles_missing_and_empty() {
        assert_eq!(extract_numeric_value(None), 0);
        assert_eq!(extract_numeric_value(Some("")), 0);
        assert_eq!(extract_numeric_value(Some("no-digits-here")), 0);
    }

    #[test]
    fn extract_reads_formatted_numbers() {
        assert_eq!(extract_numeric_value(Some("PAY-001")), 1);
        assert_eq!(extract_numeric_value(Some("PAY-1,000")), 1000);
        assert_eq!(extract_numeric_value(Some("INV-12,345")), 12345);
    }

    #[test]
    fn extract_takes_last_digit_run() {
        assert_eq!(extract_numeric_value(Some("2024-INV-017")), 17);
        assert_eq!(extract_numeric_value(Some("F1-PAY-009")), 9);
    }

    #[test]
    fn extract_degrades_on_overflow() {
        assert_eq!(extract_numeric_value(Some("PAY-99999999999999999999999")), 0);
    }

    #[test]
    fn padding_below_one_thousand() {
        assert_eq!(format_with_padding(1, 3), "001");
        assert_eq!(format_with_padding(42, 3), "042");
        assert_eq!(format_with_padding(999, 3), "999");
        assert_eq!(format_with_padding(7, 5), "00007");
    }

    #[test]
    fn padding_groups_thousands() {
        assert_eq!(format_with_padding(1000, 3), "1,000");
        assert_eq!(format_with_padding(12345, 3), "12,345");
        assert_eq!(format_with_padding(1234567, 3), "1,234,567");
    }

    #[test]
    fn formatted_numbers_parse_back() {
        for n in [1, 10, 999, 1000, 65536, 1_000_000] {
            let formatted = format_document_number("PAY", n);
            assert_eq!(extract_numeric_value(Some(&formatted)), n, "{formatted}");
        }
    }
}
