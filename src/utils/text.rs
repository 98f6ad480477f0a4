//! Extraction of labeled values from free-form workload output

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{BenchError, BenchResult};

/// Leading decimal number, optionally signed and in exponent notation
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?").expect("number pattern is valid")
});

/// Find the first line whose trimmed content starts with `prefix` and
/// return the remainder of that line, trimmed.
///
/// ```
/// use cribench::utils::find_prefixed_line;
///
/// let logs = b"General statistics:\n    total time:   10.0634s\n";
/// assert_eq!(find_prefixed_line(logs, "total time:").unwrap(), "10.0634s");
/// ```
pub fn find_prefixed_line(text: &[u8], prefix: &str) -> BenchResult<String> {
    String::from_utf8_lossy(text)
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(prefix))
        .map(|rest| rest.trim().to_string())
        .ok_or_else(|| BenchError::Extraction {
            prefix: prefix.to_string(),
        })
}

/// Like [`find_prefixed_line`], but parse the leading number of the value.
///
/// Units and trailing annotations are ignored, so `10.0634s` yields
/// `10.0634` and `102400 (10234.5 per second)` yields `102400`.
pub fn parse_prefixed_value(text: &[u8], prefix: &str) -> BenchResult<f64> {
    let value = find_prefixed_line(text, prefix)?;

    LEADING_NUMBER
        .find(&value)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or_else(|| BenchError::Parse {
            prefix: prefix.to_string(),
            value,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSBENCH_CPU: &str = "\
sysbench 1.0.20 (using bundled LuaJIT 2.1.0-beta2)

CPU speed:
    events per second:   993.52

General statistics:
    total time:                          10.0634s
    total number of events:              9999

Latency (ms):
         min:                                    0.97
         avg:                                    1.00
         max:                                    2.31
";

    #[test]
    fn test_find_prefixed_line_trims() {
        let value = find_prefixed_line(SYSBENCH_CPU.as_bytes(), "total time:").unwrap();
        assert_eq!(value, "10.0634s");
    }

    #[test]
    fn test_find_returns_first_match() {
        let text = b"avg: 1\navg: 2\n";
        assert_eq!(find_prefixed_line(text, "avg:").unwrap(), "1");
    }

    #[test]
    fn test_missing_prefix_is_extraction_error() {
        let err = find_prefixed_line(SYSBENCH_CPU.as_bytes(), "total operations:").unwrap_err();
        assert!(matches!(err, BenchError::Extraction { ref prefix } if prefix == "total operations:"));
    }

    #[test]
    fn test_parse_prefixed_value_strips_units() {
        let text = SYSBENCH_CPU.as_bytes();
        assert_eq!(parse_prefixed_value(text, "total time:").unwrap(), 10.0634);
        assert_eq!(parse_prefixed_value(text, "min:").unwrap(), 0.97);
        assert_eq!(parse_prefixed_value(text, "max:").unwrap(), 2.31);
    }

    #[test]
    fn test_parse_prefixed_value_ignores_annotations() {
        let text = b"Total operations: 102400 (10234.50 per second)\n";
        assert_eq!(parse_prefixed_value(text, "Total operations:").unwrap(), 102400.0);
    }

    #[test]
    fn test_non_numeric_value_is_parse_error() {
        let err = parse_prefixed_value(b"total time: unknown\n", "total time:").unwrap_err();
        assert_eq!(err.error_code(), "PARSE_ERROR");
    }
}
