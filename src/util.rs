use crate::defines::FILE_DATETIME_FORMAT;

use std::path::{Path, PathBuf};
use std::time::Instant;

/// Current UTC time formatted for dumped file names.
pub fn file_timestamp() -> String {
    chrono::Utc::now().format(FILE_DATETIME_FORMAT).to_string()
}

/// Format a price the way the broker expects it in order bodies.
/// Whole numbers keep a trailing `.0` (`1680.0`, not `1680`).
pub fn decimal_string(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Make `path` absolute against the current working directory.
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    std::path::absolute(path)
}

/// Split a comma-separated instruments list, dropping blanks.
pub fn split_instruments(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Start measuring the time used.
pub fn measure_start() -> Instant {
    Instant::now()
}

/// Log elapsed time since `start` for `operation`.
pub fn measure_end(start: &Instant, operation: &str) {
    let elapsed = start.elapsed();
    tracing::debug!(operation, elapsed_ms = elapsed.as_millis() as u64, "elapsed {:.3}s", elapsed.as_secs_f64());
}

/// Log an api error without stopping the program.
pub fn print_error_if_necessary(operation: &str, e: &crate::types::ApiError) {
    match e {
        crate::types::ApiError::ErrorApiResponse { status, body } => {
            tracing::error!(operation, status, "broker rejected request");
            println!("{}", body);
        }
        _ => tracing::error!(operation, "{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_string() {
        assert_eq!(decimal_string(1680.0), "1680.0");
        assert_eq!(decimal_string(1680.02), "1680.02");
        assert_eq!(decimal_string(1679.97), "1679.97");
        assert_eq!(decimal_string(-3.0), "-3.0");
        assert_eq!(decimal_string(0.0001), "0.0001");
    }

    #[test]
    fn test_file_timestamp_shape() {
        let ts = file_timestamp();
        let re = regex::Regex::new(r"^\d{8}-\d{6}$").unwrap();
        assert!(re.is_match(&ts), "unexpected timestamp {}", ts);
    }

    #[test]
    fn test_split_instruments() {
        assert_eq!(split_instruments("XAU_USD, EUR_USD,,"), vec!["XAU_USD", "EUR_USD"]);
        assert!(split_instruments("").is_empty());
    }

    #[test]
    fn test_absolute_path_is_absolute() {
        assert!(absolute_path(Path::new("some/relative.json")).unwrap().is_absolute());
    }
}
