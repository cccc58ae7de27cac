//! Human-readable byte counts

/// Format a byte count for display
///
/// Counts under 2048 are shown in bytes; larger ones are scaled by 1024
/// until below 2048 (stopping at TB) and shown with one decimal place.
/// An unknown size prints as `?`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pretty_size(size: Option<u64>) -> String {
    let Some(size) = size else {
        return "?".to_string();
    };
    if size < 2048 {
        return format!("{size} bytes");
    }

    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    let mut scaled = size as f64 / 1024.0;
    let mut unit = 0;
    while scaled >= 2048.0 && unit + 1 < UNITS.len() {
        scaled /= 1024.0;
        unit += 1;
    }
    format!("{scaled:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_size() {
        assert_eq!(pretty_size(None), "?");
        assert_eq!(pretty_size(Some(0)), "0 bytes");
        assert_eq!(pretty_size(Some(2047)), "2047 bytes");
        assert_eq!(pretty_size(Some(2048)), "2.0 KB");
        assert_eq!(pretty_size(Some(4096)), "4.0 KB");
        assert_eq!(pretty_size(Some(3 * 1024 * 1024)), "3.0 MB");
        assert_eq!(pretty_size(Some(1536 * 1024)), "1536.0 KB");
    }
}
