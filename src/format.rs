//! Human readable byte and rate formatting

/// Format bytes as human readable string
///
/// Negative counts are shown as-is in bytes.
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format a rate in bytes per second
///
/// Rates below one byte per second have nothing meaningful to show and
/// fall back to `0 MB/s`.
pub fn format_speed(bps: f64) -> String {
    let whole = bps as i64;
    if whole == 0 {
        return "0 MB/s".to_string();
    }
    format!("{}/s", format_bytes(whole))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
        assert_eq!(format_bytes(1073741824), "1.0 GB");
        assert_eq!(format_bytes(1099511627776), "1.0 TB");
    }

    #[test]
    fn test_format_bytes_negative() {
        assert_eq!(format_bytes(-5), "-5 B");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(0.0), "0 MB/s");
        assert_eq!(format_speed(0.4), "0 MB/s");
        assert_eq!(format_speed(1024.0), "1.0 KB/s");
        assert_eq!(format_speed(1048576.0), "1.0 MB/s");
    }

    #[test]
    fn test_format_speed_nan() {
        // `as` saturates NaN to zero
        assert_eq!(format_speed(f64::NAN), "0 MB/s");
    }
}
