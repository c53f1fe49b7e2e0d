//! Duration Formatting

/// Format a duration in seconds with a unit that keeps 3-4 significant
/// digits.
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.001 {
        format!("{:.1} µs", seconds * 1_000_000.0)
    } else if seconds < 1.0 {
        format!("{:.1} ms", seconds * 1_000.0)
    } else if seconds < 60.0 {
        format!("{:.2} s", seconds)
    } else {
        format!("{:.1} min", seconds / 60.0)
    }
}
