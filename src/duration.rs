/// Formats milliseconds as `MM:SS`, truncating partial seconds. Minutes are not wrapped into
/// hours, so long totals read e.g. `125:07`.
pub fn format_ms(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Like `format_ms`, for averaged values. Negative or non-finite input has no sensible
/// rendering and yields `N/A`.
pub fn format_ms_f64(ms: f64) -> String {
    if !ms.is_finite() || ms < 0.0 {
        return String::from("N/A");
    }
    format_ms(ms.floor() as u64)
}
