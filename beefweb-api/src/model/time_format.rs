//! Clock-style formatting for playback positions given in seconds

/// Format seconds as zero-padded `hh:mm:ss`
pub fn format_hhmmss(total_seconds: f64) -> String {
    let total = whole_seconds(total_seconds);
    let (hours, rest) = (total / 3600, total % 3600);
    format!("{:02}:{:02}:{:02}", hours, rest / 60, rest % 60)
}

/// Format seconds as `m:ss`, letting minutes grow past 59
pub fn format_mmss(total_seconds: f64) -> String {
    let total = whole_seconds(total_seconds);
    format!("{}:{:02}", total / 60, total % 60)
}

fn whole_seconds(total_seconds: f64) -> u64 {
    if total_seconds.is_finite() && total_seconds > 0.0 {
        total_seconds.floor() as u64
    } else {
        0
    }
}
