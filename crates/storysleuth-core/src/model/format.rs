/// Display formatting for counts, percentages, and durations.
///
/// Counts are integers internally; floating point only appears at the
/// display boundary.
use std::time::Duration;

/// Format a count with thousand separators.
pub fn format_count(count: u64) -> String {
    if count < 1_000 {
        return count.to_string();
    }
    let s = count.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Format a percentage with one decimal place (`25.0%`).
pub fn format_percent(percent: f64) -> String {
    format!("{percent:.1}%")
}

/// Format an elapsed time for the status bar and console (`850 ms`, `4.2 s`,
/// `3m 07s`).
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1_000 {
        format!("{ms} ms")
    } else if ms < 60_000 {
        format!("{:.1} s", d.as_secs_f64())
    } else {
        let secs = d.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}
