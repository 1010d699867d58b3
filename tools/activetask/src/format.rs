/// `HH:MM:SS` from milliseconds. Hours are not wrapped at 24; negatives print as zero.
pub fn format_duration_ms(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1_000;
    let seconds = total_seconds % 60;
    let minutes = (total_seconds / 60) % 60;
    let hours = total_seconds / 3_600;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_duration_ms(3_725_000), "01:02:05");
        assert_eq!(format_duration_ms(0), "00:00:00");
        assert_eq!(format_duration_ms(59_999), "00:00:59");
    }

    #[test]
    fn hours_are_unbounded() {
        assert_eq!(format_duration_ms(100 * 3_600_000 + 61_000), "100:01:01");
    }

    #[test]
    fn negative_durations_clamp_to_zero() {
        assert_eq!(format_duration_ms(-5_000), "00:00:00");
    }
}
