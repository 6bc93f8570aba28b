// src/utils/time.rs

/// Renders whole seconds as a zero-padded `MM:SS` clock.
/// Minutes keep growing past 59 rather than rolling into hours.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(3725), "62:05");
    }
}
