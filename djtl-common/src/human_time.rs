//! Tracklist time formatting
//!
//! Offsets inside a DJ set are shown as `MM:SS` below one hour and
//! `HH:MM:SS` above it. CUE sheets use `MM:SS:FF` with minutes unbounded
//! and 75 frames per second.

/// CUE sheet frames per second
pub const CUE_FRAMES_PER_SECOND: u64 = 75;

/// Format an offset in seconds as `MM:SS` or `HH:MM:SS`.
///
/// Fractional seconds are truncated. Negative or non-finite input is
/// treated as zero.
///
/// # Examples
///
/// ```
/// use djtl_common::human_time::format_timestamp;
///
/// assert_eq!(format_timestamp(0.0), "00:00");
/// assert_eq!(format_timestamp(330.0), "05:30");
/// assert_eq!(format_timestamp(3661.0), "01:01:01");
/// ```
pub fn format_timestamp(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Format an offset as a CUE `INDEX` value (`MM:SS:FF`).
///
/// # Examples
///
/// ```
/// use djtl_common::human_time::format_cue_index;
///
/// assert_eq!(format_cue_index(0.0), "00:00:00");
/// assert_eq!(format_cue_index(3661.0), "61:01:00");
/// assert_eq!(format_cue_index(1.5), "00:01:37");
/// ```
pub fn format_cue_index(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 { seconds } else { 0.0 };
    let total_frames = (seconds * CUE_FRAMES_PER_SECOND as f64).floor() as u64;
    let frames = total_frames % CUE_FRAMES_PER_SECOND;
    let total_secs = total_frames / CUE_FRAMES_PER_SECOND;

    format!("{:02}:{:02}:{:02}", total_secs / 60, total_secs % 60, frames)
}

fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_offsets_use_minutes() {
        assert_eq!(format_timestamp(5.0), "00:05");
        assert_eq!(format_timestamp(59.9), "00:59");
        assert_eq!(format_timestamp(3599.0), "59:59");
    }

    #[test]
    fn test_long_offsets_use_hours() {
        assert_eq!(format_timestamp(3600.0), "01:00:00");
        assert_eq!(format_timestamp(7384.0), "02:03:04");
    }

    #[test]
    fn test_invalid_input_clamps_to_zero() {
        assert_eq!(format_timestamp(-12.0), "00:00");
        assert_eq!(format_timestamp(f64::NAN), "00:00");
        assert_eq!(format_cue_index(f64::INFINITY), "00:00:00");
    }

    #[test]
    fn test_cue_minutes_are_unbounded() {
        // Two hours into a set is still expressed in minutes
        assert_eq!(format_cue_index(7200.0), "120:00:00");
    }
}
