//! Formatting helpers for values read from the radio.
//!
//! Small utilities the CLI (and most other callers) need to present
//! decoded values the way operators expect to read them.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

/// Format a frequency in hertz as a human-readable MHz string.
///
/// # Example
///
/// ```
/// use civctl_core::format_freq_mhz;
///
/// assert_eq!(format_freq_mhz(14_074_000), "14.074000 MHz");
/// assert_eq!(format_freq_mhz(30_001_400), "30.001400 MHz");
/// ```
pub fn format_freq_mhz(freq_hz: u64) -> String {
    let mhz = freq_hz as f64 / 1_000_000.0;
    format!("{mhz:.6} MHz")
}

/// Format a time of day as zero-padded `HHMM`, the way the radio's clock
/// menu shows it.
///
/// # Example
///
/// ```
/// use chrono::NaiveTime;
/// use civctl_core::format_hhmm;
///
/// let t = NaiveTime::from_hms_opt(7, 5, 0).unwrap();
/// assert_eq!(format_hhmm(t), "0705");
/// ```
pub fn format_hhmm(time: NaiveTime) -> String {
    format!("{:02}{:02}", time.hour(), time.minute())
}

/// Format a calendar date as `DD-MM-YYYY`.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use civctl_core::format_dmy;
///
/// let d = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
/// assert_eq!(format_dmy(d), "09-03-2025");
/// ```
pub fn format_dmy(date: NaiveDate) -> String {
    format!("{:02}-{:02}-{:04}", date.day(), date.month(), date.year())
}
