//! BCD field transcoders.
//!
//! CI-V carries every numeric field as packed binary-coded decimal: each
//! byte holds two decimal digits, tens in the high nibble and units in the
//! low nibble. Multi-byte fields differ in byte order:
//!
//! | Field     | Width | Layout                                   |
//! |-----------|-------|------------------------------------------|
//! | frequency | 5     | least significant digit pair first       |
//! | date      | 4     | `[century+decade, year, month, day]`     |
//! | time      | 2     | `[hour, minute]`                         |
//!
//! All conversions here are nibble arithmetic on the bytes themselves.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use civctl_core::error::{Error, Result};

/// Pack a value in `0..=99` into one BCD byte. Caller guarantees the range.
fn pack(value: u32) -> u8 {
    debug_assert!(value < 100);
    (((value / 10) as u8) << 4) | (value % 10) as u8
}

/// Pack a decimal value in `0..=99` into one BCD byte.
///
/// # Example
///
/// ```
/// use civctl_icom::bcd::to_bcd;
///
/// assert_eq!(to_bcd(25).unwrap(), 0x25);
/// assert_eq!(to_bcd(7).unwrap(), 0x07);
/// assert!(to_bcd(100).is_err());
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for values above 99.
pub fn to_bcd(value: u8) -> Result<u8> {
    if value > 99 {
        return Err(Error::InvalidParameter(format!(
            "{value} does not fit in one BCD byte"
        )));
    }
    Ok(pack(u32::from(value)))
}

/// Unpack one BCD byte into its decimal value.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if either nibble is above 9.
pub fn from_bcd(byte: u8) -> Result<u8> {
    let hi = byte >> 4;
    let lo = byte & 0x0F;
    if hi > 9 || lo > 9 {
        return Err(Error::Protocol(format!("invalid BCD byte: 0x{byte:02X}")));
    }
    Ok(hi * 10 + lo)
}

/// Validate that raw bytes contain only valid BCD digits (0-9 in each nibble).
pub fn validate_bcd(bcd: &[u8]) -> Result<()> {
    for (i, &byte) in bcd.iter().enumerate() {
        let lo = byte & 0x0F;
        let hi = (byte >> 4) & 0x0F;
        if lo > 9 || hi > 9 {
            return Err(Error::Protocol(format!(
                "invalid BCD digit at byte {i}: 0x{byte:02X}"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------
// Frequency
// ---------------------------------------------------------------

/// Convert a frequency in hertz to 5-byte BCD (least significant byte first).
///
/// Only the lowest ten decimal digits are representable; higher digits are
/// dropped.
///
/// # Example
///
/// ```
/// use civctl_icom::bcd::freq_to_bcd;
///
/// // 14.250 MHz = 14,250,000 Hz
/// assert_eq!(freq_to_bcd(14_250_000), [0x00, 0x00, 0x25, 0x14, 0x00]);
/// ```
pub fn freq_to_bcd(freq_hz: u64) -> [u8; 5] {
    let mut result = [0u8; 5];
    let mut freq = freq_hz;

    for byte in &mut result {
        let lo = (freq % 10) as u8;
        freq /= 10;
        let hi = (freq % 10) as u8;
        freq /= 10;
        *byte = (hi << 4) | lo;
    }

    result
}

/// Convert 5-byte BCD (least significant byte first) back to hertz.
///
/// Reversing the byte order turns the wire bytes into the natural
/// left-to-right decimal reading: `00 14 00 30 00` becomes `0030001400`.
///
/// # Example
///
/// ```
/// use civctl_icom::bcd::bcd_to_freq;
///
/// assert_eq!(bcd_to_freq(&[0x00, 0x14, 0x00, 0x30, 0x00]), 30_001_400);
/// ```
///
/// Nibbles above 9 are not rejected here; run [`validate_bcd`] first when
/// the bytes come off the wire.
pub fn bcd_to_freq(bcd: &[u8; 5]) -> u64 {
    bcd.iter().rev().fold(0u64, |acc, &byte| {
        let hi = u64::from(byte >> 4);
        let lo = u64::from(byte & 0x0F);
        acc * 100 + hi * 10 + lo
    })
}

// ---------------------------------------------------------------
// Time of day
// ---------------------------------------------------------------

/// Encode a time of day as `[hour, minute]` BCD. Seconds are dropped.
///
/// ```
/// use chrono::NaiveTime;
/// use civctl_icom::bcd::encode_time;
///
/// let t = NaiveTime::from_hms_opt(7, 5, 59).unwrap();
/// assert_eq!(encode_time(t), [0x07, 0x05]);
/// ```
pub fn encode_time(time: NaiveTime) -> [u8; 2] {
    [pack(time.hour()), pack(time.minute())]
}

/// Decode `[hour, minute]` BCD into a time of day (seconds zero).
///
/// # Errors
///
/// Returns [`Error::Protocol`] on invalid BCD or an impossible time.
pub fn decode_time(bcd: &[u8; 2]) -> Result<NaiveTime> {
    let hour = from_bcd(bcd[0])?;
    let minute = from_bcd(bcd[1])?;
    NaiveTime::from_hms_opt(u32::from(hour), u32::from(minute), 0).ok_or_else(|| {
        Error::Protocol(format!("radio reported impossible time {hour:02}:{minute:02}"))
    })
}

// ---------------------------------------------------------------
// Calendar date
// ---------------------------------------------------------------

/// Encode a date as `[year / 100, year % 100, month, day]` BCD.
///
/// ```
/// use chrono::NaiveDate;
/// use civctl_icom::bcd::encode_date;
///
/// let d = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
/// assert_eq!(encode_date(d).unwrap(), [0x20, 0x25, 0x06, 0x01]);
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for years outside `0..=9999`.
pub fn encode_date(date: NaiveDate) -> Result<[u8; 4]> {
    let year = u32::try_from(date.year())
        .ok()
        .filter(|y| *y <= 9999)
        .ok_or_else(|| {
            Error::InvalidParameter(format!("year {} cannot be sent to the radio", date.year()))
        })?;
    Ok([
        pack(year / 100),
        pack(year % 100),
        pack(date.month()),
        pack(date.day()),
    ])
}

/// Decode `[year / 100, year % 100, month, day]` BCD into a date.
///
/// # Errors
///
/// Returns [`Error::Protocol`] on invalid BCD or an impossible date.
pub fn decode_date(bcd: &[u8; 4]) -> Result<NaiveDate> {
    let century = from_bcd(bcd[0])?;
    let year_in_century = from_bcd(bcd[1])?;
    let month = from_bcd(bcd[2])?;
    let day = from_bcd(bcd[3])?;
    let year = i32::from(century) * 100 + i32::from(year_in_century);
    NaiveDate::from_ymd_opt(year, u32::from(month), u32::from(day)).ok_or_else(|| {
        Error::Protocol(format!(
            "radio reported impossible date {day:02}-{month:02}-{year:04}"
        ))
    })
}
