//! CI-V command builders and response parsers.
//!
//! The supported operations form a fixed catalog ([`Operation`]); each one
//! pairs a request template ([`CommandSpec`]) with a response decode rule
//! (one of the `parse_*_response` functions).
//!
//! All functions here are pure. Sending the bytes and reading the reply is
//! the job of [`CivRadio`](crate::radio::CivRadio).

use std::fmt;

use chrono::{NaiveDate, NaiveTime};

use civctl_core::error::Result;
use civctl_core::types::{CivAddress, Mode};

use crate::bcd::{bcd_to_freq, decode_date, decode_time, encode_date, encode_time, validate_bcd};
use crate::civ::{encode_frame, Response};

// ---------------------------------------------------------------
// CI-V command/sub-command constants
// ---------------------------------------------------------------

/// Read operating frequency (cmd 0x03). No sub-command, no data.
const CMD_READ_FREQ: u8 = 0x03;

/// Read operating mode (cmd 0x04). No sub-command, no data.
const CMD_READ_MODE: u8 = 0x04;

/// Various read/set operations (cmd 0x1A).
const CMD_MISC: u8 = 0x1A;

/// Menu item access under CMD_MISC. Followed by a 2-byte menu number.
const SUB_MENU: u8 = 0x05;

/// IC-7300 menu item for the clock date.
const MENU_DATE: [u8; 2] = [0x00, 0x94];

/// IC-7300 menu item for the clock time.
const MENU_TIME: [u8; 2] = [0x00, 0x95];

/// Request template for one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Command byte.
    pub cmd: u8,
    /// Sub-command byte, if the command has one.
    pub sub_cmd: Option<u8>,
    /// Fixed bytes that follow the sub-command (e.g. a menu item number).
    pub prefix: &'static [u8],
}

impl CommandSpec {
    /// Build the full request frame, appending `data` after the prefix.
    pub fn frame(&self, addr: CivAddress, data: &[u8]) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.prefix.len() + data.len());
        payload.extend_from_slice(self.prefix);
        payload.extend_from_slice(data);
        encode_frame(addr.radio, addr.controller, self.cmd, self.sub_cmd, &payload)
    }
}

/// Clock time menu access.
pub const TIME: CommandSpec = CommandSpec {
    cmd: CMD_MISC,
    sub_cmd: Some(SUB_MENU),
    prefix: &MENU_TIME,
};

/// Clock date menu access.
pub const DATE: CommandSpec = CommandSpec {
    cmd: CMD_MISC,
    sub_cmd: Some(SUB_MENU),
    prefix: &MENU_DATE,
};

/// Operating frequency read.
pub const FREQUENCY: CommandSpec = CommandSpec {
    cmd: CMD_READ_FREQ,
    sub_cmd: None,
    prefix: &[],
};

/// Operating mode read.
pub const MODE: CommandSpec = CommandSpec {
    cmd: CMD_READ_MODE,
    sub_cmd: None,
    prefix: &[],
};

/// The supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadTime,
    SetTime,
    ReadDate,
    SetDate,
    ReadFrequency,
    ReadMode,
}

impl Operation {
    /// The request template for this operation.
    pub fn spec(&self) -> CommandSpec {
        match self {
            Operation::ReadTime | Operation::SetTime => TIME,
            Operation::ReadDate | Operation::SetDate => DATE,
            Operation::ReadFrequency => FREQUENCY,
            Operation::ReadMode => MODE,
        }
    }

    /// Returns `true` if the radio answers this operation with data.
    pub fn is_read(&self) -> bool {
        !matches!(self, Operation::SetTime | Operation::SetDate)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::ReadTime => "read-time",
            Operation::SetTime => "set-time",
            Operation::ReadDate => "read-date",
            Operation::SetDate => "set-date",
            Operation::ReadFrequency => "read-frequency",
            Operation::ReadMode => "read-mode",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------
// Command builders
// ---------------------------------------------------------------

/// Build a "read clock time" command (1A 05 00 95).
pub fn cmd_read_time(addr: CivAddress) -> Vec<u8> {
    TIME.frame(addr, &[])
}

/// Build a "set clock time" command. Hour and minute are sent as BCD.
pub fn cmd_set_time(addr: CivAddress, time: NaiveTime) -> Vec<u8> {
    TIME.frame(addr, &encode_time(time))
}

/// Build a "read clock date" command (1A 05 00 94).
pub fn cmd_read_date(addr: CivAddress) -> Vec<u8> {
    DATE.frame(addr, &[])
}

/// Build a "set clock date" command.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`](civctl_core::Error::InvalidParameter)
/// for years outside `0..=9999`.
pub fn cmd_set_date(addr: CivAddress, date: NaiveDate) -> Result<Vec<u8>> {
    Ok(DATE.frame(addr, &encode_date(date)?))
}

/// Build a "read frequency" command (03).
pub fn cmd_read_frequency(addr: CivAddress) -> Vec<u8> {
    FREQUENCY.frame(addr, &[])
}

/// Build a "read mode" command (04).
pub fn cmd_read_mode(addr: CivAddress) -> Vec<u8> {
    MODE.frame(addr, &[])
}

// ---------------------------------------------------------------
// Response parsers
// ---------------------------------------------------------------

/// Parse a frequency response: the last 5 bytes, LSB-first BCD, in hertz.
///
/// # Errors
///
/// Returns [`Error::Protocol`](civctl_core::Error::Protocol) if the response
/// is too short or contains invalid BCD digits.
pub fn parse_frequency_response(resp: &Response) -> Result<u64> {
    let tail = resp.tail(5)?;
    validate_bcd(tail)?;
    let mut bcd = [0u8; 5];
    bcd.copy_from_slice(tail);
    Ok(bcd_to_freq(&bcd))
}

/// Parse a mode response.
///
/// The reply ends `<mode> <filter>`; the filter width is ignored. Unknown
/// mode bytes come back as [`Mode::Unknown`], never as an error.
pub fn parse_mode_response(resp: &Response) -> Result<Mode> {
    let tail = resp.tail(2)?;
    Ok(Mode::from_code(tail[0]))
}

/// Parse a clock time response: the last 2 bytes are hour and minute.
pub fn parse_time_response(resp: &Response) -> Result<NaiveTime> {
    let tail = resp.tail(2)?;
    decode_time(&[tail[0], tail[1]])
}

/// Parse a clock date response: the last 4 bytes are
/// `[century+decade, year, month, day]`.
pub fn parse_date_response(resp: &Response) -> Result<NaiveDate> {
    let tail = resp.tail(4)?;
    decode_date(&[tail[0], tail[1], tail[2], tail[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use civctl_core::Error;

    fn ic7300() -> CivAddress {
        CivAddress::new(0x94, 0xE0)
    }

    // ---------------------------------------------------------------
    // Command building
    // ---------------------------------------------------------------

    #[test]
    fn read_time_frame() {
        assert_eq!(
            cmd_read_time(ic7300()),
            vec![0xFE, 0xFE, 0x94, 0xE0, 0x1A, 0x05, 0x00, 0x95, 0xFD]
        );
    }

    #[test]
    fn set_time_frame() {
        let t = NaiveTime::from_hms_opt(9, 3, 0).unwrap();
        assert_eq!(
            cmd_set_time(ic7300(), t),
            vec![0xFE, 0xFE, 0x94, 0xE0, 0x1A, 0x05, 0x00, 0x95, 0x09, 0x03, 0xFD]
        );
    }

    #[test]
    fn read_date_frame() {
        assert_eq!(
            cmd_read_date(ic7300()),
            vec![0xFE, 0xFE, 0x94, 0xE0, 0x1A, 0x05, 0x00, 0x94, 0xFD]
        );
    }

    #[test]
    fn set_date_frame() {
        let d = NaiveDate::from_ymd_opt(2025, 11, 30).unwrap();
        assert_eq!(
            cmd_set_date(ic7300(), d).unwrap(),
            vec![0xFE, 0xFE, 0x94, 0xE0, 0x1A, 0x05, 0x00, 0x94, 0x20, 0x25, 0x11, 0x30, 0xFD]
        );
    }

    #[test]
    fn read_frequency_and_mode_frames() {
        let addr = CivAddress::new(0x94, 0xC0);
        assert_eq!(
            cmd_read_frequency(addr),
            vec![0xFE, 0xFE, 0x94, 0xC0, 0x03, 0xFD]
        );
        assert_eq!(cmd_read_mode(addr), vec![0xFE, 0xFE, 0x94, 0xC0, 0x04, 0xFD]);
    }

    #[test]
    fn catalog_frames_never_carry_framing_bytes_in_payload() {
        let t = NaiveTime::from_hms_opt(23, 59, 0).unwrap();
        let d = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();
        let frames = [
            cmd_read_time(ic7300()),
            cmd_set_time(ic7300(), t),
            cmd_read_date(ic7300()),
            cmd_set_date(ic7300(), d).unwrap(),
            cmd_read_frequency(ic7300()),
            cmd_read_mode(ic7300()),
        ];
        for frame in frames {
            let body = &frame[4..frame.len() - 1];
            assert!(!body.contains(&0xFE) && !body.contains(&0xFD), "{frame:02X?}");
        }
    }

    #[test]
    fn operation_catalog() {
        assert!(Operation::ReadTime.is_read());
        assert!(Operation::ReadMode.is_read());
        assert!(!Operation::SetTime.is_read());
        assert!(!Operation::SetDate.is_read());
        assert_eq!(Operation::SetTime.spec(), TIME);
        assert_eq!(Operation::ReadDate.spec(), DATE);
        assert_eq!(Operation::ReadFrequency.spec().sub_cmd, None);
        assert_eq!(Operation::ReadMode.to_string(), "read-mode");
    }

    // ---------------------------------------------------------------
    // Response parsing
    // ---------------------------------------------------------------

    #[test]
    fn parse_frequency_from_full_body() {
        let resp = Response::new(vec![0xE0, 0x94, 0x03, 0x00, 0x14, 0x00, 0x30, 0x00]);
        assert_eq!(parse_frequency_response(&resp).unwrap(), 30_001_400);
    }

    #[test]
    fn parse_frequency_14_074_mhz() {
        let resp = Response::new(vec![0xE0, 0x94, 0x03, 0x00, 0x40, 0x07, 0x14, 0x00]);
        assert_eq!(parse_frequency_response(&resp).unwrap(), 14_074_000);
    }

    #[test]
    fn parse_frequency_invalid_bcd() {
        let resp = Response::new(vec![0xE0, 0x94, 0x03, 0x00, 0x4A, 0x07, 0x14, 0x00]);
        assert!(matches!(
            parse_frequency_response(&resp),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn parse_frequency_too_short() {
        let resp = Response::new(vec![0x14, 0x00]);
        assert!(matches!(
            parse_frequency_response(&resp),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn parse_mode_usb_ignores_filter() {
        let resp = Response::new(vec![0xE0, 0x94, 0x04, 0x01, 0x02]);
        assert_eq!(parse_mode_response(&resp).unwrap(), Mode::USB);
    }

    #[test]
    fn parse_mode_data_u() {
        let resp = Response::new(vec![0xE0, 0x94, 0x04, 0x18, 0x01]);
        assert_eq!(parse_mode_response(&resp).unwrap(), Mode::DataU);
    }

    #[test]
    fn parse_mode_unknown_code_is_not_an_error() {
        let resp = Response::new(vec![0xE0, 0x94, 0x04, 0xFF, 0x01]);
        assert_eq!(parse_mode_response(&resp).unwrap(), Mode::Unknown(0xFF));
    }

    #[test]
    fn parse_mode_too_short() {
        let resp = Response::new(vec![0x01]);
        assert!(matches!(parse_mode_response(&resp), Err(Error::Protocol(_))));
    }

    #[test]
    fn parse_time_response_tail() {
        let resp = Response::new(vec![0xE0, 0x94, 0x1A, 0x05, 0x00, 0x95, 0x07, 0x42]);
        assert_eq!(
            parse_time_response(&resp).unwrap(),
            NaiveTime::from_hms_opt(7, 42, 0).unwrap()
        );
    }

    #[test]
    fn parse_date_response_tail() {
        let resp = Response::new(vec![
            0xE0, 0x94, 0x1A, 0x05, 0x00, 0x94, 0x20, 0x25, 0x10, 0x16,
        ]);
        assert_eq!(
            parse_date_response(&resp).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 16).unwrap()
        );
    }

    #[test]
    fn parse_date_response_too_short() {
        let resp = Response::new(vec![0x10, 0x16]);
        assert!(matches!(parse_date_response(&resp), Err(Error::Protocol(_))));
    }
}
