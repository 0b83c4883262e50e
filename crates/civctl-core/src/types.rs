//! Core types used throughout civctl.

use std::fmt;

/// Factory-default CI-V address of the IC-7300.
pub const DEFAULT_RADIO_ADDR: u8 = 0x94;

/// Standard PC controller CI-V address.
pub const DEFAULT_CONTROLLER_ADDR: u8 = 0xE0;

/// The CI-V address pair used for one session.
///
/// Every outbound frame is addressed from `controller` to `radio`; every
/// reply comes back the other way round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CivAddress {
    /// CI-V address of the transceiver (frame destination).
    pub radio: u8,
    /// CI-V address of this controller (frame source).
    pub controller: u8,
}

impl CivAddress {
    /// Create an address pair.
    pub fn new(radio: u8, controller: u8) -> Self {
        CivAddress { radio, controller }
    }
}

impl Default for CivAddress {
    fn default() -> Self {
        CivAddress::new(DEFAULT_RADIO_ADDR, DEFAULT_CONTROLLER_ADDR)
    }
}

impl fmt::Display for CivAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}->0x{:02X}", self.controller, self.radio)
    }
}

/// Operating mode reported by the transceiver.
///
/// Codes the radio sends that are not in the table are kept as
/// [`Mode::Unknown`] with the raw byte, so nothing is silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Lower sideband (0x00).
    LSB,
    /// Upper sideband (0x01).
    USB,
    /// Amplitude modulation (0x02).
    AM,
    /// CW (0x03).
    CW,
    /// Radio teletype (0x04).
    RTTY,
    /// Frequency modulation (0x05).
    FM,
    /// Wide FM (0x06).
    WFM,
    /// CW reverse (0x07).
    CWR,
    /// RTTY reverse (0x08).
    RTTYR,
    /// Data on lower sideband (0x17).
    DataL,
    /// Data on upper sideband (0x18).
    DataU,
    /// A mode byte not in the table.
    Unknown(u8),
}

impl Mode {
    /// Map a CI-V mode byte to a [`Mode`]. Never fails.
    pub fn from_code(code: u8) -> Mode {
        match code {
            0x00 => Mode::LSB,
            0x01 => Mode::USB,
            0x02 => Mode::AM,
            0x03 => Mode::CW,
            0x04 => Mode::RTTY,
            0x05 => Mode::FM,
            0x06 => Mode::WFM,
            0x07 => Mode::CWR,
            0x08 => Mode::RTTYR,
            0x17 => Mode::DataL,
            0x18 => Mode::DataU,
            other => Mode::Unknown(other),
        }
    }

    /// The CI-V mode byte for this mode.
    pub fn code(&self) -> u8 {
        match self {
            Mode::LSB => 0x00,
            Mode::USB => 0x01,
            Mode::AM => 0x02,
            Mode::CW => 0x03,
            Mode::RTTY => 0x04,
            Mode::FM => 0x05,
            Mode::WFM => 0x06,
            Mode::CWR => 0x07,
            Mode::RTTYR => 0x08,
            Mode::DataL => 0x17,
            Mode::DataU => 0x18,
            Mode::Unknown(code) => *code,
        }
    }

    /// Returns `true` for codes outside the known table.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Mode::Unknown(_))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::LSB => "LSB",
            Mode::USB => "USB",
            Mode::AM => "AM",
            Mode::CW => "CW",
            Mode::RTTY => "RTTY",
            Mode::FM => "FM",
            Mode::WFM => "WFM",
            Mode::CWR => "CW-R",
            Mode::RTTYR => "RTTY-R",
            Mode::DataL => "DATA-L",
            Mode::DataU => "DATA-U",
            Mode::Unknown(code) => return write!(f, "Unknown (0x{code:02X})"),
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_address_is_ic7300_and_pc() {
        let addr = CivAddress::default();
        assert_eq!(addr.radio, 0x94);
        assert_eq!(addr.controller, 0xE0);
    }

    #[test]
    fn address_display() {
        assert_eq!(CivAddress::new(0x94, 0xC0).to_string(), "0xC0->0x94");
    }

    #[test]
    fn mode_table() {
        assert_eq!(Mode::from_code(0x00), Mode::LSB);
        assert_eq!(Mode::from_code(0x01), Mode::USB);
        assert_eq!(Mode::from_code(0x06), Mode::WFM);
        assert_eq!(Mode::from_code(0x07), Mode::CWR);
        assert_eq!(Mode::from_code(0x17), Mode::DataL);
        assert_eq!(Mode::from_code(0x18), Mode::DataU);
    }

    #[test]
    fn mode_unknown_keeps_raw_code() {
        let mode = Mode::from_code(0xFF);
        assert_eq!(mode, Mode::Unknown(0xFF));
        assert!(mode.is_unknown());
        assert_eq!(mode.code(), 0xFF);
        assert_eq!(mode.to_string(), "Unknown (0xFF)");
    }

    #[test]
    fn mode_code_is_inverse_of_from_code() {
        for code in 0..=u8::MAX {
            assert_eq!(Mode::from_code(code).code(), code);
        }
    }

    #[test]
    fn mode_display() {
        assert_eq!(Mode::CWR.to_string(), "CW-R");
        assert_eq!(Mode::RTTYR.to_string(), "RTTY-R");
        assert_eq!(Mode::DataU.to_string(), "DATA-U");
    }
}
