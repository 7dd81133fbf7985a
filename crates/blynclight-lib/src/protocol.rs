//! Protocol constants for Embrava BlyncLight devices.
//!
//! A command is a single 9-byte HID output report. Byte 0 is the report
//! number, bytes 1..7 carry the packed control fields, and the last two bytes
//! are a fixed trailer.
//!
//! ```text
//!  byte 0   report number (0x00)
//!  byte 1   red
//!  byte 2   blue
//!  byte 3   green
//!  byte 4   off:1  dim:1  flash:1  speed:3  (2 reserved)
//!  byte 5   music:4  play:1  repeat:1  (2 reserved)
//!  byte 6   volume:4  mute:1  (3 reserved)
//!  byte 7   END_OF_COMMAND
//!  byte 8   PAD_VALUE
//! ```
//!
//! Bits are numbered least-significant first within each byte. The color
//! bytes are in the device's red, blue, green order, not canonical RGB.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Vendor identifiers ──

/// USB vendor ids used by Embrava across BlyncLight hardware revisions.
pub const EMBRAVA_VENDOR_IDS: [u16; 2] = [0x2C0D, 0x0E53];

/// Returns true if `vendor_id` belongs to a known BlyncLight vendor.
pub fn is_known_vendor(vendor_id: u16) -> bool {
    EMBRAVA_VENDOR_IDS.contains(&vendor_id)
}

// ── Command framing ──

/// Total length of a command in bytes, including report number and trailer.
pub const COMMAND_LENGTH: usize = 9;

/// Report number sent in byte 0. BlyncLights don't use numbered reports.
pub const REPORT_ID: u8 = 0x00;

/// Offset of the end-of-command marker.
pub const END_OF_COMMAND_OFFSET: usize = 7;

/// End-of-command marker.
pub const END_OF_COMMAND: u8 = 0xFF;

/// Value of the padding between the end-of-command marker and `COMMAND_LENGTH`.
pub const PAD_VALUE: u8 = 0x22;

// ── USB transport ──

/// USB interface class for HID.
pub const USB_CLASS_HID: u8 = 0x03;

/// HID class request: SET_REPORT.
pub const HID_SET_REPORT: u8 = 0x09;

/// `wValue` high byte for an output report.
pub const HID_REPORT_TYPE_OUTPUT: u16 = 0x02;

/// Timeout for a single control transfer.
pub const USB_TIMEOUT_MS: u64 = 1000;

// ── Flash speed ──

/// Named values for the 3-bit `speed` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashSpeed {
    Slow = 1,
    Medium = 2,
    Fast = 4,
}

impl FlashSpeed {
    /// Raw field value.
    pub fn value(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for FlashSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlashSpeed::Slow => write!(f, "slow"),
            FlashSpeed::Medium => write!(f, "medium"),
            FlashSpeed::Fast => write!(f, "fast"),
        }
    }
}

impl FromStr for FlashSpeed {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "slow" | "1" => Ok(FlashSpeed::Slow),
            "medium" | "2" => Ok(FlashSpeed::Medium),
            "fast" | "4" => Ok(FlashSpeed::Fast),
            _ => Err(format!(
                "invalid flash speed: {s} (use slow, medium or fast)"
            )),
        }
    }
}

/// Largest value the 4-bit `volume` field can hold.
pub const MAX_VOLUME: u8 = 0x0F;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vendors() {
        assert!(is_known_vendor(0x2C0D));
        assert!(is_known_vendor(0x0E53));
        assert!(!is_known_vendor(0xFFFF));
        assert!(!is_known_vendor(0));
    }

    #[test]
    fn trailer_fits_command() {
        assert_eq!(END_OF_COMMAND_OFFSET + 2, COMMAND_LENGTH);
    }

    #[test]
    fn flash_speed_values() {
        assert_eq!(FlashSpeed::Slow.value(), 1);
        assert_eq!(FlashSpeed::Medium.value(), 2);
        assert_eq!(FlashSpeed::Fast.value(), 4);
    }

    #[test]
    fn flash_speed_parse() {
        assert_eq!("slow".parse::<FlashSpeed>().unwrap(), FlashSpeed::Slow);
        assert_eq!(" Medium ".parse::<FlashSpeed>().unwrap(), FlashSpeed::Medium);
        assert_eq!("FAST".parse::<FlashSpeed>().unwrap(), FlashSpeed::Fast);
        assert_eq!("4".parse::<FlashSpeed>().unwrap(), FlashSpeed::Fast);
        assert!("ludicrous".parse::<FlashSpeed>().is_err());
    }

    #[test]
    fn flash_speed_display_roundtrip() {
        for speed in [FlashSpeed::Slow, FlashSpeed::Medium, FlashSpeed::Fast] {
            assert_eq!(speed.to_string().parse::<FlashSpeed>().unwrap(), speed);
        }
    }
}
