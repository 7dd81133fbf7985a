//! Color values for BlyncLight control.
//!
//! The device stores color as three bytes in red, blue, green order. A packed
//! integer is read the same way: `0xRRBBGG`. User-facing strings
//! (`#RRGGBB`, named colors) use canonical RGB order and are reordered here.

use std::fmt;

use serde::Serialize;

/// A color as the device sees it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    pub red: u8,
    pub blue: u8,
    pub green: u8,
}

impl Color {
    pub const OFF: Color = Color::rgb(0, 0, 0);

    /// Build a color from canonical RGB components.
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Color { red, blue, green }
    }

    /// Packed wire-order integer `0xRRBBGG`.
    pub fn packed(self) -> u32 {
        (u32::from(self.red) << 16) | (u32::from(self.blue) << 8) | u32::from(self.green)
    }

    /// Components in wire order.
    pub fn to_tuple(self) -> (u8, u8, u8) {
        (self.red, self.blue, self.green)
    }

    /// Point on a color wheel, `position` in `0..=255`.
    ///
    /// Walks red → green → blue → red, used by the `cycle` command.
    pub fn wheel(position: u8) -> Self {
        let p = position;
        match p {
            0..=84 => Color::rgb(255 - p * 3, p * 3, 0),
            85..=169 => {
                let p = p - 85;
                Color::rgb(0, 255 - p * 3, p * 3)
            }
            _ => {
                let p = p - 170;
                Color::rgb(p * 3, 0, 255 - p * 3)
            }
        }
    }
}

/// `(red, blue, green)`, wire order.
impl From<(u8, u8, u8)> for Color {
    fn from((red, blue, green): (u8, u8, u8)) -> Self {
        Color { red, blue, green }
    }
}

/// Packed `0xRRBBGG`. Bits above 23 are ignored.
impl From<u32> for Color {
    fn from(value: u32) -> Self {
        Color {
            red: ((value >> 16) & 0xFF) as u8,
            blue: ((value >> 8) & 0xFF) as u8,
            green: (value & 0xFF) as u8,
        }
    }
}

impl From<Color> for (u8, u8, u8) {
    fn from(c: Color) -> Self {
        c.to_tuple()
    }
}

/// Canonical `#RRGGBB`.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

/// Parse a color string.
///
/// Accepts:
/// - Hex: `"#FF0000"`, `"FF0000"`, `"#ff0000"` (canonical RGB)
/// - Named: `"red"`, `"green"`, `"blue"`, `"white"`, `"orange"`, `"yellow"`,
///   `"purple"`, `"cyan"`, `"magenta"`, `"off"`/`"black"`
pub fn parse_color(s: &str) -> crate::error::Result<Color> {
    let s = s.trim();

    match s.to_lowercase().as_str() {
        "red" => return Ok(Color::rgb(0xFF, 0x00, 0x00)),
        "green" => return Ok(Color::rgb(0x00, 0xFF, 0x00)),
        "blue" => return Ok(Color::rgb(0x00, 0x00, 0xFF)),
        "white" => return Ok(Color::rgb(0xFF, 0xFF, 0xFF)),
        "orange" => return Ok(Color::rgb(0xFF, 0x80, 0x00)),
        "yellow" => return Ok(Color::rgb(0xFF, 0xFF, 0x00)),
        "purple" => return Ok(Color::rgb(0x80, 0x00, 0xFF)),
        "cyan" => return Ok(Color::rgb(0x00, 0xFF, 0xFF)),
        "magenta" => return Ok(Color::rgb(0xFF, 0x00, 0xFF)),
        "off" | "black" => return Ok(Color::OFF),
        _ => {}
    }

    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return Err(crate::BlyncError::Color(format!(
            "Invalid color: {s} (use #RRGGBB or a color name)"
        )));
    }
    let val = u32::from_str_radix(hex, 16)
        .map_err(|_| crate::BlyncError::Color(format!("Invalid hex color: {s}")))?;
    Ok(Color::rgb(
        (val >> 16) as u8,
        (val >> 8) as u8,
        val as u8,
    ))
}

/// Format a color as `#RRGGBB`.
pub fn format_color(color: Color) -> String {
    color.to_string()
}
