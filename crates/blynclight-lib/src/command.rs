//! The BlyncLight command word: a fixed-length bit buffer with typed fields.
//!
//! [`CommandWord`] is pure data: it knows how to pack, unpack and serialize
//! fields but never talks to a device. Write-through lives in
//! [`crate::light::BlyncLight`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::protocol::{COMMAND_LENGTH, END_OF_COMMAND, END_OF_COMMAND_OFFSET, PAD_VALUE, REPORT_ID};

// ── Error type ──

/// Command word errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Name does not match any registered field.
    UnknownField(String),
    /// Byte buffer has the wrong size.
    InvalidLength { expected: usize, actual: usize },
    /// Byte buffer has the right size but a bad header or trailer.
    Malformed(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownField(name) => write!(f, "Unknown field: {name}"),
            CommandError::InvalidLength { expected, actual } => {
                write!(f, "Invalid command length: expected {expected} bytes, got {actual}")
            }
            CommandError::Malformed(e) => write!(f, "Malformed command: {e}"),
        }
    }
}

impl std::error::Error for CommandError {}

pub type Result<T> = std::result::Result<T, CommandError>;

// ── Fields ──

/// Location of a field inside the command word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Bit offset from bit 0 of byte 0.
    pub offset: usize,
    /// Width in bits.
    pub width: usize,
    /// Value after a reset.
    pub default: u32,
}

impl FieldSpec {
    /// Mask covering the low `width` bits.
    pub const fn mask(&self) -> u32 {
        (1u32 << self.width) - 1
    }
}

/// A controllable field of the command word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Red,
    Blue,
    Green,
    Off,
    Dim,
    Flash,
    Speed,
    Music,
    Play,
    Repeat,
    Volume,
    Mute,
}

impl Field {
    /// Every field, in wire order.
    pub const ALL: [Field; 12] = [
        Field::Red,
        Field::Blue,
        Field::Green,
        Field::Off,
        Field::Dim,
        Field::Flash,
        Field::Speed,
        Field::Music,
        Field::Play,
        Field::Repeat,
        Field::Volume,
        Field::Mute,
    ];

    pub const fn spec(self) -> FieldSpec {
        const fn at(offset: usize, width: usize, default: u32) -> FieldSpec {
            FieldSpec {
                offset,
                width,
                default,
            }
        }
        match self {
            Field::Red => at(8, 8, 0),
            Field::Blue => at(16, 8, 0),
            Field::Green => at(24, 8, 0),
            Field::Off => at(32, 1, 1),
            Field::Dim => at(33, 1, 0),
            Field::Flash => at(34, 1, 0),
            Field::Speed => at(35, 3, 1),
            Field::Music => at(40, 4, 0),
            Field::Play => at(44, 1, 0),
            Field::Repeat => at(45, 1, 0),
            Field::Volume => at(48, 4, 0),
            Field::Mute => at(52, 1, 1),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Field::Red => "red",
            Field::Blue => "blue",
            Field::Green => "green",
            Field::Off => "off",
            Field::Dim => "dim",
            Field::Flash => "flash",
            Field::Speed => "speed",
            Field::Music => "music",
            Field::Play => "play",
            Field::Repeat => "repeat",
            Field::Volume => "volume",
            Field::Mute => "mute",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Field::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| CommandError::UnknownField(name.to_string()))
    }
}

// ── Status snapshot ──

/// Snapshot of every field value, keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Status(BTreeMap<&'static str, u32>);

impl Status {
    pub fn get(&self, name: &str) -> Option<u32> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

// ── Command word ──

/// In-memory image of one BlyncLight command.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandWord {
    bytes: [u8; COMMAND_LENGTH],
}

impl Default for CommandWord {
    fn default() -> Self {
        let mut word = CommandWord {
            bytes: [0; COMMAND_LENGTH],
        };
        word.reset();
        word
    }
}

impl CommandWord {
    /// Length of the word in bits.
    pub const BITS: usize = COMMAND_LENGTH * 8;

    pub fn new() -> Self {
        Self::default()
    }

    /// Length of the word in bytes.
    pub fn len(&self) -> usize {
        COMMAND_LENGTH
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Parse a serialized command.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; COMMAND_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| CommandError::InvalidLength {
                    expected: COMMAND_LENGTH,
                    actual: bytes.len(),
                })?;
        if bytes[0] != REPORT_ID {
            return Err(CommandError::Malformed(format!(
                "report number 0x{:02X}, expected 0x{REPORT_ID:02X}",
                bytes[0]
            )));
        }
        if bytes[END_OF_COMMAND_OFFSET] != END_OF_COMMAND {
            return Err(CommandError::Malformed(format!(
                "end-of-command 0x{:02X}, expected 0x{END_OF_COMMAND:02X}",
                bytes[END_OF_COMMAND_OFFSET]
            )));
        }
        if let Some(bad) = bytes[END_OF_COMMAND_OFFSET + 1..]
            .iter()
            .find(|&&b| b != PAD_VALUE)
        {
            return Err(CommandError::Malformed(format!(
                "pad byte 0x{bad:02X}, expected 0x{PAD_VALUE:02X}"
            )));
        }
        Ok(CommandWord { bytes })
    }

    /// Serialized command, ready to be written to the device.
    pub fn to_bytes(&self) -> [u8; COMMAND_LENGTH] {
        self.bytes
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn get(&self, field: Field) -> u32 {
        let spec = field.spec();
        (0..spec.width).fold(0, |acc, i| {
            let bit = spec.offset + i;
            let set = (self.bytes[bit / 8] >> (bit % 8)) & 1;
            acc | (u32::from(set) << i)
        })
    }

    /// Store `value` in `field`, keeping only as many low bits as the field holds.
    pub fn set(&mut self, field: Field, value: u32) {
        let spec = field.spec();
        let value = value & spec.mask();
        for i in 0..spec.width {
            let bit = spec.offset + i;
            let byte = &mut self.bytes[bit / 8];
            if (value >> i) & 1 == 1 {
                *byte |= 1 << (bit % 8);
            } else {
                *byte &= !(1 << (bit % 8));
            }
        }
    }

    pub fn get_by_name(&self, name: &str) -> Result<u32> {
        Ok(self.get(name.parse()?))
    }

    pub fn set_by_name(&mut self, name: &str, value: u32) -> Result<()> {
        self.set(name.parse()?, value);
        Ok(())
    }

    /// Restore every field to its default and clear reserved bits.
    pub fn reset(&mut self) {
        self.bytes = [0; COMMAND_LENGTH];
        self.bytes[0] = REPORT_ID;
        self.bytes[END_OF_COMMAND_OFFSET] = END_OF_COMMAND;
        self.bytes[END_OF_COMMAND_OFFSET + 1..].fill(PAD_VALUE);
        for field in Field::ALL {
            self.set(field, field.spec().default);
        }
    }

    pub fn status(&self) -> Status {
        Status(
            Field::ALL
                .into_iter()
                .map(|f| (f.name(), self.get(f)))
                .collect(),
        )
    }
}

impl fmt::Debug for CommandWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("CommandWord");
        for field in Field::ALL {
            s.field(field.name(), &self.get(field));
        }
        s.finish()
    }
}

/// Hex dump of the serialized command, e.g. `00 ff 00 00 08 00 10 ff 22`.
impl fmt::Display for CommandWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Field table ──

    #[test]
    fn fields_fit_between_header_and_trailer() {
        for field in Field::ALL {
            let spec = field.spec();
            assert!(spec.offset >= 8, "{field} overlaps report number");
            assert!(
                spec.offset + spec.width <= END_OF_COMMAND_OFFSET * 8,
                "{field} overlaps trailer"
            );
        }
    }

    #[test]
    fn fields_do_not_overlap() {
        let mut used = [false; CommandWord::BITS];
        for field in Field::ALL {
            let spec = field.spec();
            for bit in spec.offset..spec.offset + spec.width {
                assert!(!used[bit], "{field} overlaps at bit {bit}");
                used[bit] = true;
            }
        }
    }

    #[test]
    fn field_names_roundtrip() {
        for field in Field::ALL {
            assert_eq!(field.to_string().parse::<Field>().unwrap(), field);
        }
        assert_eq!("RED".parse::<Field>().unwrap(), Field::Red);
        assert_eq!(" mute ".parse::<Field>().unwrap(), Field::Mute);
    }

    #[test]
    fn unknown_field_name() {
        let err = "bogus".parse::<Field>().unwrap_err();
        assert_eq!(err, CommandError::UnknownField("bogus".into()));
        assert_eq!(err.to_string(), "Unknown field: bogus");
    }

    // ── Length ──

    #[test]
    fn lengths() {
        let word = CommandWord::new();
        assert_eq!(CommandWord::BITS, COMMAND_LENGTH * 8);
        assert_eq!(word.len(), COMMAND_LENGTH);
        assert_eq!(word.to_bytes().len(), COMMAND_LENGTH);
    }

    // ── get / set ──

    #[test]
    fn set_then_get_every_field() {
        let mut word = CommandWord::new();
        for field in Field::ALL {
            let max = field.spec().mask();
            for value in [0, 1, max / 2, max] {
                word.set(field, value);
                assert_eq!(word.get(field), value, "{field}={value}");
            }
        }
    }

    #[test]
    fn set_truncates_to_width() {
        let mut word = CommandWord::new();
        word.set(Field::Red, 0x1AA);
        assert_eq!(word.get(Field::Red), 0xAA);
        word.set(Field::Speed, 0b1101);
        assert_eq!(word.get(Field::Speed), 0b101);
        word.set(Field::Off, 2);
        assert_eq!(word.get(Field::Off), 0);
        word.set(Field::Music, 0x1F);
        assert_eq!(word.get(Field::Music), 0x0F);
    }

    #[test]
    fn set_leaves_neighbours_alone() {
        let mut word = CommandWord::new();
        word.set(Field::Off, 1);
        word.set(Field::Flash, 1);
        word.set(Field::Speed, 7);
        word.set(Field::Dim, 1);
        word.set(Field::Dim, 0);
        assert_eq!(word.get(Field::Off), 1);
        assert_eq!(word.get(Field::Flash), 1);
        assert_eq!(word.get(Field::Speed), 7);
    }

    #[test]
    fn by_name() {
        let mut word = CommandWord::new();
        word.set_by_name("blue", 0xBB).unwrap();
        assert_eq!(word.get_by_name("blue").unwrap(), 0xBB);
        assert!(matches!(
            word.set_by_name("sparkle", 1),
            Err(CommandError::UnknownField(_))
        ));
        assert!(matches!(
            word.get_by_name("sparkle"),
            Err(CommandError::UnknownField(_))
        ));
    }

    // ── Serialization ──

    #[test]
    fn default_bytes() {
        // off=1, speed=1, mute=1
        assert_eq!(
            CommandWord::new().to_bytes(),
            [0x00, 0x00, 0x00, 0x00, 0b0000_1001, 0x00, 0b0001_0000, 0xFF, 0x22]
        );
    }

    #[test]
    fn color_bytes_in_wire_order() {
        let mut word = CommandWord::new();
        word.set(Field::Red, 0x11);
        word.set(Field::Blue, 0x22);
        word.set(Field::Green, 0x33);
        assert_eq!(&word.to_bytes()[1..4], &[0x11, 0x22, 0x33]);
    }

    #[test]
    fn packed_control_bytes() {
        let mut word = CommandWord::new();
        word.set(Field::Off, 0);
        word.set(Field::Dim, 1);
        word.set(Field::Flash, 1);
        word.set(Field::Speed, 4);
        word.set(Field::Music, 0x0A);
        word.set(Field::Play, 1);
        word.set(Field::Repeat, 1);
        word.set(Field::Volume, 0x05);
        word.set(Field::Mute, 0);
        let b = word.to_bytes();
        assert_eq!(b[4], 0b0010_0110);
        assert_eq!(b[5], 0b0011_1010);
        assert_eq!(b[6], 0b0000_0101);
    }

    #[test]
    fn trailer_is_constant() {
        let mut word = CommandWord::new();
        for field in Field::ALL {
            word.set(field, u32::MAX);
        }
        let b = word.to_bytes();
        assert_eq!(b[0], REPORT_ID);
        assert_eq!(b[END_OF_COMMAND_OFFSET], END_OF_COMMAND);
        assert_eq!(b[COMMAND_LENGTH - 1], PAD_VALUE);
    }

    #[test]
    fn from_bytes_roundtrip() {
        let mut word = CommandWord::new();
        word.set(Field::Red, 0xAB);
        word.set(Field::Flash, 1);
        word.set(Field::Volume, 9);
        let parsed = CommandWord::from_bytes(&word.to_bytes()).unwrap();
        assert_eq!(parsed, word);
        assert_eq!(parsed.to_bytes(), word.to_bytes());
    }

    #[test]
    fn from_bytes_wrong_length() {
        let err = CommandWord::from_bytes(&[0; 8]).unwrap_err();
        assert_eq!(
            err,
            CommandError::InvalidLength {
                expected: COMMAND_LENGTH,
                actual: 8
            }
        );
        assert!(CommandWord::from_bytes(&[]).is_err());
    }

    #[test]
    fn from_bytes_bad_trailer() {
        let mut bytes = CommandWord::new().to_bytes();
        bytes[END_OF_COMMAND_OFFSET] = 0x00;
        let err = CommandWord::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("end-of-command"), "got: {err}");

        let mut bytes = CommandWord::new().to_bytes();
        bytes[COMMAND_LENGTH - 1] = 0x00;
        let err = CommandWord::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("pad byte"), "got: {err}");
    }

    #[test]
    fn from_bytes_bad_report_number() {
        let mut bytes = CommandWord::new().to_bytes();
        bytes[0] = 0x01;
        assert!(matches!(
            CommandWord::from_bytes(&bytes),
            Err(CommandError::Malformed(_))
        ));
    }

    #[test]
    fn from_bytes_keeps_reserved_bits() {
        let mut bytes = CommandWord::new().to_bytes();
        bytes[4] |= 0b1100_0000;
        let word = CommandWord::from_bytes(&bytes).unwrap();
        assert_eq!(word.to_bytes(), bytes);
    }

    // ── reset ──

    #[test]
    fn reset_restores_defaults() {
        let mut word = CommandWord::new();
        for field in Field::ALL {
            word.set(field, u32::MAX);
        }
        word.reset();
        assert_eq!(word.get(Field::Red), 0);
        assert_eq!(word.get(Field::Blue), 0);
        assert_eq!(word.get(Field::Green), 0);
        assert_eq!(word.get(Field::Off), 1);
        assert_eq!(word.get(Field::Dim), 0);
        assert_eq!(word.get(Field::Flash), 0);
        assert_eq!(word.get(Field::Speed), 1);
        assert_eq!(word.get(Field::Music), 0);
        assert_eq!(word.get(Field::Play), 0);
        assert_eq!(word.get(Field::Repeat), 0);
        assert_eq!(word.get(Field::Volume), 0);
        assert_eq!(word.get(Field::Mute), 1);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut word = CommandWord::new();
        word.set(Field::Green, 0x42);
        word.reset();
        let once = word.clone();
        word.reset();
        assert_eq!(word, once);
    }

    #[test]
    fn reset_clears_reserved_bits() {
        let mut bytes = CommandWord::new().to_bytes();
        bytes[6] |= 0b1110_0000;
        let mut word = CommandWord::from_bytes(&bytes).unwrap();
        word.reset();
        assert_eq!(word, CommandWord::new());
    }

    // ── status / formatting ──

    #[test]
    fn status_has_every_field() {
        let mut word = CommandWord::new();
        word.set(Field::Volume, 3);
        let status = word.status();
        assert_eq!(status.len(), Field::ALL.len());
        for field in Field::ALL {
            assert!(status.contains(field.name()), "missing {field}");
        }
        assert_eq!(status.get("volume"), Some(3));
        assert_eq!(status.get("off"), Some(1));
        assert_eq!(status.get("immediate"), None);
    }

    #[test]
    fn display_is_hex_dump() {
        assert_eq!(
            CommandWord::new().to_string(),
            "00 00 00 00 09 00 10 ff 22"
        );
    }

    #[test]
    fn debug_lists_fields() {
        let dbg = format!("{:?}", CommandWord::new());
        assert!(dbg.contains("red: 0"));
        assert!(dbg.contains("mute: 1"));
    }
}
