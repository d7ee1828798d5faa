//! Byte-level primitives for the tagwire tag-length-value wire format.
//!
//! Values are framed as a varint *tag* — `(field_number << 3) | wire_type` —
//! followed by a payload whose shape the wire type selects. Varints are
//! little-endian base-128: seven value bits per byte, high bit set while more
//! bytes follow.
//!
//! ```
//! use tagwire_wire::{make_tag, ByteReader, ByteWriter, WireType};
//!
//! let mut writer = ByteWriter::new();
//! writer.write_var_uint(make_tag(1, WireType::Varint) as u64);
//! writer.write_var_uint(7);
//! assert_eq!(writer.as_bytes(), [0x08, 0x07]);
//!
//! let mut reader = ByteReader::new(writer.as_bytes());
//! assert_eq!(reader.read_tag(), Ok((1, WireType::Varint)));
//! assert_eq!(reader.read_var_uint(), Ok(7));
//! ```

pub mod reader;
pub mod writer;

pub use reader::ByteReader;
pub use writer::ByteWriter;

/// Payload shape selector carried in the low three bits of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    /// Base-128 varint payload.
    Varint = 0,
    /// Eight little-endian bytes.
    Fixed64 = 1,
    /// Varint length followed by that many bytes.
    LengthDelimited = 2,
    /// Length-delimited concatenation of per-element encodings.
    PackedArray = 3,
    /// Four little-endian bytes.
    Fixed32 = 5,
    /// Reserved for interned strings; payload shape of a plain string.
    StringTable = 6,
    /// Reserved for bit-packed booleans; payload shape of a plain bool.
    Bitmap = 7,
}

impl WireType {
    /// The three-bit code stored in a tag.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<WireType> {
        match code {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            3 => Some(WireType::PackedArray),
            5 => Some(WireType::Fixed32),
            6 => Some(WireType::StringTable),
            7 => Some(WireType::Bitmap),
            _ => None,
        }
    }
}

/// Combine a field number and wire type into a tag value.
///
/// The tag is transmitted as a varint; this returns the raw integer.
pub fn make_tag(field_number: u32, wire_type: WireType) -> u32 {
    (field_number << 3) | wire_type.code() as u32
}

/// Split a decoded tag into its field number and three-bit wire code.
pub fn split_tag(tag: u64) -> (u64, u8) {
    (tag >> 3, (tag & 0x7) as u8)
}

#[test]
fn tag_round_trip() {
    assert_eq!(make_tag(1, WireType::Varint), 8);
    assert_eq!(make_tag(2, WireType::LengthDelimited), 18);
    assert_eq!(make_tag(3, WireType::LengthDelimited), 26);
    assert_eq!(make_tag(5, WireType::Fixed32), 45);
    assert_eq!(split_tag(8), (1, 0));
    assert_eq!(split_tag(18), (2, 2));
    assert_eq!(split_tag(45), (5, 5));
    assert_eq!(split_tag(536_870_911 << 3 | 7), (536_870_911, 7));
}

#[test]
fn wire_type_codes() {
    for wt in [
        WireType::Varint,
        WireType::Fixed64,
        WireType::LengthDelimited,
        WireType::PackedArray,
        WireType::Fixed32,
        WireType::StringTable,
        WireType::Bitmap,
    ] {
        assert_eq!(WireType::from_code(wt.code()), Some(wt));
    }
    assert_eq!(WireType::from_code(4), None);
    assert_eq!(WireType::from_code(8), None);
}
