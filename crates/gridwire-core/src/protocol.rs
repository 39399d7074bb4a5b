//! Binary object protocol constants.
//!
//! # Header
//!
//! Every full object starts with a fixed [`HEADER_LEN`]-byte header, all
//! multi-byte values little-endian:
//!
//! - `0`: tag [`tags::OBJ`]
//! - `1`: [`PROTO_VER`]
//! - `2..4`: flags (see [`flags`])
//! - `4..8`: type id, or [`UNREGISTERED_TYPE_ID`] with the type name inline
//! - `8..12`: identity hash code
//! - `12..16`: total length
//! - `16..20`: schema id
//! - `20..24`: schema offset, or raw offset when there is no schema
//!
//! # Footer
//!
//! The schema (footer) is a table of `(field id, offset)` pairs, or offsets
//! only when [`flags::COMPACT_FOOTER`] is set. Offset width is 1, 2 or 4 bytes,
//! chosen from the largest field offset.

/// Protocol version byte.
pub const PROTO_VER: u8 = 1;

/// Header length in bytes.
pub const HEADER_LEN: usize = 24;

/// Position of the flags inside the header.
pub const FLAGS_POS: usize = 2;

/// Position of the type id inside the header.
pub const TYPE_ID_POS: usize = 4;

/// Position of the identity hash code inside the header.
pub const HASH_CODE_POS: usize = 8;

/// Position of the total length inside the header.
pub const TOTAL_LEN_POS: usize = 12;

/// Position of the schema id inside the header.
pub const SCHEMA_ID_POS: usize = 16;

/// Position of the schema-or-raw offset inside the header.
pub const SCHEMA_OR_RAW_OFF_POS: usize = 20;

/// Type id written when the type name follows the header.
pub const UNREGISTERED_TYPE_ID: i32 = 0;

/// Largest offset (exclusive) representable by a one-byte footer entry.
pub const MAX_OFFSET_1: usize = 1 << 8;

/// Largest offset (exclusive) representable by a two-byte footer entry.
pub const MAX_OFFSET_2: usize = 1 << 16;

/// Wire type tags.
///
/// Every encoded value starts with one of these.
#[allow(missing_docs)]
pub mod tags {
    pub const BYTE: u8 = 1;
    pub const SHORT: u8 = 2;
    pub const INT: u8 = 3;
    pub const LONG: u8 = 4;
    pub const FLOAT: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CHAR: u8 = 7;
    pub const BOOL: u8 = 8;
    pub const STRING: u8 = 9;
    pub const UUID: u8 = 10;
    pub const DATE: u8 = 11;
    pub const BYTE_ARR: u8 = 12;
    pub const SHORT_ARR: u8 = 13;
    pub const INT_ARR: u8 = 14;
    pub const LONG_ARR: u8 = 15;
    pub const FLOAT_ARR: u8 = 16;
    pub const DOUBLE_ARR: u8 = 17;
    pub const CHAR_ARR: u8 = 18;
    pub const BOOL_ARR: u8 = 19;
    pub const STRING_ARR: u8 = 20;
    pub const UUID_ARR: u8 = 21;
    pub const DATE_ARR: u8 = 22;
    pub const OBJ_ARR: u8 = 23;
    pub const COL: u8 = 24;
    pub const MAP: u8 = 25;
    pub const BINARY_OBJ: u8 = 27;
    pub const ENUM: u8 = 28;
    pub const ENUM_ARR: u8 = 29;
    pub const DECIMAL: u8 = 30;
    pub const DECIMAL_ARR: u8 = 31;
    pub const CLASS: u8 = 32;
    pub const TIMESTAMP: u8 = 33;
    pub const TIMESTAMP_ARR: u8 = 34;
    pub const PROXY: u8 = 35;
    pub const TIME: u8 = 36;
    pub const TIME_ARR: u8 = 37;
    pub const BINARY_ENUM: u8 = 38;
    pub const NULL: u8 = 101;
    pub const HANDLE: u8 = 102;
    pub const OBJ: u8 = 103;
}

/// Header flag bits.
pub mod flags {
    /// Object is a user type (not a system value).
    pub const USER_TYPE: u16 = 0x0001;
    /// Object carries a schema (footer).
    pub const HAS_SCHEMA: u16 = 0x0002;
    /// Object carries a raw section.
    pub const HAS_RAW: u16 = 0x0004;
    /// Footer offsets are one byte wide.
    pub const OFFSET_ONE_BYTE: u16 = 0x0008;
    /// Footer offsets are two bytes wide.
    pub const OFFSET_TWO_BYTES: u16 = 0x0010;
    /// Footer holds offsets only; field ids come from the registry.
    pub const COMPACT_FOOTER: u16 = 0x0020;
}

/// Width of one footer offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OffsetWidth {
    /// One byte, offsets below [`MAX_OFFSET_1`].
    One,
    /// Two bytes, offsets below [`MAX_OFFSET_2`].
    Two,
    /// Four bytes.
    Four,
}

impl OffsetWidth {
    /// Picks the narrowest width able to hold `max_offset`.
    #[must_use]
    pub const fn for_offset(max_offset: usize) -> Self {
        if max_offset < MAX_OFFSET_1 {
            Self::One
        } else if max_offset < MAX_OFFSET_2 {
            Self::Two
        } else {
            Self::Four
        }
    }

    /// Number of bytes per offset.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
        }
    }

    /// Header flag bits announcing this width.
    #[must_use]
    pub const fn flag(self) -> u16 {
        match self {
            Self::One => flags::OFFSET_ONE_BYTE,
            Self::Two => flags::OFFSET_TWO_BYTES,
            Self::Four => 0,
        }
    }

    /// Reads the width back from header flags.
    #[must_use]
    pub const fn from_flags(bits: u16) -> Self {
        if bits & flags::OFFSET_ONE_BYTE != 0 {
            Self::One
        } else if bits & flags::OFFSET_TWO_BYTES != 0 {
            Self::Two
        } else {
            Self::Four
        }
    }
}

const FNV1_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV1_PRIME: u32 = 0x0100_0193;

/// Seed of the running schema id.
#[must_use]
pub const fn schema_initial_id() -> i32 {
    FNV1_OFFSET_BASIS as i32
}

/// Folds one field id into a running schema id.
///
/// FNV-1 over the four bytes of `field_id`, lowest byte first.
#[must_use]
pub const fn update_schema_id(schema_id: i32, field_id: i32) -> i32 {
    let mut id = schema_id as u32;
    let field = field_id as u32;
    let mut shift = 0;
    while shift < 32 {
        id ^= (field >> shift) & 0xFF;
        id = id.wrapping_mul(FNV1_PRIME);
        shift += 8;
    }
    id as i32
}
