//! UTF-16 to UTF-8 conversion strategies.

use std::borrow::Cow;

use gridwire_core::StringEncoding;

/// UTF-8 bytes of `value` under `encoding`.
///
/// Text without supplementary characters is returned as is under both
/// strategies.
#[must_use]
pub fn str_bytes(value: &str, encoding: StringEncoding) -> Cow<'_, [u8]> {
    match encoding {
        StringEncoding::V2 if value.chars().any(|c| c.len_utf16() == 2) => {
            Cow::Owned(per_unit(value.encode_utf16(), value.len() + value.len() / 2))
        }
        _ => Cow::Borrowed(value.as_bytes()),
    }
}

/// UTF-8 bytes of UTF-16 `units` under `encoding`.
#[must_use]
pub fn utf16_bytes(units: &[u16], encoding: StringEncoding) -> Vec<u8> {
    match encoding {
        StringEncoding::V1 => char::decode_utf16(units.iter().copied())
            .map(|c| c.unwrap_or('?'))
            .collect::<String>()
            .into_bytes(),
        StringEncoding::V2 => per_unit(units.iter().copied(), units.len() * 3),
    }
}

// Every unit gets its own 1, 2 or 3 byte sequence; surrogates are not paired.
fn per_unit(units: impl Iterator<Item = u16>, capacity: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(capacity);
    for unit in units {
        match unit {
            0..=0x7F => out.push(unit as u8),
            0x80..=0x7FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}
