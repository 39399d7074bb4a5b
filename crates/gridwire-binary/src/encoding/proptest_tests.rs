//! Property-based tests for the value encoders.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::DateTime;
use gridwire_core::protocol::tags;
use gridwire_core::{Decimal, StringEncoding};
use proptest::prelude::*;

use super::*;
use crate::sink::{HeapOutputSink, OutputSink};

fn encode(f: impl FnOnce(&mut dyn OutputSink) -> gridwire_core::Result<()>) -> Vec<u8> {
    let mut sink = HeapOutputSink::new();
    f(&mut sink).expect("encoding should succeed");
    sink.into_vec()
}

/// Decode per-unit UTF-8 back into UTF-16 code units.
fn decode_per_unit(bytes: &[u8]) -> Vec<u16> {
    let mut units = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = u16::from(bytes[i]);
        if b < 0x80 {
            units.push(b);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            units.push(((b & 0x1F) << 6) | (u16::from(bytes[i + 1]) & 0x3F));
            i += 2;
        } else {
            units.push(
                ((b & 0x0F) << 12)
                    | ((u16::from(bytes[i + 1]) & 0x3F) << 6)
                    | (u16::from(bytes[i + 2]) & 0x3F),
            );
            i += 3;
        }
    }
    units
}

fn read_i32(bytes: &[u8], pos: usize) -> i32 {
    i32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap())
}

proptest! {
    #[test]
    fn v1_matches_std_utf8(text in any::<String>()) {
        let units: Vec<u16> = text.encode_utf16().collect();
        prop_assert_eq!(utf16_bytes(&units, StringEncoding::V1), text.as_bytes());
        prop_assert_eq!(str_bytes(&text, StringEncoding::V1).into_owned(), text.as_bytes().to_vec());
    }

    #[test]
    fn v2_keeps_every_code_unit(units in prop::collection::vec(any::<u16>(), 0..64)) {
        let bytes = utf16_bytes(&units, StringEncoding::V2);
        prop_assert_eq!(decode_per_unit(&bytes), units);
    }

    #[test]
    fn v2_str_and_utf16_agree(text in any::<String>()) {
        let units: Vec<u16> = text.encode_utf16().collect();
        prop_assert_eq!(
            str_bytes(&text, StringEncoding::V2).into_owned(),
            utf16_bytes(&units, StringEncoding::V2)
        );
    }

    #[test]
    fn string_header_carries_byte_length(text in ".*") {
        let bytes = encode(|s| write_str(s, Some(&text), StringEncoding::V1));
        prop_assert_eq!(bytes[0], tags::STRING);
        prop_assert_eq!(read_i32(&bytes, 1) as usize, text.len());
        prop_assert_eq!(&bytes[5..], text.as_bytes());
    }

    #[test]
    fn int_array_layout(values in prop::collection::vec(any::<i32>(), 0..100)) {
        let bytes = encode(|s| write_int_array(s, Some(&values)));
        prop_assert_eq!(bytes.len(), 5 + 4 * values.len());
        prop_assert_eq!(read_i32(&bytes, 1) as usize, values.len());
        for (i, value) in values.iter().enumerate() {
            prop_assert_eq!(read_i32(&bytes, 5 + 4 * i), *value);
        }
    }

    #[test]
    fn decimal_parts_recover_value(unscaled in any::<i128>(), scale in -20i32..20) {
        let decimal = Decimal::new(unscaled, scale);
        let bytes = encode(|s| write_decimal(s, Some(&decimal)));
        prop_assert_eq!(bytes[0], tags::DECIMAL);
        prop_assert_eq!(read_i32(&bytes, 1), scale);
        let len = read_i32(&bytes, 5) as usize;
        prop_assert_eq!(bytes.len(), 9 + len);
        prop_assert_eq!(Decimal::from_wire_parts(scale, &bytes[9..]), decimal);
    }

    #[test]
    fn timestamp_nanos_below_one_milli(
        secs in -1_000_000_000i64..1_000_000_000,
        nanos in 0u32..1_000_000_000
    ) {
        let ts = DateTime::from_timestamp(secs, nanos).expect("in range");
        let bytes = encode(|s| write_timestamp(s, Some(&ts)));
        let extra = read_i32(&bytes, 9);
        prop_assert!((0..1_000_000).contains(&extra));
        let millis = i64::from_le_bytes(bytes[1..9].try_into().unwrap());
        prop_assert_eq!(
            millis * 1_000_000 + i64::from(extra),
            secs * 1_000_000_000 + i64::from(nanos)
        );
    }
}
