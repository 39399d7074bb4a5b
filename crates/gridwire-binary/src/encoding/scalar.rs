//! Single-value encoders: tag followed by payload.

use chrono::{DateTime, Utc};
use gridwire_core::protocol::tags;
use gridwire_core::{wire_len, Decimal, Result, StringEncoding};
use uuid::Uuid;

use super::string::{str_bytes, utf16_bytes};
use crate::sink::OutputSink;
use crate::value::{EncodedObject, SqlTime};

/// Write the null tag.
pub fn write_null(sink: &mut dyn OutputSink) -> Result<()> {
    sink.write_u8(tags::NULL)?;
    Ok(())
}

/// Write a tagged byte.
pub fn write_byte(sink: &mut dyn OutputSink, value: u8) -> Result<()> {
    sink.reserve(2)?;
    sink.unchecked_write_u8(tags::BYTE);
    sink.unchecked_write_u8(value);
    Ok(())
}

/// Write a tagged short.
pub fn write_short(sink: &mut dyn OutputSink, value: i16) -> Result<()> {
    sink.reserve(3)?;
    sink.unchecked_write_u8(tags::SHORT);
    sink.unchecked_write_i16(value);
    Ok(())
}

/// Write a tagged int.
pub fn write_int(sink: &mut dyn OutputSink, value: i32) -> Result<()> {
    sink.reserve(5)?;
    sink.unchecked_write_u8(tags::INT);
    sink.unchecked_write_i32(value);
    Ok(())
}

/// Write a tagged long.
pub fn write_long(sink: &mut dyn OutputSink, value: i64) -> Result<()> {
    sink.reserve(9)?;
    sink.unchecked_write_u8(tags::LONG);
    sink.unchecked_write_i64(value);
    Ok(())
}

/// Write a tagged float.
pub fn write_float(sink: &mut dyn OutputSink, value: f32) -> Result<()> {
    sink.reserve(5)?;
    sink.unchecked_write_u8(tags::FLOAT);
    sink.unchecked_write_f32(value);
    Ok(())
}

/// Write a tagged double.
pub fn write_double(sink: &mut dyn OutputSink, value: f64) -> Result<()> {
    sink.reserve(9)?;
    sink.unchecked_write_u8(tags::DOUBLE);
    sink.unchecked_write_f64(value);
    Ok(())
}

/// Write a tagged UTF-16 code unit.
pub fn write_char(sink: &mut dyn OutputSink, value: u16) -> Result<()> {
    sink.reserve(3)?;
    sink.unchecked_write_u8(tags::CHAR);
    sink.unchecked_write_u16(value);
    Ok(())
}

/// Write a tagged boolean.
pub fn write_bool(sink: &mut dyn OutputSink, value: bool) -> Result<()> {
    sink.reserve(2)?;
    sink.unchecked_write_u8(tags::BOOL);
    sink.unchecked_write_bool(value);
    Ok(())
}

/// Write a string, or null.
pub fn write_str(
    sink: &mut dyn OutputSink,
    value: Option<&str>,
    encoding: StringEncoding,
) -> Result<()> {
    match value {
        None => write_null(sink),
        Some(value) => write_utf8(sink, &str_bytes(value, encoding)),
    }
}

/// Write UTF-16 text as a string, or null.
pub fn write_utf16(
    sink: &mut dyn OutputSink,
    value: Option<&[u16]>,
    encoding: StringEncoding,
) -> Result<()> {
    match value {
        None => write_null(sink),
        Some(units) => write_utf8(sink, &utf16_bytes(units, encoding)),
    }
}

fn write_utf8(sink: &mut dyn OutputSink, bytes: &[u8]) -> Result<()> {
    let len = wire_len(bytes.len(), "string")?;
    sink.reserve(5 + bytes.len())?;
    sink.unchecked_write_u8(tags::STRING);
    sink.unchecked_write_i32(len);
    sink.unchecked_write_bytes(bytes);
    Ok(())
}

/// Write a UUID as its most then least significant halves, or null.
pub fn write_uuid(sink: &mut dyn OutputSink, value: Option<&Uuid>) -> Result<()> {
    let Some(value) = value else {
        return write_null(sink);
    };
    let (most, least) = value.as_u64_pair();
    sink.reserve(17)?;
    sink.unchecked_write_u8(tags::UUID);
    sink.unchecked_write_i64(most as i64);
    sink.unchecked_write_i64(least as i64);
    Ok(())
}

/// Write a date as epoch milliseconds, or null.
pub fn write_date(sink: &mut dyn OutputSink, value: Option<&DateTime<Utc>>) -> Result<()> {
    let Some(value) = value else {
        return write_null(sink);
    };
    sink.reserve(9)?;
    sink.unchecked_write_u8(tags::DATE);
    sink.unchecked_write_i64(value.timestamp_millis());
    Ok(())
}

/// Write a timestamp, or null.
///
/// The payload is epoch milliseconds followed by the nanoseconds not already
/// covered by the milliseconds.
pub fn write_timestamp(sink: &mut dyn OutputSink, value: Option<&DateTime<Utc>>) -> Result<()> {
    let Some(value) = value else {
        return write_null(sink);
    };
    sink.reserve(13)?;
    sink.unchecked_write_u8(tags::TIMESTAMP);
    sink.unchecked_write_i64(value.timestamp_millis());
    sink.unchecked_write_i32((value.timestamp_subsec_nanos() % 1_000_000) as i32);
    Ok(())
}

/// Write a SQL time as epoch milliseconds, or null.
pub fn write_time(sink: &mut dyn OutputSink, value: Option<&SqlTime>) -> Result<()> {
    let Some(value) = value else {
        return write_null(sink);
    };
    sink.reserve(9)?;
    sink.unchecked_write_u8(tags::TIME);
    sink.unchecked_write_i64(value.millis());
    Ok(())
}

/// Write a decimal, or null.
///
/// Payload: scale, magnitude length, then the big-endian magnitude with the
/// sign in the top bit of the first byte.
pub fn write_decimal(sink: &mut dyn OutputSink, value: Option<&Decimal>) -> Result<()> {
    let Some(value) = value else {
        return write_null(sink);
    };
    let magnitude = value.wire_magnitude();
    let len = wire_len(magnitude.len(), "decimal magnitude")?;
    sink.reserve(9 + magnitude.len())?;
    sink.unchecked_write_u8(tags::DECIMAL);
    sink.unchecked_write_i32(value.scale());
    sink.unchecked_write_i32(len);
    sink.unchecked_write_bytes(&magnitude);
    Ok(())
}

/// Write an already encoded object, or null.
///
/// The whole backing buffer is copied, followed by the object's start offset
/// inside it.
pub fn write_binary_object(sink: &mut dyn OutputSink, value: Option<&EncodedObject>) -> Result<()> {
    let Some(value) = value else {
        return write_null(sink);
    };
    let bytes = value.bytes();
    let len = wire_len(bytes.len(), "binary object")?;
    let start = wire_len(value.start(), "binary object start")?;
    sink.reserve(9 + bytes.len())?;
    sink.unchecked_write_u8(tags::BINARY_OBJ);
    sink.unchecked_write_i32(len);
    sink.unchecked_write_bytes(bytes);
    sink.unchecked_write_i32(start);
    Ok(())
}
