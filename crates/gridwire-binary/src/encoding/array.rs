//! Array encoders: tag, element count, elements.

use chrono::{DateTime, Utc};
use gridwire_core::protocol::tags;
use gridwire_core::{wire_len, Decimal, Result, StringEncoding};
use uuid::Uuid;

use super::scalar::{self, write_null};
use crate::sink::OutputSink;
use crate::value::SqlTime;

/// Write an array tag and element count.
pub fn write_array_header(sink: &mut dyn OutputSink, tag: u8, len: usize) -> Result<()> {
    let len = wire_len(len, "array")?;
    sink.reserve(5)?;
    sink.unchecked_write_u8(tag);
    sink.unchecked_write_i32(len);
    Ok(())
}

macro_rules! primitive_array {
    ($(#[$doc:meta] $name:ident($ty:ty, $tag:expr, $bulk:ident);)*) => {
        $(
            #[$doc]
            pub fn $name(sink: &mut dyn OutputSink, values: Option<&[$ty]>) -> Result<()> {
                let Some(values) = values else {
                    return write_null(sink);
                };
                write_array_header(sink, $tag, values.len())?;
                sink.$bulk(values)?;
                Ok(())
            }
        )*
    };
}

primitive_array! {
    /// Write a byte array, or null.
    write_byte_array(u8, tags::BYTE_ARR, write_bytes);
    /// Write a short array, or null.
    write_short_array(i16, tags::SHORT_ARR, write_i16_slice);
    /// Write an int array, or null.
    write_int_array(i32, tags::INT_ARR, write_i32_slice);
    /// Write a long array, or null.
    write_long_array(i64, tags::LONG_ARR, write_i64_slice);
    /// Write a float array, or null.
    write_float_array(f32, tags::FLOAT_ARR, write_f32_slice);
    /// Write a double array, or null.
    write_double_array(f64, tags::DOUBLE_ARR, write_f64_slice);
    /// Write a char array (UTF-16 code units), or null.
    write_char_array(u16, tags::CHAR_ARR, write_u16_slice);
    /// Write a boolean array, or null.
    write_bool_array(bool, tags::BOOL_ARR, write_bool_slice);
}

fn write_each<T>(
    sink: &mut dyn OutputSink,
    tag: u8,
    values: Option<&[Option<T>]>,
    mut write: impl FnMut(&mut dyn OutputSink, Option<&T>) -> Result<()>,
) -> Result<()> {
    let Some(values) = values else {
        return write_null(sink);
    };
    write_array_header(sink, tag, values.len())?;
    for value in values {
        write(&mut *sink, value.as_ref())?;
    }
    Ok(())
}

/// Write a string array with per-element null, or null.
pub fn write_string_array(
    sink: &mut dyn OutputSink,
    values: Option<&[Option<String>]>,
    encoding: StringEncoding,
) -> Result<()> {
    write_each(sink, tags::STRING_ARR, values, |sink, v| {
        scalar::write_str(sink, v.map(String::as_str), encoding)
    })
}

/// Write a UUID array with per-element null, or null.
pub fn write_uuid_array(sink: &mut dyn OutputSink, values: Option<&[Option<Uuid>]>) -> Result<()> {
    write_each(sink, tags::UUID_ARR, values, scalar::write_uuid)
}

/// Write a date array with per-element null, or null.
pub fn write_date_array(
    sink: &mut dyn OutputSink,
    values: Option<&[Option<DateTime<Utc>>]>,
) -> Result<()> {
    write_each(sink, tags::DATE_ARR, values, scalar::write_date)
}

/// Write a timestamp array with per-element null, or null.
pub fn write_timestamp_array(
    sink: &mut dyn OutputSink,
    values: Option<&[Option<DateTime<Utc>>]>,
) -> Result<()> {
    write_each(sink, tags::TIMESTAMP_ARR, values, scalar::write_timestamp)
}

/// Write a time array with per-element null, or null.
pub fn write_time_array(
    sink: &mut dyn OutputSink,
    values: Option<&[Option<SqlTime>]>,
) -> Result<()> {
    write_each(sink, tags::TIME_ARR, values, scalar::write_time)
}

/// Write a decimal array with per-element null, or null.
pub fn write_decimal_array(
    sink: &mut dyn OutputSink,
    values: Option<&[Option<Decimal>]>,
) -> Result<()> {
    write_each(sink, tags::DECIMAL_ARR, values, scalar::write_decimal)
}
