//! Value encoders.
//!
//! One routine per wire category. Each writes the category's tag followed by
//! its payload, or the null tag for an absent value. These encoders are
//! context-free: anything that needs the registry or the handle table
//! (objects, collections, maps, enums) lives in [`crate::writer`].

mod array;
mod scalar;
mod string;

#[cfg(test)]
mod proptest_tests;

pub use array::{
    write_array_header, write_bool_array, write_byte_array, write_char_array, write_date_array,
    write_decimal_array, write_double_array, write_float_array, write_int_array,
    write_long_array, write_short_array, write_string_array, write_time_array,
    write_timestamp_array, write_uuid_array,
};
pub use scalar::{
    write_binary_object, write_bool, write_byte, write_char, write_date, write_decimal,
    write_double, write_float, write_int, write_long, write_null, write_short, write_str,
    write_time, write_timestamp, write_utf16, write_uuid,
};
pub use string::{str_bytes, utf16_bytes};
