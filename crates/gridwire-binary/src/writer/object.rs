//! Writer for one binary object.

use chrono::{DateTime, Utc};
use gridwire_core::protocol::{
    flags, schema_initial_id, tags, update_schema_id, HASH_CODE_POS, HEADER_LEN, PROTO_VER,
    UNREGISTERED_TYPE_ID,
};
use gridwire_core::{wire_len, BinaryError, BinarySchema, Decimal, Result};
use tracing::{debug, trace};
use uuid::Uuid;

use super::{RawWriter, WriteSession};
use crate::encoding;
use crate::value::{EnumValue, ObjectRef, SqlTime, Value};

/// Summary of a finished object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrittenObject {
    /// Absolute position of the header.
    pub start: usize,
    /// Total length, header to end of footer.
    pub len: usize,
    /// Schema id in the header, `0` without a schema.
    pub schema_id: i32,
    /// Number of named fields.
    pub field_count: usize,
}

/// Writes one binary object: header, fields, optional raw section, footer.
///
/// Created by [`begin`](Self::begin), which reserves the header, and consumed
/// by [`finish`](Self::finish), which writes the footer and fills the header
/// in. A writer dropped without `finish` leaves garbage in the sink; the root
/// write must then be abandoned.
///
/// Nested objects written through a field reuse the same session, so they
/// land inline and share the schema tracker and handle table.
pub struct ObjectWriter<'s, 'a> {
    session: &'s mut WriteSession<'a>,
    start: usize,
    data_start: usize,
    type_id: i32,
    registered: bool,
    schema_id: i32,
    field_count: usize,
    raw_offset: Option<usize>,
}

impl<'s, 'a> ObjectWriter<'s, 'a> {
    /// Reserve a header at the sink's position.
    ///
    /// `inline_name` is the type name of an unregistered type; it is written
    /// right after the header and the header's type id becomes
    /// [`UNREGISTERED_TYPE_ID`].
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot grow.
    pub fn begin(
        session: &'s mut WriteSession<'a>,
        type_id: i32,
        inline_name: Option<&str>,
    ) -> Result<Self> {
        let start = session.sink.position();
        session.sink.reserve(HEADER_LEN)?;
        session.sink.set_position(start + HEADER_LEN);

        if inline_name.is_some() {
            encoding::write_str(&mut *session.sink, inline_name, session.encoding)?;
        }
        let data_start = session.sink.position();

        Ok(Self {
            session,
            start,
            data_start,
            type_id,
            registered: inline_name.is_none(),
            schema_id: schema_initial_id(),
            field_count: 0,
            raw_offset: None,
        })
    }

    /// Type id used for field resolution.
    #[must_use]
    pub const fn type_id(&self) -> i32 {
        self.type_id
    }

    /// Absolute position of the header.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Running schema id.
    #[must_use]
    pub const fn schema_id(&self) -> i32 {
        self.schema_id
    }

    /// Override the schema id, for callers that know it in advance and write
    /// fields with [`write_field_id_no_schema_update`](Self::write_field_id_no_schema_update).
    pub fn set_schema_id(&mut self, schema_id: i32) {
        self.schema_id = schema_id;
    }

    /// Number of named fields written so far.
    #[must_use]
    pub const fn field_count(&self) -> usize {
        self.field_count
    }

    /// Schema of the fields written so far.
    #[must_use]
    pub fn current_schema(&self) -> BinarySchema {
        self.session.schema.build(self.field_count)
    }

    /// The underlying session, for writing values outside the field protocol.
    pub fn session(&mut self) -> &mut WriteSession<'a> {
        self.session
    }

    fn push_field(&mut self, field_id: i32, update_schema: bool) -> Result<()> {
        if self.raw_offset.is_some() {
            return Err(BinaryError::RawModeActive);
        }
        if self.session.schema.contains_last(self.field_count, field_id) {
            return Err(BinaryError::DuplicateField { field_id });
        }

        let offset = self.session.sink.position() - self.start;
        let offset = u32::try_from(offset)
            .map_err(|_| BinaryError::too_large(format!("field offset {offset}")))?;
        self.session.schema.push(field_id, offset);
        if update_schema {
            self.schema_id = update_schema_id(self.schema_id, field_id);
        }
        self.field_count += 1;
        Ok(())
    }

    fn begin_field(&mut self, name: &str) -> Result<()> {
        if self.raw_offset.is_some() {
            return Err(BinaryError::RawModeActive);
        }
        let field_id = self
            .session
            .registry
            .field_id(self.type_id, name)
            .ok_or_else(|| BinaryError::unresolved_field(self.type_id, name))?;
        self.push_field(field_id, true)
    }

    /// Write a named field.
    ///
    /// # Errors
    ///
    /// Returns [`BinaryError::RawModeActive`] after [`raw_writer`](Self::raw_writer),
    /// [`BinaryError::UnresolvedField`] if the registry has no field id,
    /// [`BinaryError::DuplicateField`] on a repeated field, or any error of
    /// the value itself.
    pub fn write_field(&mut self, name: &str, value: &Value) -> Result<()> {
        self.begin_field(name)?;
        self.session.write_value(value)
    }

    /// Write a field whose id is already known.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field), minus field resolution.
    pub fn write_field_id(&mut self, field_id: i32, value: &Value) -> Result<()> {
        self.push_field(field_id, true)?;
        self.session.write_value(value)
    }

    /// Write a field without folding its id into the schema id.
    ///
    /// # Errors
    ///
    /// Same as [`write_field_id`](Self::write_field_id).
    pub fn write_field_id_no_schema_update(&mut self, field_id: i32, value: &Value) -> Result<()> {
        self.push_field(field_id, false)?;
        self.session.write_value(value)
    }

    /// Write a named field with its own handle table.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_field_detached(&mut self, name: &str, value: &Value) -> Result<()> {
        self.begin_field(name)?;
        self.session.write_value_detached(value)
    }

    /// Write a `byte` field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_byte(&mut self, name: &str, value: u8) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_byte(&mut *self.session.sink, value)
    }

    /// Write a `short` field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_short(&mut self, name: &str, value: i16) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_short(&mut *self.session.sink, value)
    }

    /// Write an `int` field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_int(&mut self, name: &str, value: i32) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_int(&mut *self.session.sink, value)
    }

    /// Write a `long` field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_long(&mut self, name: &str, value: i64) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_long(&mut *self.session.sink, value)
    }

    /// Write a `float` field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_float(&mut self, name: &str, value: f32) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_float(&mut *self.session.sink, value)
    }

    /// Write a `double` field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_double(&mut self, name: &str, value: f64) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_double(&mut *self.session.sink, value)
    }

    /// Write a `char` field (one UTF-16 code unit).
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_char(&mut self, name: &str, value: u16) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_char(&mut *self.session.sink, value)
    }

    /// Write a `bool` field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_bool(&mut self, name: &str, value: bool) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_bool(&mut *self.session.sink, value)
    }

    /// Write a string field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_str(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_str(&mut *self.session.sink, value, self.session.encoding)
    }

    /// Write a string field from UTF-16 code units.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_utf16(&mut self, name: &str, value: Option<&[u16]>) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_utf16(&mut *self.session.sink, value, self.session.encoding)
    }

    /// Write a UUID field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_uuid(&mut self, name: &str, value: Option<&Uuid>) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_uuid(&mut *self.session.sink, value)
    }

    /// Write a date field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_date(&mut self, name: &str, value: Option<&DateTime<Utc>>) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_date(&mut *self.session.sink, value)
    }

    /// Write a timestamp field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_timestamp(&mut self, name: &str, value: Option<&DateTime<Utc>>) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_timestamp(&mut *self.session.sink, value)
    }

    /// Write a SQL time field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_time(&mut self, name: &str, value: Option<&SqlTime>) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_time(&mut *self.session.sink, value)
    }

    /// Write a decimal field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_decimal(&mut self, name: &str, value: Option<&Decimal>) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_decimal(&mut *self.session.sink, value)
    }

    /// Write a byte array field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_byte_array(&mut self, name: &str, value: Option<&[u8]>) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_byte_array(&mut *self.session.sink, value)
    }

    /// Write an int array field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_int_array(&mut self, name: &str, value: Option<&[i32]>) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_int_array(&mut *self.session.sink, value)
    }

    /// Write a long array field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_long_array(&mut self, name: &str, value: Option<&[i64]>) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_long_array(&mut *self.session.sink, value)
    }

    /// Write a double array field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_double_array(&mut self, name: &str, value: Option<&[f64]>) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_double_array(&mut *self.session.sink, value)
    }

    /// Write a string array field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_string_array(
        &mut self,
        name: &str,
        value: Option<&[Option<String>]>,
    ) -> Result<()> {
        self.begin_field(name)?;
        encoding::write_string_array(&mut *self.session.sink, value, self.session.encoding)
    }

    /// Write a nested object field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_object(&mut self, name: &str, value: Option<&ObjectRef>) -> Result<()> {
        self.begin_field(name)?;
        match value {
            Some(object) => self.session.write_object(object),
            None => encoding::write_null(&mut *self.session.sink),
        }
    }

    /// Write an enum field.
    ///
    /// # Errors
    ///
    /// Same as [`write_field`](Self::write_field).
    pub fn write_enum(&mut self, name: &str, value: Option<&EnumValue>) -> Result<()> {
        self.begin_field(name)?;
        match value {
            Some(value) => self.session.write_value(&Value::Enum(value.clone())),
            None => encoding::write_null(&mut *self.session.sink),
        }
    }

    /// Switch to raw mode and return a positional writer.
    ///
    /// The raw section starts at the current position the first time this is
    /// called. Named fields are rejected afterwards.
    pub fn raw_writer(&mut self) -> RawWriter<'_, 'a> {
        if self.raw_offset.is_none() {
            self.raw_offset = Some(self.session.sink.position());
        }
        RawWriter::new(self.session)
    }

    /// Write the footer and fill the header in.
    ///
    /// When the registry has not seen this object's schema yet it is added,
    /// so compact footers can be read back. With identity hashing enabled the
    /// header's hash code slot is filled as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot grow or the object exceeds the
    /// wire's 32-bit offsets.
    pub fn finish(mut self, user_type: bool) -> Result<WrittenObject> {
        let compact = user_type && self.session.compact_footer;
        let mut header_flags = 0;
        if user_type {
            header_flags |= flags::USER_TYPE;
            if compact {
                header_flags |= flags::COMPACT_FOOTER;
            }
        }

        let (schema_id, offset) = if self.field_count != 0 {
            let offset = self.relative(self.session.sink.position())?;
            header_flags |= flags::HAS_SCHEMA;
            let width = self.session.schema.write_footer(
                &mut *self.session.sink,
                self.field_count,
                compact,
            )?;
            header_flags |= width.flag();
            if let Some(raw) = self.raw_offset {
                header_flags |= flags::HAS_RAW;
                let raw = self.relative(raw)?;
                self.session.sink.write_i32(raw)?;
            }
            (self.schema_id, offset)
        } else if let Some(raw) = self.raw_offset {
            header_flags |= flags::HAS_RAW;
            (0, self.relative(raw)?)
        } else {
            (0, 0)
        };

        let end = self.session.sink.position();
        let total_len = self.relative(end)?;
        let header_type_id = if self.registered { self.type_id } else { UNREGISTERED_TYPE_ID };

        let sink = &mut *self.session.sink;
        sink.set_position(self.start);
        sink.unchecked_write_u8(tags::OBJ);
        sink.unchecked_write_u8(PROTO_VER);
        sink.unchecked_write_i16(header_flags as i16);
        sink.unchecked_write_i32(header_type_id);
        sink.unchecked_write_i32(0);
        sink.unchecked_write_i32(total_len);
        sink.unchecked_write_i32(schema_id);
        sink.unchecked_write_i32(offset);
        sink.set_position(end);

        if self.field_count != 0 {
            self.register_schema(schema_id);
        }
        if self.session.identity_hash {
            let footer_start =
                if self.field_count != 0 { self.start + offset as usize } else { end };
            let data = &self.session.sink.storage()[self.data_start..footer_start];
            let hash = array_identity_hash(data);
            self.session.sink.write_i32_at(self.start + HASH_CODE_POS, hash);
        }

        trace!(
            type_id = self.type_id,
            len = total_len,
            fields = self.field_count,
            flags = header_flags,
            "object written"
        );
        Ok(WrittenObject {
            start: self.start,
            len: end - self.start,
            schema_id,
            field_count: self.field_count,
        })
    }

    fn register_schema(&mut self, schema_id: i32) {
        let registry = self.session.registry;
        if !registry.has_schema(self.type_id, schema_id) {
            debug!(
                type_id = self.type_id,
                schema_id,
                fields = self.field_count,
                "new object schema"
            );
            let schema = self.session.schema.build(self.field_count);
            registry.add_schema(self.type_id, schema);
        }
    }

    fn relative(&self, pos: usize) -> Result<i32> {
        wire_len(pos - self.start, "object")
    }
}

impl Drop for ObjectWriter<'_, '_> {
    fn drop(&mut self) {
        self.session.schema.pop(self.field_count);
    }
}

/// Identity hash of an object's data region: `h = 31 * h + byte`, starting at
/// `1`, with bytes taken as signed.
#[must_use]
pub fn array_identity_hash(data: &[u8]) -> i32 {
    data.iter()
        .fold(1i32, |hash, &byte| hash.wrapping_mul(31).wrapping_add(i32::from(byte as i8)))
}
