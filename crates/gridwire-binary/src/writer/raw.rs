//! Positional writes into an object's raw section.

use gridwire_core::Result;

use super::WriteSession;
use crate::sink::OutputSink;
use crate::value::Value;

/// Writes the raw section of an object.
///
/// Primitive writes are untagged; the reader must know the layout. Value
/// writes are tagged like fields but carry no field id.
pub struct RawWriter<'w, 'a> {
    session: &'w mut WriteSession<'a>,
}

impl<'w, 'a> RawWriter<'w, 'a> {
    pub(super) fn new(session: &'w mut WriteSession<'a>) -> Self {
        Self { session }
    }

    fn sink(&mut self) -> &mut dyn OutputSink {
        &mut *self.session.sink
    }

    /// Write one untagged byte.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot grow.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        Ok(self.sink().write_u8(value)?)
    }

    /// Write an untagged `i16`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot grow.
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        Ok(self.sink().write_i16(value)?)
    }

    /// Write an untagged UTF-16 code unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot grow.
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        Ok(self.sink().write_u16(value)?)
    }

    /// Write an untagged `i32`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot grow.
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        Ok(self.sink().write_i32(value)?)
    }

    /// Write an untagged `i64`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot grow.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        Ok(self.sink().write_i64(value)?)
    }

    /// Write an untagged `f32`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot grow.
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        Ok(self.sink().write_f32(value)?)
    }

    /// Write an untagged `f64`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot grow.
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        Ok(self.sink().write_f64(value)?)
    }

    /// Write an untagged boolean.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot grow.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        Ok(self.sink().write_bool(value)?)
    }

    /// Write bytes as they are, without tag or length.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot grow.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        Ok(self.sink().write_bytes(bytes)?)
    }

    /// Write a tagged string.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot grow.
    pub fn write_str(&mut self, value: Option<&str>) -> Result<()> {
        let encoding = self.session.encoding;
        crate::encoding::write_str(self.sink(), value, encoding)
    }

    /// Write any tagged value.
    ///
    /// # Errors
    ///
    /// Same as [`WriteSession::write_value`].
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        self.session.write_value(value)
    }

    /// Write a tagged value with its own handle table.
    ///
    /// # Errors
    ///
    /// Same as [`WriteSession::write_value`].
    pub fn write_value_detached(&mut self, value: &Value) -> Result<()> {
        self.session.write_value_detached(value)
    }

    /// Skip four bytes to be filled later with [`write_i32_at`](Self::write_i32_at),
    /// returning their position.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot grow.
    pub fn reserve_i32(&mut self) -> Result<usize> {
        let sink = self.sink();
        let pos = sink.position();
        sink.reserve(4)?;
        sink.set_position(pos + 4);
        Ok(pos)
    }

    /// Fill four bytes previously skipped by [`reserve_i32`](Self::reserve_i32).
    pub fn write_i32_at(&mut self, pos: usize, value: i32) {
        self.sink().write_i32_at(pos, value);
    }
}
