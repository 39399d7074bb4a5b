//! Output sinks: growable, position-addressable byte storage.
//!
//! An [`OutputSink`] exposes a cursor ([`position`](OutputSink::position)) that
//! can be moved anywhere inside the allocated capacity, so a writer can reserve
//! a header, append fields, then seek back and fill the header in.
//!
//! Implementations only provide storage and growth. Every typed write is a
//! provided method, so all sinks produce identical little-endian bytes.
//!
//! Two flavours of writes exist:
//!
//! - checked (`write_*`): grow the storage if needed;
//! - unchecked (`unchecked_write_*`): assume the caller already called
//!   [`reserve`](OutputSink::reserve) for at least that many bytes.
//!
//! Sinks:
//!
//! - [`HeapOutputSink`] - backed by a `Vec<u8>`
//! - [`OffHeapOutputSink`] - backed by anonymous mapped memory

mod heap;
mod offheap;

pub use heap::HeapOutputSink;
pub use offheap::OffHeapOutputSink;

use gridwire_core::SinkError;

/// Largest capacity a sink may reach; every offset must fit the wire's `i32`.
pub const MAX_CAPACITY: usize = i32::MAX as usize;

/// Computes the next capacity for a sink that must hold `needed` bytes.
pub(crate) fn grown_capacity(current: usize, needed: usize) -> Result<usize, SinkError> {
    if needed > MAX_CAPACITY {
        return Err(SinkError::CapacityOverflow { requested: needed });
    }
    Ok(current.saturating_mul(2).clamp(needed, MAX_CAPACITY))
}

/// Growable byte storage with random-access positioning.
pub trait OutputSink {
    /// Current write position.
    fn position(&self) -> usize;

    /// Move the write position. `pos` may point past written bytes but must
    /// stay within [`capacity`](Self::capacity) before the next unchecked write.
    fn set_position(&mut self, pos: usize);

    /// Allocated size in bytes.
    fn capacity(&self) -> usize;

    /// Grow the storage to at least `min_capacity` bytes, keeping content.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the storage cannot grow.
    fn grow(&mut self, min_capacity: usize) -> Result<(), SinkError>;

    /// The whole allocated storage.
    fn storage(&self) -> &[u8];

    /// The whole allocated storage, mutably.
    fn storage_mut(&mut self) -> &mut [u8];

    /// Whether the storage lives outside the Rust heap.
    fn is_off_heap(&self) -> bool {
        false
    }

    /// Raw pointer to the start of the storage.
    ///
    /// The pointer is invalidated by any call that may grow the sink.
    fn as_ptr(&self) -> *const u8 {
        self.storage().as_ptr()
    }

    /// Make room for `additional` bytes after the current position.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::CapacityOverflow`] if the total exceeds
    /// [`MAX_CAPACITY`], [`SinkError::OutOfMemory`] if the heap refuses the
    /// growth, or an allocation error from the backing storage.
    fn reserve(&mut self, additional: usize) -> Result<(), SinkError> {
        let needed = self
            .position()
            .checked_add(additional)
            .ok_or(SinkError::CapacityOverflow { requested: usize::MAX })?;
        if needed > self.capacity() {
            self.grow(needed)?;
        }
        Ok(())
    }

    /// Bytes from the start of the storage up to the current position.
    fn written(&self) -> &[u8] {
        &self.storage()[..self.position()]
    }

    /// Copy the written bytes out.
    fn to_vec(&self) -> Vec<u8> {
        self.written().to_vec()
    }

    /// Write raw bytes without a growth check.
    fn unchecked_write_bytes(&mut self, bytes: &[u8]) {
        let pos = self.position();
        self.storage_mut()[pos..pos + bytes.len()].copy_from_slice(bytes);
        self.set_position(pos + bytes.len());
    }

    /// Write one byte without a growth check.
    fn unchecked_write_u8(&mut self, value: u8) {
        self.unchecked_write_bytes(&[value]);
    }

    /// Write an `i16` without a growth check.
    fn unchecked_write_i16(&mut self, value: i16) {
        self.unchecked_write_bytes(&value.to_le_bytes());
    }

    /// Write a UTF-16 code unit without a growth check.
    fn unchecked_write_u16(&mut self, value: u16) {
        self.unchecked_write_bytes(&value.to_le_bytes());
    }

    /// Write an `i32` without a growth check.
    fn unchecked_write_i32(&mut self, value: i32) {
        self.unchecked_write_bytes(&value.to_le_bytes());
    }

    /// Write an `i64` without a growth check.
    fn unchecked_write_i64(&mut self, value: i64) {
        self.unchecked_write_bytes(&value.to_le_bytes());
    }

    /// Write an `f32` without a growth check.
    fn unchecked_write_f32(&mut self, value: f32) {
        self.unchecked_write_bytes(&value.to_le_bytes());
    }

    /// Write an `f64` without a growth check.
    fn unchecked_write_f64(&mut self, value: f64) {
        self.unchecked_write_bytes(&value.to_le_bytes());
    }

    /// Write a boolean as `0` or `1` without a growth check.
    fn unchecked_write_bool(&mut self, value: bool) {
        self.unchecked_write_u8(u8::from(value));
    }

    /// Write raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        self.reserve(bytes.len())?;
        self.unchecked_write_bytes(bytes);
        Ok(())
    }

    /// Write `len` bytes of `bytes` starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    ///
    /// # Panics
    ///
    /// Panics if `offset..offset + len` is out of bounds of `bytes`.
    fn write_bytes_range(
        &mut self,
        bytes: &[u8],
        offset: usize,
        len: usize,
    ) -> Result<(), SinkError> {
        self.write_bytes(&bytes[offset..offset + len])
    }

    /// Write one byte.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_u8(&mut self, value: u8) -> Result<(), SinkError> {
        self.write_bytes(&[value])
    }

    /// Write an `i16`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_i16(&mut self, value: i16) -> Result<(), SinkError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write a UTF-16 code unit.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_u16(&mut self, value: u16) -> Result<(), SinkError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write an `i32`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_i32(&mut self, value: i32) -> Result<(), SinkError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write an `i64`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_i64(&mut self, value: i64) -> Result<(), SinkError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write an `f32`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_f32(&mut self, value: f32) -> Result<(), SinkError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write an `f64`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_f64(&mut self, value: f64) -> Result<(), SinkError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write a boolean.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_bool(&mut self, value: bool) -> Result<(), SinkError> {
        self.write_u8(u8::from(value))
    }

    /// Overwrite an `i32` at an absolute position without moving the cursor.
    ///
    /// # Panics
    ///
    /// Panics if `pos + 4` exceeds the capacity.
    fn write_i32_at(&mut self, pos: usize, value: i32) {
        self.storage_mut()[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Bulk write of `i16` values.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_i16_slice(&mut self, values: &[i16]) -> Result<(), SinkError> {
        write_le_slice(self, values, 2, |v, out| out.copy_from_slice(&v.to_le_bytes()))
    }

    /// Bulk write of UTF-16 code units.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_u16_slice(&mut self, values: &[u16]) -> Result<(), SinkError> {
        write_le_slice(self, values, 2, |v, out| out.copy_from_slice(&v.to_le_bytes()))
    }

    /// Bulk write of `i32` values.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_i32_slice(&mut self, values: &[i32]) -> Result<(), SinkError> {
        write_le_slice(self, values, 4, |v, out| out.copy_from_slice(&v.to_le_bytes()))
    }

    /// Bulk write of `i64` values.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_i64_slice(&mut self, values: &[i64]) -> Result<(), SinkError> {
        write_le_slice(self, values, 8, |v, out| out.copy_from_slice(&v.to_le_bytes()))
    }

    /// Bulk write of `f32` values.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_f32_slice(&mut self, values: &[f32]) -> Result<(), SinkError> {
        write_le_slice(self, values, 4, |v, out| out.copy_from_slice(&v.to_le_bytes()))
    }

    /// Bulk write of `f64` values.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_f64_slice(&mut self, values: &[f64]) -> Result<(), SinkError> {
        write_le_slice(self, values, 8, |v, out| out.copy_from_slice(&v.to_le_bytes()))
    }

    /// Bulk write of booleans, one byte each.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the sink cannot grow.
    fn write_bool_slice(&mut self, values: &[bool]) -> Result<(), SinkError> {
        write_le_slice(self, values, 1, |v, out| out[0] = u8::from(*v))
    }
}

fn write_le_slice<S, T>(
    sink: &mut S,
    values: &[T],
    width: usize,
    encode: impl Fn(&T, &mut [u8]),
) -> Result<(), SinkError>
where
    S: OutputSink + ?Sized,
{
    let len = values
        .len()
        .checked_mul(width)
        .ok_or(SinkError::CapacityOverflow { requested: usize::MAX })?;
    sink.reserve(len)?;

    let pos = sink.position();
    let out = &mut sink.storage_mut()[pos..pos + len];
    for (value, chunk) in values.iter().zip(out.chunks_exact_mut(width)) {
        encode(value, chunk);
    }
    sink.set_position(pos + len);
    Ok(())
}
