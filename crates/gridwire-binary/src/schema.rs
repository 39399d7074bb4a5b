//! Field schema tracking shared by nested object writers.

use gridwire_core::protocol::OffsetWidth;
use gridwire_core::{BinarySchema, Result};

use crate::sink::OutputSink;

/// Append-only record of `(field id, field offset)` pairs.
///
/// One tracker serves a whole root write. Each object writer pushes its
/// fields on top, reads back its own last `count` entries when it writes the
/// footer, then pops them, so a parent only ever sees its own fields.
#[derive(Debug, Clone, Default)]
pub struct SchemaTracker {
    entries: Vec<(i32, u32)>,
}

impl SchemaTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one field.
    pub fn push(&mut self, field_id: i32, offset: u32) {
        self.entries.push((field_id, offset));
    }

    /// Drop the last `count` entries.
    pub fn pop(&mut self, count: usize) {
        let keep = self.entries.len().saturating_sub(count);
        self.entries.truncate(keep);
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Total number of entries across all open writers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `field_id` occurs among the last `count` entries.
    #[must_use]
    pub fn contains_last(&self, count: usize, field_id: i32) -> bool {
        self.last(count).iter().any(|&(id, _)| id == field_id)
    }

    /// Schema of the last `count` entries.
    #[must_use]
    pub fn build(&self, count: usize) -> BinarySchema {
        BinarySchema::from_field_ids(self.last(count).iter().map(|&(id, _)| id))
    }

    /// Write the footer for the last `count` entries and return the offset
    /// width used.
    ///
    /// The width is picked from the last entry's offset, which is the largest
    /// since offsets only grow within one object. Compact footers carry
    /// offsets only.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot grow.
    pub fn write_footer(
        &self,
        sink: &mut dyn OutputSink,
        count: usize,
        compact: bool,
    ) -> Result<OffsetWidth> {
        let entries = self.last(count);
        let max_offset = entries.last().map_or(0, |&(_, offset)| offset as usize);
        let width = OffsetWidth::for_offset(max_offset);

        let entry_len = width.bytes() + if compact { 0 } else { 4 };
        sink.reserve(entries.len() * entry_len)?;

        for &(field_id, offset) in entries {
            if !compact {
                sink.unchecked_write_i32(field_id);
            }
            match width {
                OffsetWidth::One => sink.unchecked_write_u8(offset as u8),
                OffsetWidth::Two => sink.unchecked_write_i16(offset as u16 as i16),
                OffsetWidth::Four => sink.unchecked_write_i32(offset as i32),
            }
        }
        Ok(width)
    }

    fn last(&self, count: usize) -> &[(i32, u32)] {
        let from = self.entries.len().saturating_sub(count);
        &self.entries[from..]
    }
}
