//! Output sink backed by anonymous mapped memory.

use gridwire_core::SinkError;
use memmap2::MmapMut;
use tracing::warn;

use super::{grown_capacity, OutputSink};

/// Output sink whose bytes live outside the Rust heap, in an anonymous memory
/// map.
///
/// Suitable when the encoded bytes are handed to native code or a page
/// cache by pointer ([`as_ptr`](OutputSink::as_ptr)). Growing remaps and
/// copies, so size the initial capacity generously.
#[derive(Debug)]
pub struct OffHeapOutputSink {
    map: MmapMut,
    pos: usize,
}

impl OffHeapOutputSink {
    /// Map `capacity` bytes of zeroed memory.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Allocation`] if the mapping fails.
    pub fn with_capacity(capacity: usize) -> Result<Self, SinkError> {
        let map = MmapMut::map_anon(capacity.max(1))?;
        Ok(Self { map, pos: 0 })
    }

    /// Rewind to position zero, keeping the mapping.
    pub fn clear(&mut self) {
        self.pos = 0;
    }
}

impl OutputSink for OffHeapOutputSink {
    fn position(&self) -> usize {
        self.pos
    }

    fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn capacity(&self) -> usize {
        self.map.len()
    }

    fn grow(&mut self, min_capacity: usize) -> Result<(), SinkError> {
        let new_capacity = grown_capacity(self.map.len(), min_capacity)?;
        warn!(from = self.map.len(), to = new_capacity, "remapping off-heap sink");

        let mut map = MmapMut::map_anon(new_capacity)?;
        map[..self.map.len()].copy_from_slice(&self.map);
        self.map = map;
        Ok(())
    }

    fn storage(&self) -> &[u8] {
        &self.map
    }

    fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.map
    }

    fn is_off_heap(&self) -> bool {
        true
    }
}
