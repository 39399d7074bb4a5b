//! `Vec`-backed output sink.

use gridwire_core::SinkError;
use tracing::trace;

use super::{grown_capacity, OutputSink};

/// Output sink backed by a heap-allocated byte vector.
///
/// The vector is kept zero-filled up to its capacity so any position inside
/// the capacity can be addressed directly.
#[derive(Debug, Clone, Default)]
pub struct HeapOutputSink {
    data: Vec<u8>,
    pos: usize,
}

impl HeapOutputSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink with `capacity` bytes pre-allocated.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: vec![0; capacity], pos: 0 }
    }

    /// Rewind to position zero, keeping the allocation.
    pub fn clear(&mut self) {
        self.pos = 0;
    }

    /// Consume the sink and return the written bytes.
    #[must_use]
    pub fn into_vec(mut self) -> Vec<u8> {
        self.data.truncate(self.pos);
        self.data
    }
}

impl OutputSink for HeapOutputSink {
    fn position(&self) -> usize {
        self.pos
    }

    fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }

    fn grow(&mut self, min_capacity: usize) -> Result<(), SinkError> {
        let new_capacity = grown_capacity(self.data.len(), min_capacity)?;
        trace!(from = self.data.len(), to = new_capacity, "growing heap sink");
        resize_zeroed(&mut self.data, new_capacity)
    }

    fn storage(&self) -> &[u8] {
        &self.data
    }

    fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Zero-extend `data` to `new_len`, reporting allocation failure instead of aborting.
fn resize_zeroed(data: &mut Vec<u8>, new_len: usize) -> Result<(), SinkError> {
    data.try_reserve_exact(new_len.saturating_sub(data.len()))
        .map_err(|_| SinkError::OutOfMemory { requested: new_len })?;
    data.resize(new_len, 0);
    Ok(())
}
