//! Error types for binary object encoding.

use thiserror::Error;

/// Maximum length for a type name in error messages.
const MAX_NAME_DISPLAY_LEN: usize = 100;

/// Result alias used across gridwire crates.
pub type Result<T> = std::result::Result<T, BinaryError>;

/// Errors raised by an output sink when it cannot hold more bytes.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The requested capacity does not fit in the sink's addressable range.
    #[error("sink capacity overflow: {requested} bytes requested")]
    CapacityOverflow {
        /// Total capacity that was requested.
        requested: usize,
    },

    /// The allocator refused to grow the sink.
    #[error("out of memory growing sink to {requested} bytes")]
    OutOfMemory {
        /// Total capacity that was requested.
        requested: usize,
    },

    /// The backing memory could not be allocated.
    #[error("failed to allocate sink memory: {0}")]
    Allocation(#[from] std::io::Error),
}

/// Errors that abort a binary object write.
///
/// Every variant is fatal for the write in progress. Bytes written before the
/// error are garbage and must not be handed to a reader.
#[derive(Debug, Error)]
pub enum BinaryError {
    /// The registry has no id for the type.
    #[error("failed to resolve type: {type_name}")]
    UnresolvedType {
        /// The offending type name (truncated for display).
        type_name: String,
    },

    /// The type is unknown cluster-wide and the writer refuses inline names.
    #[error("type is not registered: {type_name}")]
    UnregisteredType {
        /// The offending type name (truncated for display).
        type_name: String,
    },

    /// A named field was written after raw mode was entered.
    #[error("individual field can't be written after raw writer is acquired")]
    RawModeActive,

    /// The type has no field id mapper yet.
    #[error("no field id mapping for field '{field}' of type {type_id}")]
    UnresolvedField {
        /// Type id of the object being written.
        type_id: i32,
        /// Field name supplied by the caller.
        field: String,
    },

    /// The same field id was written twice into one object.
    #[error("duplicate field id {field_id} in one object")]
    DuplicateField {
        /// The repeated field id.
        field_id: i32,
    },

    /// A length, count or offset does not fit the wire's 32-bit slot.
    #[error("value too large: {0}")]
    TooLarge(String),

    /// The output sink failed.
    #[error("output sink error: {0}")]
    Sink(#[from] SinkError),
}

impl BinaryError {
    /// Creates a resolution error for `type_name`.
    #[must_use]
    pub fn unresolved_type(type_name: &str) -> Self {
        Self::UnresolvedType { type_name: truncate(type_name) }
    }

    /// Creates an unregistered-type error for `type_name`.
    #[must_use]
    pub fn unregistered_type(type_name: &str) -> Self {
        Self::UnregisteredType { type_name: truncate(type_name) }
    }

    /// Creates an unresolved-field error.
    #[must_use]
    pub fn unresolved_field(type_id: i32, field: impl Into<String>) -> Self {
        Self::UnresolvedField { type_id, field: field.into() }
    }

    /// Creates a too-large error naming what overflowed.
    #[must_use]
    pub fn too_large(what: impl Into<String>) -> Self {
        Self::TooLarge(what.into())
    }

    /// Returns `true` for registry resolution failures.
    #[must_use]
    pub const fn is_resolution(&self) -> bool {
        matches!(self, Self::UnresolvedType { .. } | Self::UnregisteredType { .. })
    }
}

fn truncate(name: &str) -> String {
    if name.len() > MAX_NAME_DISPLAY_LEN {
        let mut end = MAX_NAME_DISPLAY_LEN;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &name[..end])
    } else {
        name.to_owned()
    }
}

/// Converts a length or count into the wire's `i32`.
///
/// # Errors
///
/// Returns [`BinaryError::TooLarge`] when `len` exceeds `i32::MAX`.
pub fn wire_len(len: usize, what: &str) -> Result<i32> {
    i32::try_from(len).map_err(|_| BinaryError::too_large(format!("{what} length {len}")))
}
