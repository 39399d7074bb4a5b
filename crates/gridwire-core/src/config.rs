//! Encoding configuration.

use serde::{Deserialize, Serialize};

/// Default initial capacity of a scratch output buffer.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// Strategy used to turn UTF-16 input into UTF-8 bytes.
///
/// Both strategies produce identical bytes for text in the Basic Multilingual
/// Plane. They differ only in how surrogate code units are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringEncoding {
    /// Standard UTF-8: pairs become one 4-byte sequence, unpaired surrogates
    /// become `?`.
    #[default]
    V1,
    /// Every UTF-16 code unit is encoded on its own, so a surrogate (paired or
    /// not) becomes a 3-byte sequence.
    V2,
}

/// Cluster-wide options that shape the bytes a writer produces.
///
/// # Parameters
///
/// * `compact_footer` - Write footers as offsets only, relying on the
///   registry's cached schema for field ids. Only applies to user types.
///
/// * `string_encoding` - UTF-16 conversion strategy, see [`StringEncoding`].
///
/// * `fail_if_unregistered` - Reject types without a cluster-stable id instead
///   of writing their names inline.
///
/// * `identity_hash` - Fill the header's hash code slot after each object.
///   JVM peers read that slot as the object's hash, so interop with them needs
///   this enabled. Off by default, which leaves the slot zero.
///
/// * `initial_capacity` - Starting size of scratch buffers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryConfig {
    /// Offset-only footers for user types.
    pub compact_footer: bool,
    /// UTF-16 conversion strategy.
    pub string_encoding: StringEncoding,
    /// Refuse unregistered types.
    pub fail_if_unregistered: bool,
    /// Compute identity hash codes. Required for JVM interop.
    pub identity_hash: bool,
    /// Scratch buffer starting size in bytes.
    pub initial_capacity: usize,
}

impl Default for BinaryConfig {
    fn default() -> Self {
        Self {
            compact_footer: true,
            string_encoding: StringEncoding::V1,
            fail_if_unregistered: false,
            identity_hash: false,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

impl BinaryConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable compact footers.
    #[must_use]
    pub const fn with_compact_footer(mut self, enabled: bool) -> Self {
        self.compact_footer = enabled;
        self
    }

    /// Set the string conversion strategy.
    #[must_use]
    pub const fn with_string_encoding(mut self, encoding: StringEncoding) -> Self {
        self.string_encoding = encoding;
        self
    }

    /// Refuse types without a registered id.
    #[must_use]
    pub const fn with_fail_if_unregistered(mut self, fail: bool) -> Self {
        self.fail_if_unregistered = fail;
        self
    }

    /// Fill identity hash codes into headers. Enable when JVM nodes read the output.
    #[must_use]
    pub const fn with_identity_hash(mut self, enabled: bool) -> Self {
        self.identity_hash = enabled;
        self
    }

    /// Set the scratch buffer starting size. Zero is bumped to one byte.
    #[must_use]
    pub const fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = if capacity == 0 { 1 } else { capacity };
        self
    }
}
