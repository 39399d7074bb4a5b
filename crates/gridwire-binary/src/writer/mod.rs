//! The write path.
//!
//! A [`WriteSession`] carries the state of one root write: the output sink,
//! the shared [`SchemaTracker`](crate::SchemaTracker), the lazily created
//! [`HandleTable`](crate::HandleTable) and the registry. Every nested object is
//! written by an [`ObjectWriter`] borrowed from the same session, so nested
//! objects land inline in the parent's byte range and share back-references.
//!
//! ```text
//! +--------+-------------+----------------+---------+-----------+
//! | header | [type name] | fields ...     | [raw]   | [footer]  |
//! +--------+-------------+----------------+---------+-----------+
//!  24 bytes  unregistered  tag + payload             id/offsets
//! ```

mod object;
mod raw;
mod session;

pub use object::{array_identity_hash, ObjectWriter, WrittenObject};
pub use raw::RawWriter;
pub use session::WriteSession;
