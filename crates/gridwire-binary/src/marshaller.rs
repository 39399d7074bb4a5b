//! Entry point for root writes.

use std::sync::Arc;

use gridwire_core::{BinaryConfig, Result, TypeRegistry};
use tracing::debug;

use crate::schema::SchemaTracker;
use crate::sink::{HeapOutputSink, OutputSink};
use crate::value::Value;
use crate::writer::WriteSession;

/// Reusable buffers for root writes.
///
/// Keep one per thread (or in a pool) and pass it to
/// [`Marshaller::marshal_with`] to avoid allocating for every write.
#[derive(Debug, Default)]
pub struct EncodeScratch {
    sink: HeapOutputSink,
    schema: SchemaTracker,
}

impl EncodeScratch {
    /// Create scratch buffers with `capacity` bytes pre-allocated.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { sink: HeapOutputSink::with_capacity(capacity), schema: SchemaTracker::new() }
    }

    /// Forget any content, keeping allocations.
    pub fn reset(&mut self) {
        self.sink.clear();
        self.schema.clear();
    }

    /// Bytes left by the last write.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        self.sink.written()
    }
}

/// Turns values into binary objects.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use std::sync::Arc;
/// use gridwire_binary::{DynamicObject, Marshaller, Value};
/// use gridwire_core::MemoryTypeRegistry;
///
/// let registry = Arc::new(MemoryTypeRegistry::default());
/// registry.register_type("Person").unwrap();
///
/// let person = DynamicObject::new("Person").with_field("name", "Ann").with_field("age", 30);
/// let marshaller = Marshaller::new(registry);
/// let bytes = marshaller.marshal(&Value::object(Rc::new(person))).unwrap();
/// assert_eq!(bytes[0], 103);
/// ```
#[derive(Clone)]
pub struct Marshaller {
    registry: Arc<dyn TypeRegistry>,
}

impl Marshaller {
    /// Create a marshaller resolving types through `registry`.
    pub fn new(registry: Arc<dyn TypeRegistry>) -> Self {
        Self { registry }
    }

    /// The registry in use.
    #[must_use]
    pub fn registry(&self) -> &Arc<dyn TypeRegistry> {
        &self.registry
    }

    /// Encoding options in force.
    #[must_use]
    pub fn config(&self) -> &BinaryConfig {
        self.registry.config()
    }

    /// Encode `value` into a new byte vector.
    ///
    /// # Errors
    ///
    /// Returns any error raised while writing; no bytes are returned then.
    pub fn marshal(&self, value: &Value) -> Result<Vec<u8>> {
        let mut scratch = EncodeScratch::with_capacity(self.config().initial_capacity);
        self.marshal_with(&mut scratch, value)?;
        Ok(scratch.sink.into_vec())
    }

    /// Encode `value` using reusable scratch buffers and return the bytes.
    ///
    /// The returned slice borrows `scratch` and is valid until its next use.
    ///
    /// # Errors
    ///
    /// Returns any error raised while writing; `scratch` is reset then.
    pub fn marshal_with<'s>(
        &self,
        scratch: &'s mut EncodeScratch,
        value: &Value,
    ) -> Result<&'s [u8]> {
        scratch.reset();
        let result = {
            let mut session =
                WriteSession::new(&mut scratch.sink, &mut scratch.schema, self.registry.as_ref());
            session.write_value(value)
        };
        match result {
            Ok(()) => Ok(scratch.sink.written()),
            Err(err) => {
                debug!(error = %err, "marshalling failed");
                scratch.reset();
                Err(err)
            }
        }
    }

    /// Encode `value` into `sink` at its current position and return that
    /// position.
    ///
    /// On error the sink is rewound to where the write started.
    ///
    /// # Errors
    ///
    /// Returns any error raised while writing.
    pub fn marshal_into(
        &self,
        sink: &mut dyn OutputSink,
        schema: &mut SchemaTracker,
        value: &Value,
    ) -> Result<usize> {
        let start = sink.position();
        let depth = schema.len();
        let result =
            WriteSession::new(&mut *sink, &mut *schema, self.registry.as_ref()).write_value(value);
        if let Err(err) = result {
            sink.set_position(start);
            schema.pop(schema.len() - depth);
            return Err(err);
        }
        Ok(start)
    }
}

impl std::fmt::Debug for Marshaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marshaller").field("config", self.config()).finish_non_exhaustive()
    }
}
