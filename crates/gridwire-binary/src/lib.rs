//! gridwire binary writer
//!
//! Encodes typed values and object graphs into gridwire binary objects.
//!
//! # Overview
//!
//! - **Entry point**: [`Marshaller`], with reusable [`EncodeScratch`] buffers
//! - **Values**: [`Value`], user types via [`BinaryType`], and the
//!   ready-made [`DynamicObject`]
//! - **Writers**: [`ObjectWriter`] for one object, [`RawWriter`] for its raw
//!   section, [`WriteSession`] for the state shared by a root write
//! - **Encoders**: context-free value encoders in [`encoding`]
//! - **Sinks**: [`OutputSink`], with [`HeapOutputSink`] and
//!   [`OffHeapOutputSink`]
//! - **Graph state**: [`SchemaTracker`] and [`HandleTable`]
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use std::sync::Arc;
//! use gridwire_binary::{DynamicObject, Marshaller, Value};
//! use gridwire_core::{BinaryConfig, MemoryTypeRegistry};
//!
//! let registry = Arc::new(MemoryTypeRegistry::new(BinaryConfig::default()));
//! let marshaller = Marshaller::new(registry);
//!
//! // A type nobody registered: its name travels inline.
//! let foo = Value::object(Rc::new(DynamicObject::new("Foo")));
//! let bytes = marshaller.marshal(&foo).unwrap();
//! assert_eq!(bytes.len(), 24 + 8);
//! ```

#![deny(clippy::unwrap_used)]

pub mod encoding;
pub mod handles;
pub mod marshaller;
pub mod schema;
pub mod sink;
pub mod value;
pub mod writer;

pub use handles::{HandleTable, ObjectIdentity};
pub use marshaller::{EncodeScratch, Marshaller};
pub use schema::SchemaTracker;
pub use sink::{HeapOutputSink, OffHeapOutputSink, OutputSink};
pub use value::{
    BinaryEnum, BinaryType, Collection, DynamicObject, EncodedObject, EnumArray, EnumValue,
    MapValue, ObjectArray, ObjectRef, ProxyValue, SqlTime, Value,
};
pub use writer::{ObjectWriter, RawWriter, WriteSession, WrittenObject};
