//! gridwire core
//!
//! The wire contract shared by every reader and writer of gridwire binary
//! objects.
//!
//! # Overview
//!
//! - **Protocol**: header layout, value tags, flags and schema-id hashing in
//!   [`protocol`]
//! - **Types**: [`Decimal`] for arbitrary-precision numbers, [`BinarySchema`]
//!   for object layouts
//! - **Registry**: the [`TypeRegistry`] trait the writer resolves types through,
//!   and [`MemoryTypeRegistry`]
//! - **Configuration**: [`BinaryConfig`]
//! - **Errors**: [`BinaryError`] and [`SinkError`]
//!
//! # Example
//!
//! ```
//! use gridwire_core::protocol::{schema_initial_id, update_schema_id};
//! use gridwire_core::BinarySchema;
//!
//! let schema = BinarySchema::from_field_ids([101, 202]);
//! let expected = update_schema_id(update_schema_id(schema_initial_id(), 101), 202);
//! assert_eq!(schema.schema_id(), expected);
//! ```

#![deny(clippy::unwrap_used)]

pub mod config;
pub mod decimal;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod schema;

pub use config::{BinaryConfig, StringEncoding};
pub use decimal::{Decimal, ParseDecimalError};
pub use error::{wire_len, BinaryError, Result, SinkError};
pub use registry::{
    CollectionKind, MapKind, MemoryTypeRegistry, ResolvedType, TypeDescriptor, TypeKind,
    TypeRegistry,
};
pub use schema::BinarySchema;
