//! Type registry contract.
//!
//! The writer never discovers types itself. It asks a [`TypeRegistry`] to:
//!
//! - resolve a type name to a stable id and decide whether the id is known
//!   cluster-wide ([`TypeRegistry::resolve`]);
//! - map field names to field ids ([`TypeRegistry::field_id`]);
//! - classify collections and maps ([`TypeRegistry::collection_kind`],
//!   [`TypeRegistry::map_kind`]);
//! - cache object schemas for compact footers ([`TypeRegistry::add_schema`]).
//!
//! [`MemoryTypeRegistry`] is an in-process implementation suitable for a
//! single node and for tests.

mod id_mapper;
mod memory;

pub use id_mapper::lower_case_hash;
pub use memory::{MemoryTypeRegistry, OBJECT_TYPE_ID, OBJECT_TYPE_NAME};

use crate::config::BinaryConfig;
use crate::error::Result;
use crate::schema::BinarySchema;

/// What kind of runtime type is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A struct-like user type written as a full object.
    Object,
    /// An enumeration.
    Enum,
    /// A platform value type written without a name (system type).
    Builtin,
    /// An interface implemented by a dynamic proxy.
    ProxyInterface,
    /// A type referenced as a value (class literal).
    Class,
}

/// A runtime type as the writer sees it: its name and its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor<'a> {
    /// Fully qualified type name.
    pub name: &'a str,
    /// Kind of type.
    pub kind: TypeKind,
}

impl<'a> TypeDescriptor<'a> {
    /// Describe a struct-like user type.
    #[must_use]
    pub const fn object(name: &'a str) -> Self {
        Self { name, kind: TypeKind::Object }
    }

    /// Describe an enumeration.
    #[must_use]
    pub const fn enumeration(name: &'a str) -> Self {
        Self { name, kind: TypeKind::Enum }
    }

    /// Describe a platform value type.
    #[must_use]
    pub const fn builtin(name: &'a str) -> Self {
        Self { name, kind: TypeKind::Builtin }
    }

    /// Describe a proxy interface.
    #[must_use]
    pub const fn proxy_interface(name: &'a str) -> Self {
        Self { name, kind: TypeKind::ProxyInterface }
    }

    /// Describe a class literal.
    #[must_use]
    pub const fn class(name: &'a str) -> Self {
        Self { name, kind: TypeKind::Class }
    }
}

/// Outcome of resolving a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedType {
    /// Stable type id.
    pub type_id: i32,
    /// Whether the id is known cluster-wide. Unregistered types carry their
    /// name inline.
    pub registered: bool,
    /// Whether this is a user type (as opposed to a system type).
    pub user_type: bool,
}

/// Collection category written after a collection's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum CollectionKind {
    /// A set type the reader must instantiate by name.
    UserSet = -1,
    /// A collection type the reader must instantiate by name.
    UserCollection = 0,
    /// Growable array list.
    ArrayList = 1,
    /// Linked list / deque.
    LinkedList = 2,
    /// Unordered hash set.
    HashSet = 3,
    /// Insertion- or sort-ordered set.
    LinkedHashSet = 4,
    /// Immutable single-element list.
    SingletonList = 5,
}

impl CollectionKind {
    /// Wire discriminant.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as i8 as u8
    }
}

/// Map category written after a map's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum MapKind {
    /// A map type the reader must instantiate by name.
    UserMap = 0,
    /// Unordered hash map.
    HashMap = 1,
    /// Insertion- or sort-ordered map.
    LinkedHashMap = 2,
}

impl MapKind {
    /// Wire discriminant.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as i8 as u8
    }
}

/// Maps runtime types to wire ids and holds cluster-wide encoding options.
///
/// Implementations must be safe to share between threads; a registry is
/// typically one per node.
pub trait TypeRegistry: Send + Sync {
    /// Encoding options in force.
    fn config(&self) -> &BinaryConfig;

    /// Resolve a type.
    ///
    /// # Errors
    ///
    /// Returns [`BinaryError::UnresolvedType`](crate::BinaryError::UnresolvedType)
    /// if no id can be produced, or
    /// [`BinaryError::UnregisteredType`](crate::BinaryError::UnregisteredType)
    /// if the type is unknown and `fail_if_unregistered` is set.
    fn resolve(
        &self,
        descriptor: &TypeDescriptor<'_>,
        fail_if_unregistered: bool,
    ) -> Result<ResolvedType>;

    /// Field id for `field_name` on `type_id`, or `None` if the type has no
    /// field mapper yet.
    fn field_id(&self, type_id: i32, field_name: &str) -> Option<i32>;

    /// Collection category for a concrete collection type.
    fn collection_kind(&self, type_name: &str) -> CollectionKind;

    /// Map category for a concrete map type.
    fn map_kind(&self, type_name: &str) -> MapKind;

    /// Whether the schema is already cached for the type.
    fn has_schema(&self, _type_id: i32, _schema_id: i32) -> bool {
        false
    }

    /// Cache a schema observed while writing an object of the type.
    fn add_schema(&self, _type_id: i32, _schema: BinarySchema) {}

    /// Look up a cached schema.
    fn schema(&self, _type_id: i32, _schema_id: i32) -> Option<BinarySchema> {
        None
    }

    /// Whether user types get offset-only footers.
    fn compact_footer(&self) -> bool {
        self.config().compact_footer
    }
}
