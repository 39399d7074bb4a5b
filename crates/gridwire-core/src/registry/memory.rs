//! In-process type registry.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use super::{
    lower_case_hash, CollectionKind, MapKind, ResolvedType, TypeDescriptor, TypeKind,
    TypeRegistry,
};
use crate::config::BinaryConfig;
use crate::error::{BinaryError, Result};
use crate::protocol::UNREGISTERED_TYPE_ID;
use crate::schema::BinarySchema;

/// Name of the root object type, used as the component type of untyped
/// object arrays.
pub const OBJECT_TYPE_NAME: &str = "Object";

/// Predefined id of [`OBJECT_TYPE_NAME`].
pub const OBJECT_TYPE_ID: i32 = -1;

#[derive(Debug, Clone, Copy)]
struct TypeEntry {
    type_id: i32,
    user_type: bool,
}

#[derive(Debug, Default)]
struct State {
    types: HashMap<String, TypeEntry>,
    /// Type ids that have a field mapper (registered or seen unregistered).
    mapped: HashSet<i32>,
    schemas: HashMap<(i32, i32), BinarySchema>,
}

/// A [`TypeRegistry`] kept in memory.
///
/// Types become *registered* through [`register_type`](Self::register_type).
/// Other types resolve to the hash of their lower-cased name and are reported
/// as unregistered, so the writer puts their name inline. Field ids are the
/// hash of the lower-cased field name.
///
/// # Example
///
/// ```
/// use gridwire_core::registry::{MemoryTypeRegistry, TypeDescriptor, TypeRegistry};
/// use gridwire_core::BinaryConfig;
///
/// let registry = MemoryTypeRegistry::new(BinaryConfig::default());
/// let id = registry.register_type("com.example.Person").unwrap();
///
/// let resolved = registry.resolve(&TypeDescriptor::object("com.example.Person"), false).unwrap();
/// assert!(resolved.registered);
/// assert_eq!(resolved.type_id, id);
///
/// let other = registry.resolve(&TypeDescriptor::object("com.example.Other"), false).unwrap();
/// assert!(!other.registered);
/// ```
#[derive(Debug)]
pub struct MemoryTypeRegistry {
    config: BinaryConfig,
    collection_kinds: HashMap<String, CollectionKind>,
    map_kinds: HashMap<String, MapKind>,
    // Every mutation is a single insert, so a poisoned map is still consistent.
    state: RwLock<State>,
}

impl MemoryTypeRegistry {
    /// Create a registry with the given options and the predefined types.
    #[must_use]
    pub fn new(config: BinaryConfig) -> Self {
        let mut state = State::default();
        let object = TypeEntry { type_id: OBJECT_TYPE_ID, user_type: false };
        state.types.insert(OBJECT_TYPE_NAME.to_owned(), object);

        let collection_kinds = [
            ("Vec", CollectionKind::ArrayList),
            ("VecDeque", CollectionKind::LinkedList),
            ("LinkedList", CollectionKind::LinkedList),
            ("HashSet", CollectionKind::HashSet),
            ("BTreeSet", CollectionKind::LinkedHashSet),
            ("Singleton", CollectionKind::SingletonList),
        ]
        .into_iter()
        .map(|(name, kind)| (name.to_owned(), kind))
        .collect();

        let map_kinds = [("HashMap", MapKind::HashMap), ("BTreeMap", MapKind::LinkedHashMap)]
            .into_iter()
            .map(|(name, kind)| (name.to_owned(), kind))
            .collect();

        Self { config, collection_kinds, map_kinds, state: RwLock::new(state) }
    }

    /// Register a user type under the id derived from its name.
    ///
    /// Registering the same name twice returns the same id.
    ///
    /// # Errors
    ///
    /// Returns [`BinaryError::UnresolvedType`] if the name hashes to the
    /// reserved unregistered id.
    pub fn register_type(&self, type_name: &str) -> Result<i32> {
        let type_id = Self::id_for(type_name)?;
        self.register_type_with_id(type_name, type_id, true);
        Ok(type_id)
    }

    /// Register a type under an explicit id.
    pub fn register_type_with_id(&self, type_name: &str, type_id: i32, user_type: bool) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.types.insert(type_name.to_owned(), TypeEntry { type_id, user_type });
        state.mapped.insert(type_id);
    }

    /// Map a concrete collection type name to its category.
    pub fn register_collection_kind(&mut self, type_name: &str, kind: CollectionKind) {
        self.collection_kinds.insert(type_name.to_owned(), kind);
    }

    /// Map a concrete map type name to its category.
    pub fn register_map_kind(&mut self, type_name: &str, kind: MapKind) {
        self.map_kinds.insert(type_name.to_owned(), kind);
    }

    /// Number of cached schemas.
    #[must_use]
    pub fn schema_count(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).schemas.len()
    }

    fn id_for(type_name: &str) -> Result<i32> {
        match lower_case_hash(type_name) {
            UNREGISTERED_TYPE_ID => Err(BinaryError::unresolved_type(type_name)),
            id => Ok(id),
        }
    }
}

impl Default for MemoryTypeRegistry {
    fn default() -> Self {
        Self::new(BinaryConfig::default())
    }
}

impl TypeRegistry for MemoryTypeRegistry {
    fn config(&self) -> &BinaryConfig {
        &self.config
    }

    fn resolve(
        &self,
        descriptor: &TypeDescriptor<'_>,
        fail_if_unregistered: bool,
    ) -> Result<ResolvedType> {
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = state.types.get(descriptor.name) {
                return Ok(ResolvedType {
                    type_id: entry.type_id,
                    registered: true,
                    user_type: entry.user_type,
                });
            }
        }

        if fail_if_unregistered {
            return Err(BinaryError::unregistered_type(descriptor.name));
        }

        let type_id = Self::id_for(descriptor.name)?;
        let newly_mapped = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .mapped
            .insert(type_id);
        if newly_mapped {
            debug!(type_name = descriptor.name, type_id, "resolved unregistered type");
        }

        Ok(ResolvedType {
            type_id,
            registered: false,
            user_type: descriptor.kind != TypeKind::Builtin,
        })
    }

    fn field_id(&self, type_id: i32, field_name: &str) -> Option<i32> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.mapped.contains(&type_id).then(|| lower_case_hash(field_name))
    }

    fn collection_kind(&self, type_name: &str) -> CollectionKind {
        self.collection_kinds.get(type_name).copied().unwrap_or(CollectionKind::UserCollection)
    }

    fn map_kind(&self, type_name: &str) -> MapKind {
        self.map_kinds.get(type_name).copied().unwrap_or(MapKind::UserMap)
    }

    fn has_schema(&self, type_id: i32, schema_id: i32) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.schemas.contains_key(&(type_id, schema_id))
    }

    fn add_schema(&self, type_id: i32, schema: BinarySchema) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.schemas.entry((type_id, schema.schema_id())).or_insert(schema);
    }

    fn schema(&self, type_id: i32, schema_id: i32) -> Option<BinarySchema> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.schemas.get(&(type_id, schema_id)).cloned()
    }
}
