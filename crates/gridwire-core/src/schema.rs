//! Object schemas: the ordered field ids of one object layout.

use crate::protocol::{schema_initial_id, update_schema_id};

/// Ordered field ids of an object layout, keyed by its schema id.
///
/// Registries cache these so that objects written with a compact footer
/// (offsets only) can be mapped back to field ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinarySchema {
    schema_id: i32,
    field_ids: Vec<i32>,
}

impl BinarySchema {
    /// Build a schema from field ids in write order.
    #[must_use]
    pub fn from_field_ids(field_ids: impl IntoIterator<Item = i32>) -> Self {
        let field_ids: Vec<i32> = field_ids.into_iter().collect();
        let schema_id =
            field_ids.iter().fold(schema_initial_id(), |id, &f| update_schema_id(id, f));
        Self { schema_id, field_ids }
    }

    /// The schema id.
    #[must_use]
    pub const fn schema_id(&self) -> i32 {
        self.schema_id
    }

    /// Field ids in write order.
    #[must_use]
    pub fn field_ids(&self) -> &[i32] {
        &self.field_ids
    }

    /// Field id at position `order`.
    #[must_use]
    pub fn field_id(&self, order: usize) -> Option<i32> {
        self.field_ids.get(order).copied()
    }

    /// Position of `field_id` in the layout.
    #[must_use]
    pub fn order(&self, field_id: i32) -> Option<usize> {
        self.field_ids.iter().position(|&f| f == field_id)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.field_ids.len()
    }

    /// Returns `true` if the layout has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_ids.is_empty()
    }
}
