//! Relation definitions between shapes.

use rkyv::Archive;

/// A one-to-many relation keyed on business fields.
///
/// Each child row points at one parent row by storing the parent's business
/// key value in `child_fk_field`. Surrogate keys are never involved.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct RelationDef {
    /// Parent (one side) shape name.
    pub parent_shape: String,
    /// Child (many side) shape name.
    pub child_shape: String,
    /// Unique business key on the parent.
    pub parent_key_field: String,
    /// Field on the child holding the parent's business key.
    pub child_fk_field: String,
}

impl RelationDef {
    /// Create a one-to-many relation.
    pub fn one_to_many(
        parent_shape: impl Into<String>,
        parent_key_field: impl Into<String>,
        child_shape: impl Into<String>,
        child_fk_field: impl Into<String>,
    ) -> Self {
        Self {
            parent_shape: parent_shape.into(),
            child_shape: child_shape.into(),
            parent_key_field: parent_key_field.into(),
            child_fk_field: child_fk_field.into(),
        }
    }

    /// Check whether this relation joins the given shapes.
    pub fn joins(&self, parent: &str, child: &str) -> bool {
        self.parent_shape == parent && self.child_shape == child
    }

    /// Check whether `field` on `shape` takes part in this relation.
    pub fn uses_field(&self, shape: &str, field: &str) -> bool {
        (self.parent_shape == shape && self.parent_key_field == field)
            || (self.child_shape == shape && self.child_fk_field == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_to_many_relation() {
        let rel = RelationDef::one_to_many("Maker", "maker_id", "Model", "maker_fk");

        assert!(rel.joins("Maker", "Model"));
        assert!(!rel.joins("Model", "Maker"));
        assert!(rel.uses_field("Maker", "maker_id"));
        assert!(rel.uses_field("Model", "maker_fk"));
        assert!(!rel.uses_field("Model", "maker_id"));
    }

    #[test]
    fn test_self_relation_uses_both_fields() {
        let rel = RelationDef::one_to_many("Node", "node_id", "Node", "parent_fk");

        assert!(rel.uses_field("Node", "node_id"));
        assert!(rel.uses_field("Node", "parent_fk"));
    }
}
