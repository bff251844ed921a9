//! Resolved entity model: config validated and flattened for runtime use.

use crate::odata::PrimitiveKind;
use std::collections::HashMap;
use std::sync::Arc;

/// One exposed property: a field that carries the persisted-column marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub column: String,
    pub kind: PrimitiveKind,
    pub nullable: bool,
    pub is_key: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedEntity {
    /// Entity type name.
    pub name: String,
    pub namespace: String,
    pub entity_set: String,
    pub schema_name: String,
    pub table_name: String,
    /// Exposed properties in declaration order.
    pub properties: Vec<PropertyDescriptor>,
    /// Name of the key property; always present in `properties`.
    pub key: String,
}

impl ResolvedEntity {
    /// Fully qualified type name, e.g. `Demo.Widget`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn key_property(&self) -> Option<&PropertyDescriptor> {
        self.property(&self.key)
    }

    /// Key list as published in metadata. Single element by construction.
    pub fn key_refs(&self) -> Vec<&str> {
        vec![self.key.as_str()]
    }

    pub fn property_names(&self) -> Vec<String> {
        self.properties.iter().map(|p| p.name.clone()).collect()
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedModel {
    pub namespace: String,
    pub container: String,
    pub entities: Vec<Arc<ResolvedEntity>>,
    pub entity_by_set: HashMap<String, Arc<ResolvedEntity>>,
}

impl ResolvedModel {
    pub fn entity_by_set(&self, entity_set: &str) -> Option<&Arc<ResolvedEntity>> {
        self.entity_by_set.get(entity_set)
    }
}
