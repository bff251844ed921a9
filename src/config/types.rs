//! Raw entity model types matching the JSON model file.

use serde::{Deserialize, Serialize};

/// Persisted-column marker on a field.
///
/// `true` maps the field to a column named after it (snake_case), a string names the column
/// explicitly. `false` (or no marker) keeps the field transient: it is never exposed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnMarker {
    Flag(bool),
    Named(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub column: Option<ColumnMarker>,
    /// Identifier marker: this field is the entity key.
    #[serde(default)]
    pub id: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
}

impl FieldConfig {
    /// Column name when the field carries the persisted-column marker.
    pub fn column_name(&self) -> Option<String> {
        match &self.column {
            Some(ColumnMarker::Flag(true)) => Some(crate::case::to_snake_case(&self.name)),
            Some(ColumnMarker::Named(name)) => Some(name.clone()),
            Some(ColumnMarker::Flag(false)) | None => None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_schema() -> String {
    "public".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Entity type name (e.g. `Widget`).
    pub name: String,
    /// Entity set name used in URIs (e.g. `Widgets`).
    pub entity_set: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    pub table: String,
    pub fields: Vec<FieldConfig>,
}

fn default_container() -> String {
    "Container".into()
}

/// The whole entity model: one namespace, one container, all entities.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    pub namespace: String,
    #[serde(default = "default_container")]
    pub container: String,
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}
