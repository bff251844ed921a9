//! Entity data model: primitive kinds, CSDL JSON metadata and the service document.

use crate::config::{PropertyDescriptor, ResolvedEntity, ResolvedModel};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Value};

/// OData primitive kinds this adapter can expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Date,
    Double,
    Int32,
    Int64,
    Boolean,
    Decimal,
    DateTimeOffset,
    Guid,
}

impl PrimitiveKind {
    /// Map a declared field type to a primitive kind. Unknown types are `None`, never a fallback.
    pub fn from_declared(type_name: &str) -> Option<Self> {
        let lower = type_name.trim().to_lowercase();
        let kind = match lower.strip_prefix("edm.").unwrap_or(&lower) {
            "string" | "text" | "varchar" => PrimitiveKind::String,
            "date" => PrimitiveKind::Date,
            "double" | "float" | "float8" => PrimitiveKind::Double,
            "int" | "int32" | "integer" | "int4" => PrimitiveKind::Int32,
            "long" | "int64" | "bigint" | "int8" => PrimitiveKind::Int64,
            "bool" | "boolean" => PrimitiveKind::Boolean,
            "decimal" | "numeric" => PrimitiveKind::Decimal,
            "timestamp" | "timestamptz" | "datetimeoffset" => PrimitiveKind::DateTimeOffset,
            "uuid" | "guid" => PrimitiveKind::Guid,
            _ => return None,
        };
        Some(kind)
    }

    /// Qualified EDM type name, e.g. `Edm.String`.
    pub fn edm_name(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "Edm.String",
            PrimitiveKind::Date => "Edm.Date",
            PrimitiveKind::Double => "Edm.Double",
            PrimitiveKind::Int32 => "Edm.Int32",
            PrimitiveKind::Int64 => "Edm.Int64",
            PrimitiveKind::Boolean => "Edm.Boolean",
            PrimitiveKind::Decimal => "Edm.Decimal",
            PrimitiveKind::DateTimeOffset => "Edm.DateTimeOffset",
            PrimitiveKind::Guid => "Edm.Guid",
        }
    }

    /// Kinds usable as an entity key in a URI key predicate.
    pub fn is_key_capable(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int32 | PrimitiveKind::Int64 | PrimitiveKind::String | PrimitiveKind::Guid
        )
    }
}

/// One property of an entity type: `$Type` is omitted for `Edm.String`.
struct PropertyDocument<'a>(&'a PropertyDescriptor);

impl Serialize for PropertyDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if self.0.kind != PrimitiveKind::String {
            map.serialize_entry("$Type", self.0.kind.edm_name())?;
        }
        if !self.0.nullable {
            map.serialize_entry("$Nullable", &false)?;
        }
        map.end()
    }
}

/// Entity type with its properties in declaration order.
struct EntityTypeDocument<'a>(&'a ResolvedEntity);

impl Serialize for EntityTypeDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entity = self.0;
        let mut map = serializer.serialize_map(Some(entity.properties.len() + 2))?;
        map.serialize_entry("$Kind", "EntityType")?;
        map.serialize_entry("$Key", &entity.key_refs())?;
        for p in &entity.properties {
            map.serialize_entry(&p.name, &PropertyDocument(p))?;
        }
        map.end()
    }
}

struct ContainerDocument<'a>(&'a ResolvedModel);

impl Serialize for ContainerDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.entities.len() + 1))?;
        map.serialize_entry("$Kind", "EntityContainer")?;
        for entity in &self.0.entities {
            map.serialize_entry(
                &entity.entity_set,
                &json!({
                    "$Collection": true,
                    "$Type": entity.qualified_name(),
                }),
            )?;
        }
        map.end()
    }
}

struct SchemaDocument<'a>(&'a ResolvedModel);

impl Serialize for SchemaDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.entities.len() + 1))?;
        for entity in &self.0.entities {
            map.serialize_entry(&entity.name, &EntityTypeDocument(entity))?;
        }
        map.serialize_entry(&self.0.container, &ContainerDocument(self.0))?;
        map.end()
    }
}

/// CSDL JSON metadata document for the whole model. Entity types and their
/// properties serialize in declaration order.
pub struct MetadataDocument<'a> {
    model: &'a ResolvedModel,
}

impl Serialize for MetadataDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("$Version", "4.0")?;
        map.serialize_entry(
            "$EntityContainer",
            &format!("{}.{}", self.model.namespace, self.model.container),
        )?;
        map.serialize_entry(&self.model.namespace, &SchemaDocument(self.model))?;
        map.end()
    }
}

pub fn metadata_document(model: &ResolvedModel) -> MetadataDocument<'_> {
    MetadataDocument { model }
}

/// Service document listing every entity set.
pub fn service_document(model: &ResolvedModel, service_root: &str) -> Value {
    let sets: Vec<Value> = model
        .entities
        .iter()
        .map(|e| {
            json!({
                "name": e.entity_set,
                "kind": "EntitySet",
                "url": e.entity_set,
            })
        })
        .collect();
    json!({
        "@odata.context": format!("{}$metadata", service_root),
        "value": sets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, ModelConfig};

    fn widget_model() -> ResolvedModel {
        let config: ModelConfig = serde_json::from_value(json!({
            "namespace": "Demo",
            "entities": [{
                "name": "Widget",
                "entity_set": "Widgets",
                "table": "widgets",
                "fields": [
                    { "name": "id", "type": "int64", "column": true, "id": true },
                    { "name": "name", "type": "string", "column": true },
                    { "name": "madeOn", "type": "date", "column": true, "nullable": false }
                ]
            }]
        }))
        .unwrap();
        resolve(&config).unwrap()
    }

    #[test]
    fn declared_types_map_totally() {
        assert_eq!(PrimitiveKind::from_declared("String"), Some(PrimitiveKind::String));
        assert_eq!(PrimitiveKind::from_declared("Edm.Date"), Some(PrimitiveKind::Date));
        assert_eq!(PrimitiveKind::from_declared("bigint"), Some(PrimitiveKind::Int64));
        assert_eq!(PrimitiveKind::from_declared("timestamptz"), Some(PrimitiveKind::DateTimeOffset));
        assert_eq!(PrimitiveKind::from_declared("blob"), None);
        assert_eq!(PrimitiveKind::from_declared("java.lang.Object"), None);
    }

    #[test]
    fn metadata_lists_types_keys_and_sets() {
        let doc = serde_json::to_value(metadata_document(&widget_model())).unwrap();
        assert_eq!(doc["$Version"], "4.0");
        assert_eq!(doc["$EntityContainer"], "Demo.Container");
        let widget = &doc["Demo"]["Widget"];
        assert_eq!(widget["$Kind"], "EntityType");
        assert_eq!(widget["$Key"], json!(["id"]));
        assert_eq!(widget["id"]["$Type"], "Edm.Int64");
        assert_eq!(widget["id"]["$Nullable"], false);
        assert!(widget["name"].get("$Type").is_none());
        assert_eq!(widget["madeOn"]["$Type"], "Edm.Date");
        assert_eq!(doc["Demo"]["Container"]["Widgets"]["$Type"], "Demo.Widget");
    }

    #[test]
    fn metadata_keeps_declaration_order() {
        let text = serde_json::to_string(&metadata_document(&widget_model())).unwrap();
        assert!(text.starts_with(r#"{"$Version":"4.0","$EntityContainer":"Demo.Container","Demo":{"Widget":{"$Kind":"EntityType","$Key":["id"],"id":"#));
        let at = |needle: &str| text.find(needle).unwrap();
        assert!(at(r#""id":"#) < at(r#""name":"#));
        assert!(at(r#""name":"#) < at(r#""madeOn":"#));
        assert!(at(r#""Widget":"#) < at(r#""Container":"#));
    }

    #[test]
    fn service_document_points_at_sets() {
        let doc = service_document(&widget_model(), "http://localhost/odata/");
        assert_eq!(doc["@odata.context"], "http://localhost/odata/$metadata");
        assert_eq!(doc["value"][0]["name"], "Widgets");
        assert_eq!(doc["value"][0]["kind"], "EntitySet");
    }
}
