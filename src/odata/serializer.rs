//! OData JSON payloads for collections, single entities and primitive properties.

use crate::error::AppError;
use crate::odata::ResponseFormat;
use crate::service::ShapedEntity;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Context URL fragments, relative to `<service root>$metadata`.
pub enum Context<'a> {
    Collection { entity_set: &'a str, select: Option<&'a [String]> },
    Entity { entity_set: &'a str },
    Property { entity_set: &'a str, key_literal: &'a str, property: &'a str },
}

impl Context<'_> {
    pub fn url(&self, service_root: &str) -> String {
        let fragment = match self {
            Context::Collection { entity_set, select: None } => entity_set.to_string(),
            Context::Collection { entity_set, select: Some(names) } => format!("{}({})", entity_set, names.join(",")),
            Context::Entity { entity_set } => format!("{}/$entity", entity_set),
            Context::Property {
                entity_set,
                key_literal,
                property,
            } => format!("{}({})/{}", entity_set, key_literal, property),
        };
        format!("{}$metadata#{}", service_root, fragment)
    }
}

struct CollectionPayload<'a> {
    context: Option<String>,
    count: Option<u64>,
    entities: &'a [ShapedEntity],
}

impl Serialize for CollectionPayload<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(context) = &self.context {
            map.serialize_entry("@odata.context", context)?;
        }
        if let Some(count) = self.count {
            map.serialize_entry("@odata.count", &count)?;
        }
        map.serialize_entry("value", self.entities)?;
        map.end()
    }
}

struct EntityPayload<'a> {
    context: Option<String>,
    entity: &'a ShapedEntity,
}

impl Serialize for EntityPayload<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(context) = &self.context {
            map.serialize_entry("@odata.context", context)?;
        }
        for (name, value) in self.entity.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct PropertyPayload<'a> {
    context: Option<String>,
    value: &'a Value,
}

impl Serialize for PropertyPayload<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(context) = &self.context {
            map.serialize_entry("@odata.context", context)?;
        }
        map.serialize_entry("value", self.value)?;
        map.end()
    }
}

fn to_bytes<T: Serialize>(payload: &T) -> Result<Vec<u8>, AppError> {
    serde_json::to_vec(payload).map_err(|e| AppError::Internal(format!("serialization: {}", e)))
}

fn context_url(format: ResponseFormat, context: &Context<'_>, service_root: &str) -> Option<String> {
    format.with_context().then(|| context.url(service_root))
}

pub fn serialize_collection(
    format: ResponseFormat,
    service_root: &str,
    context: &Context<'_>,
    entities: &[ShapedEntity],
    count: Option<u64>,
) -> Result<Vec<u8>, AppError> {
    to_bytes(&CollectionPayload {
        context: context_url(format, context, service_root),
        count,
        entities,
    })
}

pub fn serialize_entity(
    format: ResponseFormat,
    service_root: &str,
    context: &Context<'_>,
    entity: &ShapedEntity,
) -> Result<Vec<u8>, AppError> {
    to_bytes(&EntityPayload {
        context: context_url(format, context, service_root),
        entity,
    })
}

pub fn serialize_property(
    format: ResponseFormat,
    service_root: &str,
    context: &Context<'_>,
    value: &Value,
) -> Result<Vec<u8>, AppError> {
    to_bytes(&PropertyPayload {
        context: context_url(format, context, service_root),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odata::MetadataLevel;
    use serde_json::json;

    const ROOT: &str = "http://localhost/odata/";

    fn bolt() -> ShapedEntity {
        let mut e = ShapedEntity::new();
        e.push("id", json!(1));
        e.push("name", json!("bolt"));
        e
    }

    #[test]
    fn collection_with_count_and_select_context() {
        let select = vec!["name".to_string(), "id".to_string()];
        let ctx = Context::Collection { entity_set: "Widgets", select: Some(&select) };
        let bytes = serialize_collection(ResponseFormat::default(), ROOT, &ctx, &[bolt()], Some(7)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            r#"{"@odata.context":"http://localhost/odata/$metadata#Widgets(name,id)","@odata.count":7,"value":[{"id":1,"name":"bolt"}]}"#
        );
    }

    #[test]
    fn entity_payload_inlines_properties() {
        let ctx = Context::Entity { entity_set: "Widgets" };
        let bytes = serialize_entity(ResponseFormat::default(), ROOT, &ctx, &bolt()).unwrap();
        let v: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["@odata.context"], "http://localhost/odata/$metadata#Widgets/$entity");
        assert_eq!(v["name"], "bolt");
    }

    #[test]
    fn property_payload_and_metadata_none() {
        let ctx = Context::Property { entity_set: "Widgets", key_literal: "1", property: "name" };
        let bytes = serialize_property(ResponseFormat::default(), ROOT, &ctx, &json!("bolt")).unwrap();
        let v: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["@odata.context"], "http://localhost/odata/$metadata#Widgets(1)/name");
        assert_eq!(v["value"], "bolt");

        let none = ResponseFormat { metadata: MetadataLevel::None };
        let bytes = serialize_property(none, ROOT, &ctx, &json!("bolt")).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"value":"bolt"}"#);
    }
}
