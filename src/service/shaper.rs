//! Turns records and projection rows into ordered (property, value) entities.

use crate::config::ResolvedEntity;
use crate::error::AppError;
use crate::record::Record;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Ordered property/value pairs ready for serialization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapedEntity {
    properties: Vec<(String, Value)>,
}

impl ShapedEntity {
    pub fn new() -> Self {
        ShapedEntity::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.properties.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> Vec<&str> {
        self.properties.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl Serialize for ShapedEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.properties.len()))?;
        for (name, value) in &self.properties {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

pub struct ResultShaper;

impl ResultShaper {
    /// One pair per exposed property, in declaration order. Anything else in the record is dropped.
    pub fn from_record(entity: &ResolvedEntity, record: &Record) -> ShapedEntity {
        let mut shaped = ShapedEntity::new();
        for p in &entity.properties {
            shaped.push(p.name.clone(), record.get(&p.name).cloned().unwrap_or(Value::Null));
        }
        shaped
    }

    pub fn from_records(entity: &ResolvedEntity, records: &[Record]) -> Vec<ShapedEntity> {
        records.iter().map(|r| Self::from_record(entity, r)).collect()
    }

    /// Zip each tuple with the requested names. Tuple and name list must have equal length.
    pub fn from_tuples(names: &[String], tuples: Vec<Vec<Value>>) -> Result<Vec<ShapedEntity>, AppError> {
        tuples
            .into_iter()
            .map(|tuple| {
                if tuple.len() != names.len() {
                    return Err(AppError::Internal(format!(
                        "projection row has {} values for {} properties",
                        tuple.len(),
                        names.len()
                    )));
                }
                let mut shaped = ShapedEntity::new();
                for (name, value) in names.iter().zip(tuple) {
                    shaped.push(name.clone(), value);
                }
                Ok(shaped)
            })
            .collect()
    }

    pub fn from_scalars(name: &str, values: Vec<Value>) -> Vec<ShapedEntity> {
        values
            .into_iter()
            .map(|v| {
                let mut shaped = ShapedEntity::new();
                shaped.push(name, v);
                shaped
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PropertyDescriptor;
    use crate::odata::PrimitiveKind;
    use serde_json::json;

    fn widget() -> ResolvedEntity {
        let prop = |name: &str, kind, is_key: bool| PropertyDescriptor {
            name: name.into(),
            column: name.into(),
            kind,
            nullable: !is_key,
            is_key,
        };
        ResolvedEntity {
            name: "Widget".into(),
            namespace: "Demo".into(),
            entity_set: "Widgets".into(),
            schema_name: "public".into(),
            table_name: "widgets".into(),
            properties: vec![prop("id", PrimitiveKind::Int64, true), prop("name", PrimitiveKind::String, false)],
            key: "id".into(),
        }
    }

    #[test]
    fn records_keep_declared_properties_in_order() {
        let records = vec![
            Record::new().with("name", "bolt").with("id", 1).with("secret", "x"),
            Record::new().with("id", 2),
        ];
        let shaped = ResultShaper::from_records(&widget(), &records);
        assert_eq!(shaped.len(), records.len());
        assert_eq!(shaped[0].names(), vec!["id", "name"]);
        assert_eq!(shaped[0].get("name"), Some(&json!("bolt")));
        assert_eq!(shaped[0].get("secret"), None);
        assert_eq!(shaped[1].get("name"), Some(&Value::Null));
    }

    #[test]
    fn tuples_zip_positionally() {
        let names = vec!["name".to_string(), "id".to_string()];
        let shaped = ResultShaper::from_tuples(&names, vec![vec![json!("bolt"), json!(1)]]).unwrap();
        assert_eq!(shaped[0].names(), vec!["name", "id"]);
        assert_eq!(shaped[0].get("id"), Some(&json!(1)));
    }

    #[test]
    fn tuple_length_mismatch_is_internal_error() {
        let names = vec!["name".to_string(), "id".to_string()];
        let err = ResultShaper::from_tuples(&names, vec![vec![json!("bolt")]]).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn scalars_become_single_property_entities() {
        let shaped = ResultShaper::from_scalars("name", vec![json!("a"), json!("b")]);
        assert_eq!(shaped.len(), 2);
        assert!(shaped.iter().all(|e| e.names() == vec!["name"]));
    }

    #[test]
    fn serialization_preserves_order() {
        let mut e = ShapedEntity::new();
        e.push("zeta", json!(1));
        e.push("alpha", json!(2));
        assert_eq!(serde_json::to_string(&e).unwrap(), r#"{"zeta":1,"alpha":2}"#);
    }
}
