//! Request validation against the resolved entity.

use crate::config::{PropertyDescriptor, ResolvedEntity};
use crate::error::AppError;

pub struct QueryValidator;

impl QueryValidator {
    /// Map `$select` names to properties, keeping request order. Unknown names are rejected.
    pub fn resolve_select<'e>(
        entity: &'e ResolvedEntity,
        names: &[String],
    ) -> Result<Vec<&'e PropertyDescriptor>, AppError> {
        names
            .iter()
            .map(|name| {
                entity.property(name).ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "property '{}' does not exist on {}",
                        name,
                        entity.qualified_name()
                    ))
                })
            })
            .collect()
    }

    /// Cap an explicit `$top` at the configured maximum. Without `$top` every row is read.
    pub fn clamp_top(top: Option<u32>, max_top: u32) -> Option<u32> {
        top.map(|n| n.min(max_top))
    }

    /// A property addressed in the resource path. Unknown names are a missing resource.
    pub fn property_in_path<'e>(entity: &'e ResolvedEntity, name: &str) -> Result<&'e PropertyDescriptor, AppError> {
        entity
            .property(name)
            .ok_or_else(|| AppError::NotFound(format!("{}: no property '{}'", entity.entity_set, name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, ModelConfig};
    use serde_json::json;

    fn widget() -> ResolvedEntity {
        let config: ModelConfig = serde_json::from_value(json!({
            "namespace": "Demo",
            "entities": [{
                "name": "Widget",
                "entity_set": "Widgets",
                "table": "widgets",
                "fields": [
                    { "name": "id", "type": "int32", "column": true, "id": true },
                    { "name": "name", "type": "string", "column": true },
                    { "name": "secret", "type": "string" }
                ]
            }]
        }))
        .unwrap();
        resolve(&config).unwrap().entity_by_set("Widgets").unwrap().as_ref().clone()
    }

    #[test]
    fn select_resolves_in_request_order() {
        let entity = widget();
        let props = QueryValidator::resolve_select(&entity, &["name".into(), "id".into()]).unwrap();
        let names: Vec<&str> = props.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name", "id"]);
    }

    #[test]
    fn select_of_unexposed_field_is_rejected() {
        let err = QueryValidator::resolve_select(&widget(), &["secret".into()]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn explicit_top_is_capped_and_absent_top_reads_all() {
        assert_eq!(QueryValidator::clamp_top(None, 1000), None);
        assert_eq!(QueryValidator::clamp_top(Some(5), 1000), Some(5));
        assert_eq!(QueryValidator::clamp_top(Some(5000), 1000), Some(1000));
    }

    #[test]
    fn unknown_path_property_is_not_found() {
        let err = QueryValidator::property_in_path(&widget(), "colour").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
