//! Load the entity model from JSON and resolve it into runtime descriptors.

use crate::config::resolved::{PropertyDescriptor, ResolvedEntity, ResolvedModel};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use crate::odata::PrimitiveKind;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Build resolved model from the raw model (validates first).
pub fn resolve(config: &ModelConfig) -> Result<ResolvedModel, ConfigError> {
    validate(config)?;

    let mut entities = Vec::with_capacity(config.entities.len());
    let mut entity_by_set = HashMap::new();
    for entity_config in &config.entities {
        let entity = Arc::new(resolve_entity(&config.namespace, entity_config)?);
        tracing::info!(
            entity_type = %entity.qualified_name(),
            entity_set = %entity.entity_set,
            properties = entity.properties.len(),
            "entity resolved"
        );
        entity_by_set.insert(entity.entity_set.clone(), entity.clone());
        entities.push(entity);
    }

    Ok(ResolvedModel {
        namespace: config.namespace.clone(),
        container: config.container.clone(),
        entities,
        entity_by_set,
    })
}

fn resolve_entity(namespace: &str, entity: &EntityConfig) -> Result<ResolvedEntity, ConfigError> {
    let mut properties = Vec::new();
    let mut key = None;
    for field in &entity.fields {
        let Some(column) = field.column_name() else { continue };
        let kind = PrimitiveKind::from_declared(&field.type_).ok_or_else(|| ConfigError::UnmappedType {
            entity: entity.name.clone(),
            field: field.name.clone(),
            type_name: field.type_.clone(),
        })?;
        if field.id {
            key = Some(field.name.clone());
        }
        properties.push(PropertyDescriptor {
            name: field.name.clone(),
            column,
            kind,
            nullable: field.nullable && !field.id,
            is_key: field.id,
        });
    }
    let key = key.ok_or_else(|| ConfigError::InvalidKey {
        entity: entity.name.clone(),
        reason: "no identifier field".into(),
    })?;

    Ok(ResolvedEntity {
        name: entity.name.clone(),
        namespace: namespace.to_string(),
        entity_set: entity.entity_set.clone(),
        schema_name: entity.schema.clone(),
        table_name: entity.table.clone(),
        properties,
        key,
    })
}

/// Read the model JSON file.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<ModelConfig, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}
