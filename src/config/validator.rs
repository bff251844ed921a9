//! Model validation: identifiers, type mapping, key markers and uniqueness.

use crate::config::{EntityConfig, ModelConfig};
use crate::error::ConfigError;
use crate::odata::PrimitiveKind;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn simple_identifier() -> Result<&'static Regex, ConfigError> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,127}$"))
        .as_ref()
        .map_err(|e| ConfigError::Validation(format!("identifier pattern: {}", e)))
}

fn check_identifier(what: &str, value: &str) -> Result<(), ConfigError> {
    if simple_identifier()?.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(format!("{} '{}'", what, value)))
    }
}

/// Namespaces may be dotted (`Acme.Sales`); each segment must be a simple identifier.
fn check_namespace(value: &str) -> Result<(), ConfigError> {
    let re = simple_identifier()?;
    if value.split('.').all(|s| re.is_match(s)) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(format!("namespace '{}'", value)))
    }
}

pub fn validate(config: &ModelConfig) -> Result<(), ConfigError> {
    check_namespace(&config.namespace)?;
    check_identifier("container", &config.container)?;

    let mut entity_sets = HashSet::new();
    let mut entity_types = HashSet::new();
    for entity in &config.entities {
        check_identifier("entity type", &entity.name)?;
        check_identifier("entity set", &entity.entity_set)?;
        if !entity_types.insert(entity.name.as_str()) {
            return Err(ConfigError::DuplicateEntityType(entity.name.clone()));
        }
        if !entity_sets.insert(entity.entity_set.as_str()) {
            return Err(ConfigError::DuplicateEntitySet(entity.entity_set.clone()));
        }
        validate_entity(entity)?;
    }
    Ok(())
}

fn validate_entity(entity: &EntityConfig) -> Result<(), ConfigError> {
    if entity.schema.trim().is_empty() || entity.table.trim().is_empty() {
        return Err(ConfigError::MissingReference {
            kind: "table",
            id: entity.name.clone(),
        });
    }

    let mut names = HashSet::new();
    let mut key_fields = Vec::new();
    for field in &entity.fields {
        let Some(column) = field.column_name() else {
            if field.id {
                return Err(ConfigError::InvalidKey {
                    entity: entity.name.clone(),
                    reason: format!("identifier field '{}' is not a persisted column", field.name),
                });
            }
            continue;
        };
        check_identifier("property", &field.name)?;
        if column.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{}.{}: empty column name",
                entity.name, field.name
            )));
        }
        if !names.insert(field.name.as_str()) {
            return Err(ConfigError::DuplicateProperty {
                entity: entity.name.clone(),
                property: field.name.clone(),
            });
        }
        let kind = PrimitiveKind::from_declared(&field.type_).ok_or_else(|| ConfigError::UnmappedType {
            entity: entity.name.clone(),
            field: field.name.clone(),
            type_name: field.type_.clone(),
        })?;
        if field.id {
            if !kind.is_key_capable() {
                return Err(ConfigError::InvalidKey {
                    entity: entity.name.clone(),
                    reason: format!("{} cannot be used as a key", kind.edm_name()),
                });
            }
            key_fields.push(field.name.as_str());
        }
    }

    match key_fields.len() {
        1 => Ok(()),
        0 => Err(ConfigError::InvalidKey {
            entity: entity.name.clone(),
            reason: "no identifier field".into(),
        }),
        _ => Err(ConfigError::InvalidKey {
            entity: entity.name.clone(),
            reason: format!("several identifier fields: {}", key_fields.join(", ")),
        }),
    }
}
