//! Entity providers and the registry that dispatches entity-set reads to them.

use crate::config::{ResolvedEntity, ResolvedModel};
use crate::error::{AppError, ConfigError};
use crate::odata::{coerce_key, KeyPredicate, QueryOptions};
use crate::record::KeyValue;
use crate::service::{QueryService, QueryValidator, ResultShaper, ShapedEntity};
use crate::store::RecordStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Result of a collection read.
#[derive(Debug, Default)]
pub struct EntityCollection {
    pub entities: Vec<ShapedEntity>,
    /// Total row count, independent of `$top`. Present only when `$count=true`.
    pub count: Option<u64>,
}

/// Result of a primitive-property read.
#[derive(Debug)]
pub struct PropertyValue {
    pub key: KeyValue,
    pub property: String,
    pub value: Value,
}

/// Read operations for one entity set.
#[async_trait]
pub trait EntityProvider: Send + Sync {
    fn entity(&self) -> &ResolvedEntity;

    async fn read_collection(&self, options: &QueryOptions) -> Result<EntityCollection, AppError>;

    /// `$select` does not apply to single-entity reads.
    async fn read_entity(&self, key: &KeyPredicate) -> Result<ShapedEntity, AppError>;

    async fn read_property(&self, key: &KeyPredicate, property: &str) -> Result<PropertyValue, AppError>;
}

/// Provider for any resolved entity, backed by a record store.
pub struct GenericEntityProvider {
    entity: Arc<ResolvedEntity>,
    store: Arc<dyn RecordStore>,
    max_top: u32,
}

impl GenericEntityProvider {
    pub fn new(entity: Arc<ResolvedEntity>, store: Arc<dyn RecordStore>, max_top: u32) -> Self {
        GenericEntityProvider { entity, store, max_top }
    }

    fn coerce(&self, key: &KeyPredicate) -> Result<KeyValue, AppError> {
        let key_prop = self
            .entity
            .key_property()
            .ok_or_else(|| AppError::Internal(format!("{} has no key property", self.entity.qualified_name())))?;
        coerce_key(key, &key_prop.name, key_prop.kind)
    }

    async fn load(&self, key: &KeyPredicate) -> Result<(KeyValue, ShapedEntity), AppError> {
        let key = self.coerce(key)?;
        let record = QueryService::find_by_key(self.store.as_ref(), &self.entity, &key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{}({})", self.entity.entity_set, key.literal())))?;
        Ok((key, ResultShaper::from_record(&self.entity, &record)))
    }
}

#[async_trait]
impl EntityProvider for GenericEntityProvider {
    fn entity(&self) -> &ResolvedEntity {
        &self.entity
    }

    async fn read_collection(&self, options: &QueryOptions) -> Result<EntityCollection, AppError> {
        let store = self.store.as_ref();
        let entity = self.entity.as_ref();
        let top = QueryValidator::clamp_top(options.top, self.max_top);
        let entities = match options.select.as_deref() {
            Some(names) if names.len() > 1 => {
                let props = QueryValidator::resolve_select(entity, names)?;
                let tuples = QueryService::find_with_selections(store, entity, &props, top).await?;
                ResultShaper::from_tuples(names, tuples)?
            }
            Some([name]) => {
                let prop = QueryValidator::resolve_select(entity, std::slice::from_ref(name))?;
                let values = QueryService::find_with_selection(store, entity, prop[0], top).await?;
                ResultShaper::from_scalars(name, values)
            }
            _ => {
                let records = QueryService::find_all(store, entity, top).await?;
                ResultShaper::from_records(entity, &records)
            }
        };
        let count = if options.count {
            Some(QueryService::count(store, entity).await?)
        } else {
            None
        };
        Ok(EntityCollection { entities, count })
    }

    async fn read_entity(&self, key: &KeyPredicate) -> Result<ShapedEntity, AppError> {
        let (_, shaped) = self.load(key).await?;
        Ok(shaped)
    }

    async fn read_property(&self, key: &KeyPredicate, property: &str) -> Result<PropertyValue, AppError> {
        let descriptor = QueryValidator::property_in_path(&self.entity, property)?;
        let (key, shaped) = self.load(key).await?;
        let value = shaped.get(&descriptor.name).cloned().unwrap_or(Value::Null);
        Ok(PropertyValue {
            key,
            property: descriptor.name.clone(),
            value,
        })
    }
}

/// Providers keyed by entity-set name. Built once at startup, read-only afterwards.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn EntityProvider>>,
    entity_types: HashSet<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One generic provider per resolved entity.
    pub fn from_model(model: &ResolvedModel, store: Arc<dyn RecordStore>, max_top: u32) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for entity in &model.entities {
            registry.register(Arc::new(GenericEntityProvider::new(
                entity.clone(),
                store.clone(),
                max_top,
            )))?;
        }
        Ok(registry)
    }

    /// Rejects a second provider for the same entity set or the same entity type.
    pub fn register(&mut self, provider: Arc<dyn EntityProvider>) -> Result<(), ConfigError> {
        let entity = provider.entity();
        let set = entity.entity_set.clone();
        let type_name = entity.qualified_name();
        if self.providers.contains_key(&set) {
            return Err(ConfigError::DuplicateEntitySet(set));
        }
        if self.entity_types.contains(&type_name) {
            return Err(ConfigError::DuplicateEntityType(type_name));
        }
        tracing::info!(entity_set = %set, entity_type = %type_name, "provider registered");
        self.entity_types.insert(type_name);
        self.providers.insert(set, provider);
        Ok(())
    }

    pub fn provider(&self, entity_set: &str) -> Result<Arc<dyn EntityProvider>, AppError> {
        self.providers
            .get(entity_set)
            .cloned()
            .ok_or_else(|| AppError::EntityUnavailable(entity_set.to_string()))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
