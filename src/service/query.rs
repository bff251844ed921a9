//! Read-only query execution against a record store.

use crate::config::{PropertyDescriptor, ResolvedEntity};
use crate::error::AppError;
use crate::record::{KeyValue, Record};
use crate::store::RecordStore;
use serde_json::Value;

pub struct QueryService;

impl QueryService {
    /// Every row of the entity, at most `top`.
    pub async fn find_all(
        store: &dyn RecordStore,
        entity: &ResolvedEntity,
        top: Option<u32>,
    ) -> Result<Vec<Record>, AppError> {
        let rows = store.find_all(entity, top).await?;
        tracing::debug!(entity_set = %entity.entity_set, rows = rows.len(), "full scan");
        Ok(rows)
    }

    /// The row with the given key, or None. Two rows for one key is a storage integrity failure.
    pub async fn find_by_key(
        store: &dyn RecordStore,
        entity: &ResolvedEntity,
        key: &KeyValue,
    ) -> Result<Option<Record>, AppError> {
        let mut rows = store.find_by_key(entity, key).await?;
        if rows.len() > 1 {
            return Err(AppError::Integrity(format!(
                "{} rows for {}({})",
                rows.len(),
                entity.entity_set,
                key.literal()
            )));
        }
        Ok(rows.pop())
    }

    /// One property value per row.
    pub async fn find_with_selection(
        store: &dyn RecordStore,
        entity: &ResolvedEntity,
        property: &PropertyDescriptor,
        top: Option<u32>,
    ) -> Result<Vec<Value>, AppError> {
        store.find_with_selection(entity, property, top).await
    }

    /// One tuple per row, ordered like `properties`.
    pub async fn find_with_selections(
        store: &dyn RecordStore,
        entity: &ResolvedEntity,
        properties: &[&PropertyDescriptor],
        top: Option<u32>,
    ) -> Result<Vec<Vec<Value>>, AppError> {
        let tuples = store.find_with_selections(entity, properties, top).await?;
        if let Some(bad) = tuples.iter().find(|t| t.len() != properties.len()) {
            return Err(AppError::Internal(format!(
                "store returned {} values for {} selected properties",
                bad.len(),
                properties.len()
            )));
        }
        Ok(tuples)
    }

    pub async fn count(store: &dyn RecordStore, entity: &ResolvedEntity) -> Result<u64, AppError> {
        store.count(entity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, ModelConfig};
    use crate::store::MemoryRecordStore;
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
                    { "name": "name", "type": "string", "column": true }
                ]
            }]
        }))
        .unwrap();
        resolve(&config).unwrap().entity_by_set("Widgets").unwrap().as_ref().clone()
    }

    #[tokio::test]
    async fn by_key_returns_single_row_or_none() {
        let entity = widget();
        let store = MemoryRecordStore::new()
            .with_records("Widgets", vec![Record::new().with("id", 1).with("name", "bolt")]);
        let found = QueryService::find_by_key(&store, &entity, &KeyValue::Int(1)).await.unwrap();
        assert_eq!(found.unwrap().get("name"), Some(&json!("bolt")));
        assert!(QueryService::find_by_key(&store, &entity, &KeyValue::Int(2))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_key_rows_are_an_integrity_failure() {
        let entity = widget();
        let store = MemoryRecordStore::new().with_records(
            "Widgets",
            vec![Record::new().with("id", 1), Record::new().with("id", 1)],
        );
        let err = QueryService::find_by_key(&store, &entity, &KeyValue::Int(1)).await.unwrap_err();
        assert!(matches!(err, AppError::Integrity(_)));
    }

    #[tokio::test]
    async fn selections_keep_requested_order() {
        let entity = widget();
        let store = MemoryRecordStore::new()
            .with_records("Widgets", vec![Record::new().with("id", 1).with("name", "bolt")]);
        let props = [entity.property("name").unwrap(), entity.property("id").unwrap()];
        let tuples = QueryService::find_with_selections(&store, &entity, &props, None).await.unwrap();
        assert_eq!(tuples, vec![vec![json!("bolt"), json!(1)]]);
        assert_eq!(QueryService::count(&store, &entity).await.unwrap(), 1);
    }
}
