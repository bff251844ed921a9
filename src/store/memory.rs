//! In-memory record store, keyed by entity set. Used by tests and local demos.

use crate::config::{PropertyDescriptor, ResolvedEntity};
use crate::error::AppError;
use crate::record::{KeyValue, Record};
use crate::store::RecordStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Default)]
pub struct MemoryRecordStore {
    rows: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert). Owning the store, it needs no lock.
    pub fn with_records(mut self, entity_set: &str, records: impl IntoIterator<Item = Record>) -> Self {
        let rows = self.rows.get_mut().unwrap_or_else(PoisonError::into_inner);
        rows.entry(entity_set.to_string()).or_default().extend(records);
        self
    }

    /// Rows are returned in insertion order, which stands in for key order.
    pub fn insert(&self, entity_set: &str, record: Record) -> Result<(), AppError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| AppError::Internal("record store lock poisoned".into()))?;
        rows.entry(entity_set.to_string()).or_default().push(record);
        Ok(())
    }

    fn snapshot(&self, entity: &ResolvedEntity, top: Option<u32>) -> Result<Vec<Record>, AppError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| AppError::Internal("record store lock poisoned".into()))?;
        let all = rows.get(&entity.entity_set).map(Vec::as_slice).unwrap_or_default();
        let take = top.map(|n| n as usize).unwrap_or(all.len());
        Ok(all.iter().take(take).cloned().collect())
    }
}

fn cell(record: &Record, property: &PropertyDescriptor) -> Value {
    record.get(&property.name).cloned().unwrap_or(Value::Null)
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_all(&self, entity: &ResolvedEntity, top: Option<u32>) -> Result<Vec<Record>, AppError> {
        self.snapshot(entity, top)
    }

    async fn find_by_key(&self, entity: &ResolvedEntity, key: &KeyValue) -> Result<Vec<Record>, AppError> {
        Ok(self
            .snapshot(entity, None)?
            .into_iter()
            .filter(|r| r.get(&entity.key).map(|v| key.matches(v)).unwrap_or(false))
            .collect())
    }

    async fn find_with_selection(
        &self,
        entity: &ResolvedEntity,
        property: &PropertyDescriptor,
        top: Option<u32>,
    ) -> Result<Vec<Value>, AppError> {
        Ok(self
            .snapshot(entity, top)?
            .iter()
            .map(|r| cell(r, property))
            .collect())
    }

    async fn find_with_selections(
        &self,
        entity: &ResolvedEntity,
        properties: &[&PropertyDescriptor],
        top: Option<u32>,
    ) -> Result<Vec<Vec<Value>>, AppError> {
        Ok(self
            .snapshot(entity, top)?
            .iter()
            .map(|r| properties.iter().map(|p| cell(r, p)).collect())
            .collect())
    }

    async fn count(&self, entity: &ResolvedEntity) -> Result<u64, AppError> {
        Ok(self.snapshot(entity, None)?.len() as u64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
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
                    { "name": "id", "type": "int64", "column": true, "id": true },
                    { "name": "name", "type": "string", "column": true }
                ]
            }]
        }))
        .unwrap();
        resolve(&config).unwrap().entity_by_set("Widgets").unwrap().as_ref().clone()
    }

    fn store() -> MemoryRecordStore {
        MemoryRecordStore::new().with_records(
            "Widgets",
            vec![
                Record::new().with("id", 1).with("name", "bolt"),
                Record::new().with("id", 2).with("name", "nut"),
                Record::new().with("id", 3),
            ],
        )
    }

    #[tokio::test]
    async fn scans_respect_top() {
        let entity = widget();
        let s = store();
        assert_eq!(s.find_all(&entity, None).await.unwrap().len(), 3);
        assert_eq!(s.find_all(&entity, Some(2)).await.unwrap().len(), 2);
        assert_eq!(s.count(&entity).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn by_key_matches_kind() {
        let entity = widget();
        let s = store();
        assert_eq!(s.find_by_key(&entity, &KeyValue::Int(2)).await.unwrap().len(), 1);
        assert!(s.find_by_key(&entity, &KeyValue::Int(42)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn projections_fill_missing_with_null() {
        let entity = widget();
        let s = store();
        let name = entity.property("name").unwrap();
        let id = entity.property("id").unwrap();
        let values = s.find_with_selection(&entity, name, None).await.unwrap();
        assert_eq!(values, vec![json!("bolt"), json!("nut"), Value::Null]);
        let tuples = s.find_with_selections(&entity, &[name, id], Some(1)).await.unwrap();
        assert_eq!(tuples, vec![vec![json!("bolt"), json!(1)]]);
    }

    #[tokio::test]
    async fn insert_appends_after_builder_rows() {
        let entity = widget();
        let s = store();
        s.insert("Widgets", Record::new().with("id", 4).with("name", "gear")).unwrap();
        let all = s.find_all(&entity, None).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[3].get("name"), Some(&json!("gear")));
    }

    #[test]
    fn insert_reports_a_poisoned_lock() {
        let s = std::sync::Arc::new(store());
        let poisoner = s.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.rows.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        let err = s.insert("Widgets", Record::new().with("id", 5)).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn unknown_set_is_empty() {
        let mut entity = widget();
        entity.entity_set = "Gadgets".into();
        assert!(store().find_all(&entity, None).await.unwrap().is_empty());
    }
}
