//! Persistence seam: the record store the query service reads from.

mod memory;
mod postgres;

pub use memory::MemoryRecordStore;
pub use postgres::{ensure_database_exists, PgRecordStore};

use crate::config::{PropertyDescriptor, ResolvedEntity};
use crate::error::AppError;
use crate::record::{KeyValue, Record};
use async_trait::async_trait;
use serde_json::Value;

/// Row access for a resolved entity. Implementations never interpret OData; they only fetch.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All rows, key order, at most `top`.
    async fn find_all(&self, entity: &ResolvedEntity, top: Option<u32>) -> Result<Vec<Record>, AppError>;

    /// Rows whose key equals `key`. More than one row means the key is not unique in storage.
    async fn find_by_key(&self, entity: &ResolvedEntity, key: &KeyValue) -> Result<Vec<Record>, AppError>;

    /// One property of every row.
    async fn find_with_selection(
        &self,
        entity: &ResolvedEntity,
        property: &PropertyDescriptor,
        top: Option<u32>,
    ) -> Result<Vec<Value>, AppError>;

    /// Several properties of every row; each tuple follows the order of `properties`.
    async fn find_with_selections(
        &self,
        entity: &ResolvedEntity,
        properties: &[&PropertyDescriptor],
        top: Option<u32>,
    ) -> Result<Vec<Vec<Value>>, AppError>;

    async fn count(&self, entity: &ResolvedEntity) -> Result<u64, AppError>;

    /// Cheap liveness check used by the readiness route.
    async fn ping(&self) -> Result<(), AppError>;
}
