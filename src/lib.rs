//! OData adapter: read-only OData v4 JSON service over configured SQL tables.

pub mod case;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod odata;
pub mod provider;
pub mod record;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod telemetry;

pub use config::{load_from_path, resolve, ModelConfig, ResolvedEntity, ResolvedModel, Settings};
pub use error::{AppError, ConfigError};
pub use provider::{EntityProvider, GenericEntityProvider, ProviderRegistry};
pub use record::{KeyValue, Record};
pub use routes::{common_routes, odata_routes, router};
pub use state::AppState;
pub use store::{ensure_database_exists, MemoryRecordStore, PgRecordStore, RecordStore};
pub use telemetry::init_tracing;
