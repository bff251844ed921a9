//! OData server: reads settings from the environment, loads the entity model, serves the OData routes.
//!
//! Run from repo root: `cargo run -p odata-adapter-server`

use odata_adapter::telemetry::DEFAULT_LOG_DIRECTIVE;
use odata_adapter::{
    ensure_database_exists, init_tracing, load_from_path, resolve, router, AppState, PgRecordStore,
    ProviderRegistry, RecordStore, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing(DEFAULT_LOG_DIRECTIVE);

    ensure_database_exists(&settings.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;

    let config = load_from_path(&settings.model_path).await?;
    let model = resolve(&config)?;
    let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(pool));
    let registry = ProviderRegistry::from_model(&model, store.clone(), settings.max_top)?;
    tracing::info!(entity_sets = registry.len(), "registry ready");

    let state = AppState::new(model, registry, store, settings.service_path.clone());
    let app = router(state);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(
        "OData service listening on http://{}/{}",
        listener.local_addr()?,
        settings.service_path
    );
    axum::serve(listener, app).await?;
    Ok(())
}
