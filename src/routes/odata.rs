//! OData routes mounted under the configured service path. Every method reaches the handler.

use crate::handlers::odata::{resource, service};
use crate::state::AppState;
use axum::{routing::any, Router};

pub fn odata_routes(state: AppState) -> Router {
    let root = format!("/{}", state.service_path);
    Router::new()
        .route(&root, any(service))
        .route(&format!("{}/*path", root), any(resource))
        .with_state(state)
}
