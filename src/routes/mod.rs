//! Router assembly.

mod common;
mod odata;
pub use common::common_routes;
pub use odata::odata_routes;

use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Request bodies are never read; the limit only bounds what a refused write may send.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Full application: OData service plus common routes, with body limit and HTTP tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(odata_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
}
