//! Request extractors.

mod method;
pub use method::{resolve_method, EffectiveMethod, X_HTTP_METHOD, X_HTTP_METHOD_OVERRIDE};
