//! QueryService: read-only query execution, result shaping and request validation.

mod query;
mod shaper;
mod validation;
pub use query::QueryService;
pub use shaper::{ResultShaper, ShapedEntity};
pub use validation::QueryValidator;
