//! Minimal read-only OData v4 JSON surface: URIs, EDM, format negotiation, payloads.

pub mod edm;
pub mod format;
pub mod serializer;
pub mod uri;

pub use edm::{metadata_document, service_document, MetadataDocument, PrimitiveKind};
pub use format::{negotiate, MetadataLevel, ResponseFormat};
pub use serializer::{serialize_collection, serialize_entity, serialize_property, Context};
pub use uri::{coerce_key, parse_path, parse_query, KeyPredicate, QueryOptions, ResourcePath};
