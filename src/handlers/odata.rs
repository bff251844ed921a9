//! OData request handler: parse, dispatch to the entity provider, serialize.

use crate::error::AppError;
use crate::extractors::EffectiveMethod;
use crate::odata::{
    metadata_document, negotiate, parse_path, parse_query, serialize_collection, serialize_entity,
    serialize_property, service_document, Context, ResourcePath,
};
use crate::response::{json_document, no_content, odata_response};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method},
    response::Response,
};

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Absolute service root ending in `/`, e.g. `http://localhost:3000/odata/`.
fn service_root(headers: &HeaderMap, service_path: &str) -> String {
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
    let scheme = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("http");
    match host {
        Some(host) => format!("{}://{}/{}/", scheme, host, service_path),
        None => format!("/{}/", service_path),
    }
}

fn is_update(method: &Method) -> bool {
    method == Method::PUT || method == Method::PATCH || method.as_str() == "MERGE"
}

fn not_allowed(method: &Method, path: &ResourcePath) -> AppError {
    AppError::MethodNotAllowed(format!("{} is not allowed on {:?}", method, path))
}

/// Writes are recognised and refused; any other non-GET method is not allowed on the resource.
fn check_method(method: &Method, path: &ResourcePath) -> Result<(), AppError> {
    if method == Method::GET {
        return Ok(());
    }
    let message = match path {
        ResourcePath::EntitySet { .. } if method == Method::POST => "create entity is not supported yet.",
        ResourcePath::Entity { .. } if is_update(method) => "update entity is not supported yet.",
        ResourcePath::Entity { .. } if method == Method::DELETE => "delete entity is not supported yet.",
        ResourcePath::Property { .. } if is_update(method) => "Primitive property update is not supported yet.",
        ResourcePath::Property { .. } if method == Method::DELETE => "Primitive property delete is not supported yet.",
        _ => return Err(not_allowed(method, path)),
    };
    Err(AppError::NotImplemented(message.to_string()))
}

async fn dispatch(
    state: &AppState,
    raw_path: &str,
    headers: &HeaderMap,
    query: &[(String, String)],
    method: &Method,
) -> Result<Response, AppError> {
    let path = parse_path(raw_path)?;
    let options = parse_query(query)?;
    let provider = match path.entity_set() {
        Some(set) => Some(state.registry.provider(set)?),
        None => None,
    };
    check_method(method, &path)?;
    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());
    let format = negotiate(options.format.as_deref(), accept)?;
    let root = service_root(headers, &state.service_path);
    tracing::debug!(method = %method, path = ?path, "odata request");

    match (&path, provider) {
        (ResourcePath::ServiceDocument, _) => Ok(json_document(&service_document(&state.model, &root))),
        (ResourcePath::Metadata, _) => Ok(json_document(&metadata_document(&state.model))),
        (ResourcePath::EntitySet { entity_set }, Some(provider)) => {
            let collection = provider.read_collection(&options).await?;
            let context = Context::Collection {
                entity_set,
                select: options.select.as_deref(),
            };
            let body = serialize_collection(format, &root, &context, &collection.entities, collection.count)?;
            Ok(odata_response(format, body))
        }
        (ResourcePath::Entity { entity_set, key }, Some(provider)) => {
            let entity = provider.read_entity(key).await?;
            let body = serialize_entity(format, &root, &Context::Entity { entity_set }, &entity)?;
            Ok(odata_response(format, body))
        }
        (ResourcePath::Property { entity_set, key, property }, Some(provider)) => {
            let read = provider.read_property(key, property).await?;
            if read.value.is_null() {
                return Ok(no_content());
            }
            let key_literal = read.key.literal();
            let context = Context::Property {
                entity_set,
                key_literal: &key_literal,
                property: &read.property,
            };
            let body = serialize_property(format, &root, &context, &read.value)?;
            Ok(odata_response(format, body))
        }
        (_, None) => Err(AppError::Internal(format!("no provider resolved for {:?}", path))),
    }
}

/// `/{service_path}`: the service document.
pub async fn service(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    EffectiveMethod(method): EffectiveMethod,
) -> Result<Response, AppError> {
    dispatch(&state, "", &headers, &query, &method).await
}

/// `/{service_path}/*path`: metadata, entity sets, entities and properties.
pub async fn resource(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    EffectiveMethod(method): EffectiveMethod,
) -> Result<Response, AppError> {
    dispatch(&state, &path, &headers, &query, &method).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odata::KeyPredicate;
    use axum::http::HeaderValue;

    fn entity_path() -> ResourcePath {
        ResourcePath::Entity {
            entity_set: "Widgets".into(),
            key: KeyPredicate {
                name: None,
                raw: "1".into(),
            },
        }
    }

    #[test]
    fn writes_map_to_not_implemented() {
        let set = ResourcePath::EntitySet {
            entity_set: "Widgets".into(),
        };
        let err = check_method(&Method::POST, &set).unwrap_err();
        assert_eq!(err.to_string(), "create entity is not supported yet.");
        let err = check_method(&Method::PATCH, &entity_path()).unwrap_err();
        assert_eq!(err.to_string(), "update entity is not supported yet.");
        let err = check_method(&Method::DELETE, &entity_path()).unwrap_err();
        assert_eq!(err.to_string(), "delete entity is not supported yet.");
        assert!(check_method(&Method::GET, &set).is_ok());
    }

    #[test]
    fn other_methods_are_not_allowed() {
        let err = check_method(&Method::POST, &entity_path()).unwrap_err();
        assert!(matches!(err, AppError::MethodNotAllowed(_)));
        let err = check_method(&Method::DELETE, &ResourcePath::Metadata).unwrap_err();
        assert!(matches!(err, AppError::MethodNotAllowed(_)));
    }

    #[test]
    fn service_root_uses_host_and_forwarded_proto() {
        let mut headers = HeaderMap::new();
        assert_eq!(service_root(&headers, "odata"), "/odata/");
        headers.insert(header::HOST, HeaderValue::from_static("example.com"));
        assert_eq!(service_root(&headers, "odata"), "http://example.com/odata/");
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("https, http"));
        assert_eq!(service_root(&headers, "api/v4"), "https://example.com/api/v4/");
    }
}
