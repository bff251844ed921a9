//! OData response helpers: content type and version headers on every payload.

use crate::odata::ResponseFormat;
use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub const ODATA_VERSION_HEADER: HeaderName = HeaderName::from_static("odata-version");
pub const ODATA_VERSION: &str = "4.0";

const JSON_CONTENT_TYPE: &str = "application/json";

fn with_headers(status: StatusCode, content_type: &'static str, body: Vec<u8>) -> Response {
    let mut response = (status, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(ODATA_VERSION_HEADER, HeaderValue::from_static(ODATA_VERSION));
    response
}

/// 200 with a serialized OData payload in the negotiated format.
pub fn odata_response(format: ResponseFormat, body: Vec<u8>) -> Response {
    with_headers(StatusCode::OK, format.content_type(), body)
}

/// 200 with a plain JSON document (metadata, service document).
pub fn json_document<T: Serialize>(document: &T) -> Response {
    match serde_json::to_vec(document) {
        Ok(body) => with_headers(StatusCode::OK, JSON_CONTENT_TYPE, body),
        Err(e) => crate::error::AppError::Internal(format!("serialization: {}", e)).into_response(),
    }
}

/// 204 for a null primitive property.
pub fn no_content() -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    response
        .headers_mut()
        .insert(ODATA_VERSION_HEADER, HeaderValue::from_static(ODATA_VERSION));
    response
}
