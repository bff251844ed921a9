//! Effective HTTP method, honouring `X-HTTP-Method` / `X-HTTP-Method-Override` on POST.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, Method},
};

pub const X_HTTP_METHOD: &str = "X-HTTP-Method";
pub const X_HTTP_METHOD_OVERRIDE: &str = "X-HTTP-Method-Override";

/// Methods an override header may name.
const KNOWN_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "MERGE"];

/// The method the request is treated as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectiveMethod(pub Method);

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn known_method(name: &str) -> Result<Method, AppError> {
    let upper = name.to_ascii_uppercase();
    if !KNOWN_METHODS.contains(&upper.as_str()) {
        return Err(AppError::BadRequest(format!("Invalid HTTP method: {}", name)));
    }
    Method::from_bytes(upper.as_bytes()).map_err(|_| AppError::BadRequest(format!("Invalid HTTP method: {}", name)))
}

/// Resolve the effective method from the transport method and override headers.
/// HEAD reads like GET; the transport drops the body. Other transport methods pass
/// through and are refused per resource by the handler.
pub fn resolve_method(method: &Method, headers: &HeaderMap) -> Result<Method, AppError> {
    if method == Method::HEAD {
        return Ok(Method::GET);
    }
    if method != Method::POST {
        return Ok(method.clone());
    }
    let x_method = header_str(headers, X_HTTP_METHOD);
    let x_override = header_str(headers, X_HTTP_METHOD_OVERRIDE);
    match (x_method, x_override) {
        (None, None) => Ok(Method::POST),
        (Some(m), None) | (None, Some(m)) => known_method(m),
        (Some(a), Some(b)) if !a.eq_ignore_ascii_case(b) => {
            Err(AppError::BadRequest("Ambiguous X-HTTP-Methods".into()))
        }
        (Some(a), Some(_)) => known_method(a),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for EffectiveMethod
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        resolve_method(&parts.method, &parts.headers).map(EffectiveMethod)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn plain_methods_pass_through() {
        assert_eq!(resolve_method(&Method::GET, &HeaderMap::new()).unwrap(), Method::GET);
        assert_eq!(resolve_method(&Method::POST, &HeaderMap::new()).unwrap(), Method::POST);
    }

    #[test]
    fn override_applies_only_to_post() {
        let h = headers(&[("x-http-method", "delete")]);
        assert_eq!(resolve_method(&Method::POST, &h).unwrap(), Method::DELETE);
        assert_eq!(resolve_method(&Method::GET, &h).unwrap(), Method::GET);
    }

    #[test]
    fn matching_headers_are_case_insensitive() {
        let h = headers(&[("x-http-method", "patch"), ("x-http-method-override", "PATCH")]);
        assert_eq!(resolve_method(&Method::POST, &h).unwrap(), Method::PATCH);
    }

    #[test]
    fn conflicting_headers_are_ambiguous() {
        let h = headers(&[("x-http-method", "PUT"), ("x-http-method-override", "DELETE")]);
        let err = resolve_method(&Method::POST, &h).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m == "Ambiguous X-HTTP-Methods"));
    }

    #[test]
    fn unknown_override_is_invalid() {
        let h = headers(&[("x-http-method-override", "FROB")]);
        let err = resolve_method(&Method::POST, &h).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(m) if m.starts_with("Invalid HTTP method")));
    }

    #[test]
    fn head_reads_like_get_and_other_methods_pass_through() {
        assert_eq!(resolve_method(&Method::HEAD, &HeaderMap::new()).unwrap(), Method::GET);
        assert_eq!(resolve_method(&Method::OPTIONS, &HeaderMap::new()).unwrap(), Method::OPTIONS);
    }
}
