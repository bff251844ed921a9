//! OData resource path and system query option parsing.

use crate::error::AppError;
use crate::odata::PrimitiveKind;
use crate::record::KeyValue;

/// Key predicate as written in the URI; coerced once the key property is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPredicate {
    /// Property name for the `(id=1)` form.
    pub name: Option<String>,
    pub raw: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourcePath {
    ServiceDocument,
    Metadata,
    EntitySet { entity_set: String },
    Entity { entity_set: String, key: KeyPredicate },
    Property { entity_set: String, key: KeyPredicate, property: String },
}

impl ResourcePath {
    pub fn entity_set(&self) -> Option<&str> {
        match self {
            ResourcePath::EntitySet { entity_set }
            | ResourcePath::Entity { entity_set, .. }
            | ResourcePath::Property { entity_set, .. } => Some(entity_set),
            ResourcePath::ServiceDocument | ResourcePath::Metadata => None,
        }
    }
}

/// Split off the first path segment, ignoring slashes inside quoted key literals.
fn split_first_segment(path: &str) -> (&str, Option<&str>) {
    let mut in_quote = false;
    for (i, c) in path.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '/' if !in_quote => return (&path[..i], Some(&path[i + 1..])),
            _ => {}
        }
    }
    (path, None)
}

fn parse_key_predicate(text: &str) -> Result<KeyPredicate, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("empty key predicate".into()));
    }
    let mut in_quote = false;
    let mut eq_at = None;
    for (i, c) in text.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            ',' if !in_quote => {
                return Err(AppError::BadRequest(format!("compound key not supported: ({})", text)));
            }
            '=' if !in_quote && eq_at.is_none() => eq_at = Some(i),
            _ => {}
        }
    }
    if in_quote {
        return Err(AppError::BadRequest(format!("unterminated string in key: ({})", text)));
    }
    Ok(match eq_at {
        Some(i) => KeyPredicate {
            name: Some(text[..i].trim().to_string()),
            raw: text[i + 1..].trim().to_string(),
        },
        None => KeyPredicate {
            name: None,
            raw: text.to_string(),
        },
    })
}

/// Parse the path below the service root (already percent-decoded).
pub fn parse_path(path: &str) -> Result<ResourcePath, AppError> {
    let path = path.trim_matches('/');
    if path.is_empty() {
        return Ok(ResourcePath::ServiceDocument);
    }
    if path == "$metadata" {
        return Ok(ResourcePath::Metadata);
    }

    let (head, rest) = split_first_segment(path);
    let (entity_set, key) = match head.find('(') {
        None => (head, None),
        Some(open) => {
            if !head.ends_with(')') {
                return Err(AppError::BadRequest(format!("malformed resource segment: {}", head)));
            }
            (&head[..open], Some(parse_key_predicate(&head[open + 1..head.len() - 1])?))
        }
    };
    if entity_set.is_empty() || entity_set.starts_with('$') {
        return Err(AppError::BadRequest(format!("unsupported resource: {}", head)));
    }
    let entity_set = entity_set.to_string();

    match (key, rest) {
        (None, None) => Ok(ResourcePath::EntitySet { entity_set }),
        (Some(key), None) => Ok(ResourcePath::Entity { entity_set, key }),
        (Some(key), Some(rest)) => {
            let rest = rest.trim_end_matches('/');
            if rest.contains('/') || rest.starts_with('$') {
                return Err(AppError::NotImplemented(format!(
                    "resource path '{}' is not supported",
                    path
                )));
            }
            if rest.is_empty() {
                return Ok(ResourcePath::Entity { entity_set, key });
            }
            Ok(ResourcePath::Property {
                entity_set,
                key,
                property: rest.to_string(),
            })
        }
        (None, Some(rest)) if rest.trim_end_matches('/').is_empty() => Ok(ResourcePath::EntitySet { entity_set }),
        (None, Some(rest)) if rest.starts_with('$') => Err(AppError::NotImplemented(format!(
            "resource path '{}' is not supported",
            path
        ))),
        (None, Some(_)) => Err(AppError::BadRequest(format!(
            "property access requires a key predicate: {}",
            path
        ))),
    }
}

/// Coerce a key predicate to the key property's kind.
pub fn coerce_key(
    key: &KeyPredicate,
    key_name: &str,
    kind: PrimitiveKind,
) -> Result<KeyValue, AppError> {
    if let Some(name) = &key.name {
        if name != key_name {
            return Err(AppError::BadRequest(format!(
                "key property '{}' does not exist; the key is '{}'",
                name, key_name
            )));
        }
    }
    let raw = key.raw.as_str();
    match kind {
        PrimitiveKind::Int32 => raw
            .parse::<i32>()
            .map(|n| KeyValue::Int(n.into()))
            .map_err(|_| AppError::BadRequest(format!("invalid Edm.Int32 key: {}", raw))),
        PrimitiveKind::Int64 => raw
            .parse::<i64>()
            .map(KeyValue::Int)
            .map_err(|_| AppError::BadRequest(format!("invalid Edm.Int64 key: {}", raw))),
        PrimitiveKind::String => {
            let inner = raw
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
                .ok_or_else(|| AppError::BadRequest(format!("invalid Edm.String key: {}", raw)))?;
            Ok(KeyValue::Text(inner.replace("''", "'")))
        }
        PrimitiveKind::Guid => uuid::Uuid::parse_str(raw)
            .map(KeyValue::Guid)
            .map_err(|_| AppError::BadRequest(format!("invalid Edm.Guid key: {}", raw))),
        other => Err(AppError::Internal(format!("{} is not a key kind", other.edm_name()))),
    }
}

/// System query options this adapter honours.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// `None` when absent or `*`.
    pub select: Option<Vec<String>>,
    pub top: Option<u32>,
    pub count: bool,
    pub format: Option<String>,
}

fn parse_select(value: &str) -> Result<Option<Vec<String>>, AppError> {
    let mut names: Vec<String> = Vec::new();
    for item in value.split(',') {
        let item = item.trim();
        if item.is_empty() {
            return Err(AppError::BadRequest(format!("invalid $select: '{}'", value)));
        }
        if item == "*" {
            return Ok(None);
        }
        if item.contains('/') || item.contains('(') {
            return Err(AppError::NotImplemented(format!("$select path '{}' is not supported", item)));
        }
        if !names.iter().any(|n| n == item) {
            names.push(item.to_string());
        }
    }
    Ok(Some(names))
}

/// Parse decoded query pairs. Custom (non-`$`) options are ignored; any `$` option
/// other than `$select`, `$top`, `$count` and `$format` is not implemented.
pub fn parse_query(pairs: &[(String, String)]) -> Result<QueryOptions, AppError> {
    let mut seen: Vec<&str> = Vec::new();
    let mut opts = QueryOptions::default();
    for (k, v) in pairs {
        if !k.starts_with('$') {
            continue;
        }
        if seen.contains(&k.as_str()) {
            return Err(AppError::BadRequest(format!("query option {} given more than once", k)));
        }
        seen.push(k);
        match k.as_str() {
            "$select" => opts.select = parse_select(v)?,
            "$top" => {
                let n = v
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| AppError::BadRequest(format!("invalid $top: '{}'", v)))?;
                opts.top = Some(n);
            }
            "$count" => {
                opts.count = match v.trim() {
                    "true" => true,
                    "false" => false,
                    _ => return Err(AppError::BadRequest(format!("invalid $count: '{}'", v))),
                }
            }
            "$format" => opts.format = Some(v.trim().to_string()),
            other => {
                return Err(AppError::NotImplemented(format!(
                    "system query option {} is not supported",
                    other
                )))
            }
        }
    }
    Ok(opts)
}
