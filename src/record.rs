//! Generic persisted rows and key values exchanged with the record store.

use serde_json::Value;
use std::collections::HashMap;

/// A persisted row, keyed by property name. Read-only to the request path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record(HashMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Record(HashMap::new())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record(iter.into_iter().collect())
    }
}

/// Key value coerced to the key property's kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyValue {
    Int(i64),
    Text(String),
    Guid(uuid::Uuid),
}

impl KeyValue {
    pub fn to_json(&self) -> Value {
        match self {
            KeyValue::Int(n) => Value::Number((*n).into()),
            KeyValue::Text(s) => Value::String(s.clone()),
            KeyValue::Guid(u) => Value::String(u.to_string()),
        }
    }

    /// Literal form used inside a URI key predicate, e.g. `42` or `'abc'`.
    pub fn literal(&self) -> String {
        match self {
            KeyValue::Int(n) => n.to_string(),
            KeyValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            KeyValue::Guid(u) => u.to_string(),
        }
    }

    /// Whether a stored value equals this key.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (KeyValue::Int(n), Value::Number(m)) => m.as_i64() == Some(*n),
            (KeyValue::Text(s), Value::String(t)) => s == t,
            (KeyValue::Guid(u), Value::String(t)) => uuid::Uuid::parse_str(t).map(|v| v == *u).unwrap_or(false),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_literals() {
        assert_eq!(KeyValue::Int(42).literal(), "42");
        assert_eq!(KeyValue::Text("O'Neil".into()).literal(), "'O''Neil'");
    }

    #[test]
    fn key_matching_is_kind_aware() {
        assert!(KeyValue::Int(7).matches(&json!(7)));
        assert!(!KeyValue::Int(7).matches(&json!("7")));
        assert!(KeyValue::Text("a".into()).matches(&json!("a")));
        let u = uuid::Uuid::new_v4();
        assert!(KeyValue::Guid(u).matches(&json!(u.to_string().to_uppercase())));
    }
}
