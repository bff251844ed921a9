//! Builds parameterized SELECTs from a resolved entity.

use crate::config::{PropertyDescriptor, ResolvedEntity};
use crate::odata::PrimitiveKind;
use crate::record::KeyValue;

/// Quote identifier for PostgreSQL (safe: only from config).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<KeyValue>,
}

impl QueryBuf {
    fn new(sql: String) -> Self {
        QueryBuf {
            sql,
            params: Vec::new(),
        }
    }
}

/// Column expression cast to the type the decoder expects for the property's kind.
fn select_expr(p: &PropertyDescriptor) -> String {
    let col = quoted(&p.column);
    let cast = match p.kind {
        PrimitiveKind::String | PrimitiveKind::Decimal => "text",
        PrimitiveKind::Date => "date",
        PrimitiveKind::Double => "float8",
        PrimitiveKind::Int32 => "int4",
        PrimitiveKind::Int64 => "int8",
        PrimitiveKind::Boolean => "bool",
        PrimitiveKind::DateTimeOffset => "timestamptz",
        PrimitiveKind::Guid => "uuid",
    };
    format!("{}::{} AS {}", col, cast, quoted(&p.name))
}

fn select_list<'a>(props: impl IntoIterator<Item = &'a PropertyDescriptor>) -> String {
    props.into_iter().map(select_expr).collect::<Vec<_>>().join(", ")
}

fn key_column(entity: &ResolvedEntity) -> String {
    let column = entity
        .key_property()
        .map(|p| p.column.as_str())
        .unwrap_or(entity.key.as_str());
    quoted(column)
}

fn limit_clause(top: Option<u32>) -> String {
    top.map(|n| format!(" LIMIT {}", n)).unwrap_or_default()
}

/// SELECT every exposed property, ordered by key, optionally limited.
pub fn select_all(entity: &ResolvedEntity, top: Option<u32>) -> QueryBuf {
    QueryBuf::new(format!(
        "SELECT {} FROM {} ORDER BY {}{}",
        select_list(&entity.properties),
        qualified_table(&entity.schema_name, &entity.table_name),
        key_column(entity),
        limit_clause(top)
    ))
}

/// SELECT by key. LIMIT 2 so a duplicate key is detectable without scanning further.
pub fn select_by_key(entity: &ResolvedEntity, key: &KeyValue) -> QueryBuf {
    let mut q = QueryBuf::new(format!(
        "SELECT {} FROM {} WHERE {} = $1 LIMIT 2",
        select_list(&entity.properties),
        qualified_table(&entity.schema_name, &entity.table_name),
        key_column(entity)
    ));
    q.params.push(key.clone());
    q
}

/// SELECT only the given properties, in the given order.
pub fn select_projection(entity: &ResolvedEntity, props: &[&PropertyDescriptor], top: Option<u32>) -> QueryBuf {
    QueryBuf::new(format!(
        "SELECT {} FROM {} ORDER BY {}{}",
        select_list(props.iter().copied()),
        qualified_table(&entity.schema_name, &entity.table_name),
        key_column(entity),
        limit_clause(top)
    ))
}

pub fn select_count(entity: &ResolvedEntity) -> QueryBuf {
    QueryBuf::new(format!(
        "SELECT COUNT(*) FROM {}",
        qualified_table(&entity.schema_name, &entity.table_name)
    ))
}
