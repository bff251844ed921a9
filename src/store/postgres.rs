//! PostgreSQL record store on a sqlx pool.

use crate::config::{PropertyDescriptor, ResolvedEntity};
use crate::error::AppError;
use crate::odata::PrimitiveKind;
use crate::record::{KeyValue, Record};
use crate::sql::{select_all, select_by_key, select_count, select_projection, PgBindValue, QueryBuf};
use crate::store::RecordStore;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{ConnectOptions, PgPool, Row};
use std::str::FromStr;

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        PgRecordStore { pool }
    }

    async fn fetch(&self, q: &QueryBuf) -> Result<Vec<PgRow>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from(p));
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}

/// Decode column `idx` according to the property kind. The builder casts every column to match.
fn cell_to_value(row: &PgRow, idx: usize, kind: PrimitiveKind) -> Result<Value, AppError> {
    let value = match kind {
        PrimitiveKind::String => row.try_get::<Option<String>, _>(idx)?.map(Value::String),
        PrimitiveKind::Decimal => row.try_get::<Option<String>, _>(idx)?.map(decimal_value),
        PrimitiveKind::Date => row
            .try_get::<Option<chrono::NaiveDate>, _>(idx)?
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        PrimitiveKind::Double => row.try_get::<Option<f64>, _>(idx)?.map(double_value),
        PrimitiveKind::Int32 => row.try_get::<Option<i32>, _>(idx)?.map(|n| Value::Number(n.into())),
        PrimitiveKind::Int64 => row.try_get::<Option<i64>, _>(idx)?.map(|n| Value::Number(n.into())),
        PrimitiveKind::Boolean => row.try_get::<Option<bool>, _>(idx)?.map(Value::Bool),
        PrimitiveKind::DateTimeOffset => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)?
            .map(|d| Value::String(d.to_rfc3339())),
        PrimitiveKind::Guid => row
            .try_get::<Option<uuid::Uuid>, _>(idx)?
            .map(|u| Value::String(u.to_string())),
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Non-finite doubles are written as the OData literals `NaN`, `INF` and `-INF`.
fn double_value(f: f64) -> Value {
    match serde_json::Number::from_f64(f) {
        Some(n) => Value::Number(n),
        None if f.is_nan() => Value::String("NaN".into()),
        None if f > 0.0 => Value::String("INF".into()),
        None => Value::String("-INF".into()),
    }
}

/// Digits an f64 carries without loss.
const EXACT_DECIMAL_DIGITS: usize = 15;

/// Decimals that fit an f64 exactly become JSON numbers. Wider ones keep their text.
fn decimal_value(text: String) -> Value {
    let mantissa = text
        .trim_start_matches(['-', '+'])
        .split(['e', 'E'])
        .next()
        .unwrap_or("");
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let significant = digits.trim_start_matches('0').trim_end_matches('0').len();
    if significant > EXACT_DECIMAL_DIGITS {
        return Value::String(text);
    }
    match serde_json::Number::from_str(&text) {
        Ok(n) => Value::Number(n),
        Err(_) => Value::String(text),
    }
}

fn row_to_record(row: &PgRow, properties: &[PropertyDescriptor]) -> Result<Record, AppError> {
    properties
        .iter()
        .enumerate()
        .map(|(i, p)| Ok((p.name.clone(), cell_to_value(row, i, p.kind)?)))
        .collect()
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_all(&self, entity: &ResolvedEntity, top: Option<u32>) -> Result<Vec<Record>, AppError> {
        let rows = self.fetch(&select_all(entity, top)).await?;
        rows.iter().map(|r| row_to_record(r, &entity.properties)).collect()
    }

    async fn find_by_key(&self, entity: &ResolvedEntity, key: &KeyValue) -> Result<Vec<Record>, AppError> {
        let rows = self.fetch(&select_by_key(entity, key)).await?;
        rows.iter().map(|r| row_to_record(r, &entity.properties)).collect()
    }

    async fn find_with_selection(
        &self,
        entity: &ResolvedEntity,
        property: &PropertyDescriptor,
        top: Option<u32>,
    ) -> Result<Vec<Value>, AppError> {
        let rows = self.fetch(&select_projection(entity, &[property], top)).await?;
        rows.iter().map(|r| cell_to_value(r, 0, property.kind)).collect()
    }

    async fn find_with_selections(
        &self,
        entity: &ResolvedEntity,
        properties: &[&PropertyDescriptor],
        top: Option<u32>,
    ) -> Result<Vec<Vec<Value>>, AppError> {
        let rows = self.fetch(&select_projection(entity, properties, top)).await?;
        rows.iter()
            .map(|r| {
                properties
                    .iter()
                    .enumerate()
                    .map(|(i, p)| cell_to_value(r, i, p.kind))
                    .collect()
            })
            .collect()
    }

    async fn count(&self, entity: &ResolvedEntity) -> Result<u64, AppError> {
        let q = select_count(entity);
        tracing::debug!(sql = %q.sql, "query");
        let n: i64 = sqlx::query_scalar(&q.sql).fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn database_name_is_split_from_url() {
        let (admin, db) = parse_db_name_from_url("postgres://u:p@localhost:5432/odata?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(db, "odata");
        assert!(parse_db_name_from_url("nopath").is_err());
    }

    #[test]
    fn non_finite_doubles_use_odata_literals() {
        assert_eq!(double_value(0.5), json!(0.5));
        assert_eq!(double_value(f64::NAN), json!("NaN"));
        assert_eq!(double_value(f64::INFINITY), json!("INF"));
        assert_eq!(double_value(f64::NEG_INFINITY), json!("-INF"));
    }

    #[test]
    fn wide_decimals_keep_their_digits() {
        assert_eq!(decimal_value("0.25".into()), json!(0.25));
        assert_eq!(decimal_value("-12.500".into()), json!(-12.5));
        assert_eq!(
            decimal_value("12345678901234567890.123".into()),
            json!("12345678901234567890.123")
        );
        assert_eq!(decimal_value("0.1234567890123456789".into()), json!("0.1234567890123456789"));
        assert_eq!(decimal_value("NaN".into()), json!("NaN"));
    }

    #[test]
    fn database_identifier_is_quoted() {
        assert_eq!(quote_ident(r#"my"db"#), r#""my""db""#);
    }
}
