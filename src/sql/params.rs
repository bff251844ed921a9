//! Convert key values to types that sqlx can bind.

use crate::record::KeyValue;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

/// A key value bound with the PostgreSQL type matching its kind.
#[derive(Clone, Debug)]
pub enum PgBindValue {
    I64(i64),
    String(String),
    Uuid(uuid::Uuid),
}

impl From<&KeyValue> for PgBindValue {
    fn from(key: &KeyValue) -> Self {
        match key {
            KeyValue::Int(n) => PgBindValue::I64(*n),
            KeyValue::Text(s) => PgBindValue::String(s.clone()),
            KeyValue::Guid(u) => PgBindValue::Uuid(*u),
        }
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf),
            PgBindValue::String(s) => <&str as Encode<Postgres>>::encode_by_ref(&s.as_str(), buf),
            PgBindValue::Uuid(u) => <uuid::Uuid as Encode<Postgres>>::encode_by_ref(u, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgBindValue::I64(_) => <i64 as Type<Postgres>>::type_info(),
            PgBindValue::String(_) => <&str as Type<Postgres>>::type_info(),
            PgBindValue::Uuid(_) => <uuid::Uuid as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }

    fn compatible(_ty: &PgTypeInfo) -> bool {
        true
    }
}
