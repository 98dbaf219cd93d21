//! Binding JSON values as statement parameters.
//!
//! The change envelope carries column values as schema-less JSON; the server
//! knows the real column types. [`PgJson`] bridges the two: tokio-postgres
//! hands `to_sql` the type the server declared for each parameter position,
//! and the value is converted accordingly. A value that cannot be read as
//! the declared type is a per-call error, which surfaces through statement
//! execution like any other database failure.

use base64::Engine as _;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::error::Error;
use std::str::FromStr;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};

/// A JSON value bound as a statement parameter.
#[derive(Debug)]
pub struct PgJson<'a>(pub &'a Value);

type BoxedError = Box<dyn Error + Sync + Send>;

impl ToSql for PgJson<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxedError> {
        let value = self.0;
        if value.is_null() {
            return Ok(IsNull::Yes);
        }
        match *ty {
            Type::BOOL => as_bool(value, ty)?.to_sql(ty, out),
            Type::INT2 => i16::try_from(as_i64(value, ty)?)?.to_sql(ty, out),
            Type::INT4 => i32::try_from(as_i64(value, ty)?)?.to_sql(ty, out),
            Type::INT8 => as_i64(value, ty)?.to_sql(ty, out),
            Type::FLOAT4 => (as_f64(value, ty)? as f32).to_sql(ty, out),
            Type::FLOAT8 => as_f64(value, ty)?.to_sql(ty, out),
            Type::NUMERIC => as_decimal(value, ty)?.to_sql(ty, out),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                as_str(value, ty)?.to_sql(ty, out)
            }
            // Debezium encodes bytea columns as base64 strings.
            Type::BYTEA => base64::engine::general_purpose::STANDARD
                .decode(as_str(value, ty)?)?
                .to_sql(ty, out),
            Type::UUID => uuid::Uuid::parse_str(as_str(value, ty)?)?.to_sql(ty, out),
            Type::TIMESTAMP => as_timestamp(value, ty)?.naive_utc().to_sql(ty, out),
            Type::TIMESTAMPTZ => as_timestamp(value, ty)?.to_sql(ty, out),
            Type::DATE => as_date(value, ty)?.to_sql(ty, out),
            Type::JSON | Type::JSONB => match value {
                // A JSON column often arrives as a JSON-encoded string.
                Value::String(s) => match serde_json::from_str::<Value>(s) {
                    Ok(parsed) => parsed.to_sql(ty, out),
                    Err(_) => value.to_sql(ty, out),
                },
                _ => value.to_sql(ty, out),
            },
            _ => Err(mismatch(value, ty)),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Conversion is checked per call so the error can carry the
        // offending value and type.
        true
    }

    to_sql_checked!();
}

fn mismatch(value: &Value, ty: &Type) -> BoxedError {
    format!("cannot bind JSON value {value} as PostgreSQL type {ty}").into()
}

fn as_bool(value: &Value, ty: &Type) -> Result<bool, BoxedError> {
    value.as_bool().ok_or_else(|| mismatch(value, ty))
}

fn as_i64(value: &Value, ty: &Type) -> Result<i64, BoxedError> {
    value.as_i64().ok_or_else(|| mismatch(value, ty))
}

fn as_f64(value: &Value, ty: &Type) -> Result<f64, BoxedError> {
    value.as_f64().ok_or_else(|| mismatch(value, ty))
}

fn as_str<'a>(value: &'a Value, ty: &Type) -> Result<&'a str, BoxedError> {
    value.as_str().ok_or_else(|| mismatch(value, ty))
}

fn as_decimal(value: &Value, ty: &Type) -> Result<Decimal, BoxedError> {
    match value {
        // Connectors configured for lossless decimals send a string.
        Value::String(s) => Ok(Decimal::from_str(s)?),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Decimal::from(i))
            } else {
                Ok(Decimal::try_from(as_f64(value, ty)?)?)
            }
        }
        _ => Err(mismatch(value, ty)),
    }
}

/// Event timestamps arrive either as epoch milliseconds or as one of a few
/// textual layouts, depending on the connector's converter settings.
fn as_timestamp(value: &Value, ty: &Type) -> Result<DateTime<Utc>, BoxedError> {
    if let Some(millis) = value.as_i64() {
        return DateTime::from_timestamp_millis(millis).ok_or_else(|| mismatch(value, ty));
    }
    let s = as_str(value, ty)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f %z") {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }
    Err(mismatch(value, ty))
}

fn as_date(value: &Value, ty: &Type) -> Result<chrono::NaiveDate, BoxedError> {
    // Debezium's date type is days since the epoch.
    if let Some(days) = value.as_i64() {
        return DateTime::from_timestamp(days * 86_400, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| mismatch(value, ty));
    }
    Ok(chrono::NaiveDate::parse_from_str(as_str(value, ty)?, "%Y-%m-%d")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bind(value: &Value, ty: &Type) -> Result<IsNull, BoxedError> {
        let mut buf = BytesMut::new();
        PgJson(value).to_sql(ty, &mut buf)
    }

    #[test]
    fn test_null_binds_as_sql_null_for_any_type() {
        for ty in [Type::BOOL, Type::INT8, Type::TEXT, Type::TIMESTAMPTZ] {
            assert!(matches!(bind(&Value::Null, &ty), Ok(IsNull::Yes)));
        }
    }

    #[test]
    fn test_scalar_conversions() {
        assert!(bind(&json!(true), &Type::BOOL).is_ok());
        assert!(bind(&json!(42), &Type::INT2).is_ok());
        assert!(bind(&json!(42), &Type::INT4).is_ok());
        assert!(bind(&json!(42), &Type::INT8).is_ok());
        assert!(bind(&json!(1.5), &Type::FLOAT8).is_ok());
        assert!(bind(&json!(42), &Type::FLOAT8).is_ok());
        assert!(bind(&json!("hello"), &Type::TEXT).is_ok());
        assert!(bind(&json!("19.99"), &Type::NUMERIC).is_ok());
        assert!(bind(&json!(19), &Type::NUMERIC).is_ok());
    }

    #[test]
    fn test_narrowing_overflow_is_an_error() {
        assert!(bind(&json!(100_000), &Type::INT2).is_err());
        assert!(bind(&json!(i64::MAX), &Type::INT4).is_err());
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        assert!(bind(&json!("not a number"), &Type::INT8).is_err());
        assert!(bind(&json!(1), &Type::BOOL).is_err());
        assert!(bind(&json!(true), &Type::TEXT).is_err());
    }

    #[test]
    fn test_uuid_binding() {
        assert!(bind(&json!("550e8400-e29b-41d4-a716-446655440000"), &Type::UUID).is_ok());
        assert!(bind(&json!("not-a-uuid"), &Type::UUID).is_err());
    }

    #[test]
    fn test_bytea_expects_base64() {
        assert!(bind(&json!("aGVsbG8="), &Type::BYTEA).is_ok());
        assert!(bind(&json!("%%%"), &Type::BYTEA).is_err());
    }

    #[test]
    fn test_timestamp_formats() {
        for v in [
            json!(1700000000000i64),
            json!("2024-01-01T10:00:00Z"),
            json!("2024-01-01T10:00:00.123456"),
            json!("2024-01-01 10:00:00"),
        ] {
            assert!(bind(&v, &Type::TIMESTAMPTZ).is_ok(), "failed for {v}");
            assert!(bind(&v, &Type::TIMESTAMP).is_ok(), "failed for {v}");
        }
        assert!(bind(&json!("yesterday"), &Type::TIMESTAMPTZ).is_err());
    }

    #[test]
    fn test_date_from_epoch_days_and_text() {
        assert!(bind(&json!(19000), &Type::DATE).is_ok());
        assert!(bind(&json!("2024-01-01"), &Type::DATE).is_ok());
        assert!(bind(&json!("01/01/2024"), &Type::DATE).is_err());
    }

    #[test]
    fn test_json_columns_take_any_value() {
        assert!(bind(&json!({"k": [1, 2]}), &Type::JSONB).is_ok());
        // A pre-encoded JSON string is parsed rather than double-encoded.
        assert!(bind(&json!("{\"k\":1}"), &Type::JSON).is_ok());
    }
}
