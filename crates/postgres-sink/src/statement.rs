//! DML statement construction for change events.
//!
//! Each builder turns one payload into one parameterized statement. The
//! envelope's row-state maps have no inherent column order, so every builder
//! fixes an order once by collecting the driving map's keys into a vector
//! and derives the column list, the placeholder list and the argument list
//! from that single vector. `serde_json::Map` iterates in sorted key order,
//! which also makes the fixed order stable across runs.
//!
//! Table and column names come straight from the envelope, so both go
//! through [`quote_ident`] before they reach the SQL text.

use cdc_types::{ChangePayload, Op};
use serde_json::Value;

use crate::error::{ApplyError, Result};

/// A built DML statement: SQL text plus positional arguments.
///
/// Arguments stay as JSON values here; conversion to wire parameters
/// happens at execution time, driven by the server-declared types.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

/// Quote an identifier for interpolation into SQL text.
///
/// Wraps the name in double quotes and doubles any embedded quote, so a
/// hostile table or column name cannot escape the identifier position.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn placeholders(range: std::ops::RangeInclusive<usize>) -> String {
    range
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Build the INSERT for a create change.
///
/// Shape: `INSERT INTO "t"("c1",...,"cN") VALUES ($1,...,$N)` with the
/// `after` values as arguments, in the fixed column order.
pub fn build_insert(payload: &ChangePayload) -> Result<Statement> {
    let after = payload.after.as_ref().ok_or(ApplyError::MissingFieldSet {
        op: Op::Create,
        missing: "after",
    })?;

    let columns: Vec<&String> = after.keys().collect();
    let fields = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(",");
    let args = columns
        .iter()
        .map(|c| after[c.as_str()].clone())
        .collect();

    let sql = format!(
        "INSERT INTO {}({}) VALUES ({})",
        quote_ident(&payload.source.table),
        fields,
        placeholders(1..=columns.len()),
    );
    Ok(Statement { sql, args })
}

/// Build the UPDATE for an update change.
///
/// The column order is fixed over `before`'s keys. WHERE placeholders
/// `$1..$N` bind the old values; SET placeholders `$N+1..$2N` bind the new
/// values looked up by the same column names. A column captured in `before`
/// but absent from `after` binds SQL NULL.
///
/// Shape: `UPDATE "t" SET ("c1",...)=($N+1,...) WHERE ("c1",...)=($1,...)`
/// with the old values first in the argument list, then the new values.
pub fn build_update(payload: &ChangePayload) -> Result<Statement> {
    let before = payload.before.as_ref().ok_or(ApplyError::MissingFieldSet {
        op: Op::Update,
        missing: "before",
    })?;
    let after = payload.after.as_ref().ok_or(ApplyError::MissingFieldSet {
        op: Op::Update,
        missing: "after",
    })?;

    let columns: Vec<&String> = before.keys().collect();
    let n = columns.len();
    let fields = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(",");

    let mut args: Vec<Value> = columns
        .iter()
        .map(|c| before[c.as_str()].clone())
        .collect();
    args.extend(
        columns
            .iter()
            .map(|c| after.get(c.as_str()).cloned().unwrap_or(Value::Null)),
    );

    let sql = format!(
        "UPDATE {} SET ({})=({}) WHERE ({})=({})",
        quote_ident(&payload.source.table),
        fields,
        placeholders(n + 1..=2 * n),
        fields,
        placeholders(1..=n),
    );
    Ok(Statement { sql, args })
}

/// Build the DELETE for a delete change.
///
/// Shape: `DELETE FROM "t" WHERE ("c1",...)=($1,...,$N)` with the `before`
/// values as arguments, in the fixed column order.
pub fn build_delete(payload: &ChangePayload) -> Result<Statement> {
    let before = payload.before.as_ref().ok_or(ApplyError::MissingFieldSet {
        op: Op::Delete,
        missing: "before",
    })?;

    let columns: Vec<&String> = before.keys().collect();
    let fields = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(",");
    let args = columns
        .iter()
        .map(|c| before[c.as_str()].clone())
        .collect();

    let sql = format!(
        "DELETE FROM {} WHERE ({})=({})",
        quote_ident(&payload.source.table),
        fields,
        placeholders(1..=columns.len()),
    );
    Ok(Statement { sql, args })
}
