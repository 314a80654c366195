//! Statement templating over a bare connection.
//!
//! Identifiers are always double-quoted and values always bound, so field
//! names coming from callers can only ever fail with "no such column".

use chrono::Utc;
use rusqlite::{Connection, Row, params_from_iter};

use crate::{
    entities::{FieldMap, FieldValue},
    error::StoreError,
    schema::{DEFAULT_FORMAT, DELETED, LAST_UPDATE},
};

pub fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Current value for the modification marker.
pub fn now_stamp() -> String {
    Utc::now().format(DEFAULT_FORMAT).to_string()
}

/// Filter, pattern and window of a `SELECT`.
#[derive(Debug, Clone, Default)]
pub struct Query {
    terms: Vec<(String, FieldValue)>,
    pattern: Option<(String, String)>,
    with_deleted: bool,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.terms.push((field.to_string(), value.into()));
        self
    }

    /// Substring match on `field`.
    pub fn like(mut self, field: &str, pattern: &str) -> Self {
        self.pattern = Some((field.to_string(), format!("%{pattern}%")));
        self
    }

    /// Includes soft-deleted rows.
    pub fn with_deleted(mut self) -> Self {
        self.with_deleted = true;
        self
    }

    pub fn page(mut self, limit: Option<i64>, offset: Option<i64>) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn to_sql(&self, table: &str, projection: &str) -> (String, Vec<FieldValue>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if !self.with_deleted {
            clauses.push(format!("{} = 0", quote(DELETED)));
        }
        for (field, value) in &self.terms {
            values.push(value.clone());
            clauses.push(format!("{} = ?{}", quote(field), values.len()));
        }
        if let Some((field, pattern)) = &self.pattern {
            values.push(FieldValue::Text(pattern.clone()));
            clauses.push(format!("{} LIKE ?{}", quote(field), values.len()));
        }

        let mut sql = format!("SELECT {projection} FROM {}", quote(table));
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY rowid");

        if self.limit.is_some() || self.offset.is_some() {
            values.push(FieldValue::Int(self.limit.unwrap_or(-1)));
            sql.push_str(&format!(" LIMIT ?{}", values.len()));
            values.push(FieldValue::Int(self.offset.unwrap_or(0)));
            sql.push_str(&format!(" OFFSET ?{}", values.len()));
        }

        (sql, values)
    }
}

/// Runs `sql` and maps every row while the statement is borrowed.
///
/// The statement and its rows are released once, when this returns.
pub fn select<T>(
    conn: &Connection,
    sql: &str,
    params: &[FieldValue],
    mut map: impl FnMut(&Row<'_>) -> T,
) -> Result<Vec<T>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(map(row));
    }
    Ok(out)
}

/// Like [`select`] but stops after the first row.
pub fn select_one<T>(
    conn: &Connection,
    sql: &str,
    params: &[FieldValue],
    map: impl FnOnce(&Row<'_>) -> T,
) -> Result<Option<T>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    Ok(rows.next()?.map(map))
}

pub fn count(conn: &Connection, table: &str, query: &Query) -> Result<i64, StoreError> {
    let (sql, params) = query.to_sql(table, "COUNT(*)");
    Ok(conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?)
}

/// Inserts `fields` as one row and returns the new rowid.
pub fn insert(conn: &Connection, table: &str, fields: &FieldMap) -> Result<i64, StoreError> {
    if fields.is_empty() {
        return Err(StoreError::Empty);
    }

    let columns: Vec<String> = fields.iter().map(|(k, _)| quote(k)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(table),
        columns.join(", "),
        placeholders.join(", ")
    );

    conn.execute(&sql, params_from_iter(fields.iter().map(|(_, v)| v)))?;
    Ok(conn.last_insert_rowid())
}

/// Updates the row identified by `id` and stamps the modification marker.
///
/// The identity field and any caller supplied marker are ignored, so the
/// marker is written exactly once per call. Returns the affected row count.
pub fn update(
    conn: &Connection,
    table: &str,
    id_field: &str,
    id: i64,
    fields: &FieldMap,
) -> Result<usize, StoreError> {
    update_where(conn, table, &FieldMap::new().with(id_field, id), fields)
}

/// Like [`update`] for a row identified by every entry of `key`.
pub fn update_where(
    conn: &Connection,
    table: &str,
    key: &FieldMap,
    fields: &FieldMap,
) -> Result<usize, StoreError> {
    let mut sets = Vec::new();
    let mut values = Vec::new();

    for (field, value) in fields.iter() {
        if key.contains(field) || field == LAST_UPDATE {
            continue;
        }
        values.push(value.clone());
        sets.push(format!("{} = ?{}", quote(field), values.len()));
    }
    if sets.is_empty() || key.is_empty() {
        return Err(StoreError::Empty);
    }

    values.push(FieldValue::Text(now_stamp()));
    sets.push(format!("{} = ?{}", quote(LAST_UPDATE), values.len()));

    let predicate = key_predicate(key, &mut values);
    let sql = format!("UPDATE {} SET {} WHERE {predicate}", quote(table), sets.join(", "));

    Ok(conn.execute(&sql, params_from_iter(values.iter()))?)
}

pub fn delete(conn: &Connection, table: &str, id_field: &str, id: i64) -> Result<usize, StoreError> {
    delete_where(conn, table, &FieldMap::new().with(id_field, id))
}

pub fn delete_where(conn: &Connection, table: &str, key: &FieldMap) -> Result<usize, StoreError> {
    if key.is_empty() {
        return Err(StoreError::Empty);
    }
    let mut values = Vec::new();
    let predicate = key_predicate(key, &mut values);
    let sql = format!("DELETE FROM {} WHERE {predicate}", quote(table));
    Ok(conn.execute(&sql, params_from_iter(values.iter()))?)
}

fn key_predicate(key: &FieldMap, values: &mut Vec<FieldValue>) -> String {
    key.iter()
        .map(|(field, value)| {
            values.push(value.clone());
            format!("{} = ?{}", quote(field), values.len())
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}
