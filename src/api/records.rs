use std::collections::HashMap;

use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use rusqlite::{Connection, ErrorCode, Row, types::ValueRef};
use serde_json::{Map, Value};

use crate::{
    entities::{FieldMap, FieldValue},
    error::StoreError,
    schema::{self, DELETED, LAST_UPDATE, LIMIT, OFFSET, TableSchema, WITH_DELETED, user},
    store::{
        Database,
        sql::{self, Query as Select},
    },
    utils,
};

type Terms = HashMap<String, String>;

/// Error answer of the remote store: a status and a plain text reason.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "no matching record")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Self::new(StatusCode::CONFLICT, err.to_string())
            }
            StoreError::UnknownColumn { .. }
            | StoreError::IdentityField(_)
            | StoreError::MissingIdentity(_)
            | StoreError::Empty => Self::bad_request(err.to_string()),
            _ => {
                tracing::error!(error = %err, "remote store failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

fn collection(segment: &str) -> Result<&'static TableSchema, ApiError> {
    schema::by_segment(segment)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("unknown collection {segment}")))
}

fn window(terms: &mut Terms, key: &str) -> Result<Option<i64>, ApiError> {
    match terms.remove(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(n) if n >= 0 => Ok(Some(n)),
            _ => Err(ApiError::bad_request(format!("invalid {key}: {raw}"))),
        },
    }
}

/// Validates term names against the table and keeps them as fields.
fn fields(schema: &TableSchema, terms: Terms) -> Result<FieldMap, ApiError> {
    let mut fields = FieldMap::new();
    for (field, value) in terms {
        if !schema.has_remote_column(&field) {
            return Err(ApiError::bad_request(format!("unknown field {field}")));
        }
        fields.insert(&field, value);
    }
    Ok(fields)
}

/// The identity fields of `schema`, every one of them numeric.
fn key_of(schema: &TableSchema, fields: &FieldMap) -> Option<FieldMap> {
    schema.key.iter().try_fold(FieldMap::new(), |key, field| {
        let value = fields.get(field)?.as_i64()?;
        Some(key.with(field, value))
    })
}

fn missing_key(schema: &TableSchema) -> ApiError {
    ApiError::bad_request(format!("missing {}", schema.key.join(", ")))
}

fn flag(terms: &mut Terms, key: &str) -> Result<bool, ApiError> {
    let Some(raw) = terms.remove(key) else {
        return Ok(false);
    };
    match raw.trim() {
        "0" | "false" => Ok(false),
        "1" | "true" => Ok(true),
        _ => Err(ApiError::bad_request(format!("invalid {key}: {raw}"))),
    }
}

fn is_users(schema: &TableSchema) -> bool {
    schema.table == user::TABLE
}

/// Replaces a clear password by its argon2 hash. An empty one is dropped.
fn hash_password(fields: &mut FieldMap) -> Result<(), ApiError> {
    let Some(secret) = fields.remove(user::PASSWORD).and_then(|v| v.as_text()) else {
        return Ok(());
    };
    if secret.is_empty() {
        return Ok(());
    }
    let hash = utils::hash_secret(&secret).map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "cannot hash password")
    })?;
    fields.insert(user::PASSWORD, hash);
    Ok(())
}

/// A malformed stored hash matches nothing.
fn verified(secret: &str, hash: Option<&str>) -> bool {
    let Some(hash) = hash else {
        return false;
    };
    utils::verify_secret(secret, hash)
        .map_err(|e| tracing::warn!(error = %e, "malformed password hash"))
        .unwrap_or(false)
}

/// Equality filter of `read` and `count`. Soft-deleted rows only show up
/// with a true `with_deleted` term. Passwords never filter.
fn filter(schema: &TableSchema, mut terms: Terms) -> Result<Select, ApiError> {
    let with_deleted = flag(&mut terms, WITH_DELETED)?;
    let fields = fields(schema, terms)?;
    if is_users(schema) && fields.contains(user::PASSWORD) {
        return Err(ApiError::bad_request("password is not a filter"));
    }

    let query = fields
        .iter()
        .fold(Select::new(), |query, (field, value)| {
            query.eq(field, value.clone())
        });
    Ok(if with_deleted { query.with_deleted() } else { query })
}

/// Stored hashes never leave the store; the key only on authenticated reads.
fn redact(schema: &TableSchema, mut row: Value, authenticated: bool) -> Value {
    if let (true, Some(object)) = (is_users(schema), row.as_object_mut()) {
        object.remove(user::PASSWORD);
        if !authenticated {
            object.remove(user::KEY);
        }
    }
    row
}

fn row_to_json(row: &Row<'_>) -> Result<Value, rusqlite::Error> {
    let mut object = Map::new();
    for (i, name) in row.as_ref().column_names().into_iter().enumerate() {
        let value = match row.get_ref(i)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(n) => Value::from(n),
            ValueRef::Real(r) => Value::from(r),
            ValueRef::Text(t) | ValueRef::Blob(t) => {
                Value::from(String::from_utf8_lossy(t).into_owned())
            }
        };
        object.insert(name.to_string(), value);
    }
    Ok(Value::Object(object))
}

/// `GET /{segment}/read`: matching records as a JSON array.
///
/// A `password` term next to an `email` authenticates the read: only the
/// account whose hash verifies is answered, with its key.
pub async fn read(
    State(db): State<Database>,
    Path(segment): Path<String>,
    Query(mut terms): Query<Terms>,
) -> Result<Json<Value>, ApiError> {
    let schema = collection(&segment)?;
    let limit = window(&mut terms, LIMIT)?;
    let offset = window(&mut terms, OFFSET)?;
    let secret = if is_users(schema) {
        terms.remove(user::PASSWORD)
    } else {
        None
    };
    if secret.is_some() && !terms.contains_key(user::EMAIL) {
        return Err(ApiError::bad_request(format!("password needs {}", user::EMAIL)));
    }
    let (sql, params) = filter(schema, terms)?
        .page(limit, offset)
        .to_sql(schema.table, "*");

    let mut rows = db
        .with_connection(|conn| sql::select(conn, &sql, &params, row_to_json))?
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::from)?;

    if let Some(secret) = &secret {
        rows.retain(|row| verified(secret, row.get(user::PASSWORD).and_then(Value::as_str)));
    }
    if rows.is_empty() {
        return Err(ApiError::not_found());
    }
    let authenticated = secret.is_some();
    Ok(Json(Value::Array(
        rows.into_iter()
            .map(|row| redact(schema, row, authenticated))
            .collect(),
    )))
}

/// `GET /{segment}/count`: number of matching, non-deleted records.
pub async fn count(
    State(db): State<Database>,
    Path(segment): Path<String>,
    Query(mut terms): Query<Terms>,
) -> Result<String, ApiError> {
    let schema = collection(&segment)?;
    terms.remove(LIMIT);
    terms.remove(OFFSET);
    let query = filter(schema, terms)?;

    let count = db.with_connection(|conn| sql::count(conn, schema.table, &query))?;
    Ok(count.to_string())
}

/// `POST /{segment}/create`: answers `201` with the new identity as body,
/// or an empty body for tables whose key the caller supplies.
pub async fn create(
    State(db): State<Database>,
    Path(segment): Path<String>,
    Form(terms): Form<Terms>,
) -> Result<(StatusCode, String), ApiError> {
    let schema = collection(&segment)?;
    let mut row = fields(schema, terms)?;
    row.remove(DELETED);
    if schema.is_composite() && key_of(schema, &row).is_none() {
        return Err(missing_key(schema));
    }
    if is_users(schema) {
        hash_password(&mut row)?;
        row.insert(user::KEY, utils::generate_key());
    }
    row.insert(LAST_UPDATE, sql::now_stamp());

    let id = db.with_connection(|conn| sql::insert(conn, schema.table, &row))?;
    tracing::debug!(table = schema.table, id, "record created");
    if schema.is_composite() {
        return Ok((StatusCode::CREATED, String::new()));
    }
    Ok((StatusCode::CREATED, id.to_string()))
}

/// `PUT /{segment}/update`: patches the given fields of one record.
pub async fn update(
    State(db): State<Database>,
    Path(segment): Path<String>,
    Form(terms): Form<Terms>,
) -> Result<StatusCode, ApiError> {
    let schema = collection(&segment)?;
    let mut row = fields(schema, terms)?;
    let key = key_of(schema, &row).ok_or_else(|| missing_key(schema))?;
    row.retain(|field| !schema.is_key(field) && field != DELETED);
    if is_users(schema) {
        row.remove(user::KEY);
        hash_password(&mut row)?;
    }

    let changed = db.with_connection(|conn| sql::update_where(conn, schema.table, &key, &row))?;
    found(changed)
}

/// The record a delete, soft delete or restore applies to.
enum Target {
    Key(FieldMap),
    Credentials { email: String, secret: String },
}

impl Target {
    fn from_terms(schema: &TableSchema, terms: Terms) -> Result<Self, ApiError> {
        let fields = fields(schema, terms)?;
        if let Some(key) = key_of(schema, &fields) {
            return Ok(Target::Key(key));
        }

        let email = fields.get(user::EMAIL).and_then(FieldValue::as_text);
        let secret = fields.get(user::PASSWORD).and_then(FieldValue::as_text);
        match (is_users(schema), email, secret) {
            (true, Some(email), Some(secret)) => Ok(Target::Credentials { email, secret }),
            _ => Err(missing_key(schema)),
        }
    }

    /// Key of the matching record. Credentials are checked against the
    /// stored hash of the account holding the email.
    fn resolve(
        &self,
        conn: &Connection,
        schema: &TableSchema,
        include_deleted: bool,
    ) -> Result<Option<FieldMap>, StoreError> {
        let query = match self {
            Target::Key(key) => key
                .iter()
                .fold(Select::new(), |query, (field, value)| query.eq(field, value.clone())),
            Target::Credentials { email, .. } => Select::new().eq(user::EMAIL, email.as_str()),
        };
        let query = if include_deleted { query.with_deleted() } else { query };

        match self {
            Target::Key(key) => {
                let (sql, params) = query.to_sql(schema.table, "1");
                let exists = sql::select_one(conn, &sql, &params, |_| ())?.is_some();
                Ok(exists.then(|| key.clone()))
            }
            Target::Credentials { secret, .. } => {
                let projection = format!("{}, {}", sql::quote(user::ID), sql::quote(user::PASSWORD));
                let (sql, params) = query.to_sql(schema.table, &projection);
                let account = sql::select_one(conn, &sql, &params, credential_row)?.transpose()?;
                Ok(account
                    .filter(|(_, hash)| verified(secret, hash.as_deref()))
                    .map(|(id, _)| FieldMap::new().with(user::ID, id)))
            }
        }
    }
}

fn credential_row(row: &Row<'_>) -> rusqlite::Result<(i64, Option<String>)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn found(affected: usize) -> Result<StatusCode, ApiError> {
    if affected == 0 {
        Err(ApiError::not_found())
    } else {
        Ok(StatusCode::OK)
    }
}

/// `PUT /{segment}/delete`: removes the record, deleted or not.
pub async fn delete(
    State(db): State<Database>,
    Path(segment): Path<String>,
    Form(terms): Form<Terms>,
) -> Result<StatusCode, ApiError> {
    let schema = collection(&segment)?;
    let target = Target::from_terms(schema, terms)?;

    let removed = db.with_connection(|conn| match target.resolve(conn, schema, true)? {
        Some(key) => sql::delete_where(conn, schema.table, &key),
        None => Ok(0),
    })?;
    found(removed)
}

/// `PUT /{segment}/softDelete`
pub async fn soft_delete(
    State(db): State<Database>,
    Path(segment): Path<String>,
    Form(terms): Form<Terms>,
) -> Result<StatusCode, ApiError> {
    set_deleted(&db, &segment, terms, true)
}

/// `PUT /{segment}/restore`: credential pairs also match deleted accounts.
pub async fn restore(
    State(db): State<Database>,
    Path(segment): Path<String>,
    Form(terms): Form<Terms>,
) -> Result<StatusCode, ApiError> {
    set_deleted(&db, &segment, terms, false)
}

fn set_deleted(
    db: &Database,
    segment: &str,
    terms: Terms,
    deleted: bool,
) -> Result<StatusCode, ApiError> {
    let schema = collection(segment)?;
    let target = Target::from_terms(schema, terms)?;
    let flag = FieldMap::new().with(DELETED, deleted);

    // soft delete only sees live records, restore only needs the record to exist
    let changed = db.with_connection(|conn| match target.resolve(conn, schema, !deleted)? {
        Some(key) => sql::update_where(conn, schema.table, &key, &flag),
        None => Ok(0),
    })?;
    tracing::debug!(table = schema.table, deleted, changed, "deleted flag set");
    found(changed)
}
