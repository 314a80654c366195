use std::fmt::Display;

use reqwest::Url;
use serde_json::Value;

use crate::{
    coordinator::RequestHandle,
    entities::{FieldMap, FieldValue, Review, ReviewKey},
    error::{RemoteError, StoreError},
    management::{ImportReport, ManagerContext},
    remote::{Endpoint, Operation},
    schema::{
        TableSchema,
        review::{self, BOOK, SHARED, USER},
    },
    store::sql::{self, Query},
};

const SCHEMA: &TableSchema = &review::SCHEMA;

/// Manager of reviews, the one table keyed on a pair of identities.
///
/// It offers the same local and remote operations as an
/// [`EntityManager`](crate::management::EntityManager), addressed by
/// [`ReviewKey`] instead of a single generated identity. Remote creates
/// answer without a body since the key is chosen by the caller.
pub struct ReviewManager {
    context: ManagerContext,
}

impl ReviewManager {
    pub fn new(context: ManagerContext) -> Self {
        Self { context }
    }

    /// Coordinator key of review requests.
    pub fn key(&self) -> &'static str {
        SCHEMA.table
    }

    fn log_error(&self, operation: &str, error: &dyn Display) {
        tracing::error!(table = SCHEMA.table, operation, error = %error, "operation failed");
    }

    fn guard<T, E: Display>(&self, operation: &str, result: Result<T, E>) -> Option<T> {
        result.map_err(|e| self.log_error(operation, &e)).ok()
    }

    // -- local cache ------------------------------------------------------

    pub fn create_local(&self, review: &Review) -> bool {
        self.create_local_fields(&review.to_fields())
    }

    /// Inserts a row from an untyped field map; both identity fields must be
    /// set and positive.
    pub fn create_local_fields(&self, fields: &FieldMap) -> bool {
        let valid = fields
            .key(SCHEMA)
            .is_some_and(|key| key.iter().all(|(_, v)| v.as_i64().is_some_and(|n| n > 0)));

        let result = if valid {
            let mut row = fields.clone();
            row.retain(|column| SCHEMA.has_local_column(column));
            self.context
                .local
                .with_connection(|conn| sql::insert(conn, SCHEMA.table, &row))
        } else {
            Err(StoreError::MissingIdentity(SCHEMA.table))
        };
        self.guard("create_local", result).is_some()
    }

    pub fn update_local(&self, review: &Review) -> bool {
        self.update_local_fields(review.key(), &review.to_fields())
    }

    pub fn update_local_fields(&self, key: ReviewKey, fields: &FieldMap) -> bool {
        let mut row = fields.clone();
        row.retain(|column| SCHEMA.has_local_column(column) && !SCHEMA.is_key(column));
        let result = self
            .context
            .local
            .with_connection(|conn| sql::update_where(conn, SCHEMA.table, &key.to_fields(), &row));
        self.guard("update_local", result).is_some_and(|n| n != 0)
    }

    /// Patches one column. Neither identity field can be patched.
    pub fn update_field_local(&self, key: ReviewKey, field: &str, value: impl Into<FieldValue>) -> bool {
        let result = if SCHEMA.is_key(field) {
            Err(StoreError::IdentityField(field.to_string()))
        } else if !SCHEMA.has_local_column(field) {
            Err(StoreError::UnknownColumn {
                table: SCHEMA.table,
                column: field.to_string(),
            })
        } else {
            let row = FieldMap::new().with(field, value);
            self.context
                .local
                .with_connection(|conn| sql::update_where(conn, SCHEMA.table, &key.to_fields(), &row))
        };
        self.guard("update_field_local", result).is_some_and(|n| n != 0)
    }

    pub fn load_local(&self, key: ReviewKey) -> Option<Review> {
        self.query_local(Query::new().eq(USER, key.user).eq(BOOK, key.book))
            .into_iter()
            .next()
    }

    pub fn query_all_local(&self) -> Vec<Review> {
        self.query_local(Query::new())
    }

    pub fn query_by_user_local(&self, user: i64) -> Vec<Review> {
        self.query_local(Query::new().eq(USER, user))
    }

    pub fn query_by_book_local(&self, book: i64) -> Vec<Review> {
        self.query_local(Query::new().eq(BOOK, book))
    }

    /// Reviews of `book` their authors chose to share.
    pub fn query_shared_local(&self, book: i64) -> Vec<Review> {
        self.query_local(Query::new().eq(BOOK, book).eq(SHARED, true))
    }

    /// Rows matching `pattern` on `field`, or every row, ordered by key.
    pub fn search_local(&self, field: &str, pattern: Option<&str>) -> Vec<Review> {
        let query = match pattern {
            Some(pattern) => Query::new().like(field, pattern),
            None => Query::new(),
        };
        let mut reviews = self.query_local(query);
        reviews.sort_by_key(|r| (r.user, r.book));
        reviews
    }

    pub fn query_local(&self, query: Query) -> Vec<Review> {
        let (sql, params) = query.to_sql(SCHEMA.table, "*");
        let decoded = self
            .context
            .local
            .with_connection(|conn| sql::select(conn, &sql, &params, |row| Review::decode(row)));

        self.guard("query_local", decoded)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| self.guard("query_local", row))
            .collect()
    }

    pub fn delete_local(&self, key: ReviewKey) -> bool {
        let result = self
            .context
            .local
            .with_connection(|conn| sql::delete_where(conn, SCHEMA.table, &key.to_fields()));
        self.guard("delete_local", result).is_some_and(|n| n != 0)
    }

    pub fn count_local(&self) -> i64 {
        let result = self
            .context
            .local
            .with_connection(|conn| sql::count(conn, SCHEMA.table, &Query::new()));
        self.guard("count_local", result).unwrap_or(0)
    }

    // -- remote store -----------------------------------------------------

    fn endpoint(&self, operation: Operation) -> Result<Endpoint, RemoteError> {
        self.context.remote.endpoint(SCHEMA.segment, operation)
    }

    fn keyed(&self, operation: Operation, key: ReviewKey) -> Result<Endpoint, RemoteError> {
        self.endpoint(operation).map(|e| e.terms_from(&key.to_fields()))
    }

    fn submit(&self, endpoint: Result<Endpoint, RemoteError>) -> RequestHandle<()> {
        let endpoint = match endpoint {
            Ok(endpoint) => endpoint,
            Err(e) => {
                self.log_error("submit", &e);
                return RequestHandle::rejected(self.key(), e);
            }
        };
        let remote = self.context.remote.clone();
        self.context
            .coordinator
            .enqueue(self.key(), async move { remote.execute(&endpoint).await })
    }

    fn write(&self, operation: Operation, review: &Review) -> RequestHandle<()> {
        if review.is_empty() {
            return RequestHandle::rejected(
                self.key(),
                RemoteError::Rejected("review has no user or book".into()),
            );
        }
        self.submit(
            self.endpoint(operation)
                .map(|e| e.terms_from(&review.to_fields())),
        )
    }

    pub fn create_remote(&self, review: &Review) -> RequestHandle<()> {
        self.write(Operation::Create, review)
    }

    pub fn update_remote(&self, review: &Review) -> RequestHandle<()> {
        self.write(Operation::Update, review)
    }

    pub fn update_field_remote(&self, key: ReviewKey, field: &str, value: impl Display) -> RequestHandle<()> {
        if SCHEMA.is_key(field) || !SCHEMA.has_remote_column(field) {
            let error = RemoteError::Rejected(format!("field {field} cannot be patched"));
            self.log_error("update_field_remote", &error);
            return RequestHandle::rejected(self.key(), error);
        }
        self.submit(self.keyed(Operation::Update, key).map(|e| e.term(field, value)))
    }

    pub fn delete_remote(&self, key: ReviewKey) -> RequestHandle<()> {
        self.submit(self.keyed(Operation::Delete, key))
    }

    pub fn soft_delete_remote(&self, key: ReviewKey) -> RequestHandle<()> {
        self.submit(self.keyed(Operation::SoftDelete, key))
    }

    pub fn restore_remote(&self, key: ReviewKey) -> RequestHandle<()> {
        self.submit(self.keyed(Operation::Restore, key))
    }

    async fn fetch(&self, url: Result<Url, RemoteError>) -> Result<Vec<Value>, RemoteError> {
        let url = url?;
        let remote = self.context.remote.clone();
        self.context
            .coordinator
            .enqueue(self.key(), async move { remote.fetch_records(url).await })
            .outcome()
            .await
    }

    async fn fetch_reviews(&self, operation: &str, terms: FieldMap) -> Vec<Review> {
        let url = self.endpoint(Operation::Read).map(|e| e.terms_from(&terms).url());
        match self.fetch(url).await {
            Ok(records) => records
                .iter()
                .filter_map(|r| self.guard(operation, Review::decode(r)))
                .collect(),
            Err(RemoteError::NotFound) => Vec::new(),
            Err(e) => {
                self.log_error(operation, &e);
                Vec::new()
            }
        }
    }

    pub async fn load_remote(&self, key: ReviewKey) -> Option<Review> {
        self.fetch_reviews("load_remote", key.to_fields())
            .await
            .into_iter()
            .next()
    }

    /// Shared reviews of `book` on the remote store.
    pub async fn query_shared_remote(&self, book: i64) -> Vec<Review> {
        let terms = FieldMap::new().with(BOOK, book).with(SHARED, true);
        self.fetch_reviews("query_shared_remote", terms).await
    }

    /// Number of non-deleted remote reviews.
    pub async fn count_remote(&self) -> Option<usize> {
        let url = self.guard("count_remote", self.endpoint(Operation::Count))?.url();
        let remote = self.context.remote.clone();
        let count = self
            .context
            .coordinator
            .enqueue(self.key(), async move { remote.fetch_count(url).await })
            .outcome()
            .await;
        self.guard("count_remote", count)
    }

    /// Caches every review the remote store serves. Failing records are
    /// counted and skipped.
    pub async fn import_from_remote(&self) -> ImportReport {
        let mut report = ImportReport {
            pages: 1,
            ..ImportReport::default()
        };

        let records = match self.fetch(self.endpoint(Operation::Read).map(|e| e.url())).await {
            Ok(records) => records,
            Err(RemoteError::NotFound) => Vec::new(),
            Err(e) => {
                self.log_error("import_from_remote", &e);
                report.errored = true;
                return report;
            }
        };

        report.fetched = records.len();
        for record in &records {
            let imported = self
                .guard("import_from_remote", FieldMap::from_json(record))
                .is_some_and(|fields| self.create_local_fields(&fields));
            if imported {
                report.imported += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }

    pub async fn wait_for_response(&self) {
        self.context.coordinator.wait_for_response(self.key()).await
    }
}
