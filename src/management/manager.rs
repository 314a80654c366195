use std::{fmt::Display, sync::Arc, time::Duration};

use reqwest::Url;

use crate::{
    Res, config,
    coordinator::{RequestCoordinator, RequestHandle},
    entities::{Entity, FieldMap, FieldValue},
    error::{RemoteError, StoreError},
    management::import::{self, ImportReport},
    remote::{Endpoint, Operation, RemoteClient},
    schema::{TableSchema, WITH_DELETED},
    store::{
        Database,
        sql::{self, Query},
    },
};

/// Everything a manager needs: the shared cache handle, the remote client
/// and the request coordinator.
#[derive(Clone)]
pub struct ManagerContext {
    pub local: Database,
    pub remote: RemoteClient,
    pub coordinator: Arc<RequestCoordinator>,
}

impl ManagerContext {
    pub fn new(local: Database, remote: RemoteClient) -> Self {
        Self {
            local,
            remote,
            coordinator: Arc::new(RequestCoordinator::new()),
        }
    }

    /// Opens the cache and remote client described by the environment.
    pub fn from_config() -> Res<Self> {
        let local = Database::open_local(&config::cache_path())?;
        let remote = RemoteClient::new(
            config::api_url(),
            Duration::from_secs(config::request_timeout()),
        )?;
        Ok(Self::new(local, remote))
    }
}

/// Shared contract of every entity manager.
///
/// `Local` is what the cache holds, `Remote` what the remote store serves;
/// they only differ for users. Local operations run synchronously against
/// the shared connection. Remote mutations are fire-and-await: they return a
/// [`RequestHandle`] right away and the caller awaits it, or waits on the
/// manager's key with [`EntityManager::wait_for_response`].
///
/// Storage and protocol errors never escape: they are logged and surface as
/// `false`, `None` or an empty result.
#[allow(async_fn_in_trait)]
pub trait EntityManager {
    type Local: Entity;
    type Remote: Entity;

    fn context(&self) -> &ManagerContext;

    fn schema(&self) -> &'static TableSchema {
        <Self::Local as Entity>::SCHEMA
    }

    /// Coordinator key of this manager's requests.
    fn key(&self) -> &'static str {
        self.schema().table
    }

    fn log_error(&self, operation: &str, error: &dyn Display) {
        tracing::error!(table = self.schema().table, operation, error = %error, "operation failed");
    }

    /// Logs the error of `result` and drops it.
    fn guard<T, E: Display>(&self, operation: &str, result: Result<T, E>) -> Option<T> {
        result.map_err(|e| self.log_error(operation, &e)).ok()
    }

    /// Runs on every entity loaded from the cache. Returning `None` turns
    /// the load into a miss.
    fn complete_local(&self, entity: Self::Local) -> Option<Self::Local> {
        Some(entity)
    }

    /// Runs on every entity loaded from the remote store.
    async fn complete_remote(&self, entity: Self::Remote) -> Option<Self::Remote> {
        Some(entity)
    }

    // -- local cache ------------------------------------------------------

    fn create_local(&self, entity: &Self::Local) -> bool {
        self.create_local_fields(&entity.to_fields())
    }

    /// Inserts a row from an untyped field map. Fields unknown to the cache
    /// table are dropped; the identity must be present.
    fn create_local_fields(&self, fields: &FieldMap) -> bool {
        let schema = self.schema();
        let result = match fields.id(schema) {
            Some(id) if id > 0 => {
                let mut row = fields.clone();
                row.retain(|column| schema.has_local_column(column));
                self.context()
                    .local
                    .with_connection(|conn| sql::insert(conn, schema.table, &row))
            }
            _ => Err(StoreError::MissingIdentity(schema.table)),
        };
        self.guard("create_local", result).is_some()
    }

    fn update_local(&self, entity: &Self::Local) -> bool {
        self.update_local_fields(entity.id(), &entity.to_fields())
    }

    /// Updates the row `id` from a field map; false when no row matched.
    fn update_local_fields(&self, id: i64, fields: &FieldMap) -> bool {
        let schema = self.schema();
        let mut row = fields.clone();
        row.retain(|column| schema.has_local_column(column));
        let result = self
            .context()
            .local
            .with_connection(|conn| sql::update(conn, schema.table, schema.id, id, &row));
        self.guard("update_local", result).is_some_and(|n| n != 0)
    }

    /// Patches one column of row `id`. The identity field is refused.
    fn update_field_local(&self, id: i64, field: &str, value: impl Into<FieldValue>) -> bool {
        let schema = self.schema();
        let result = if field == schema.id {
            Err(StoreError::IdentityField(field.to_string()))
        } else if !schema.has_local_column(field) {
            Err(StoreError::UnknownColumn {
                table: schema.table,
                column: field.to_string(),
            })
        } else {
            let row = FieldMap::new().with(field, value);
            self.context()
                .local
                .with_connection(|conn| sql::update(conn, schema.table, schema.id, id, &row))
        };
        self.guard("update_field_local", result).is_some_and(|n| n != 0)
    }

    fn load_local(&self, id: i64) -> Option<Self::Local> {
        self.load_local_by(self.schema().id, id)
    }

    /// Point lookup on any column, typically the alternate key.
    fn load_local_by(&self, field: &str, value: impl Into<FieldValue>) -> Option<Self::Local> {
        let (sql, params) = Query::new().eq(field, value).to_sql(self.schema().table, "*");
        let decoded = self.context().local.with_connection(|conn| {
            sql::select_one(conn, &sql, &params, |row| {
                <Self::Local as Entity>::decode(row)
            })
        });

        match self.guard("load_local", decoded)?? {
            Ok(entity) => self.complete_local(entity),
            Err(e) => {
                self.log_error("load_local", &e);
                None
            }
        }
    }

    fn query_all_local(&self) -> Vec<Self::Local> {
        self.query_local(Query::new())
    }

    /// Rows whose `field` contains `pattern`.
    fn query_filtered_local(&self, field: &str, pattern: &str) -> Vec<Self::Local> {
        self.query_local(Query::new().like(field, pattern))
    }

    /// Rows matching `pattern` on `field`, or every row without a pattern,
    /// ordered by identity.
    fn search_local(&self, field: &str, pattern: Option<&str>) -> Vec<Self::Local> {
        let mut entities = match pattern {
            Some(pattern) => self.query_filtered_local(field, pattern),
            None => self.query_all_local(),
        };
        entities.sort_by_key(|e| e.id());
        entities
    }

    fn query_local(&self, query: Query) -> Vec<Self::Local> {
        let (sql, params) = query.to_sql(self.schema().table, "*");
        let decoded = self.context().local.with_connection(|conn| {
            sql::select(conn, &sql, &params, |row| {
                <Self::Local as Entity>::decode(row)
            })
        });

        // completion may touch the cache again, so it runs after the lock is released
        self.guard("query_local", decoded)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| match row {
                Ok(entity) => self.complete_local(entity),
                Err(e) => {
                    self.log_error("query_local", &e);
                    None
                }
            })
            .collect()
    }

    /// Single column of row `id`, without hydrating the entity.
    fn get_field_local(&self, field: &str, id: i64) -> Option<String> {
        self.get_field_local_by(field, self.schema().id, id)
    }

    fn get_field_local_by(
        &self,
        field: &str,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> Option<String> {
        use crate::entities::FieldSource;

        let (sql, params) = Query::new()
            .eq(key, value)
            .to_sql(self.schema().table, &sql::quote(field));
        let result = self.context().local.with_connection(|conn| {
            sql::select_one(conn, &sql, &params, |row| row.opt_text(field))
        });

        match self.guard("get_field_local", result)?? {
            Ok(value) => value,
            Err(e) => {
                self.log_error("get_field_local", &e);
                None
            }
        }
    }

    /// Identity of the row whose `field` equals `value`.
    fn get_id_local(&self, field: &str, value: impl Into<FieldValue>) -> Option<i64> {
        self.get_field_local_by(self.schema().id, field, value)
            .and_then(|id| id.parse().ok())
    }

    /// Removes the cache row; dependent rows are handled by the schema.
    fn delete_local(&self, id: i64) -> bool {
        let schema = self.schema();
        let result = self
            .context()
            .local
            .with_connection(|conn| sql::delete(conn, schema.table, schema.id, id));
        self.guard("delete_local", result).is_some_and(|n| n != 0)
    }

    fn count_local(&self) -> i64 {
        let table = self.schema().table;
        let result = self
            .context()
            .local
            .with_connection(|conn| sql::count(conn, table, &Query::new()));
        self.guard("count_local", result).unwrap_or(0)
    }

    // -- remote store -----------------------------------------------------

    fn endpoint(&self, operation: Operation) -> Result<Endpoint, RemoteError> {
        self.context()
            .remote
            .endpoint(self.schema().segment, operation)
    }

    /// Enqueues `endpoint` as a write under this manager's key.
    fn submit(&self, endpoint: Result<Endpoint, RemoteError>) -> RequestHandle<()> {
        let endpoint = match endpoint {
            Ok(endpoint) => endpoint,
            Err(e) => {
                self.log_error("submit", &e);
                return RequestHandle::rejected(self.key(), e);
            }
        };
        let remote = self.context().remote.clone();
        self.context()
            .coordinator
            .enqueue(self.key(), async move { remote.execute(&endpoint).await })
    }

    /// Creates `entity` remotely; the handle yields the assigned identity.
    fn create_remote(&self, entity: &Self::Remote) -> RequestHandle<i64> {
        let endpoint = match self.endpoint(Operation::Create) {
            Ok(endpoint) => endpoint.terms_from(&entity.to_fields()),
            Err(e) => return RequestHandle::rejected(self.key(), e),
        };
        let remote = self.context().remote.clone();
        self.context()
            .coordinator
            .enqueue(self.key(), async move { remote.create(&endpoint).await })
    }

    /// Creates `entity` remotely, waits for the answer and stores the
    /// assigned identity in it.
    async fn save_remote(&self, entity: &mut Self::Remote) -> bool {
        match self.create_remote(entity).outcome().await {
            Ok(id) => {
                entity.set_id(id);
                true
            }
            Err(e) => {
                self.log_error("save_remote", &e);
                false
            }
        }
    }

    fn update_remote(&self, entity: &Self::Remote) -> RequestHandle<()> {
        if entity.is_empty() {
            return RequestHandle::rejected(
                self.key(),
                RemoteError::Rejected("entity has no identity".into()),
            );
        }
        self.submit(
            self.endpoint(Operation::Update)
                .map(|e| e.terms_from(&entity.to_fields())),
        )
    }

    /// Patches a single remote field. The identity field is never patched.
    fn update_field_remote(&self, id: i64, field: &str, value: impl Display) -> RequestHandle<()> {
        let schema = self.schema();
        if field == schema.id || !schema.has_remote_column(field) {
            let error = RemoteError::Rejected(format!("field {field} cannot be patched"));
            self.log_error("update_field_remote", &error);
            return RequestHandle::rejected(self.key(), error);
        }
        self.submit(
            self.endpoint(Operation::Update)
                .map(|e| e.term(schema.id, id).term(field, value)),
        )
    }

    fn delete_remote(&self, id: i64) -> RequestHandle<()> {
        let id_field = self.schema().id;
        self.submit(self.endpoint(Operation::Delete).map(|e| e.term(id_field, id)))
    }

    fn soft_delete_remote(&self, id: i64) -> RequestHandle<()> {
        let id_field = self.schema().id;
        self.submit(
            self.endpoint(Operation::SoftDelete)
                .map(|e| e.term(id_field, id)),
        )
    }

    fn restore_remote(&self, id: i64) -> RequestHandle<()> {
        let id_field = self.schema().id;
        self.submit(self.endpoint(Operation::Restore).map(|e| e.term(id_field, id)))
    }

    /// Reads the first remote record matching `terms`.
    ///
    /// Unlike the other remote loads this keeps "no such record"
    /// (`Ok(None)`) apart from a failed request (`Err`).
    async fn try_load_remote_fields(
        &self,
        terms: &FieldMap,
    ) -> Result<Option<FieldMap>, RemoteError> {
        let url = self.endpoint(Operation::Read)?.terms_from(terms).url();
        let remote = self.context().remote.clone();
        let records = self
            .context()
            .coordinator
            .enqueue(self.key(), async move { remote.fetch_records(url).await })
            .outcome()
            .await;

        match records {
            Ok(records) => records
                .first()
                .map(FieldMap::from_json)
                .transpose()
                .map_err(|e| RemoteError::Decode(e.to_string())),
            Err(RemoteError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn load_remote_fields(&self, terms: &FieldMap) -> Option<FieldMap> {
        self.guard("load_remote", self.try_load_remote_fields(terms).await)?
    }

    async fn load_remote(&self, id: i64) -> Option<Self::Remote> {
        self.load_remote_by(self.schema().id, id).await
    }

    /// Remote lookup on any column. A network failure and a missing record
    /// both yield `None`; the former is logged.
    async fn load_remote_by(
        &self,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Option<Self::Remote> {
        let fields = self
            .load_remote_fields(&FieldMap::new().with(field, value))
            .await?;
        let entity = self.guard("load_remote", <Self::Remote as Entity>::decode(&fields))?;
        self.complete_remote(entity).await
    }

    /// Whether `value` is unused for `field` remotely, ignoring the record
    /// `exclude_id`. Soft-deleted records still hold their values. A failed
    /// check answers false.
    async fn is_available_remote(
        &self,
        field: &str,
        value: impl Into<FieldValue>,
        exclude_id: Option<i64>,
    ) -> bool {
        let schema = self.schema();
        let terms = FieldMap::new().with(field, value).with(WITH_DELETED, true);
        match self.try_load_remote_fields(&terms).await {
            Ok(None) => true,
            Ok(Some(found)) => exclude_id.is_some_and(|id| found.id(schema) == Some(id)),
            Err(e) => {
                self.log_error("is_available_remote", &e);
                false
            }
        }
    }

    /// Number of non-deleted remote records.
    async fn count_remote(&self) -> Option<usize> {
        let url = self.guard("count_remote", self.endpoint(Operation::Count))?.url();
        self.count_remote_at(url).await
    }

    async fn count_remote_at(&self, url: Url) -> Option<usize> {
        let remote = self.context().remote.clone();
        let count = self
            .context()
            .coordinator
            .enqueue(self.key(), async move { remote.fetch_count(url).await })
            .outcome()
            .await;
        self.guard("count_remote", count)
    }

    /// Fetches a JSON array from `url` and caches every element.
    ///
    /// An element that fails to hydrate or to insert is logged and counted
    /// as failed; the rest of the batch carries on.
    async fn import_from_remote(&self, url: &str) -> ImportReport {
        let mut report = ImportReport {
            pages: 1,
            ..ImportReport::default()
        };

        let Some(url) = self.guard("import_from_remote", Url::parse(url)) else {
            return report;
        };
        let remote = self.context().remote.clone();
        let records = self
            .context()
            .coordinator
            .enqueue(self.key(), async move { remote.fetch_records(url).await })
            .outcome()
            .await;

        let records = match records {
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
            let imported = match FieldMap::from_json(record) {
                Ok(fields) => self.create_local_fields(&fields),
                Err(e) => {
                    self.log_error("import_from_remote", &e);
                    false
                }
            };
            if imported {
                report.imported += 1;
            } else {
                report.failed += 1;
            }
        }

        tracing::debug!(
            table = self.schema().table,
            fetched = report.fetched,
            imported = report.imported,
            "page imported"
        );
        report
    }

    /// Imports everything this manager's read endpoint serves.
    async fn import_all_from_remote(&self) -> ImportReport {
        match self.endpoint(Operation::Read) {
            Ok(endpoint) => self.import_from_remote(endpoint.url().as_str()).await,
            Err(e) => {
                self.log_error("import_all_from_remote", &e);
                ImportReport::default()
            }
        }
    }

    /// Imports `base_url` in `offset`/`limit` windows of `page_size`.
    async fn import_paginated_from_remote(&self, base_url: &str, page_size: usize) -> ImportReport {
        import::import_paginated(self, base_url, page_size).await
    }

    async fn wait_for_response(&self) {
        self.context().coordinator.wait_for_response(self.key()).await
    }
}
