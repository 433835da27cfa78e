//! Use-case surface for transport adapters.
//!
//! # Responsibility
//! - Expose one function per gradebook operation taking the caller's
//!   resolved scope set, path ids, list parameters and raw JSON bodies.
//! - Map every outcome onto an `ApiResponse` with an HTTP-equivalent status.
//!
//! # Invariants
//! - Functions never panic and never return `Err`; failures become envelopes.
//! - Scope checks run before body or parameter parsing.

use crate::config::ApiConfig;
use crate::response::ApiResponse;
use gradebook_core::scope::Action;
use gradebook_core::{
    core_version, init_logging, open_db, open_db_in_memory, CategoryPayload, DbError,
    GradebookEntity, GradebookError, GradebookResult, GradebookService, LineItemPayload,
    ListQuery, LoggingError, Page, PageRequest, ResourceKind, ResultPayload, ScopeSet,
    SqliteGradebookStore, ValidationErrors,
};
use log::info;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

const API_MESSAGE: &str = "OneRoster Gradebook API";
const API_VERSION: &str = "1.2";
const API_IMPLEMENTATION: &str = "Rust";

/// Raw listing query parameters: `offset`, `limit`, `filter`, `sort` and
/// `fields`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub fields: Option<String>,
}

impl ListParams {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset: Some(offset),
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    fn to_query<E: GradebookEntity>(&self) -> Result<ListQuery<E>, ValidationErrors> {
        let page = PageRequest::from_params(self.offset, self.limit)?;
        ListQuery::parse(
            page,
            self.filter.as_deref(),
            self.sort.as_deref(),
            self.fields.as_deref(),
        )
    }
}

/// Startup failure before any request can be served.
#[derive(Debug)]
pub enum BootstrapError {
    Logging(LoggingError),
    Db(DbError),
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "logging bootstrap failed: {err}"),
            Self::Db(err) => write!(f, "database bootstrap failed: {err}"),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<LoggingError> for BootstrapError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for BootstrapError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Gradebook operations over one migrated SQLite connection.
pub struct GradebookApi {
    conn: Connection,
}

impl GradebookApi {
    /// Starts logging when configured, then opens and migrates the database.
    pub fn bootstrap(config: &ApiConfig) -> Result<Self, BootstrapError> {
        if let Some(log_dir) = &config.log_dir {
            init_logging(&config.log_level, log_dir)?;
        }
        let api = Self::open(&config.db_path)?;
        info!(
            "event=api_bootstrap module=api status=ok version={} file_logging={}",
            core_version(),
            config.log_dir.is_some()
        );
        Ok(api)
    }

    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, DbError> {
        Ok(Self {
            conn: open_db(db_path)?,
        })
    }

    /// Private in-memory database; contents vanish with the value.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// `{message, version, implementation}` service descriptor. No scope.
    pub fn root_info(&self) -> ApiResponse {
        ApiResponse::ok(json!({
            "message": API_MESSAGE,
            "version": API_VERSION,
            "implementation": API_IMPLEMENTATION,
        }))
    }

    /// Liveness check. No scope.
    pub fn health(&self) -> ApiResponse {
        ApiResponse::ok(json!({ "status": "healthy" }))
    }

    pub fn list_categories(&self, scopes: &ScopeSet, params: ListParams) -> ApiResponse {
        self.listing(scopes, &params, "list_categories", |service, query| {
            service.list_categories(scopes, query)
        })
    }

    pub fn get_category(&self, scopes: &ScopeSet, sourced_id: &str) -> ApiResponse {
        let outcome = self.with_service(|service| service.get_category(scopes, sourced_id));
        entity_response(200, outcome, "get_category")
    }

    pub fn create_category(&self, scopes: &ScopeSet, body: &str) -> ApiResponse {
        let outcome = authorized_body(scopes, ResourceKind::Category, Action::Create, body)
            .and_then(|payload: CategoryPayload| {
                self.with_service(|service| service.create_category(scopes, &payload))
            });
        entity_response(201, outcome, "create_category")
    }

    pub fn update_category(&self, scopes: &ScopeSet, sourced_id: &str, body: &str) -> ApiResponse {
        let outcome = authorized_body(scopes, ResourceKind::Category, Action::Update, body)
            .and_then(|payload: CategoryPayload| {
                self.with_service(|service| service.update_category(scopes, sourced_id, &payload))
            });
        entity_response(200, outcome, "update_category")
    }

    pub fn delete_category(&self, scopes: &ScopeSet, sourced_id: &str) -> ApiResponse {
        let outcome = self.with_service(|service| service.delete_category(scopes, sourced_id));
        empty_response(outcome, "delete_category")
    }

    pub fn list_line_items(&self, scopes: &ScopeSet, params: ListParams) -> ApiResponse {
        self.listing(scopes, &params, "list_line_items", |service, query| {
            service.list_line_items(scopes, query)
        })
    }

    pub fn list_line_items_for_category(
        &self,
        scopes: &ScopeSet,
        category_sourced_id: &str,
        params: ListParams,
    ) -> ApiResponse {
        self.listing(scopes, &params, "list_line_items_for_category", |service, query| {
            service.list_line_items_for_category(scopes, category_sourced_id, query)
        })
    }

    pub fn get_line_item(&self, scopes: &ScopeSet, sourced_id: &str) -> ApiResponse {
        let outcome = self.with_service(|service| service.get_line_item(scopes, sourced_id));
        entity_response(200, outcome, "get_line_item")
    }

    pub fn create_line_item(&self, scopes: &ScopeSet, body: &str) -> ApiResponse {
        let outcome = authorized_body(scopes, ResourceKind::LineItem, Action::Create, body)
            .and_then(|payload: LineItemPayload| {
                self.with_service(|service| service.create_line_item(scopes, &payload))
            });
        entity_response(201, outcome, "create_line_item")
    }

    pub fn update_line_item(&self, scopes: &ScopeSet, sourced_id: &str, body: &str) -> ApiResponse {
        let outcome = authorized_body(scopes, ResourceKind::LineItem, Action::Update, body)
            .and_then(|payload: LineItemPayload| {
                self.with_service(|service| service.update_line_item(scopes, sourced_id, &payload))
            });
        entity_response(200, outcome, "update_line_item")
    }

    pub fn delete_line_item(&self, scopes: &ScopeSet, sourced_id: &str) -> ApiResponse {
        let outcome = self.with_service(|service| service.delete_line_item(scopes, sourced_id));
        empty_response(outcome, "delete_line_item")
    }

    pub fn list_results(&self, scopes: &ScopeSet, params: ListParams) -> ApiResponse {
        self.listing(scopes, &params, "list_results", |service, query| {
            service.list_results(scopes, query)
        })
    }

    pub fn list_results_for_line_item(
        &self,
        scopes: &ScopeSet,
        line_item_sourced_id: &str,
        params: ListParams,
    ) -> ApiResponse {
        self.listing(scopes, &params, "list_results_for_line_item", |service, query| {
            service.list_results_for_line_item(scopes, line_item_sourced_id, query)
        })
    }

    pub fn list_results_for_student(
        &self,
        scopes: &ScopeSet,
        student_id: &str,
        params: ListParams,
    ) -> ApiResponse {
        self.listing(scopes, &params, "list_results_for_student", |service, query| {
            service.list_results_for_student(scopes, student_id, query)
        })
    }

    pub fn get_result(&self, scopes: &ScopeSet, sourced_id: &str) -> ApiResponse {
        let outcome = self.with_service(|service| service.get_result(scopes, sourced_id));
        entity_response(200, outcome, "get_result")
    }

    pub fn create_result(&self, scopes: &ScopeSet, body: &str) -> ApiResponse {
        let outcome = authorized_body(scopes, ResourceKind::Result, Action::Create, body)
            .and_then(|payload: ResultPayload| {
                self.with_service(|service| service.create_result(scopes, &payload))
            });
        entity_response(201, outcome, "create_result")
    }

    pub fn update_result(&self, scopes: &ScopeSet, sourced_id: &str, body: &str) -> ApiResponse {
        let outcome = authorized_body(scopes, ResourceKind::Result, Action::Update, body)
            .and_then(|payload: ResultPayload| {
                self.with_service(|service| service.update_result(scopes, sourced_id, &payload))
            });
        entity_response(200, outcome, "update_result")
    }

    pub fn delete_result(&self, scopes: &ScopeSet, sourced_id: &str) -> ApiResponse {
        let outcome = self.with_service(|service| service.delete_result(scopes, sourced_id));
        empty_response(outcome, "delete_result")
    }

    fn with_service<T>(
        &self,
        f: impl FnOnce(&GradebookService<SqliteGradebookStore<'_>>) -> GradebookResult<T>,
    ) -> GradebookResult<T> {
        let store = SqliteGradebookStore::try_new(&self.conn)?;
        f(&GradebookService::new(store))
    }

    /// Runs one listing and renders the page, projected to `fields` when
    /// the caller asked for a subset.
    fn listing<E: GradebookEntity + Serialize>(
        &self,
        scopes: &ScopeSet,
        params: &ListParams,
        operation: &str,
        f: impl FnOnce(
            &GradebookService<SqliteGradebookStore<'_>>,
            &ListQuery<E>,
        ) -> GradebookResult<Page<E>>,
    ) -> ApiResponse {
        match self.run_listing(scopes, params, f) {
            Ok((page, query)) => ApiResponse::page(E::KIND, &page, query.fields(), operation),
            Err(err) => ApiResponse::from_error(&err, operation),
        }
    }

    fn run_listing<E: GradebookEntity>(
        &self,
        scopes: &ScopeSet,
        params: &ListParams,
        f: impl FnOnce(
            &GradebookService<SqliteGradebookStore<'_>>,
            &ListQuery<E>,
        ) -> GradebookResult<Page<E>>,
    ) -> GradebookResult<(Page<E>, ListQuery<E>)> {
        scopes.authorize(E::KIND, Action::List)?;
        let query = params.to_query::<E>()?;
        let page = self.with_service(|service| f(service, &query))?;
        Ok((page, query))
    }
}

fn authorized_body<P: DeserializeOwned>(
    scopes: &ScopeSet,
    kind: ResourceKind,
    action: Action,
    body: &str,
) -> GradebookResult<P> {
    scopes.authorize(kind, action)?;
    serde_json::from_str(body).map_err(|err| {
        GradebookError::ValidationFailed(ValidationErrors::single("body", err.to_string()))
    })
}

fn entity_response<T: Serialize>(
    status: u16,
    outcome: GradebookResult<T>,
    operation: &str,
) -> ApiResponse {
    match outcome {
        Ok(entity) => ApiResponse::json(status, &entity, operation),
        Err(err) => ApiResponse::from_error(&err, operation),
    }
}

fn empty_response(outcome: GradebookResult<()>, operation: &str) -> ApiResponse {
    match outcome {
        Ok(()) => ApiResponse::no_content(),
        Err(err) => ApiResponse::from_error(&err, operation),
    }
}
