//! Listing orchestration: request directives in, one page of rows out.
//!
//! [`ListModel`] owns a validated configuration and a base statement. For each
//! request it parses the specs, compiles and composes the query, hands it to a
//! [`Database`] collaborator and turns the result into a [`ListView`].

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::builder::{ConditionCompiler, LimitClause, OrderByClause, Value};
use crate::compose::{ComposedQuery, QueryComposer};
use crate::config::ListingConfig;
use crate::dialect::Dialect;
use crate::error::FunnelError;
use crate::spec::{FilterSpec, PaginationSpec, SortSpec};

/// Raw, untrusted listing directives as decoded from a request.
///
/// ```
/// # use funnel_sql::ListingRequest;
/// let request = ListingRequest::new()
///     .filter("name:contains", "man")
///     .sort("name", "asc")
///     .page("2")
///     .limit("10");
/// assert_eq!(request.filters.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingRequest {
    /// `column[:operator]` keys with their values, in request order.
    pub filters: Vec<(String, String)>,
    /// Free-text search term.
    pub search: Option<String>,
    /// `column` keys with `asc`/`desc` values, in request order.
    pub sorts: Vec<(String, String)>,
    /// Requested page number, unparsed.
    pub page: Option<String>,
    /// Requested page size, unparsed.
    pub limit: Option<String>,
}

impl ListingRequest {
    /// An empty request: first page, default size, default sort.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter entry.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    /// Set the search term.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Add a sort entry.
    pub fn sort(mut self, column: impl Into<String>, direction: impl Into<String>) -> Self {
        self.sorts.push((column.into(), direction.into()));
        self
    }

    /// Set the page number.
    pub fn page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    /// Set the page size.
    pub fn limit(mut self, limit: impl Into<String>) -> Self {
        self.limit = Some(limit.into());
        self
    }
}

/// One result row: named columns in projection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// An empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.push(name, value);
        self
    }

    /// Append a column.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.columns.push((name.into(), value));
    }

    /// Value of the first column called `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Remove and return the first column called `name`.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.columns.iter().position(|(column, _)| column == name)?;
        Some(self.columns.remove(idx).1)
    }

    /// All columns in order.
    pub fn columns(&self) -> &[(String, Value)] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// The external query executor.
///
/// Implementations bind `params[i]` to placeholder `i + 1` and return every
/// row with its columns named as projected.
pub trait Database {
    /// Driver error, surfaced unchanged as the source of
    /// [`FunnelError::Execution`].
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run one statement and collect its rows.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, Self::Error>;
}

impl<T: Database + ?Sized> Database for &mut T {
    type Error = T::Error;

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, Self::Error> {
        (**self).execute(sql, params)
    }
}

/// Pagination metadata for a fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// 1-based page number.
    pub current_page: u32,
    /// Last page number; at least 1.
    pub max_page: u64,
    /// Page size.
    pub limit: u32,
    /// Rows matching the filters across all pages.
    pub total_count: u64,
    /// Whether a later page exists.
    pub has_next: bool,
    /// Whether an earlier page exists.
    pub has_prev: bool,
}

impl PageInfo {
    /// Derive page metadata from the request's pagination and the total.
    #[must_use]
    pub fn new(pagination: &PaginationSpec, total_count: u64) -> Self {
        let current_page = pagination.current_page();
        let max_page = pagination.max_page(total_count);
        Self {
            current_page,
            max_page,
            limit: pagination.limit(),
            total_count,
            has_next: u64::from(current_page) < max_page,
            has_prev: current_page > 1,
        }
    }
}

/// Everything derived from a request before execution.
#[derive(Debug, Clone)]
pub struct PreparedListing {
    /// Accepted filters and search term.
    pub filters: FilterSpec,
    /// Accepted sort columns.
    pub sorts: SortSpec,
    /// Clamped page and page size.
    pub pagination: PaginationSpec,
    /// The statement to run.
    pub query: ComposedQuery,
}

/// One fetched page.
#[derive(Debug, Clone)]
pub struct ListView {
    /// Page rows without the count column.
    pub rows: Vec<Row>,
    /// Pagination metadata.
    pub page_info: PageInfo,
    /// Filters that were applied, for rendering active-filter state.
    pub filters: FilterSpec,
    /// Sorts that were applied.
    pub sorts: SortSpec,
}

/// A listing over one base statement.
///
/// ```
/// # use funnel_sql::prelude::*;
/// let config = ListingConfig::builder()
///     .whitelist(&["name"])
///     .build()
///     .unwrap();
/// let model = ListModel::new(Sqlite, config, "SELECT * FROM heroes");
///
/// let prepared = model
///     .prepare(&ListingRequest::new().filter("name:contains", "man").limit("50"))
///     .unwrap();
/// assert!(prepared.query.sql.ends_with("LIMIT 50 OFFSET 0"));
/// ```
#[derive(Debug, Clone)]
pub struct ListModel<D: Dialect> {
    config: ListingConfig,
    composer: QueryComposer<D>,
    base_sql: String,
    base_params: Vec<Value>,
}

impl<D: Dialect> ListModel<D> {
    /// Listing over `base_sql`, which takes no parameters of its own.
    pub fn new(dialect: D, config: ListingConfig, base_sql: impl Into<String>) -> Self {
        Self {
            composer: QueryComposer::for_config(dialect, &config),
            config,
            base_sql: base_sql.into(),
            base_params: Vec::new(),
        }
    }

    /// Bind the base statement's own placeholders `1..=params.len()`.
    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.base_params = params;
        self
    }

    /// The validated configuration.
    pub const fn config(&self) -> &ListingConfig {
        &self.config
    }

    /// The base statement.
    pub fn base_sql(&self) -> &str {
        &self.base_sql
    }

    /// Parse the request and compose the statement without running it.
    pub fn prepare(&self, request: &ListingRequest) -> Result<PreparedListing, FunnelError> {
        let filters = FilterSpec::new(
            &self.config,
            request.filters.iter().map(|(k, v)| (k, v)),
            request.search.as_deref(),
        );
        let sorts = SortSpec::new(&self.config, request.sorts.iter().map(|(k, v)| (k, v)));
        let pagination =
            PaginationSpec::new(&self.config, request.page.as_deref(), request.limit.as_deref());

        let where_clause = ConditionCompiler::new(&self.config).where_clause(&filters)?;
        let query = self.composer.compose(
            &self.base_sql,
            &self.base_params,
            &where_clause,
            &OrderByClause::from_spec(&sorts),
            &LimitClause::from_pagination(&pagination),
        )?;

        Ok(PreparedListing {
            filters,
            sorts,
            pagination,
            query,
        })
    }

    /// Prepare, execute and collect one page.
    ///
    /// The total comes from the count column of the first row, or 0 when the
    /// page is empty; the count column is removed from every row.
    pub fn fetch<DB: Database>(
        &self,
        db: &mut DB,
        request: &ListingRequest,
    ) -> Result<ListView, FunnelError> {
        let PreparedListing {
            filters,
            sorts,
            pagination,
            query,
        } = self.prepare(request)?;

        let mut rows = db
            .execute(&query.sql, &query.params)
            .map_err(FunnelError::execution)?;

        let total_count = rows
            .first()
            .and_then(|row| row.get(&query.count_alias))
            .map_or(0, Value::as_count);
        for row in &mut rows {
            row.remove(&query.count_alias);
        }

        let page_info = PageInfo::new(&pagination, total_count);
        tracing::debug!(
            rows = rows.len(),
            total_count,
            page = page_info.current_page,
            max_page = page_info.max_page,
            "fetched listing page"
        );

        Ok(ListView {
            rows,
            page_info,
            filters,
            sorts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Sqlite;

    /// Records the statement and answers with canned rows.
    #[derive(Debug, Default)]
    struct Recorder {
        rows: Vec<Row>,
        seen: Vec<(String, Vec<Value>)>,
    }

    impl Database for Recorder {
        type Error = std::io::Error;

        fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, Self::Error> {
            self.seen.push((sql.to_string(), params.to_vec()));
            Ok(self.rows.clone())
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Database for Broken {
        type Error = std::io::Error;

        fn execute(&mut self, _sql: &str, _params: &[Value]) -> Result<Vec<Row>, Self::Error> {
            Err(std::io::Error::other("connection reset"))
        }
    }

    fn model() -> ListModel<Sqlite> {
        let config = ListingConfig::builder()
            .whitelist(&["name"])
            .default_limit(2)
            .build()
            .unwrap();
        ListModel::new(Sqlite, config, "SELECT * FROM heroes")
    }

    fn hero(name: &str, total: i64) -> Row {
        Row::new()
            .with("_zf_count", Value::Int(total))
            .with("name", name.into())
    }

    #[test]
    fn test_row_get_and_remove() {
        let mut row = Row::new().with("a", Value::Int(1)).with("b", Value::Int(2));
        assert_eq!(row.get("b"), Some(&Value::Int(2)));
        assert_eq!(row.remove("a"), Some(Value::Int(1)));
        assert_eq!(row.remove("a"), None);
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn test_row_serializes_as_object() {
        let row: Row = [("name", Value::from("Flash")), ("age", Value::Int(30))]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"name":"Flash","age":30}"#);
    }

    #[test]
    fn test_page_info() {
        let config = ListingConfig::builder().default_limit(10).build().unwrap();
        let pagination = PaginationSpec::new(&config, Some("2"), None);

        let info = PageInfo::new(&pagination, 35);
        assert_eq!(info.max_page, 4);
        assert!(info.has_next);
        assert!(info.has_prev);

        let empty = PageInfo::new(&PaginationSpec::new(&config, None, None), 0);
        assert_eq!(empty.max_page, 1);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }

    #[test]
    fn test_page_info_json_is_camel_case() {
        let config = ListingConfig::default();
        let info = PageInfo::new(&PaginationSpec::new(&config, None, None), 3);
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["totalCount"], 3);
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["maxPage"], 1);
    }

    #[test]
    fn test_prepare_drops_unlisted_columns() {
        let prepared = model()
            .prepare(
                &ListingRequest::new()
                    .filter("name", "man")
                    .filter("password:equals", "x")
                    .sort("password", "asc"),
            )
            .unwrap();

        assert_eq!(prepared.filters.filters().len(), 1);
        assert!(prepared.sorts.is_empty());
        assert!(!prepared.query.sql.contains("password"));
        assert_eq!(prepared.query.params, vec![Value::from("%man%")]);
    }

    #[test]
    fn test_fetch_extracts_total_and_strips_count() {
        let mut db = Recorder {
            rows: vec![hero("Batman", 3), hero("Superman", 3)],
            ..Recorder::default()
        };
        let view = model()
            .fetch(&mut db, &ListingRequest::new().filter("name", "man"))
            .unwrap();

        assert_eq!(view.page_info.total_count, 3);
        assert_eq!(view.page_info.max_page, 2);
        assert!(view.page_info.has_next);
        assert!(view.rows.iter().all(|row| row.get("_zf_count").is_none()));
        assert_eq!(view.rows[0].get("name"), Some(&Value::from("Batman")));

        let (sql, params) = &db.seen[0];
        assert!(sql.starts_with("SELECT count(*) OVER() AS _zf_count, *"));
        assert_eq!(params, &vec![Value::from("%man%")]);
    }

    #[test]
    fn test_fetch_empty_page_has_zero_total() {
        let mut db = Recorder::default();
        let view = model().fetch(&mut db, &ListingRequest::new()).unwrap();

        assert!(view.rows.is_empty());
        assert_eq!(view.page_info.total_count, 0);
        assert_eq!(view.page_info.max_page, 1);
    }

    #[test]
    fn test_fetch_wraps_database_error() {
        let err = model()
            .fetch(&mut Broken, &ListingRequest::new())
            .unwrap_err();

        let FunnelError::Execution(source) = err else {
            panic!("expected Execution, got {err:?}")
        };
        assert_eq!(source.to_string(), "connection reset");
    }

    #[test]
    fn test_fetch_malformed_between_is_an_error() {
        let config = ListingConfig::builder().whitelist(&["age"]).build().unwrap();
        let model = ListModel::new(Sqlite, config, "SELECT * FROM heroes");
        let mut db = Recorder::default();

        let err = model
            .fetch(&mut db, &ListingRequest::new().filter("age:between", "10"))
            .unwrap_err();
        assert!(matches!(err, FunnelError::MalformedFilterValue { .. }));
        assert!(db.seen.is_empty());
    }

    #[test]
    fn test_base_params_come_first() {
        let prepared = model()
            .with_params(vec![Value::Bool(true)])
            .prepare(&ListingRequest::new().filter("name:equals", "Flash"))
            .unwrap();

        assert!(prepared.query.sql.contains("(name = ?2)"));
        assert_eq!(
            prepared.query.params,
            vec![Value::Bool(true), Value::from("Flash")]
        );
    }
}
