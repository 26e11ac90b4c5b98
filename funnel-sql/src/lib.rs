// =============================================================================
// CRATE-LEVEL QUALITY LINTS (following Tokio/Serde standards)
// =============================================================================
#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
// =============================================================================
// CLIPPY CONFIGURATION
// =============================================================================
// Pedantic lints that are too verbose to fix individually
#![allow(clippy::doc_markdown)] // Code items in docs - extensive doc changes needed
#![allow(clippy::missing_errors_doc)] // # Errors sections - doc-heavy
#![allow(clippy::missing_panics_doc)] // # Panics sections - doc-heavy
#![allow(clippy::module_name_repetitions)] // Type names matching module - acceptable
#![allow(clippy::return_self_not_must_use)] // Builder pattern methods return Self
#![allow(clippy::must_use_candidate)] // Builder methods - fluent API doesn't need must_use
#![allow(clippy::cast_possible_truncation)] // Float row counts from drivers
#![allow(clippy::cast_sign_loss)] // Float row counts from drivers
// Scanner and composer index only at offsets produced by the scanner itself
#![allow(clippy::indexing_slicing)]
#![allow(clippy::double_must_use)] // Functions returning must_use types can have their own docs


//! # funnel-sql - Listing queries over hand-written SELECT statements
//!
//! Turns untrusted filter, search, sort and page directives into a safely
//! augmented version of an existing SELECT statement. One round trip returns
//! both the page of rows and the total number of matching rows.
//!
//! ## Quick Start
//!
//! ```
//! # use funnel_sql::prelude::*;
//! let config = ListingConfig::builder()
//!     .whitelist(&["name", "age"])
//!     .alias("name", "real_name")
//!     .build()
//!     .unwrap();
//!
//! let model = ListModel::new(Sqlite, config, "SELECT * FROM heroes");
//! let request = ListingRequest::new()
//!     .filter("age:between", "10~20")
//!     .sort("name", "asc")
//!     .limit("50");
//!
//! let prepared = model.prepare(&request).unwrap();
//! assert_eq!(
//!     prepared.query.sql,
//!     "SELECT count(*) OVER() AS _zf_count, * FROM heroes \
//!      WHERE (age BETWEEN ?1 AND ?2) ORDER BY real_name ASC LIMIT 50 OFFSET 0"
//! );
//! assert_eq!(prepared.query.params, vec![Value::from("10"), Value::from("20")]);
//! ```
//!
//! ## Filter Operators
//!
//! Filter keys are `column` or `column:operator`; a bare column means
//! `contains`.
//!
//! | Operator | SQL | Example key |
//! |----------|-----|-------------|
//! | `contains` | `ILIKE '%v%'` / `LIKE '%v%'` | `name:contains` |
//! | `begins` | `ILIKE 'v%'` / `LIKE 'v%'` | `name:begins` |
//! | `ends` | `ILIKE '%v'` / `LIKE '%v'` | `name:ends` |
//! | `sensible_contains` | `LIKE '%v%'` / `GLOB '*v*'` | `name:sensible_contains` |
//! | `sensible_begins` | `LIKE 'v%'` / `GLOB 'v*'` | `name:sensible_begins` |
//! | `sensible_ends` | `LIKE '%v'` / `GLOB '*v'` | `name:sensible_ends` |
//! | `equals` | `=` | `status:equals` |
//! | `less` | `<` | `age:less` |
//! | `greater` | `>` | `age:greater` |
//! | `less_equals` | `<=` | `age:less_equals` |
//! | `greater_equals` | `>=` | `age:greater_equals` |
//! | `between` | `BETWEEN a AND b` | `age:between` with `10~20` |
//!
//! Pattern SQL is shown as Postgres / SQLite. Every value is bound; only
//! whitelisted or alias-resolved column names are written into the SQL text.
//!
//! ## Request data never fails a page
//!
//! Unknown operators, columns outside the whitelist, bad sort directions and
//! unparsable page numbers are dropped or defaulted. The only request-data
//! error is a `between` value that is not `low~high`, reported as
//! [`FunnelError::MalformedFilterValue`].

mod builder;
mod compose;
mod config;
mod dialect;
mod error;
mod listing;
mod spec;
mod validate;

pub use builder::{
    Condition, ConditionCompiler, ConditionGroup, Fragment, LimitClause, LogicalOp, Operator,
    OrderByClause, SortDir, SortField, Value, WhereClause,
};
pub use compose::{ComposedQuery, QueryComposer};
pub use config::{
    DEFAULT_COUNT_ALIAS, DEFAULT_LIMIT, DEFAULT_MAX_LIMIT, DefaultSort, ListingConfig,
    ListingConfigBuilder,
};
pub use dialect::{Dialect, Postgres, Sqlite};
pub use error::{BoxError, ConfigError, FunnelError};
pub use listing::{
    Database, ListModel, ListView, ListingRequest, PageInfo, PreparedListing, Row,
};
pub use spec::{
    BETWEEN_DELIMITER, FilterOperator, FilterRequest, FilterSpec, FilterValue, PaginationSpec,
    SortSpec,
};
pub use validate::{is_valid_qualified_identifier, is_valid_sql_identifier};

/// Prelude module for convenient imports.
///
/// ```
/// use funnel_sql::prelude::*;
/// let model = ListModel::new(Postgres, ListingConfig::default(), "SELECT * FROM heroes");
/// let prepared = model.prepare(&ListingRequest::new()).unwrap();
/// assert!(prepared.query.sql.starts_with("SELECT count(*) OVER()"));
/// ```
pub mod prelude {
    pub use crate::{
        ComposedQuery, Condition, ConditionCompiler, ConditionGroup, ConfigError, Database,
        Dialect, FilterSpec, FunnelError, LimitClause, ListModel, ListView, ListingConfig,
        ListingRequest, LogicalOp, Operator, OrderByClause, PageInfo, PaginationSpec, Postgres,
        QueryComposer, Row, SortDir, SortSpec, Sqlite, Value, WhereClause,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heroes(config: ListingConfig) -> ListModel<Sqlite> {
        ListModel::new(Sqlite, config, "SELECT * FROM heroes")
    }

    #[test]
    fn test_contains_filter_on_plain_select() {
        let config = ListingConfig::builder().whitelist(&["name"]).build().unwrap();
        let prepared = heroes(config)
            .prepare(
                &ListingRequest::new()
                    .filter("name:contains", "man")
                    .page("1")
                    .limit("50"),
            )
            .unwrap();

        assert_eq!(
            prepared.query.sql,
            "SELECT count(*) OVER() AS _zf_count, * FROM heroes WHERE (name LIKE ?1 ESCAPE '\\') LIMIT 50 OFFSET 0"
        );
        assert_eq!(prepared.query.params, vec![Value::from("%man%")]);
    }

    #[test]
    fn test_where_lands_before_group_by() {
        let config = ListingConfig::builder().whitelist(&["name"]).build().unwrap();
        let model = ListModel::new(Postgres, config, "SELECT name FROM heroes GROUP BY name");
        let sql = model
            .prepare(&ListingRequest::new().filter("name:equals", "Flash"))
            .unwrap()
            .query
            .sql;

        let where_at = sql.find("WHERE").unwrap();
        let group_at = sql.find("GROUP BY").unwrap();
        assert!(where_at < group_at);
        assert!(sql.contains("WHERE (name = $1) GROUP BY name"));
    }

    #[test]
    fn test_sort_uses_alias_target() {
        let config = ListingConfig::builder()
            .whitelist(&["name"])
            .alias("name", "real_name")
            .build()
            .unwrap();
        let sql = heroes(config)
            .prepare(&ListingRequest::new().sort("name", "asc"))
            .unwrap()
            .query
            .sql;

        assert!(sql.contains("ORDER BY real_name ASC"));
        assert!(!sql.contains("ORDER BY name"));
    }

    #[test]
    fn test_between_binds_bounds() {
        let config = ListingConfig::builder().whitelist(&["age"]).build().unwrap();
        let prepared = heroes(config)
            .prepare(&ListingRequest::new().filter("age:between", "10~20"))
            .unwrap();

        assert!(prepared.query.sql.contains("(age BETWEEN ?1 AND ?2)"));
        assert!(!prepared.query.sql.contains("10"));
        assert_eq!(
            prepared.query.params,
            vec![Value::from("10"), Value::from("20")]
        );
    }

    #[test]
    fn test_bad_page_and_huge_limit_are_clamped() {
        let config = ListingConfig::builder()
            .default_limit(20)
            .max_limit_allowed(50)
            .build()
            .unwrap();
        let model = heroes(config);

        for page in ["0", "abc", "-4"] {
            let prepared = model
                .prepare(&ListingRequest::new().page(page).limit("99999"))
                .unwrap();
            assert_eq!(prepared.pagination.current_page(), 1, "page {page}");
            assert_eq!(prepared.pagination.limit(), 50);
            assert!(prepared.query.sql.ends_with("LIMIT 50 OFFSET 0"));
        }
    }

    #[test]
    fn test_no_filters_leave_base_untouched() {
        let base = "SELECT id, name FROM heroes WHERE alive = 1 ORDER BY id";
        let model = ListModel::new(Sqlite, ListingConfig::default(), base);
        let sql = model.prepare(&ListingRequest::new()).unwrap().query.sql;

        let injected = " count(*) OVER() AS _zf_count,";
        let restored = sql.replacen(injected, "", 1);
        assert_eq!(restored, format!("{base} LIMIT 25 OFFSET 0"));
    }

    #[test]
    fn test_default_sort_applies_only_without_request_sorts() {
        let config = ListingConfig::builder()
            .whitelist(&["name", "age"])
            .default_sort("age", SortDir::Desc)
            .desc_nulls_last(true)
            .build()
            .unwrap();
        let model = heroes(config);

        let defaulted = model.prepare(&ListingRequest::new()).unwrap().query.sql;
        assert!(defaulted.contains("ORDER BY age DESC NULLS LAST"));

        let requested = model
            .prepare(&ListingRequest::new().sort("name", "asc"))
            .unwrap()
            .query
            .sql;
        assert!(requested.contains("ORDER BY name ASC LIMIT"));
    }
}

// ============================================================================
// API Contract Tests (compile-time assertions)
// ============================================================================
