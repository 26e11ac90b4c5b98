//! Listing configuration.
//!
//! A [`ListingConfig`] is validated once, when it is built, and is immutable
//! afterwards. Specs borrow it per request; nothing mutates it between
//! requests.
//!
//! # TOML
//!
//! ```
//! use funnel_sql::{ListingConfig, LogicalOp};
//!
//! let config = ListingConfig::from_toml_str(r#"
//!     whitelist = ["name", "age"]
//!     searchable_columns = ["name", "alias"]
//!     default_sorts = [{ column = "name", direction = "asc" }]
//!     default_limit = 20
//!     max_limit_allowed = 100
//!     aggregate_operator = "AND"
//!
//!     [alias_columns]
//!     name = "h.real_name"
//! "#).unwrap();
//!
//! assert_eq!(config.default_limit(), 20);
//! assert_eq!(config.aggregate_operator(), LogicalOp::And);
//! assert_eq!(config.resolve("name"), "h.real_name");
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::builder::{LogicalOp, SortDir};
use crate::error::ConfigError;
use crate::validate::{is_valid_qualified_identifier, is_valid_sql_identifier};

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 25;

/// Default page size ceiling.
pub const DEFAULT_MAX_LIMIT: u32 = 100;

/// Default name of the injected total-count column.
pub const DEFAULT_COUNT_ALIAS: &str = "_zf_count";

/// A configured fallback sort entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultSort {
    /// Request-facing column name, resolved through the alias map.
    pub column: String,
    /// Sort direction.
    pub direction: SortDir,
}

/// Validated listing configuration.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    whitelist: Option<BTreeSet<String>>,
    alias_columns: BTreeMap<String, String>,
    searchable_columns: Vec<String>,
    default_sorts: Vec<DefaultSort>,
    asc_nulls_last: bool,
    desc_nulls_last: bool,
    default_limit: u32,
    max_limit_allowed: u32,
    aggregate_operator: LogicalOp,
    search_enabled: bool,
    count_alias: String,
}

impl ListingConfig {
    /// Start building a configuration from defaults.
    #[must_use]
    pub fn builder() -> ListingConfigBuilder {
        ListingConfigBuilder::default()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let raw: ListingConfigBuilder = toml::from_str(source)?;
        raw.build()
    }

    /// Whether a request-facing column may appear in generated SQL.
    ///
    /// Without an explicit whitelist any safe identifier is accepted.
    #[must_use]
    pub fn is_allowed(&self, column: &str) -> bool {
        match &self.whitelist {
            Some(list) => list.contains(column),
            None => is_valid_sql_identifier(column),
        }
    }

    /// Map a request-facing column to the underlying column.
    #[must_use]
    pub fn resolve<'a>(&'a self, column: &'a str) -> &'a str {
        self.alias_columns
            .get(column)
            .map_or(column, String::as_str)
    }

    /// Explicit whitelist, if one is configured.
    #[must_use]
    pub const fn whitelist(&self) -> Option<&BTreeSet<String>> {
        self.whitelist.as_ref()
    }

    /// Request name to column name translations.
    #[must_use]
    pub const fn alias_columns(&self) -> &BTreeMap<String, String> {
        &self.alias_columns
    }

    /// Columns the free-text search runs against.
    #[must_use]
    pub fn searchable_columns(&self) -> &[String] {
        &self.searchable_columns
    }

    /// Sorts used when the request carries none.
    #[must_use]
    pub fn default_sorts(&self) -> &[DefaultSort] {
        &self.default_sorts
    }

    /// Whether ascending sorts put NULLs last.
    #[must_use]
    pub const fn asc_nulls_last(&self) -> bool {
        self.asc_nulls_last
    }

    /// Whether descending sorts put NULLs last.
    #[must_use]
    pub const fn desc_nulls_last(&self) -> bool {
        self.desc_nulls_last
    }

    /// Page size used when the request gives none.
    #[must_use]
    pub const fn default_limit(&self) -> u32 {
        self.default_limit
    }

    /// Upper bound for the page size.
    #[must_use]
    pub const fn max_limit_allowed(&self) -> u32 {
        self.max_limit_allowed
    }

    /// Operator joining per-column groups and the search group.
    #[must_use]
    pub const fn aggregate_operator(&self) -> LogicalOp {
        self.aggregate_operator
    }

    /// Whether the free-text search is honoured.
    #[must_use]
    pub const fn search_enabled(&self) -> bool {
        self.search_enabled
    }

    /// Name of the injected `count(*) OVER()` column.
    #[must_use]
    pub fn count_alias(&self) -> &str {
        &self.count_alias
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            whitelist: None,
            alias_columns: BTreeMap::new(),
            searchable_columns: Vec::new(),
            default_sorts: Vec::new(),
            asc_nulls_last: false,
            desc_nulls_last: false,
            default_limit: DEFAULT_LIMIT,
            max_limit_allowed: DEFAULT_MAX_LIMIT,
            aggregate_operator: LogicalOp::And,
            search_enabled: true,
            count_alias: DEFAULT_COUNT_ALIAS.to_string(),
        }
    }
}

/// Builder for [`ListingConfig`]. Also the TOML schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfigBuilder {
    whitelist: Option<BTreeSet<String>>,
    alias_columns: BTreeMap<String, String>,
    searchable_columns: Vec<String>,
    default_sorts: Vec<DefaultSort>,
    asc_nulls_last: bool,
    desc_nulls_last: bool,
    default_limit: u32,
    max_limit_allowed: u32,
    aggregate_operator: LogicalOp,
    search_enabled: bool,
    count_alias: String,
}

impl Default for ListingConfigBuilder {
    fn default() -> Self {
        let base = ListingConfig::default();
        Self {
            whitelist: base.whitelist,
            alias_columns: base.alias_columns,
            searchable_columns: base.searchable_columns,
            default_sorts: base.default_sorts,
            asc_nulls_last: base.asc_nulls_last,
            desc_nulls_last: base.desc_nulls_last,
            default_limit: base.default_limit,
            max_limit_allowed: base.max_limit_allowed,
            aggregate_operator: base.aggregate_operator,
            search_enabled: base.search_enabled,
            count_alias: base.count_alias,
        }
    }
}

impl ListingConfigBuilder {
    /// Restrict request columns to this set.
    #[must_use]
    pub fn whitelist(mut self, columns: &[&str]) -> Self {
        self.whitelist = Some(columns.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// Translate request name `from` into column `to`.
    #[must_use]
    pub fn alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.alias_columns.insert(from.into(), to.into());
        self
    }

    /// Columns searched by the free-text term.
    #[must_use]
    pub fn searchable_columns(mut self, columns: &[&str]) -> Self {
        self.searchable_columns = columns.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Append a fallback sort.
    #[must_use]
    pub fn default_sort(mut self, column: impl Into<String>, direction: SortDir) -> Self {
        self.default_sorts.push(DefaultSort {
            column: column.into(),
            direction,
        });
        self
    }

    /// NULL placement for ascending sorts.
    #[must_use]
    pub const fn asc_nulls_last(mut self, yes: bool) -> Self {
        self.asc_nulls_last = yes;
        self
    }

    /// NULL placement for descending sorts.
    #[must_use]
    pub const fn desc_nulls_last(mut self, yes: bool) -> Self {
        self.desc_nulls_last = yes;
        self
    }

    /// Page size used when the request gives none.
    #[must_use]
    pub const fn default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    /// Upper bound for the page size.
    #[must_use]
    pub const fn max_limit_allowed(mut self, limit: u32) -> Self {
        self.max_limit_allowed = limit;
        self
    }

    /// Operator joining per-column groups.
    #[must_use]
    pub const fn aggregate_operator(mut self, op: LogicalOp) -> Self {
        self.aggregate_operator = op;
        self
    }

    /// Enable or disable the free-text search.
    #[must_use]
    pub const fn search_enabled(mut self, yes: bool) -> Self {
        self.search_enabled = yes;
        self
    }

    /// Name of the injected total-count column.
    #[must_use]
    pub fn count_alias(mut self, alias: impl Into<String>) -> Self {
        self.count_alias = alias.into();
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<ListingConfig, ConfigError> {
        if self.default_limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        if self.max_limit_allowed < self.default_limit {
            return Err(ConfigError::LimitOutOfRange {
                default_limit: self.default_limit,
                max_limit_allowed: self.max_limit_allowed,
            });
        }

        if let Some(list) = &self.whitelist {
            check_names("whitelist", list.iter())?;
        }
        check_names("alias_columns", self.alias_columns.keys())?;
        check_names("alias_columns", self.alias_columns.values())?;
        check_names("searchable_columns", self.searchable_columns.iter())?;
        check_names(
            "default_sorts",
            self.default_sorts.iter().map(|sort| &sort.column),
        )?;
        if !is_valid_sql_identifier(&self.count_alias) {
            return Err(ConfigError::InvalidIdentifier {
                context: "count_alias",
                name: self.count_alias,
            });
        }

        Ok(ListingConfig {
            whitelist: self.whitelist,
            alias_columns: self.alias_columns,
            searchable_columns: self.searchable_columns,
            default_sorts: self.default_sorts,
            asc_nulls_last: self.asc_nulls_last,
            desc_nulls_last: self.desc_nulls_last,
            default_limit: self.default_limit,
            max_limit_allowed: self.max_limit_allowed,
            aggregate_operator: self.aggregate_operator,
            search_enabled: self.search_enabled,
            count_alias: self.count_alias,
        })
    }
}

fn check_names<'a>(
    context: &'static str,
    names: impl Iterator<Item = &'a String>,
) -> Result<(), ConfigError> {
    for name in names {
        if !is_valid_qualified_identifier(name) {
            return Err(ConfigError::InvalidIdentifier {
                context,
                name: name.clone(),
            });
        }
    }
    Ok(())
}
