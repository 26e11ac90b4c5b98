//! Filter and free-text search directives.
//!
//! Raw entries arrive as `"<column>[:<operator>]" -> value` pairs straight
//! from the request. They are parsed once, here, into [`FilterRequest`]s;
//! nothing downstream looks at the raw keys again.

use std::fmt;

use crate::config::ListingConfig;

/// Separator between the lower and upper bound of a `between` value.
pub const BETWEEN_DELIMITER: char = '~';

/// Request-level filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Case-insensitive substring match.
    Contains,
    /// Case-insensitive prefix match.
    Begins,
    /// Case-insensitive suffix match.
    Ends,
    /// Case-sensitive substring match.
    SensibleContains,
    /// Case-sensitive prefix match.
    SensibleBegins,
    /// Case-sensitive suffix match.
    SensibleEnds,
    /// Equality.
    Equals,
    /// Inclusive range, value `low~high`.
    Between,
    /// Strictly less than.
    Less,
    /// Strictly greater than.
    Greater,
    /// Less than or equal.
    LessEquals,
    /// Greater than or equal.
    GreaterEquals,
}

impl FilterOperator {
    /// Every operator a request may name.
    pub const ALL: [Self; 12] = [
        Self::Contains,
        Self::Begins,
        Self::Ends,
        Self::SensibleContains,
        Self::SensibleBegins,
        Self::SensibleEnds,
        Self::Equals,
        Self::Between,
        Self::Less,
        Self::Greater,
        Self::LessEquals,
        Self::GreaterEquals,
    ];

    /// Look up an operator by its request name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    /// The request name of this operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Begins => "begins",
            Self::Ends => "ends",
            Self::SensibleContains => "sensible_contains",
            Self::SensibleBegins => "sensible_begins",
            Self::SensibleEnds => "sensible_ends",
            Self::Equals => "equals",
            Self::Between => "between",
            Self::Less => "less",
            Self::Greater => "greater",
            Self::LessEquals => "less_equals",
            Self::GreaterEquals => "greater_equals",
        }
    }

    /// Whether pattern matching must respect case.
    #[must_use]
    pub const fn is_case_sensitive(self) -> bool {
        matches!(
            self,
            Self::SensibleContains | Self::SensibleBegins | Self::SensibleEnds
        )
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter value as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    /// A plain value. For `between` this means the value did not split.
    Single(String),
    /// Lower and upper bound of a `between` filter.
    Range(String, String),
}

/// A validated, alias-resolved filter directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    /// Column name as the request named it.
    pub field: String,
    /// Column name written into SQL.
    pub column: String,
    /// Requested comparison.
    pub operator: FilterOperator,
    /// Value to compare against.
    pub value: FilterValue,
}

/// Parsed filter and search directives for one listing request.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    filters: Vec<FilterRequest>,
    search: Option<String>,
}

impl FilterSpec {
    /// Parse raw filter entries and an optional search term.
    ///
    /// Entries naming a non-whitelisted column or an unknown operator are
    /// dropped, as are entries with an empty value. Search is `None` when it
    /// is disabled by configuration or blank.
    pub fn new<K, V>(
        config: &ListingConfig,
        raw_filters: impl IntoIterator<Item = (K, V)>,
        raw_search: Option<&str>,
    ) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let filters = raw_filters
            .into_iter()
            .filter_map(|(key, value)| parse_entry(config, key.as_ref(), value.as_ref()))
            .collect();

        let search = if config.search_enabled() {
            raw_search
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(str::to_string)
        } else {
            None
        };

        Self { filters, search }
    }

    /// All accepted filters in request order.
    #[must_use]
    pub fn filters(&self) -> &[FilterRequest] {
        &self.filters
    }

    /// Accepted filters on one request-facing column.
    pub fn filters_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FilterRequest> {
        self.filters.iter().filter(move |f| f.field == field)
    }

    /// The search term, if search is enabled and one was given.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Whether neither filters nor search survived parsing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.search.is_none()
    }
}

fn parse_entry(config: &ListingConfig, key: &str, value: &str) -> Option<FilterRequest> {
    let (field, op_name) = key.split_once(':').unwrap_or((key, "contains"));

    let Some(operator) = FilterOperator::parse(op_name) else {
        tracing::debug!(field, operator = op_name, "dropping filter with unknown operator");
        return None;
    };
    if !config.is_allowed(field) {
        tracing::debug!(field, "dropping filter on column outside whitelist");
        return None;
    }
    if value.is_empty() {
        return None;
    }

    let value = if operator == FilterOperator::Between {
        split_range(value)
    } else {
        FilterValue::Single(value.to_string())
    };

    Some(FilterRequest {
        field: field.to_string(),
        column: config.resolve(field).to_string(),
        operator,
        value,
    })
}

fn split_range(raw: &str) -> FilterValue {
    let mut parts = raw.split(BETWEEN_DELIMITER);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(low), Some(high), None) => FilterValue::Range(low.to_string(), high.to_string()),
        _ => FilterValue::Single(raw.to_string()),
    }
}
