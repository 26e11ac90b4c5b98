//! Core types shared by the condition compiler and clause renderers.

use serde::{Deserialize, Serialize};

/// SQL parameter values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL`
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating-point number
    Float(f64),
    /// Text. Request filter values are always bound as text.
    String(String),
    /// Bounds of a `BETWEEN` condition
    Array(Vec<Value>),
}

impl Value {
    /// Read the value as a row count.
    ///
    /// Drivers disagree on how they surface `count(*)`, so integers, floats
    /// and numeric strings are all accepted. Anything else counts as zero.
    #[must_use]
    pub fn as_count(&self) -> u64 {
        match self {
            Self::Int(n) => u64::try_from(*n).unwrap_or(0),
            Self::Float(f) if f.is_finite() && *f > 0.0 => *f as u64,
            Self::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Logical operator combining condition groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum LogicalOp {
    /// All groups must match: `AND`
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    /// At least one group must match: `OR`
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl LogicalOp {
    /// SQL keyword for this operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    /// Ascending: `ASC`
    Asc,
    /// Descending: `DESC`
    Desc,
}

impl SortDir {
    /// Parse a request direction. Only the exact strings `asc` and `desc` are accepted.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    /// SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Compiled SQL comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equal: `=`
    Eq,
    /// Greater than: `>`
    Gt,
    /// Greater than or equal: `>=`
    Gte,
    /// Less than: `<`
    Lt,
    /// Less than or equal: `<=`
    Lte,
    /// Inclusive range: `BETWEEN $1 AND $2`, value is a two-element array
    Between,
    /// Substring match
    Contains,
    /// Prefix match
    BeginsWith,
    /// Suffix match
    EndsWith,
}

impl Operator {
    /// Whether this operator renders as a pattern match.
    #[must_use]
    pub const fn is_pattern(self) -> bool {
        matches!(self, Self::Contains | Self::BeginsWith | Self::EndsWith)
    }
}

/// A single parameterized condition on one column.
///
/// `column` must already be whitelisted or alias-resolved; it is the only
/// part written into SQL text.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Column written into SQL.
    pub column: String,
    /// Comparison to render.
    pub op: Operator,
    /// Bound value. Pattern operators take the raw needle.
    pub value: Value,
    /// Only meaningful for pattern operators.
    pub case_sensitive: bool,
}

impl Condition {
    /// Create a condition with case-insensitive pattern semantics.
    pub fn new(column: impl Into<String>, op: Operator, value: Value) -> Self {
        Self {
            column: column.into(),
            op,
            value,
            case_sensitive: false,
        }
    }

    /// Switch pattern matching to case-sensitive.
    pub const fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }
}

/// Conditions OR-ed together, rendered as one parenthesized group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionGroup {
    /// Alternatives, joined with `OR`.
    pub conditions: Vec<Condition>,
}

impl ConditionGroup {
    /// Create a group from its conditions.
    #[must_use]
    pub const fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// Whether the group holds no condition.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Sort column with direction and resolved NULL placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    /// Column written into SQL.
    pub column: String,
    /// Sort direction.
    pub dir: SortDir,
    /// Render `NULLS LAST` after the direction.
    pub nulls_last: bool,
}

impl SortField {
    /// Create a new sort field using the database's NULL placement.
    pub fn new(column: impl Into<String>, dir: SortDir) -> Self {
        Self {
            column: column.into(),
            dir,
            nulls_last: false,
        }
    }

    /// Force NULLs after non-NULL values.
    pub const fn nulls_last(mut self, yes: bool) -> Self {
        self.nulls_last = yes;
        self
    }
}

/// Rendered SQL fragment with its positional parameters.
#[derive(Debug, Clone, PartialEq, Default)]
#[must_use = "a rendered fragment must be spliced into a query"]
pub struct Fragment {
    /// SQL text with numbered placeholders.
    pub sql: String,
    /// Values for the placeholders, in order.
    pub params: Vec<Value>,
}
