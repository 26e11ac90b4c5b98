//! WHERE, ORDER BY and LIMIT clause renderers.

use super::render::render_group_impl;
use super::types::{ConditionGroup, Fragment, LogicalOp, SortField};
use crate::dialect::Dialect;
use crate::spec::{PaginationSpec, SortSpec};

/// Condition groups joined by an aggregate operator.
///
/// Conditions inside a group are OR-ed; groups are joined with `op`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WhereClause {
    groups: Vec<ConditionGroup>,
    op: LogicalOp,
}

impl WhereClause {
    /// Create an empty clause joining groups with `op`.
    #[must_use]
    pub const fn new(op: LogicalOp) -> Self {
        Self {
            groups: Vec::new(),
            op,
        }
    }

    /// Append a group. Empty groups are ignored.
    pub fn push(&mut self, group: ConditionGroup) {
        if !group.is_empty() {
            self.groups.push(group);
        }
    }

    /// Groups in render order.
    #[must_use]
    pub fn groups(&self) -> &[ConditionGroup] {
        &self.groups
    }

    /// Aggregate operator.
    #[must_use]
    pub const fn op(&self) -> LogicalOp {
        self.op
    }

    /// Whether the clause renders to nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Render the predicate without the `WHERE` keyword, numbering
    /// placeholders from `start_idx`.
    pub fn render<D: Dialect>(&self, dialect: &D, start_idx: usize) -> Fragment {
        let mut idx = start_idx;
        let mut params = Vec::new();
        let mut parts = Vec::with_capacity(self.groups.len());

        for group in &self.groups {
            let (sql, group_params, new_idx) = render_group_impl(dialect, group, idx);
            parts.push(sql);
            params.extend(group_params);
            idx = new_idx;
        }

        let sql = parts.join(&format!(" {} ", self.op.as_sql()));
        Fragment { sql, params }
    }
}

/// Ordered sort columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderByClause {
    fields: Vec<SortField>,
}

impl OrderByClause {
    /// Create a clause from resolved sort fields.
    #[must_use]
    pub const fn new(fields: Vec<SortField>) -> Self {
        Self { fields }
    }

    /// Build from a parsed sort spec.
    #[must_use]
    pub fn from_spec(spec: &SortSpec) -> Self {
        Self::new(spec.sorts().to_vec())
    }

    /// Sort fields in render order.
    #[must_use]
    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    /// Whether the clause renders to nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render the column list without the `ORDER BY` keywords.
    pub fn render<D: Dialect>(&self, dialect: &D) -> String {
        self.fields
            .iter()
            .map(|field| dialect.sort_clause(field))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Page bounds appended to the composed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitClause {
    bounds: Option<(u32, u64)>,
}

impl LimitClause {
    /// Bound the result to `limit` rows after skipping `offset`.
    #[must_use]
    pub const fn new(limit: u32, offset: u64) -> Self {
        Self {
            bounds: Some((limit, offset)),
        }
    }

    /// No pagination, for full exports.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { bounds: None }
    }

    /// Bounds for the requested page.
    #[must_use]
    pub fn from_pagination(spec: &PaginationSpec) -> Self {
        Self::new(spec.limit(), spec.offset())
    }

    /// Whether a LIMIT will be appended.
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.bounds.is_some()
    }

    /// Page size, if bounded.
    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        self.bounds.map(|(limit, _)| limit)
    }

    /// Rows skipped, if bounded.
    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        self.bounds.map(|(_, offset)| offset)
    }

    /// Render `LIMIT n OFFSET m`, or an empty string.
    ///
    /// Both numbers are integers owned by the engine, so they are written
    /// inline rather than bound.
    pub fn to_sql<D: Dialect>(&self, dialect: &D) -> String {
        self.bounds
            .map(|(limit, offset)| dialect.limit_clause(limit, offset))
            .unwrap_or_default()
    }
}
