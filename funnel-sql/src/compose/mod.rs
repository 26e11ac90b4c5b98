//! Splice compiled clauses into a hand-written base SELECT.
//!
//! The composer never rebuilds the statement. It locates the outermost
//! `SELECT`, `FROM`, `WHERE`, `GROUP BY`, `HAVING`, `WINDOW`, `ORDER BY`
//! and `LIMIT`/`OFFSET`/`FETCH` keywords and inserts text at those
//! positions, leaving every other byte of the base query untouched:
//!
//! - `count(*) OVER() AS <alias>,` right after `SELECT`
//! - the compiled predicate as a new `WHERE`, or AND-ed onto the existing
//!   one (which is parenthesized first)
//! - the sort columns ahead of any existing `ORDER BY` columns, or as a new
//!   `ORDER BY` placed before the pagination keywords
//! - `LIMIT n OFFSET m` at the end
//!
//! ```
//! # use funnel_sql::prelude::*;
//! let mut filter = WhereClause::new(LogicalOp::And);
//! filter.push(ConditionGroup::new(vec![Condition::new(
//!     "name",
//!     Operator::Eq,
//!     "Flash".into(),
//! )]));
//!
//! let composed = QueryComposer::new(Sqlite)
//!     .compose(
//!         "SELECT * FROM heroes",
//!         &[],
//!         &filter,
//!         &OrderByClause::default(),
//!         &LimitClause::new(10, 0),
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     composed.sql,
//!     "SELECT count(*) OVER() AS _zf_count, * FROM heroes WHERE (name = ?1) LIMIT 10 OFFSET 0"
//! );
//! ```

mod scan;

use scan::{Scan, Word};

use crate::builder::{LimitClause, OrderByClause, Value, WhereClause};
use crate::config::{DEFAULT_COUNT_ALIAS, ListingConfig};
use crate::dialect::Dialect;
use crate::error::FunnelError;

/// Clause keywords that may follow the WHERE predicate.
const AFTER_WHERE: &[&[&str]] = &[
    &["group", "by"],
    &["having"],
    &["window"],
    &["order", "by"],
    &["limit"],
    &["offset"],
    &["fetch"],
];

/// Keywords that start the base query's own pagination.
const PAGING: &[&[&str]] = &[&["limit"], &["offset"], &["fetch"]];

/// A base query with the listing clauses spliced in.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "composed query must be executed"]
pub struct ComposedQuery {
    /// Final statement text.
    pub sql: String,
    /// Base parameters followed by filter parameters, in placeholder order.
    pub params: Vec<Value>,
    /// Name of the injected total-count column.
    pub count_alias: String,
    /// Byte offset in `sql` where the injected count projection starts.
    pub count_position: usize,
}

/// Composes listing queries for one dialect.
#[derive(Debug, Clone)]
pub struct QueryComposer<D: Dialect> {
    dialect: D,
    count_alias: String,
}

impl<D: Dialect> QueryComposer<D> {
    /// Composer using the default count alias.
    pub fn new(dialect: D) -> Self {
        Self {
            dialect,
            count_alias: DEFAULT_COUNT_ALIAS.to_string(),
        }
    }

    /// Composer using the count alias from a validated configuration.
    pub fn for_config(dialect: D, config: &ListingConfig) -> Self {
        Self {
            dialect,
            count_alias: config.count_alias().to_string(),
        }
    }

    /// The dialect used for placeholders and clause syntax.
    pub const fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Name of the injected total-count column.
    pub fn count_alias(&self) -> &str {
        &self.count_alias
    }

    /// Splice the clauses into `base_sql`.
    ///
    /// `base_params` bind the base query's own placeholders, which must be
    /// numbered `1..=base_params.len()`; filter placeholders continue from
    /// there.
    ///
    /// # Errors
    ///
    /// - [`FunnelError::UnsupportedQuery`] when there is no top-level
    ///   `SELECT`, or when the base query paginates itself and `limit` is
    ///   bounded.
    /// - [`FunnelError::AlreadyComposed`] when the select list already
    ///   projects the count alias.
    pub fn compose(
        &self,
        base_sql: &str,
        base_params: &[Value],
        where_clause: &WhereClause,
        order_by: &OrderByClause,
        limit: &LimitClause,
    ) -> Result<ComposedQuery, FunnelError> {
        let scan = Scan::new(base_sql);
        let end = scan.code_end();

        let select = scan
            .first("select", 0)
            .ok_or_else(|| FunnelError::UnsupportedQuery("no top-level SELECT".to_string()))?;
        let scope = scan.first("from", select.end).map_or(select.end, |w| w.end);

        // The count projection goes after a set quantifier, not before it
        let quantifier = scan
            .words_between(select.end, end)
            .next()
            .filter(|w| w.before == select.end);
        if quantifier.is_some_and(|w| scan.is(w, "distinct")) {
            return Err(FunnelError::UnsupportedQuery(
                "SELECT DISTINCT would count rows before deduplication; wrap it in a subquery"
                    .to_string(),
            ));
        }
        let projection = quantifier
            .filter(|w| scan.is(*w, "all"))
            .map_or(select.end, |w| w.end);

        if scan
            .words_between(select.end, scope)
            .any(|w| scan.is(w, &self.count_alias))
        {
            return Err(FunnelError::AlreadyComposed);
        }

        let paging = earliest(&scan, PAGING, scope);
        if limit.is_bounded() && paging.is_some() {
            return Err(FunnelError::UnsupportedQuery(
                "base query has its own LIMIT/OFFSET/FETCH; compose it with an unbounded limit"
                    .to_string(),
            ));
        }

        let mut edits: Vec<(usize, String)> = Vec::with_capacity(4);
        edits.push((
            projection,
            format!(" count(*) OVER() AS {},", self.count_alias),
        ));

        let mut params = base_params.to_vec();
        if !where_clause.is_empty() {
            let fragment = where_clause.render(&self.dialect, params.len() + 1);
            let existing = scan.first("where", scope);
            let anchor = existing.map_or(scope, |w| w.end);
            let pred_end = earliest(&scan, AFTER_WHERE, anchor)
                .map_or(end, |w| w.before)
                .max(anchor);

            match existing {
                Some(w) => {
                    let pred_start = skip_ws(base_sql, w.end);
                    if pred_start < pred_end {
                        let body = if where_clause.groups().len() > 1 {
                            format!("({})", fragment.sql)
                        } else {
                            fragment.sql
                        };
                        edits.push((pred_start, "(".to_string()));
                        edits.push((pred_end, format!(") AND {body}")));
                    } else {
                        edits.push((pred_end, format!(" {}", fragment.sql)));
                    }
                },
                None => edits.push((pred_end, format!(" WHERE {}", fragment.sql))),
            }
            params.extend(fragment.params);
        }

        if !order_by.is_empty() {
            let columns = order_by.render(&self.dialect);
            match scan.last_pair("order", "by", scope) {
                Some((_, by)) => edits.push((by.end, format!(" {columns},"))),
                None => {
                    let at = paging.map_or(end, |w| w.before).max(scope);
                    edits.push((at, format!(" ORDER BY {columns}")));
                },
            }
        }

        // Stable: edits at one position keep push order (WHERE before ORDER BY).
        edits.sort_by_key(|(pos, _)| *pos);

        let mut sql = String::with_capacity(base_sql.len() + 128);
        let mut cursor = 0;
        for (pos, text) in edits {
            sql.push_str(&base_sql[cursor..pos]);
            sql.push_str(&text);
            cursor = pos;
        }
        sql.push_str(&base_sql[cursor..end]);

        let tail = limit.to_sql(&self.dialect);
        if !tail.is_empty() {
            sql.push(' ');
            sql.push_str(&tail);
        }

        tracing::debug!(
            sql = %sql,
            params = params.len(),
            "composed listing query"
        );

        Ok(ComposedQuery {
            sql,
            params,
            count_alias: self.count_alias.clone(),
            count_position: projection + 1,
        })
    }
}

/// Earliest depth-0 occurrence of any keyword sequence at or after `after`.
fn earliest(scan: &Scan<'_>, keywords: &[&[&str]], after: usize) -> Option<Word> {
    keywords
        .iter()
        .filter_map(|seq| match *seq {
            [single] => scan.first(single, after),
            [first, second] => scan.first_pair(first, second, after).map(|(w, _)| w),
            _ => None,
        })
        .min_by_key(|w| w.start)
}

/// Offset of the first non-whitespace byte at or after `at`.
fn skip_ws(sql: &str, at: usize) -> usize {
    let rest = &sql[at..];
    at + (rest.len() - rest.trim_start().len())
}
