//! Shared condition rendering functions.

use super::types::{Condition, ConditionGroup, Operator, Value};
use crate::dialect::Dialect;

/// Render a group of OR-ed conditions as one parenthesized fragment.
pub(super) fn render_group_impl<D: Dialect>(
    dialect: &D,
    group: &ConditionGroup,
    start_idx: usize,
) -> (String, Vec<Value>, usize) {
    let mut idx = start_idx;
    let mut all_params = Vec::new();
    let mut conditions = Vec::with_capacity(group.conditions.len());

    for condition in &group.conditions {
        let (sql, params, new_idx) = render_condition_impl(dialect, condition, idx);
        conditions.push(sql);
        all_params.extend(params);
        idx = new_idx;
    }

    (format!("({})", conditions.join(" OR ")), all_params, idx)
}

/// Render a single condition.
pub(super) fn render_condition_impl<D: Dialect>(
    dialect: &D,
    condition: &Condition,
    start_idx: usize,
) -> (String, Vec<Value>, usize) {
    let column = &condition.column;
    let idx = start_idx;

    match (condition.op, &condition.value) {
        (Operator::Between, Value::Array(values)) => {
            if values.len() != 2 {
                // Safe fallback that matches nothing
                return (
                    format!("1=0 /* BETWEEN requires 2 values, got {} */", values.len()),
                    vec![],
                    idx,
                );
            }
            let sql = format!(
                "{} BETWEEN {} AND {}",
                column,
                dialect.param(idx),
                dialect.param(idx + 1)
            );
            (sql, values.clone(), idx + 2)
        },
        (Operator::Between, _) => (
            "1=0 /* BETWEEN requires 2 values, got 1 */".to_string(),
            vec![],
            idx,
        ),

        (op, value) if op.is_pattern() => {
            let needle = needle_text(value);
            let pattern = dialect.pattern_value(&needle, op, condition.case_sensitive);
            let sql = dialect.pattern_clause(column, condition.case_sensitive, idx);
            (sql, vec![Value::String(pattern)], idx + 1)
        },

        (op, value) => {
            let op_str = match op {
                Operator::Gt => ">",
                Operator::Gte => ">=",
                Operator::Lt => "<",
                Operator::Lte => "<=",
                _ => "=",
            };
            let sql = format!("{} {} {}", column, op_str, dialect.param(idx));
            (sql, vec![value.clone()], idx + 1)
        },
    }
}

/// Text a pattern operator searches for.
fn needle_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) => String::new(),
    }
}
