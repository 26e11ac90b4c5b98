//! Condition compilation and clause rendering with parameterization.

mod clause;
mod condition;
mod render;
mod types;

// Re-export all public items
pub use clause::{LimitClause, OrderByClause, WhereClause};
pub use condition::ConditionCompiler;
pub use types::{
    Condition, ConditionGroup, Fragment, LogicalOp, Operator, SortDir, SortField, Value,
};
