//! Compile parsed filter directives into condition groups.

use super::clause::WhereClause;
use super::types::{Condition, ConditionGroup, Operator, Value};
use crate::config::ListingConfig;
use crate::error::FunnelError;
use crate::spec::{BETWEEN_DELIMITER, FilterOperator, FilterRequest, FilterSpec, FilterValue};

/// Turns [`FilterRequest`]s and the search term into a [`WhereClause`].
#[derive(Debug, Clone, Copy)]
pub struct ConditionCompiler<'a> {
    config: &'a ListingConfig,
}

impl<'a> ConditionCompiler<'a> {
    /// Create a compiler for one configuration.
    #[must_use]
    pub const fn new(config: &'a ListingConfig) -> Self {
        Self { config }
    }

    /// Compile one filter directive.
    ///
    /// Fails only for a `between` value that did not split into two bounds.
    pub fn filter(&self, request: &FilterRequest) -> Result<Condition, FunnelError> {
        let op = match request.operator {
            FilterOperator::Contains | FilterOperator::SensibleContains => Operator::Contains,
            FilterOperator::Begins | FilterOperator::SensibleBegins => Operator::BeginsWith,
            FilterOperator::Ends | FilterOperator::SensibleEnds => Operator::EndsWith,
            FilterOperator::Equals => Operator::Eq,
            FilterOperator::Less => Operator::Lt,
            FilterOperator::Greater => Operator::Gt,
            FilterOperator::LessEquals => Operator::Lte,
            FilterOperator::GreaterEquals => Operator::Gte,
            FilterOperator::Between => Operator::Between,
        };

        let value = match (op, &request.value) {
            (Operator::Between, FilterValue::Range(low, high)) => {
                Value::Array(vec![Value::from(low.as_str()), Value::from(high.as_str())])
            },
            (Operator::Between, FilterValue::Single(raw)) => {
                return Err(FunnelError::MalformedFilterValue {
                    column: request.field.clone(),
                    value: raw.clone(),
                });
            },
            (_, FilterValue::Single(raw)) => Value::from(raw.as_str()),
            (_, FilterValue::Range(low, high)) => {
                Value::String(format!("{low}{BETWEEN_DELIMITER}{high}"))
            },
        };

        Ok(Condition::new(request.column.as_str(), op, value)
            .case_sensitive(request.operator.is_case_sensitive()))
    }

    /// One case-insensitive `contains` condition per searchable column.
    #[must_use]
    pub fn search(&self, term: &str) -> ConditionGroup {
        ConditionGroup::new(
            self.config
                .searchable_columns()
                .iter()
                .map(|column| Condition::new(column.as_str(), Operator::Contains, term.into()))
                .collect(),
        )
    }

    /// Compile a whole filter spec.
    ///
    /// Filters on the same column form one OR group, in the order the column
    /// first appeared; the search group comes last. Groups are joined with
    /// the configured aggregate operator.
    pub fn where_clause(&self, spec: &FilterSpec) -> Result<WhereClause, FunnelError> {
        let mut groups: Vec<(String, Vec<Condition>)> = Vec::new();

        for request in spec.filters() {
            let condition = self.filter(request)?;
            match groups.iter_mut().find(|(column, _)| *column == request.column) {
                Some((_, conditions)) => conditions.push(condition),
                None => groups.push((request.column.clone(), vec![condition])),
            }
        }

        let mut clause = WhereClause::new(self.config.aggregate_operator());
        for (_, conditions) in groups {
            clause.push(ConditionGroup::new(conditions));
        }
        if let Some(term) = spec.search() {
            clause.push(self.search(term));
        }

        Ok(clause)
    }
}
