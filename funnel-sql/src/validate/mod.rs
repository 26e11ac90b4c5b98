//! Identifier validation.
//!
//! Only column names ever reach SQL text unbound, so every name that is not
//! resolved through the configured whitelist or alias map must pass these
//! checks first.

mod column;

pub use column::{is_valid_qualified_identifier, is_valid_sql_identifier};
