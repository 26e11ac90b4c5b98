//! Column/identifier validation logic for SQL injection prevention.

/// Maximum length for SQL identifiers (`PostgreSQL` limit is 63).
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Maximum number of dot-separated parts in a qualified name (`schema.table.column`).
const MAX_QUALIFIED_PARTS: usize = 3;

/// Validate that a string is a safe SQL identifier.
///
/// A valid SQL identifier:
/// - Starts with a letter (a-z, A-Z) or underscore
/// - Contains only letters, digits (0-9), and underscores
/// - Is not empty and not longer than 63 characters
///
/// # Examples
///
/// ```
/// use funnel_sql::is_valid_sql_identifier;
///
/// assert!(is_valid_sql_identifier("users"));
/// assert!(is_valid_sql_identifier("user_id"));
/// assert!(is_valid_sql_identifier("_private"));
///
/// assert!(!is_valid_sql_identifier(""));           // empty
/// assert!(!is_valid_sql_identifier("123abc"));     // starts with digit
/// assert!(!is_valid_sql_identifier("user.id"));    // contains dot
/// assert!(!is_valid_sql_identifier("user; DROP")); // contains special chars
/// ```
#[inline]
#[must_use]
pub fn is_valid_sql_identifier(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_IDENTIFIER_LENGTH {
        return false;
    }

    let mut chars = s.chars();

    // First character must be letter or underscore
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate a possibly dot-qualified identifier such as `h.real_name`.
///
/// Used for configured column names, which may point into a joined table.
/// Each part must be a valid identifier on its own.
///
/// ```
/// use funnel_sql::is_valid_qualified_identifier;
///
/// assert!(is_valid_qualified_identifier("name"));
/// assert!(is_valid_qualified_identifier("h.real_name"));
/// assert!(!is_valid_qualified_identifier("h..name"));
/// assert!(!is_valid_qualified_identifier("h.name; --"));
/// ```
#[must_use]
pub fn is_valid_qualified_identifier(s: &str) -> bool {
    let mut parts = 0;
    for part in s.split('.') {
        parts += 1;
        if parts > MAX_QUALIFIED_PARTS || !is_valid_sql_identifier(part) {
            return false;
        }
    }
    parts > 0
}
