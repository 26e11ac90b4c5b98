//! SQL dialect implementations for Postgres and `SQLite`.
//!
//! Each dialect handles the specific syntax differences between databases:
//! placeholder style, case-sensitive vs case-insensitive pattern matching
//! and NULL ordering.

use crate::builder::{Operator, SortField};

/// SQL dialect trait for database-specific syntax.
pub trait Dialect: Clone + Copy {
    /// Format a parameter placeholder (e.g., `$1` for Postgres, `?1` for `SQLite`).
    fn param(&self, idx: usize) -> String;

    /// Format a pattern match on `field` against placeholder `idx`.
    ///
    /// Wildcards live in the bound value built by
    /// [`pattern_value`](Self::pattern_value), never in the SQL text.
    fn pattern_clause(&self, field: &str, case_sensitive: bool, idx: usize) -> String;

    /// Build the bound pattern for `needle`, escaping metacharacters so the
    /// needle matches literally.
    fn pattern_value(&self, needle: &str, op: Operator, case_sensitive: bool) -> String;

    /// Format one ORDER BY entry.
    fn sort_clause(&self, sort: &SortField) -> String {
        if sort.nulls_last {
            format!("{} {} NULLS LAST", sort.column, sort.dir.as_sql())
        } else {
            format!("{} {}", sort.column, sort.dir.as_sql())
        }
    }

    /// Format the pagination tail.
    fn limit_clause(&self, limit: u32, offset: u64) -> String {
        format!("LIMIT {limit} OFFSET {offset}")
    }
}

/// Escape `%`, `_` and `\` for a LIKE pattern using `\` as escape character.
fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape `*`, `?` and `[` for a GLOB pattern using bracket classes.
fn escape_glob(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    for c in needle.chars() {
        match c {
            '*' => out.push_str("[*]"),
            '?' => out.push_str("[?]"),
            '[' => out.push_str("[[]"),
            _ => out.push(c),
        }
    }
    out
}

fn wrap_pattern(escaped: &str, op: Operator, wildcard: char) -> String {
    match op {
        Operator::BeginsWith => format!("{escaped}{wildcard}"),
        Operator::EndsWith => format!("{wildcard}{escaped}"),
        _ => format!("{wildcard}{escaped}{wildcard}"),
    }
}

/// Postgres dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    #[inline]
    fn param(&self, idx: usize) -> String {
        format!("${idx}")
    }

    fn pattern_clause(&self, field: &str, case_sensitive: bool, idx: usize) -> String {
        let op = if case_sensitive { "LIKE" } else { "ILIKE" };
        format!("{field} {op} ${idx} ESCAPE '\\'")
    }

    fn pattern_value(&self, needle: &str, op: Operator, _case_sensitive: bool) -> String {
        wrap_pattern(&escape_like(needle), op, '%')
    }
}

/// `SQLite` dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    #[inline]
    fn param(&self, idx: usize) -> String {
        format!("?{idx}")
    }

    fn pattern_clause(&self, field: &str, case_sensitive: bool, idx: usize) -> String {
        // SQLite LIKE is case-insensitive for ASCII; GLOB is case-sensitive
        if case_sensitive {
            format!("{field} GLOB ?{idx}")
        } else {
            format!("{field} LIKE ?{idx} ESCAPE '\\'")
        }
    }

    fn pattern_value(&self, needle: &str, op: Operator, case_sensitive: bool) -> String {
        if case_sensitive {
            wrap_pattern(&escape_glob(needle), op, '*')
        } else {
            wrap_pattern(&escape_like(needle), op, '%')
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SortDir;

    #[test]
    fn test_postgres_params() {
        let pg = Postgres;
        assert_eq!(pg.param(1), "$1");
        assert_eq!(pg.param(10), "$10");
    }

    #[test]
    fn test_sqlite_params() {
        let sqlite = Sqlite;
        assert_eq!(sqlite.param(1), "?1");
        assert_eq!(sqlite.param(10), "?10");
    }

    #[test]
    fn test_postgres_pattern_clause() {
        let pg = Postgres;
        assert_eq!(pg.pattern_clause("name", false, 1), "name ILIKE $1 ESCAPE '\\'");
        assert_eq!(pg.pattern_clause("name", true, 2), "name LIKE $2 ESCAPE '\\'");
    }

    #[test]
    fn test_sqlite_pattern_clause() {
        let sqlite = Sqlite;
        assert_eq!(
            sqlite.pattern_clause("name", false, 1),
            "name LIKE ?1 ESCAPE '\\'"
        );
        assert_eq!(sqlite.pattern_clause("name", true, 3), "name GLOB ?3");
    }

    #[test]
    fn test_like_pattern_values() {
        let pg = Postgres;
        assert_eq!(pg.pattern_value("man", Operator::Contains, false), "%man%");
        assert_eq!(pg.pattern_value("Bat", Operator::BeginsWith, false), "Bat%");
        assert_eq!(pg.pattern_value("man", Operator::EndsWith, true), "%man");
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        let sqlite = Sqlite;
        assert_eq!(
            sqlite.pattern_value("50%_off\\", Operator::Contains, false),
            "%50\\%\\_off\\\\%"
        );
    }

    #[test]
    fn test_glob_pattern_values() {
        let sqlite = Sqlite;
        assert_eq!(sqlite.pattern_value("Man", Operator::Contains, true), "*Man*");
        assert_eq!(sqlite.pattern_value("a*b?[c]", Operator::BeginsWith, true), "a[*]b[?][[]c]*");
    }

    #[test]
    fn test_sort_clause_nulls() {
        let pg = Postgres;
        let plain = SortField::new("name", SortDir::Asc);
        let last = SortField::new("born", SortDir::Desc).nulls_last(true);

        assert_eq!(pg.sort_clause(&plain), "name ASC");
        assert_eq!(pg.sort_clause(&last), "born DESC NULLS LAST");
    }

    #[test]
    fn test_limit_clause() {
        assert_eq!(Sqlite.limit_clause(50, 0), "LIMIT 50 OFFSET 0");
        assert_eq!(Postgres.limit_clause(10, 30), "LIMIT 10 OFFSET 30");
    }
}
