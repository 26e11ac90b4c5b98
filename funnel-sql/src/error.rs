//! Error types for configuration and query composition.

use thiserror::Error;

/// Boxed error returned by a [`Database`](crate::Database) collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Programmer errors detected while building a [`ListingConfig`](crate::ListingConfig).
///
/// These are raised at construction time, never deferred to query time.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// `max_limit_allowed` is smaller than `default_limit`.
    #[error("max_limit_allowed ({max_limit_allowed}) must not be smaller than default_limit ({default_limit})")]
    LimitOutOfRange {
        /// Configured default page size.
        default_limit: u32,
        /// Configured page size ceiling.
        max_limit_allowed: u32,
    },
    /// `default_limit` is zero.
    #[error("default_limit must be at least 1")]
    ZeroLimit,
    /// A configured column or alias is not a safe SQL identifier.
    #[error("invalid SQL identifier '{name}' in {context}")]
    InvalidIdentifier {
        /// Which option the name came from.
        context: &'static str,
        /// The rejected name.
        name: String,
    },
    /// The TOML document could not be parsed.
    #[error("invalid listing configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors raised while compiling or executing a listing query.
///
/// Untrusted request data never produces one of these except for a
/// malformed `between` value; everything else is dropped or defaulted.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FunnelError {
    /// A `between` filter value did not split into exactly two bounds.
    #[error("malformed value '{value}' for between filter on '{column}': expected 'low~high'")]
    MalformedFilterValue {
        /// Request-facing column name.
        column: String,
        /// The raw value as received.
        value: String,
    },
    /// The base statement cannot be augmented.
    #[error("unsupported base query: {0}")]
    UnsupportedQuery(String),
    /// The base statement already projects the total-count column.
    #[error("base query already carries the total-count column; compose only once per statement")]
    AlreadyComposed,
    /// The database collaborator failed; the original error is the source.
    #[error("query execution failed")]
    Execution(#[source] BoxError),
}

impl FunnelError {
    /// Wrap a database error without altering it.
    pub fn execution<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Execution(Box::new(err))
    }
}
