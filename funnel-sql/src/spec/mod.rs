//! Request directive parsing: filters, search, sorts and pagination.
//!
//! Each spec is an immutable value built once per request from raw,
//! untrusted parameters and a [`ListingConfig`](crate::ListingConfig).
//! Invalid entries are dropped or defaulted here, never raised.

mod filter;
mod pagination;
mod sort;

pub use filter::{BETWEEN_DELIMITER, FilterOperator, FilterRequest, FilterSpec, FilterValue};
pub use pagination::PaginationSpec;
pub use sort::SortSpec;
