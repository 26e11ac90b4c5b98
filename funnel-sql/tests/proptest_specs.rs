//! Property-based tests for request directive parsing using proptest.
//!
//! These tests generate random request data to check that untrusted input
//! never escapes the whitelist and that pagination always stays in range.

use funnel_sql::prelude::*;
use funnel_sql::{FilterOperator, FilterSpec};
use proptest::prelude::*;

fn config() -> ListingConfig {
    ListingConfig::builder()
        .whitelist(&["name", "age"])
        .default_limit(20)
        .max_limit_allowed(50)
        .build()
        .unwrap()
}

fn operator() -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::sample::select(FilterOperator::ALL.to_vec()).prop_map(|op| op.as_str().to_string()),
        "[a-z_]{1,12}",
    ]
}

// =============================================================================
// Whitelist Property Tests
// =============================================================================

proptest! {
    /// Columns outside the whitelist never survive filter parsing
    #[test]
    fn filters_stay_inside_whitelist(
        entries in proptest::collection::vec(("[a-z_]{1,8}", operator(), "[a-z0-9~]{1,8}"), 0..12)
    ) {
        let config = config();
        let raw: Vec<(String, String)> = entries
            .into_iter()
            .map(|(column, op, value)| (format!("{column}:{op}"), value))
            .collect();

        let spec = FilterSpec::new(&config, raw, None);
        for filter in spec.filters() {
            prop_assert!(
                filter.column == "name" || filter.column == "age",
                "column leaked: {}", filter.column
            );
        }
    }

    /// Columns outside the whitelist never survive sort parsing
    #[test]
    fn sorts_stay_inside_whitelist(
        entries in proptest::collection::vec(("[a-z_]{1,8}", "(asc|desc|ASC|up|)"), 0..12)
    ) {
        let spec = SortSpec::new(&config(), entries);
        for sort in spec.sorts() {
            prop_assert!(sort.column == "name" || sort.column == "age");
        }
    }

    /// Arbitrary request keys never reach the composed SQL text
    #[test]
    fn composed_sql_only_names_whitelisted_columns(
        column in "[a-z]{3,10}",
        value in "[ -~]{1,20}"
    ) {
        prop_assume!(column != "name" && column != "age");
        let model = ListModel::new(Postgres, config(), "SELECT * FROM heroes");
        let request = ListingRequest::new()
            .filter(format!("{column}:equals"), value.clone())
            .sort(column.clone(), "asc");

        let prepared = model.prepare(&request).unwrap();
        prop_assert_eq!(
            prepared.query.sql,
            "SELECT count(*) OVER() AS _zf_count, * FROM heroes LIMIT 20 OFFSET 0"
        );
        prop_assert!(prepared.query.params.is_empty());
    }

    /// Filter values are always bound, never written into the SQL
    #[test]
    fn values_are_bound(value in "[a-zA-Z0-9' ;-]{1,20}") {
        let model = ListModel::new(Sqlite, config(), "SELECT * FROM heroes");
        let prepared = model
            .prepare(&ListingRequest::new().filter("name:equals", value.clone()))
            .unwrap();

        prop_assert!(prepared.query.sql.contains("(name = ?1)"));
        prop_assert_eq!(prepared.query.params, vec![Value::String(value)]);
    }
}

// =============================================================================
// Pagination Property Tests
// =============================================================================

proptest! {
    /// Any numeric limit is clamped into [1, max_limit_allowed]
    #[test]
    fn limit_is_clamped(limit in any::<i64>()) {
        let spec = PaginationSpec::new(&config(), None, Some(limit.to_string().as_str()));
        prop_assert!((1..=50).contains(&spec.limit()));
    }

    /// Non-numeric or non-positive pages resolve to 1
    #[test]
    fn bad_page_is_one(page in "[a-z]{0,6}|-[0-9]{1,6}|0") {
        let spec = PaginationSpec::new(&config(), Some(page.as_str()), None);
        prop_assert_eq!(spec.current_page(), 1);
        prop_assert_eq!(spec.offset(), 0);
    }

    /// Offset is limit * (page - 1)
    #[test]
    fn offset_follows_page(page in 1u32..10_000, limit in 1u32..=50) {
        let spec = PaginationSpec::new(
            &config(),
            Some(page.to_string().as_str()),
            Some(limit.to_string().as_str()),
        );
        prop_assert_eq!(spec.offset(), u64::from(limit) * u64::from(page - 1));
    }

    /// max_page is never zero and exact multiples divide evenly
    #[test]
    fn max_page_bounds(limit in 1u32..=50, pages in 1u64..1_000, extra in 0u64..50) {
        let spec = PaginationSpec::new(&config(), None, Some(limit.to_string().as_str()));
        let exact = u64::from(limit) * pages;

        prop_assert_eq!(spec.max_page(0), 1);
        prop_assert_eq!(spec.max_page(exact), pages);
        if extra % u64::from(limit) != 0 {
            prop_assert_eq!(spec.max_page(exact + extra % u64::from(limit)), pages + 1);
        }
    }
}
