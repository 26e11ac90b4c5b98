//! Sort directives.

use crate::builder::{SortDir, SortField};
use crate::config::ListingConfig;

/// Parsed sort directives for one listing request, in request order.
#[derive(Debug, Clone, Default)]
pub struct SortSpec {
    sorts: Vec<SortField>,
    asc_nulls_last: bool,
    desc_nulls_last: bool,
}

impl SortSpec {
    /// Parse raw `column -> direction` entries.
    ///
    /// Directions other than exactly `asc` or `desc` and columns outside the
    /// whitelist are dropped. A column named twice keeps its first position
    /// and its last direction. When no raw entry is given at all, the
    /// configured default sorts are used instead.
    pub fn new<K, V>(config: &ListingConfig, raw_sorts: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut seen = 0usize;
        let mut entries: Vec<(String, SortDir)> = Vec::new();

        for (field, direction) in raw_sorts {
            seen += 1;
            let (field, direction) = (field.as_ref(), direction.as_ref());

            let Some(dir) = SortDir::parse(direction) else {
                tracing::debug!(field, direction, "dropping sort with invalid direction");
                continue;
            };
            if !config.is_allowed(field) {
                tracing::debug!(field, "dropping sort on column outside whitelist");
                continue;
            }

            match entries.iter_mut().find(|(name, _)| name == field) {
                Some(entry) => entry.1 = dir,
                None => entries.push((field.to_string(), dir)),
            }
        }

        if seen == 0 {
            entries = config
                .default_sorts()
                .iter()
                .map(|sort| (sort.column.clone(), sort.direction))
                .collect();
        }

        let asc_nulls_last = config.asc_nulls_last();
        let desc_nulls_last = config.desc_nulls_last();

        let sorts = entries
            .into_iter()
            .map(|(field, dir)| {
                let nulls_last = match dir {
                    SortDir::Asc => asc_nulls_last,
                    SortDir::Desc => desc_nulls_last,
                };
                SortField::new(config.resolve(&field), dir).nulls_last(nulls_last)
            })
            .collect();

        Self {
            sorts,
            asc_nulls_last,
            desc_nulls_last,
        }
    }

    /// Alias-resolved sort fields in request order.
    #[must_use]
    pub fn sorts(&self) -> &[SortField] {
        &self.sorts
    }

    /// Whether no sort survived parsing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorts.is_empty()
    }

    /// Whether ascending sorts put NULLs last.
    #[must_use]
    pub const fn is_asc_null_last(&self) -> bool {
        self.asc_nulls_last
    }

    /// Whether descending sorts put NULLs last.
    #[must_use]
    pub const fn is_desc_null_last(&self) -> bool {
        self.desc_nulls_last
    }
}
