//! Browse ordering.
//!
//! A listing is ordered by one composite key built from the selected
//! filters, in the fixed field order name, size, type, created, updated.
//! Unselected fields contribute the same value for every entry, so they
//! never affect the order.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::FileSummary;

/// Direction of the size component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeOrder {
    /// Smallest first.
    Start,
    /// Largest first.
    End,
}

/// Which fields take part in the sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrowseFilters {
    pub name: bool,
    pub size: Option<SizeOrder>,
    #[serde(rename = "type")]
    pub content_type: bool,
    pub create_date: bool,
    /// Ignored when `create_date` is set.
    pub modified_date: bool,
}

type SortKey<'a> = (
    Option<&'a str>,
    Option<SizeKey>,
    Option<&'a str>,
    Option<DateTime<Utc>>,
    Option<Option<DateTime<Utc>>>,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SizeKey {
    Ascending(i64),
    Descending(Reverse<i64>),
}

impl BrowseFilters {
    /// Whether the modification date takes part in the key.
    pub fn uses_modified_date(&self) -> bool {
        self.modified_date && !self.create_date
    }

    fn key<'a>(&self, file: &'a FileSummary) -> SortKey<'a> {
        (
            self.name.then_some(file.name.as_str()),
            self.size.map(|order| match order {
                SizeOrder::Start => SizeKey::Ascending(file.size),
                SizeOrder::End => SizeKey::Descending(Reverse(file.size)),
            }),
            self.content_type.then_some(file.content_type.as_str()),
            self.create_date.then_some(file.created_at),
            // Files never modified sort before modified ones
            self.uses_modified_date().then_some(file.updated_at),
        )
    }

    /// Sort a listing in place. The sort is stable.
    pub fn apply(&self, files: &mut [FileSummary]) {
        files.sort_by(|a, b| self.key(a).cmp(&self.key(b)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn file(id: i64, name: &str, size: i64, content_type: &str) -> FileSummary {
        FileSummary {
            id,
            name: name.to_string(),
            content_type: content_type.to_string(),
            size,
            created_at: at(id),
            updated_at: None,
            folder_id: 1,
            folder_name: "Docs".to_string(),
        }
    }

    fn ids(files: &[FileSummary]) -> Vec<i64> {
        files.iter().map(|f| f.id).collect()
    }

    fn sample() -> Vec<FileSummary> {
        vec![
            file(1, "beta", 300, "text/plain"),
            file(2, "alpha", 100, "image/png"),
            file(3, "gamma", 200, "application/pdf"),
        ]
    }

    #[test]
    fn test_no_filters_keeps_order() {
        let mut files = sample();
        BrowseFilters::default().apply(&mut files);
        assert_eq!(ids(&files), vec![1, 2, 3]);
    }

    #[test]
    fn test_size_start_and_end() {
        let mut files = sample();
        BrowseFilters {
            size: Some(SizeOrder::Start),
            ..Default::default()
        }
        .apply(&mut files);
        assert_eq!(ids(&files), vec![2, 3, 1]);

        BrowseFilters {
            size: Some(SizeOrder::End),
            ..Default::default()
        }
        .apply(&mut files);
        assert_eq!(ids(&files), vec![1, 3, 2]);
    }

    #[test]
    fn test_name_then_type() {
        let mut files = sample();
        BrowseFilters {
            name: true,
            ..Default::default()
        }
        .apply(&mut files);
        assert_eq!(ids(&files), vec![2, 1, 3]);

        BrowseFilters {
            content_type: true,
            ..Default::default()
        }
        .apply(&mut files);
        assert_eq!(ids(&files), vec![3, 2, 1]);
    }

    #[test]
    fn test_composite_key_is_single_sort() {
        let mut files = vec![
            file(1, "same", 300, "b"),
            file(2, "same", 100, "a"),
            file(3, "other", 200, "c"),
        ];
        BrowseFilters {
            name: true,
            size: Some(SizeOrder::Start),
            ..Default::default()
        }
        .apply(&mut files);
        // Name decides first; size only breaks the tie between the two "same"
        assert_eq!(ids(&files), vec![3, 2, 1]);
    }

    #[test]
    fn test_create_date_overrides_modified_date() {
        let mut files = vec![
            file(1, "a", 1, "t"),
            file(2, "b", 1, "t"),
            file(3, "c", 1, "t"),
        ];
        files[0].updated_at = Some(at(100));
        files[2].updated_at = Some(at(50));

        let filters = BrowseFilters {
            create_date: true,
            modified_date: true,
            ..Default::default()
        };
        assert!(!filters.uses_modified_date());
        filters.apply(&mut files);
        assert_eq!(ids(&files), vec![1, 2, 3]);
    }

    #[test]
    fn test_modified_date_puts_unmodified_first() {
        let mut files = vec![
            file(1, "a", 1, "t"),
            file(2, "b", 1, "t"),
            file(3, "c", 1, "t"),
        ];
        files[0].updated_at = Some(at(100));
        files[2].updated_at = Some(at(50));

        BrowseFilters {
            modified_date: true,
            ..Default::default()
        }
        .apply(&mut files);
        assert_eq!(ids(&files), vec![2, 3, 1]);
    }

    #[test]
    fn test_deserialize_filters() {
        let filters: BrowseFilters =
            serde_json::from_str(r#"{"size": "end", "type": true}"#).unwrap();
        assert_eq!(filters.size, Some(SizeOrder::End));
        assert!(filters.content_type);
        assert!(!filters.name);

        assert!(serde_json::from_str::<BrowseFilters>(r#"{"size": "middle"}"#).is_err());
    }
}
