use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl TimeRange {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown time range '{0}', expected one of all, today, week, month")]
pub struct ParseTimeRangeError(String);

impl FromStr for TimeRange {
    type Err = ParseTimeRangeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(ParseTimeRangeError(raw.to_owned())),
        }
    }
}

/// Parameters shared by every paginated list endpoint.
///
/// Filtering happens on the server only; the client never re-filters a page
/// it received.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub time_range: Option<TimeRange>,
    pub status: Option<String>,
    pub filters: BTreeMap<String, String>,
}

impl ListParams {
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = Some(time_range);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(name.into(), value.into());
        self
    }

    /// Query pairs sorted by name, so equal parameters always render the same.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = BTreeMap::new();
        if let Some(page) = self.page {
            pairs.insert("page".to_owned(), page.to_string());
        }
        if let Some(page_size) = self.page_size {
            pairs.insert("pageSize".to_owned(), page_size.to_string());
        }
        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            pairs.insert("search".to_owned(), search.to_owned());
        }
        if let Some(time_range) = self.time_range {
            pairs.insert("timeRange".to_owned(), time_range.to_string());
        }
        if let Some(status) = &self.status {
            pairs.insert("status".to_owned(), status.clone());
        }
        for (name, value) in &self.filters {
            pairs.entry(name.clone()).or_insert_with(|| value.clone());
        }
        pairs.into_iter().collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::{ListParams, Paginated, TimeRange};

    #[test]
    fn query_pairs_are_stable_and_skip_blank_search() {
        let params = ListParams::page(2, 25)
            .with_search("   ")
            .with_time_range(TimeRange::Week)
            .with_filter("doctor", "d-1");

        assert_eq!(
            params.to_query(),
            vec![
                ("doctor".to_owned(), "d-1".to_owned()),
                ("page".to_owned(), "2".to_owned()),
                ("pageSize".to_owned(), "25".to_owned()),
                ("timeRange".to_owned(), "week".to_owned()),
            ]
        );
    }

    #[test]
    fn reserved_names_win_over_free_form_filters() {
        let params = ListParams::page(1, 10).with_filter("page", "99");
        assert!(params.to_query().contains(&("page".to_owned(), "1".to_owned())));
    }

    #[test]
    fn time_range_parses_case_insensitively() {
        assert_eq!("Today".parse::<TimeRange>().expect("parse"), TimeRange::Today);
        assert!("fortnight".parse::<TimeRange>().is_err());
    }

    #[test]
    fn decodes_pagination_envelope() {
        let raw = r#"{
            "data": [1, 2],
            "pagination": {
                "currentPage": 1, "pageSize": 2, "totalItems": 5,
                "totalPages": 3, "hasNextPage": true, "hasPreviousPage": false
            }
        }"#;
        let page: Paginated<u32> = serde_json::from_str(raw).expect("decode page");
        assert_eq!(page.data, vec![1, 2]);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(page.pagination.has_next_page);
    }
}
