//! Row data model: one tracked series with release data from two providers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates;

/// One of the two stores whose release dates are tracked per series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Provider {
    Audible,
    Amazon,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Audible, Provider::Amazon];

    /// Short key used in page attributes and CSS classes (`aud`, `amz`).
    pub fn key(self) -> &'static str {
        match self {
            Provider::Audible => "aud",
            Provider::Amazon => "amz",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Provider::Audible => "Audible",
            Provider::Amazon => "Amazon",
        }
    }
}

/// Raw release data for one provider. Dates are kept exactly as supplied
/// and normalized on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderRelease {
    pub count: Option<i64>,
    pub latest_date: Option<String>,
    pub latest_title: Option<String>,
    pub next_date: Option<String>,
    pub next_title: Option<String>,
}

impl ProviderRelease {
    pub fn latest(&self) -> Option<NaiveDate> {
        dates::parse_opt(self.latest_date.as_deref())
    }

    pub fn next(&self) -> Option<NaiveDate> {
        dates::parse_opt(self.next_date.as_deref())
    }

    pub fn has_upcoming(&self) -> bool {
        self.next().is_some()
    }
}

/// A series as displayed by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub title: String,
    pub audible: ProviderRelease,
    pub amazon: ProviderRelease,
}

impl Row {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn provider(&self, provider: Provider) -> &ProviderRelease {
        match provider {
            Provider::Audible => &self.audible,
            Provider::Amazon => &self.amazon,
        }
    }

    pub fn provider_mut(&mut self, provider: Provider) -> &mut ProviderRelease {
        match provider {
            Provider::Audible => &mut self.audible,
            Provider::Amazon => &mut self.amazon,
        }
    }

    pub fn has_upcoming(&self, provider: Provider) -> bool {
        self.provider(provider).has_upcoming()
    }

    pub fn has_any_upcoming(&self) -> bool {
        Provider::ALL.iter().any(|p| self.has_upcoming(*p))
    }

    /// Build a row from the string-keyed attributes rendered on the page
    /// (`title`, `audNext`, `audLatest`, `audCount`, `amzNext`, ...).
    ///
    /// Unknown keys are ignored. Counts keep only their leading integer.
    pub fn from_attributes<'a>(attrs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut row = Row::default();
        for (key, value) in attrs {
            match key {
                "title" => row.title = value.to_string(),
                "audNext" => row.audible.next_date = Some(value.to_string()),
                "audLatest" => row.audible.latest_date = Some(value.to_string()),
                "audCount" => row.audible.count = parse_leading_int(value),
                "amzNext" => row.amazon.next_date = Some(value.to_string()),
                "amzLatest" => row.amazon.latest_date = Some(value.to_string()),
                "amzCount" => row.amazon.count = parse_leading_int(value),
                _ => {}
            }
        }
        row
    }

    /// Builder-style setter used heavily by tests and fixtures.
    pub fn with_dates(
        mut self,
        provider: Provider,
        latest: Option<&str>,
        next: Option<&str>,
    ) -> Self {
        let release = self.provider_mut(provider);
        release.latest_date = latest.map(str::to_string);
        release.next_date = next.map(str::to_string);
        self
    }

    pub fn with_count(mut self, provider: Provider, count: i64) -> Self {
        self.provider_mut(provider).count = Some(count);
        self
    }

    pub fn with_titles(
        mut self,
        provider: Provider,
        latest: Option<&str>,
        next: Option<&str>,
    ) -> Self {
        let release = self.provider_mut(provider);
        release.latest_title = latest.map(str::to_string);
        release.next_title = next.map(str::to_string);
        self
    }
}

/// Parse the leading integer of a string (`"12 books"` → 12).
///
/// Returns `None` when no digits lead the (trimmed) value.
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Series record as served by `/api/series`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SeriesInfo {
    pub title: String,

    #[serde(default)]
    pub audible_count: i64,
    #[serde(default)]
    pub audible_latest_title: String,
    #[serde(default)]
    pub audible_latest_date: Option<String>,
    #[serde(default)]
    pub audible_next_title: String,
    #[serde(default)]
    pub audible_next_date: Option<String>,

    #[serde(default)]
    pub amazon_count: i64,
    #[serde(default)]
    pub amazon_latest_title: String,
    #[serde(default)]
    pub amazon_latest_date: Option<String>,
    #[serde(default)]
    pub amazon_next_title: String,
    #[serde(default)]
    pub amazon_next_date: Option<String>,

    #[serde(rename = "AudibleID", default)]
    pub audible_id: String,
    #[serde(rename = "AmazonASIN", default)]
    pub amazon_asin: String,
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl From<SeriesInfo> for Row {
    fn from(info: SeriesInfo) -> Self {
        Row {
            title: info.title,
            audible: ProviderRelease {
                count: Some(info.audible_count),
                latest_date: info.audible_latest_date,
                latest_title: non_empty(info.audible_latest_title),
                next_date: info.audible_next_date,
                next_title: non_empty(info.audible_next_title),
            },
            amazon: ProviderRelease {
                count: Some(info.amazon_count),
                latest_date: info.amazon_latest_date,
                latest_title: non_empty(info.amazon_latest_title),
                next_date: info.amazon_next_date,
                next_title: non_empty(info.amazon_next_title),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("12"), Some(12));
        assert_eq!(parse_leading_int("  7 books"), Some(7));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("n/a"), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn test_from_attributes() {
        let row = Row::from_attributes([
            ("title", "The Wandering Inn"),
            ("audNext", "2024-05-01"),
            ("audLatest", "none"),
            ("audCount", "9"),
            ("amzNext", "—"),
            ("amzCount", ""),
            ("data-unknown", "ignored"),
        ]);

        assert_eq!(row.title, "The Wandering Inn");
        assert_eq!(row.audible.count, Some(9));
        assert!(row.has_upcoming(Provider::Audible));
        assert!(!row.has_upcoming(Provider::Amazon));
        assert_eq!(row.audible.latest(), None);
        assert_eq!(row.amazon.count, None);
        assert!(row.has_any_upcoming());
    }

    #[test]
    fn test_series_info_deserializes_backend_shape() {
        let body = r#"{
            "Title": "Cradle",
            "AudibleCount": 12,
            "AudibleLatestTitle": "Waybound",
            "AudibleLatestDate": "2023-11-28T00:00:00Z",
            "AudibleNextTitle": "",
            "AudibleNextDate": null,
            "AmazonCount": 12,
            "AmazonLatestTitle": "Waybound",
            "AmazonLatestDate": "2023-11-28T00:00:00Z",
            "AmazonNextTitle": "Side Story",
            "AmazonNextDate": "2025-02-01T00:00:00Z",
            "AudibleID": "B0ABC",
            "AmazonASIN": "B0XYZ",
            "Err": null
        }"#;

        let info: SeriesInfo = serde_json::from_str(body).unwrap();
        assert_eq!(info.audible_id, "B0ABC");

        let row = Row::from(info);
        assert_eq!(row.title, "Cradle");
        assert_eq!(row.audible.count, Some(12));
        assert_eq!(row.audible.next_title, None);
        assert!(!row.has_upcoming(Provider::Audible));
        assert_eq!(
            row.amazon.next(),
            NaiveDate::from_ymd_opt(2025, 2, 1)
        );
        assert_eq!(row.amazon.next_title.as_deref(), Some("Side Story"));
    }

    #[test]
    fn test_provider_keys() {
        assert_eq!(Provider::Audible.key(), "aud");
        assert_eq!(Provider::Amazon.key(), "amz");
        assert_eq!(Provider::ALL.len(), 2);
    }
}
