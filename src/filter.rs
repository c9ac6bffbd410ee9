//! Row visibility: checkbox filters and free-text search.
//!
//! Both predicates gate visibility together. Whenever either changes the
//! dashboard re-evaluates the combined predicate for every row, so an active
//! search survives a filter toggle and vice versa.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::series::{Provider, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterToggle {
    /// Only rows with an upcoming Audible release.
    AudibleUpcoming,
    /// Only rows with an upcoming Amazon release.
    AmazonUpcoming,
    /// Only rows with any upcoming release.
    AnyUpcoming,
    /// Only rows with no upcoming release.
    NoUpcoming,
}

impl FilterToggle {
    pub const ALL: [FilterToggle; 4] = [
        FilterToggle::AudibleUpcoming,
        FilterToggle::AmazonUpcoming,
        FilterToggle::AnyUpcoming,
        FilterToggle::NoUpcoming,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FilterToggle::AudibleUpcoming => "aud-next",
            FilterToggle::AmazonUpcoming => "amz-next",
            FilterToggle::AnyUpcoming => "any-upcoming",
            FilterToggle::NoUpcoming => "no-next",
        }
    }
}

impl fmt::Display for FilterToggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown filter '{0}' (expected aud-next, amz-next, any-upcoming or no-next)")]
pub struct ParseFilterError(pub String);

impl FromStr for FilterToggle {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterToggle::ALL
            .into_iter()
            .find(|toggle| toggle.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseFilterError(s.to_string()))
    }
}

/// Four independent checkbox toggles; all start inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterState {
    pub audible_upcoming: bool,
    pub amazon_upcoming: bool,
    pub any_upcoming: bool,
    pub no_upcoming: bool,
}

impl FilterState {
    pub fn set(&mut self, toggle: FilterToggle, active: bool) {
        match toggle {
            FilterToggle::AudibleUpcoming => self.audible_upcoming = active,
            FilterToggle::AmazonUpcoming => self.amazon_upcoming = active,
            FilterToggle::AnyUpcoming => self.any_upcoming = active,
            FilterToggle::NoUpcoming => self.no_upcoming = active,
        }
    }

    pub fn is_active(&self, toggle: FilterToggle) -> bool {
        match toggle {
            FilterToggle::AudibleUpcoming => self.audible_upcoming,
            FilterToggle::AmazonUpcoming => self.amazon_upcoming,
            FilterToggle::AnyUpcoming => self.any_upcoming,
            FilterToggle::NoUpcoming => self.no_upcoming,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// A row passes when it satisfies every active toggle.
    pub fn matches(&self, row: &Row) -> bool {
        let has_aud = row.has_upcoming(Provider::Audible);
        let has_amz = row.has_upcoming(Provider::Amazon);
        let any = has_aud || has_amz;

        !(self.audible_upcoming && !has_aud
            || self.amazon_upcoming && !has_amz
            || self.any_upcoming && !any
            || self.no_upcoming && any)
    }
}

/// Case-insensitive title search. An empty query matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    pub fn new(term: &str) -> Self {
        Self {
            needle: term.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn term(&self) -> &str {
        &self.needle
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.is_empty() || row.title.to_lowercase().contains(&self.needle)
    }
}

/// Combined visibility of every row under a filter state and search query.
pub fn visibility(rows: &[Row], filters: &FilterState, search: &SearchQuery) -> Vec<bool> {
    rows.iter()
        .map(|row| filters.matches(row) && search.matches(row))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Row> {
        vec![
            Row::new("Dungeon Crawler Carl")
                .with_dates(Provider::Audible, None, Some("2024-05-01"))
                .with_dates(Provider::Amazon, None, Some("2024-06-01")),
            Row::new("He Who Fights With Monsters")
                .with_dates(Provider::Audible, None, Some("2024-05-10")),
            Row::new("Cradle").with_dates(Provider::Amazon, None, Some("2024-07-01")),
            Row::new("Mother of Learning").with_dates(Provider::Audible, Some("2020-01-01"), Some("n/a")),
        ]
    }

    fn visible_titles(filters: &FilterState, search: &SearchQuery) -> Vec<String> {
        let rows = rows();
        rows.iter()
            .zip(visibility(&rows, filters, search))
            .filter(|(_, visible)| *visible)
            .map(|(row, _)| row.title.clone())
            .collect()
    }

    // ==================== Filter Tests ====================

    #[test]
    fn test_no_filters_shows_everything() {
        let shown = visible_titles(&FilterState::default(), &SearchQuery::default());
        assert_eq!(shown.len(), 4);
    }

    #[test]
    fn test_single_provider_filters() {
        let mut filters = FilterState::default();
        filters.set(FilterToggle::AudibleUpcoming, true);
        assert_eq!(
            visible_titles(&filters, &SearchQuery::default()),
            vec!["Dungeon Crawler Carl", "He Who Fights With Monsters"]
        );

        filters.clear();
        filters.set(FilterToggle::AmazonUpcoming, true);
        assert_eq!(
            visible_titles(&filters, &SearchQuery::default()),
            vec!["Dungeon Crawler Carl", "Cradle"]
        );
    }

    #[test]
    fn test_filters_combine_with_and() {
        let mut filters = FilterState::default();
        filters.set(FilterToggle::AudibleUpcoming, true);
        filters.set(FilterToggle::AmazonUpcoming, true);

        assert_eq!(
            visible_titles(&filters, &SearchQuery::default()),
            vec!["Dungeon Crawler Carl"]
        );
    }

    #[test]
    fn test_contradictory_filters_hide_everything() {
        let mut filters = FilterState::default();
        filters.set(FilterToggle::AnyUpcoming, true);
        filters.set(FilterToggle::NoUpcoming, true);

        assert!(visible_titles(&filters, &SearchQuery::default()).is_empty());
    }

    #[test]
    fn test_no_upcoming_filter() {
        let mut filters = FilterState::default();
        filters.set(FilterToggle::NoUpcoming, true);

        assert_eq!(
            visible_titles(&filters, &SearchQuery::default()),
            vec!["Mother of Learning"]
        );
    }

    #[test]
    fn test_clear_resets_every_toggle() {
        let mut filters = FilterState::default();
        for toggle in FilterToggle::ALL {
            filters.set(toggle, true);
            assert!(filters.is_active(toggle));
        }
        filters.clear();
        assert_eq!(filters, FilterState::default());
    }

    #[test]
    fn test_parse_filter_toggle() {
        assert_eq!("any-upcoming".parse::<FilterToggle>(), Ok(FilterToggle::AnyUpcoming));
        assert_eq!(" NO-NEXT ".parse::<FilterToggle>(), Ok(FilterToggle::NoUpcoming));
        assert!("upcoming".parse::<FilterToggle>().is_err());
    }

    // ==================== Search Tests ====================

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let search = SearchQuery::new("  CARL ");
        assert_eq!(search.term(), "carl");
        assert_eq!(
            visible_titles(&FilterState::default(), &search),
            vec!["Dungeon Crawler Carl"]
        );
    }

    #[test]
    fn test_search_and_filter_both_apply() {
        let mut filters = FilterState::default();
        filters.set(FilterToggle::AudibleUpcoming, true);
        let search = SearchQuery::new("of");

        // "Mother of Learning" matches the search but fails the filter
        assert!(visible_titles(&filters, &search).is_empty());

        let search = SearchQuery::new("monsters");
        assert_eq!(
            visible_titles(&filters, &search),
            vec!["He Who Fights With Monsters"]
        );
    }
}
