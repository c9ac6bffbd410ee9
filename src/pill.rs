//! Pill labels: the countdown / absolute-date badges shown per release date.

use chrono::NaiveDate;

use crate::dates::{self, ABSENT_MARKER};
use crate::series::Provider;

/// Text of a next-release pill with no date.
pub const ABSENT_NEXT_TEXT: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PillKind {
    /// Upcoming release, rendered as a countdown.
    Next,
    /// Most recent release, rendered as an age.
    Latest,
}

/// Visual category of a pill. Only next-release pills with a date are colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PillCategory {
    None,
    Provider(Provider),
}

impl PillCategory {
    pub fn css_class(self) -> &'static str {
        match self {
            PillCategory::None => "next-none",
            PillCategory::Provider(Provider::Audible) => "next-aud",
            PillCategory::Provider(Provider::Amazon) => "next-amz",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pill {
    pub text: String,
    /// Always the absolute date (or the absent marker), whatever the display mode.
    pub tooltip: String,
    pub category: PillCategory,
}

impl Pill {
    fn absent(kind: PillKind) -> Self {
        let text = match kind {
            PillKind::Next => ABSENT_NEXT_TEXT,
            PillKind::Latest => ABSENT_MARKER,
        };
        Self {
            text: text.to_string(),
            tooltip: ABSENT_MARKER.to_string(),
            category: PillCategory::None,
        }
    }
}

/// Render one date-like value as a pill.
pub fn format_pill(
    value: Option<&str>,
    kind: PillKind,
    provider: Provider,
    show_relative: bool,
    today: NaiveDate,
) -> Pill {
    let Some(date) = dates::parse_opt(value) else {
        return Pill::absent(kind);
    };

    let absolute = dates::format_absolute(date);
    let left = dates::days_until(date, today);

    let text = match (kind, show_relative) {
        (_, false) => absolute.clone(),
        (PillKind::Next, true) if left > 0 => format!("{left}d"),
        (PillKind::Next, true) => "soon".to_string(),
        (PillKind::Latest, true) if -left > 0 => format!("{}d ago", -left),
        (PillKind::Latest, true) => "today".to_string(),
    };

    let category = match kind {
        PillKind::Next => PillCategory::Provider(provider),
        PillKind::Latest => PillCategory::None,
    };

    Pill {
        text,
        tooltip: absolute,
        category,
    }
}

/// Text for the "soonest release" tile.
pub fn soonest_text(soonest: Option<NaiveDate>, show_relative: bool, today: NaiveDate) -> String {
    match soonest {
        Some(date) if show_relative => format!("in {} days", dates::days_until(date, today)),
        other => dates::format_absolute_or_marker(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 19).unwrap()
    }

    fn next(value: &str, relative: bool) -> Pill {
        format_pill(Some(value), PillKind::Next, Provider::Audible, relative, today())
    }

    fn latest(value: &str, relative: bool) -> Pill {
        format_pill(Some(value), PillKind::Latest, Provider::Amazon, relative, today())
    }

    // ==================== Next Pill Tests ====================

    #[test]
    fn test_next_tomorrow_relative_and_absolute() {
        let relative = next("2024-03-20", true);
        let absolute = next("2024-03-20", false);

        assert_eq!(relative.text, "1d");
        assert_eq!(absolute.text, "Mar 20, 2024");
        assert_eq!(relative.tooltip, absolute.tooltip);
        assert_eq!(relative.tooltip, "Mar 20, 2024");
    }

    #[test]
    fn test_next_today_or_past_is_soon() {
        assert_eq!(next("2024-03-19", true).text, "soon");
        assert_eq!(next("2024-03-01", true).text, "soon");
    }

    #[test]
    fn test_next_category_follows_provider() {
        let aud = format_pill(Some("2024-04-01"), PillKind::Next, Provider::Audible, false, today());
        let amz = format_pill(Some("2024-04-01"), PillKind::Next, Provider::Amazon, false, today());

        assert_eq!(aud.category.css_class(), "next-aud");
        assert_eq!(amz.category.css_class(), "next-amz");
    }

    #[test]
    fn test_absent_next_pill() {
        for value in [None, Some("none"), Some("n/a"), Some("")] {
            let pill = format_pill(value, PillKind::Next, Provider::Amazon, true, today());
            assert_eq!(pill.text, ABSENT_NEXT_TEXT);
            assert_eq!(pill.category, PillCategory::None);
            assert_eq!(pill.tooltip, ABSENT_MARKER);
        }
    }

    // ==================== Latest Pill Tests ====================

    #[test]
    fn test_latest_relative() {
        assert_eq!(latest("2024-03-16", true).text, "3d ago");
        assert_eq!(latest("2024-03-19", true).text, "today");
        // A "latest" date in the future still reads as today
        assert_eq!(latest("2024-03-25", true).text, "today");
    }

    #[test]
    fn test_latest_absolute_has_no_category() {
        let pill = latest("2024-03-16", false);
        assert_eq!(pill.text, "Mar 16, 2024");
        assert_eq!(pill.category, PillCategory::None);
    }

    #[test]
    fn test_absent_latest_pill() {
        let pill = format_pill(None, PillKind::Latest, Provider::Audible, false, today());
        assert_eq!(pill.text, ABSENT_MARKER);
    }

    // ==================== Soonest Tile Tests ====================

    #[test]
    fn test_soonest_text() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 24);
        assert_eq!(soonest_text(date, true, today()), "in 5 days");
        assert_eq!(soonest_text(date, false, today()), "Mar 24, 2024");
        assert_eq!(soonest_text(None, true, today()), ABSENT_MARKER);
    }
}
