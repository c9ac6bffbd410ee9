//! Table sorting by typed column keys.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;

use crate::series::{Provider, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Title,
    Count(Provider),
    Latest(Provider),
    Next(Provider),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKeyType {
    Text,
    Integer,
    Date,
}

impl SortColumn {
    pub const ALL: [SortColumn; 7] = [
        SortColumn::Title,
        SortColumn::Count(Provider::Audible),
        SortColumn::Count(Provider::Amazon),
        SortColumn::Latest(Provider::Audible),
        SortColumn::Next(Provider::Audible),
        SortColumn::Latest(Provider::Amazon),
        SortColumn::Next(Provider::Amazon),
    ];

    /// Header key, matching the table's `data-sort` attributes.
    pub fn key(self) -> &'static str {
        match self {
            SortColumn::Title => "title",
            SortColumn::Count(Provider::Audible) => "audible",
            SortColumn::Count(Provider::Amazon) => "amazon",
            SortColumn::Latest(Provider::Audible) => "aud-latest",
            SortColumn::Next(Provider::Audible) => "aud-next",
            SortColumn::Latest(Provider::Amazon) => "amz-latest",
            SortColumn::Next(Provider::Amazon) => "amz-next",
        }
    }

    pub fn key_type(self) -> SortKeyType {
        match self {
            SortColumn::Title => SortKeyType::Text,
            SortColumn::Count(_) => SortKeyType::Integer,
            SortColumn::Latest(_) | SortColumn::Next(_) => SortKeyType::Date,
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort column '{0}'")]
pub struct ParseColumnError(pub String);

impl FromStr for SortColumn {
    type Err = ParseColumnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortColumn::ALL
            .into_iter()
            .find(|column| column.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseColumnError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Header class for the active column.
    pub fn css_class(self) -> &'static str {
        match self {
            SortDirection::Ascending => "sort-asc",
            SortDirection::Descending => "sort-desc",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    column: Option<SortColumn>,
    direction: SortDirection,
}

impl SortState {
    /// Handle a header click: the same column flips direction, a new column
    /// starts ascending.
    pub fn request(&mut self, column: SortColumn) -> SortDirection {
        if self.column == Some(column) {
            self.direction = self.direction.flip();
        } else {
            self.column = Some(column);
            self.direction = SortDirection::Ascending;
        }
        self.direction
    }

    pub fn column(&self) -> Option<SortColumn> {
        self.column
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Header indicator for `column`; only the active column has one.
    pub fn indicator(&self, column: SortColumn) -> Option<SortDirection> {
        (self.column == Some(column)).then_some(self.direction)
    }
}

/// Extracted, comparable value of one row for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SortKey {
    Text(TitleKey),
    Integer(i64),
    Date(Option<NaiveDate>),
}

/// Title under collation, with the raw title breaking collation ties.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TitleKey {
    folded: String,
    raw: String,
}

impl TitleKey {
    fn new(title: &str) -> Self {
        Self {
            folded: collation_key(title),
            raw: title.to_string(),
        }
    }
}

impl SortKey {
    fn extract(row: &Row, column: SortColumn) -> Self {
        match column {
            SortColumn::Title => SortKey::Text(TitleKey::new(&row.title)),
            SortColumn::Count(provider) => {
                SortKey::Integer(row.provider(provider).count.unwrap_or(0))
            }
            SortColumn::Latest(provider) => SortKey::Date(row.provider(provider).latest()),
            SortColumn::Next(provider) => SortKey::Date(row.provider(provider).next()),
        }
    }

    /// Ascending order. Absent dates sort after every present date.
    fn cmp_ascending(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Integer(a), SortKey::Integer(b)) => a.cmp(b),
            (SortKey::Date(a), SortKey::Date(b)) => match (a, b) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            },
            _ => Ordering::Equal,
        }
    }
}

/// Column key plus the title tie-break for one row.
#[derive(Debug, Clone)]
struct RowKey {
    key: SortKey,
    title: TitleKey,
}

impl RowKey {
    fn extract(row: &Row, column: SortColumn) -> Self {
        Self {
            key: SortKey::extract(row, column),
            title: TitleKey::new(&row.title),
        }
    }

    fn cmp_ascending(&self, other: &Self) -> Ordering {
        self.key
            .cmp_ascending(&other.key)
            .then_with(|| self.title.cmp(&other.title))
    }
}

/// Accent- and case-insensitive collation key ("Émile" sorts with "emile").
fn collation_key(value: &str) -> String {
    deunicode::deunicode(value).to_lowercase()
}

/// Compare two rows under a column and direction.
///
/// Equal column values fall back to the title, and the direction applies to
/// the whole comparison. Descending is therefore the exact reverse of
/// ascending: absent dates come last ascending and first descending, and
/// tied counts swap places too.
pub fn compare_rows(a: &Row, b: &Row, column: SortColumn, direction: SortDirection) -> Ordering {
    direction.apply(RowKey::extract(a, column).cmp_ascending(&RowKey::extract(b, column)))
}

/// Sort a projection's row order (indices into `rows`).
///
/// Rows equal on both column and title keep their collection order when
/// ascending, so the order is total and descending mirrors it exactly.
pub fn sort_order(order: &mut [usize], rows: &[Row], column: SortColumn, direction: SortDirection) {
    let keys: Vec<RowKey> = rows.iter().map(|row| RowKey::extract(row, column)).collect();
    order.sort_by(|&a, &b| direction.apply(keys[a].cmp_ascending(&keys[b]).then(a.cmp(&b))));
}
