//! Application state for one dashboard session.
//!
//! [`Dashboard`] owns the row collection and every piece of view state
//! (preferences, filters, search, sort, decoration). Rows are the single
//! source of truth; the table and card views are projections over them that
//! differ only in row order. Commands mutate state and re-derive only the
//! outputs they own. Queries never mutate.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::aggregate::{self, Decoration, RowPills, TileMetric, TileSink, Tiles};
use crate::filter::{self, FilterState, FilterToggle, SearchQuery};
use crate::series::Row;
use crate::settings::{Preferences, SettingsStore, Theme};
use crate::sort::{self, SortColumn, SortDirection, SortState};
use crate::traits::Clock;

/// The two presentations of the row collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// Detailed table with sortable headers.
    #[default]
    Table,
    /// Compact card list.
    Cards,
}

impl ViewKind {
    pub const ALL: [ViewKind; 2] = [ViewKind::Table, ViewKind::Cards];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewKind::Table => "table",
            ViewKind::Cards => "cards",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown view '{0}' (expected table or cards)")]
pub struct ParseViewError(pub String);

impl FromStr for ViewKind {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(ViewKind::Table),
            "cards" | "card" => Ok(ViewKind::Cards),
            _ => Err(ParseViewError(s.to_string())),
        }
    }
}

/// One visible entry of a projection.
#[derive(Debug, Clone, Copy)]
pub struct ProjectedRow<'a> {
    /// Position in the underlying collection.
    pub index: usize,
    pub row: &'a Row,
    pub pills: &'a RowPills,
}

pub struct Dashboard {
    rows: Vec<Row>,
    settings: SettingsStore,
    filters: FilterState,
    search: SearchQuery,
    sort: SortState,
    active_view: ViewKind,
    table_order: Vec<usize>,
    card_order: Vec<usize>,
    visible: Vec<bool>,
    decoration: Decoration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dashboard")
            .field("rows", &self.rows.len())
            .field("settings", &self.settings)
            .field("filters", &self.filters)
            .field("search", &self.search)
            .field("sort", &self.sort)
            .field("active_view", &self.active_view)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Boot a session: preferences are already restored in `settings`, and
    /// the first decoration pass runs here.
    pub fn new(rows: Vec<Row>, settings: SettingsStore, clock: Arc<dyn Clock>) -> Self {
        let prefs = settings.preferences();
        let decoration = aggregate::decorate_rows(&rows, prefs.show_relative_days, clock.today());
        let identity: Vec<usize> = (0..rows.len()).collect();

        tracing::info!(rows = rows.len(), ?prefs, "Dashboard initialized");

        Self {
            visible: vec![true; rows.len()],
            table_order: identity.clone(),
            card_order: identity,
            rows,
            settings,
            filters: FilterState::default(),
            search: SearchQuery::default(),
            sort: SortState::default(),
            active_view: ViewKind::default(),
            decoration,
            clock,
        }
    }

    // ==================== Commands ====================

    /// Recompute every pill and the summary tiles against the current day.
    pub fn decorate_all(&mut self) {
        let prefs = self.settings.preferences();
        self.decoration =
            aggregate::decorate_rows(&self.rows, prefs.show_relative_days, self.clock.today());
    }

    /// Re-evaluate filters and search together for every row.
    pub fn apply_filters(&mut self) {
        self.visible = filter::visibility(&self.rows, &self.filters, &self.search);
        tracing::debug!(
            visible = self.visible_count(),
            total = self.rows.len(),
            "Applied filters"
        );
    }

    pub fn set_filter(&mut self, toggle: FilterToggle, active: bool) {
        self.filters.set(toggle, active);
        self.apply_filters();
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.apply_filters();
    }

    pub fn apply_search(&mut self, term: &str) {
        self.search = SearchQuery::new(term);
        self.apply_filters();
    }

    /// Handle a sort request. Reorders only the active view's projection.
    pub fn sort_by(&mut self, column: SortColumn) -> SortDirection {
        let direction = self.sort.request(column);
        let order = match self.active_view {
            ViewKind::Table => &mut self.table_order,
            ViewKind::Cards => &mut self.card_order,
        };
        sort::sort_order(order, &self.rows, column, direction);
        tracing::debug!(%column, ?direction, view = %self.active_view, "Sorted rows");
        direction
    }

    pub fn set_active_view(&mut self, view: ViewKind) {
        self.active_view = view;
    }

    /// Switch countdown mode; every pill is mode-dependent so this re-decorates.
    pub fn toggle_relative_days(&mut self, on: bool) {
        if self.settings.set_show_relative_days(on) {
            self.decorate_all();
        }
    }

    /// Presentation only: pills and tiles stay as they are.
    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.set_theme(theme);
    }

    // ==================== Queries ====================

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn preferences(&self) -> Preferences {
        self.settings.preferences()
    }

    pub fn theme_attribute(&self) -> Option<&'static str> {
        self.settings.preferences().theme.data_attribute()
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn search(&self) -> &SearchQuery {
        &self.search
    }

    pub fn active_view(&self) -> ViewKind {
        self.active_view
    }

    pub fn decoration(&self) -> &Decoration {
        &self.decoration
    }

    pub fn tiles(&self) -> Tiles {
        self.decoration.tiles
    }

    pub fn tile_text(&self, metric: TileMetric) -> String {
        self.decoration.tile_text(metric)
    }

    pub fn write_tiles(&self, sinks: &mut [&mut dyn TileSink]) {
        self.decoration.write_tiles(sinks);
    }

    /// Tile texts keyed by metric.
    pub fn tile_texts(&self) -> BTreeMap<TileMetric, String> {
        let mut texts = BTreeMap::new();
        self.decoration.write_tiles(&mut [&mut texts]);
        texts
    }

    /// Header indicator for a column; only the active sort column has one.
    pub fn sort_indicator(&self, column: SortColumn) -> Option<SortDirection> {
        self.sort.indicator(column)
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }

    /// Row order of a projection, including hidden rows.
    pub fn order(&self, view: ViewKind) -> &[usize] {
        match view {
            ViewKind::Table => &self.table_order,
            ViewKind::Cards => &self.card_order,
        }
    }

    /// Visible rows of a projection in display order.
    pub fn projection(&self, view: ViewKind) -> Vec<ProjectedRow<'_>> {
        self.order(view)
            .iter()
            .filter(|&&index| self.is_visible(index))
            .filter_map(|&index| {
                Some(ProjectedRow {
                    index,
                    row: self.rows.get(index)?,
                    pills: self.decoration.pills.get(index)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::series::Provider;
    use crate::settings::MemoryStore;
    use crate::traits::MockClock;

    fn dashboard() -> Dashboard {
        let rows = vec![
            Row::new("Beta").with_dates(Provider::Audible, None, Some("2024-03-21")),
            Row::new("alpha").with_dates(Provider::Amazon, None, Some("2024-04-01")),
            Row::new("Gamma"),
        ];
        let clock = MockClock::at_local_date(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        Dashboard::new(
            rows,
            SettingsStore::load(Box::new(MemoryStore::new())),
            Arc::new(clock),
        )
    }

    fn titles(dashboard: &Dashboard, view: ViewKind) -> Vec<&str> {
        dashboard
            .projection(view)
            .into_iter()
            .map(|p| p.row.title.as_str())
            .collect()
    }

    #[test]
    fn test_parse_view_kind() {
        assert_eq!("Cards".parse::<ViewKind>(), Ok(ViewKind::Cards));
        assert_eq!("table".parse::<ViewKind>(), Ok(ViewKind::Table));
        assert!("grid".parse::<ViewKind>().is_err());
    }

    #[test]
    fn test_initial_state() {
        let dashboard = dashboard();
        assert_eq!(dashboard.visible_count(), 3);
        assert_eq!(dashboard.tiles().upcoming_count, 2);
        assert_eq!(titles(&dashboard, ViewKind::Table), vec!["Beta", "alpha", "Gamma"]);
        assert_eq!(dashboard.theme_attribute(), None);
    }

    #[test]
    fn test_sort_reorders_only_active_view() {
        let mut dashboard = dashboard();
        dashboard.sort_by(SortColumn::Title);

        assert_eq!(titles(&dashboard, ViewKind::Table), vec!["alpha", "Beta", "Gamma"]);
        assert_eq!(titles(&dashboard, ViewKind::Cards), vec!["Beta", "alpha", "Gamma"]);

        dashboard.set_active_view(ViewKind::Cards);
        assert_eq!(dashboard.sort_by(SortColumn::Title), SortDirection::Descending);
        assert_eq!(titles(&dashboard, ViewKind::Cards), vec!["Gamma", "Beta", "alpha"]);
    }

    #[test]
    fn test_visibility_is_shared_by_projections() {
        let mut dashboard = dashboard();
        dashboard.set_filter(FilterToggle::AnyUpcoming, true);

        assert_eq!(titles(&dashboard, ViewKind::Table), vec!["Beta", "alpha"]);
        assert_eq!(titles(&dashboard, ViewKind::Cards), vec!["Beta", "alpha"]);
    }

    #[test]
    fn test_filter_change_keeps_search() {
        let mut dashboard = dashboard();
        dashboard.apply_search("ALP");
        dashboard.set_filter(FilterToggle::AmazonUpcoming, true);
        assert_eq!(titles(&dashboard, ViewKind::Table), vec!["alpha"]);

        dashboard.clear_filters();
        assert_eq!(titles(&dashboard, ViewKind::Table), vec!["alpha"]);

        dashboard.apply_search("");
        assert_eq!(dashboard.visible_count(), 3);
    }

    #[test]
    fn test_toggle_relative_days_redecorates() {
        let mut dashboard = dashboard();
        let first = |d: &Dashboard| d.projection(ViewKind::Table)[0].pills.audible.next.text.clone();

        assert_eq!(first(&dashboard), "Mar 21, 2024");
        dashboard.toggle_relative_days(true);
        assert_eq!(first(&dashboard), "1d");
        assert_eq!(dashboard.tile_text(TileMetric::Soonest), "in 1 days");
    }

    #[test]
    fn test_set_theme_does_not_touch_decoration() {
        let mut dashboard = dashboard();
        let before = dashboard.decoration().clone();

        dashboard.set_theme(Theme::Dark);

        assert_eq!(dashboard.theme_attribute(), Some("dark"));
        assert_eq!(dashboard.decoration(), &before);
    }
}
