//! Decoration pass: pills for every row plus the summary tiles.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::pill::{self, Pill, PillKind};
use crate::series::{Provider, Row};

/// Next and latest pills of one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPills {
    pub next: Pill,
    pub latest: Pill,
}

/// All four pills of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPills {
    pub audible: ProviderPills,
    pub amazon: ProviderPills,
}

impl RowPills {
    pub fn get(&self, provider: Provider, kind: PillKind) -> &Pill {
        let pills = match provider {
            Provider::Audible => &self.audible,
            Provider::Amazon => &self.amazon,
        };
        match kind {
            PillKind::Next => &pills.next,
            PillKind::Latest => &pills.latest,
        }
    }
}

/// Summary metrics over the whole row collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tiles {
    pub total_count: usize,
    /// Rows with a next release from at least one provider.
    pub upcoming_count: usize,
    /// Earliest next release across all rows and both providers.
    pub soonest: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TileMetric {
    TotalSeries,
    Upcoming,
    Soonest,
}

impl TileMetric {
    pub const ALL: [TileMetric; 3] = [
        TileMetric::TotalSeries,
        TileMetric::Upcoming,
        TileMetric::Soonest,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TileMetric::TotalSeries => "Series",
            TileMetric::Upcoming => "Upcoming",
            TileMetric::Soonest => "Soonest",
        }
    }
}

/// A display slot that summary tiles are written into.
///
/// A dashboard may expose any number of slots (e.g. a desktop header and a
/// mobile header); every slot receives identical text.
pub trait TileSink {
    fn write_tile(&mut self, metric: TileMetric, text: &str);
}

impl TileSink for BTreeMap<TileMetric, String> {
    fn write_tile(&mut self, metric: TileMetric, text: &str) {
        self.insert(metric, text.to_string());
    }
}

/// Output of one decoration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    /// Pills per row, index-aligned with the row collection.
    pub pills: Vec<RowPills>,
    pub tiles: Tiles,
    show_relative: bool,
    today: NaiveDate,
}

impl Decoration {
    pub fn tile_text(&self, metric: TileMetric) -> String {
        match metric {
            TileMetric::TotalSeries => self.tiles.total_count.to_string(),
            TileMetric::Upcoming => self.tiles.upcoming_count.to_string(),
            TileMetric::Soonest => {
                pill::soonest_text(self.tiles.soonest, self.show_relative, self.today)
            }
        }
    }

    /// Write every metric into every slot.
    pub fn write_tiles(&self, sinks: &mut [&mut dyn TileSink]) {
        for metric in TileMetric::ALL {
            let text = self.tile_text(metric);
            for sink in sinks.iter_mut() {
                sink.write_tile(metric, &text);
            }
        }
    }
}

fn provider_pills(row: &Row, provider: Provider, show_relative: bool, today: NaiveDate) -> ProviderPills {
    let release = row.provider(provider);
    ProviderPills {
        next: pill::format_pill(
            release.next_date.as_deref(),
            PillKind::Next,
            provider,
            show_relative,
            today,
        ),
        latest: pill::format_pill(
            release.latest_date.as_deref(),
            PillKind::Latest,
            provider,
            show_relative,
            today,
        ),
    }
}

/// Decorate every row and compute the tiles in a single pass.
///
/// Rows are the single source of truth shared by every view, so the total
/// is simply the collection size and can never double count.
pub fn decorate_rows(rows: &[Row], show_relative: bool, today: NaiveDate) -> Decoration {
    let mut tiles = Tiles {
        total_count: rows.len(),
        ..Tiles::default()
    };
    let mut pills = Vec::with_capacity(rows.len());

    for row in rows {
        pills.push(RowPills {
            audible: provider_pills(row, Provider::Audible, show_relative, today),
            amazon: provider_pills(row, Provider::Amazon, show_relative, today),
        });

        let next_dates: Vec<NaiveDate> = Provider::ALL
            .iter()
            .filter_map(|p| row.provider(*p).next())
            .collect();
        if !next_dates.is_empty() {
            tiles.upcoming_count += 1;
        }
        tiles.soonest = next_dates
            .into_iter()
            .chain(tiles.soonest)
            .min();
    }

    tracing::debug!(
        total = tiles.total_count,
        upcoming = tiles.upcoming_count,
        soonest = ?tiles.soonest,
        "Decorated rows"
    );

    Decoration {
        pills,
        tiles,
        show_relative,
        today,
    }
}
