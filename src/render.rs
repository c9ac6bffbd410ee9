//! Plain-text projections of the dashboard for terminal output.

use std::io::Write;

use unicode_width::UnicodeWidthStr;

use crate::aggregate::TileMetric;
use crate::dashboard::{Dashboard, ViewKind};
use crate::pill::PillKind;
use crate::series::Provider;
use crate::sort::{SortColumn, SortDirection, SortKeyType};

/// Column header text, with the sort arrow on the active column.
fn header(dashboard: &Dashboard, column: SortColumn) -> String {
    let label = match column {
        SortColumn::Title => "Title".to_string(),
        SortColumn::Count(provider) => provider.label().to_string(),
        SortColumn::Latest(provider) => format!("{} Latest", provider.label()),
        SortColumn::Next(provider) => format!("{} Next", provider.label()),
    };
    match dashboard.sort_indicator(column) {
        Some(SortDirection::Ascending) => format!("{label} ▲"),
        Some(SortDirection::Descending) => format!("{label} ▼"),
        None => label,
    }
}

fn count_text(count: Option<i64>) -> String {
    count.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Summary tiles on one line.
pub fn write_tiles<W: Write>(mut writer: W, dashboard: &Dashboard) -> anyhow::Result<()> {
    let texts = dashboard.tile_texts();
    let line = TileMetric::ALL
        .iter()
        .filter_map(|metric| {
            texts
                .get(metric)
                .map(|text| format!("{}: {}", metric.label(), text))
        })
        .collect::<Vec<_>>()
        .join("  |  ");
    writeln!(writer, "{line}")?;
    Ok(())
}

/// Table projection: visible rows in table order, one column per sort key.
pub fn write_table<W: Write>(mut writer: W, dashboard: &Dashboard) -> anyhow::Result<()> {
    let headers: Vec<String> = SortColumn::ALL
        .iter()
        .map(|column| header(dashboard, *column))
        .collect();

    let rows: Vec<Vec<String>> = dashboard
        .projection(ViewKind::Table)
        .into_iter()
        .map(|entry| {
            SortColumn::ALL
                .iter()
                .map(|column| match *column {
                    SortColumn::Title => entry.row.title.clone(),
                    SortColumn::Count(provider) => count_text(entry.row.provider(provider).count),
                    SortColumn::Latest(provider) => {
                        entry.pills.get(provider, PillKind::Latest).text.clone()
                    }
                    SortColumn::Next(provider) => {
                        entry.pills.get(provider, PillKind::Next).text.clone()
                    }
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| UnicodeWidthStr::width(h.as_str())).collect();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    write_cells(&mut writer, &headers, &widths)?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_cells(&mut writer, &rule, &widths)?;
    for row in &rows {
        write_cells(&mut writer, row, &widths)?;
    }
    Ok(())
}

fn write_cells<W: Write>(writer: &mut W, cells: &[String], widths: &[usize]) -> anyhow::Result<()> {
    let mut line = String::new();
    for ((cell, width), column) in cells.iter().zip(widths).zip(SortColumn::ALL) {
        let padding = " ".repeat(width.saturating_sub(UnicodeWidthStr::width(cell.as_str())));
        if column.key_type() == SortKeyType::Integer {
            line.push_str(&padding);
            line.push_str(cell);
        } else {
            line.push_str(cell);
            line.push_str(&padding);
        }
        line.push_str("  ");
    }
    writeln!(writer, "{}", line.trim_end())?;
    Ok(())
}

/// Card projection: visible rows in card order, one block per series.
pub fn write_cards<W: Write>(mut writer: W, dashboard: &Dashboard) -> anyhow::Result<()> {
    for entry in dashboard.projection(ViewKind::Cards) {
        writeln!(writer, "{}", entry.row.title)?;
        for provider in Provider::ALL {
            let next = entry.pills.get(provider, PillKind::Next);
            let latest = entry.pills.get(provider, PillKind::Latest);
            writeln!(
                writer,
                "  {:<8} next {:<14} latest {:<14} [{}]",
                provider.label(),
                next.text,
                latest.text,
                next.category.css_class()
            )?;
            let release = entry.row.provider(provider);
            let titles = [("next", &release.next_title), ("latest", &release.latest_title)];
            for (label, title) in titles {
                if let Some(title) = title {
                    writeln!(writer, "    {label} release: {title}")?;
                }
            }
        }
    }
    Ok(())
}

/// Tiles followed by the requested projection.
pub fn render(dashboard: &Dashboard, view: ViewKind) -> anyhow::Result<String> {
    let mut out = Vec::new();
    write_tiles(&mut out, dashboard)?;
    writeln!(out)?;
    match view {
        ViewKind::Table => write_table(&mut out, dashboard)?,
        ViewKind::Cards => write_cards(&mut out, dashboard)?,
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::series::Row;
    use crate::settings::{MemoryStore, SettingsStore};
    use crate::traits::MockClock;

    fn dashboard() -> Dashboard {
        let rows = vec![
            Row::new("Cradle")
                .with_count(Provider::Audible, 12)
                .with_dates(Provider::Audible, Some("2023-02-28"), None),
            Row::new("Dungeon Crawler Carl")
                .with_count(Provider::Audible, 7)
                .with_dates(Provider::Amazon, None, Some("2024-03-25"))
                .with_titles(Provider::Amazon, None, Some("A Parade of Horribles")),
        ];
        let clock = MockClock::at_local_date(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        Dashboard::new(
            rows,
            SettingsStore::load(Box::new(MemoryStore::new())),
            Arc::new(clock),
        )
    }

    #[test]
    fn test_tiles_line() {
        let mut out = Vec::new();
        write_tiles(&mut out, &dashboard()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.trim_end(), "Series: 2  |  Upcoming: 1  |  Soonest: Mar 25, 2024");
    }

    #[test]
    fn test_table_marks_active_sort_column() {
        let mut dashboard = dashboard();
        dashboard.sort_by(SortColumn::Count(Provider::Audible));

        let text = render(&dashboard, ViewKind::Table).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[2].contains("Audible ▲"));
        assert!(!lines[2].contains("Title ▲"));
        // Ascending by count puts 7 before 12
        assert!(lines[4].starts_with("Dungeon Crawler Carl"));
        assert!(lines[5].starts_with("Cradle"));
    }

    #[test]
    fn test_cards_show_pills() {
        let mut dashboard = dashboard();
        dashboard.toggle_relative_days(true);

        let text = render(&dashboard, ViewKind::Cards).unwrap();

        assert!(text.contains("Soonest: in 5 days"));
        assert!(text.contains("next 5d"));
        assert!(text.contains("[next-amz]"));
        assert!(text.contains("latest 386d ago"));
    }

    #[test]
    fn test_cards_show_release_titles() {
        let text = render(&dashboard(), ViewKind::Cards).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        let amazon = lines
            .iter()
            .position(|l| l.trim_start().starts_with("Amazon") && l.contains("Mar 25, 2024"))
            .expect("amazon line for the upcoming release");
        assert_eq!(lines[amazon + 1], "    next release: A Parade of Horribles");
        assert!(!text.contains("latest release:"));
    }
}
