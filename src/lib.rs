//! Syllabus Dashboard Library
//!
//! This module exposes the dashboard state engine (date normalization,
//! pills, tiles, filtering, sorting, task polling and preferences) for the
//! CLI and for testing.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod dates;
pub mod filter;
pub mod pill;
pub mod poller;
pub mod refresh;
pub mod render;
pub mod series;
pub mod settings;
pub mod sort;
pub mod traits;

// Re-export commonly used types
pub use aggregate::{Decoration, RowPills, TileMetric, TileSink, Tiles, decorate_rows};
pub use api::{ApiError, DashboardApiClient, RefreshResponse, ScrapeStatus};
pub use config::AppConfig;
pub use dashboard::{Dashboard, ProjectedRow, ViewKind};
pub use dates::{days_until, format_absolute, parse_any_date};
pub use filter::{FilterState, FilterToggle, SearchQuery};
pub use pill::{Pill, PillCategory, PillKind, format_pill};
pub use poller::{PollCommand, PollSnapshot, PollerHandle, TaskPoller, spawn_poller};
pub use refresh::{RefreshButton, RefreshPhase};
pub use series::{Provider, ProviderRelease, Row, SeriesInfo};
pub use settings::{
    JsonFileStore, MemoryStore, PreferenceStore, Preferences, SettingsStore, StorageError, Theme,
};
pub use sort::{SortColumn, SortDirection, SortState};
pub use traits::{Clock, MockClock, ScriptedStatusSource, StatusSource, SystemClock};
