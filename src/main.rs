use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use syllabus_dashboard::{
    api::DashboardApiClient,
    config::AppConfig,
    dashboard::{Dashboard, ViewKind},
    filter::FilterToggle,
    poller::{PollerHandle, spawn_poller},
    refresh::RefreshButton,
    render,
    series::{Row, SeriesInfo},
    settings::{JsonFileStore, MemoryStore, SHOW_DAYS_KEY, SettingsStore, THEME_KEY, Theme},
    sort::SortColumn,
    traits::SystemClock,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "syllabus-dashboard")]
#[command(about = "Series release dashboard - countdowns, filters and scrape status")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the summary tiles and the table or card view
    Show(ShowArgs),
    /// Poll the scrape status until no jobs remain
    Watch,
    /// Trigger a scrape of every series, then watch it finish
    Refresh,
    /// Show or change persisted display preferences
    Settings {
        /// Relative day countdowns
        #[arg(long)]
        relative: Option<Switch>,
        /// Color theme (light or dark)
        #[arg(long, conflicts_with = "toggle_theme")]
        theme: Option<Theme>,
        /// Switch between light and dark
        #[arg(long)]
        toggle_theme: bool,
    },
}

#[derive(clap::Args, Debug)]
struct ShowArgs {
    /// Read series records from a JSON file instead of the server
    #[arg(long)]
    input: Option<PathBuf>,
    /// Which projection to print (defaults to display.default_view)
    #[arg(long)]
    view: Option<ViewKind>,
    /// Sort requests, applied in order; repeating a column flips direction
    #[arg(long)]
    sort: Vec<SortColumn>,
    /// Case-insensitive title search
    #[arg(long)]
    search: Option<String>,
    /// Active filters: aud-next, amz-next, any-upcoming, no-next
    #[arg(long)]
    filter: Vec<FilterToggle>,
    /// Show countdowns for this run only
    #[arg(long, conflicts_with = "absolute")]
    relative: bool,
    /// Show calendar dates for this run only
    #[arg(long)]
    absolute: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Switch {
    On,
    Off,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let config = Arc::new(config);

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    match args.command {
        Command::Show(show) => rt.block_on(run_show(&config, show)),
        Command::Watch => rt.block_on(run_watch(&config)),
        Command::Refresh => rt.block_on(run_refresh(&config)),
        Command::Settings {
            relative,
            theme,
            toggle_theme,
        } => run_settings(&config, relative, theme, toggle_theme),
    }
}

/// `RUST_LOG` when set and non-empty, else INFO with debug for this crate.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    let directives = match rust_log.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => "syllabus_dashboard=debug",
    };
    EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .parse_lossy(directives)
}

fn api_client(config: &AppConfig) -> Result<DashboardApiClient> {
    let client = DashboardApiClient::new(&config.server.base_url, &config.network)?;
    tracing::info!("API client initialized for {}", client.base_url());
    Ok(client)
}

fn load_rows_from_file(path: &Path) -> Result<Vec<Row>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read series file {}", path.display()))?;
    let series: Vec<SeriesInfo> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse series file {}", path.display()))?;
    Ok(series.into_iter().map(Row::from).collect())
}

async fn run_show(config: &AppConfig, args: ShowArgs) -> Result<()> {
    let rows = match &args.input {
        Some(path) => load_rows_from_file(path)?,
        None => api_client(config)?
            .fetch_series()
            .await?
            .into_iter()
            .map(Row::from)
            .collect(),
    };

    let store = JsonFileStore::new(config.storage.preferences_path());
    let mut settings = SettingsStore::load(Box::new(store));

    // One-off display flags must not overwrite the saved preference
    let override_relative = match (args.relative, args.absolute) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    if let Some(on) = override_relative {
        let prefs = settings.preferences();
        let session = MemoryStore::new()
            .with_value(SHOW_DAYS_KEY, if on { "1" } else { "0" })
            .with_value(THEME_KEY, prefs.theme.as_str());
        settings = SettingsStore::load(Box::new(session));
    }

    let view = args.view.unwrap_or(config.display.default_view);
    let mut dashboard = Dashboard::new(rows, settings, Arc::new(SystemClock));
    dashboard.set_active_view(view);

    for toggle in &args.filter {
        dashboard.set_filter(*toggle, true);
    }
    if let Some(term) = &args.search {
        dashboard.apply_search(term);
    }
    for column in &args.sort {
        dashboard.sort_by(*column);
    }

    print!("{}", render::render(&dashboard, view)?);
    Ok(())
}

/// Wait until the poller reports polling stopped, logging indicator changes.
async fn watch_until_idle(handle: PollerHandle) -> Result<()> {
    let mut snapshots = handle.subscribe();
    let mut indicator = false;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *snapshots.borrow_and_update();
                if snapshot.indicator_visible != indicator {
                    indicator = snapshot.indicator_visible;
                    if indicator {
                        tracing::info!("Scrape jobs running...");
                    } else {
                        tracing::info!("Scrape jobs finished");
                    }
                }
                if !snapshot.polling && snapshot.checks_completed > 0 {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping poller");
                break;
            }
        }
    }

    let checks = handle.snapshot().checks_completed;
    handle.shutdown().await;
    tracing::info!(checks, "Status polling finished");
    Ok(())
}

async fn run_watch(config: &AppConfig) -> Result<()> {
    let client = api_client(config)?;
    let handle = spawn_poller(client, config.polling.interval());
    handle.begin_polling();
    watch_until_idle(handle).await
}

async fn run_refresh(config: &AppConfig) -> Result<()> {
    let client = api_client(config)?;
    let mut button = RefreshButton::new(
        config.refresh.success_cooldown(),
        config.refresh.failure_cooldown(),
    );

    button.begin();
    tracing::info!(label = button.label(), "Refresh triggered");

    let outcome = client.trigger_refresh().await;
    let cooldown = button.complete(outcome.is_ok());
    tracing::info!(label = button.label(), ?cooldown, "Refresh request finished");

    match outcome {
        Ok(response) => {
            println!("{}", response.message);
            let handle = spawn_poller(client, config.polling.interval());
            handle.begin_polling();
            let (watched, ()) = tokio::join!(watch_until_idle(handle), async {
                tokio::time::sleep(cooldown).await;
                button.reenable();
                tracing::debug!(label = button.label(), "Refresh trigger re-enabled");
            });
            watched
        }
        Err(e) => {
            tokio::time::sleep(cooldown).await;
            button.reenable();
            Err(e.context("Refresh failed"))
        }
    }
}

fn run_settings(
    config: &AppConfig,
    relative: Option<Switch>,
    theme: Option<Theme>,
    toggle_theme: bool,
) -> Result<()> {
    let store = JsonFileStore::new(config.storage.preferences_path());
    tracing::debug!("Using preference file {}", store.path().display());
    let mut settings = SettingsStore::load(Box::new(store));

    if let Some(switch) = relative {
        settings.set_show_relative_days(matches!(switch, Switch::On));
    }
    if let Some(theme) = theme {
        settings.set_theme(theme);
    } else if toggle_theme {
        settings.set_theme(settings.preferences().theme.toggled());
    }

    let prefs = settings.preferences();
    println!(
        "relative days: {}",
        if prefs.show_relative_days { "on" } else { "off" }
    );
    println!("theme: {}", prefs.theme);
    Ok(())
}
