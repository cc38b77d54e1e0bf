use std::path::Path;
use std::sync::Arc;

use marvelous_api::MarvelClient;
use marvelous_core::config::AppConfig;
use marvelous_core::error::MarvelousError;
use marvelous_core::library::{Toggle, SAVED_CAPACITY};
use marvelous_core::persistence::FileStore;
use marvelous_core::route::Route;
use marvelous_core::store::{AvatarPick, PageOutcome, SeriesStore};

use crate::output;
use crate::{Cli, Command};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] MarvelousError),

    #[error("{0}")]
    Request(String),

    #[error("unknown page {0:?}")]
    UnknownRoute(String),

    #[error("{} already exists, pass --force to overwrite", .0.display())]
    ConfigExists(std::path::PathBuf),
}

type Store = SeriesStore<MarvelClient>;

fn open_store(config: &AppConfig) -> Result<Store, CliError> {
    let client = config.catalog_client()?;
    let storage = Arc::new(FileStore::new(config.data_dir()));
    tracing::debug!(dir = %storage.dir().display(), "Using data directory");

    let store = SeriesStore::new(client, storage, config.api.page_limit);
    store.restore();
    Ok(store)
}

/// The error the last failed store operation recorded.
fn request_failure(store: &Store) -> CliError {
    CliError::Request(
        store
            .last_error()
            .unwrap_or_else(|| "request failed".to_string()),
    )
}

/// Page whose title heads the command's output, if it maps to one.
fn page_for(command: &Command) -> Option<Route> {
    match command {
        Command::List { .. } | Command::Search { .. } => Some(Route::Home),
        Command::Detail { id } | Command::Save { id } => Some(Route::Detail(*id)),
        Command::History { .. } => Some(Route::History),
        Command::Saved | Command::Avatar | Command::Route { .. } | Command::Init { .. } => None,
    }
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Route { path } => return route(path),
        Command::Init { force } => return init(cli.config.as_deref(), *force),
        _ => {}
    }

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let store = open_store(&config)?;

    if let Some(page) = page_for(&cli.command) {
        output::header(page);
    }
    match cli.command {
        Command::List { pages } => list(&store, pages).await,
        Command::Search { query } => search(&store, &query).await,
        Command::Detail { id } => detail(&store, id).await,
        Command::Save { id } => save(&store, id).await,
        Command::Saved => {
            output::series_list("Saved", &store.saved());
            Ok(())
        }
        Command::History { clear: true } => {
            store.clear_history();
            println!("Viewing history cleared");
            Ok(())
        }
        Command::History { clear: false } => {
            output::series_list("Viewed", &store.viewed());
            Ok(())
        }
        Command::Avatar => avatar(&store).await,
        Command::Route { path } => route(&path),
        Command::Init { force } => init(cli.config.as_deref(), force),
    }
}

fn route(path: &str) -> Result<(), CliError> {
    let route = Route::resolve(path).ok_or_else(|| CliError::UnknownRoute(path.to_string()))?;
    println!("{}  {}", route.name(), route.title());
    Ok(())
}

fn init(path: Option<&Path>, force: bool) -> Result<(), CliError> {
    let target = path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);
    if target.exists() && !force {
        return Err(CliError::ConfigExists(target));
    }

    let config = AppConfig::default();
    match path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }
    tracing::info!(path = %target.display(), "Wrote config file");
    println!("Wrote {}", target.display());
    Ok(())
}

async fn list(store: &Store, pages: u32) -> Result<(), CliError> {
    for _ in 0..pages {
        match store.fetch_page().await {
            PageOutcome::Loaded { added: 0 } => break,
            PageOutcome::Loaded { .. } => {}
            PageOutcome::Failed => return Err(request_failure(store)),
            other => tracing::debug!(?other, "Page fetch did not load"),
        }
    }
    output::series_list("Series", &store.series());
    Ok(())
}

async fn search(store: &Store, query: &str) -> Result<(), CliError> {
    if store.search(query).await == PageOutcome::Failed {
        return Err(request_failure(store));
    }
    output::series_list("Results", &store.series());
    Ok(())
}

async fn detail(store: &Store, id: u64) -> Result<(), CliError> {
    let series = store
        .fetch_detail(id)
        .await
        .ok_or_else(|| request_failure(store))?;
    store.add_to_viewed(series.clone());
    output::detail(&series, store.is_saved(id));
    Ok(())
}

async fn save(store: &Store, id: u64) -> Result<(), CliError> {
    let series = store
        .fetch_detail(id)
        .await
        .ok_or_else(|| request_failure(store))?;
    let title = series.title.clone();

    match store.toggle_saved(series) {
        Toggle::Added => println!(
            "Saved {title} ({}/{SAVED_CAPACITY})",
            store.saved_count()
        ),
        Toggle::Removed => println!("Removed {title} from saved series"),
        Toggle::Refused => {
            return Err(CliError::Request(format!(
                "saved list is full ({SAVED_CAPACITY} series); unsave one first"
            )))
        }
    }
    Ok(())
}

async fn avatar(store: &Store) -> Result<(), CliError> {
    match store.fetch_random_character().await {
        AvatarPick::Found(character) => output::character(&character),
        AvatarPick::NotFound => match store.last_error() {
            Some(e) => return Err(CliError::Request(e)),
            None => println!("No character with artwork found, try again"),
        },
    }
    Ok(())
}
