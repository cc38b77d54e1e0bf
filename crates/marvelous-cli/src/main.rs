mod commands;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "marvelous", version, about = "Browse the Marvel comics catalog")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Also write logs to a daily rotated file in this directory.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List series, page by page.
    List {
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Search series whose title starts with QUERY.
    Search { query: String },
    /// Show one series and add it to the viewing history.
    Detail { id: u64 },
    /// Save a series, or unsave it if already saved.
    Save { id: u64 },
    /// Show saved series.
    Saved,
    /// Show viewing history.
    History {
        /// Forget the history instead of showing it.
        #[arg(long)]
        clear: bool,
    },
    /// Pick a random character with artwork.
    Avatar,
    /// Resolve a page path such as /detail/354 and print its title.
    Route { path: String },
    /// Write the built-in config to the config file.
    Init {
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marvelous=info"));
    let stderr = fmt::layer().with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "marvelous.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_dir.as_deref());

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("command failed: {e:?}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
