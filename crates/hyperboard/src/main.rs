mod api;
mod commands;
mod config;
mod server;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use hyperboard_logging::{init_tracing, LogFormat};
use hyperboard_logs::LogStore;

use crate::config::{FileConfig, Overrides, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "hyperboard",
    about = "Dashboard for hyperfind search logs",
    version,
    author
)]
struct Cli {
    /// Folder to scan for log roots (default: current directory)
    #[arg(short, long, env = "HYPERBOARD_LOGDIR", global = true)]
    logdir: Option<PathBuf>,

    /// Path to config file (default: ./hyperboard.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory levels below the log folder to search for roots
    #[arg(long, global = true)]
    scan_depth: Option<usize>,

    /// Log level filter, overridden by RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormatChoice>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the dashboard API (the default)
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "HYPERBOARD_PORT")]
        port: Option<u16>,

        /// Address to bind
        #[arg(long)]
        bind: Option<String>,

        /// Open the dashboard in a browser once listening
        #[arg(long)]
        open: bool,
    },

    /// List candidate log roots
    Roots {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the sessions of a log root
    Sessions {
        /// Candidate root name (default: first candidate)
        #[arg(short, long)]
        root: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the chart series of a log root as JSON
    Plot {
        /// Candidate root name (default: first candidate)
        #[arg(short, long)]
        root: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;

    let file_config = match &cli.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => FileConfig::load_from_dir(&working_dir)?,
    };

    let command = cli.command.unwrap_or(Command::Serve {
        port: None,
        bind: None,
        open: false,
    });

    let (port, bind) = match &command {
        Command::Serve { port, bind, .. } => (*port, bind.clone()),
        _ => (None, None),
    };

    let overrides = Overrides {
        root_folder: cli.logdir,
        port,
        bind,
        scan_depth: cli.scan_depth,
        log_level: cli.log_level,
        log_format: cli.log_format.map(Into::into),
        log_file: cli.log_file,
    };
    let settings = Settings::resolve(file_config, overrides, &working_dir);

    let _log_guard = init_tracing(
        &settings.log_level,
        settings.log_format,
        settings.log_file.as_deref(),
    );

    info!(root = %settings.root_folder.display(), "Hyperboard using root folder");

    let store = LogStore::new(settings.root_folder.clone()).with_scan_options(settings.scan);

    match command {
        Command::Serve { open, .. } => server::handle_serve(store, &settings, open).await,
        Command::Roots { json } => commands::list_roots(&store, json),
        Command::Sessions { root, json } => commands::show_sessions(&store, root.as_deref(), json),
        Command::Plot { root } => commands::print_plot(&store, root.as_deref()),
    }
}
