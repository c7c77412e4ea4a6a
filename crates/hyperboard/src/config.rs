//! Configuration file support for hyperboard.
//!
//! Loads settings from `hyperboard.toml` in the working directory (or the
//! file given with `--config`). Command-line flags and their environment
//! variables take precedence over the file, which takes precedence over the
//! built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use hyperboard_logging::LogFormat;
use hyperboard_logs::ScanOptions;

/// The config file name
pub const CONFIG_FILE_NAME: &str = "hyperboard.toml";

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Settings as written in `hyperboard.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Folder scanned for log roots
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    /// Directory levels below the root folder to search
    pub scan_depth: Option<usize>,
    /// Directory visit budget for one scan
    pub max_scan_dirs: Option<usize>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    /// Load an explicitly named config file. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load_from_dir(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        Self::load(&config_path).map(Some)
    }
}

/// Values given on the command line (or through their env vars).
#[derive(Debug, Default)]
pub struct Overrides {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub scan_depth: Option<usize>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub log_file: Option<PathBuf>,
}

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Always absolute.
    pub root_folder: PathBuf,
    pub port: u16,
    pub bind: String,
    pub scan: ScanOptions,
    pub log_level: String,
    pub log_format: LogFormat,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Merge overrides over the file config over the defaults. Relative paths
    /// are resolved against `working_dir`.
    pub fn resolve(file: Option<FileConfig>, overrides: Overrides, working_dir: &Path) -> Self {
        let file = file.unwrap_or_default();
        let defaults = ScanOptions::default();

        let root_folder = overrides
            .root_folder
            .or(file.root_folder)
            .unwrap_or_else(|| PathBuf::from("."));

        Settings {
            root_folder: absolutize(working_dir, root_folder),
            port: overrides.port.or(file.port).unwrap_or(DEFAULT_PORT),
            bind: overrides
                .bind
                .or(file.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            scan: ScanOptions {
                max_depth: overrides
                    .scan_depth
                    .or(file.scan_depth)
                    .unwrap_or(defaults.max_depth),
                max_dirs: file.max_scan_dirs.unwrap_or(defaults.max_dirs),
            },
            log_level: overrides
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format: overrides.log_format.or(file.log_format).unwrap_or_default(),
            log_file: overrides
                .log_file
                .or(file.log_file)
                .map(|p| absolutize(working_dir, p)),
        }
    }

    /// Socket address the server binds to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn absolutize(working_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else if path == Path::new(".") {
        working_dir.to_path_buf()
    } else {
        working_dir.join(path)
    }
}
