use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use log::LevelFilter;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".bookshelf";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.sqlite";
const LOG_FILE_NAME: &str = "bookshelf.log";

/// Overrides the database location, mostly for keeping a scratch library.
pub const DB_ENV: &str = "BOOKSHELF_DB";
/// Log level (`off`, `error`, `warn`, `info`, `debug`, `trace`).
pub const LOG_ENV: &str = "BOOKSHELF_LOG";

/// Runtime settings resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    /// The log file lives next to the database.
    pub log_path: PathBuf,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let db_path = match env::var_os(DB_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => default_db_path()?,
        };
        let log_level = match env::var(LOG_ENV) {
            Ok(raw) => parse_level(&raw)?,
            Err(_) => LevelFilter::Info,
        };
        Ok(Self::new(db_path, log_level))
    }

    pub fn new(db_path: PathBuf, log_level: LevelFilter) -> Self {
        let log_path = db_path.with_file_name(LOG_FILE_NAME);
        Self {
            db_path,
            log_path,
            log_level,
        }
    }

    /// Create the directory holding the database and log file.
    pub fn ensure_data_dir(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("failed to create data directory")?;
            }
        }
        Ok(())
    }
}

fn parse_level(raw: &str) -> Result<LevelFilter> {
    raw.trim()
        .parse::<LevelFilter>()
        .with_context(|| format!("{LOG_ENV} must be one of off, error, warn, info, debug, trace (got '{raw}')"))
}

/// Resolve the absolute path to the SQLite database inside the user's home.
fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}
