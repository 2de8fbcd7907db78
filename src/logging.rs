//! File-backed sink for the `log` facade. The TUI owns the terminal, so log
//! records go to a file next to the database instead of stderr.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use log::LevelFilter;

/// Dispatch that timestamps each record and appends it to `file`.
fn dispatch(file: File, level: LevelFilter) -> fern::Dispatch {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {:<5} {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(file)
}

/// Install the global logger, appending to `path`. Does nothing when the
/// level is `Off`.
pub fn init(path: &Path, level: LevelFilter) -> Result<()> {
    if level == LevelFilter::Off {
        return Ok(());
    }

    let file = fern::log_file(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    dispatch(file, level)
        .apply()
        .context("logger already initialized")
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Record};
    use std::fs;

    #[test]
    fn records_below_level_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookshelf.log");
        let (_, logger) = dispatch(fern::log_file(&path).unwrap(), LevelFilter::Info).into_log();

        logger.log(
            &Record::builder()
                .level(Level::Info)
                .target("bookshelf::db")
                .args(format_args!("added book 1"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .args(format_args!("hidden"))
                .build(),
        );
        logger.flush();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("INFO  bookshelf::db: added book 1"));
        assert!(!written.contains("hidden"));
    }

    #[test]
    fn off_level_installs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookshelf.log");
        init(&path, LevelFilter::Off).unwrap();
        assert!(!path.exists());
    }
}
