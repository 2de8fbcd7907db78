//! Binary entry point: resolve configuration, bring up logging and the SQLite
//! store, then drive the Ratatui event loop until the user exits.
use anyhow::Context;
use bookshelf::config::Config;
use bookshelf::{logging, run_app, App, Library};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    config.ensure_data_dir()?;
    logging::init(&config.log_path, config.log_level)?;

    let library = Library::open(&config.db_path)
        .with_context(|| format!("failed to open library at {}", config.db_path.display()))?;
    let first_run = library
        .initialize()
        .context("failed to initialize library schema")?;

    let mut app = App::new(library, first_run)?;
    run_app(&mut app)
}
