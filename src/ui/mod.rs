//! Ratatui front-end: four tabs (dashboard, my books, search, statistics)
//! over a single [`Library`](crate::db::Library) handle, plus the add/edit
//! form and confirmation dialogs layered on top.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
