//! Core library surface for the Bookshelf TUI application.
//!
//! The persistence layer ([`Library`]) is usable on its own; the binary wires
//! it to the terminal front-end in [`ui`].
pub mod config;
pub mod cover;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod ui;

/// The book store and the validation it applies to every write.
pub use db::{validate, Library};

pub use error::{StoreError, StoreResult, ValidationError};

/// Domain types that other layers manipulate.
pub use models::{Book, BookDraft, BookFilter, Genre, SortOrder, Status};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
