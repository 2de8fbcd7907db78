use std::path::Path;

use log::{debug, info};
use rusqlite::Connection;

use super::Library;
use crate::error::StoreResult;

/// Table and index definitions. Every statement is idempotent so the batch
/// can run on each start. The CHECK constraints mirror the validation rules
/// applied before writes; they only fire if a row bypasses the store.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL CHECK (length(trim(title)) > 0),
        author TEXT NOT NULL CHECK (length(trim(author)) > 0),
        genre TEXT,
        isbn TEXT,
        publication_year INTEGER,
        pages INTEGER CHECK (pages IS NULL OR pages >= 1),
        rating REAL CHECK (rating IS NULL OR (rating >= 0 AND rating <= 5)),
        status TEXT NOT NULL DEFAULT 'To Read'
            CHECK (status IN ('To Read', 'Reading', 'Completed', 'DNF')),
        date_added TEXT NOT NULL,
        notes TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_books_status ON books (status);
    CREATE INDEX IF NOT EXISTS idx_books_genre ON books (genre);
    CREATE INDEX IF NOT EXISTS idx_books_author ON books (author);
    CREATE INDEX IF NOT EXISTS idx_books_date_added ON books (date_added);
";

impl Library {
    /// Open (or create) the database file at `path`. The parent directory
    /// must already exist; the binary takes care of that through `Config`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        debug!("opened library database at {}", path.display());
        Ok(Self { conn })
    }

    /// Open a private in-memory database. Used by tests and throwaway runs.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Ensure the schema exists and report whether the collection was empty
    /// at call time, which callers use to detect a first run.
    pub fn initialize(&self) -> StoreResult<bool> {
        self.conn.execute_batch(SCHEMA)?;
        let count = self.count()?;
        info!("library ready with {count} book(s)");
        Ok(count == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookDraft;

    #[test]
    fn initialize_reports_first_run_then_populated() {
        let mut library = Library::open_in_memory().unwrap();
        assert!(library.initialize().unwrap());
        assert!(library.initialize().unwrap());

        library.add(&BookDraft::new("Dune", "Frank Herbert")).unwrap();
        assert!(!library.initialize().unwrap());
        assert_eq!(library.count().unwrap(), 1);
    }

    #[test]
    fn schema_rejects_rows_that_bypass_validation() {
        let library = Library::open_in_memory().unwrap();
        library.initialize().unwrap();

        let result = library.conn.execute(
            "INSERT INTO books (title, author, status, date_added)
             VALUES ('Dune', 'Herbert', 'Lost', '2024-01-01 00:00:00')",
            [],
        );
        assert!(result.is_err());
    }
}
