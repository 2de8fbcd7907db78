//! Persistence module split across logical submodules. Everything goes
//! through the [`Library`] handle, which owns the SQLite connection for the
//! lifetime of the caller that opened it.

mod books;
mod connection;
mod stats;

use rusqlite::Connection;

pub use books::validate;

/// The library store: single source of truth for the book collection.
///
/// Reads borrow the handle shared; writes take `&mut self` and run inside a
/// SQLite transaction so a reader never observes a partially applied change.
pub struct Library {
    conn: Connection,
}

#[cfg(test)]
impl Library {
    /// Raw access for tests that need rows the store would never write.
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}
