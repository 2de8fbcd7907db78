//! Error kinds surfaced by the library store. The store only distinguishes
//! kinds; wording shown to the user is left to the presentation layer, which
//! wraps these in `anyhow` like the rest of the binary.

use thiserror::Error;

/// A draft that violates one of the book invariants. Raised before any
/// mutation is attempted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Title is required.")]
    EmptyTitle,
    #[error("Author is required.")]
    EmptyAuthor,
    #[error("Publication year {year} must be between 1000 and {max}.")]
    PublicationYear { year: i32, max: i32 },
    #[error("Pages must be at least 1 (got {0}).")]
    Pages(i64),
    #[error("Rating {0} must be between 0 and 5 in steps of 0.5.")]
    Rating(f64),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Book {0} not found")]
    NotFound(i64),
    #[error("storage failure")]
    Storage(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
