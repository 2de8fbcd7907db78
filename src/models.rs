//! Domain models that mirror the SQLite schema and get passed throughout the
//! TUI. These types stay light-weight data holders so the store can focus on
//! queries and the UI on presentation. Genre and status are closed
//! enumerations; their display labels double as the persisted text.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

/// Fixed classification used for filtering and aggregation. `Other` is the
/// catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Genre {
    Fiction,
    NonFiction,
    ScienceFiction,
    Fantasy,
    Mystery,
    Thriller,
    Romance,
    Biography,
    History,
    SelfHelp,
    Business,
    Science,
    Other,
}

impl Genre {
    /// Every genre in presentation order.
    pub const ALL: [Genre; 13] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::ScienceFiction,
        Genre::Fantasy,
        Genre::Mystery,
        Genre::Thriller,
        Genre::Romance,
        Genre::Biography,
        Genre::History,
        Genre::SelfHelp,
        Genre::Business,
        Genre::Science,
        Genre::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Genre::Fiction => "Fiction",
            Genre::NonFiction => "Non-Fiction",
            Genre::ScienceFiction => "Science Fiction",
            Genre::Fantasy => "Fantasy",
            Genre::Mystery => "Mystery",
            Genre::Thriller => "Thriller",
            Genre::Romance => "Romance",
            Genre::Biography => "Biography",
            Genre::History => "History",
            Genre::SelfHelp => "Self-Help",
            Genre::Business => "Business",
            Genre::Science => "Science",
            Genre::Other => "Other",
        }
    }

    /// Step through `ALL`, wrapping at both ends. Used by form selectors.
    pub fn cycle(self, offset: isize) -> Genre {
        let idx = Genre::ALL.iter().position(|g| *g == self).unwrap_or(0) as isize;
        let len = Genre::ALL.len() as isize;
        Genre::ALL[(idx + offset).rem_euclid(len) as usize]
    }
}

/// Reading-progress state of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    ToRead,
    Reading,
    Completed,
    /// Did not finish.
    Dnf,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::ToRead,
        Status::Reading,
        Status::Completed,
        Status::Dnf,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Status::ToRead => "To Read",
            Status::Reading => "Reading",
            Status::Completed => "Completed",
            Status::Dnf => "DNF",
        }
    }

    pub fn cycle(self, offset: isize) -> Status {
        let idx = Status::ALL.iter().position(|s| *s == self).unwrap_or(0) as isize;
        let len = Status::ALL.len() as isize;
        Status::ALL[(idx + offset).rem_euclid(len) as usize]
    }
}

/// Returned when text does not name one of the enumerated values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl FromStr for Genre {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|genre| genre.label() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "genre",
                value: s.to_string(),
            })
    }
}

impl FromStr for Status {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "status",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Both enums persist as their display label so the database stays readable
// with the sqlite3 shell.

impl ToSql for Genre {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

impl FromSql for Genre {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

/// Every mutable attribute of a book. `add` and `update` both take a draft;
/// the store assigns `id` and `date_added` itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub genre: Option<Genre>,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub pages: Option<i64>,
    pub rating: Option<f64>,
    pub status: Status,
    pub notes: Option<String>,
}

impl BookDraft {
    /// Start a draft with the two required fields and defaults elsewhere.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }
}

/// A stored book record.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    /// Primary key assigned by SQLite. Never reused while the row exists.
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: Option<Genre>,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub pages: Option<i64>,
    pub rating: Option<f64>,
    pub status: Status,
    /// Local time of insertion, second precision.
    pub date_added: NaiveDateTime,
    pub notes: Option<String>,
}

impl Book {
    /// Copy the mutable attributes back into a draft, e.g. to seed the edit
    /// form or to compare against what was submitted.
    pub fn to_draft(&self) -> BookDraft {
        BookDraft {
            title: self.title.clone(),
            author: self.author.clone(),
            genre: self.genre,
            isbn: self.isbn.clone(),
            publication_year: self.publication_year,
            pages: self.pages,
            rating: self.rating,
            status: self.status,
            notes: self.notes.clone(),
        }
    }

    /// `Title by Author`, used in status messages and list rows.
    pub fn display_title(&self) -> String {
        format!("{} by {}", self.title, self.author)
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Narrowing applied by `list`. `None` on either field means "all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BookFilter {
    pub status: Option<Status>,
    pub genre: Option<Genre>,
}

impl BookFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_genre(mut self, genre: Genre) -> Self {
        self.genre = Some(genre);
        self
    }
}

/// Ordering applied by `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Title,
    Author,
    /// Highest rating first; unrated books go last.
    Rating,
    /// Most recent `date_added` first.
    RecentlyAdded,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::Title,
        SortOrder::Author,
        SortOrder::Rating,
        SortOrder::RecentlyAdded,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Title => "Title",
            SortOrder::Author => "Author",
            SortOrder::Rating => "Rating",
            SortOrder::RecentlyAdded => "Recently Added",
        }
    }

    pub fn next(self) -> SortOrder {
        let idx = SortOrder::ALL.iter().position(|s| *s == self).unwrap_or(0);
        SortOrder::ALL[(idx + 1) % SortOrder::ALL.len()]
    }
}

/// Number of books sharing a genre. `genre` is `None` for books that never
/// had one assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreCount {
    pub genre: Option<Genre>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCount {
    pub status: Status,
    pub count: i64,
}

/// Books added during one calendar month, keyed `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyAdditions {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorCount {
    pub author: String,
    pub count: i64,
}

/// Headline numbers for the statistics screen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SummaryMetrics {
    pub total_books: i64,
    /// Sum of `pages`, treating unset values as zero.
    pub total_pages: i64,
    /// Mean of ratings strictly above zero, or `0.0` when none qualify.
    pub average_rating: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_labels_parse_back() {
        for genre in Genre::ALL {
            assert_eq!(genre.label().parse::<Genre>(), Ok(genre));
        }
        assert!("Poetry".parse::<Genre>().is_err());
    }

    #[test]
    fn status_defaults_to_to_read() {
        assert_eq!(Status::default(), Status::ToRead);
        assert_eq!(BookDraft::new("Dune", "Herbert").status, Status::ToRead);
        assert_eq!("DNF".parse::<Status>(), Ok(Status::Dnf));
    }

    #[test]
    fn cycling_wraps_both_ways() {
        assert_eq!(Genre::Fiction.cycle(-1), Genre::Other);
        assert_eq!(Genre::Other.cycle(1), Genre::Fiction);
        assert_eq!(Status::Dnf.cycle(1), Status::ToRead);
        assert_eq!(SortOrder::RecentlyAdded.next(), SortOrder::Title);
    }
}
