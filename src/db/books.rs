use chrono::{Datelike, Local, NaiveDateTime};
use log::{debug, info};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, OptionalExtension, Row};

use super::Library;
use crate::error::{StoreError, StoreResult, ValidationError};
use crate::models::{Book, BookDraft, BookFilter, Genre, SortOrder, Status};

/// Text layout of `date_added`. Second precision keeps the `YYYY-MM` prefix
/// usable for the monthly aggregate via `substr`.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column list shared by every query that hydrates a [`Book`]; the order must
/// match [`book_from_row`].
const BOOK_COLUMNS: &str = "id, title, author, genre, isbn, publication_year, pages, rating, \
                            status, date_added, notes";

const MIN_PUBLICATION_YEAR: i32 = 1000;
const MAX_RATING: f64 = 5.0;

/// Check a draft against the book invariants. Whitespace-only title or author
/// counts as empty.
pub fn validate(draft: &BookDraft) -> Result<(), ValidationError> {
    if draft.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if draft.author.trim().is_empty() {
        return Err(ValidationError::EmptyAuthor);
    }
    if let Some(year) = draft.publication_year {
        let max = Local::now().year();
        if !(MIN_PUBLICATION_YEAR..=max).contains(&year) {
            return Err(ValidationError::PublicationYear { year, max });
        }
    }
    if let Some(pages) = draft.pages {
        if pages < 1 {
            return Err(ValidationError::Pages(pages));
        }
    }
    if let Some(rating) = draft.rating {
        // NaN fails the range check.
        let in_range = (0.0..=MAX_RATING).contains(&rating);
        if !in_range || (rating * 2.0).fract() != 0.0 {
            return Err(ValidationError::Rating(rating));
        }
    }
    Ok(())
}

/// Map one `SELECT {BOOK_COLUMNS}` row onto a [`Book`].
fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    let date_added: String = row.get(9)?;
    let date_added = NaiveDateTime::parse_from_str(&date_added, DATE_FORMAT)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(err)))?;

    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        genre: row.get(3)?,
        isbn: row.get(4)?,
        publication_year: row.get(5)?,
        pages: row.get(6)?,
        rating: row.get(7)?,
        status: row.get(8)?,
        date_added,
        notes: row.get(10)?,
    })
}

fn order_clause(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::Title => "ORDER BY title COLLATE NOCASE, id",
        SortOrder::Author => "ORDER BY author COLLATE NOCASE, title COLLATE NOCASE, id",
        SortOrder::Rating => "ORDER BY rating IS NULL, rating DESC, title COLLATE NOCASE, id",
        SortOrder::RecentlyAdded => "ORDER BY date_added DESC, id DESC",
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

impl Library {
    /// Insert a new book and return its id. `date_added` is stamped here.
    pub fn add(&mut self, draft: &BookDraft) -> StoreResult<i64> {
        validate(draft)?;
        let date_added = Local::now().naive_local().format(DATE_FORMAT).to_string();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO books
                (title, author, genre, isbn, publication_year, pages, rating, status, date_added, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                draft.title,
                draft.author,
                draft.genre,
                draft.isbn,
                draft.publication_year,
                draft.pages,
                draft.rating,
                draft.status,
                date_added,
                draft.notes,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!("added book {id} '{}'", draft.title);
        Ok(id)
    }

    /// Replace every mutable field of an existing book. `id` and
    /// `date_added` are left untouched.
    pub fn update(&mut self, id: i64, draft: &BookDraft) -> StoreResult<()> {
        validate(draft)?;

        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE books SET
                title = ?1, author = ?2, genre = ?3, isbn = ?4, publication_year = ?5,
                pages = ?6, rating = ?7, status = ?8, notes = ?9
             WHERE id = ?10",
            params![
                draft.title,
                draft.author,
                draft.genre,
                draft.isbn,
                draft.publication_year,
                draft.pages,
                draft.rating,
                draft.status,
                draft.notes,
                id,
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(id));
        }
        tx.commit()?;

        info!("updated book {id} '{}'", draft.title);
        Ok(())
    }

    /// Permanently remove a book. Returns the deleted title, or `None` when
    /// nothing matched; deleting a missing id is not an error.
    pub fn delete(&mut self, id: i64) -> StoreResult<Option<String>> {
        let tx = self.conn.transaction()?;
        let title: Option<String> = tx
            .query_row("SELECT title FROM books WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;

        if title.is_some() {
            tx.execute("DELETE FROM books WHERE id = ?1", [id])?;
        }
        tx.commit()?;

        match &title {
            Some(title) => info!("deleted book {id} '{title}'"),
            None => debug!("delete of missing book {id} ignored"),
        }
        Ok(title)
    }

    pub fn get(&self, id: i64) -> StoreResult<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1");
        let book = self.conn.query_row(&sql, [id], book_from_row).optional()?;
        Ok(book)
    }

    /// Filtered, ordered listing backing the "My Books" screen.
    pub fn list(&self, filter: &BookFilter, sort: SortOrder) -> StoreResult<Vec<Book>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<&dyn ToSql> = Vec::new();

        if let Some(status) = &filter.status {
            clauses.push("status = ?");
            values.push(status);
        }
        if let Some(genre) = &filter.genre {
            clauses.push("genre = ?");
            values.push(genre);
        }

        let mut sql = format!("SELECT {BOOK_COLUMNS} FROM books");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push(' ');
        sql.push_str(order_clause(sort));
        debug!("listing books: {sql}");

        let mut stmt = self.conn.prepare(&sql)?;
        let books = stmt
            .query_map(values.as_slice(), book_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }

    /// Case-insensitive substring search across title, author and genre. A
    /// blank term yields nothing rather than the whole collection; otherwise
    /// the term is matched as typed, surrounding spaces included.
    pub fn search(&self, term: &str) -> StoreResult<Vec<Book>> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", escape_like(term));
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books
             WHERE title LIKE ?1 ESCAPE '\\'
                OR author LIKE ?1 ESCAPE '\\'
                OR genre LIKE ?1 ESCAPE '\\'
             ORDER BY title COLLATE NOCASE, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let books = stmt
            .query_map([pattern], book_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!("search '{term}' matched {} book(s)", books.len());
        Ok(books)
    }

    /// Newest additions first, for the dashboard.
    pub fn recently_added(&self, limit: usize) -> StoreResult<Vec<Book>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books {} LIMIT ?1",
            order_clause(SortOrder::RecentlyAdded)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let books = stmt
            .query_map([limit as i64], book_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }

    pub fn currently_reading(&self, limit: usize) -> StoreResult<Vec<Book>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE status = ?1 {} LIMIT ?2",
            order_clause(SortOrder::RecentlyAdded)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let books = stmt
            .query_map(params![Status::Reading, limit as i64], book_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }

    /// Distinct genres present in the collection, in presentation order.
    /// Feeds the genre filter so it only offers choices that match something.
    pub fn genres_in_use(&self) -> StoreResult<Vec<Genre>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT genre FROM books WHERE genre IS NOT NULL")?;
        let mut genres = stmt
            .query_map([], |row| row.get::<_, Genre>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        genres.sort();
        Ok(genres)
    }

    pub fn count(&self) -> StoreResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> Library {
        let library = Library::open_in_memory().unwrap();
        library.initialize().unwrap();
        library
    }

    fn draft(title: &str, author: &str, genre: Genre, status: Status) -> BookDraft {
        BookDraft {
            genre: Some(genre),
            status,
            ..BookDraft::new(title, author)
        }
    }

    #[test]
    fn add_then_get_returns_submitted_fields() {
        let mut library = library();
        let input = BookDraft {
            title: "The Left Hand of Darkness".into(),
            author: "Ursula K. Le Guin".into(),
            genre: Some(Genre::ScienceFiction),
            isbn: Some("978-0441478125".into()),
            publication_year: Some(1969),
            pages: Some(304),
            rating: Some(4.5),
            status: Status::Completed,
            notes: Some("Reread in winter".into()),
        };

        let before = Local::now().naive_local() - chrono::Duration::seconds(1);
        let id = library.add(&input).unwrap();
        let book = library.get(id).unwrap().expect("book should exist");

        assert_eq!(book.id, id);
        assert_eq!(book.to_draft(), input);
        assert!(book.date_added >= before);
    }

    #[test]
    fn ids_are_unique() {
        let mut library = library();
        let first = library.add(&BookDraft::new("Emma", "Austen")).unwrap();
        let second = library.add(&BookDraft::new("Emma", "Austen")).unwrap();
        assert_ne!(first, second);
        assert_eq!(library.count().unwrap(), 2);
    }

    #[test]
    fn update_replaces_fields_but_keeps_identity() {
        let mut library = library();
        let id = library.add(&BookDraft::new("Dune", "Herbert")).unwrap();
        let original = library.get(id).unwrap().unwrap();

        let replacement = BookDraft {
            genre: Some(Genre::ScienceFiction),
            pages: Some(412),
            rating: Some(5.0),
            status: Status::Reading,
            notes: Some("Spice".into()),
            ..BookDraft::new("Dune Messiah", "Frank Herbert")
        };
        library.update(id, &replacement).unwrap();

        let updated = library.get(id).unwrap().unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(updated.date_added, original.date_added);
        assert_eq!(updated.to_draft(), replacement);
    }

    #[test]
    fn update_of_missing_book_is_not_found() {
        let mut library = library();
        let err = library
            .update(99, &BookDraft::new("Ghost", "Nobody"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(99)));
        assert_eq!(library.count().unwrap(), 0);
    }

    #[test]
    fn update_validates_before_touching_the_row() {
        let mut library = library();
        let id = library.add(&BookDraft::new("Dune", "Herbert")).unwrap();
        let err = library.update(id, &BookDraft::new("Dune", " ")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::EmptyAuthor)
        ));
        assert_eq!(library.get(id).unwrap().unwrap().author, "Herbert");
    }

    #[test]
    fn delete_is_idempotent_and_reports_title() {
        let mut library = library();
        let id = library.add(&BookDraft::new("Hobbit", "Tolkien")).unwrap();

        assert_eq!(library.delete(id).unwrap().as_deref(), Some("Hobbit"));
        assert!(library.get(id).unwrap().is_none());
        assert_eq!(library.delete(id).unwrap(), None);
    }

    #[test]
    fn empty_title_or_author_is_rejected() {
        let mut library = library();
        let err = library.add(&BookDraft::new("", "Tolkien")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::EmptyTitle)
        ));
        let err = library.add(&BookDraft::new("Hobbit", "")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::EmptyAuthor)
        ));
        assert_eq!(library.count().unwrap(), 0);
    }

    #[test]
    fn numeric_bounds_are_enforced() {
        let base = BookDraft::new("Dune", "Herbert");
        let next_year = Local::now().year() + 1;

        for bad in [
            BookDraft { publication_year: Some(999), ..base.clone() },
            BookDraft { publication_year: Some(next_year), ..base.clone() },
            BookDraft { pages: Some(0), ..base.clone() },
            BookDraft { rating: Some(5.5), ..base.clone() },
            BookDraft { rating: Some(-0.5), ..base.clone() },
            BookDraft { rating: Some(3.3), ..base.clone() },
            BookDraft { rating: Some(f64::NAN), ..base.clone() },
        ] {
            assert!(validate(&bad).is_err(), "{bad:?} should be rejected");
        }

        let good = BookDraft {
            publication_year: Some(1000),
            pages: Some(1),
            rating: Some(0.0),
            ..base
        };
        assert_eq!(validate(&good), Ok(()));
    }

    #[test]
    fn list_by_title_is_ordered() {
        let mut library = library();
        for title in ["Middlemarch", "Beloved", "Persuasion", "Atonement"] {
            library.add(&BookDraft::new(title, "Someone")).unwrap();
        }

        let books = library.list(&BookFilter::all(), SortOrder::Title).unwrap();
        let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["Atonement", "Beloved", "Middlemarch", "Persuasion"]);
    }

    #[test]
    fn list_filters_by_status_and_genre() {
        let mut library = library();
        library
            .add(&draft("Dune", "Herbert", Genre::ScienceFiction, Status::ToRead))
            .unwrap();
        let hobbit = library
            .add(&draft("Hobbit", "Tolkien", Genre::Fantasy, Status::Reading))
            .unwrap();
        library
            .add(&draft("Hyperion", "Simmons", Genre::ScienceFiction, Status::Reading))
            .unwrap();

        let reading_fantasy = library
            .list(
                &BookFilter::all()
                    .with_status(Status::Reading)
                    .with_genre(Genre::Fantasy),
                SortOrder::Title,
            )
            .unwrap();
        assert_eq!(reading_fantasy.len(), 1);
        assert_eq!(reading_fantasy[0].id, hobbit);

        let scifi = library
            .list(&BookFilter::all().with_genre(Genre::ScienceFiction), SortOrder::Author)
            .unwrap();
        let authors: Vec<_> = scifi.iter().map(|b| b.author.as_str()).collect();
        assert_eq!(authors, ["Herbert", "Simmons"]);

        let none = library
            .list(&BookFilter::all().with_status(Status::Dnf), SortOrder::Title)
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn rating_sort_puts_unrated_last() {
        let mut library = library();
        for (title, rating) in [("A", None), ("B", Some(3.0)), ("C", Some(4.5)), ("D", Some(0.0))] {
            library
                .add(&BookDraft { rating, ..BookDraft::new(title, "X") })
                .unwrap();
        }

        let books = library.list(&BookFilter::all(), SortOrder::Rating).unwrap();
        let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["C", "B", "D", "A"]);
    }

    #[test]
    fn recently_added_prefers_newest() {
        let mut library = library();
        let first = library.add(&BookDraft::new("First", "X")).unwrap();
        let second = library.add(&BookDraft::new("Second", "X")).unwrap();

        let books = library.list(&BookFilter::all(), SortOrder::RecentlyAdded).unwrap();
        assert_eq!(books[0].id, second);
        assert_eq!(books[1].id, first);
        assert_eq!(library.recently_added(1).unwrap()[0].id, second);
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let mut library = library();
        library
            .add(&draft("Dune", "Herbert", Genre::ScienceFiction, Status::ToRead))
            .unwrap();
        let hobbit = library
            .add(&draft("Hobbit", "Tolkien", Genre::Fantasy, Status::Reading))
            .unwrap();

        let by_author = library.search("tolkien").unwrap();
        assert_eq!(by_author.len(), 1);
        assert_eq!(by_author[0].id, hobbit);

        assert_eq!(library.search("FANTA").unwrap().len(), 1);
        assert_eq!(library.search("science").unwrap()[0].title, "Dune");
        assert!(library.search("").unwrap().is_empty());
        assert!(library.search("   ").unwrap().is_empty());
    }

    #[test]
    fn search_returns_each_book_once_and_treats_wildcards_literally() {
        let mut library = library();
        library
            .add(&draft("Fantasy Worlds", "Fanta Sy", Genre::Fantasy, Status::ToRead))
            .unwrap();
        library.add(&BookDraft::new("100% Pure", "Anon")).unwrap();

        assert_eq!(library.search("fanta").unwrap().len(), 1);
        let percent = library.search("%").unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].title, "100% Pure");
        assert!(library.search("_").unwrap().is_empty());
    }

    #[test]
    fn search_keeps_surrounding_spaces() {
        let mut library = library();
        library.add(&BookDraft::new("Offshore", "Penelope Fitzgerald")).unwrap();
        let tale = library
            .add(&BookDraft::new("A Tale of Two Cities", "Charles Dickens"))
            .unwrap();

        let found = library.search(" of ").unwrap();
        assert_eq!(found.iter().map(|b| b.id).collect::<Vec<_>>(), vec![tale]);
        assert_eq!(library.search("of").unwrap().len(), 2);
    }

    #[test]
    fn dashboard_queries() {
        let mut library = library();
        library
            .add(&draft("Dune", "Herbert", Genre::ScienceFiction, Status::Reading))
            .unwrap();
        library
            .add(&draft("Emma", "Austen", Genre::Romance, Status::Completed))
            .unwrap();
        library
            .add(&draft("Dracula", "Stoker", Genre::Fiction, Status::Reading))
            .unwrap();
        library.add(&BookDraft::new("Untitled", "Anon")).unwrap();

        let reading = library.currently_reading(3).unwrap();
        assert_eq!(reading.len(), 2);
        assert!(reading.iter().all(|b| b.status == Status::Reading));

        assert_eq!(
            library.genres_in_use().unwrap(),
            vec![Genre::Fiction, Genre::ScienceFiction, Genre::Romance]
        );
    }

    #[test]
    fn escape_like_handles_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
