//! Aggregate queries behind the statistics screen and the dashboard. Grouping
//! and counting happen in SQLite; this module only hydrates the rows.

use log::debug;

use super::Library;
use crate::error::StoreResult;
use crate::models::{AuthorCount, GenreCount, MonthlyAdditions, StatusCount, SummaryMetrics};

impl Library {
    /// Books per genre, most common first. Books without a genre are counted
    /// under `None` so the counts always add up to the collection size.
    pub fn aggregate_genre_counts(&self) -> StoreResult<Vec<GenreCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT genre, COUNT(*) AS count FROM books
             GROUP BY genre
             ORDER BY count DESC, genre",
        )?;
        let counts = stmt
            .query_map([], |row| {
                Ok(GenreCount {
                    genre: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    /// Books per reading status, most common first.
    pub fn aggregate_status_counts(&self) -> StoreResult<Vec<StatusCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT status, COUNT(*) AS count FROM books
             GROUP BY status
             ORDER BY count DESC, status",
        )?;
        let counts = stmt
            .query_map([], |row| {
                Ok(StatusCount {
                    status: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    /// One entry per calendar month that saw at least one addition, oldest
    /// first. Relies on `date_added` starting with `YYYY-MM`.
    pub fn aggregate_monthly_additions(&self) -> StoreResult<Vec<MonthlyAdditions>> {
        let mut stmt = self.conn.prepare(
            "SELECT substr(date_added, 1, 7) AS month, COUNT(*) AS count FROM books
             GROUP BY month
             ORDER BY month",
        )?;
        let months = stmt
            .query_map([], |row| {
                Ok(MonthlyAdditions {
                    month: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(months)
    }

    /// Most represented authors, truncated to `limit` entries.
    pub fn aggregate_top_authors(&self, limit: usize) -> StoreResult<Vec<AuthorCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT author, COUNT(*) AS count FROM books
             GROUP BY author
             ORDER BY count DESC, author COLLATE NOCASE
             LIMIT ?1",
        )?;
        let authors = stmt
            .query_map([limit as i64], |row| {
                Ok(AuthorCount {
                    author: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(authors)
    }

    /// Total books, total pages and the average of non-zero ratings in one
    /// pass. Zero ratings are treated as "not rated yet".
    pub fn summary_metrics(&self) -> StoreResult<SummaryMetrics> {
        let metrics = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(pages), 0),
                    COALESCE(AVG(CASE WHEN rating > 0 THEN rating END), 0.0)
             FROM books",
            [],
            |row| {
                Ok(SummaryMetrics {
                    total_books: row.get(0)?,
                    total_pages: row.get(1)?,
                    average_rating: row.get(2)?,
                })
            },
        )?;
        debug!("summary metrics: {metrics:?}");
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookDraft, Genre, Status};

    fn library() -> Library {
        let library = Library::open_in_memory().unwrap();
        library.initialize().unwrap();
        library
    }

    fn seed(library: &mut Library) {
        let books = [
            ("Dune", "Herbert", Some(Genre::ScienceFiction), Status::ToRead),
            ("Hobbit", "Tolkien", Some(Genre::Fantasy), Status::Reading),
            ("Silmarillion", "Tolkien", Some(Genre::Fantasy), Status::Completed),
            ("Children of Hurin", "Tolkien", Some(Genre::Fantasy), Status::Completed),
            ("Notebook", "Anon", None, Status::Dnf),
        ];
        for (title, author, genre, status) in books {
            library
                .add(&BookDraft {
                    genre,
                    status,
                    ..BookDraft::new(title, author)
                })
                .unwrap();
        }
    }

    #[test]
    fn genre_counts_sum_to_total_and_descend() {
        let mut library = library();
        seed(&mut library);

        let counts = library.aggregate_genre_counts().unwrap();
        assert_eq!(counts[0], GenreCount { genre: Some(Genre::Fantasy), count: 3 });
        assert!(counts.windows(2).all(|pair| pair[0].count >= pair[1].count));
        assert!(counts.iter().any(|c| c.genre.is_none()));

        let total: i64 = counts.iter().map(|c| c.count).sum();
        assert_eq!(total, library.count().unwrap());
    }

    #[test]
    fn status_counts_descend() {
        let mut library = library();
        seed(&mut library);

        let counts = library.aggregate_status_counts().unwrap();
        assert_eq!(counts[0], StatusCount { status: Status::Completed, count: 2 });
        assert_eq!(counts.len(), 4);
        assert_eq!(counts.iter().map(|c| c.count).sum::<i64>(), 5);
    }

    #[test]
    fn top_authors_truncate_to_limit() {
        let mut library = library();
        seed(&mut library);

        let authors = library.aggregate_top_authors(2).unwrap();
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0], AuthorCount { author: "Tolkien".into(), count: 3 });
        assert_eq!(authors[1].count, 1);
        assert!(library.aggregate_top_authors(0).unwrap().is_empty());
    }

    #[test]
    fn monthly_additions_group_by_month() {
        let mut library = library();
        seed(&mut library);
        library
            .conn
            .execute(
                "UPDATE books SET date_added = '2023-11-05 10:00:00' WHERE title = 'Dune'",
                [],
            )
            .unwrap();
        library
            .conn
            .execute(
                "UPDATE books SET date_added = '2024-02-01 08:30:00' WHERE title = 'Hobbit'",
                [],
            )
            .unwrap();

        let months = library.aggregate_monthly_additions().unwrap();
        assert_eq!(months[0], MonthlyAdditions { month: "2023-11".into(), count: 1 });
        assert_eq!(months[1], MonthlyAdditions { month: "2024-02".into(), count: 1 });
        assert!(months.windows(2).all(|pair| pair[0].month < pair[1].month));
        assert_eq!(months.iter().map(|m| m.count).sum::<i64>(), 5);
    }

    #[test]
    fn summary_ignores_unrated_and_zero_ratings() {
        let mut library = library();
        assert_eq!(library.summary_metrics().unwrap(), SummaryMetrics::default());

        library
            .add(&BookDraft {
                rating: Some(4.5),
                pages: Some(300),
                ..BookDraft::new("Rated", "A")
            })
            .unwrap();
        library.add(&BookDraft::new("Unrated", "B")).unwrap();
        library
            .add(&BookDraft {
                rating: Some(0.0),
                pages: Some(120),
                ..BookDraft::new("Zero", "C")
            })
            .unwrap();

        let metrics = library.summary_metrics().unwrap();
        assert_eq!(metrics.total_books, 3);
        assert_eq!(metrics.total_pages, 420);
        assert_eq!(metrics.average_rating, 4.5);
    }
}
