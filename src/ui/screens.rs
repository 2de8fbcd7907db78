use anyhow::{Context, Result};

use crate::db::Library;
use crate::models::{
    AuthorCount, Book, BookFilter, Genre, GenreCount, MonthlyAdditions, SortOrder, Status,
    StatusCount, SummaryMetrics,
};

/// Rows shown in the dashboard's "Recently Added" panel.
const RECENT_LIMIT: usize = 5;
/// Rows shown in the dashboard's "Currently Reading" panel.
const READING_LIMIT: usize = 3;
/// Entries in the statistics screen's top genre and author charts.
const TOP_LIMIT: usize = 5;

/// Clamp `selected + offset` into `0..len`.
fn moved(selected: usize, len: usize, offset: isize) -> usize {
    if len == 0 {
        return 0;
    }
    (selected as isize + offset).clamp(0, len as isize - 1) as usize
}

/// Landing screen: headline counts plus the newest and in-progress books.
pub(crate) struct DashboardScreen {
    pub(crate) total: i64,
    pub(crate) reading_count: i64,
    pub(crate) completed_count: i64,
    pub(crate) recent: Vec<Book>,
    pub(crate) reading: Vec<Book>,
}

impl DashboardScreen {
    pub(crate) fn load(library: &Library) -> Result<Self> {
        let statuses = library
            .aggregate_status_counts()
            .context("failed to load status counts")?;
        let count_for = |status: Status| {
            statuses
                .iter()
                .find(|c| c.status == status)
                .map(|c| c.count)
                .unwrap_or(0)
        };

        Ok(Self {
            total: library.count().context("failed to count books")?,
            reading_count: count_for(Status::Reading),
            completed_count: count_for(Status::Completed),
            recent: library
                .recently_added(RECENT_LIMIT)
                .context("failed to load recent books")?,
            reading: library
                .currently_reading(READING_LIMIT)
                .context("failed to load books in progress")?,
        })
    }
}

/// The "My Books" grid: filtered, sorted listing with a cursor.
pub(crate) struct LibraryScreen {
    pub(crate) books: Vec<Book>,
    pub(crate) filter: BookFilter,
    pub(crate) sort: SortOrder,
    /// Genres present in the collection; the genre filter cycles through these.
    pub(crate) genres: Vec<Genre>,
    pub(crate) selected: usize,
}

impl LibraryScreen {
    pub(crate) fn load(library: &Library) -> Result<Self> {
        let mut screen = Self {
            books: Vec::new(),
            filter: BookFilter::all(),
            sort: SortOrder::default(),
            genres: Vec::new(),
            selected: 0,
        };
        screen.reload(library)?;
        Ok(screen)
    }

    /// Re-run the query with the current filter and sort. Keeps the cursor
    /// on `focus_id` when it is still in the result set.
    pub(crate) fn reload_focus(&mut self, library: &Library, focus_id: Option<i64>) -> Result<()> {
        self.genres = library
            .genres_in_use()
            .context("failed to load genres")?;
        if let Some(genre) = self.filter.genre {
            if !self.genres.contains(&genre) {
                self.filter.genre = None;
            }
        }
        self.books = library
            .list(&self.filter, self.sort)
            .context("failed to load books")?;

        if let Some(id) = focus_id {
            if let Some(idx) = self.books.iter().position(|b| b.id == id) {
                self.selected = idx;
                return Ok(());
            }
        }
        self.ensure_in_bounds();
        Ok(())
    }

    pub(crate) fn reload(&mut self, library: &Library) -> Result<()> {
        let focus = self.current_book().map(|b| b.id);
        self.reload_focus(library, focus)
    }

    /// All -> each status -> All.
    pub(crate) fn cycle_status(&mut self) {
        self.filter.status = match self.filter.status {
            None => Some(Status::ALL[0]),
            Some(status) if status == Status::ALL[Status::ALL.len() - 1] => None,
            Some(status) => Some(status.cycle(1)),
        };
        self.selected = 0;
    }

    /// All -> each genre in use -> All.
    pub(crate) fn cycle_genre(&mut self) {
        self.filter.genre = match self.filter.genre {
            None => self.genres.first().copied(),
            Some(current) => {
                let idx = self.genres.iter().position(|g| *g == current);
                idx.and_then(|i| self.genres.get(i + 1)).copied()
            }
        };
        self.selected = 0;
    }

    pub(crate) fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
    }

    pub(crate) fn current_book(&self) -> Option<&Book> {
        self.books.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = moved(self.selected, self.books.len(), offset);
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.books.len().saturating_sub(1);
    }

    fn ensure_in_bounds(&mut self) {
        if self.selected >= self.books.len() {
            self.selected = self.books.len().saturating_sub(1);
        }
    }

    pub(crate) fn filter_summary(&self) -> String {
        format!(
            "Status: {}  •  Genre: {}  •  Sort: {}",
            self.filter.status.map(Status::label).unwrap_or("All"),
            self.filter.genre.map(Genre::label).unwrap_or("All"),
            self.sort.label()
        )
    }
}

/// Live search: the query is re-run on every keystroke.
#[derive(Default)]
pub(crate) struct SearchScreen {
    pub(crate) query: String,
    pub(crate) results: Vec<Book>,
    pub(crate) selected: usize,
}

impl SearchScreen {
    pub(crate) fn refresh(&mut self, library: &Library) -> Result<()> {
        self.results = library
            .search(&self.query)
            .context("failed to search books")?;
        if self.selected >= self.results.len() {
            self.selected = self.results.len().saturating_sub(1);
        }
        Ok(())
    }

    pub(crate) fn push_char(&mut self, library: &Library, ch: char) -> Result<()> {
        self.query.push(ch);
        self.selected = 0;
        self.refresh(library)
    }

    pub(crate) fn backspace(&mut self, library: &Library) -> Result<()> {
        self.query.pop();
        self.selected = 0;
        self.refresh(library)
    }

    pub(crate) fn current_book(&self) -> Option<&Book> {
        self.results.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = moved(self.selected, self.results.len(), offset);
    }
}

/// Snapshot of every aggregate shown on the statistics screen.
pub(crate) struct StatsScreen {
    pub(crate) summary: SummaryMetrics,
    pub(crate) statuses: Vec<StatusCount>,
    pub(crate) genres: Vec<GenreCount>,
    pub(crate) authors: Vec<AuthorCount>,
    pub(crate) months: Vec<MonthlyAdditions>,
}

impl StatsScreen {
    pub(crate) fn load(library: &Library) -> Result<Self> {
        let mut genres = library
            .aggregate_genre_counts()
            .context("failed to load genre counts")?;
        genres.truncate(TOP_LIMIT);

        Ok(Self {
            summary: library
                .summary_metrics()
                .context("failed to load summary metrics")?,
            statuses: library
                .aggregate_status_counts()
                .context("failed to load status counts")?,
            genres,
            authors: library
                .aggregate_top_authors(TOP_LIMIT)
                .context("failed to load top authors")?,
            months: library
                .aggregate_monthly_additions()
                .context("failed to load reading timeline")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookDraft;

    fn seeded() -> Library {
        let mut library = Library::open_in_memory().unwrap();
        library.initialize().unwrap();
        for (title, genre, status) in [
            ("Dune", Genre::ScienceFiction, Status::Reading),
            ("Hobbit", Genre::Fantasy, Status::Completed),
            ("Emma", Genre::Romance, Status::ToRead),
        ] {
            library
                .add(&BookDraft {
                    genre: Some(genre),
                    status,
                    ..BookDraft::new(title, "Someone")
                })
                .unwrap();
        }
        library
    }

    #[test]
    fn selection_is_clamped() {
        assert_eq!(moved(0, 3, -5), 0);
        assert_eq!(moved(1, 3, 5), 2);
        assert_eq!(moved(4, 0, 1), 0);
    }

    #[test]
    fn genre_filter_cycles_through_genres_in_use() {
        let library = seeded();
        let mut screen = LibraryScreen::load(&library).unwrap();
        assert_eq!(screen.books.len(), 3);

        screen.cycle_genre();
        assert_eq!(screen.filter.genre, Some(Genre::ScienceFiction));
        screen.reload(&library).unwrap();
        assert_eq!(screen.books.len(), 1);

        screen.cycle_genre();
        screen.cycle_genre();
        assert_eq!(screen.filter.genre, Some(Genre::Romance));
        screen.cycle_genre();
        assert_eq!(screen.filter.genre, None);
    }

    #[test]
    fn status_filter_returns_to_all() {
        let mut screen = LibraryScreen::load(&seeded()).unwrap();
        for _ in 0..Status::ALL.len() {
            screen.cycle_status();
            assert!(screen.filter.status.is_some());
        }
        screen.cycle_status();
        assert_eq!(screen.filter.status, None);
    }

    #[test]
    fn dashboard_counts_statuses() {
        let dashboard = DashboardScreen::load(&seeded()).unwrap();
        assert_eq!(dashboard.total, 3);
        assert_eq!(dashboard.reading_count, 1);
        assert_eq!(dashboard.completed_count, 1);
        assert_eq!(dashboard.reading.len(), 1);
        assert_eq!(dashboard.recent.len(), 3);
    }

    #[test]
    fn search_screen_tracks_query() {
        let library = seeded();
        let mut search = SearchScreen::default();
        for ch in "hob".chars() {
            search.push_char(&library, ch).unwrap();
        }
        assert_eq!(search.current_book().map(|b| b.title.as_str()), Some("Hobbit"));
        search.backspace(&library).unwrap();
        search.backspace(&library).unwrap();
        search.backspace(&library).unwrap();
        assert!(search.results.is_empty());
    }
}
