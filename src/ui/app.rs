use std::mem;

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use log::{error, info};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use ratatui::Frame;

use crate::cover::Cover;
use crate::db::Library;
use crate::models::{Book, BookDraft, Genre};

use super::forms::{BookField, BookForm, ConfirmBookDelete};
use super::helpers::{
    bar_line, build_cover_lines, centered_rect, rating_stars, status_badge, surface_error,
};
use super::screens::{DashboardScreen, LibraryScreen, SearchScreen, StatsScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the tab bar at the top of every screen.
const HEADER_HEIGHT: u16 = 3;
/// Height allocation for a cover card, borders included.
const COVER_HEIGHT: u16 = 7;
/// Width taken by the label column of the text bar charts.
const BAR_LABEL_WIDTH: usize = 26;

const TAB_TITLES: [&str; 4] = ["1 Dashboard", "2 My Books", "3 Search", "4 Statistics"];

/// High-level navigation states, one per tab.
enum Screen {
    Dashboard(DashboardScreen),
    Library(LibraryScreen),
    Search(SearchScreen),
    Statistics(StatsScreen),
}

impl Screen {
    fn tab_index(&self) -> usize {
        match self {
            Screen::Dashboard(_) => 0,
            Screen::Library(_) => 1,
            Screen::Search(_) => 2,
            Screen::Statistics(_) => 3,
        }
    }
}

/// Fine-grained modes layered over the current screen.
enum Mode {
    Normal,
    AddingBook(BookForm),
    EditingBook { id: i64, form: BookForm },
    ConfirmDelete(ConfirmBookDelete),
    Help,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI. Owns the library handle
/// for the whole session.
pub struct App {
    library: Library,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    /// First-run banner; cleared on the first key press of the session.
    show_welcome: bool,
}

impl App {
    /// `first_run` is the result of [`Library::initialize`].
    pub fn new(library: Library, first_run: bool) -> Result<Self> {
        let dashboard = DashboardScreen::load(&library)?;
        Ok(Self {
            library,
            screen: Screen::Dashboard(dashboard),
            mode: Mode::Normal,
            status: None,
            show_welcome: first_run,
        })
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBook(form) => self.handle_form_key(code, None, form)?,
            Mode::EditingBook { id, form } => self.handle_form_key(code, Some(id), form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::Help => Mode::Normal,
        };
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        self.show_welcome = false;

        if matches!(self.screen, Screen::Search(_)) {
            return self.handle_search_key(code);
        }

        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if matches!(self.screen, Screen::Dashboard(_)) {
                    *exit = true;
                } else {
                    self.clear_status();
                    self.open_tab(0)?;
                }
            }
            KeyCode::Char(ch @ '1'..='4') => {
                self.clear_status();
                self.open_tab(ch as usize - '1' as usize)?;
            }
            KeyCode::Tab => self.cycle_tab(1)?,
            KeyCode::BackTab => self.cycle_tab(-1)?,
            KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::AddingBook(BookForm::default()));
            }
            KeyCode::Char('?') => return Ok(Mode::Help),
            _ => {
                if matches!(self.screen, Screen::Library(_)) {
                    return self.handle_library_key(code);
                }
            }
        }
        Ok(Mode::Normal)
    }

    fn handle_library_key(&mut self, code: KeyCode) -> Result<Mode> {
        let Screen::Library(books) = &mut self.screen else {
            return Ok(Mode::Normal);
        };

        let mut status_to_set: Option<(String, StatusKind)> = None;
        match code {
            KeyCode::Up => books.move_selection(-1),
            KeyCode::Down => books.move_selection(1),
            KeyCode::PageUp => books.move_selection(-5),
            KeyCode::PageDown => books.move_selection(5),
            KeyCode::Home => books.select_first(),
            KeyCode::End => books.select_last(),
            KeyCode::Char('s') | KeyCode::Char('S') => {
                books.cycle_status();
                books.reload(&self.library)?;
            }
            KeyCode::Char('g') | KeyCode::Char('G') => {
                books.cycle_genre();
                books.reload(&self.library)?;
            }
            KeyCode::Char('o') | KeyCode::Char('O') => {
                books.cycle_sort();
                books.reload(&self.library)?;
            }
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(book) = books.current_book() {
                    return Ok(Mode::EditingBook {
                        id: book.id,
                        form: BookForm::from_book(book),
                    });
                }
                status_to_set = Some(("No book selected to edit.".into(), StatusKind::Error));
            }
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(book) = books.current_book() {
                    return Ok(Mode::ConfirmDelete(ConfirmBookDelete::from(book)));
                }
                status_to_set = Some(("No book selected to delete.".into(), StatusKind::Error));
            }
            _ => {}
        }

        if let Some((text, kind)) = status_to_set {
            self.set_status(text, kind);
        }
        Ok(Mode::Normal)
    }

    /// The search screen captures printable keys for the query, so only
    /// navigation and editing keys are interpreted here.
    fn handle_search_key(&mut self, code: KeyCode) -> Result<Mode> {
        let Screen::Search(search) = &mut self.screen else {
            return Ok(Mode::Normal);
        };

        let mut leave = false;
        let mut tab_offset = 0;
        match code {
            KeyCode::Esc => leave = true,
            KeyCode::Tab => tab_offset = 1,
            KeyCode::BackTab => tab_offset = -1,
            KeyCode::Up => search.move_selection(-1),
            KeyCode::Down => search.move_selection(1),
            KeyCode::PageUp => search.move_selection(-5),
            KeyCode::PageDown => search.move_selection(5),
            KeyCode::Backspace => search.backspace(&self.library)?,
            KeyCode::Enter => {
                if let Some(book) = search.current_book() {
                    return Ok(Mode::EditingBook {
                        id: book.id,
                        form: BookForm::from_book(book),
                    });
                }
            }
            KeyCode::Delete => {
                if let Some(book) = search.current_book() {
                    return Ok(Mode::ConfirmDelete(ConfirmBookDelete::from(book)));
                }
            }
            KeyCode::Char(ch) => search.push_char(&self.library, ch)?,
            _ => {}
        }

        if leave {
            self.clear_status();
            self.open_tab(0)?;
        } else if tab_offset != 0 {
            self.cycle_tab(tab_offset)?;
        }
        Ok(Mode::Normal)
    }

    /// Shared key handling for the add and edit dialogs. `id` is `None` when
    /// adding.
    fn handle_form_key(&mut self, code: KeyCode, id: Option<i64>, mut form: BookForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                let message = if id.is_some() {
                    "Edit cancelled."
                } else {
                    "Add book cancelled."
                };
                self.set_status(message, StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => form.move_focus(-1),
            KeyCode::Left => {
                form.adjust(-1);
            }
            KeyCode::Right => {
                form.adjust(1);
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_form(id, &form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(' ') if form.active.is_selector() => {
                form.adjust(1);
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if !keep_open {
            Ok(Mode::Normal)
        } else if let Some(id) = id {
            Ok(Mode::EditingBook { id, form })
        } else {
            Ok(Mode::AddingBook(form))
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmBookDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        error!("delete of book {} failed: {err:#}", confirm.id);
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::ConfirmDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    /// Ctrl+E edits the highlighted book from the search and library screens,
    /// without leaving the query.
    pub(crate) fn handle_ctrl_e(&mut self) -> Result<()> {
        if !matches!(self.mode, Mode::Normal) {
            return Ok(());
        }
        let book = match &self.screen {
            Screen::Search(search) => search.current_book(),
            Screen::Library(books) => books.current_book(),
            _ => return Ok(()),
        };
        match book.map(|book| (book.id, BookForm::from_book(book))) {
            Some((id, form)) => self.mode = Mode::EditingBook { id, form },
            None => self.set_status("No book selected to edit.", StatusKind::Error),
        }
        Ok(())
    }

    /// Persist the form. An `Err` means nothing was written; once the write
    /// commits, a failing refresh only reaches the footer so the dialog can
    /// close and a second Enter cannot repeat the write.
    fn save_form(&mut self, id: Option<i64>, form: &BookForm) -> Result<()> {
        let draft: BookDraft = form.parse_inputs()?;
        match id {
            Some(id) => {
                self.library
                    .update(id, &draft)
                    .context("failed to update book")?;
                self.refresh_after_write(Some(id), format!("'{}' has been updated!", draft.title));
            }
            None => {
                let id = self.library.add(&draft).context("failed to add book")?;
                self.refresh_after_write(
                    Some(id),
                    format!("'{}' has been added to your library!", draft.title),
                );
            }
        }
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmBookDelete) -> Result<()> {
        let deleted = self
            .library
            .delete(confirm.id)
            .context("failed to delete book")?;
        let message = match deleted {
            Some(title) => format!("'{title}' has been deleted from your library!"),
            None => {
                info!("book {} was already gone", confirm.id);
                "That book was already removed.".to_string()
            }
        };
        self.refresh_after_write(None, message);
        Ok(())
    }

    /// Reload the current screen after a committed write and report the
    /// outcome in the footer.
    fn refresh_after_write(&mut self, focus_id: Option<i64>, message: String) {
        match self.refresh_screen(focus_id) {
            Ok(()) => self.set_status(message, StatusKind::Info),
            Err(err) => {
                error!("refresh after write failed: {err:#}");
                self.set_status(
                    format!("{message} Reloading failed: {}", surface_error(&err)),
                    StatusKind::Error,
                );
            }
        }
    }

    /// Re-query whatever the current screen shows after a mutation.
    fn refresh_screen(&mut self, focus_id: Option<i64>) -> Result<()> {
        match &mut self.screen {
            Screen::Dashboard(dashboard) => *dashboard = DashboardScreen::load(&self.library)?,
            Screen::Library(books) => books.reload_focus(&self.library, focus_id)?,
            Screen::Search(search) => search.refresh(&self.library)?,
            Screen::Statistics(stats) => *stats = StatsScreen::load(&self.library)?,
        }
        Ok(())
    }

    fn open_tab(&mut self, index: usize) -> Result<()> {
        self.screen = match index {
            0 => Screen::Dashboard(DashboardScreen::load(&self.library)?),
            1 => Screen::Library(LibraryScreen::load(&self.library)?),
            2 => Screen::Search(SearchScreen::default()),
            _ => Screen::Statistics(StatsScreen::load(&self.library)?),
        };
        Ok(())
    }

    fn cycle_tab(&mut self, offset: isize) -> Result<()> {
        let len = TAB_TITLES.len() as isize;
        let next = (self.screen.tab_index() as isize + offset).rem_euclid(len);
        self.clear_status();
        self.open_tab(next as usize)
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_tabs(frame, chunks[0]);
        match &self.screen {
            Screen::Dashboard(dashboard) => self.draw_dashboard(frame, chunks[1], dashboard),
            Screen::Library(books) => self.draw_library(frame, chunks[1], books),
            Screen::Search(search) => self.draw_search(frame, chunks[1], search),
            Screen::Statistics(stats) => self.draw_statistics(frame, chunks[1], stats),
        }
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::AddingBook(form) => self.draw_book_form(frame, area, "Add New Book", form),
            Mode::EditingBook { form, .. } => self.draw_book_form(frame, area, "Edit Book", form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Help => self.draw_help(frame, area),
            Mode::Normal => {}
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let tabs = Tabs::new(TAB_TITLES)
            .select(self.screen.tab_index())
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::default().borders(Borders::ALL).title(" Bookshelf "));
        frame.render_widget(tabs, area);
    }

    fn draw_dashboard(&self, frame: &mut Frame, area: Rect, dashboard: &DashboardScreen) {
        let mut constraints = vec![Constraint::Length(3), Constraint::Min(0)];
        if self.show_welcome {
            constraints.insert(0, Constraint::Length(4));
        }
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);
        let (metrics_area, body_area) = if self.show_welcome {
            let banner = Paragraph::new(vec![
                Line::from(Span::styled(
                    "Welcome to your personal library!",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from("Press [a] to add your first book, or [?] for help."),
            ])
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(banner, chunks[0]);
            (chunks[1], chunks[2])
        } else {
            (chunks[0], chunks[1])
        };

        let metric_columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(metrics_area);
        let metrics = [
            ("Total Books", dashboard.total),
            ("Currently Reading", dashboard.reading_count),
            ("Completed", dashboard.completed_count),
        ];
        for ((label, value), column) in metrics.into_iter().zip(metric_columns.iter()) {
            let card = Paragraph::new(Span::styled(
                value.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(label));
            frame.render_widget(card, *column);
        }

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(body_area);

        let recent_block = Block::default()
            .borders(Borders::ALL)
            .title("Recently Added Books");
        if dashboard.recent.is_empty() {
            let message = Paragraph::new(
                "No books added yet. Start building your library by pressing 'a'.",
            )
            .wrap(Wrap { trim: true })
            .block(recent_block);
            frame.render_widget(message, columns[0]);
        } else {
            let items: Vec<ListItem> = dashboard.recent.iter().map(book_list_item).collect();
            frame.render_widget(List::new(items).block(recent_block), columns[0]);
        }

        let reading_block = Block::default()
            .borders(Borders::ALL)
            .title("Currently Reading");
        if dashboard.reading.is_empty() {
            let message = Paragraph::new("You're not reading anything right now.")
                .wrap(Wrap { trim: true })
                .block(reading_block);
            frame.render_widget(message, columns[1]);
        } else {
            let inner = reading_block.inner(columns[1]);
            frame.render_widget(reading_block, columns[1]);
            let slots = Layout::default()
                .direction(Direction::Vertical)
                .constraints(
                    dashboard
                        .reading
                        .iter()
                        .map(|_| Constraint::Length(COVER_HEIGHT - 2))
                        .collect::<Vec<_>>(),
                )
                .split(inner);
            for (book, slot) in dashboard.reading.iter().zip(slots.iter()) {
                let cover = Cover::for_book(&book.title, book.genre);
                let lines = build_cover_lines(&cover, &book.title, &book.author, slot.width, slot.height);
                frame.render_widget(Paragraph::new(lines), *slot);
            }
        }
    }

    fn draw_library(&self, frame: &mut Frame, area: Rect, books: &LibraryScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                format!("{} book(s)", books.books.len()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  •  {}", books.filter_summary())),
        ]))
        .block(Block::default().borders(Borders::ALL).title("My Books"));
        frame.render_widget(header, chunks[0]);

        if books.books.is_empty() {
            let message = Paragraph::new("No books found with the selected filters.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, chunks[1]);
            return;
        }

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);
        self.draw_book_list(frame, columns[0], "Books", &books.books, books.selected);
        if let Some(book) = books.current_book() {
            self.draw_book_detail(frame, columns[1], book);
        }
    }

    fn draw_search(&self, frame: &mut Frame, area: Rect, search: &SearchScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Search by title, author, or genre");
        let input = Paragraph::new(format!("Search: {}", search.query)).block(block.clone());
        frame.render_widget(input, chunks[0]);
        let inner = block.inner(chunks[0]);
        if matches!(self.mode, Mode::Normal) {
            let cursor_x = inner.x + "Search: ".len() as u16 + search.query.chars().count() as u16;
            frame.set_cursor_position((cursor_x, inner.y));
        }

        if search.results.is_empty() {
            let text = if search.query.trim().is_empty() {
                "Type to search your library."
            } else {
                "No books match your search."
            };
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, chunks[1]);
            return;
        }

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);
        let title = format!("Found {} book(s)", search.results.len());
        self.draw_book_list(frame, columns[0], &title, &search.results, search.selected);
        if let Some(book) = search.current_book() {
            self.draw_book_detail(frame, columns[1], book);
        }
    }

    fn draw_statistics(&self, frame: &mut Frame, area: Rect, stats: &StatsScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Percentage(50),
                Constraint::Min(0),
            ])
            .split(area);

        let summary = &stats.summary;
        let average = if summary.average_rating > 0.0 {
            format!("{:.1} / 5", summary.average_rating)
        } else {
            "n/a".to_string()
        };
        let metric_columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(chunks[0]);
        let metrics = [
            ("Total Books", summary.total_books.to_string()),
            ("Total Pages", summary.total_pages.to_string()),
            ("Average Rating", average),
        ];
        for ((label, value), column) in metrics.into_iter().zip(metric_columns.iter()) {
            let card = Paragraph::new(value)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(label));
            frame.render_widget(card, *column);
        }

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);

        let statuses: Vec<(String, i64)> = stats
            .statuses
            .iter()
            .map(|c| (c.status.label().to_string(), c.count))
            .collect();
        self.draw_bars(frame, top[0], "Reading Status", &statuses, "No books yet.");

        let genres: Vec<(String, i64)> = stats
            .genres
            .iter()
            .map(|c| (c.genre.map(Genre::label).unwrap_or("(no genre)").to_string(), c.count))
            .collect();
        self.draw_bars(frame, top[1], "Top Genres", &genres, "No genres yet.");

        let months: Vec<(String, i64)> = stats
            .months
            .iter()
            .map(|m| (m.month.clone(), m.count))
            .collect();
        self.draw_bars(
            frame,
            bottom[0],
            "Books Added Over Time",
            &months,
            "Add some books to see your reading timeline!",
        );

        let authors: Vec<(String, i64)> = stats
            .authors
            .iter()
            .map(|a| (a.author.clone(), a.count))
            .collect();
        self.draw_bars(frame, bottom[1], "Top Authors", &authors, "No authors yet.");
    }

    fn draw_bars(&self, frame: &mut Frame, area: Rect, title: &str, rows: &[(String, i64)], empty: &str) {
        let block = Block::default().borders(Borders::ALL).title(title.to_string());
        if rows.is_empty() {
            let message = Paragraph::new(empty.to_string())
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let inner_width = block.inner(area).width as usize;
        let bar_width = inner_width.saturating_sub(BAR_LABEL_WIDTH);
        let max = rows.iter().map(|(_, count)| *count).max().unwrap_or(0);
        let lines: Vec<Line> = rows
            .iter()
            .map(|(label, count)| {
                let label: String = label.chars().take(18).collect();
                bar_line(&label, *count, max, bar_width)
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_book_list(&self, frame: &mut Frame, area: Rect, title: &str, books: &[Book], selected: usize) {
        let items: Vec<ListItem> = books.iter().map(book_list_item).collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");
        let mut state = ListState::default().with_selected(Some(selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_book_detail(&self, frame: &mut Frame, area: Rect, book: &Book) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(COVER_HEIGHT), Constraint::Min(0)])
            .split(area);

        let cover_block = Block::default().borders(Borders::ALL);
        let inner = cover_block.inner(chunks[0]);
        let cover = Cover::for_book(&book.title, book.genre);
        let lines = build_cover_lines(&cover, &book.title, &book.author, inner.width, inner.height);
        frame.render_widget(Paragraph::new(lines).block(cover_block), chunks[0]);

        let label_style = Style::default().fg(Color::Gray);
        let field = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("{label}: "), label_style),
                Span::raw(value),
            ])
        };
        let mut lines = vec![
            Line::from(Span::styled(
                book.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            field("Author", book.author.clone()),
            field(
                "Genre",
                book.genre.map(Genre::label).unwrap_or("-").to_string(),
            ),
            Line::from(vec![
                Span::styled("Status: ", label_style),
                status_badge(book.status),
            ]),
            Line::from(vec![
                Span::styled("Rating: ", label_style),
                Span::styled(rating_stars(book.rating), Style::default().fg(Color::Yellow)),
            ]),
        ];
        if let Some(year) = book.publication_year {
            lines.push(field("Published", year.to_string()));
        }
        if let Some(pages) = book.pages {
            lines.push(field("Pages", pages.to_string()));
        }
        if let Some(isbn) = &book.isbn {
            lines.push(field("ISBN", isbn.clone()));
        }
        lines.push(field(
            "Added",
            book.date_added.format("%Y-%m-%d %H:%M").to_string(),
        ));
        if let Some(notes) = &book.notes {
            lines.push(Line::from(""));
            lines.push(Line::from(notes.clone()));
        }

        let details = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Details"));
        frame.render_widget(details, chunks[1]);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::AddingBook(_) | Mode::EditingBook { .. }) => &[
                ("[Tab/↑↓]", "Field"),
                ("[←→]", "Change"),
                ("[Enter]", "Save"),
                ("[Esc]", "Cancel"),
            ],
            (_, Mode::ConfirmDelete(_)) => &[("[y]", "Delete"), ("[n]", "Keep")],
            (_, Mode::Help) => &[("[any key]", "Close")],
            (Screen::Library(_), _) => &[
                ("[↑↓]", "Select"),
                ("[s]", "Status"),
                ("[g]", "Genre"),
                ("[o]", "Sort"),
                ("[a]", "Add"),
                ("[e]", "Edit"),
                ("[-]", "Delete"),
                ("[?]", "Help"),
                ("[q]", "Quit"),
            ],
            (Screen::Search(_), _) => &[
                ("[type]", "Search"),
                ("[↑↓]", "Select"),
                ("[Enter]", "Edit"),
                ("[Del]", "Delete"),
                ("[Tab]", "Next Tab"),
                ("[Esc]", "Back"),
            ],
            _ => &[
                ("[1-4/Tab]", "Switch"),
                ("[a]", "Add Book"),
                ("[?]", "Help"),
                ("[q]", "Quit"),
            ],
        };

        let mut spans = Vec::with_capacity(keys.len() * 2);
        for (key, action) in keys {
            spans.push(Span::styled(key.to_string(), key_style));
            spans.push(Span::raw(format!(" {action}   ")));
        }
        Line::from(spans)
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup_area = centered_rect(70, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(24), Constraint::Min(10)])
            .split(inner);

        // Live cover preview, refreshed as the title and genre change.
        let preview_title = if form.title.trim().is_empty() {
            "Book Title"
        } else {
            form.title.trim()
        };
        let preview_author = if form.author.trim().is_empty() {
            "Author Name"
        } else {
            form.author.trim()
        };
        let cover = Cover::for_book(preview_title, form.genre);
        let preview_height = COVER_HEIGHT.min(columns[0].height);
        let preview_area = Rect {
            height: preview_height,
            ..columns[0]
        };
        let preview_block = Block::default().borders(Borders::ALL).title("Preview");
        let preview_inner = preview_block.inner(preview_area);
        let preview = build_cover_lines(
            &cover,
            preview_title,
            preview_author,
            preview_inner.width,
            preview_inner.height,
        );
        frame.render_widget(Paragraph::new(preview).block(preview_block), preview_area);

        let form_area = columns[1];
        let mut lines: Vec<Line> = BookField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • ←→ to change • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }
        frame.render_widget(Paragraph::new(lines), form_area);

        if let Some((row, col)) = form.cursor_offset() {
            let cursor_x = (form_area.x + col as u16).min(form_area.right().saturating_sub(1));
            frame.set_cursor_position((cursor_x, form_area.y + row as u16));
        }
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmBookDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Delete")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete '{}' by {}?", confirm.title, confirm.author)),
            Line::from("This cannot be undone."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(70, 70, area);
        frame.render_widget(Clear, popup_area);

        let heading = Style::default().add_modifier(Modifier::BOLD);
        let lines = vec![
            Line::from(Span::styled("Dashboard", heading)),
            Line::from("Totals, your five newest books and what you're reading now."),
            Line::from(""),
            Line::from(Span::styled("My Books", heading)),
            Line::from("Filter by status [s] or genre [g], change the order [o]."),
            Line::from("Edit the highlighted book with [e] or Enter, delete it with [-]."),
            Line::from(""),
            Line::from(Span::styled("Search", heading)),
            Line::from("Type any part of a title, author or genre. Enter edits a result."),
            Line::from(""),
            Line::from(Span::styled("Statistics", heading)),
            Line::from("Status and genre breakdowns, top authors and books added per month."),
            Line::from(""),
            Line::from(Span::styled("Adding books", heading)),
            Line::from("Title and author are required. Ratings go from 0 to 5 in half steps."),
            Line::from("Status: To Read, Reading, Completed or DNF (did not finish)."),
        ];

        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Help"));
        frame.render_widget(paragraph, popup_area);
    }
}

/// One list row: cover swatch, title, author and status badge.
fn book_list_item(book: &Book) -> ListItem<'static> {
    let cover = Cover::for_book(&book.title, book.genre);
    let swatch = |rgb: crate::cover::Rgb| Span::styled("█", Style::default().fg(Color::Rgb(rgb.0, rgb.1, rgb.2)));
    ListItem::new(Line::from(vec![
        swatch(cover.start),
        swatch(cover.end),
        Span::raw(" "),
        Span::styled(book.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!(" by {} ", book.author), Style::default().fg(Color::Gray)),
        status_badge(book.status),
    ]))
}
