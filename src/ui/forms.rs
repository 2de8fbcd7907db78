use anyhow::{Context, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::db::validate;
use crate::models::{Book, BookDraft, Genre, Status};

const RATING_STEP: f64 = 0.5;
const MAX_RATING: f64 = 5.0;

/// Fields of the book form in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Genre,
    Isbn,
    Year,
    Pages,
    Rating,
    Status,
    Notes,
}

impl BookField {
    pub(crate) const ALL: [BookField; 9] = [
        BookField::Title,
        BookField::Author,
        BookField::Genre,
        BookField::Isbn,
        BookField::Year,
        BookField::Pages,
        BookField::Rating,
        BookField::Status,
        BookField::Notes,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            BookField::Title => "Title*",
            BookField::Author => "Author*",
            BookField::Genre => "Genre",
            BookField::Isbn => "ISBN",
            BookField::Year => "Publication Year",
            BookField::Pages => "Pages",
            BookField::Rating => "Rating",
            BookField::Status => "Status",
            BookField::Notes => "Notes",
        }
    }

    /// Selector fields change with Left/Right instead of typing.
    pub(crate) fn is_selector(self) -> bool {
        matches!(self, BookField::Genre | BookField::Rating | BookField::Status)
    }

    fn index(self) -> usize {
        BookField::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// Editable state behind the add/edit dialog. Numeric fields are kept as
/// raw text until submit so partial input is never rejected mid-typing.
#[derive(Default, Clone, Debug)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) genre: Option<Genre>,
    pub(crate) isbn: String,
    pub(crate) year: String,
    pub(crate) pages: String,
    pub(crate) rating: Option<f64>,
    pub(crate) status: Status,
    pub(crate) notes: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

impl BookForm {
    /// Populate the form from an existing book when editing.
    pub(crate) fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre,
            isbn: book.isbn.clone().unwrap_or_default(),
            year: book
                .publication_year
                .map(|y| y.to_string())
                .unwrap_or_default(),
            pages: book.pages.map(|p| p.to_string()).unwrap_or_default(),
            rating: book.rating,
            status: book.status,
            notes: book.notes.clone().unwrap_or_default(),
            active: BookField::Title,
            error: None,
        }
    }

    /// Move focus forward (`1`) or backward (`-1`), wrapping around.
    pub(crate) fn move_focus(&mut self, offset: isize) {
        let len = BookField::ALL.len() as isize;
        let idx = (self.active.index() as isize + offset).rem_euclid(len);
        self.active = BookField::ALL[idx as usize];
    }

    /// Step the active selector. Genre and rating pass through "unset" at
    /// the low end so both can be cleared from the keyboard.
    pub(crate) fn adjust(&mut self, offset: isize) -> bool {
        match self.active {
            BookField::Genre => {
                self.genre = match (self.genre, offset >= 0) {
                    (None, true) => Some(Genre::ALL[0]),
                    (None, false) => Some(Genre::ALL[Genre::ALL.len() - 1]),
                    (Some(Genre::Fiction), false) => None,
                    (Some(Genre::Other), true) => None,
                    (Some(genre), _) => Some(genre.cycle(offset)),
                };
                true
            }
            BookField::Rating => {
                self.rating = match (self.rating, offset >= 0) {
                    (None, true) => Some(0.0),
                    (None, false) => None,
                    (Some(r), false) if r <= 0.0 => None,
                    (Some(r), true) => Some((r + RATING_STEP).min(MAX_RATING)),
                    (Some(r), false) => Some((r - RATING_STEP).max(0.0)),
                };
                true
            }
            BookField::Status => {
                self.status = self.status.cycle(offset);
                true
            }
            _ => false,
        }
    }

    /// Append a character to the active text field, validating allowed input.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BookField::Title => self.title.push(ch),
            BookField::Author => self.author.push(ch),
            BookField::Isbn => self.isbn.push(ch),
            BookField::Notes => self.notes.push(ch),
            BookField::Year | BookField::Pages => {
                if !ch.is_ascii_digit() {
                    return false;
                }
                if self.active == BookField::Year {
                    self.year.push(ch);
                } else {
                    self.pages.push(ch);
                }
            }
            BookField::Genre | BookField::Rating | BookField::Status => return false,
        }
        true
    }

    /// Remove the last character from the active field; on selectors this
    /// clears the optional value.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            BookField::Title => {
                self.title.pop();
            }
            BookField::Author => {
                self.author.pop();
            }
            BookField::Isbn => {
                self.isbn.pop();
            }
            BookField::Year => {
                self.year.pop();
            }
            BookField::Pages => {
                self.pages.pop();
            }
            BookField::Notes => {
                self.notes.pop();
            }
            BookField::Genre => self.genre = None,
            BookField::Rating => self.rating = None,
            BookField::Status => {}
        }
    }

    /// Validate the inputs and return a draft ready for persistence.
    pub(crate) fn parse_inputs(&self) -> Result<BookDraft> {
        let publication_year = optional_text(&self.year)
            .map(|raw| raw.parse::<i32>())
            .transpose()
            .context("Publication year must be a whole number.")?;
        let pages = optional_text(&self.pages)
            .map(|raw| raw.parse::<i64>())
            .transpose()
            .context("Pages must be a whole number.")?;

        let draft = BookDraft {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            genre: self.genre,
            isbn: optional_text(&self.isbn).map(str::to_string),
            publication_year,
            pages,
            rating: self.rating,
            status: self.status,
            notes: optional_text(&self.notes).map(str::to_string),
        };
        validate(&draft)?;
        Ok(draft)
    }

    /// Text shown for a field, before styling.
    pub(crate) fn display_value(&self, field: BookField) -> String {
        match field {
            BookField::Title => self.title.clone(),
            BookField::Author => self.author.clone(),
            BookField::Isbn => self.isbn.clone(),
            BookField::Year => self.year.clone(),
            BookField::Pages => self.pages.clone(),
            BookField::Notes => self.notes.clone(),
            BookField::Genre => format!(
                "◀ {} ▶",
                self.genre.map(Genre::label).unwrap_or("(none)")
            ),
            BookField::Rating => match self.rating {
                Some(rating) => format!("◀ {rating:.1} ▶"),
                None => "◀ (none) ▶".to_string(),
            },
            BookField::Status => format!("◀ {} ▶", self.status.label()),
        }
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: BookField) -> Line<'static> {
        let value = self.display_value(field);
        let is_active = self.active == field;
        let required = matches!(field, BookField::Title | BookField::Author);

        let display = if value.is_empty() {
            let placeholder = if required { "<required>" } else { "<optional>" };
            placeholder.to_string()
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ])
    }

    /// Cursor column offset for text fields; `None` for selectors.
    pub(crate) fn cursor_offset(&self) -> Option<(usize, usize)> {
        if self.active.is_selector() {
            return None;
        }
        let row = self.active.index();
        let col = self.active.label().chars().count()
            + 2
            + self.display_value(self.active).chars().count();
        Some((row, col))
    }
}

fn optional_text(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[derive(Clone, Debug)]
pub(crate) struct ConfirmBookDelete {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) author: String,
}

impl ConfirmBookDelete {
    /// Build the confirmation state from the book being considered.
    pub(crate) fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::helpers::surface_error;

    fn typed(form: &mut BookForm, field: BookField, text: &str) {
        form.active = field;
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn parse_trims_and_drops_blank_optionals() {
        let mut form = BookForm::default();
        typed(&mut form, BookField::Title, "  Dune ");
        typed(&mut form, BookField::Author, "Frank Herbert");
        typed(&mut form, BookField::Isbn, "   ");
        typed(&mut form, BookField::Year, "19x65");
        typed(&mut form, BookField::Pages, "412");

        let draft = form.parse_inputs().unwrap();
        assert_eq!(draft.title, "Dune");
        assert_eq!(draft.isbn, None);
        assert_eq!(draft.publication_year, Some(1965));
        assert_eq!(draft.pages, Some(412));
        assert_eq!(draft.status, Status::ToRead);
    }

    #[test]
    fn missing_author_surfaces_validation_message() {
        let mut form = BookForm::default();
        typed(&mut form, BookField::Title, "Dune");
        let err = form.parse_inputs().unwrap_err();
        assert_eq!(surface_error(&err), "Author is required.");
    }

    #[test]
    fn rating_steps_by_half_and_clears_below_zero() {
        let mut form = BookForm {
            active: BookField::Rating,
            ..BookForm::default()
        };
        form.adjust(1);
        assert_eq!(form.rating, Some(0.0));
        for _ in 0..20 {
            form.adjust(1);
        }
        assert_eq!(form.rating, Some(5.0));
        form.adjust(-1);
        assert_eq!(form.rating, Some(4.5));
        form.rating = Some(0.0);
        form.adjust(-1);
        assert_eq!(form.rating, None);
    }

    #[test]
    fn genre_selector_passes_through_none() {
        let mut form = BookForm {
            active: BookField::Genre,
            ..BookForm::default()
        };
        form.adjust(1);
        assert_eq!(form.genre, Some(Genre::Fiction));
        form.adjust(-1);
        assert_eq!(form.genre, None);
        form.adjust(-1);
        assert_eq!(form.genre, Some(Genre::Other));
    }

    #[test]
    fn focus_wraps() {
        let mut form = BookForm::default();
        form.move_focus(-1);
        assert_eq!(form.active, BookField::Notes);
        form.move_focus(1);
        assert_eq!(form.active, BookField::Title);
    }
}
