//! Deterministic cover art. A book without a scanned cover still gets a
//! recognizable card: two colors derived from a digest of the title form a
//! gradient, and the genre picks the icon.

use sha2::{Digest, Sha256};

use crate::models::Genre;

/// Channel floor for the first gradient color so covers never go near-black.
const MIN_CHANNEL: u8 = 50;

const DEFAULT_ICON: &str = "📚";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cover {
    pub start: Rgb,
    pub end: Rgb,
    pub icon: &'static str,
}

impl Cover {
    /// Derive the cover for a title/genre pair. The same title always yields
    /// the same colors.
    pub fn for_book(title: &str, genre: Option<Genre>) -> Self {
        let digest = Sha256::digest(title.as_bytes());
        let start = Rgb(
            digest[0].max(MIN_CHANNEL),
            digest[1].max(MIN_CHANNEL),
            digest[2].max(MIN_CHANNEL),
        );
        let end = Rgb(digest[3], digest[4], digest[5]);

        Self {
            start,
            end,
            icon: genre.map(genre_icon).unwrap_or(DEFAULT_ICON),
        }
    }

    /// Linear interpolation between `start` and `end`; `t` is clamped to
    /// `[0, 1]`. The TUI samples this once per cell to paint the gradient.
    pub fn blend(&self, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb(
            mix(self.start.0, self.end.0),
            mix(self.start.1, self.end.1),
            mix(self.start.2, self.end.2),
        )
    }
}

pub fn genre_icon(genre: Genre) -> &'static str {
    match genre {
        Genre::Fiction => "📖",
        Genre::NonFiction => "📋",
        Genre::ScienceFiction => "🚀",
        Genre::Fantasy => "🧙",
        Genre::Mystery => "🔍",
        Genre::Thriller => "🔪",
        Genre::Romance => "❤️",
        Genre::Biography => "👤",
        Genre::History => "⏳",
        Genre::SelfHelp => "🧠",
        Genre::Business => "💼",
        Genre::Science => "🔬",
        Genre::Other => DEFAULT_ICON,
    }
}
