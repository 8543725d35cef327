use crate::models::{GenreId, Item};

/// Number of release years offered by the search page.
pub const YEAR_OPTIONS: i32 = 25;

/// Refines already-fetched results. An absent predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub genre: Option<GenreId>,
    /// Matched as a prefix of the release date string, e.g. `"2021"`.
    pub year: Option<String>,
}

impl SearchFilter {
    pub fn new(genre: Option<GenreId>, year: Option<String>) -> Self {
        Self { genre, year }
    }

    pub fn matches(&self, item: &Item) -> bool {
        let genre_ok = self.genre.map_or(true, |g| item.has_genre(g));
        let year_ok = self.year_prefix().map_or(true, |year| {
            item.release_date
                .as_deref()
                .is_some_and(|date| date.starts_with(year))
        });
        genre_ok && year_ok
    }

    /// Stable: output keeps input order.
    pub fn apply(&self, items: &[Item]) -> Vec<Item> {
        items.iter().filter(|i| self.matches(i)).cloned().collect()
    }

    fn year_prefix(&self) -> Option<&str> {
        self.year.as_deref().map(str::trim).filter(|y| !y.is_empty())
    }
}

/// Years offered by the search page, newest first.
pub fn year_options(current_year: i32) -> Vec<i32> {
    (0..YEAR_OPTIONS).map(|i| current_year - i).collect()
}
