use std::num::NonZeroUsize;

use serde::Serialize;

use super::UserRecord;

/// Minimum number of characters before a search term filters anything.
pub const MIN_SEARCH_LEN: usize = 3;

/// Number of page links shown on each side of the current page.
const PAGE_WINDOW: usize = 2;

/// The live search box contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub term: String,
}

impl SearchState {
    pub fn new(term: impl Into<String>) -> Self {
        Self { term: term.into() }
    }

    pub fn is_active(&self) -> bool {
        self.term.chars().count() >= MIN_SEARCH_LEN
    }

    /// Case-insensitive substring match on `first_name` only.
    pub fn matches(&self, record: &UserRecord) -> bool {
        !self.is_active()
            || record
                .first_name
                .to_lowercase()
                .contains(&self.term.to_lowercase())
    }
}

/// One page of the filtered collection, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub items: Vec<UserRecord>,
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: NonZeroUsize,
}

impl PageView {
    pub fn empty(page_size: NonZeroUsize) -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            total_pages: 1,
            page_size,
        }
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// Page links around the current page, clamped to the valid range.
    pub fn page_numbers(&self) -> Vec<usize> {
        let start = self.current_page.saturating_sub(PAGE_WINDOW).max(1);
        let end = (self.current_page + PAGE_WINDOW).min(self.total_pages);
        (start..=end).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(current_page: usize, total_pages: usize) -> PageView {
        PageView {
            items: Vec::new(),
            current_page,
            total_pages,
            page_size: NonZeroUsize::new(6).unwrap(),
        }
    }

    #[test]
    fn short_terms_match_everything() {
        let record = UserRecord::new(1, "George", "Bluth", "george.bluth@reqres.in");
        assert!(SearchState::new("an").matches(&record));
        assert!(!SearchState::new("ana").matches(&record));
    }

    #[test]
    fn page_numbers_window() {
        assert_eq!(view(1, 1).page_numbers(), vec![1]);
        assert_eq!(view(1, 10).page_numbers(), vec![1, 2, 3]);
        assert_eq!(view(5, 10).page_numbers(), vec![3, 4, 5, 6, 7]);
        assert_eq!(view(10, 10).page_numbers(), vec![8, 9, 10]);
    }
}
