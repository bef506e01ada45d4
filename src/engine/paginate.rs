use std::num::NonZeroUsize;

use crate::domain::{PageView, SearchState, UserRecord};

/// Filters `collection` by `search` and cuts out the requested page.
///
/// The page is clamped into `[1, total_pages]`; `total_pages` is at least 1
/// even when nothing matches.
pub fn apply(
    collection: &[UserRecord],
    search: &SearchState,
    page_size: NonZeroUsize,
    requested_page: usize,
) -> PageView {
    let filtered: Vec<&UserRecord> = collection
        .iter()
        .filter(|record| search.matches(record))
        .collect();

    let size = page_size.get();
    let total_pages = filtered.len().div_ceil(size).max(1);
    let current_page = requested_page.clamp(1, total_pages);

    let items = filtered
        .into_iter()
        .skip((current_page - 1) * size)
        .take(size)
        .cloned()
        .collect();

    PageView {
        items,
        current_page,
        total_pages,
        page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const NAMES: [&str; 7] = ["Ana", "George", "Janet", "Emma", "Eve", "Charles", "Tracey"];

    fn collection(len: usize) -> Vec<UserRecord> {
        (0..len)
            .map(|i| {
                let first = NAMES[i % NAMES.len()];
                UserRecord::new(i as i64 + 1, first, "Doe", format!("{}@reqres.in", i + 1))
            })
            .collect()
    }

    fn six() -> NonZeroUsize {
        NonZeroUsize::new(6).unwrap()
    }

    #[rstest]
    #[case(0, 1, 1, 0)]
    #[case(5, 1, 1, 5)]
    #[case(6, 1, 1, 6)]
    #[case(7, 1, 2, 6)]
    #[case(7, 2, 2, 1)]
    #[case(13, 3, 3, 1)]
    fn page_bounds(
        #[case] len: usize,
        #[case] page: usize,
        #[case] total_pages: usize,
        #[case] items: usize,
    ) {
        let view = apply(&collection(len), &SearchState::default(), six(), page);
        assert_eq!(view.total_pages, total_pages);
        assert_eq!(view.current_page, page);
        assert_eq!(view.items.len(), items);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(3, 2)]
    #[case(99, 2)]
    fn out_of_range_pages_are_clamped(#[case] requested: usize, #[case] expected: usize) {
        let view = apply(&collection(12), &SearchState::default(), six(), requested);
        assert_eq!(view.current_page, expected);
        assert!(view.current_page >= 1 && view.current_page <= view.total_pages);
        assert!(view.items.len() <= 6);
    }

    #[test]
    fn pages_are_contiguous_slices() {
        let records = collection(14);
        let ids: Vec<i64> = (1..=3)
            .flat_map(|page| apply(&records, &SearchState::default(), six(), page).items)
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, (1..=14).collect::<Vec<i64>>());
    }

    #[rstest]
    #[case("an")]
    #[case("")]
    #[case("zz")]
    fn short_terms_do_not_filter(#[case] term: &str) {
        let records = collection(10);
        let view = apply(&records, &SearchState::new(term), NonZeroUsize::new(50).unwrap(), 1);
        assert_eq!(view.items, records);
    }

    #[rstest]
    #[case("ana")]
    #[case("ANA")]
    #[case("aNa")]
    fn filter_is_case_insensitive(#[case] term: &str) {
        let view = apply(&collection(7), &SearchState::new(term), six(), 1);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].first_name, "Ana");
    }

    #[test]
    fn filter_keeps_only_matching_first_names() {
        let mut records = collection(21);
        // Only first names are searched.
        records.push(UserRecord::new(99, "Zed", "Evert", "eve@reqres.in"));

        let view = apply(&records, &SearchState::new("eve"), NonZeroUsize::new(100).unwrap(), 1);

        assert_eq!(view.items.len(), 3);
        assert!(view
            .items
            .iter()
            .all(|r| r.first_name.to_lowercase().contains("eve")));
    }

    #[test]
    fn pagination_applies_to_the_filtered_collection() {
        // 14 records, every seventh is "Emma" (ids 4 and 11).
        let view = apply(&collection(14), &SearchState::new("emm"), NonZeroUsize::new(1).unwrap(), 2);
        assert_eq!(view.total_pages, 2);
        assert_eq!(view.items[0].id, 11);
    }

    #[test]
    fn no_matches_still_yields_one_page() {
        let view = apply(&collection(8), &SearchState::new("xyz"), six(), 4);
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.current_page, 1);
        assert!(view.items.is_empty());
    }
}
