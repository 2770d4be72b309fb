//! This modules defines the common functionality for paging data.

use maud::{Markup, html};
use serde::Deserialize;

use crate::html::LINK_STYLE;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of members to display per page.
    pub members_page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            members_page_size: 15,
            max_pages: 5,
        }
    }
}

/// The `?page=` query parameter shared by the paginated pages.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// The page number to display. Starts from 1.
    pub page: Option<u64>,
}

/// One page of rows plus what is needed to render the page links.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The rows on this page, empty if `number` is past the last page.
    pub items: Vec<T>,
    /// The 1-based page number.
    pub number: u64,
    /// The maximum number of rows per page.
    pub size: u64,
    /// The number of rows across all pages.
    pub total_count: u64,
}

impl<T> Page<T> {
    /// The number of pages needed to show every row, at least one.
    pub fn page_count(&self) -> u64 {
        self.total_count.div_ceil(self.size).max(1)
    }
}

/// The row offset of the 1-based `page` for pages of `page_size` rows.
///
/// Page 0 is treated as page 1. Returns `None` when the offset does not fit in
/// an SQLite integer, in which case the page is past the last row.
pub fn page_offset(page: u64, page_size: u64) -> Option<i64> {
    page.saturating_sub(1)
        .checked_mul(page_size)
        .and_then(|offset| i64::try_from(offset).ok())
}

/// A page with no rows, for a page number past the last row.
pub fn empty_page<T>(page: u64, page_size: u64, total_count: i64) -> Page<T> {
    Page {
        items: Vec::new(),
        number: page.max(1),
        size: page_size,
        total_count: total_count.unsigned_abs(),
    }
}

/// Clamp `page_size` to an SQLite integer for use in a `LIMIT` clause.
pub fn page_limit(page_size: u64) -> i64 {
    i64::try_from(page_size).unwrap_or(i64::MAX)
}

#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let map_page = |page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    };

    let mut indicators: Vec<PaginationIndicator> = if page_count <= max_pages {
        (1..=page_count).map(map_page).collect()
    } else if curr_page <= (max_pages / 2) {
        (1..=max_pages).map(map_page).collect()
    } else if curr_page > (page_count - max_pages / 2) {
        ((page_count - max_pages + 1)..=page_count)
            .map(map_page)
            .collect()
    } else {
        ((curr_page - max_pages / 2)..=(curr_page + max_pages / 2))
            .map(map_page)
            .collect()
    };

    if page_count > max_pages {
        if curr_page > (max_pages / 2) + 1 {
            indicators.insert(0, PaginationIndicator::Page(1));
            indicators.insert(1, PaginationIndicator::Ellipsis);
        }

        if curr_page < (page_count - max_pages / 2) {
            indicators.push(PaginationIndicator::Ellipsis);
            indicators.push(PaginationIndicator::Page(page_count));
        }
    }

    if curr_page > 1 {
        indicators.insert(0, PaginationIndicator::BackButton(curr_page - 1));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

/// Render the page links.
///
/// `page_url` maps a page number to the URL for that page, so callers can
/// keep their own query parameters (e.g. a date filter).
pub fn pagination_view(
    indicators: &[PaginationIndicator],
    page_url: impl Fn(u64) -> String,
) -> Markup {
    html! {
        nav class="pagination" aria-label="Pagination"
        {
            ul class="pagination flex items-center gap-3 text-sm"
            {
                @for indicator in indicators {
                    li
                    {
                        @match indicator {
                            PaginationIndicator::Page(page) => {
                                a href=(page_url(*page)) class=(LINK_STYLE) { (page) }
                            }
                            PaginationIndicator::CurrPage(page) => {
                                p aria-current="page" class="font-bold" { (page) }
                            }
                            PaginationIndicator::Ellipsis => { "..." }
                            PaginationIndicator::NextButton(page) => {
                                a href=(page_url(*page)) role="button" class=(LINK_STYLE) { "Next" }
                            }
                            PaginationIndicator::BackButton(page) => {
                                a href=(page_url(*page)) role="button" class=(LINK_STYLE) { "Back" }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::pagination::{PaginationIndicator, create_pagination_indicators};

    #[test]
    fn shows_all_pages() {
        let max_pages = 5;
        let page_count = 5;
        let curr_page = 1;
        let want = [
            PaginationIndicator::CurrPage(1),
            PaginationIndicator::Page(2),
            PaginationIndicator::Page(3),
            PaginationIndicator::Page(4),
            PaginationIndicator::Page(5),
            PaginationIndicator::NextButton(2),
        ];

        let got = create_pagination_indicators(curr_page, page_count, max_pages);

        assert_eq!(want, got.as_slice());
    }

    #[test]
    fn shows_page_subset_on_left() {
        let max_pages = 5;
        let page_count = 10;
        let curr_page = 1;
        let want = [
            PaginationIndicator::CurrPage(1),
            PaginationIndicator::Page(2),
            PaginationIndicator::Page(3),
            PaginationIndicator::Page(4),
            PaginationIndicator::Page(5),
            PaginationIndicator::Ellipsis,
            PaginationIndicator::Page(10),
            PaginationIndicator::NextButton(2),
        ];

        let got = create_pagination_indicators(curr_page, page_count, max_pages);

        assert_eq!(want, got.as_slice());
    }

    #[test]
    fn shows_page_subset_on_right() {
        let max_pages = 5;
        let page_count = 10;
        let curr_page = 10;
        let want = [
            PaginationIndicator::BackButton(9),
            PaginationIndicator::Page(1),
            PaginationIndicator::Ellipsis,
            PaginationIndicator::Page(6),
            PaginationIndicator::Page(7),
            PaginationIndicator::Page(8),
            PaginationIndicator::Page(9),
            PaginationIndicator::CurrPage(10),
        ];

        let got = create_pagination_indicators(curr_page, page_count, max_pages);

        assert_eq!(want, got.as_slice());
    }

    #[test]
    fn shows_page_subset_in_center() {
        let max_pages = 5;
        let page_count = 10;
        let curr_page = 5;
        let want = [
            PaginationIndicator::BackButton(4),
            PaginationIndicator::Page(1),
            PaginationIndicator::Ellipsis,
            PaginationIndicator::Page(3),
            PaginationIndicator::Page(4),
            PaginationIndicator::CurrPage(5),
            PaginationIndicator::Page(6),
            PaginationIndicator::Page(7),
            PaginationIndicator::Ellipsis,
            PaginationIndicator::Page(10),
            PaginationIndicator::NextButton(6),
        ];

        let got = create_pagination_indicators(curr_page, page_count, max_pages);

        assert_eq!(want, got.as_slice());
    }
}

#[cfg(test)]
mod page_tests {
    use crate::pagination::{Page, page_limit, page_offset};

    #[test]
    fn page_count_rounds_up() {
        let page = Page::<()> {
            items: vec![],
            number: 1,
            size: 15,
            total_count: 31,
        };

        assert_eq!(page.page_count(), 3);
    }

    #[test]
    fn empty_table_has_one_page() {
        let page = Page::<()> {
            items: vec![],
            number: 1,
            size: 15,
            total_count: 0,
        };

        assert_eq!(page.page_count(), 1);
    }

    #[test]
    fn offset_skips_previous_pages() {
        assert_eq!(page_offset(1, 15), Some(0));
        assert_eq!(page_offset(3, 15), Some(30));
        assert_eq!(page_offset(0, 15), Some(0));
    }

    #[test]
    fn offset_past_sqlite_range_is_none() {
        assert_eq!(page_offset(u64::MAX, 15), None);
        assert_eq!(page_offset(1_000_000_000_000_000_000, 15), None);
        assert_eq!(page_offset(i64::MAX as u64 + 2, 1), None);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(page_limit(15), 15);
        assert_eq!(page_limit(u64::MAX), i64::MAX);
    }
}
