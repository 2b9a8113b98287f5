// NetSleuth - core/paginate.rs
//
// Fixed-size page arithmetic over a filtered result count.
// There is always at least one page, even for an empty result.

use crate::util::error::PageError;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: usize,
    page_size: usize,
}

impl Paginator {
    /// A `page_size` of zero is treated as one.
    pub fn new(count: usize, page_size: usize) -> Self {
        Self {
            count,
            page_size: page_size.max(1),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `max(1, ceil(count / page_size))`.
    pub fn page_count(&self) -> usize {
        self.count.div_ceil(self.page_size).max(1)
    }

    /// Index range of page `page` (1-based). Callers clamp; this does not.
    pub fn page_range(&self, page: usize) -> Result<Range<usize>, PageError> {
        let total_pages = self.page_count();
        if page == 0 || page > total_pages {
            return Err(PageError::OutOfRange {
                requested: page,
                total_pages,
            });
        }
        let start = (page - 1) * self.page_size;
        let end = (start + self.page_size).min(self.count);
        Ok(start.min(end)..end)
    }

    /// Nearest valid page number.
    pub fn clamp_page(&self, page: usize) -> usize {
        page.clamp(1, self.page_count())
    }
}
