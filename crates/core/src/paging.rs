use std::ops::Range;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const PAGE_SIZE_CHOICES: [usize; 3] = [5, 10, 20];

/// Client-side pagination over an already fetched result list. Pages are
/// 0-based internally and shown 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    page: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 0,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 0;
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    pub fn range(&self, total: usize) -> Range<usize> {
        let page = self.page.min(self.total_pages(total) - 1);
        let start = (page * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        start..end
    }

    pub fn has_next(&self, total: usize) -> bool {
        self.page + 1 < self.total_pages(total)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn next(&mut self, total: usize) -> bool {
        if self.has_next(total) {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.has_prev() {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.page = 0;
    }

    /// Next entry of [`PAGE_SIZE_CHOICES`] after the current size, wrapping.
    pub fn cycle_page_size(&mut self) -> usize {
        let next = PAGE_SIZE_CHOICES
            .iter()
            .copied()
            .find(|&s| s > self.page_size)
            .unwrap_or(PAGE_SIZE_CHOICES[0]);
        self.set_page_size(next);
        next
    }

    /// "Page 2 of 5 (41-50 of 47)" style label; callers pick the parts they need.
    pub fn label(&self, total: usize) -> String {
        let r = self.range(total);
        if total == 0 {
            return "Page 1 of 1".to_string();
        }
        format!(
            "Page {} of {} ({}-{} of {})",
            self.page.min(self.total_pages(total) - 1) + 1,
            self.total_pages(total),
            r.start + 1,
            r.end,
            total
        )
    }
}
