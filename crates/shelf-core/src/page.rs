use std::ops::Range;

pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Global view range of page `page` (1-based), clamped to `len`.
pub fn page_range(len: usize, page: usize, page_size: usize) -> Range<usize> {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size).min(len);
    let end = start.saturating_add(page_size).min(len);
    start..end
}

/// `max(1, ceil(len / page_size))`.
pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Fixed-size paging over a view. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page_size: usize,
    page: usize,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageWindow {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 1,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self, len: usize) -> usize {
        page_count(len, self.page_size)
    }

    pub fn range(&self, len: usize) -> Range<usize> {
        page_range(len, self.page, self.page_size)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range(items.len())]
    }

    /// Move to the next page; a no-op on the last page.
    pub fn next(&mut self, len: usize) -> bool {
        if self.page < self.page_count(len) {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Move to the previous page; a no-op on the first page.
    pub fn prev(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to `page`, clamped to `1..=page_count`.
    pub fn goto(&mut self, page: usize, len: usize) {
        self.page = page.clamp(1, self.page_count(len));
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_minimum_one() {
        assert_eq!(page_count(0, 200), 1);
        assert_eq!(page_count(200, 200), 1);
        assert_eq!(page_count(201, 200), 2);
        assert_eq!(page_count(5, 0), 5);
    }

    #[test]
    fn test_pages_concatenate_to_view() {
        for len in [0usize, 1, 7, 10, 11, 23] {
            for size in [1usize, 3, 10, 50] {
                let view: Vec<usize> = (0..len).collect();
                let mut window = PageWindow::new(size);
                let mut seen = Vec::new();
                for page in 1..=window.page_count(len) {
                    window.goto(page, len);
                    seen.extend_from_slice(window.slice(&view));
                }
                assert_eq!(seen, view, "len={len} size={size}");
            }
        }
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut window = PageWindow::new(10);
        assert!(!window.prev());
        assert!(window.next(25));
        assert!(window.next(25));
        assert!(!window.next(25));
        assert_eq!(window.page(), 3);

        window.goto(99, 25);
        assert_eq!(window.page(), 3);
        window.goto(0, 25);
        assert_eq!(window.page(), 1);
    }

    #[test]
    fn test_range_past_end_is_empty() {
        assert_eq!(page_range(5, 4, 2), 5..5);
        assert_eq!(page_range(5, 3, 2), 4..5);
    }
}
