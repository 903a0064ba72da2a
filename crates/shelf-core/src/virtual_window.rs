//! Row virtualization for large pages.
//!
//! Only rows inside the viewport (plus an overscan margin) are materialized;
//! everything else is accounted for by its estimated height so the scroll
//! extent stays right. This never changes which rows are on the page.

use std::ops::Range;

pub const DEFAULT_ROW_HEIGHT: f32 = 45.0;
pub const DEFAULT_OVERSCAN: usize = 10;
pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 500.0;
pub const MIN_VIEWPORT_HEIGHT: f32 = 400.0;
// space kept free under the table for the pagination controls
const VIEWPORT_BOTTOM_MARGIN: f32 = 100.0;

/// The rows to materialize, as page-local indices.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRange {
    pub start: usize,
    pub end: usize,
    /// Height of the rows above `start`.
    pub offset_top: f32,
    /// Height of the whole page.
    pub total_height: f32,
}

impl RenderRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Height of the rows below `end`.
    pub fn offset_bottom(&self, row_height: f32) -> f32 {
        (self.total_height - self.offset_top - self.len() as f32 * row_height).max(0.0)
    }
}

/// A materialized row: where it sits on the page, in the view, and on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualRow {
    pub local: usize,
    pub global: usize,
    pub top: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualWindow {
    row_height: f32,
    overscan: usize,
    viewport_height: f32,
    scroll_offset: f32,
}

impl Default for VirtualWindow {
    fn default() -> Self {
        Self::new(DEFAULT_ROW_HEIGHT, DEFAULT_OVERSCAN)
    }
}

impl VirtualWindow {
    pub fn new(row_height: f32, overscan: usize) -> Self {
        Self {
            row_height: if row_height > 0.0 {
                row_height
            } else {
                DEFAULT_ROW_HEIGHT
            },
            overscan,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            scroll_offset: 0.0,
        }
    }

    /// Viewport height for a table whose top edge is `top` pixels below the
    /// window's top, never less than 400.
    pub fn fit_viewport(window_height: f32, top: f32) -> f32 {
        (window_height - top - VIEWPORT_BOTTOM_MARGIN).max(MIN_VIEWPORT_HEIGHT)
    }

    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn resize(&mut self, viewport_height: f32) {
        self.viewport_height = viewport_height.max(0.0);
    }

    pub fn scroll_to(&mut self, offset: f32) {
        self.scroll_offset = offset.max(0.0);
    }

    /// Which of `row_count` rows must be materialized at the current scroll
    /// position.
    pub fn range(&self, row_count: usize) -> RenderRange {
        let total_height = row_count as f32 * self.row_height;
        if row_count == 0 {
            return RenderRange {
                start: 0,
                end: 0,
                offset_top: 0.0,
                total_height,
            };
        }

        let max_scroll = (total_height - self.viewport_height).max(0.0);
        let offset = self.scroll_offset.min(max_scroll);

        let first_visible = ((offset / self.row_height).floor() as usize).min(row_count - 1);
        let last_visible = (((offset + self.viewport_height) / self.row_height).ceil() as usize)
            .clamp(first_visible + 1, row_count);

        let start = first_visible.saturating_sub(self.overscan);
        let end = (last_visible + self.overscan).min(row_count);

        RenderRange {
            start,
            end,
            offset_top: start as f32 * self.row_height,
            total_height,
        }
    }

    /// Materialized rows of a page whose global view range is `page`.
    pub fn rows(&self, page: Range<usize>) -> impl Iterator<Item = VirtualRow> + use<> {
        let base = page.start;
        let range = self.range(page.len());
        let row_height = self.row_height;
        (range.start..range.end).map(move |local| VirtualRow {
            local,
            global: base + local,
            top: local as f32 * row_height,
        })
    }
}
