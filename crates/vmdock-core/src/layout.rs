//! Left-to-right, top-to-bottom wrapping of fixed-size cards.
//!
//! The same flow routine answers "how tall would this be at width W" and
//! "where does every card go inside this rect", so the extent pushed to the
//! dock always matches what is later placed.

use crate::geometry::{Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Margins {
    pub const fn uniform(m: i32) -> Self {
        Self {
            left: m,
            top: m,
            right: m,
            bottom: m,
        }
    }

    pub const fn horizontal(&self) -> i32 {
        self.left + self.right
    }

    pub const fn vertical(&self) -> i32 {
        self.top + self.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapLayout {
    pub margins: Margins,
    pub hspacing: i32,
    pub vspacing: i32,
}

impl Default for WrapLayout {
    fn default() -> Self {
        Self {
            margins: Margins::uniform(8),
            hspacing: 8,
            vspacing: 8,
        }
    }
}

struct Flow {
    rects: Vec<Rect>,
    /// Height including both vertical margins.
    height: i32,
}

impl WrapLayout {
    /// Lay `sizes` out inside `area`. An item wraps only when it would cross
    /// the right edge of the content area and its row already holds an item,
    /// so an oversized item sits alone on its own row.
    fn flow(&self, sizes: &[Size], area: Rect) -> Flow {
        let content = area.inset(
            self.margins.left,
            self.margins.top,
            self.margins.right,
            self.margins.bottom,
        );
        let right = content.right();

        let mut rects = Vec::with_capacity(sizes.len());
        let mut x = content.x;
        let mut y = content.y;
        let mut row_height = 0;
        let mut on_row = 0usize;

        for size in sizes {
            if on_row > 0 && x.saturating_add(size.width) > right {
                x = content.x;
                y = y.saturating_add(row_height).saturating_add(self.vspacing);
                row_height = 0;
                on_row = 0;
            }
            rects.push(Rect::new(x, y, size.width, size.height));
            x = x.saturating_add(size.width).saturating_add(self.hspacing);
            row_height = row_height.max(size.height);
            on_row += 1;
        }

        let height = match rects.last() {
            Some(_) => y
                .saturating_add(row_height)
                .saturating_sub(area.y)
                .saturating_add(self.margins.bottom),
            None => self.margins.vertical(),
        };

        Flow { rects, height }
    }

    /// Total height needed to show every item at `panel_width`, margins
    /// included.
    pub fn required_height(&self, sizes: &[Size], panel_width: i32) -> i32 {
        self.flow(sizes, Rect::new(0, 0, panel_width, 0)).height
    }

    /// Width of a panel holding a single column of `item_width` cards.
    pub fn required_column_width(&self, item_width: i32) -> i32 {
        self.margins.horizontal().saturating_add(item_width)
    }

    /// Final card rectangles inside `area`, in item order.
    pub fn place(&self, sizes: &[Size], area: Rect) -> Vec<Rect> {
        self.flow(sizes, area).rects
    }
}
