/// Width and height in logical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle. `right()` and `bottom()` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Shrink by the given insets, never below zero size.
    pub fn inset(&self, left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            x: self.x + left,
            y: self.y + top,
            width: (self.width - left - right).max(0),
            height: (self.height - top - bottom).max(0),
        }
    }
}

/// One monitor: its full bounds and the part not reserved by other docks
/// or taskbars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub geometry: Rect,
    pub available: Rect,
}

/// Enumerates the monitors the window can dock to.
pub trait ScreenSource: Send {
    fn screens(&self) -> Vec<Screen>;

    /// The configured screen, clamped to the last one when the index is out
    /// of range. `None` when no screens are attached.
    fn target(&self, index: usize) -> Option<(usize, Screen)> {
        let screens = self.screens();
        let last = screens.len().checked_sub(1)?;
        let index = index.min(last);
        Some((index, screens[index]))
    }
}

/// Fixed screen list, for headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticScreens(pub Vec<Screen>);

impl ScreenSource for StaticScreens {
    fn screens(&self) -> Vec<Screen> {
        self.0.clone()
    }
}
