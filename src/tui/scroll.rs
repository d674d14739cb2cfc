// Scroll state for the chat and log viewports
//
// The view owns its scroll state and updates the dimensions every frame.
// Auto-follow keeps the newest line visible until the user scrolls up;
// getting back to the bottom turns it on again.

/// Scroll state for a single viewport
#[derive(Debug, Clone)]
pub struct ScrollState {
    /// Index of the first visible line
    offset: usize,

    /// Total number of lines in content
    total: usize,

    /// Number of lines visible in viewport
    viewport: usize,

    /// Whether new content keeps the view pinned to the bottom
    pub auto_follow: bool,
}

impl ScrollState {
    /// Create new scroll state with auto-follow enabled
    pub fn new() -> Self {
        Self {
            offset: 0,
            total: 0,
            viewport: 0,
            auto_follow: true,
        }
    }

    /// Update content and viewport dimensions
    /// Call this each render frame with current sizes
    pub fn update_dimensions(&mut self, total: usize, viewport: usize) {
        self.total = total;
        self.viewport = viewport;

        if self.auto_follow {
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
    }

    /// Scroll towards older lines; disables auto-follow
    pub fn scroll_up(&mut self, lines: usize) {
        if lines == 0 || self.offset == 0 {
            return;
        }
        self.offset = self.offset.saturating_sub(lines);
        self.auto_follow = false;
    }

    /// Scroll towards newer lines; re-enables auto-follow at the bottom
    pub fn scroll_down(&mut self, lines: usize) {
        self.offset = (self.offset + lines).min(self.max_offset());
        if self.offset >= self.max_offset() {
            self.auto_follow = true;
        }
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up((self.viewport / 2).max(1));
    }

    pub fn half_page_down(&mut self) {
        self.scroll_down((self.viewport / 2).max(1));
    }

    /// Jump to bottom (and enable auto-follow)
    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max_offset();
        self.auto_follow = true;
    }

    /// Get visible range (start_index, end_index)
    pub fn visible_range(&self) -> (usize, usize) {
        let start = self.offset;
        let end = (self.offset + self.viewport).min(self.total);
        (start, end)
    }

    /// Maximum valid offset
    fn max_offset(&self) -> usize {
        self.total.saturating_sub(self.viewport)
    }
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new()
    }
}
