use crate::geometry::{BOTTOM_MARGIN, PAGE_HEIGHT, TOP_MARGIN};

/// Vertical cursor for flowing content down a page.
///
/// The paginator only tracks where the next block starts; starting the new
/// physical page (and whatever has to be painted on it) is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paginator {
    cursor: f32,
    top: f32,
    limit: f32,
}

impl Default for Paginator {
    fn default() -> Self {
        Paginator::new(TOP_MARGIN, PAGE_HEIGHT - BOTTOM_MARGIN)
    }
}

impl Paginator {
    pub fn new(top: f32, limit: f32) -> Self {
        Paginator {
            cursor: top,
            top,
            limit,
        }
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn limit(&self) -> f32 {
        self.limit
    }

    /// Content may not start below the limit. Reaching it exactly is fine.
    pub fn needs_break(&self) -> bool {
        self.cursor > self.limit
    }

    /// Whether `height` more millimeters fit above the limit.
    pub fn fits(&self, height: f32) -> bool {
        self.cursor + height <= self.limit
    }

    pub fn at_top(&self) -> bool {
        self.cursor <= self.top
    }

    /// Moves the cursor down to `y`. The cursor never moves up.
    pub fn advance_to(&mut self, y: f32) {
        if y > self.cursor {
            self.cursor = y;
        }
    }

    pub fn advance(&mut self, dy: f32) {
        self.advance_to(self.cursor + dy);
    }

    pub fn reset(&mut self) {
        self.cursor = self.top;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit() {
        let p = Paginator::default();
        assert_eq!(p.cursor(), 20.0);
        assert_eq!(p.limit(), 267.0);
        assert!(p.at_top());
    }

    #[test]
    fn test_break_is_strict() {
        let mut p = Paginator::default();
        p.advance_to(267.0);
        assert!(!p.needs_break());
        p.advance(0.01);
        assert!(p.needs_break());
    }

    #[test]
    fn test_cursor_is_monotonic() {
        let mut p = Paginator::default();
        p.advance_to(100.0);
        p.advance_to(50.0);
        assert_eq!(p.cursor(), 100.0);
        p.advance(-10.0);
        assert_eq!(p.cursor(), 100.0);
        p.reset();
        assert_eq!(p.cursor(), 20.0);
    }

    #[test]
    fn test_fits() {
        let mut p = Paginator::default();
        p.advance_to(167.0);
        assert!(p.fits(100.0));
        assert!(!p.fits(100.5));
    }
}
