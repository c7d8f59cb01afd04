//! Floating preview panel: sizing, placement, drag and resize geometry

use url::Url;

use crate::constants::{ids, panel};
use crate::geometry::{Point, Rect, Size, clamp_position};
use crate::metadata::PageMetadata;

/// What the panel body shows
#[derive(Debug, Clone, PartialEq)]
pub enum PanelContent {
    /// Embedded frame of the live page; metadata kept for the downgrade path
    Frame { url: Url, metadata: PageMetadata },

    /// Image content, embedded by URL
    Image { url: String },

    /// Metadata fallback card with an "open" action
    Card { metadata: PageMetadata },

    /// Unhandled content type; shows the type text and an "open" action
    Generic { media_type: String },
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    grab: Point,
    panel_start: Point,
}

/// The single floating panel. Owns its geometry; the controller owns the panel.
#[derive(Debug)]
pub struct Panel {
    pub id: &'static str,
    pub rect: Rect,
    pub content: PanelContent,
    pub hostname: String,
    pub z_index: i32,
    drag: Option<DragState>,
}

/// Default panel size for a viewport (60% x 80%)
pub fn default_size(viewport: Size) -> Size {
    Size::new(
        (viewport.width as f64 * panel::DEFAULT_WIDTH_FRACTION).floor() as i32,
        (viewport.height as f64 * panel::DEFAULT_HEIGHT_FRACTION).floor() as i32,
    )
}

/// Clamp a requested size to the documented bounds: at least 300x200, at
/// most 95% of the viewport per dimension
pub fn clamp_size(size: Size, viewport: Size) -> Size {
    let max_w = (viewport.width as f64 * panel::MAX_VIEWPORT_FRACTION).floor() as i32;
    let max_h = (viewport.height as f64 * panel::MAX_VIEWPORT_FRACTION).floor() as i32;
    Size::new(
        size.width.clamp(panel::MIN_WIDTH, max_w.max(panel::MIN_WIDTH)),
        size.height.clamp(panel::MIN_HEIGHT, max_h.max(panel::MIN_HEIGHT)),
    )
}

/// Deterministic placement. The panel bottom aligns near the 10%-from-top
/// line; horizontally it lands on the side of the viewport *opposite* the
/// triggering cursor so it does not cover the link just triggered. Without
/// an origin it centers. The result is clamped to keep the panel fully
/// inside the viewport with a 10 px margin.
pub fn place(viewport: Size, size: Size, origin: Option<Point>) -> Point {
    let anchor_x = (viewport.width as f64 * panel::ANCHOR_FRACTION) as i32;
    let anchor_y = (viewport.height as f64 * panel::ANCHOR_FRACTION) as i32;

    let y = anchor_y - size.height;

    let x = match origin {
        Some(origin) => {
            if origin.x <= viewport.width / 2 {
                // Cursor on the left half: panel's right edge near the 10% line
                anchor_x - size.width
            } else {
                anchor_x
            }
        }
        None => (viewport.width - size.width) / 2,
    };

    clamp_position(Point::new(x, y), size, viewport, panel::VIEWPORT_MARGIN)
}

impl Panel {
    /// Build the panel at its default size, placed relative to `origin`
    pub fn new(
        content: PanelContent,
        hostname: String,
        viewport: Size,
        origin: Option<Point>,
        z_index: i32,
    ) -> Self {
        let size = clamp_size(default_size(viewport), viewport);
        let position = place(viewport, size, origin);
        Self {
            id: ids::PANEL,
            rect: Rect::from_origin_size(position, size),
            content,
            hostname,
            z_index,
            drag: None,
        }
    }

    /// Header bar rect (the drag handle)
    pub fn header_rect(&self) -> Rect {
        Rect::new(self.rect.x, self.rect.y, self.rect.width, panel::HEADER_HEIGHT)
    }

    /// Close control square at the header's right edge
    pub fn close_control_rect(&self) -> Rect {
        Rect::new(
            self.rect.right() - panel::CLOSE_CONTROL_SIZE,
            self.rect.y,
            panel::CLOSE_CONTROL_SIZE,
            panel::HEADER_HEIGHT,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        self.rect.contains(point)
    }

    pub fn is_on_close_control(&self, point: Point) -> bool {
        self.close_control_rect().contains(point)
    }

    /// Start a drag from a header pointer-down. Ignored on the close control
    /// and outside the header. Returns whether a drag started.
    pub fn begin_drag(&mut self, point: Point) -> bool {
        if !self.header_rect().contains(point) || self.is_on_close_control(point) {
            return false;
        }
        self.drag = Some(DragState {
            grab: point,
            panel_start: Point::new(self.rect.x, self.rect.y),
        });
        true
    }

    /// Follow the pointer, keeping the panel fully inside the viewport
    pub fn drag_to(&mut self, point: Point, viewport: Size) {
        let Some(drag) = self.drag else { return };

        let dx = point.x - drag.grab.x;
        let dy = point.y - drag.grab.y;

        let max_x = (viewport.width - self.rect.width).max(0);
        let max_y = (viewport.height - self.rect.height).max(0);

        self.rect.x = (drag.panel_start.x + dx).clamp(0, max_x);
        self.rect.y = (drag.panel_start.y + dy).clamp(0, max_y);
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// User resize, clamped to the documented min/max bounds; position is
    /// re-clamped so the panel stays inside the viewport
    pub fn resize(&mut self, requested: Size, viewport: Size) {
        let size = clamp_size(requested, viewport);
        self.rect.width = size.width;
        self.rect.height = size.height;

        let max_x = (viewport.width - size.width).max(0);
        let max_y = (viewport.height - size.height).max(0);
        self.rect.x = self.rect.x.clamp(0, max_x);
        self.rect.y = self.rect.y.clamp(0, max_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size { width: 1000, height: 1000 };

    #[test]
    fn test_default_size_fractions() {
        assert_eq!(default_size(VIEWPORT), Size::new(600, 800));
    }

    #[test]
    fn test_clamp_size_bounds() {
        assert_eq!(clamp_size(Size::new(100, 100), VIEWPORT), Size::new(300, 200));
        assert_eq!(clamp_size(Size::new(5000, 5000), VIEWPORT), Size::new(950, 950));
        assert_eq!(clamp_size(Size::new(600, 800), VIEWPORT), Size::new(600, 800));
    }

    #[test]
    fn test_left_half_trigger_places_panel_right_of_anchor() {
        // clientX=200 (left half): x = 10% * 1000 - width, then clamped to margin
        let left = place(VIEWPORT, Size::new(600, 800), Some(Point::new(200, 500)));
        let right = place(VIEWPORT, Size::new(600, 800), Some(Point::new(800, 500)));

        // Left-half trigger ends further left after clamping than the
        // right-half trigger's 10%-from-left placement, and both stay in
        // bounds with the 10 px margin.
        assert_eq!(left.x, 10);
        assert_eq!(right.x, 100);
        for p in [left, right] {
            assert!(p.x >= 10 && p.x <= VIEWPORT.width - 600 - 10);
            assert!(p.y >= 10 && p.y <= VIEWPORT.height - 800 - 10);
        }
    }

    #[test]
    fn test_small_panel_on_left_trigger_keeps_right_edge_near_anchor() {
        // A panel smaller than the 10% line is not clamped: right edge = 100
        let p = place(VIEWPORT, Size::new(80, 100), Some(Point::new(200, 500)));
        assert_eq!(p.x + 80, 100);
    }

    #[test]
    fn test_no_origin_centers_horizontally() {
        let p = place(VIEWPORT, Size::new(600, 800), None);
        assert_eq!(p.x, 200);
    }

    #[test]
    fn test_vertical_placement_anchors_near_top_line() {
        // y = 10% * 1000 - height = -700, clamped to the 10 px margin
        let p = place(VIEWPORT, Size::new(600, 800), Some(Point::new(800, 500)));
        assert_eq!(p.y, 10);

        // A short panel keeps its bottom on the 10% line
        let p = place(VIEWPORT, Size::new(300, 50), Some(Point::new(800, 500)));
        assert_eq!(p.y + 50, 100);
    }

    fn card_panel() -> Panel {
        Panel::new(
            PanelContent::Card { metadata: PageMetadata::default() },
            "example.org".to_string(),
            VIEWPORT,
            Some(Point::new(800, 500)),
            9999,
        )
    }

    #[test]
    fn test_drag_from_header_moves_and_clamps() {
        let mut panel = card_panel();
        let start = Point::new(panel.rect.x, panel.rect.y);
        let grab = Point::new(panel.rect.x + 50, panel.rect.y + 10);

        assert!(panel.begin_drag(grab));
        panel.drag_to(Point::new(grab.x + 30, grab.y + 40), VIEWPORT);
        assert_eq!(panel.rect.x, start.x + 30);
        assert_eq!(panel.rect.y, start.y + 40);

        // Dragging far past the edge pins to the viewport bounds
        panel.drag_to(Point::new(grab.x + 100_000, grab.y + 100_000), VIEWPORT);
        assert_eq!(panel.rect.x, VIEWPORT.width - panel.rect.width);
        assert_eq!(panel.rect.y, VIEWPORT.height - panel.rect.height);

        panel.end_drag();
        assert!(!panel.is_dragging());
    }

    #[test]
    fn test_drag_ignored_on_close_control_and_body() {
        let mut panel = card_panel();

        let on_close = Point::new(panel.rect.right() - 5, panel.rect.y + 5);
        assert!(!panel.begin_drag(on_close));

        let on_body = Point::new(panel.rect.x + 50, panel.rect.y + 200);
        assert!(!panel.begin_drag(on_body));

        // Motion without an active drag is a no-op
        let before = panel.rect;
        panel.drag_to(Point::new(0, 0), VIEWPORT);
        assert_eq!(panel.rect, before);
    }

    #[test]
    fn test_resize_clamps_to_bounds() {
        let mut panel = card_panel();

        panel.resize(Size::new(10, 10), VIEWPORT);
        assert_eq!(panel.rect.size(), Size::new(300, 200));

        panel.resize(Size::new(99_999, 99_999), VIEWPORT);
        assert_eq!(panel.rect.size(), Size::new(950, 950));
        // Position re-clamped so the grown panel still fits
        assert!(panel.rect.right() <= VIEWPORT.width);
        assert!(panel.rect.bottom() <= VIEWPORT.height);
    }
}
