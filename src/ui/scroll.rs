// Scrollable container state
//
// Owns the pixel offset of a scrollable container's content plus the drag
// anchor used while the scrollbar indicator is being dragged. The container
// widget feeds it content/viewport sizes every layout pass and routes pointer
// events on the scrollbar strip here.
//
// Scrollbar strip layout (right edge, SCROLLBAR_WIDTH wide):
// - top SCROLL_BUTTON px: scroll up one step on click
// - bottom SCROLL_BUTTON px: scroll down one step on click
// - between: the track, with the indicator drawn proportionally

use super::traits::RenderContext;
use crate::gfx::{Point, Rect, Role, Shade, Size, Surface};
use crate::input::EventKind;

/// Width of the scrollbar strip in pixels
pub const SCROLLBAR_WIDTH: i32 = 20;

/// Height of the step buttons at each end of the strip
const SCROLL_BUTTON: i32 = 20;

/// Scroll state for a scrollable container
#[derive(Debug, Clone)]
pub struct ScrollState {
    /// Pixels of content scrolled above the viewport
    offset: i32,

    /// Total content height
    total: i32,

    /// Visible height
    viewport: i32,

    /// Last pointer y seen while dragging the indicator
    drag_anchor: Option<i32>,
}

impl ScrollState {
    pub fn new() -> Self {
        Self {
            offset: 0,
            total: 0,
            viewport: 0,
            drag_anchor: None,
        }
    }

    /// Update content and viewport dimensions
    /// Called every layout pass with current sizes
    pub fn update_dimensions(&mut self, total: i32, viewport: i32) {
        self.total = total.max(0);
        self.viewport = viewport.max(0);
        self.offset = self.offset.clamp(0, self.max_offset());
    }

    /// Scroll by `amount` pixels (positive moves content up), clamped to content
    pub fn scroll_by(&mut self, amount: i32) {
        self.offset = (self.offset + amount).clamp(0, self.max_offset());
    }

    /// One step is an eighth of the viewport
    pub fn step(&self) -> i32 {
        (self.viewport / 8).max(1)
    }

    pub fn scroll_up(&mut self) {
        self.scroll_by(-self.step());
    }

    pub fn scroll_down(&mut self) {
        self.scroll_by(self.step());
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Check if content overflows viewport (scrollbar indicator meaningful)
    pub fn needs_scrollbar(&self) -> bool {
        self.total > self.viewport
    }

    /// Get scrollbar position (0.0 to 1.0)
    pub fn scrollbar_position(&self) -> f64 {
        if self.max_offset() == 0 {
            0.0
        } else {
            self.offset as f64 / self.max_offset() as f64
        }
    }

    /// Maximum valid offset
    fn max_offset(&self) -> i32 {
        (self.total - self.viewport).max(0)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Indicator rectangle within the track, in strip-local coordinates
    fn indicator(&self, track: i32) -> (i32, i32) {
        if !self.needs_scrollbar() || track <= 0 {
            return (0, track.max(0));
        }
        let length = (track as i64 * self.viewport as i64 / self.total as i64).max(4) as i32;
        let start = ((track - length) as f64 * self.scrollbar_position()).round() as i32;
        (start, length)
    }

    /// Route a pointer event that landed on the scrollbar strip
    pub fn react(&mut self, kind: EventKind, local: Point, size: Size) {
        match kind {
            EventKind::DragUpdate => {
                if let Some(previous) = self.drag_anchor {
                    let delta = local.y - previous;
                    if delta != 0 && self.viewport > 0 {
                        // Indicator moves at viewport/total of content speed
                        let amount = delta as i64 * self.total.max(1) as i64 / self.viewport as i64;
                        self.scroll_by(amount as i32);
                    }
                }
                self.drag_anchor = Some(local.y);
            }
            EventKind::Click | EventKind::LongClick => {
                // A release that ends a drag only clears the anchor
                if self.drag_anchor.take().is_some() {
                    return;
                }
                if local.y < SCROLL_BUTTON {
                    self.scroll_up();
                } else if local.y >= size.height - SCROLL_BUTTON {
                    self.scroll_down();
                }
            }
        }
    }

    pub(crate) fn paint_bar(&self, surface: &mut Surface, ctx: &RenderContext) {
        let Size { width, height } = surface.size();
        let x = width - SCROLLBAR_WIDTH;
        surface.fill_rect(
            Rect::new(x, 0, SCROLLBAR_WIDTH, height),
            ctx.palette.shade(Role::Background, Shade::Dark),
        );

        let buttons = ctx.palette.color(Role::Item);
        surface.fill_rect(Rect::new(x + 4, 4, SCROLLBAR_WIDTH - 8, SCROLL_BUTTON - 8), buttons);
        surface.fill_rect(
            Rect::new(x + 4, height - SCROLL_BUTTON + 4, SCROLLBAR_WIDTH - 8, SCROLL_BUTTON - 8),
            buttons,
        );

        let track = height - 2 * SCROLL_BUTTON;
        let (start, length) = self.indicator(track);
        surface.fill_rect(
            Rect::new(x + 2, SCROLL_BUTTON + start, SCROLLBAR_WIDTH - 4, length),
            ctx.palette.color(Role::Accent),
        );
    }
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{BlockFont, Palette};
    use crate::ui::geometry::{Declared, Scale};
    use crate::ui::traits::{ChildOwning, Drawable, Hittable};
    use crate::ui::Component;

    #[test]
    fn test_scroll_clamps_to_content() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(400, 100);

        scroll.scroll_by(-50);
        assert_eq!(scroll.offset(), 0);

        scroll.scroll_by(1000);
        assert_eq!(scroll.offset(), 300);

        // Content shrinking pulls the offset back
        scroll.update_dimensions(150, 100);
        assert_eq!(scroll.offset(), 50);
    }

    #[test]
    fn test_no_scroll_when_content_fits() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(80, 100);
        scroll.scroll_down();
        assert_eq!(scroll.offset(), 0);
        assert!(!scroll.needs_scrollbar());
    }

    #[test]
    fn test_drag_scrolls_proportionally_and_click_resets() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(400, 100);
        let size = Size::new(100, 100);

        // First update only sets the anchor
        scroll.react(EventKind::DragUpdate, Point::new(90, 50), size);
        assert_eq!(scroll.offset(), 0);
        assert!(scroll.is_dragging());

        // 10px of indicator travel = 40px of content
        scroll.react(EventKind::DragUpdate, Point::new(90, 60), size);
        assert_eq!(scroll.offset(), 40);

        // Release ends the drag without stepping
        scroll.react(EventKind::Click, Point::new(90, 95), size);
        assert!(!scroll.is_dragging());
        assert_eq!(scroll.offset(), 40);

        // A fresh click on the bottom button steps down
        scroll.react(EventKind::Click, Point::new(90, 95), size);
        assert_eq!(scroll.offset(), 52);
    }

    #[test]
    fn test_scrolled_children_hit_and_render_offset() {
        let palette = Palette::default();
        let fonts = BlockFont;
        let ctx = crate::ui::traits::RenderContext::new(
            &palette,
            &fonts,
            Size::new(100, 100),
            Scale::IDENTITY,
        );
        let mut list = Component::scrollable(Declared::px(0, 0, 100, 100));
        let mut ids = Vec::new();
        for i in 0..10 {
            ids.push(list.add_child(Component::panel(Declared::px(0, i * 40, 80, 40))));
        }
        list.layout(&ctx);
        list.scroll_state_mut().unwrap().scroll_by(100);

        // y=10 in the viewport is content y=110, the third row
        let hit = list.hit_test(Point::new(10, 10), Point::default()).unwrap();
        assert_eq!(hit.id, ids[2]);

        // The strip belongs to the container itself
        let hit = list.hit_test(Point::new(95, 10), Point::default()).unwrap();
        assert_eq!(hit.id, list.id());
    }

    #[test]
    fn test_content_gap_does_not_scroll() {
        let palette = Palette::default();
        let fonts = BlockFont;
        let ctx = crate::ui::traits::RenderContext::new(
            &palette,
            &fonts,
            Size::new(100, 100),
            Scale::IDENTITY,
        );
        let mut list = Component::scrollable(Declared::px(0, 0, 100, 100));
        for i in 0..10 {
            list.add_child(Component::panel(Declared::px(0, i * 40, 50, 40)));
        }
        list.layout(&ctx);

        // Right of the rows but left of the strip: the container is hit, yet
        // neither a click on the bottom band nor a drag moves the content
        let hit = list.hit_test(Point::new(70, 90), Point::default()).unwrap();
        assert_eq!(hit.id, list.id());
        list.react(EventKind::Click, hit.local);
        list.react(EventKind::DragUpdate, Point::new(70, 50));
        list.react(EventKind::DragUpdate, Point::new(70, 80));
        assert_eq!(list.scroll_state_mut().unwrap().offset(), 0);

        // The same band on the strip steps down
        list.react(EventKind::Click, Point::new(90, 90));
        assert_eq!(list.scroll_state_mut().unwrap().offset(), 12);

        // A drag begun on the strip keeps scrolling off it
        list.react(EventKind::DragUpdate, Point::new(90, 50));
        list.react(EventKind::DragUpdate, Point::new(40, 60));
        assert_eq!(list.scroll_state_mut().unwrap().offset(), 52);
    }
}
