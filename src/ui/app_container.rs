//! Per-application root container and its overlay stack
//!
//! The root is a fixed-size panel covering the application area (screen minus
//! function bar). Pushing an overlay freezes the root's current children and
//! the last rendered image, then installs the overlay base as the only child.
//! Popping puts the frozen children back, untouched.
//!
//! ```text
//!  overlays: [frame 0] [frame 1] ... [top]
//!               │                      │
//!               │ app children         │ children under top (frame N-1's base)
//!               │ app image            │ image under top
//!               ▼                      ▼
//!  root.children = [ top overlay base ]
//! ```

use super::component::{Action, Component, ComponentId};
use super::geometry::{Declared, Scale};
use super::overlay::{Overlay, ResponseCallback};
use super::traits::{ChildOwning, Drawable, Hittable, RenderContext};
use crate::gfx::{Color, FontCache, Palette, Point, Size, Surface};
use crate::input::PointerEvent;
use anyhow::Result;

/// Snapshot taken when an overlay is pushed
struct OverlayFrame {
    id: ComponentId,
    title: String,
    on_response: Option<ResponseCallback>,
    frozen_children: Vec<Component>,
    frozen_surface: Surface,
}

/// What `pop_overlay` hands back to the caller
pub struct ClosedOverlay {
    pub id: ComponentId,
    pub title: String,
    pub on_response: Option<ResponseCallback>,
}

pub struct AppContainer {
    root: Component,
    area: Size,
    /// Declared logical size of the application, for resizable layouts
    logical: Option<Size>,
    /// Last composed image of the application area
    canvas: Surface,
    overlays: Vec<OverlayFrame>,
}

impl AppContainer {
    pub fn new(area: Size, logical: Option<Size>) -> Self {
        Self {
            root: Component::panel(Declared::px(0, 0, area.width, area.height)).fixed_size(),
            area,
            logical,
            canvas: Surface::new(area),
            overlays: Vec::new(),
        }
    }

    pub fn area(&self) -> Size {
        self.area
    }

    /// Physical area over the declared logical size, identity when undeclared
    pub fn scale(&self) -> Scale {
        self.logical
            .map(|logical| Scale::between(self.area, logical))
            .unwrap_or_default()
    }

    /// New screen dimensions (resize or rotation)
    pub fn resize(&mut self, area: Size) {
        self.area = area;
        let geometry = self.root.geometry_mut();
        geometry.set_size(area.width, area.height);
        geometry.invalidate();
    }

    pub fn root(&self) -> &Component {
        &self.root
    }

    /// Last composed image of the application area
    pub fn canvas(&self) -> &Surface {
        &self.canvas
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Application content
    // ─────────────────────────────────────────────────────────────────────────

    /// The application's own top-level children, even while overlays are up
    pub fn content(&self) -> &[Component] {
        match self.overlays.first() {
            Some(frame) => &frame.frozen_children,
            None => self.root.children(),
        }
    }

    fn content_mut(&mut self) -> &mut Vec<Component> {
        match self.overlays.first_mut() {
            Some(frame) => &mut frame.frozen_children,
            None => self.root.children_mut(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content().is_empty()
    }

    pub fn add(&mut self, child: Component) -> ComponentId {
        let id = child.id();
        self.content_mut().push(child);
        id
    }

    pub fn remove(&mut self, id: ComponentId) -> Option<Component> {
        let content = self.content_mut();
        let index = content.iter().position(|c| c.id() == id)?;
        Some(content.remove(index))
    }

    /// Search the visible tree first, then everything frozen under overlays
    pub fn find(&self, id: ComponentId) -> Option<&Component> {
        if let Some(found) = self.root.find(id) {
            return Some(found);
        }
        self.overlays
            .iter()
            .find_map(|frame| find_in(&frame.frozen_children, id))
    }

    pub fn find_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        if let Some(found) = self.root.find_mut(id) {
            return Some(found);
        }
        for frame in self.overlays.iter_mut() {
            if let Some(found) = find_in_mut(&mut frame.frozen_children, id) {
                return Some(found);
            }
        }
        None
    }

    /// Drop all content and every overlay
    pub fn clear(&mut self) {
        self.overlays.clear();
        self.root.clear_children();
        self.canvas.fill(Color::TRANSPARENT);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Overlay stack
    // ─────────────────────────────────────────────────────────────────────────

    pub fn push_overlay(&mut self, overlay: Overlay) -> ComponentId {
        let (base, title, on_response) = overlay.into_parts();
        let id = base.id();
        tracing::debug!(overlay = %id, title = %title, depth = self.overlays.len() + 1, "Pushing overlay");

        let frozen_children = self.root.take_children();
        self.overlays.push(OverlayFrame {
            id,
            title,
            on_response,
            frozen_children,
            frozen_surface: self.canvas.clone(),
        });
        self.root.add_child(base);
        id
    }

    pub fn pop_overlay(&mut self) -> Option<ClosedOverlay> {
        let frame = self.overlays.pop()?;
        tracing::debug!(overlay = %frame.id, depth = self.overlays.len(), "Popping overlay");
        self.root.set_children(frame.frozen_children);
        self.canvas = frame.frozen_surface;
        Some(ClosedOverlay {
            id: frame.id,
            title: frame.title,
            on_response: frame.on_response,
        })
    }

    /// Id and title of the overlay receiving input, if any
    pub fn top_overlay(&self) -> Option<(ComponentId, &str)> {
        self.overlays
            .last()
            .map(|frame| (frame.id, frame.title.as_str()))
    }

    pub fn overlay_depth(&self) -> usize {
        self.overlays.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Frame work
    // ─────────────────────────────────────────────────────────────────────────

    fn context<'a>(&self, palette: &'a Palette, fonts: &'a dyn FontCache) -> RenderContext<'a> {
        RenderContext::new(palette, fonts, self.area, self.scale())
    }

    pub fn layout(&mut self, palette: &Palette, fonts: &dyn FontCache) {
        let ctx = self.context(palette, fonts);
        self.root.layout(&ctx);
    }

    /// Re-resolve the whole visible tree
    pub fn refresh(&mut self, palette: &Palette, fonts: &dyn FontCache) {
        let ctx = self.context(palette, fonts);
        self.root.refresh(&ctx, true);
    }

    /// Compose the application area and blit it onto `target` at `at`
    pub fn render(
        &mut self,
        target: &mut Surface,
        palette: &Palette,
        fonts: &dyn FontCache,
        at: Point,
    ) -> Result<()> {
        let ctx = self.context(palette, fonts);
        self.canvas.ensure_size(self.area);
        match self.overlays.last() {
            None => self.root.render(&mut self.canvas, &ctx, Point::default())?,
            Some(frame) => {
                // Everything under the top overlay is the frozen image
                self.canvas.fill(Color::TRANSPARENT);
                self.canvas.blit(&frame.frozen_surface, Point::default());
                self.root
                    .render_children_onto(&mut self.canvas, &ctx, Point::default())?;
            }
        }
        target.blit(&self.canvas, at);
        Ok(())
    }

    /// Route an event at application-area coordinates to the node under its
    /// origin. Drag positions are reported relative to that same node.
    pub fn dispatch(&mut self, event: &PointerEvent) -> Option<Action> {
        let hit = self.root.hit_test(event.origin, Point::default())?;
        let anchor = event.origin.minus(hit.local);
        let local = event.position.minus(anchor);
        tracing::trace!(node = %hit.id, kind = ?event.kind, ?local, "Dispatching pointer event");
        self.root.descendant_mut(&hit.path)?.react(event.kind, local)
    }
}

fn find_in(children: &[Component], id: ComponentId) -> Option<&Component> {
    children
        .iter()
        .find_map(|c| if c.id() == id { Some(c) } else { c.find(id) })
}

fn find_in_mut(children: &mut [Component], id: ComponentId) -> Option<&mut Component> {
    for child in children.iter_mut() {
        if child.id() == id {
            return Some(child);
        }
        if let Some(found) = child.find_mut(id) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{BlockFont, Role};
    use crate::input::EventKind;
    use crate::ui::overlay::Dialog;

    fn container() -> AppContainer {
        AppContainer::new(Size::new(100, 100), None)
    }

    fn click(x: i32, y: i32) -> PointerEvent {
        PointerEvent {
            kind: EventKind::Click,
            origin: Point::new(x, y),
            position: Point::new(x, y),
        }
    }

    fn ids(children: &[Component]) -> Vec<ComponentId> {
        children.iter().map(|c| c.id()).collect()
    }

    #[test]
    fn test_push_then_pop_restores_identical_children() {
        let mut app = container();
        app.add(Component::panel(Declared::px(0, 0, 10, 10)));
        app.add(Component::panel(Declared::px(20, 0, 10, 10)));
        let before = ids(app.root().children());

        let overlay = Overlay::new("Menu", Component::panel(Declared::px(10, 10, 50, 50)));
        let overlay_id = app.push_overlay(overlay);
        assert_eq!(ids(app.root().children()), vec![overlay_id]);
        assert_eq!(app.top_overlay(), Some((overlay_id, "Menu")));

        let closed = app.pop_overlay().unwrap();
        assert_eq!(closed.id, overlay_id);
        assert_eq!(ids(app.root().children()), before);
        assert!(app.pop_overlay().is_none());
    }

    #[test]
    fn test_nested_overlays_are_lifo() {
        let mut app = container();
        let content = app.add(Component::panel(Declared::px(0, 0, 10, 10)));

        let first = app.push_overlay(Overlay::new("First", Component::panel(Declared::full())));
        let second = app.push_overlay(Overlay::new("Second", Component::panel(Declared::full())));
        assert_eq!(app.overlay_depth(), 2);
        assert_eq!(ids(app.root().children()), vec![second]);

        assert_eq!(app.pop_overlay().unwrap().title, "Second");
        assert_eq!(ids(app.root().children()), vec![first]);
        assert_eq!(app.pop_overlay().unwrap().title, "First");
        assert_eq!(ids(app.root().children()), vec![content]);
    }

    #[test]
    fn test_content_added_under_overlay_appears_after_pop() {
        let mut app = container();
        app.push_overlay(Overlay::new("Menu", Component::panel(Declared::full())));

        let late = app.add(Component::panel(Declared::px(0, 0, 5, 5)));
        assert_eq!(ids(app.content()), vec![late]);
        assert!(app.find(late).is_some());

        app.pop_overlay();
        assert_eq!(ids(app.root().children()), vec![late]);
    }

    #[test]
    fn test_only_top_overlay_receives_input() {
        let palette = Palette::default();
        let fonts = BlockFont;
        let mut app = container();
        app.add(Component::panel(Declared::full()).on_click(|_| Ok(())));
        app.layout(&palette, &fonts);
        assert!(app.dispatch(&click(50, 50)).is_some());

        // Modal dialog: the base swallows the click and has no binding
        app.push_overlay(Dialog::ok("Note", "hello").build("demo"));
        app.layout(&palette, &fonts);
        assert!(app.dispatch(&click(50, 5)).is_none());

        // Plain overlay: clicking outside the panel dismisses
        app.pop_overlay();
        let mut plain = Overlay::new("Menu", Component::panel(Declared::px(10, 10, 20, 20)));
        plain.attach("demo");
        app.push_overlay(plain);
        app.layout(&palette, &fonts);
        assert!(app.dispatch(&click(90, 90)).is_some());
        assert!(app.dispatch(&click(15, 15)).is_none());
    }

    #[test]
    fn test_overlay_renders_over_frozen_image() {
        let palette = Palette::default();
        let fonts = BlockFont;
        let mut app = container();
        let red = Color::rgb(255, 0, 0);
        app.add(Component::panel(Declared::full()).with_background(red));
        let mut screen = Surface::new(Size::new(100, 100));
        app.render(&mut screen, &palette, &fonts, Point::default()).unwrap();
        assert_eq!(screen.get(50, 50), Some(red));

        app.push_overlay(Overlay::new(
            "Menu",
            Component::panel(Declared::px(0, 0, 20, 20)).with_background(Role::Accent),
        ));
        app.render(&mut screen, &palette, &fonts, Point::default()).unwrap();
        assert_eq!(screen.get(5, 5), Some(palette.color(Role::Accent)));
        assert_eq!(screen.get(50, 50), Some(red));

        app.pop_overlay();
        assert_eq!(app.canvas().get(5, 5), Some(red));
    }

    #[test]
    fn test_drag_local_is_relative_to_press_target() {
        let palette = Palette::default();
        let fonts = BlockFont;
        let mut app = container();
        let slider = app.add(Component::slider(Declared::px(0, 40, 100, 20), 0));
        app.layout(&palette, &fonts);

        let drag = PointerEvent {
            kind: EventKind::DragUpdate,
            origin: Point::new(10, 50),
            position: Point::new(75, 90),
        };
        app.dispatch(&drag);
        assert_eq!(app.find(slider).and_then(|s| s.slider_value()), Some(75));
    }

    #[test]
    fn test_scale_from_logical_size() {
        let app = AppContainer::new(Size::new(240, 280), Some(Size::new(120, 140)));
        assert_eq!(app.scale(), Scale { x: 2.0, y: 2.0 });
        assert_eq!(container().scale(), Scale::IDENTITY);
    }
}
