//! The component record and its capability implementations
//!
//! Every node in the tree is a [`Component`]: shared geometry, options,
//! surface and event bindings, plus a [`Widget`] variant for kind-specific
//! state. Containers are simply components with children.

use super::geometry::{Declared, Geometry};
use super::traits::{ChildOwning, Drawable, Hit, Hittable, RenderContext};
use super::widgets::Widget;
use crate::gfx::{Color, Paint, Point, Rect, Role, Size, Surface};
use crate::input::EventKind;
use crate::shell::Shell;
use anyhow::Result;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique component identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Event handler bound to a component. Arguments are captured by the closure.
pub type Handler = Rc<dyn Fn(&mut Shell) -> Result<()>>;

/// Deferred work produced by a component reacting to an event. Runs after the
/// tree borrow is released so it can freely mutate the shell.
pub type Action = Box<dyn FnOnce(&mut Shell) -> Result<()>>;

/// Semantic event → handler table
#[derive(Clone, Default)]
pub struct Bindings {
    pub on_click: Option<Handler>,
    pub on_long_click: Option<Handler>,
    pub on_drag: Option<Handler>,
}

impl Bindings {
    pub fn get(&self, kind: EventKind) -> Option<&Handler> {
        match kind {
            EventKind::Click => self.on_click.as_ref(),
            EventKind::LongClick => self.on_long_click.as_ref(),
            EventKind::DragUpdate => self.on_drag.as_ref(),
        }
    }
}

/// Recognised per-component options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Options {
    /// Frame thickness in pixels, 0 for none
    pub border: i32,
    pub border_color: Paint,
    pub background: Paint,
    /// Skip the background fill so the parent shows through
    pub transparent: bool,
    /// Treat the whole node as one hit target, ignoring children
    pub opaque_to_children: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            border: 0,
            border_color: Paint::role(Role::Item),
            background: Paint::role(Role::Background),
            transparent: false,
            opaque_to_children: false,
        }
    }
}

/// A node in the UI tree
pub struct Component {
    id: ComponentId,
    geometry: Geometry,
    pub options: Options,
    surface: Surface,
    bindings: Bindings,
    widget: Widget,
    children: Vec<Component>,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("kind", &self.widget.kind_name())
            .field("rect", &self.geometry.computed())
            .field("children", &self.children)
            .finish()
    }
}

impl Component {
    pub fn new(declared: Declared, widget: Widget) -> Self {
        Self {
            id: ComponentId::next(),
            geometry: Geometry::new(declared),
            options: Options::default(),
            surface: Surface::new(Size::default()),
            bindings: Bindings::default(),
            widget,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.geometry
    }

    /// Resolved rectangle relative to the parent
    pub fn computed(&self) -> Rect {
        self.geometry.computed()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut Widget {
        &mut self.widget
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builders
    // ─────────────────────────────────────────────────────────────────────────

    pub fn with_border(mut self, width: i32, color: impl Into<Paint>) -> Self {
        self.options.border = width;
        self.options.border_color = color.into();
        self
    }

    pub fn with_background(mut self, paint: impl Into<Paint>) -> Self {
        self.options.background = paint.into();
        self.options.transparent = false;
        self
    }

    pub fn transparent(mut self) -> Self {
        self.options.transparent = true;
        self
    }

    pub fn resizable(mut self) -> Self {
        self.geometry.flags.resizable = true;
        self
    }

    pub fn fixed_size(mut self) -> Self {
        self.geometry.flags.fixed_size = true;
        self
    }

    pub fn opaque_to_children(mut self) -> Self {
        self.options.opaque_to_children = true;
        self
    }

    pub fn with_child(mut self, child: Component) -> Self {
        self.children.push(child);
        self
    }

    pub fn on_click(mut self, f: impl Fn(&mut Shell) -> Result<()> + 'static) -> Self {
        self.bindings.on_click = Some(Rc::new(f));
        self
    }

    pub fn on_long_click(mut self, f: impl Fn(&mut Shell) -> Result<()> + 'static) -> Self {
        self.bindings.on_long_click = Some(Rc::new(f));
        self
    }

    pub fn on_drag(mut self, f: impl Fn(&mut Shell) -> Result<()> + 'static) -> Self {
        self.bindings.on_drag = Some(Rc::new(f));
        self
    }

    pub fn set_binding(&mut self, kind: EventKind, handler: Option<Handler>) {
        match kind {
            EventKind::Click => self.bindings.on_click = handler,
            EventKind::LongClick => self.bindings.on_long_click = handler,
            EventKind::DragUpdate => self.bindings.on_drag = handler,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tree access
    // ─────────────────────────────────────────────────────────────────────────

    /// Follow a hit path of child indices
    pub fn descendant(&self, path: &[usize]) -> Option<&Component> {
        let mut node = self;
        for &i in path {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Component> {
        let mut node = self;
        for &i in path {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }

    /// Apply internal behaviour for `kind` (toggle, slide, scroll) and collect
    /// the work to run against the shell afterwards
    pub fn react(&mut self, kind: EventKind, local: Point) -> Option<Action> {
        let internal = self.widget.react(kind, local, self.geometry.size());
        let user = self.bindings.get(kind).cloned().map(|handler| -> Action {
            Box::new(move |shell: &mut Shell| handler(shell))
        });
        match (internal, user) {
            (Some(first), Some(second)) => Some(Box::new(move |shell: &mut Shell| {
                first(shell)?;
                second(shell)
            })),
            (first, second) => first.or(second),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Layout internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve this node only: content-driven size, geometry, child arrangement
    fn prepare(&mut self, ctx: &RenderContext) {
        self.widget.measure(&mut self.geometry, ctx);
        self.geometry.sync(ctx.parent, ctx.scale);
        self.surface.ensure_size(self.geometry.size());
        let inner = ctx.child(self.geometry.size());
        self.widget.arrange(&mut self.children, &inner);
    }

    /// Paint own content and children onto the node's surface
    fn paint(&mut self, ctx: &RenderContext) -> Result<()> {
        let background = if self.options.transparent {
            Color::TRANSPARENT
        } else {
            ctx.palette.resolve(self.options.background)
        };
        self.surface.fill(background);

        self.widget.paint(&mut self.surface, ctx)?;
        self.render_children_onto_own_surface(ctx)?;
        self.widget.settle(&self.children, self.geometry.size());
        self.widget.paint_over(&mut self.surface, ctx);

        if self.options.border > 0 {
            let color = ctx.palette.resolve(self.options.border_color);
            self.surface.draw_border(self.options.border, color);
        }
        Ok(())
    }

    fn render_children_onto_own_surface(&mut self, ctx: &RenderContext) -> Result<()> {
        let inner = ctx.child(self.geometry.size());
        let offset = self.widget.content_offset();
        let Self {
            surface, children, ..
        } = self;
        for child in children.iter_mut() {
            child.render(surface, &inner, offset)?;
        }
        Ok(())
    }

    /// Render only the children straight onto `target` at `origin`, skipping
    /// this node's own fill. Used when the node's own pixels come from a
    /// frozen snapshot.
    pub fn render_children_onto(
        &mut self,
        target: &mut Surface,
        ctx: &RenderContext,
        origin: Point,
    ) -> Result<()> {
        self.prepare(ctx);
        let inner = ctx.child(self.geometry.size());
        let origin = origin.offset(self.geometry.position());
        for child in self.children.iter_mut() {
            child.render(target, &inner, origin)?;
        }
        Ok(())
    }
}

impl Drawable for Component {
    fn layout(&mut self, ctx: &RenderContext) {
        self.prepare(ctx);
        let inner = ctx.child(self.geometry.size());
        for child in self.children.iter_mut() {
            child.layout(&inner);
        }
        self.widget.settle(&self.children, self.geometry.size());
    }

    fn render(&mut self, target: &mut Surface, ctx: &RenderContext, origin: Point) -> Result<()> {
        self.prepare(ctx);
        self.paint(ctx)?;
        target.blit(&self.surface, origin.offset(self.geometry.position()));
        Ok(())
    }

    fn refresh(&mut self, ctx: &RenderContext, cascade: bool) {
        self.geometry.invalidate();
        self.prepare(ctx);
        if cascade {
            let inner = ctx.child(self.geometry.size());
            for child in self.children.iter_mut() {
                child.refresh(&inner, true);
            }
        }
    }
}

impl Hittable for Component {
    fn hit_test(&self, point: Point, offset: Point) -> Option<Hit> {
        let rect = self.geometry.computed().translated(offset);
        if !rect.contains(point) {
            return None;
        }
        let local = point.minus(rect.origin());
        let own = Hit {
            id: self.id,
            path: Vec::new(),
            local,
        };

        if self.options.opaque_to_children
            || self.children.is_empty()
            || self.widget.captures(local, rect.size())
        {
            return Some(own);
        }

        let child_offset = rect.origin().offset(self.widget.content_offset());
        for (i, child) in self.children.iter().enumerate().rev() {
            if let Some(mut hit) = child.hit_test(point, child_offset) {
                hit.path.insert(0, i);
                return Some(hit);
            }
        }
        Some(own)
    }
}

impl ChildOwning for Component {
    fn children(&self) -> &[Component] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Component> {
        &mut self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{BlockFont, Palette};
    use crate::ui::geometry::{Dim, Scale};
    use crate::ui::widgets::Widget;

    fn ctx<'a>(palette: &'a Palette, fonts: &'a BlockFont, size: Size) -> RenderContext<'a> {
        RenderContext::new(palette, fonts, size, Scale::IDENTITY)
    }

    fn panel(x: i32, y: i32, w: i32, h: i32) -> Component {
        Component::new(Declared::px(x, y, w, h), Widget::Panel)
    }

    #[test]
    fn test_percent_child_resolves_against_container() {
        let palette = Palette::default();
        let fonts = BlockFont;
        let mut root = panel(0, 0, 100, 100).with_child(Component::new(
            Declared::parse("50%,50%", "10%,10%").unwrap(),
            Widget::Panel,
        ));

        root.layout(&ctx(&palette, &fonts, Size::new(240, 320)));

        assert_eq!(root.children()[0].computed(), Rect::new(50, 50, 10, 10));
        assert_eq!(root.children()[0].surface().size(), Size::new(10, 10));
    }

    #[test]
    fn test_hit_test_prefers_last_inserted() {
        let palette = Palette::default();
        let fonts = BlockFont;
        let mut root = panel(0, 0, 100, 100);
        let below = root.add_child(panel(10, 10, 50, 50));
        let above = root.add_child(panel(30, 30, 50, 50));
        root.layout(&ctx(&palette, &fonts, Size::new(100, 100)));

        let hit = root.hit_test(Point::new(40, 40), Point::default()).unwrap();
        assert_eq!(hit.id, above);
        assert_eq!(hit.path, vec![1]);
        assert_eq!(hit.local, Point::new(10, 10));

        let hit = root.hit_test(Point::new(15, 15), Point::default()).unwrap();
        assert_eq!(hit.id, below);

        let hit = root.hit_test(Point::new(95, 5), Point::default()).unwrap();
        assert_eq!(hit.id, root.id());

        assert!(root.hit_test(Point::new(150, 5), Point::default()).is_none());
    }

    #[test]
    fn test_hit_test_translates_through_nested_containers() {
        let palette = Palette::default();
        let fonts = BlockFont;
        let leaf = panel(5, 5, 10, 10);
        let leaf_id = leaf.id();
        let mut root = panel(0, 0, 200, 200).with_child(panel(50, 60, 100, 100).with_child(leaf));
        root.layout(&ctx(&palette, &fonts, Size::new(200, 200)));

        let hit = root.hit_test(Point::new(57, 67), Point::default()).unwrap();
        assert_eq!(hit.id, leaf_id);
        assert_eq!(hit.path, vec![0, 0]);
        assert_eq!(hit.local, Point::new(2, 2));
        assert_eq!(root.descendant(&hit.path).map(|c| c.id()), Some(leaf_id));
    }

    #[test]
    fn test_opaque_container_swallows_children() {
        let palette = Palette::default();
        let fonts = BlockFont;
        let group = panel(0, 0, 50, 50)
            .with_child(panel(0, 0, 50, 50))
            .opaque_to_children();
        let group_id = group.id();
        let mut root = panel(0, 0, 100, 100).with_child(group);
        root.layout(&ctx(&palette, &fonts, Size::new(100, 100)));

        let hit = root.hit_test(Point::new(10, 10), Point::default()).unwrap();
        assert_eq!(hit.id, group_id);
    }

    #[test]
    fn test_render_paints_children_in_order_and_border() {
        let palette = Palette::default();
        let fonts = BlockFont;
        let red = Color::rgb(255, 0, 0);
        let blue = Color::rgb(0, 0, 255);
        let mut root = panel(0, 0, 20, 20)
            .with_child(panel(0, 0, 10, 10).with_background(red))
            .with_child(panel(5, 5, 10, 10).with_background(blue))
            .with_border(1, Color::BLACK);
        let mut target = Surface::new(Size::new(20, 20));

        root.render(&mut target, &ctx(&palette, &fonts, Size::new(20, 20)), Point::default())
            .unwrap();

        assert_eq!(target.get(2, 2), Some(red));
        assert_eq!(target.get(7, 7), Some(blue));
        assert_eq!(target.get(0, 10), Some(Color::BLACK));
        assert_eq!(target.get(18, 18), Some(palette.color(Role::Background)));
    }

    #[test]
    fn test_declared_change_is_picked_up_on_next_render() {
        let palette = Palette::default();
        let fonts = BlockFont;
        let mut root = panel(0, 0, 100, 100);
        let mut target = Surface::new(Size::new(100, 100));
        let c = ctx(&palette, &fonts, Size::new(100, 100));
        root.render(&mut target, &c, Point::default()).unwrap();

        root.geometry_mut().set_size(Dim::Percent(50), 40);
        root.render(&mut target, &c, Point::default()).unwrap();

        assert_eq!(root.computed(), Rect::new(0, 0, 50, 40));
        assert_eq!(root.surface().size(), Size::new(50, 40));
    }

    #[test]
    fn test_remove_and_find() {
        let mut root = panel(0, 0, 10, 10);
        let a = root.add_child(panel(0, 0, 1, 1).with_child(panel(0, 0, 1, 1)));
        let nested = root.children()[0].children()[0].id();

        assert!(root.find(nested).is_some());
        assert!(root.remove_child(a).is_some());
        assert!(root.find(nested).is_none());
        assert!(root.remove_child(a).is_none());
    }
}
