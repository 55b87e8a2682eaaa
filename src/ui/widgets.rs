//! Widget variants: kind-specific state, painting and internal reactions
//!
//! Constructors return a ready [`Component`] with sensible options for the
//! kind (text is transparent, buttons are opaque to their label, and so on).

use super::component::{Action, Component};
use super::geometry::{self, Declared, Dim, Geometry};
use super::scroll::{ScrollState, SCROLLBAR_WIDTH};
use super::traits::RenderContext;
use crate::gfx::{Color, Paint, Point, Rect, Role, Shade, Size, Surface};
use crate::input::EventKind;
use crate::shell::Shell;
use anyhow::Result;
use std::rc::Rc;

/// Default text size in pixels
pub const DEFAULT_TEXT_SIZE: u32 = 14;

pub type ToggleHandler = Rc<dyn Fn(&mut Shell, bool) -> Result<()>>;
pub type SlideHandler = Rc<dyn Fn(&mut Shell, u8) -> Result<()>>;
pub type PaintFn = Box<dyn FnMut(&mut Surface, &RenderContext) -> Result<()>>;

/// Kind-specific part of a component
pub enum Widget {
    /// Plain container
    Panel,
    Text(TextState),
    Image(Surface),
    /// Container whose label child is centred and never hit-tested
    Button,
    Checkbox {
        checked: bool,
        on_change: Option<ToggleHandler>,
    },
    Switch {
        on: bool,
        on_change: Option<ToggleHandler>,
    },
    Slider {
        value: u8,
        on_change: Option<SlideHandler>,
    },
    Scroll(ScrollState),
    /// Application-drawn content
    Canvas(PaintFn),
}

/// Text content plus its cached raster
pub struct TextState {
    text: String,
    pub size: u32,
    pub color: Paint,
    /// Wrap on word boundaries at the parent's right edge
    pub wrap: bool,
    lines: Vec<String>,
    raster: Option<(Vec<String>, Color, Surface)>,
}

impl TextState {
    pub fn new(text: impl Into<String>, size: u32) -> Self {
        Self {
            text: text.into(),
            size,
            color: Paint::role(Role::Item),
            wrap: false,
            lines: Vec::new(),
            raster: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl Widget {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Widget::Panel => "panel",
            Widget::Text(_) => "text",
            Widget::Image(_) => "image",
            Widget::Button => "button",
            Widget::Checkbox { .. } => "checkbox",
            Widget::Switch { .. } => "switch",
            Widget::Slider { .. } => "slider",
            Widget::Scroll(_) => "scroll",
            Widget::Canvas(_) => "canvas",
        }
    }

    /// Content-driven size: text sets its own declared width and height
    pub(crate) fn measure(&mut self, geometry: &mut Geometry, ctx: &RenderContext) {
        let Widget::Text(text) = self else {
            return;
        };
        text.lines = if text.wrap {
            let x = geometry::resolve(geometry.declared(), ctx.parent, ctx.scale, geometry.flags).x;
            ctx.fonts.wrap(&text.text, text.size, (ctx.parent.width - x).max(1))
        } else {
            vec![text.text.clone()]
        };
        let width = text
            .lines
            .iter()
            .map(|line| ctx.fonts.measure(line, text.size).width)
            .max()
            .unwrap_or(0);
        let height = text.lines.len() as i32 * text.size as i32;
        geometry.set_size(width, height);
    }

    /// Position children that depend on this node's size
    pub(crate) fn arrange(&mut self, children: &mut [Component], ctx: &RenderContext) {
        if !matches!(self, Widget::Button) {
            return;
        }
        for child in children.iter_mut() {
            let Widget::Text(label) = child.widget() else {
                continue;
            };
            let measured = ctx.fonts.measure(&label.text, label.size);
            child.geometry_mut().set_position(
                (ctx.parent.width - measured.width) / 2,
                (ctx.parent.height - measured.height) / 2,
            );
        }
    }

    /// Update state that depends on laid-out children
    pub(crate) fn settle(&mut self, children: &[Component], size: Size) {
        if let Widget::Scroll(state) = self {
            let content = children
                .iter()
                .map(|c| {
                    let r = c.computed();
                    r.y + r.height
                })
                .max()
                .unwrap_or(0);
            state.update_dimensions(content, size.height);
        }
    }

    /// Paint beneath children
    pub(crate) fn paint(&mut self, surface: &mut Surface, ctx: &RenderContext) -> Result<()> {
        let size = surface.size();
        match self {
            Widget::Text(text) => {
                let color = ctx.palette.resolve(text.color);
                let fresh = match &text.raster {
                    Some((lines, c, _)) => lines != &text.lines || *c != color,
                    None => true,
                };
                if fresh {
                    let mut raster = Surface::new(size);
                    for (i, line) in text.lines.iter().enumerate() {
                        let glyphs = ctx.fonts.rasterize(line, text.size, color);
                        raster.blit(&glyphs, Point::new(0, i as i32 * text.size as i32));
                    }
                    text.raster = Some((text.lines.clone(), color, raster));
                }
                if let Some((_, _, raster)) = &text.raster {
                    surface.blit(raster, Point::default());
                }
            }
            Widget::Image(pixels) => {
                if pixels.size() == size {
                    surface.blit(pixels, Point::default());
                } else {
                    surface.blit(&pixels.scaled(size), Point::default());
                }
            }
            Widget::Checkbox { checked, .. } => {
                if *checked {
                    let inset = (size.width.min(size.height) / 4).max(1);
                    surface.fill_rect(
                        Rect::new(inset, inset, size.width - 2 * inset, size.height - 2 * inset),
                        ctx.palette.color(Role::Accent),
                    );
                }
            }
            Widget::Switch { on, .. } => {
                let half = size.width / 2;
                let (knob_x, knob) = if *on {
                    (half, ctx.palette.color(Role::Accent))
                } else {
                    (0, ctx.palette.shade(Role::Item, Shade::Light))
                };
                surface.fill_rect(Rect::new(knob_x, 0, size.width - half, size.height), knob);
            }
            Widget::Slider { value, .. } => {
                let filled = size.width * *value as i32 / 100;
                surface.fill_rect(
                    Rect::new(0, 0, filled, size.height),
                    ctx.palette.color(Role::Accent),
                );
            }
            Widget::Canvas(paint) => paint(surface, ctx)?,
            Widget::Panel | Widget::Button | Widget::Scroll(_) => {}
        }
        Ok(())
    }

    /// Paint above children
    pub(crate) fn paint_over(&self, surface: &mut Surface, ctx: &RenderContext) {
        if let Widget::Scroll(state) = self {
            state.paint_bar(surface, ctx);
        }
    }

    /// Offset applied to children for both rendering and hit-testing
    pub(crate) fn content_offset(&self) -> Point {
        match self {
            Widget::Scroll(state) => Point::new(0, -state.offset()),
            _ => Point::default(),
        }
    }

    /// Whether a point in local coordinates belongs to the widget itself even
    /// though it has children
    pub(crate) fn captures(&self, local: Point, size: Size) -> bool {
        matches!(self, Widget::Scroll(_)) && local.x >= size.width - SCROLLBAR_WIDTH
    }

    /// Internal overrides run before the user binding
    pub(crate) fn react(&mut self, kind: EventKind, local: Point, size: Size) -> Option<Action> {
        match (self, kind) {
            (Widget::Checkbox { checked, on_change }, EventKind::Click)
            | (Widget::Switch { on: checked, on_change }, EventKind::Click) => {
                *checked = !*checked;
                let value = *checked;
                let handler = on_change.clone()?;
                Some(Box::new(move |shell: &mut Shell| handler(shell, value)))
            }
            (Widget::Slider { value, on_change }, EventKind::Click | EventKind::DragUpdate) => {
                let pct = if size.width > 0 {
                    (local.x * 100 / size.width).clamp(0, 100) as u8
                } else {
                    0
                };
                if pct == *value && kind == EventKind::DragUpdate {
                    return None;
                }
                *value = pct;
                let handler = on_change.clone()?;
                Some(Box::new(move |shell: &mut Shell| handler(shell, pct)))
            }
            (Widget::Scroll(state), kind) => {
                // Only the strip scrolls; a drag that began there keeps
                // tracking after the pointer leaves it
                if local.x >= size.width - SCROLLBAR_WIDTH || state.is_dragging() {
                    state.react(kind, local, size);
                }
                None
            }
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Constructors
// ─────────────────────────────────────────────────────────────────────────────

impl Component {
    pub fn panel(declared: Declared) -> Component {
        Component::new(declared, Widget::Panel)
    }

    /// Single-line text sized to its content
    pub fn text(x: impl Into<Dim>, y: impl Into<Dim>, text: impl Into<String>, size: u32) -> Component {
        Component::new(Declared::new(x, y, 0, 0), Widget::Text(TextState::new(text, size))).transparent()
    }

    /// Text that wraps at the parent's right edge
    pub fn wrapped_text(x: impl Into<Dim>, y: impl Into<Dim>, text: impl Into<String>, size: u32) -> Component {
        let mut state = TextState::new(text, size);
        state.wrap = true;
        Component::new(Declared::new(x, y, 0, 0), Widget::Text(state)).transparent()
    }

    pub fn button(declared: Declared, label: impl Into<String>) -> Component {
        Component::new(declared, Widget::Button)
            .with_background(Paint::Role(Role::Background, Shade::Dark))
            .with_child(Component::text(0, 0, label, DEFAULT_TEXT_SIZE))
            .opaque_to_children()
    }

    pub fn image(declared: Declared, pixels: Surface) -> Component {
        Component::new(declared, Widget::Image(pixels)).transparent()
    }

    pub fn checkbox(declared: Declared, checked: bool) -> Component {
        Component::new(
            declared,
            Widget::Checkbox {
                checked,
                on_change: None,
            },
        )
        .with_border(1, Role::Item)
    }

    pub fn switch(declared: Declared, on: bool) -> Component {
        Component::new(declared, Widget::Switch { on, on_change: None })
            .with_border(1, Role::Item)
    }

    pub fn slider(declared: Declared, value: u8) -> Component {
        Component::new(
            declared,
            Widget::Slider {
                value: value.min(100),
                on_change: None,
            },
        )
        .with_background(Paint::Role(Role::Background, Shade::Dark))
        .with_border(1, Role::Item)
    }

    pub fn scrollable(declared: Declared) -> Component {
        Component::new(declared, Widget::Scroll(ScrollState::new()))
    }

    pub fn canvas(
        declared: Declared,
        paint: impl FnMut(&mut Surface, &RenderContext) -> Result<()> + 'static,
    ) -> Component {
        Component::new(declared, Widget::Canvas(Box::new(paint))).transparent()
    }

    /// Change callback for checkboxes and switches
    pub fn on_toggle(mut self, f: impl Fn(&mut Shell, bool) -> Result<()> + 'static) -> Self {
        match self.widget_mut() {
            Widget::Checkbox { on_change, .. } | Widget::Switch { on_change, .. } => {
                *on_change = Some(Rc::new(f));
            }
            other => tracing::warn!(kind = other.kind_name(), "on_toggle on a non-toggle widget"),
        }
        self
    }

    /// Change callback for sliders, called with the new percentage
    pub fn on_slide(mut self, f: impl Fn(&mut Shell, u8) -> Result<()> + 'static) -> Self {
        match self.widget_mut() {
            Widget::Slider { on_change, .. } => *on_change = Some(Rc::new(f)),
            other => tracing::warn!(kind = other.kind_name(), "on_slide on a non-slider widget"),
        }
        self
    }

    pub fn with_text_color(mut self, color: impl Into<Paint>) -> Self {
        self.set_text_color(color);
        self
    }

    pub fn set_text_color(&mut self, color: impl Into<Paint>) {
        if let Widget::Text(text) = self.widget_mut() {
            text.color = color.into();
        }
    }

    /// Text content for text widgets and button labels
    pub fn text_content(&self) -> Option<&str> {
        match self.widget() {
            Widget::Text(text) => Some(text.text()),
            Widget::Button => self.label().and_then(|l| l.text_content()),
            _ => None,
        }
    }

    /// Replace the text of a text widget or a button's label
    pub fn set_text(&mut self, value: impl Into<String>) {
        if matches!(self.widget(), Widget::Button) {
            if let Some(label) = self.label_mut() {
                label.set_text(value);
            }
            return;
        }
        match self.widget_mut() {
            Widget::Text(text) => text.set_text(value),
            other => tracing::warn!(kind = other.kind_name(), "set_text on a widget without text"),
        }
    }

    fn label(&self) -> Option<&Component> {
        use super::traits::ChildOwning;
        self.children()
            .iter()
            .find(|c| matches!(c.widget(), Widget::Text(_)))
    }

    fn label_mut(&mut self) -> Option<&mut Component> {
        use super::traits::ChildOwning;
        self.children_mut()
            .iter_mut()
            .find(|c| matches!(c.widget(), Widget::Text(_)))
    }

    pub fn is_checked(&self) -> Option<bool> {
        match self.widget() {
            Widget::Checkbox { checked, .. } => Some(*checked),
            Widget::Switch { on, .. } => Some(*on),
            _ => None,
        }
    }

    pub fn slider_value(&self) -> Option<u8> {
        match self.widget() {
            Widget::Slider { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn scroll_state_mut(&mut self) -> Option<&mut ScrollState> {
        match self.widget_mut() {
            Widget::Scroll(state) => Some(state),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{BlockFont, Palette};
    use crate::ui::geometry::Scale;
    use crate::ui::traits::{ChildOwning, Drawable, Hittable};

    fn layout(root: &mut Component, size: Size) {
        let palette = Palette::default();
        let fonts = BlockFont;
        root.layout(&RenderContext::new(&palette, &fonts, size, Scale::IDENTITY));
    }

    #[test]
    fn test_text_sizes_itself() {
        let mut root = Component::panel(Declared::px(0, 0, 100, 100))
            .with_child(Component::text(4, 4, "hello", 10));
        layout(&mut root, Size::new(100, 100));

        assert_eq!(root.children()[0].computed(), Rect::new(4, 4, 25, 10));
    }

    #[test]
    fn test_wrapped_text_grows_downward() {
        let mut root = Component::panel(Declared::px(0, 0, 60, 100))
            .with_child(Component::wrapped_text(0, 0, "one two three", 20));
        layout(&mut root, Size::new(60, 100));

        let text = &root.children()[0];
        assert_eq!(text.computed().height, 60);
        assert_eq!(text.computed().width, 50);
    }

    #[test]
    fn test_button_label_is_centred_and_not_hittable() {
        let button = Component::button(Declared::px(0, 0, 100, 40), "OK");
        let button_id = button.id();
        let mut root = Component::panel(Declared::px(0, 0, 100, 100)).with_child(button);
        layout(&mut root, Size::new(100, 100));

        let label = &root.children()[0].children()[0];
        // "OK" at 14px: 2 columns * 7px = 14 wide
        assert_eq!(label.computed(), Rect::new(43, 13, 14, 14));

        let hit = root.hit_test(Point::new(50, 20), Point::default()).unwrap();
        assert_eq!(hit.id, button_id);
        assert_eq!(root.children()[0].text_content(), Some("OK"));
    }

    #[test]
    fn test_checkbox_toggles_before_handler() {
        let mut cb = Component::checkbox(Declared::px(0, 0, 20, 20), false);
        assert!(cb.react(EventKind::Click, Point::new(5, 5)).is_none());
        assert_eq!(cb.is_checked(), Some(true));

        let mut cb = cb.on_toggle(|_, _| Ok(()));
        assert!(cb.react(EventKind::Click, Point::new(5, 5)).is_some());
        assert_eq!(cb.is_checked(), Some(false));

        // Long clicks do not toggle
        cb.react(EventKind::LongClick, Point::new(5, 5));
        assert_eq!(cb.is_checked(), Some(false));
    }

    #[test]
    fn test_slider_tracks_pointer_percentage() {
        let mut root = Component::panel(Declared::px(0, 0, 200, 50))
            .with_child(Component::slider(Declared::px(0, 0, 200, 20), 0));
        layout(&mut root, Size::new(200, 50));

        let slider = &mut root.children_mut()[0];
        slider.react(EventKind::DragUpdate, Point::new(50, 10));
        assert_eq!(slider.slider_value(), Some(25));
        slider.react(EventKind::Click, Point::new(500, 10));
        assert_eq!(slider.slider_value(), Some(100));
    }

    #[test]
    fn test_set_text_on_button_updates_label() {
        let mut button = Component::button(Declared::px(0, 0, 100, 40), "Start");
        button.set_text("Stop");
        assert_eq!(button.text_content(), Some("Stop"));
    }
}
