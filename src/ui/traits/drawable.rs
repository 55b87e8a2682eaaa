//! Rendering capability and the context it runs under

use crate::gfx::{FontCache, Palette, Point, Size, Surface};
use crate::ui::geometry::Scale;
use anyhow::Result;

/// Immutable context passed down the tree while rendering
///
/// Holds what a node needs to resolve itself against its parent: the parent's
/// resolved size, the UI scale, and the shared palette and fonts. Nodes never
/// see the shell while painting.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Resolved size of the node's parent
    pub parent: Size,

    /// UI scale for resizable components
    pub scale: Scale,

    /// Active palette for role colours
    pub palette: &'a Palette,

    /// Text measurement and rasterisation
    pub fonts: &'a dyn FontCache,
}

impl<'a> RenderContext<'a> {
    pub fn new(palette: &'a Palette, fonts: &'a dyn FontCache, parent: Size, scale: Scale) -> Self {
        Self {
            parent,
            scale,
            palette,
            fonts,
        }
    }

    /// Context for the children of a node whose resolved size is `size`
    pub fn child(&self, size: Size) -> Self {
        Self {
            parent: size,
            ..*self
        }
    }
}

/// A node that can lay itself out and paint
pub trait Drawable {
    /// Re-resolve stale geometry for this node and its descendants
    fn layout(&mut self, ctx: &RenderContext);

    /// Paint onto `target`, with the node's computed position taken relative to `origin`
    fn render(&mut self, target: &mut Surface, ctx: &RenderContext, origin: Point) -> Result<()>;

    /// Force re-resolution, optionally for every descendant too
    fn refresh(&mut self, ctx: &RenderContext, cascade: bool);
}
